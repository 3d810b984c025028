use serde::Serialize;

use super::cursor::Cursor;
use super::model::CalibrationType;
use super::sections::CalibrationEntry;
use crate::error::Result;

/// Read one spectrum of `channels` doubles.
pub fn decode_spectrum(cur: &mut Cursor<'_>, channels: usize, what: &str) -> Result<Vec<f64>> {
    let start = cur.offset();
    let values = cur.read_f64_array(channels, what)?;
    log::debug!("{what}: {channels} channels at offset {start}");
    Ok(values)
}

/// A calibration spectrum, tagged by the header entry that announced it.
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationBuffer {
    /// Stored by some instruments but not used by any derived quantity.
    Absolute(Vec<f64>),
    Base(Vec<f64>),
    Lamp(Vec<f64>),
    Fiber(Vec<f64>),
}

impl CalibrationBuffer {
    pub fn new(calibration_type: CalibrationType, values: Vec<f64>) -> Self {
        match calibration_type {
            CalibrationType::Absolute => CalibrationBuffer::Absolute(values),
            CalibrationType::Base => CalibrationBuffer::Base(values),
            CalibrationType::Lamp => CalibrationBuffer::Lamp(values),
            CalibrationType::Fiber => CalibrationBuffer::Fiber(values),
        }
    }

    pub fn calibration_type(&self) -> CalibrationType {
        match self {
            CalibrationBuffer::Absolute(_) => CalibrationType::Absolute,
            CalibrationBuffer::Base(_) => CalibrationType::Base,
            CalibrationBuffer::Lamp(_) => CalibrationType::Lamp,
            CalibrationBuffer::Fiber(_) => CalibrationType::Fiber,
        }
    }

    pub fn values(&self) -> &[f64] {
        match self {
            CalibrationBuffer::Absolute(v)
            | CalibrationBuffer::Base(v)
            | CalibrationBuffer::Lamp(v)
            | CalibrationBuffer::Fiber(v) => v,
        }
    }
}

/// Calibration spectra filed by type.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CalibrationSet {
    pub absolute: Option<Vec<f64>>,
    pub base: Option<Vec<f64>>,
    pub lamp: Option<Vec<f64>>,
    pub fiber: Option<Vec<f64>>,
}

impl CalibrationSet {
    /// File a buffer under its type. A later buffer of the same type replaces
    /// the earlier one.
    pub fn insert(&mut self, buffer: CalibrationBuffer) {
        let calibration_type = buffer.calibration_type();
        let slot = match buffer {
            CalibrationBuffer::Absolute(v) => self.absolute.replace(v),
            CalibrationBuffer::Base(v) => self.base.replace(v),
            CalibrationBuffer::Lamp(v) => self.lamp.replace(v),
            CalibrationBuffer::Fiber(v) => self.fiber.replace(v),
        };
        if slot.is_some() {
            log::warn!("duplicate {calibration_type} calibration buffer; keeping the later one");
        }
    }

    pub fn get(&self, calibration_type: CalibrationType) -> Option<&[f64]> {
        match calibration_type {
            CalibrationType::Absolute => self.absolute.as_deref(),
            CalibrationType::Base => self.base.as_deref(),
            CalibrationType::Lamp => self.lamp.as_deref(),
            CalibrationType::Fiber => self.fiber.as_deref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        CalibrationType::ALL.iter().all(|&t| self.get(t).is_none())
    }
}

/// Read one buffer per header entry, in header order.
pub fn decode_calibration_buffers(
    cur: &mut Cursor<'_>,
    entries: &[CalibrationEntry],
    channels: usize,
) -> Result<CalibrationSet> {
    let mut set = CalibrationSet::default();
    for entry in entries {
        let values = decode_spectrum(cur, channels, entry.calibration_type.name())?;
        set.insert(CalibrationBuffer::new(entry.calibration_type, values));
    }
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AsdError;

    fn entry(calibration_type: CalibrationType) -> CalibrationEntry {
        CalibrationEntry {
            calibration_type,
            name: String::new(),
            integration_time: 0,
            swir1_gain: 0,
            swir2_gain: 0,
        }
    }

    fn doubles(values: &[f64]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_buffers_filed_in_header_order() {
        let mut buf = doubles(&[1.0, 2.0]);
        buf.extend(doubles(&[3.0, 4.0]));
        buf.extend(doubles(&[5.0, 6.0]));
        let entries = [
            entry(CalibrationType::Lamp),
            entry(CalibrationType::Absolute),
            entry(CalibrationType::Base),
        ];
        let mut cur = Cursor::new(&buf);
        let set = decode_calibration_buffers(&mut cur, &entries, 2).unwrap();
        assert_eq!(cur.remaining(), 0);
        assert_eq!(set.lamp.as_deref(), Some(&[1.0, 2.0][..]));
        assert_eq!(set.absolute.as_deref(), Some(&[3.0, 4.0][..]));
        assert_eq!(set.base.as_deref(), Some(&[5.0, 6.0][..]));
        assert_eq!(set.fiber, None);
    }

    #[test]
    fn test_duplicate_type_keeps_later_buffer() {
        let mut set = CalibrationSet::default();
        set.insert(CalibrationBuffer::Base(vec![1.0]));
        set.insert(CalibrationBuffer::Base(vec![2.0]));
        assert_eq!(set.get(CalibrationType::Base), Some(&[2.0][..]));
    }

    #[test]
    fn test_truncated_buffer_fails() {
        let buf = doubles(&[1.0]);
        let mut cur = Cursor::new(&buf);
        let err = decode_calibration_buffers(&mut cur, &[entry(CalibrationType::Fiber)], 2)
            .unwrap_err();
        assert!(matches!(err, AsdError::Format { offset: 0, len: 8, .. }));
    }

    #[test]
    fn test_buffer_tag_round_trip() {
        for t in CalibrationType::ALL {
            let b = CalibrationBuffer::new(t, vec![0.5]);
            assert_eq!(b.calibration_type(), t);
            assert_eq!(b.values(), &[0.5]);
        }
        assert!(CalibrationSet::default().is_empty());
    }
}

//! Derived quantities computed from decoded spectra.
//!
//! Everything here is pure and recomputed on each call; nothing is cached.

use std::f64::consts::PI;

use crate::data::metadata::Metadata;
use crate::data::model::{CalibrationType, DataType};
use crate::data::spectra::CalibrationSet;
use crate::error::{AsdError, Result};

/// Gain value at which SWIR segments need no correction.
pub const UNITY_GAIN: f64 = 2048.0;

/// Fixed instrument constants in the radiance denominator.
const RADIANCE_SCALE: f64 = 500.0 * 544.0 * PI;

/// Apply the per-segment gain correction.
///
/// - `[0, splice1)`: divided by integration time
/// - `[splice1, splice2)`: scaled by `swir1_gain / 2048`
/// - `[splice2, channels)`: also scaled by `swir1_gain / 2048`
///
/// The `swir1_gain` factor on the third segment is kept as observed in existing
/// readers and is unconfirmed; `swir2_gain` would be the expected factor.
pub fn normalize(spectrum: &[f64], metadata: &Metadata) -> Vec<f64> {
    let splice1 = metadata.splice1_index().min(spectrum.len());
    let splice2 = metadata.splice2_index().clamp(splice1, spectrum.len());
    let itime = f64::from(metadata.integration_time);
    let swir1 = f64::from(metadata.swir1_gain) / UNITY_GAIN;

    let mut out = Vec::with_capacity(spectrum.len());
    out.extend(spectrum[..splice1].iter().map(|v| v / itime));
    out.extend(spectrum[splice1..splice2].iter().map(|v| v * swir1));
    out.extend(spectrum[splice2..].iter().map(|v| v * swir1));
    out
}

/// `normalize(raw) / normalize(reference)`, elementwise. Requires REF data.
pub fn reflectance(metadata: &Metadata, raw: &[f64], reference: &[f64]) -> Result<Vec<f64>> {
    require(metadata, "reflectance", DataType::Ref)?;
    let raw = normalize(raw, metadata);
    let reference = normalize(reference, metadata);
    Ok(raw.iter().zip(&reference).map(|(r, w)| r / w).collect())
}

/// `lamp * reference * raw * itime / (base * 500 * 544 * π)`, elementwise.
/// Requires RAD data plus BASE and LAMP calibration buffers.
pub fn radiance(
    metadata: &Metadata,
    raw: &[f64],
    reference: &[f64],
    calibration: &CalibrationSet,
) -> Result<Vec<f64>> {
    require(metadata, "radiance", DataType::Rad)?;
    let fetch = |buffer| {
        calibration
            .get(buffer)
            .ok_or(AsdError::MissingCalibration {
                operation: "radiance",
                buffer,
            })
    };
    let base = fetch(CalibrationType::Base)?;
    let lamp = fetch(CalibrationType::Lamp)?;
    let itime = f64::from(metadata.integration_time);

    Ok(lamp
        .iter()
        .zip(reference)
        .zip(raw)
        .zip(base)
        .map(|(((l, w), r), b)| l * w * r * itime / (b * RADIANCE_SCALE))
        .collect())
}

/// The normalized reference spectrum. Valid for any data type.
pub fn white_reference(metadata: &Metadata, reference: &[f64]) -> Vec<f64> {
    normalize(reference, metadata)
}

fn require(metadata: &Metadata, operation: &'static str, expected: DataType) -> Result<()> {
    if metadata.data_type != expected {
        return Err(AsdError::TypeCompatibility {
            operation,
            expected,
            found: metadata.data_type,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::metadata::{decode_metadata, METADATA_LEN};

    fn metadata(data_type: u8, itime: u32, swir1: u16, swir2: u16, splices: (f32, f32)) -> Metadata {
        let mut buf = vec![0u8; METADATA_LEN];
        buf[186] = data_type;
        buf[204..206].copy_from_slice(&6u16.to_le_bytes());
        buf[390..394].copy_from_slice(&itime.to_le_bytes());
        buf[436..438].copy_from_slice(&swir1.to_le_bytes());
        buf[438..440].copy_from_slice(&swir2.to_le_bytes());
        buf[444..448].copy_from_slice(&splices.0.to_le_bytes());
        buf[448..452].copy_from_slice(&splices.1.to_le_bytes());
        decode_metadata(&buf).unwrap().0
    }

    fn close(a: &[f64], b: &[f64]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-9)
    }

    #[test]
    fn test_normalize_identity_at_unity_settings() {
        let md = metadata(0, 1, 2048, 2048, (2.0, 4.0));
        let s = [0.5, 1.0, 2.0, 3.0, 4.0, 5.0];
        assert!(close(&normalize(&s, &md), &s));
    }

    #[test]
    fn test_normalize_segments() {
        let md = metadata(0, 4, 4096, 1024, (2.0, 4.0));
        let s = [8.0; 6];
        let n = normalize(&s, &md);
        assert!(close(&n, &[2.0, 2.0, 16.0, 16.0, 16.0, 16.0]));
    }

    #[test]
    fn test_third_segment_ignores_swir2_gain() {
        let a = metadata(0, 1, 4096, 1, (1.0, 3.0));
        let b = metadata(0, 1, 4096, 60000, (1.0, 3.0));
        let s = [1.0; 6];
        assert_eq!(normalize(&s, &a), normalize(&s, &b));
    }

    #[test]
    fn test_reflectance_divides_normalized_spectra() {
        let md = metadata(1, 2, 1024, 2048, (3.0, 5.0));
        let raw = [2.0, 4.0, 6.0, 8.0, 10.0, 12.0];
        let reference = [2.0; 6];
        let r = reflectance(&md, &raw, &reference).unwrap();
        assert!(close(&r, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]));
    }

    #[test]
    fn test_reflectance_rejects_rad() {
        let md = metadata(2, 1, 2048, 2048, (2.0, 4.0));
        let err = reflectance(&md, &[1.0; 6], &[1.0; 6]).unwrap_err();
        assert!(matches!(err, AsdError::TypeCompatibility { found: DataType::Rad, .. }));
        assert!(err.to_string().contains("RAD"));
    }

    #[test]
    fn test_radiance_formula() {
        let md = metadata(2, 10, 2048, 2048, (2.0, 4.0));
        let calibration = CalibrationSet {
            base: Some(vec![2.0; 6]),
            lamp: Some(vec![3.0; 6]),
            ..Default::default()
        };
        let rad = radiance(&md, &[4.0; 6], &[5.0; 6], &calibration).unwrap();
        let expected = 3.0 * 5.0 * 4.0 * 10.0 / (2.0 * 500.0 * 544.0 * PI);
        assert!(close(&rad, &[expected; 6]));
    }

    #[test]
    fn test_radiance_rejects_ref() {
        let md = metadata(1, 1, 2048, 2048, (2.0, 4.0));
        let err = radiance(&md, &[1.0; 6], &[1.0; 6], &CalibrationSet::default()).unwrap_err();
        assert!(err.to_string().contains("REF"));
    }

    #[test]
    fn test_radiance_without_lamp_buffer() {
        let md = metadata(2, 1, 2048, 2048, (2.0, 4.0));
        let calibration = CalibrationSet {
            base: Some(vec![1.0; 6]),
            ..Default::default()
        };
        let err = radiance(&md, &[1.0; 6], &[1.0; 6], &calibration).unwrap_err();
        assert!(matches!(
            err,
            AsdError::MissingCalibration { buffer: CalibrationType::Lamp, .. }
        ));
    }

    #[test]
    fn test_white_reference_has_no_type_guard() {
        for data_type in [0u8, 1, 2, 8] {
            let md = metadata(data_type, 2, 2048, 2048, (3.0, 6.0));
            let w = white_reference(&md, &[4.0; 6]);
            assert!(close(&w, &[2.0, 2.0, 2.0, 4.0, 4.0, 4.0]));
        }
    }
}

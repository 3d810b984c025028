//! The fixed 484-byte leading header.
//!
//! Layout (offset, width, field):
//! ```text
//!   0    3  file_version        179   1  format_version     390   4  integration_time
//!   3  157  comment             180   1  itime              394   2  fo
//! 160   18  save_time (tm)      181   1  dc_corrected       396   2  dcc
//! 178    1  program_version     182   4  dc_time            398   2  calibration
//! 186    1  data_type           187   4  ref_time           400   2  instrument_num
//! 191    4  ch1_wave            195   4  wave1_step         402  16  ymin ymax xmin xmax
//! 199    1  data_format         200   3  old dc/ref/sample  418   2  ip_numbits
//! 203    1  application         204   2  channels           420   1  xmode
//! 206  128  app_data (opaque)   334  56  gps_data (opaque)  421   4  flags
//! 425    6  dc/ref/sample count 431   1  instrument         432   4  cal_bulb_id
//! 436    8  swir1/2 gain+offset 444   8  splice1/2          452  27  smart_detector (opaque)
//! 479    5  spare
//! ```

use std::ops::Range;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::cursor::{CalendarTime, Cursor};
use super::model::{DataType, Instrument, SpectrumFormat};
use crate::error::{AsdError, Result};

/// Length of the fixed header; the first spectrum starts here.
pub const METADATA_LEN: usize = 484;

pub const APP_DATA_RANGE: Range<usize> = 206..334;
pub const GPS_DATA_RANGE: Range<usize> = 334..390;
pub const SMART_DETECTOR_RANGE: Range<usize> = 452..479;

const COMMENT_LEN: usize = 157;

// Bits of `flags[1]`.
const FLAG_VNIR_SATURATION: u8 = 1;
const FLAG_SWIR1_SATURATION: u8 = 2;
const FLAG_SWIR2_SATURATION: u8 = 4;
const FLAG_TEC1_ALARM: u8 = 8;
const FLAG_TEC2_ALARM: u8 = 16;

/// Decoded leading header. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    pub file_version: String,
    pub comment: String,
    pub save_time: CalendarTime,
    pub program_version: u8,
    pub format_version: u8,
    pub itime: u8,
    pub dc_corrected: bool,
    pub dc_time: DateTime<Utc>,
    pub data_type: DataType,
    pub ref_time: DateTime<Utc>,
    /// Calibrated starting wavelength in nm.
    pub ch1_wave: f32,
    /// Calibrated wavelength step in nm.
    pub wave1_step: f32,
    pub data_format: SpectrumFormat,
    pub old_dc_count: u8,
    pub old_ref_count: u8,
    pub old_sample_count: u8,
    pub application: u8,
    pub channels: u16,
    #[serde(skip)]
    pub app_data: Vec<u8>,
    #[serde(skip)]
    pub gps_data: Vec<u8>,
    /// Actual integration time in ms.
    pub integration_time: u32,
    pub fo: i16,
    pub dcc: i16,
    pub calibration: u16,
    pub instrument_num: u16,
    pub ymin: f32,
    pub ymax: f32,
    pub xmin: f32,
    pub xmax: f32,
    pub ip_numbits: u16,
    pub xmode: u8,
    pub flags: [u8; 4],
    pub dc_count: u16,
    pub ref_count: u16,
    pub sample_count: u16,
    pub instrument: Instrument,
    pub cal_bulb_id: u32,
    pub swir1_gain: u16,
    pub swir2_gain: u16,
    pub swir1_offset: u16,
    pub swir2_offset: u16,
    /// Named as a wavelength on disk but used as a channel index.
    pub splice1_wavelength: f32,
    /// Named as a wavelength on disk but used as a channel index.
    pub splice2_wavelength: f32,
    #[serde(skip)]
    pub smart_detector: Vec<u8>,
    #[serde(skip)]
    pub spare: [u8; 5],
}

impl Metadata {
    /// Number of channels as a length.
    pub fn channel_count(&self) -> usize {
        usize::from(self.channels)
    }

    /// First channel of the SWIR1 segment. Validated `<= splice2_index()` at decode.
    pub fn splice1_index(&self) -> usize {
        self.splice1_wavelength as usize
    }

    /// First channel of the SWIR2 segment. Validated `<= channels` at decode.
    pub fn splice2_index(&self) -> usize {
        self.splice2_wavelength as usize
    }

    /// `ch1_wave + i * wave1_step` for every channel.
    pub fn wavelengths(&self) -> Vec<f64> {
        let start = f64::from(self.ch1_wave);
        let step = f64::from(self.wave1_step);
        (0..self.channel_count())
            .map(|i| start + i as f64 * step)
            .collect()
    }

    pub fn save_datetime(&self) -> Option<chrono::NaiveDateTime> {
        self.save_time.to_datetime()
    }

    pub fn vnir_saturated(&self) -> bool {
        self.flags[1] & FLAG_VNIR_SATURATION != 0
    }

    pub fn swir1_saturated(&self) -> bool {
        self.flags[1] & FLAG_SWIR1_SATURATION != 0
    }

    pub fn swir2_saturated(&self) -> bool {
        self.flags[1] & FLAG_SWIR2_SATURATION != 0
    }

    pub fn tec1_alarm(&self) -> bool {
        self.flags[1] & FLAG_TEC1_ALARM != 0
    }

    pub fn tec2_alarm(&self) -> bool {
        self.flags[1] & FLAG_TEC2_ALARM != 0
    }
}

/// Decode `[0, 484)` and return the header with the offset where spectra begin.
pub fn decode_metadata(buf: &[u8]) -> Result<(Metadata, usize)> {
    let mut cur = Cursor::new(buf);
    cur.ensure(METADATA_LEN, "metadata header")?;

    let file_version = text(cur.read_bytes(3, "file_version")?); // 0..3
    let comment = text(cur.read_bytes(COMMENT_LEN, "comment")?); // 3..160
    let save_time = cur.read_calendar_time("save_time")?; // 160..178
    let program_version = cur.read::<u8>("program_version")?;
    let format_version = cur.read::<u8>("format_version")?;
    let itime = cur.read::<u8>("itime")?;
    let dc_corrected = cur.read_bool("dc_corrected")?;
    let dc_time = epoch_seconds(cur.read::<i32>("dc_time")?); // 182..186
    let data_type = enum_field(&mut cur, "data_type", DataType::from_index)?; // 186
    let ref_time = epoch_seconds(cur.read::<i32>("ref_time")?); // 187..191
    let ch1_wave = cur.read::<f32>("ch1_wave")?;
    let wave1_step = cur.read::<f32>("wave1_step")?;
    let data_format = enum_field(&mut cur, "data_format", SpectrumFormat::from_index)?; // 199
    let old_dc_count = cur.read::<u8>("old_dc_count")?;
    let old_ref_count = cur.read::<u8>("old_ref_count")?;
    let old_sample_count = cur.read::<u8>("old_sample_count")?;
    let application = cur.read::<u8>("application")?;
    let channels_at = cur.offset();
    let channels = cur.read::<u16>("channels")?; // 204..206
    let app_data = cur.read_bytes(APP_DATA_RANGE.len(), "app_data")?.to_vec();
    let gps_data = cur.read_bytes(GPS_DATA_RANGE.len(), "gps_data")?.to_vec();
    let integration_time = cur.read::<u32>("integration_time")?; // 390..394
    let fo = cur.read::<i16>("fo")?;
    let dcc = cur.read::<i16>("dcc")?;
    let calibration = cur.read::<u16>("calibration")?;
    let instrument_num = cur.read::<u16>("instrument_num")?;
    let ymin = cur.read::<f32>("ymin")?; // 402..418
    let ymax = cur.read::<f32>("ymax")?;
    let xmin = cur.read::<f32>("xmin")?;
    let xmax = cur.read::<f32>("xmax")?;
    let ip_numbits = cur.read::<u16>("ip_numbits")?;
    let xmode = cur.read::<u8>("xmode")?;
    let mut flags = [0u8; 4];
    flags.copy_from_slice(cur.read_bytes(4, "flags")?); // 421..425
    let dc_count = cur.read::<u16>("dc_count")?;
    let ref_count = cur.read::<u16>("ref_count")?;
    let sample_count = cur.read::<u16>("sample_count")?;
    let instrument = enum_field(&mut cur, "instrument", Instrument::from_index)?; // 431
    let cal_bulb_id = cur.read::<u32>("cal_bulb_id")?;
    let swir1_gain = cur.read::<u16>("swir1_gain")?; // 436..444
    let swir2_gain = cur.read::<u16>("swir2_gain")?;
    let swir1_offset = cur.read::<u16>("swir1_offset")?;
    let swir2_offset = cur.read::<u16>("swir2_offset")?;
    let splice_at = cur.offset();
    let splice1_wavelength = cur.read::<f32>("splice1_wavelength")?; // 444..452
    let splice2_wavelength = cur.read::<f32>("splice2_wavelength")?;
    let smart_detector = cur
        .read_bytes(SMART_DETECTOR_RANGE.len(), "smart_detector")?
        .to_vec();
    let mut spare = [0u8; 5];
    spare.copy_from_slice(cur.read_bytes(5, "spare")?); // 479..484

    debug_assert_eq!(cur.offset(), METADATA_LEN);

    if channels == 0 {
        return Err(AsdError::format(channels_at, buf.len(), "channel count is zero"));
    }
    if !splices_valid(splice1_wavelength, splice2_wavelength, channels) {
        return Err(AsdError::format(
            splice_at,
            buf.len(),
            format!(
                "splice indices {splice1_wavelength} and {splice2_wavelength} \
                 are not ordered within {channels} channels"
            ),
        ));
    }

    let metadata = Metadata {
        file_version,
        comment,
        save_time,
        program_version,
        format_version,
        itime,
        dc_corrected,
        dc_time,
        data_type,
        ref_time,
        ch1_wave,
        wave1_step,
        data_format,
        old_dc_count,
        old_ref_count,
        old_sample_count,
        application,
        channels,
        app_data,
        gps_data,
        integration_time,
        fo,
        dcc,
        calibration,
        instrument_num,
        ymin,
        ymax,
        xmin,
        xmax,
        ip_numbits,
        xmode,
        flags,
        dc_count,
        ref_count,
        sample_count,
        instrument,
        cal_bulb_id,
        swir1_gain,
        swir2_gain,
        swir1_offset,
        swir2_offset,
        splice1_wavelength,
        splice2_wavelength,
        smart_detector,
        spare,
    };
    log::debug!(
        "metadata: version {:?}, {} channels, data type {}, instrument {}",
        metadata.file_version,
        metadata.channels,
        metadata.data_type,
        metadata.instrument
    );
    Ok((metadata, METADATA_LEN))
}

fn enum_field<T>(cur: &mut Cursor<'_>, what: &str, lookup: fn(u8) -> Option<T>) -> Result<T> {
    let at = *cur;
    let raw = cur.read::<u8>(what)?;
    lookup(raw).ok_or_else(|| at.error(format!("{what} index {raw} is out of range")))
}

/// `0 <= splice1 <= splice2 <= channels`, compared as truncated channel indices.
fn splices_valid(splice1: f32, splice2: f32, channels: u16) -> bool {
    let in_range = |s: f32| s.is_finite() && s >= 0.0;
    in_range(splice1)
        && in_range(splice2)
        && (splice1 as usize) <= (splice2 as usize)
        && (splice2 as usize) <= usize::from(channels)
}

fn epoch_seconds(secs: i32) -> DateTime<Utc> {
    DateTime::from_timestamp(i64::from(secs), 0).unwrap_or_default()
}

/// Fixed-width text slot with trailing zero padding removed.
fn text(bytes: &[u8]) -> String {
    let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

//! Variable-length sections between the spectra.
//!
//! Each decoder starts where its predecessor stopped and leaves the cursor on
//! the first byte of the next section.

use serde::Serialize;

use super::cursor::Cursor;
use super::model::CalibrationType;
use crate::error::Result;

// ---------------------------------------------------------------------------
// Reference header
// ---------------------------------------------------------------------------

/// Fixed record preceding the reference spectrum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceHeader {
    pub reference_flag: i16,
    pub reference_time: i64,
    pub spectrum_time: i64,
    pub description: String,
}

pub fn decode_reference_header(cur: &mut Cursor<'_>) -> Result<ReferenceHeader> {
    let reference_flag = cur.read::<i16>("reference_flag")?;
    let reference_time = cur.read::<i64>("reference_time")?;
    let spectrum_time = cur.read::<i64>("spectrum_time")?;
    let description = string(cur, "reference description")?;
    Ok(ReferenceHeader {
        reference_flag,
        reference_time,
        spectrum_time,
        description,
    })
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Descriptive text fields plus the constituent list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Classifier {
    pub y_code: i8,
    pub y_model_type: i8,
    pub title: String,
    pub subtitle: String,
    pub product_name: String,
    pub vendor: String,
    pub lot_number: String,
    pub sample: String,
    pub model_name: String,
    pub operator: String,
    pub date_time: String,
    pub instrument: String,
    pub serial_number: String,
    pub display_mode: String,
    pub comments: String,
    pub units: String,
    pub filename: String,
    pub user_name: String,
    pub reserved: [String; 2],
    pub constituents: Vec<Constituent>,
}

impl Classifier {
    /// Text fields in on-disk order, paired with their names.
    pub fn fields(&self) -> [(&'static str, &str); 18] {
        [
            ("title", self.title.as_str()),
            ("subtitle", self.subtitle.as_str()),
            ("product_name", self.product_name.as_str()),
            ("vendor", self.vendor.as_str()),
            ("lot_number", self.lot_number.as_str()),
            ("sample", self.sample.as_str()),
            ("model_name", self.model_name.as_str()),
            ("operator", self.operator.as_str()),
            ("date_time", self.date_time.as_str()),
            ("instrument", self.instrument.as_str()),
            ("serial_number", self.serial_number.as_str()),
            ("display_mode", self.display_mode.as_str()),
            ("comments", self.comments.as_str()),
            ("units", self.units.as_str()),
            ("filename", self.filename.as_str()),
            ("user_name", self.user_name.as_str()),
            ("reserved1", self.reserved[0].as_str()),
            ("reserved2", self.reserved[1].as_str()),
        ]
    }
}

/// One classification model result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Constituent {
    pub name: String,
    pub pass_fail: String,
    pub m_distance: f64,
    pub m_distance_limit: f64,
    pub concentration: f64,
    pub concentration_limit: f64,
    pub f_ratio: f64,
    pub residual: f64,
    pub residual_limit: f64,
    pub scores: f64,
    pub model_type: i32,
    pub reserved1: f64,
    pub reserved2: f64,
}

impl Constituent {
    /// Two empty strings plus the fixed numeric tail.
    pub const MIN_LEN: usize = 2 + 2 + 8 * 8 + 4 + 2 * 8;
}

pub fn decode_classifier(cur: &mut Cursor<'_>) -> Result<Classifier> {
    let start = cur.offset();
    let y_code = cur.read::<i8>("y_code")?;
    let y_model_type = cur.read::<i8>("y_model_type")?;

    let mut c = Classifier {
        y_code,
        y_model_type,
        title: string(cur, "title")?,
        subtitle: string(cur, "subtitle")?,
        product_name: string(cur, "product_name")?,
        vendor: string(cur, "vendor")?,
        lot_number: string(cur, "lot_number")?,
        sample: string(cur, "sample")?,
        model_name: string(cur, "model_name")?,
        operator: string(cur, "operator")?,
        date_time: string(cur, "date_time")?,
        instrument: string(cur, "instrument")?,
        serial_number: string(cur, "serial_number")?,
        display_mode: string(cur, "display_mode")?,
        comments: string(cur, "comments")?,
        units: string(cur, "units")?,
        filename: string(cur, "filename")?,
        user_name: string(cur, "user_name")?,
        reserved: [
            string(cur, "reserved1")?,
            string(cur, "reserved2")?,
        ],
        constituents: Vec::new(),
    };

    let count = counted(cur, "constituent", Constituent::MIN_LEN, |cur| {
        cur.read::<i16>("constituent count").map(i64::from)
    })?;
    c.constituents.reserve(count);
    for _ in 0..count {
        let constituent = decode_constituent(cur)?;
        log::trace!("constituent {:?} at offset {}", constituent.name, cur.offset());
        c.constituents.push(constituent);
    }

    log::debug!(
        "classifier: {} bytes at offset {start}, {count} constituents",
        cur.offset() - start
    );
    Ok(c)
}

fn decode_constituent(cur: &mut Cursor<'_>) -> Result<Constituent> {
    Ok(Constituent {
        name: string(cur, "constituent name")?,
        pass_fail: string(cur, "constituent pass_fail")?,
        m_distance: cur.read("m_distance")?,
        m_distance_limit: cur.read("m_distance_limit")?,
        concentration: cur.read("concentration")?,
        concentration_limit: cur.read("concentration_limit")?,
        f_ratio: cur.read("f_ratio")?,
        residual: cur.read("residual")?,
        residual_limit: cur.read("residual_limit")?,
        scores: cur.read("scores")?,
        model_type: cur.read("model_type")?,
        reserved1: cur.read("constituent reserved1")?,
        reserved2: cur.read("constituent reserved2")?,
    })
}

// ---------------------------------------------------------------------------
// Dependants
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dependants {
    pub save_dependants: bool,
    pub dependant_count: i16,
    pub labels: String,
    pub value: f32,
}

pub fn decode_dependants(cur: &mut Cursor<'_>) -> Result<Dependants> {
    Ok(Dependants {
        save_dependants: cur.read_bool("save_dependants")?,
        dependant_count: cur.read("dependant_count")?,
        labels: string(cur, "dependant labels")?,
        value: cur.read("dependant value")?,
    })
}

// ---------------------------------------------------------------------------
// Calibration header
// ---------------------------------------------------------------------------

/// Describes one calibration buffer stored after the header, in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationEntry {
    pub calibration_type: CalibrationType,
    pub name: String,
    pub integration_time: i32,
    pub swir1_gain: i16,
    pub swir2_gain: i16,
}

impl CalibrationEntry {
    pub const LEN: usize = 1 + CALIBRATION_NAME_LEN + 4 + 2 + 2;
}

const CALIBRATION_NAME_LEN: usize = 20;

pub fn decode_calibration_header(cur: &mut Cursor<'_>) -> Result<Vec<CalibrationEntry>> {
    cur.skip(1, "calibration header padding")?;
    let count = counted(cur, "calibration entry", CalibrationEntry::LEN, |cur| {
        cur.read::<i8>("calibration count").map(i64::from)
    })?;

    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        let tag_at = *cur;
        let tag = cur.read::<i8>("calibration type")?;
        let calibration_type = CalibrationType::from_index(tag).ok_or_else(|| {
            tag_at.error(format!("unknown calibration type tag {tag}"))
        })?;
        let name = cur.read_bytes(CALIBRATION_NAME_LEN, "calibration name")?;
        let name = name.split(|&b| b == 0).next().unwrap_or_default();
        let entry = CalibrationEntry {
            calibration_type,
            name: String::from_utf8_lossy(name).into_owned(),
            integration_time: cur.read("calibration integration_time")?,
            swir1_gain: cur.read("calibration swir1_gain")?,
            swir2_gain: cur.read("calibration swir2_gain")?,
        };
        log::trace!("calibration entry {entry:?}");
        entries.push(entry);
    }
    log::debug!("calibration header: {count} entries, ends at {}", cur.offset());
    Ok(entries)
}

// -- helpers --

fn string(cur: &mut Cursor<'_>, what: &str) -> Result<String> {
    cur.read_bstr(what)
        .map(|b| String::from_utf8_lossy(b).into_owned())
}

/// Read a record count and check that `count * min_len` bytes can follow.
fn counted(
    cur: &mut Cursor<'_>,
    what: &str,
    min_len: usize,
    read_count: impl FnOnce(&mut Cursor<'_>) -> Result<i64>,
) -> Result<usize> {
    let at = *cur;
    let raw = read_count(cur)?;
    let Ok(count) = usize::try_from(raw) else {
        return Err(at.error(format!("negative {what} count {raw}")));
    };
    if count.saturating_mul(min_len) > cur.remaining() {
        return Err(at.error(format!(
            "{count} {what} records need at least {} bytes but only {} remain",
            count.saturating_mul(min_len),
            cur.remaining()
        )));
    }
    Ok(count)
}

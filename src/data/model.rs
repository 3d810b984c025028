use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};

use crate::config::Quantity;

// ---------------------------------------------------------------------------
// Enumerations stored as raw indices in the file
// ---------------------------------------------------------------------------

/// Kind of measurement stored in the file (`data_type`, header byte 186).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Raw,
    Ref,
    Rad,
    NoUnits,
    Irrad,
    Qi,
    Trans,
    Unknown,
    Abs,
}

impl DataType {
    pub const ALL: [DataType; 9] = [
        DataType::Raw,
        DataType::Ref,
        DataType::Rad,
        DataType::NoUnits,
        DataType::Irrad,
        DataType::Qi,
        DataType::Trans,
        DataType::Unknown,
        DataType::Abs,
    ];

    const NAMES: [&'static str; 9] = [
        "RAW", "REF", "RAD", "NOUNITS", "IRRAD", "QI", "TRANS", "UNKNOWN", "ABS",
    ];

    /// Look up the enumeration for a raw index; `None` when out of range.
    pub fn from_index(raw: u8) -> Option<Self> {
        Self::ALL.get(raw as usize).copied()
    }

    pub fn name(self) -> &'static str {
        Self::NAMES[self as usize]
    }
}

/// Instrument model (`instrument`, header byte 431).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instrument {
    Unknown,
    Psii,
    LsVnir,
    FsVnir,
    Fsfr,
    FsNir,
    Chem,
    FsfrUnattended,
}

impl Instrument {
    pub const ALL: [Instrument; 8] = [
        Instrument::Unknown,
        Instrument::Psii,
        Instrument::LsVnir,
        Instrument::FsVnir,
        Instrument::Fsfr,
        Instrument::FsNir,
        Instrument::Chem,
        Instrument::FsfrUnattended,
    ];

    const NAMES: [&'static str; 8] = [
        "UNKNOWN",
        "PSII",
        "LSVNIR",
        "FSVNIR",
        "FSFR",
        "FSNIR",
        "CHEM",
        "FSFR_UNATTENDED",
    ];

    pub fn from_index(raw: u8) -> Option<Self> {
        Self::ALL.get(raw as usize).copied()
    }

    pub fn name(self) -> &'static str {
        Self::NAMES[self as usize]
    }
}

/// Tag of a calibration buffer entry in the calibration header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalibrationType {
    Absolute,
    Base,
    Lamp,
    Fiber,
}

impl CalibrationType {
    pub const ALL: [CalibrationType; 4] = [
        CalibrationType::Absolute,
        CalibrationType::Base,
        CalibrationType::Lamp,
        CalibrationType::Fiber,
    ];

    const NAMES: [&'static str; 4] = ["ABSOLUTE", "BASE", "LAMP", "FIBER"];

    /// The tag is read as a signed byte, so negative values are rejected here too.
    pub fn from_index(raw: i8) -> Option<Self> {
        usize::try_from(raw)
            .ok()
            .and_then(|i| Self::ALL.get(i))
            .copied()
    }

    pub fn name(self) -> &'static str {
        Self::NAMES[self as usize]
    }
}

/// Numeric format the instrument recorded the spectrum in (`data_format`).
///
/// Spectra are always stored as doubles on disk; this is informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpectrumFormat {
    Float,
    Integer,
    Double,
    Unknown,
}

impl SpectrumFormat {
    pub const ALL: [SpectrumFormat; 4] = [
        SpectrumFormat::Float,
        SpectrumFormat::Integer,
        SpectrumFormat::Double,
        SpectrumFormat::Unknown,
    ];

    const NAMES: [&'static str; 4] = ["FLOAT", "INTEGER", "DOUBLE", "UNKNOWN"];

    pub fn from_index(raw: u8) -> Option<Self> {
        Self::ALL.get(raw as usize).copied()
    }

    pub fn name(self) -> &'static str {
        Self::NAMES[self as usize]
    }
}

// -- Display / Serialize use the on-disk names --

macro_rules! named_enum_impls {
    ($($ty:ty),*) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                serializer.serialize_str(self.name())
            }
        }
    )*};
}

named_enum_impls!(DataType, Instrument, CalibrationType, SpectrumFormat);

// ---------------------------------------------------------------------------
// MetadataValue – one flattened header or classifier field
// ---------------------------------------------------------------------------

/// A dynamically-typed metadata value used when flattening decoded records.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetadataValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Timestamp(NaiveDateTime),
    Null,
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::String(s) => write!(f, "{s}"),
            MetadataValue::Integer(i) => write!(f, "{i}"),
            MetadataValue::Float(v) => write!(f, "{v:.4}"),
            MetadataValue::Bool(b) => write!(f, "{b}"),
            MetadataValue::Timestamp(t) => write!(f, "{}", t.format("%Y-%m-%d %H:%M:%S")),
            MetadataValue::Null => write!(f, "<null>"),
        }
    }
}

impl MetadataValue {
    /// Try to interpret the value as an `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetadataValue::Float(v) => Some(*v),
            MetadataValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl From<Option<NaiveDateTime>> for MetadataValue {
    fn from(value: Option<NaiveDateTime>) -> Self {
        value.map_or(MetadataValue::Null, MetadataValue::Timestamp)
    }
}

// ---------------------------------------------------------------------------
// Spectrum – one decoded file, flattened for analysis
// ---------------------------------------------------------------------------

/// A single spectrum extracted from one ASD file.
#[derive(Debug, Clone, Serialize)]
pub struct Spectrum {
    /// Wavelength axis in nm (x).
    pub x: Vec<f64>,
    /// Selected quantity (y) – same length as `x`.
    pub y: Vec<f64>,
    /// Which quantity `y` holds (after any fallback).
    pub quantity: Quantity,
    /// Flattened header fields: field_name → value.
    pub metadata: BTreeMap<String, MetadataValue>,
}

// ---------------------------------------------------------------------------
// SpectralDataset – several files loaded together
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct SpectralDataset {
    pub spectra: Vec<Spectrum>,
    /// Union of metadata field names across all spectra, sorted.
    pub column_names: Vec<String>,
}

impl SpectralDataset {
    pub fn from_spectra(spectra: Vec<Spectrum>) -> Self {
        let column_names: BTreeSet<&String> =
            spectra.iter().flat_map(|sp| sp.metadata.keys()).collect();
        let column_names = column_names.into_iter().cloned().collect();
        SpectralDataset {
            spectra,
            column_names,
        }
    }

    /// Values of one metadata column, `Null` where a spectrum lacks it.
    pub fn column(&self, name: &str) -> Vec<MetadataValue> {
        self.spectra
            .iter()
            .map(|sp| sp.metadata.get(name).cloned().unwrap_or(MetadataValue::Null))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.spectra.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spectra.is_empty()
    }
}

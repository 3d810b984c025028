//! Reader for ASD field spectroradiometer binary files (`.asd`).
//!
//! A file is decoded in one forward pass over an in-memory buffer: the fixed
//! 484-byte header, then the raw spectrum, the reference header and spectrum,
//! the classifier, dependants, the calibration header, and one calibration
//! buffer per header entry. Derived quantities (reflectance, radiance, white
//! reference) are computed on request from the decoded records.
//!
//! ```no_run
//! use asd_reader::AsdReader;
//!
//! # fn main() -> Result<(), asd_reader::AsdError> {
//! let asd = AsdReader::from_path("leaf00001.asd")?;
//! let wavelengths = asd.wavelengths();
//! let reflectance = asd.reflectance()?;
//! assert_eq!(wavelengths.len(), reflectance.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod derive;
pub mod error;
pub mod reader;

pub use config::{LoadOptions, Quantity};
pub use data::loader::{load_file, load_files};
pub use data::metadata::{Metadata, METADATA_LEN};
pub use data::model::{
    CalibrationType, DataType, Instrument, MetadataValue, SpectralDataset, Spectrum,
    SpectrumFormat,
};
pub use data::sections::{CalibrationEntry, Classifier, Constituent, Dependants, ReferenceHeader};
pub use data::spectra::{CalibrationBuffer, CalibrationSet};
pub use error::{AsdError, Result};
pub use reader::AsdReader;

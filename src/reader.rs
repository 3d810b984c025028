use std::path::Path;

use crate::config::Quantity;
use crate::data::cursor::Cursor;
use crate::data::metadata::{decode_metadata, Metadata};
use crate::data::sections::{
    decode_calibration_header, decode_classifier, decode_dependants, decode_reference_header,
    CalibrationEntry, Classifier, Dependants, ReferenceHeader,
};
use crate::data::spectra::{decode_calibration_buffers, decode_spectrum, CalibrationSet};
use crate::derive;
use crate::error::{AsdError, Result};

// ---------------------------------------------------------------------------
// AsdReader – one fully decoded file
// ---------------------------------------------------------------------------

/// A decoded ASD file.
///
/// Built in a single forward pass; any decode failure aborts construction.
/// Nothing is mutated afterwards, so a reader can be shared across threads.
#[derive(Debug, Clone)]
pub struct AsdReader {
    metadata: Metadata,
    raw: Vec<f64>,
    reference_header: ReferenceHeader,
    reference: Vec<f64>,
    classifier: Classifier,
    dependants: Dependants,
    calibration_header: Vec<CalibrationEntry>,
    calibration: CalibrationSet,
    trailer: Vec<u8>,
}

impl AsdReader {
    /// Read the whole file into memory and decode it.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| AsdError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("decoding {} ({} bytes)", path.display(), bytes.len());
        Self::from_bytes(&bytes)
    }

    /// Decode an in-memory file image.
    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        let (metadata, offset) = decode_metadata(buf)?;
        let channels = metadata.channel_count();
        let mut cur = Cursor::at(buf, offset);

        let raw = decode_spectrum(&mut cur, channels, "raw spectrum")?;
        let reference_header = decode_reference_header(&mut cur)?;
        let reference = decode_spectrum(&mut cur, channels, "reference spectrum")?;
        let classifier = decode_classifier(&mut cur)?;
        let dependants = decode_dependants(&mut cur)?;
        let calibration_header = decode_calibration_header(&mut cur)?;
        let calibration = decode_calibration_buffers(&mut cur, &calibration_header, channels)?;

        let trailer = cur.rest().to_vec();
        if !trailer.is_empty() {
            log::warn!(
                "{} undecoded bytes after offset {} (audit log / signature)",
                trailer.len(),
                cur.offset()
            );
        }

        Ok(Self {
            metadata,
            raw,
            reference_header,
            reference,
            classifier,
            dependants,
            calibration_header,
            calibration,
            trailer,
        })
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Wavelength of each channel in nm.
    pub fn wavelengths(&self) -> Vec<f64> {
        self.metadata.wavelengths()
    }

    pub fn raw(&self) -> &[f64] {
        &self.raw
    }

    pub fn reference(&self) -> &[f64] {
        &self.reference
    }

    pub fn reference_header(&self) -> &ReferenceHeader {
        &self.reference_header
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn dependants(&self) -> &Dependants {
        &self.dependants
    }

    pub fn calibration_header(&self) -> &[CalibrationEntry] {
        &self.calibration_header
    }

    pub fn calibration(&self) -> &CalibrationSet {
        &self.calibration
    }

    /// Bytes after the last calibration buffer, kept undecoded.
    pub fn trailer(&self) -> &[u8] {
        &self.trailer
    }

    // -- derived quantities, recomputed on every call --

    pub fn reflectance(&self) -> Result<Vec<f64>> {
        derive::reflectance(&self.metadata, &self.raw, &self.reference)
    }

    pub fn radiance(&self) -> Result<Vec<f64>> {
        derive::radiance(&self.metadata, &self.raw, &self.reference, &self.calibration)
    }

    pub fn white_reference(&self) -> Vec<f64> {
        derive::white_reference(&self.metadata, &self.reference)
    }

    pub fn quantity(&self, quantity: Quantity) -> Result<Vec<f64>> {
        match quantity {
            Quantity::Raw => Ok(self.raw.clone()),
            Quantity::Reference => Ok(self.reference.clone()),
            Quantity::Reflectance => self.reflectance(),
            Quantity::Radiance => self.radiance(),
            Quantity::WhiteReference => Ok(self.white_reference()),
        }
    }

    /// Try `primary`; on a recoverable error try `fallback` instead.
    ///
    /// Returns the quantity that was actually produced.
    pub fn quantity_with_fallback(
        &self,
        primary: Quantity,
        fallback: Option<Quantity>,
    ) -> Result<(Quantity, Vec<f64>)> {
        match (self.quantity(primary), fallback) {
            (Ok(values), _) => Ok((primary, values)),
            (Err(e), Some(fallback)) if e.is_recoverable() => {
                log::info!("{e}; falling back to {fallback}");
                Ok((fallback, self.quantity(fallback)?))
            }
            (Err(e), _) => Err(e),
        }
    }
}

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};

use super::metadata::Metadata;
use super::model::{MetadataValue, SpectralDataset, Spectrum};
use super::sections::Classifier;
use crate::config::LoadOptions;
use crate::reader::AsdReader;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load one spectrum from a file.  Dispatch by extension.
///
/// Only `.asd` is supported; the extension check is case-insensitive.
pub fn load_file(path: &Path, options: &LoadOptions) -> Result<Spectrum> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "asd" => load_asd(path, options),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

/// Load several files into one dataset; the first failure aborts the load.
pub fn load_files<P: AsRef<Path>>(paths: &[P], options: &LoadOptions) -> Result<SpectralDataset> {
    let spectra = paths
        .iter()
        .map(|p| {
            let p = p.as_ref();
            load_file(p, options).with_context(|| format!("loading {}", p.display()))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(SpectralDataset::from_spectra(spectra))
}

// ---------------------------------------------------------------------------
// ASD loader
// ---------------------------------------------------------------------------

fn load_asd(path: &Path, options: &LoadOptions) -> Result<Spectrum> {
    let reader = AsdReader::from_path(path).context("decoding ASD file")?;
    let mut spectrum = to_spectrum(&reader, options)?;
    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
        spectrum
            .metadata
            .insert("file_name".into(), MetadataValue::String(stem.to_string()));
    }
    Ok(spectrum)
}

/// Flatten a decoded file into a [`Spectrum`] row.
pub fn to_spectrum(reader: &AsdReader, options: &LoadOptions) -> Result<Spectrum> {
    let (quantity, y) = reader
        .quantity_with_fallback(options.quantity, options.fallback)
        .with_context(|| format!("computing {}", options.quantity))?;

    let mut metadata = metadata_columns(reader.metadata());
    if options.include_classifier {
        classifier_columns(reader.classifier(), &mut metadata);
    }

    Ok(Spectrum {
        x: reader.wavelengths(),
        y,
        quantity,
        metadata,
    })
}

// -- flattening helpers --

fn metadata_columns(md: &Metadata) -> BTreeMap<String, MetadataValue> {
    use MetadataValue::{Bool, Float, Integer, String as Text};

    let fields = [
        ("file_version", Text(md.file_version.clone())),
        ("comment", Text(md.comment.clone())),
        ("save_time", md.save_datetime().into()),
        ("dc_corrected", Bool(md.dc_corrected)),
        ("dc_time", MetadataValue::Timestamp(md.dc_time.naive_utc())),
        ("ref_time", MetadataValue::Timestamp(md.ref_time.naive_utc())),
        ("data_type", Text(md.data_type.to_string())),
        ("data_format", Text(md.data_format.to_string())),
        ("instrument", Text(md.instrument.to_string())),
        ("instrument_num", Integer(md.instrument_num.into())),
        ("calibration", Integer(md.calibration.into())),
        ("channels", Integer(md.channels.into())),
        ("ch1_wave", Float(md.ch1_wave.into())),
        ("wave1_step", Float(md.wave1_step.into())),
        ("integration_time", Integer(md.integration_time.into())),
        ("dc_count", Integer(md.dc_count.into())),
        ("ref_count", Integer(md.ref_count.into())),
        ("sample_count", Integer(md.sample_count.into())),
        ("swir1_gain", Integer(md.swir1_gain.into())),
        ("swir2_gain", Integer(md.swir2_gain.into())),
        ("swir1_offset", Integer(md.swir1_offset.into())),
        ("swir2_offset", Integer(md.swir2_offset.into())),
        ("splice1", Integer(md.splice1_index() as i64)),
        ("splice2", Integer(md.splice2_index() as i64)),
        ("vnir_saturated", Bool(md.vnir_saturated())),
        ("swir1_saturated", Bool(md.swir1_saturated())),
        ("swir2_saturated", Bool(md.swir2_saturated())),
    ];
    fields
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

fn classifier_columns(classifier: &Classifier, out: &mut BTreeMap<String, MetadataValue>) {
    for (name, value) in classifier.fields() {
        let value = if value.is_empty() {
            MetadataValue::Null
        } else {
            MetadataValue::String(value.to_string())
        };
        out.insert(format!("classifier.{name}"), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_extension() {
        let err = load_file(Path::new("scan.csv"), &LoadOptions::default()).unwrap_err();
        assert!(err.to_string().contains(".csv"));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = load_file(Path::new("/nonexistent/leaf00001.asd"), &LoadOptions::default())
            .unwrap_err();
        let chain = format!("{err:#}");
        assert!(chain.contains("decoding ASD file"));
        assert!(chain.contains("leaf00001.asd"));
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Quantity – which spectrum a caller wants out of a file
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantity {
    Raw,
    Reference,
    Reflectance,
    Radiance,
    WhiteReference,
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Quantity::Raw => "raw",
            Quantity::Reference => "reference",
            Quantity::Reflectance => "reflectance",
            Quantity::Radiance => "radiance",
            Quantity::WhiteReference => "white_reference",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// LoadOptions – how files are flattened into `Spectrum` rows
// ---------------------------------------------------------------------------

/// Options for [`crate::data::loader`].
///
/// JSON form (all keys optional):
/// ```json
/// { "quantity": "radiance", "fallback": "raw", "include_classifier": true }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Quantity placed on the y axis.
    pub quantity: Quantity,
    /// Used when `quantity` is not available for a file's data type.
    pub fallback: Option<Quantity>,
    /// Add the classifier's text fields to each spectrum's metadata.
    pub include_classifier: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            quantity: Quantity::Reflectance,
            fallback: Some(Quantity::WhiteReference),
            include_classifier: false,
        }
    }
}

impl LoadOptions {
    pub fn from_json_str(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = LoadOptions::default();
        assert_eq!(opts.quantity, Quantity::Reflectance);
        assert_eq!(opts.fallback, Some(Quantity::WhiteReference));
        assert!(!opts.include_classifier);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let opts = LoadOptions::from_json_str(r#"{ "quantity": "radiance" }"#).unwrap();
        assert_eq!(opts.quantity, Quantity::Radiance);
        assert_eq!(opts.fallback, Some(Quantity::WhiteReference));
    }

    #[test]
    fn test_full_json() {
        let opts = LoadOptions::from_json_str(
            r#"{ "quantity": "white_reference", "fallback": null, "include_classifier": true }"#,
        )
        .unwrap();
        assert_eq!(opts.quantity, Quantity::WhiteReference);
        assert_eq!(opts.fallback, None);
        assert!(opts.include_classifier);
    }

    #[test]
    fn test_unknown_quantity_rejected() {
        assert!(LoadOptions::from_json_str(r#"{ "quantity": "absorbance" }"#).is_err());
    }
}

/// Data layer: binary decoding and the flattened export model.
///
/// Architecture:
/// ```text
///   file bytes (immutable, fully read)
///        │
///        ▼
///   ┌──────────┐
///   │  cursor   │  bounds-checked LE scalars, i16-prefixed strings, f64 arrays
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐  [0, 484)          ┌──────────┐  484..
///   │ metadata  │ ─────────────────▶ │ sections  │  raw ▸ ref header ▸ ref
///   └──────────┘                     │ spectra   │  ▸ classifier ▸ dependants
///                                    └──────────┘  ▸ cal header ▸ cal buffers
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  AsdReader → Spectrum / SpectralDataset
///   └──────────┘
/// ```

pub mod cursor;
pub mod loader;
pub mod metadata;
pub mod model;
pub mod sections;
pub mod spectra;

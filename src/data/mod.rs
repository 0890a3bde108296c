/// Data layer: core types and file intake.
///
/// Architecture:
/// ```text
///  .csv / .tsv / .txt / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │   Dataset     │  Vec<Measurement>, column index
///   └──────────────┘
///        │
///        ▼
///   pipeline::extract_features, one Curve at a time
/// ```

pub mod loader;
pub mod model;

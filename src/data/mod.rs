/// Data layer: core types, loading, cleaning and export.
///
/// Architecture:
/// ```text
///  .csv / .tsv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → RawTable (typed cells, may be missing)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  clean    │  drop incomplete rows, keep numeric columns
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Matrix   │  dense features × samples, unique ids
///   └──────────┘
/// ```
///
/// `export` goes the other way and writes a `RawTable` back to disk.

pub mod clean;
pub mod export;
pub mod loader;
pub mod model;

pub use model::{CellValue, Matrix, RawTable};

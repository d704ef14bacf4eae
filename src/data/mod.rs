/// Data layer: tabular input before it becomes ARFF.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table (typed cells)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  model    │  Vec<column name>, Vec<row>
///   └──────────┘
/// ```

pub mod loader;
pub mod model;

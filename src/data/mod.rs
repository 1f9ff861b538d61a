/// Data layer: core types, loading, caching and filtering.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset (identifier and incomplete rows dropped)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  cache    │  one load per path, shared Arc<Dataset>
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  apply column selections → FilteredView
///   └──────────┘
/// ```

pub mod cache;
pub mod filter;
pub mod loader;
pub mod model;

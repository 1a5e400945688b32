/// Data layer: the load → filter → aggregate pipeline.
///
/// Architecture:
/// ```text
///  .xlsx / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  resolve schema, coerce cells → NormalizedTable
///   └──────────┘
///        │
///        ▼
///   ┌────────────────┐
///   │ NormalizedTable │  immutable records + resolved schema
///   └────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  apply FilterCriteria → filtered indices
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  group means, trend, overall stats
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  export   │  filtered view → CSV
///   └──────────┘
/// ```
pub mod aggregate;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod schema;

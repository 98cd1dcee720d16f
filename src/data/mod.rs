//! Data layer: typed schema, loading, cleaning, filtering and aggregation.
//!
//! Architecture:
//! ```text
//!  .csv / .json / .parquet
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → ListingTable (typed columns, bad cells → null)
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  clean    │  per-column 95th percentile trim, Car_Age
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  store    │  DataStore: cleaned table + page bases, shared by reference
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐      ┌───────────┐
//!   │  filter   │ ──▶ │ aggregate  │  widget predicate → chart-ready tables
//!   └──────────┘      └───────────┘
//! ```

pub mod aggregate;
pub mod clean;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
pub mod store;

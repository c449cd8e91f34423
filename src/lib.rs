//! Spectrum Tiers - crawl ISED spectrum licence decisions and load the
//! Canadian service-area tiers into DuckDB.
//!
//! This library provides the shared modules for the crawl, load and export
//! binaries.

pub mod config;
pub mod crawler;
pub mod gpkg;
pub mod store;
pub mod tiers;

pub use config::Config;
pub use store::DuckStore;
pub use tiers::{TierFeature, TierLayer};

//! Shared helpers for the LORIOT migration tooling
//!
//! Provides the pieces every binary in this workspace needs:
//! - logging bootstrap
//! - CSV loading with graceful handling of missing export files
//! - serde deserializers for loosely-typed CSV cells

pub mod csv_loader;
pub mod logging;
pub mod serde_helpers;

pub use csv_loader::{load_csv_optional, load_csv_typed};

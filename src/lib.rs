//! Hierarchical todo store.
//!
//! Tasks form a forest under `parent_id`. Every mutation that touches more
//! than one row runs inside a savepoint, so a failed call leaves the store
//! exactly as it found it.

pub mod db;
pub mod error;
pub mod model;
pub mod ops;
pub mod settings;
pub mod validate;

pub use db::Store;
pub use error::{Error, Result};

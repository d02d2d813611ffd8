//! Path and URL utilities.
//!
//! - [`fs`]: filesystem paths and slash-separated relative keys
//! - [`route`]: URL references inside documents (`is_external_link`, `resolve_reference`)

pub mod fs;
pub mod route;

pub use fs::{normalize_path, rel_key};

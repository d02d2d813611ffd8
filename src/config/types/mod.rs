//! Configuration utility types.
//!
//! | Module   | Purpose                                   |
//! |----------|-------------------------------------------|
//! | `error`  | Configuration error types                 |
//! | `field`  | Field paths for diagnostics               |
//! | `handle` | Global configuration handle (reloadable)  |
//! | `layout` | Per-environment output directories        |

mod error;
mod field;
pub mod handle;
mod layout;

pub use error::{ConfigDiagnostics, ConfigError};
pub use field::FieldPath;
pub use handle::{cfg, init_config, reload_config};
pub use layout::Layout;

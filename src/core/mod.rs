//! Core types shared across the pipeline.

mod cancel;
mod env;
mod state;

pub use cancel::CancelToken;
pub use env::BuildEnv;
pub use state::{is_shutdown, register_shutdown, setup_shutdown_handler};

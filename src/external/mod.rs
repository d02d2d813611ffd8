//! Subprocess boundaries of the pipeline.
//!
//! The site generator and the diagram renderer are opaque programs. They sit
//! behind traits so builds can run against in-process fakes in tests.

mod generator;
mod renderer;

pub use generator::{CommandGenerator, Generator};
pub use renderer::{CommandRenderer, Renderer};

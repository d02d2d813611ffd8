//! Utility modules shared across the pipeline.

pub mod date;
pub mod exec;
pub mod git;
pub mod hash;
pub mod html;
pub mod mime;
pub mod path;
pub mod plural;

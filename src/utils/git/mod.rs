//! Git plumbing for publishing the serve directory.
//!
//! The repository is created fresh inside the tree being published, holds a
//! single commit of every file (dot-files included) and is pushed with the
//! `git` CLI.

mod remote;
mod repo;
mod tree;

pub use remote::{authenticated_url, push, redact_url};
pub use repo::{commit_all, create_repo};

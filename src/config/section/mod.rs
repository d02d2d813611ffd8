//! Configuration section definitions.
//!
//! | Module      | TOML Section   | Purpose                              |
//! |-------------|----------------|--------------------------------------|
//! | `generator` | `[generator]`  | External site generator              |
//! | `diagrams`  | `[diagrams]`   | Diagram renderer subprocess          |
//! | `build`     | `[build]`, `[stages.*]` | Output root, minify, stages |
//! | `revision`  | `[revision]`   | Fingerprinting and exclusions        |
//! | `serve`     | `[serve]`      | HTTPS dev server and live reload     |
//! | `watch`     | `[watch]`      | File watcher                         |
//! | `lint`      | `[lint]`       | Lint checks                          |
//! | `deploy`    | `[deploy]`     | Publishing to a hosting branch       |

mod build;
mod deploy;
mod diagrams;
mod generator;
mod lint;
mod revision;
mod serve;
mod watch;

pub use build::{BuildConfig, StageConfig, StagesConfig};
pub use deploy::DeployConfig;
pub use diagrams::DiagramsConfig;
pub use generator::GeneratorConfig;
pub use lint::LintConfig;
pub use revision::RevisionConfig;
pub use serve::ServeConfig;
pub use watch::WatchConfig;

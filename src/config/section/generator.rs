//! `[generator]` section configuration.
//!
//! ```toml
//! [generator]
//! command = ["bundle", "exec", "jekyll", "build"]
//! destination_flag = "--destination"
//! env_var = "JEKYLL_ENV"
//! timeout_secs = 600            # unset: wait forever
//!
//! [generator.flags]
//! development = ["--drafts"]
//! production = []
//! ```

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::core::BuildEnv;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// External site generator invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Program followed by its fixed arguments.
    pub command: Vec<String>,

    /// Flag that precedes the destination directory.
    pub destination_flag: String,

    /// Environment variable carrying the build env name.
    pub env_var: String,

    /// Extra arguments keyed by build env name.
    pub flags: BTreeMap<String, Vec<String>>,

    pub timeout_secs: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            command: ["bundle", "exec", "jekyll", "build"].map(String::from).to_vec(),
            destination_flag: "--destination".to_string(),
            env_var: "JEKYLL_ENV".to_string(),
            flags: BTreeMap::from([
                (BuildEnv::Development.to_string(), vec!["--drafts".to_string()]),
                (BuildEnv::Production.to_string(), Vec::new()),
            ]),
            timeout_secs: None,
        }
    }
}

impl GeneratorConfig {
    pub fn flags_for(&self, env: BuildEnv) -> &[String] {
        self.flags.get(env.as_str()).map_or(&[], Vec::as_slice)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.command.first().is_none_or(|p| p.trim().is_empty()) {
            diag.error(FieldPath::new("generator.command"), "must name a program");
        }
        for key in self.flags.keys() {
            if BuildEnv::from_str(key, false).is_err() {
                diag.warn(
                    FieldPath::new("generator.flags"),
                    format!("`{key}` is not a build env and will never be used"),
                );
            }
        }
        if self.timeout_secs == Some(0) {
            diag.error_with_hint(
                FieldPath::new("generator.timeout_secs"),
                "timeout of 0 seconds would kill every run",
                "remove the field to wait without a limit",
            );
        }
    }
}

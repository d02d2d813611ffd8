//! Build environment selection.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Build mode for one invocation.
///
/// Picks the output directory `<output-root>/<env>/`, the generator flags,
/// and whether assets are minified. Fixed for the whole process.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum BuildEnv {
    #[default]
    Development,
    Production,
}

impl BuildEnv {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }

    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for BuildEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_development() {
        assert_eq!(BuildEnv::default(), BuildEnv::Development);
        assert!(!BuildEnv::default().is_production());
    }

    #[test]
    fn test_serde_lowercase() {
        #[derive(Deserialize)]
        struct Wrap {
            env: BuildEnv,
        }
        let w: Wrap = toml::from_str("env = \"production\"").unwrap();
        assert_eq!(w.env, BuildEnv::Production);
        assert_eq!(w.env.to_string(), "production");
    }

    #[test]
    fn test_value_enum_parse() {
        assert_eq!(BuildEnv::from_str("production", true), Ok(BuildEnv::Production));
        assert!(BuildEnv::from_str("staging", true).is_err());
    }
}

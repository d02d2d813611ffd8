//! `[serve]` section configuration.
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"
//! port = 4000
//! tls = true
//! cert = "certs/localhost.pem"      # PEM, relative to the site root
//! key = "certs/localhost-key.pem"
//! not_found = "404.html"            # relative to the serve directory
//! livereload = true
//! reload_port = 35729
//! watch = true
//! ```

use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

/// Development server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    pub interface: IpAddr,
    pub port: u16,

    /// Serve over HTTPS with `cert`/`key`. Plain HTTP when false.
    pub tls: bool,
    pub cert: PathBuf,
    pub key: PathBuf,

    /// Body of every 404 response.
    pub not_found: PathBuf,

    /// Inject the reload script and run the WebSocket listener.
    pub livereload: bool,
    pub reload_port: u16,

    /// Rebuild on source changes.
    pub watch: bool,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 4000,
            tls: true,
            cert: PathBuf::from("certs/localhost.pem"),
            key: PathBuf::from("certs/localhost-key.pem"),
            not_found: PathBuf::from("404.html"),
            livereload: true,
            reload_port: 35729,
            watch: true,
        }
    }
}

impl ServeConfig {
    /// Certificate files must exist before the server may start.
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.tls {
            for (field, path) in [("serve.cert", &self.cert), ("serve.key", &self.key)] {
                if !path.is_file() {
                    diag.error_with_hint(
                        FieldPath::new(field),
                        format!("file not found: {}", path.display()),
                        "generate a local pair (e.g. with mkcert) or set `tls = false`",
                    );
                }
            }
        }
        if self.livereload && self.reload_port == self.port {
            diag.error(
                FieldPath::new("serve.reload_port"),
                "must differ from `serve.port`",
            );
        }
        if self.not_found.is_absolute() {
            diag.error(
                FieldPath::new("serve.not_found"),
                "must be relative to the serve directory",
            );
        }
    }
}

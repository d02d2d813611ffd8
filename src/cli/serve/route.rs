//! Request path to reply resolution.
//!
//! Pure apart from filesystem probes under the serve root:
//!
//! | Request                | Reply                                  |
//! |------------------------|----------------------------------------|
//! | `/docs/index.html`     | 302 to `/docs/`                        |
//! | `/css/main.css`        | the file                               |
//! | `/docs/`               | `docs/index.html`                      |
//! | `/about`               | `about.html`, else `about.xml`         |
//! | `/../etc/passwd`       | not found                              |

use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};

const INDEX: &str = "index.html";
const FALLBACK_EXTENSIONS: [&str; 2] = ["html", "xml"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// 302 with this `Location`.
    Redirect(String),
    File(PathBuf),
    NotFound,
}

pub fn route(url: &str, root: &Path) -> Reply {
    let (raw_path, query) = match url.find(['?', '#']) {
        Some(i) => (&url[..i], &url[i..]),
        None => (url, ""),
    };
    let Ok(decoded) = percent_decode_str(raw_path).decode_utf8() else {
        return Reply::NotFound;
    };

    if decoded.ends_with(&format!("/{INDEX}")) {
        let location = raw_path
            .strip_suffix(INDEX)
            .unwrap_or(&decoded[..decoded.len() - INDEX.len()]);
        let query = if query.starts_with('?') { query } else { "" };
        return Reply::Redirect(format!("{location}{query}"));
    }

    let mut local = root.to_path_buf();
    let mut last = "";
    for segment in decoded.split('/').filter(|s| !s.is_empty() && *s != ".") {
        if segment == ".." || segment.contains(['\\', '\0']) {
            return Reply::NotFound;
        }
        local.push(segment);
        last = segment;
    }

    let found = if local.is_file() {
        Some(local)
    } else if local.is_dir() {
        Some(local.join(INDEX)).filter(|p| p.is_file())
    } else if !last.is_empty() && !last.contains('.') {
        FALLBACK_EXTENSIONS
            .iter()
            .map(|ext| local.with_extension(ext))
            .find(|p| p.is_file())
    } else {
        None
    };

    match found {
        Some(path) if within_root(&path, root) => Reply::File(path),
        _ => Reply::NotFound,
    }
}

/// Reject files reached through symlinks pointing out of the root.
fn within_root(path: &Path, root: &Path) -> bool {
    match (path.canonicalize(), root.canonicalize()) {
        (Ok(path), Ok(root)) => path.starts_with(root),
        _ => false,
    }
}

//! Aggregate lint over the generation snapshot.
//!
//! Every enabled sub-lint runs over every file it applies to; all issues are
//! collected and reported together before the verdict.

mod checks;
mod report;

pub use checks::Check;
pub use report::{LintIssue, LintReport};

use crate::config::LintConfig;
use crate::log;
use crate::pipeline::fileset::FileSet;
use crate::utils::plural::plural_count;
use anyhow::{Result, bail};
use rayon::prelude::*;
use std::path::Path;

/// Run the enabled checks over every file under `dir`.
pub fn run_checks(dir: &Path, config: &LintConfig) -> Result<LintReport> {
    let files = FileSet::scan(dir)?;
    let results = files
        .keys()
        .par_iter()
        .filter_map(|key| Check::for_key(key, config).map(|check| (key, check)))
        .map(|(key, check)| {
            let bytes = files.read(key)?;
            let issues = match std::str::from_utf8(&bytes) {
                Ok(source) => check.run(key, source, &files),
                Err(e) => vec![LintIssue::new(format!("not valid UTF-8: {e}"))],
            };
            Ok((check, key, issues))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut report = LintReport::default();
    for (check, key, issues) in results {
        report.add(check.name(), key, issues);
    }
    Ok(report)
}

/// Print the report, then fail when issues were found and `fail` is set.
pub fn conclude(report: &LintReport, fail: bool) -> Result<()> {
    report.print();
    log!("lint"; "checked {}: {report}", plural_count(report.files_checked(), "file"));
    if !report.is_empty() && fail {
        bail!("lint failed with {}", plural_count(report.issue_count(), "issue"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::fileset::write_file;
    use tempfile::TempDir;

    fn site() -> TempDir {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "index.html", br#"<img src="/logo.svg"><a href="/nope.html">x</a>"#).unwrap();
        write_file(dir.path(), "logo.svg", b"<svg xmlns=\"http://www.w3.org/2000/svg\"><g></svg>").unwrap();
        write_file(dir.path(), "data.json", b"{\"a\":}").unwrap();
        write_file(dir.path(), "ok.css", b"a{color:red}").unwrap();
        write_file(dir.path(), "photo.png", b"\x89PNG").unwrap();
        dir
    }

    #[test]
    fn test_all_issues_collected_before_failing() {
        let dir = site();
        let report = run_checks(dir.path(), &LintConfig::default()).unwrap();

        assert_eq!(report.files_checked(), 4);
        assert_eq!(report.issues("html", "index.html").len(), 2);
        assert_eq!(report.issues("xml", "logo.svg").len(), 1);
        assert_eq!(report.issues("json", "data.json").len(), 1);
        assert_eq!(report.issue_count(), 4);
        assert!(conclude(&report, LintConfig::default().fail_on_error).is_err());
    }

    #[test]
    fn test_advisory_mode_does_not_fail() {
        let dir = site();
        let config = LintConfig {
            fail_on_error: false,
            ..LintConfig::default()
        };
        let report = run_checks(dir.path(), &config).unwrap();
        assert!(!report.is_empty());
        assert!(conclude(&report, config.fail_on_error).is_ok());
    }
}

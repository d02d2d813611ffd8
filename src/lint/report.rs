//! Lint report types and formatting.

use owo_colors::OwoColorize;
use std::collections::BTreeMap;
use std::fmt;

use crate::utils::plural::plural_s;

/// A single lint finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintIssue {
    /// `line:column` or the offending reference, when known.
    pub location: Option<String>,
    pub message: String,
}

impl LintIssue {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            location: None,
            message: message.into(),
        }
    }

    pub fn at(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            location: Some(location.into()),
            message: message.into(),
        }
    }
}

/// Issues of every sub-lint, grouped by check, then by file.
#[derive(Debug, Default)]
pub struct LintReport {
    checks: BTreeMap<&'static str, BTreeMap<String, Vec<LintIssue>>>,
    files_checked: usize,
}

impl LintReport {
    pub fn add(&mut self, check: &'static str, file: &str, issues: Vec<LintIssue>) {
        self.files_checked += 1;
        if issues.is_empty() {
            return;
        }
        self.checks
            .entry(check)
            .or_default()
            .entry(file.to_string())
            .or_default()
            .extend(issues);
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn issue_count(&self) -> usize {
        self.checks
            .values()
            .flat_map(BTreeMap::values)
            .map(Vec::len)
            .sum()
    }

    pub fn files_checked(&self) -> usize {
        self.files_checked
    }

    pub fn issues(&self, check: &str, file: &str) -> &[LintIssue] {
        self.checks
            .get(check)
            .and_then(|files| files.get(file))
            .map_or(&[], Vec::as_slice)
    }

    /// Print every section to stderr (css -> html -> js -> json -> xml).
    pub fn print(&self) {
        for (check, files) in &self.checks {
            print_section(check, files);
        }
    }
}

fn print_section(name: &str, files: &BTreeMap<String, Vec<LintIssue>>) {
    eprintln!();
    let file_count = files.len();
    let issue_count: usize = files.values().map(Vec::len).sum();
    eprintln!(
        "{} {}",
        name.red().bold(),
        format!(
            "({file_count} file{}, {issue_count} issue{})",
            plural_s(file_count),
            plural_s(issue_count)
        )
        .dimmed()
    );

    for (path, issues) in files {
        eprintln!("{}{}{}", "[".dimmed(), path.cyan(), "]".dimmed());
        for issue in issues {
            match &issue.location {
                Some(location) => eprintln!("{} {} {}", "→".red(), location.dimmed(), issue.message),
                None => eprintln!("{} {}", "→".red(), issue.message),
            }
        }
    }
}

impl fmt::Display for LintReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.issue_count();
        if total == 0 {
            write!(f, "{}", "all checks passed".green())
        } else {
            write!(
                f,
                "{} {} {}",
                "found".dimmed(),
                total.to_string().red().bold(),
                format!("issue{}", plural_s(total)).dimmed()
            )
        }
    }
}

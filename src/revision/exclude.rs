//! Exclusion pattern lists.
//!
//! Matched against rooted paths (`/css/main.css`):
//! - `/.../` is a regular expression (`/\.html$/`)
//! - a literal starting with `/` must equal the rooted path (`/index.html`)
//! - any other literal matches trailing path segments (`favicon.ico`,
//!   `img/logo.svg`)

use super::RevisionError;
use regex::Regex;

#[derive(Debug, Clone)]
enum Pattern {
    Regex(Regex),
    Rooted(String),
    /// Stored with its leading `/` so only whole segments match.
    Suffix(String),
}

impl Pattern {
    fn parse(raw: &str) -> Result<Self, RevisionError> {
        if raw.len() > 2
            && let Some(body) = raw.strip_prefix('/').and_then(|r| r.strip_suffix('/'))
        {
            return Regex::new(body)
                .map(Self::Regex)
                .map_err(|e| RevisionError::InvalidPattern {
                    pattern: raw.to_string(),
                    message: e.to_string(),
                });
        }
        if raw.starts_with('/') {
            Ok(Self::Rooted(raw.to_string()))
        } else {
            Ok(Self::Suffix(format!("/{raw}")))
        }
    }

    fn matches(&self, rooted: &str) -> bool {
        match self {
            Self::Regex(re) => re.is_match(rooted),
            Self::Rooted(path) => rooted == path,
            Self::Suffix(tail) => rooted.ends_with(tail.as_str()),
        }
    }
}

/// An ordered list of patterns; a path is excluded when any of them matches.
#[derive(Debug, Clone, Default)]
pub struct PatternList(Vec<Pattern>);

impl PatternList {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, RevisionError> {
        patterns
            .iter()
            .map(AsRef::as_ref)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(Pattern::parse)
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    pub fn matches(&self, rooted: &str) -> bool {
        self.0.iter().any(|p| p.matches(rooted))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rooted_literal() {
        let list = PatternList::new(&["/index.html"]).unwrap();
        assert!(list.matches("/index.html"));
        assert!(!list.matches("/blog/index.html"));
    }

    #[test]
    fn test_suffix_literal_matches_whole_segments() {
        let list = PatternList::new(&["favicon.ico", "img/logo.svg"]).unwrap();
        assert!(list.matches("/favicon.ico"));
        assert!(list.matches("/blog/favicon.ico"));
        assert!(list.matches("/theme/img/logo.svg"));
        assert!(!list.matches("/myfavicon.ico"));
    }

    #[test]
    fn test_regex() {
        let list = PatternList::new(&[r"/\.html$/", r"/^/vendor/\d+/"]).unwrap();
        assert!(list.matches("/about/index.html"));
        assert!(list.matches("/vendor/3/lib.js"));
        assert!(!list.matches("/about.html.bak"));
    }

    #[test]
    fn test_invalid_regex() {
        let err = PatternList::new(&["/(unclosed/"]).unwrap_err();
        assert!(err.to_string().contains("(unclosed"));
    }

    #[test]
    fn test_empty_list_matches_nothing() {
        let list = PatternList::new::<&str>(&[]).unwrap();
        assert!(list.is_empty());
        assert!(!list.matches("/a.css"));
    }
}

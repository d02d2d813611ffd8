//! URL reference handling for links found inside documents.

/// Check if a link is external (has a URL scheme like `https:` or `mailto:`),
/// or is protocol-relative (`//cdn.example.com/...`).
pub fn is_external_link(link: &str) -> bool {
    link.starts_with("//")
        || link.find(':').is_some_and(|pos| {
            pos > 0
                && link[..pos]
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        })
}

/// Split a reference into its path and the `?query#fragment` suffix.
pub fn split_suffix(link: &str) -> (&str, &str) {
    match link.find(['?', '#']) {
        Some(pos) => link.split_at(pos),
        None => (link, ""),
    }
}

/// Directory part of a relative key (`blog/post.html` -> `blog`).
pub fn parent_key(key: &str) -> &str {
    key.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// Resolve a document reference to a tree key.
///
/// Absolute references (`/css/a.css`) resolve against the tree root, relative
/// ones (`a.css`, `./a.css`, `../a.css`) against `base_dir`. Returns `None` for
/// external links, empty paths, and references climbing above the root.
pub fn resolve_reference(base_dir: &str, reference: &str) -> Option<String> {
    let (path, _) = split_suffix(reference);
    if path.is_empty() || is_external_link(path) {
        return None;
    }

    let (start, rest) = match path.strip_prefix('/') {
        Some(rest) => ("", rest),
        None => (base_dir, path),
    };

    let mut parts: Vec<&str> = start.split('/').filter(|s| !s.is_empty()).collect();
    for segment in rest.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            s => parts.push(s),
        }
    }
    (!parts.is_empty()).then(|| parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_external_link() {
        assert!(is_external_link("https://example.com/a.css"));
        assert!(is_external_link("mailto:user@example.com"));
        assert!(is_external_link("//cdn.example.com/a.js"));
        assert!(!is_external_link("/about"));
        assert!(!is_external_link("./file.txt"));
    }

    #[test]
    fn test_split_suffix() {
        assert_eq!(split_suffix("a.css?v=1#x"), ("a.css", "?v=1#x"));
        assert_eq!(split_suffix("a.svg#icon"), ("a.svg", "#icon"));
        assert_eq!(split_suffix("a.js"), ("a.js", ""));
    }

    #[test]
    fn test_resolve_reference() {
        assert_eq!(resolve_reference("blog", "/css/a.css").as_deref(), Some("css/a.css"));
        assert_eq!(resolve_reference("blog", "img/x.png").as_deref(), Some("blog/img/x.png"));
        assert_eq!(resolve_reference("blog", "./x.png").as_deref(), Some("blog/x.png"));
        assert_eq!(resolve_reference("blog/2024", "../../a.js?v=2").as_deref(), Some("a.js"));
        assert_eq!(resolve_reference("", "../a.js"), None);
        assert_eq!(resolve_reference("", "https://x.org/a.js"), None);
        assert_eq!(resolve_reference("", "#top"), None);
    }

    #[test]
    fn test_parent_key() {
        assert_eq!(parent_key("blog/post.html"), "blog");
        assert_eq!(parent_key("index.html"), "");
    }
}

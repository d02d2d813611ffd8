//! Low-level HTML scanning shared by the HTML stage.
//!
//! Offsets are byte indices into `&str`; every split happens on an ASCII
//! byte so slicing never lands inside a multi-byte character.

/// Raw text elements: content is not markup (script, style).
pub fn is_raw_text_element(tag: &str) -> bool {
    tag.eq_ignore_ascii_case("script") || tag.eq_ignore_ascii_case("style")
}

/// Elements whose text whitespace is significant.
pub fn is_whitespace_sensitive(tag: &str) -> bool {
    ["pre", "textarea", "code"]
        .iter()
        .any(|t| tag.eq_ignore_ascii_case(t))
}

/// Index just past the `>` closing the tag that starts at `start`.
///
/// Quoted attribute values may contain `>`.
pub fn find_tag_end(s: &str, start: usize) -> Option<usize> {
    let mut quote = None;
    for (i, b) in s.as_bytes().iter().enumerate().skip(start + 1) {
        match (quote, *b) {
            (Some(q), b) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(*b),
            (None, b'>') => return Some(i + 1),
            _ => {}
        }
    }
    None
}

/// Case-insensitive search for an ASCII `needle` at or after `from`.
pub fn find_ascii_ci(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let hay = haystack.as_bytes();
    let needle = needle.as_bytes();
    if needle.is_empty() || from >= hay.len() {
        return None;
    }
    hay[from..]
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle))
        .map(|i| i + from)
}

/// Tag name at the start of `s` (after `<` or `</`).
pub fn tag_name(s: &str) -> &str {
    let end = s
        .find(|c: char| c.is_ascii_whitespace() || c == '/' || c == '>')
        .unwrap_or(s.len());
    &s[..end]
}

/// Parse HTML-style attributes from the inside of a start tag.
///
/// Input: `src="a.svg" class='x' data-inline`
/// Output: `[("src", "a.svg"), ("class", "x"), ("data-inline", "")]`
///
/// Names keep their case (`viewBox`); values are returned raw, entities
/// included.
pub fn parse_attributes(s: &str) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    let mut rest = s.trim_start();

    while !rest.is_empty() {
        let name_end = rest
            .find(|c: char| c == '=' || c.is_whitespace())
            .unwrap_or(rest.len());
        let name = &rest[..name_end];
        rest = rest[name_end..].trim_start();

        let value = if let Some(after_eq) = rest.strip_prefix('=') {
            let after_eq = after_eq.trim_start();
            match after_eq.chars().next() {
                Some(quote @ ('"' | '\'')) => {
                    let body = &after_eq[1..];
                    let end = body.find(quote).unwrap_or(body.len());
                    rest = body.get(end + 1..).unwrap_or("");
                    &body[..end]
                }
                _ => {
                    let end = after_eq.find(char::is_whitespace).unwrap_or(after_eq.len());
                    rest = &after_eq[end..];
                    &after_eq[..end]
                }
            }
        } else {
            ""
        };

        let name = name.trim_end_matches('/');
        if !name.is_empty() {
            attrs.push((name.to_string(), value.to_string()));
        }
        rest = rest.trim_start();
    }

    attrs
}

/// Case-insensitive attribute lookup.
pub fn attr<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// ` name="value"`, switching to single quotes when the raw value holds `"`.
pub fn write_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    if value.is_empty() {
        return;
    }
    let quote = if value.contains('"') { '\'' } else { '"' };
    out.push('=');
    out.push(quote);
    out.push_str(value);
    out.push(quote);
}

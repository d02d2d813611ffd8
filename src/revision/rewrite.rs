//! Best-effort reference rewriting in text files.
//!
//! A reference is any maximal run of non-delimiter characters. It is
//! resolved like a link (absolute from the root, relative from the file's
//! directory, query and fragment ignored) and, when it names a renamed file,
//! its basename is replaced in place. Anything else is left alone.

use crate::utils::path::route::{parent_key, resolve_reference, split_suffix};
use std::borrow::Cow;

fn is_delimiter(c: char) -> bool {
    c.is_whitespace()
        || matches!(
            c,
            '"' | '\'' | '`' | '(' | ')' | '<' | '>' | ',' | ';' | '=' | '{' | '}' | '[' | ']' | '|' | '\\'
        )
}

/// Rewrite the references in `content` of the file at `key`.
///
/// `lookup` maps a tree key to its final key when that key was renamed.
pub fn rewrite_references<'a, F>(content: &'a str, key: &str, lookup: F) -> Cow<'a, str>
where
    F: Fn(&str) -> Option<&'a str>,
{
    let base = parent_key(key);
    let mut out = String::new();
    let mut copied = 0;

    for (start, token) in tokens(content) {
        let Some(replacement) = rewrite_token(token, base, &lookup) else {
            continue;
        };
        out.push_str(&content[copied..start]);
        out.push_str(&replacement);
        copied = start + token.len();
    }

    if copied == 0 {
        return Cow::Borrowed(content);
    }
    out.push_str(&content[copied..]);
    Cow::Owned(out)
}

fn tokens(content: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut rest = content.char_indices().peekable();
    std::iter::from_fn(move || {
        while rest.next_if(|(_, c)| is_delimiter(*c)).is_some() {}
        let (start, _) = *rest.peek()?;
        let mut end = content.len();
        while let Some((i, c)) = rest.peek().copied() {
            if is_delimiter(c) {
                end = i;
                break;
            }
            rest.next();
        }
        Some((start, &content[start..end]))
    })
}

fn rewrite_token<'a, F>(token: &str, base: &str, lookup: &F) -> Option<String>
where
    F: Fn(&str) -> Option<&'a str>,
{
    let (path, suffix) = split_suffix(token);
    // Bare words (`LICENSE` in prose) are not references
    if !path.contains(['.', '/']) {
        return None;
    }
    let resolved = resolve_reference(base, path)?;
    let target = lookup(&resolved)?;
    let new_name = target.rsplit_once('/').map_or(target, |(_, name)| name);
    let dir = path.rsplit_once('/').map_or("", |(dir, _)| dir);

    Some(if path.contains('/') {
        format!("{dir}/{new_name}{suffix}")
    } else {
        format!("{new_name}{suffix}")
    })
}

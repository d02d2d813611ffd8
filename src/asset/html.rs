//! HTML transforms: SVG inlining and minification.
//!
//! The minifier is a single forward scan. It drops comments (conditional
//! comments survive), collapses whitespace runs in text to one space, and
//! leaves `<pre>`, `<textarea>` and `<code>` bodies untouched. Inline
//! `<style>` and `<script>` bodies go through the CSS/JS minifiers; a body
//! that fails to minify is kept as written.

use super::data::minify_json;
use super::minify::{minify_css, minify_js, utf8};
use crate::debug;
use crate::pipeline::{StageContext, Transform};
use crate::utils::html::{
    attr, find_ascii_ci, find_tag_end, is_raw_text_element, is_whitespace_sensitive,
    parse_attributes, tag_name, write_attr,
};
use crate::utils::path::fs::key_path;
use crate::utils::path::route::{is_external_link, parent_key, resolve_reference, split_suffix};
use anyhow::{Context, Result, bail};
use percent_encoding::percent_decode_str;
use std::borrow::Cow;
use std::fs;
use std::path::Path;

// ============================================================================
// Minification
// ============================================================================

pub fn minify_html(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let bytes = source.as_bytes();
    let mut pos = 0;

    while pos < source.len() {
        if bytes[pos] == b'<'
            && let Some(next) = markup(source, pos, &mut out)
        {
            pos = next;
            continue;
        }
        // Text up to the next `<` (a stray `<` is text too)
        let skip = usize::from(bytes[pos] == b'<');
        let end = source[pos + skip..]
            .find('<')
            .map_or(source.len(), |i| pos + skip + i);
        push_collapsed(&mut out, &source[pos..end]);
        pos = end;
    }

    let trimmed = out.trim_end().len();
    out.truncate(trimmed);
    out
}

/// Copy one markup construct at `pos`. `None` when `<` does not start markup.
fn markup(source: &str, pos: usize, out: &mut String) -> Option<usize> {
    let rest = &source[pos..];

    if let Some(body) = rest.strip_prefix("<!--") {
        let end = body.find("-->").map_or(source.len(), |i| pos + 4 + i + 3);
        // <!--[if IE]> ... <![endif]--> and <!--<![endif]-->
        if body.starts_with('[') || body.starts_with("<!") {
            out.push_str(&source[pos..end]);
        }
        return Some(end);
    }

    if rest.starts_with("<!") || rest.starts_with("<?") {
        let end = find_tag_end(source, pos)?;
        out.push_str(&source[pos..end]);
        return Some(end);
    }

    if let Some(after) = rest.strip_prefix("</") {
        if !after.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return None;
        }
        let end = find_tag_end(source, pos)?;
        push_tag(out, &source[pos..end]);
        return Some(end);
    }

    if !rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    let end = find_tag_end(source, pos)?;
    let tag = &source[pos..end];
    push_tag(out, tag);

    let name = tag_name(&tag[1..]);
    if tag.ends_with("/>") || !(is_raw_text_element(name) || is_whitespace_sensitive(name)) {
        return Some(end);
    }

    let close = find_ascii_ci(source, &format!("</{name}"), end).unwrap_or(source.len());
    let body = &source[end..close];
    if is_raw_text_element(name) {
        out.push_str(&minify_raw_text(name, tag, body));
    } else {
        out.push_str(body);
    }
    Some(close)
}

/// Push a tag with whitespace outside quotes collapsed (`<a  href="x" >` -> `<a href="x">`).
fn push_tag(out: &mut String, tag: &str) {
    let mut quote = None;
    let mut pending_space = false;
    for c in tag.chars() {
        match quote {
            Some(q) => {
                out.push(c);
                if c == q {
                    quote = None;
                }
            }
            None if c.is_ascii_whitespace() => pending_space = true,
            None => {
                if pending_space && c != '>' && c != '/' {
                    out.push(' ');
                }
                pending_space = false;
                if c == '"' || c == '\'' {
                    quote = Some(c);
                }
                out.push(c);
            }
        }
    }
}

/// Collapse ASCII whitespace runs to a single space. `&nbsp;` and U+00A0
/// are not whitespace here.
fn push_collapsed(out: &mut String, text: &str) {
    for c in text.chars() {
        if c.is_ascii_whitespace() {
            if !out.is_empty() && !out.ends_with(' ') {
                out.push(' ');
            }
        } else {
            out.push(c);
        }
    }
}

fn minify_raw_text<'a>(name: &str, tag: &str, body: &'a str) -> Cow<'a, str> {
    if body.trim().is_empty() {
        return Cow::Borrowed(body);
    }
    let inner = tag[1..].trim_end_matches('>');
    let attrs = parse_attributes(inner.get(name.len()..).unwrap_or(""));

    let result = if name.eq_ignore_ascii_case("style") {
        minify_css(body, true)
    } else {
        match ScriptKind::of(attr(&attrs, "type")) {
            ScriptKind::JavaScript => minify_js(body, true),
            ScriptKind::Json => minify_json(body, true),
            ScriptKind::Other => return Cow::Borrowed(body),
        }
    };

    match result {
        Ok(min) => Cow::Owned(min),
        Err(err) => {
            debug!("html"; "inline <{name}> kept as written: {err:#}");
            Cow::Borrowed(body)
        }
    }
}

enum ScriptKind {
    JavaScript,
    Json,
    Other,
}

impl ScriptKind {
    fn of(ty: Option<&str>) -> Self {
        let ty = ty.map(|t| t.trim().to_ascii_lowercase()).unwrap_or_default();
        match ty.as_str() {
            "" | "module" | "text/javascript" | "application/javascript" => Self::JavaScript,
            t if t.ends_with("json") || t == "importmap" => Self::Json,
            _ => Self::Other,
        }
    }
}

// ============================================================================
// SVG inlining
// ============================================================================

/// Replace every `<img data-inline src="*.svg">` in the page at `key` with
/// the SVG markup read from `build_dir`.
///
/// Only `class` and `id` carry over from the `<img>`; they are set on the
/// `<svg>` root. A referenced SVG that does not exist fails the page.
pub fn inline_svgs<'a>(key: &str, source: &'a str, build_dir: &Path) -> Result<Cow<'a, str>> {
    let mut out = String::new();
    let mut copied = 0;
    let mut search = 0;

    while let Some(start) = find_ascii_ci(source, "<img", search) {
        search = start + 4;
        if !source[search..].starts_with(|c: char| c.is_ascii_whitespace()) {
            continue;
        }
        let Some(end) = find_tag_end(source, start) else {
            break;
        };
        let inner = source[start + 4..end - 1].trim_end_matches('/');
        let attrs = parse_attributes(inner);
        let Some(src) = inline_target(&attrs) else {
            continue;
        };

        let svg = load_svg(key, src, build_dir)?;
        let markup = prepare_svg(&svg, attr(&attrs, "class"), attr(&attrs, "id"))
            .with_context(|| format!("cannot inline `{src}` into {key}"))?;

        out.push_str(&source[copied..start]);
        out.push_str(&markup);
        copied = end;
        search = end;
    }

    if copied == 0 {
        return Ok(Cow::Borrowed(source));
    }
    out.push_str(&source[copied..]);
    Ok(Cow::Owned(out))
}

fn inline_target(attrs: &[(String, String)]) -> Option<&str> {
    attr(attrs, "data-inline")?;
    let src = attr(attrs, "src")?;
    let (path, _) = split_suffix(src);
    let local_svg = !is_external_link(src)
        && !src.starts_with("data:")
        && path.to_ascii_lowercase().ends_with(".svg");
    local_svg.then_some(src)
}

fn load_svg(key: &str, src: &str, build_dir: &Path) -> Result<String> {
    let (path, _) = split_suffix(src);
    let decoded = percent_decode_str(path)
        .decode_utf8()
        .with_context(|| format!("invalid percent-encoding in `{src}`"))?;
    let Some(resolved) = resolve_reference(parent_key(key), &decoded) else {
        bail!("inline SVG `{src}` in {key} points outside the site");
    };
    let file = key_path(build_dir, &resolved);
    fs::read_to_string(&file)
        .with_context(|| format!("inline SVG `{src}` referenced by {key} not found"))
}

/// Strip the prolog and set `class`/`id` on the root element.
fn prepare_svg(svg: &str, class: Option<&str>, id: Option<&str>) -> Result<String> {
    let Some(start) = svg.find("<svg") else {
        bail!("no <svg> root element");
    };
    let Some(end) = find_tag_end(svg, start) else {
        bail!("unterminated <svg> tag");
    };
    let root = &svg[start..end];
    let self_closing = root.ends_with("/>");
    let inner = root[4..].trim_end_matches('>').trim_end_matches('/');

    let overrides = [("class", class), ("id", id)];
    let mut tag = String::from("<svg");
    for (name, value) in parse_attributes(inner) {
        let replaced = overrides
            .iter()
            .any(|(n, v)| v.is_some() && name.eq_ignore_ascii_case(n));
        if !replaced {
            write_attr(&mut tag, &name, &value);
        }
    }
    for (name, value) in overrides {
        if let Some(value) = value {
            write_attr(&mut tag, name, value);
        }
    }
    tag.push_str(if self_closing { "/>" } else { ">" });
    tag.push_str(svg[end..].trim_end());
    Ok(tag)
}

// ============================================================================
// Transforms
// ============================================================================

/// Runs with and without minification so pages look the same in every env.
pub struct InlineSvg;

impl Transform for InlineSvg {
    fn name(&self) -> &'static str {
        "inline-svg"
    }

    fn apply(&self, key: &str, input: Vec<u8>, ctx: &StageContext) -> Result<Vec<u8>> {
        let source = utf8(key, &input)?;
        match inline_svgs(key, source, &ctx.build_dir)? {
            Cow::Borrowed(_) => Ok(input),
            Cow::Owned(out) => Ok(out.into_bytes()),
        }
    }
}

pub struct HtmlMinify;

impl Transform for HtmlMinify {
    fn name(&self) -> &'static str {
        "html"
    }

    fn apply(&self, key: &str, input: Vec<u8>, ctx: &StageContext) -> Result<Vec<u8>> {
        let source = utf8(key, &input)?;
        if !ctx.minify {
            return Ok(input);
        }
        Ok(minify_html(source).into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::fileset::write_file;
    use tempfile::TempDir;

    #[test]
    fn test_collapse_whitespace_and_comments() {
        let html = "<!DOCTYPE html>\n<html>\n  <body>\n    <!-- nav -->\n    <p>Hello,\n      world</p>\n  </body>\n</html>\n";
        assert_eq!(
            minify_html(html),
            "<!DOCTYPE html> <html> <body> <p>Hello, world</p> </body> </html>"
        );
    }

    #[test]
    fn test_conditional_comments_kept() {
        let html = "<!--[if lt IE 9]><script src=\"html5.js\"></script><![endif]-->";
        assert_eq!(minify_html(html), html);
    }

    #[test]
    fn test_pre_and_textarea_preserved() {
        let html = "<pre>\n  fn main() {\n      x\n  }\n</pre>  <textarea>a\n\n b</textarea>";
        assert_eq!(
            minify_html(html),
            "<pre>\n  fn main() {\n      x\n  }\n</pre> <textarea>a\n\n b</textarea>"
        );
    }

    #[test]
    fn test_inline_style_minified() {
        let html = "<style>\n  body {\n    color: #ff0000;\n  }\n</style>";
        assert_eq!(minify_html(html), "<style>body{color:red}</style>");
    }

    #[test]
    fn test_broken_inline_script_kept() {
        let html = "<script>function (</script>";
        assert_eq!(minify_html(html), html);
    }

    #[test]
    fn test_template_script_untouched() {
        let html = "<script type=\"text/x-template\">\n  <div>  {{ x }}  </div>\n</script>";
        assert_eq!(minify_html(html), html);
    }

    #[test]
    fn test_tag_whitespace_collapsed() {
        assert_eq!(
            minify_html("<a   href=\"x  y\"\n  class=c >t</a >"),
            "<a href=\"x  y\" class=c>t</a>"
        );
    }

    #[test]
    fn test_nbsp_and_stray_lt_kept() {
        assert_eq!(minify_html("<p>a\u{a0} b < c</p>"), "<p>a\u{a0} b < c</p>");
    }

    #[test]
    fn test_inline_svg() {
        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            "img/logo.svg",
            b"<?xml version=\"1.0\"?>\n<svg xmlns=\"http://www.w3.org/2000/svg\" class=\"old\" viewBox=\"0 0 1 1\"><path d=\"M0 0\"/></svg>\n",
        )
        .unwrap();

        let html = r#"<p><img src="../img/logo.svg?v=1" data-inline class="logo" alt="Logo"></p>"#;
        let out = inline_svgs("blog/index.html", html, dir.path()).unwrap();
        assert_eq!(
            out,
            r#"<p><svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 1 1" class="logo"><path d="M0 0"/></svg></p>"#
        );
    }

    #[test]
    fn test_img_without_marker_untouched() {
        let dir = TempDir::new().unwrap();
        let html = r#"<img src="/logo.svg"><img data-inline src="/photo.png">"#;
        assert!(matches!(inline_svgs("index.html", html, dir.path()).unwrap(), Cow::Borrowed(_)));
    }

    #[test]
    fn test_missing_inline_svg_fails() {
        let dir = TempDir::new().unwrap();
        let html = r#"<img data-inline src="/missing.svg">"#;
        let err = inline_svgs("index.html", html, dir.path()).unwrap_err();
        assert!(err.to_string().contains("/missing.svg"));
    }
}

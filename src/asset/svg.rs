//! SVG optimization using usvg.
//!
//! usvg normalizes the document for rendering: shapes become paths, styles
//! are resolved, and anything not drawn (unreferenced symbols, animation,
//! ids) is dropped. That is only safe for self-contained drawings, so any
//! document carrying content usvg cannot round-trip is whitespace-compacted
//! as XML instead.

use super::data::minify_xml;
use super::minify::utf8;
use crate::pipeline::{StageContext, Transform};
use anyhow::{Context, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Elements usvg drops or rewrites beyond recognition.
const PRESERVE_ELEMENTS: &[&[u8]] = &[
    b"symbol",
    b"use",
    b"animate",
    b"animateMotion",
    b"animateTransform",
    b"set",
    b"image",
    b"a",
    b"style",
    b"text",
    b"script",
    b"foreignObject",
    b"switch",
    b"view",
];

/// Attributes that pages target from CSS or `#fragment` links.
const PRESERVE_ATTRIBUTES: &[&[u8]] = &[b"id", b"class"];

pub fn optimize_svg(source: &str, minify: bool) -> Result<String> {
    let options = usvg::Options::default();
    let tree = usvg::Tree::from_str(source, &options).context("invalid SVG")?;
    if !minify {
        return Ok(source.to_string());
    }
    if needs_preserving(source) {
        return minify_xml(source, true);
    }

    let write_options = usvg::WriteOptions {
        indent: usvg::Indent::None,
        attributes_indent: usvg::Indent::None,
        ..Default::default()
    };
    Ok(tree.to_string(&write_options))
}

/// Whether any element or attribute would be lost by re-serializing.
fn needs_preserving(source: &str) -> bool {
    let mut reader = Reader::from_str(source);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e) | Event::Empty(e)) if must_preserve(&e) => return true,
            Ok(Event::Eof) => return false,
            // usvg accepted it; stay on the safe side regardless
            Err(_) => return true,
            Ok(_) => {}
        }
    }
}

fn must_preserve(element: &BytesStart) -> bool {
    PRESERVE_ELEMENTS.contains(&element.local_name().as_ref())
        || element.attributes().flatten().any(|attr| {
            PRESERVE_ATTRIBUTES.contains(&attr.key.local_name().as_ref())
        })
}

pub struct SvgOptimize;

impl Transform for SvgOptimize {
    fn name(&self) -> &'static str {
        "svg"
    }

    fn apply(&self, key: &str, input: Vec<u8>, ctx: &StageContext) -> Result<Vec<u8>> {
        let out = optimize_svg(utf8(key, &input)?, ctx.minify)?;
        Ok(out.into_bytes())
    }
}

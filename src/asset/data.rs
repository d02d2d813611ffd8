//! XML and JSON compaction.
//!
//! JSON is validated with serde_json, then whitespace outside strings is
//! dropped, so numbers and key order stay exactly as written. XML is
//! re-emitted event by event through quick-xml without comments or
//! indentation; whitespace inside a line and under `xml:space="preserve"`
//! is kept.

use super::minify::utf8;
use crate::pipeline::{StageContext, Transform};
use anyhow::{Context, Result, bail};
use quick_xml::events::Event;
use quick_xml::{Reader, Writer};

pub fn minify_json(source: &str, minify: bool) -> Result<String> {
    serde_json::from_str::<serde::de::IgnoredAny>(source).context("invalid JSON")?;
    if !minify {
        return Ok(source.to_string());
    }

    let mut out = String::with_capacity(source.len());
    let mut in_string = false;
    let mut escaped = false;
    for c in source.chars() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
            out.push(c);
        } else if !c.is_whitespace() {
            out.push(c);
        }
    }
    Ok(out)
}

pub fn minify_xml(source: &str, minify: bool) -> Result<String> {
    let mut reader = Reader::from_str(source);
    reader.config_mut().trim_text(false);
    let mut writer = Writer::new(Vec::with_capacity(source.len()));
    // `xml:space="preserve"` state of every open element
    let mut preserve: Vec<bool> = Vec::new();
    let mut after_ref = false;

    loop {
        let event = reader
            .read_event()
            .with_context(|| format!("invalid XML at byte {}", reader.error_position()))?;
        match &event {
            Event::Start(start) => {
                let inherited = preserve.last().copied().unwrap_or(false);
                let space = start
                    .try_get_attribute("xml:space")
                    .ok()
                    .flatten()
                    .map(|attr| attr.value.into_owned());
                preserve.push(match space.as_deref() {
                    Some(b"preserve") => true,
                    Some(b"default") => false,
                    _ => inherited,
                });
            }
            Event::End(_) => {
                preserve.pop();
            }
            Event::Eof => break,
            _ => {}
        }
        if !minify {
            continue;
        }
        let keep = match &event {
            Event::Comment(_) => false,
            // Only indentation goes: `<b>a</b> <i>b</i>` and `&lt; &gt;` keep their space
            Event::Text(text) => {
                after_ref
                    || preserve.last().copied().unwrap_or(false)
                    || !is_indentation(text)
            }
            _ => true,
        };
        after_ref = matches!(event, Event::GeneralRef(_));
        if keep {
            writer.write_event(event)?;
        }
    }
    if !preserve.is_empty() {
        bail!(
            "invalid XML: {} unclosed element(s) at end of document",
            preserve.len()
        );
    }

    if !minify {
        return Ok(source.to_string());
    }
    Ok(String::from_utf8(writer.into_inner())?)
}

/// Whitespace-only text that spans a line break.
fn is_indentation(text: &[u8]) -> bool {
    text.iter().all(u8::is_ascii_whitespace) && text.contains(&b'\n')
}

fn is_json_key(key: &str) -> bool {
    let ext = key.rsplit_once('.').map_or("", |(_, e)| e);
    ext.eq_ignore_ascii_case("json")
        || ext.eq_ignore_ascii_case("webmanifest")
        || ext.eq_ignore_ascii_case("map")
}

/// JSON-family files by extension; everything else is treated as XML.
pub struct DataMinify;

impl Transform for DataMinify {
    fn name(&self) -> &'static str {
        "xml-json"
    }

    fn apply(&self, key: &str, input: Vec<u8>, ctx: &StageContext) -> Result<Vec<u8>> {
        let source = utf8(key, &input)?;
        let out = if is_json_key(key) {
            minify_json(source, ctx.minify)?
        } else {
            minify_xml(source, ctx.minify)?
        };
        Ok(out.into_bytes())
    }
}

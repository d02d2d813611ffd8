//! CSS and JavaScript transforms.
//!
//! Uses lightningcss for CSS and oxc for JavaScript. Both parse even when
//! minification is off, so a syntax error fails the build either way.

use crate::pipeline::{StageContext, Transform};
use anyhow::{Result, anyhow, bail};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

/// Parse (and with `minify`, re-print) a stylesheet.
pub fn minify_css(source: &str, minify: bool) -> Result<String> {
    let mut stylesheet =
        StyleSheet::parse(source, ParserOptions::default()).map_err(|e| anyhow!("{e}"))?;
    if !minify {
        return Ok(source.to_string());
    }
    stylesheet
        .minify(MinifyOptions::default())
        .map_err(|e| anyhow!("{e}"))?;
    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .map_err(|e| anyhow!("{e}"))?;
    Ok(result.code)
}

/// Parse (and with `minify`, compress and mangle) a script.
///
/// Classic scripts are tried first so unused top-level functions, which
/// other scripts may call, are not dropped. Sources with `import`/`export`
/// fall back to module parsing.
pub fn minify_js(source: &str, minify: bool) -> Result<String> {
    let allocator = Allocator::default();

    let mut ret = Parser::new(&allocator, source, SourceType::cjs()).parse();
    if !ret.errors.is_empty() || ret.panicked {
        let module = Parser::new(&allocator, source, SourceType::mjs()).parse();
        if !module.errors.is_empty() || module.panicked {
            let message = module
                .errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            bail!("JavaScript syntax error: {message}");
        }
        ret = module;
    }
    if !minify {
        return Ok(source.to_string());
    }

    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Ok(code)
}

pub(crate) fn utf8<'a>(key: &str, input: &'a [u8]) -> Result<&'a str> {
    std::str::from_utf8(input).map_err(|e| anyhow!("{key} is not valid UTF-8: {e}"))
}

pub struct CssMinify;

impl Transform for CssMinify {
    fn name(&self) -> &'static str {
        "css"
    }

    fn apply(&self, key: &str, input: Vec<u8>, ctx: &StageContext) -> Result<Vec<u8>> {
        let out = minify_css(utf8(key, &input)?, ctx.minify)?;
        Ok(out.into_bytes())
    }
}

pub struct JsMinify;

impl Transform for JsMinify {
    fn name(&self) -> &'static str {
        "js"
    }

    fn apply(&self, key: &str, input: Vec<u8>, ctx: &StageContext) -> Result<Vec<u8>> {
        let out = minify_js(utf8(key, &input)?, ctx.minify)?;
        Ok(out.into_bytes())
    }
}

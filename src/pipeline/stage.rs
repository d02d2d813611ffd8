//! A named transform stage over a disjoint share of the file set.

use super::error::PipelineError;
use super::fileset::{FileSet, write_file};
use super::selector::Selector;
use crate::core::CancelToken;
use crate::logger::ProgressLine;
use anyhow::Result;
use rayon::prelude::*;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Shared, read-only inputs of every transform.
#[derive(Debug, Clone)]
pub struct StageContext {
    /// Transforms parse either way; only with `minify` do they rewrite.
    pub minify: bool,
    /// Output directory of the fan-out stages (read by SVG inlining).
    pub build_dir: PathBuf,
}

/// One step applied to a file's bytes.
pub trait Transform: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, key: &str, input: Vec<u8>, ctx: &StageContext) -> Result<Vec<u8>>;
}

pub struct Stage {
    name: &'static str,
    selector: Selector,
    transforms: Vec<Box<dyn Transform>>,
    enabled: bool,
}

impl Stage {
    pub fn new(name: &'static str, selector: Selector) -> Self {
        Self {
            name,
            selector,
            transforms: Vec::new(),
            enabled: true,
        }
    }

    pub fn with(mut self, transform: impl Transform + 'static) -> Self {
        self.transforms.push(Box::new(transform));
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether this stage would claim `key` (disabled stages claim nothing).
    pub fn claims(&self, key: &str) -> bool {
        self.enabled && self.selector.matches(key)
    }

    /// Transform `keys` from `input` into `output`, files in parallel.
    ///
    /// Stops at the first failing file. Between files the cancel token is
    /// polled so a failing sibling stage stops this one too.
    pub fn run(
        &self,
        input: &FileSet,
        keys: &[String],
        output: &Path,
        ctx: &StageContext,
        cancel: &CancelToken,
        progress: Option<&ProgressLine>,
    ) -> Result<StageReport, PipelineError> {
        let files = AtomicUsize::new(0);
        let bytes_in = AtomicU64::new(0);
        let bytes_out = AtomicU64::new(0);

        keys.par_iter().try_for_each(|key| {
            if cancel.is_cancelled() {
                return Err(PipelineError::Cancelled(self.name.to_string()));
            }

            let (read, written) = self
                .process(input, key, output, ctx)
                .map_err(|err| PipelineError::stage(self.name, key, &err))?;

            files.fetch_add(1, Ordering::Relaxed);
            bytes_in.fetch_add(read, Ordering::Relaxed);
            bytes_out.fetch_add(written, Ordering::Relaxed);
            if let Some(progress) = progress {
                progress.inc(self.name);
            }
            Ok(())
        })?;

        Ok(StageReport {
            name: self.name,
            files: files.into_inner(),
            bytes_in: bytes_in.into_inner(),
            bytes_out: bytes_out.into_inner(),
        })
    }

    fn process(
        &self,
        input: &FileSet,
        key: &str,
        output: &Path,
        ctx: &StageContext,
    ) -> Result<(u64, u64)> {
        let mut bytes = input.read(key)?;
        let read = bytes.len() as u64;
        for transform in &self.transforms {
            bytes = transform.apply(key, bytes, ctx)?;
        }
        write_file(output, key, &bytes)?;
        Ok((read, bytes.len() as u64))
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("name", &self.name)
            .field(
                "transforms",
                &self.transforms.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .field("enabled", &self.enabled)
            .finish()
    }
}

/// Size metric of one stage run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageReport {
    pub name: &'static str,
    pub files: usize,
    pub bytes_in: u64,
    pub bytes_out: u64,
}

impl StageReport {
    /// Relative size change in percent (negative when smaller).
    #[allow(clippy::cast_precision_loss)]
    pub fn delta_percent(&self) -> f64 {
        if self.bytes_in == 0 {
            return 0.0;
        }
        (self.bytes_out as f64 - self.bytes_in as f64) / self.bytes_in as f64 * 100.0
    }
}

impl fmt::Display for StageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} -> {} ({:+.1}%)",
            crate::utils::plural::plural_count(self.files, "file"),
            format_size(self.bytes_in),
            format_size(self.bytes_out),
            self.delta_percent()
        )
    }
}

#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KIB {
        format!("{bytes} B")
    } else if b < KIB * KIB {
        format!("{:.1} KiB", b / KIB)
    } else {
        format!("{:.1} MiB", b / (KIB * KIB))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use tempfile::TempDir;

    struct Upper;

    impl Transform for Upper {
        fn name(&self) -> &'static str {
            "upper"
        }

        fn apply(&self, _key: &str, input: Vec<u8>, _ctx: &StageContext) -> Result<Vec<u8>> {
            Ok(input.to_ascii_uppercase())
        }
    }

    struct RejectBad;

    impl Transform for RejectBad {
        fn name(&self) -> &'static str {
            "reject"
        }

        fn apply(&self, key: &str, input: Vec<u8>, _ctx: &StageContext) -> Result<Vec<u8>> {
            if input.starts_with(b"bad") {
                bail!("syntax error in {key}");
            }
            Ok(input)
        }
    }

    fn ctx(dir: &Path) -> StageContext {
        StageContext {
            minify: true,
            build_dir: dir.to_path_buf(),
        }
    }

    #[test]
    fn test_stage_applies_transforms_in_order() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write_file(src.path(), "a.txt", b"abc").unwrap();
        write_file(src.path(), "sub/b.txt", b"xy").unwrap();

        let stage = Stage::new("upper", Selector::new(&["**/*.txt"]).unwrap())
            .with(RejectBad)
            .with(Upper);
        let input = FileSet::scan(src.path()).unwrap();
        let report = stage
            .run(&input, input.keys(), out.path(), &ctx(out.path()), &CancelToken::new(), None)
            .unwrap();

        assert_eq!(report.files, 2);
        assert_eq!(report.bytes_in, 5);
        assert_eq!(std::fs::read(out.path().join("sub/b.txt")).unwrap(), b"XY");
    }

    #[test]
    fn test_stage_failure_names_file() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write_file(src.path(), "broken.txt", b"bad input").unwrap();

        let stage = Stage::new("check", Selector::new(&["*"]).unwrap()).with(RejectBad);
        let input = FileSet::scan(src.path()).unwrap();
        let err = stage
            .run(&input, input.keys(), out.path(), &ctx(out.path()), &CancelToken::new(), None)
            .unwrap_err();

        match err {
            PipelineError::Stage { stage, path, message } => {
                assert_eq!(stage, "check");
                assert_eq!(path, "broken.txt");
                assert!(message.contains("syntax error"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_cancelled_stage_stops() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write_file(src.path(), "a.txt", b"a").unwrap();

        let cancel = CancelToken::new();
        cancel.cancel();
        let stage = Stage::new("upper", Selector::new(&["*"]).unwrap()).with(Upper);
        let input = FileSet::scan(src.path()).unwrap();
        let err = stage
            .run(&input, input.keys(), out.path(), &ctx(out.path()), &cancel, None)
            .unwrap_err();
        assert!(err.is_cancelled());
        assert!(!out.path().join("a.txt").exists());
    }

    #[test]
    fn test_disabled_stage_claims_nothing() {
        let stage = Stage::new("css", Selector::new(&["**/*.css"]).unwrap()).enabled(false);
        assert!(!stage.claims("main.css"));
    }

    #[test]
    fn test_report_display() {
        let report = StageReport {
            name: "minify-css",
            files: 2,
            bytes_in: 2048,
            bytes_out: 1024,
        };
        assert_eq!(report.to_string(), "2 files: 2.0 KiB -> 1.0 KiB (-50.0%)");
    }
}

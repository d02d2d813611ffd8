//! Site build pipeline.
//!
//! ```text
//! generate -> render-diagrams -> [lint]
//!          -> (minify-xml-json | minify-css | minify-js | optimize-svg | copy-misc)
//!          -> minify-html -> revision
//! ```
//!
//! Directories per env (`<output>/<env>/`):
//! - `jekyll-build/` - generator output, diagrams rendered in place
//! - `build/` - stage output
//! - `serve/` - fingerprinted tree, served and published

mod diagrams;
mod error;
mod fanout;
pub mod fileset;
mod selector;
mod stage;
mod stages;

pub use error::PipelineError;
pub use selector::{Selector, SelectorError};
pub use stage::{StageContext, StageReport, Transform};

use crate::config::SiteConfig;
use crate::core::CancelToken;
use crate::external::{Generator, Renderer};
use crate::revision::Revisioner;
use crate::utils::plural::plural_count;
use crate::{debug, lint, log};
use anyhow::{Context, Result};
use fanout::{Job, run_parallel};
use fileset::{FileSet, copy_tree, reset_dir};
use stage::format_size;
use stages::StageSet;
use std::time::{Duration, Instant};

/// What one pipeline run produced.
#[derive(Debug)]
pub struct BuildSummary {
    pub reports: Vec<StageReport>,
    /// Files renamed by the revisioner (0 when revisioning is off).
    pub renamed: usize,
    pub elapsed: Duration,
}

pub struct Pipeline<'a> {
    config: &'a SiteConfig,
    generator: &'a dyn Generator,
    renderer: &'a dyn Renderer,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a SiteConfig,
        generator: &'a dyn Generator,
        renderer: &'a dyn Renderer,
    ) -> Self {
        Self {
            config,
            generator,
            renderer,
        }
    }

    /// Generate the site and render diagrams into the generation snapshot.
    pub fn prepare(&self, cancel: &CancelToken) -> Result<FileSet> {
        let layout = self.config.layout();
        let generate_dir = layout.generate_dir();
        reset_dir(&generate_dir)?;
        self.generator.generate(self.config.env, &generate_dir)?;

        if self.config.diagrams.enable {
            let snapshot = FileSet::scan(&generate_dir)?;
            diagrams::render_diagrams(&snapshot, &self.config.diagrams, self.renderer, cancel)?;
        }
        FileSet::scan(&generate_dir)
    }

    /// Full build: prepare, stages, revision.
    pub fn run(&self) -> Result<BuildSummary> {
        let start = Instant::now();
        let config = self.config;
        let layout = config.layout();
        let cancel = CancelToken::new();

        let input = self.prepare(&cancel)?;
        if config.build.lint {
            let report = lint::run_checks(input.root(), &config.lint)?;
            lint::conclude(&report, config.build.lint_fatal)?;
        }

        let build_dir = layout.build_dir();
        reset_dir(&build_dir)?;
        let reports = self.run_stages(&input, &cancel)?;

        let serve_dir = layout.serve_dir();
        reset_dir(&serve_dir)?;
        let renamed = if config.revision.enable {
            let map = Revisioner::new(&config.revision)?.run(&build_dir, &serve_dir)?;
            if config.revision.manifest {
                map.write_manifest(&layout.manifest_path())?;
            }
            map.renamed_count()
        } else {
            copy_tree(&build_dir, &serve_dir)?;
            0
        };

        let summary = BuildSummary {
            reports,
            renamed,
            elapsed: start.elapsed(),
        };
        log!(
            "build";
            "{} in {:.2?} -> {}",
            config.env,
            summary.elapsed,
            config.root_relative(&serve_dir).display()
        );
        Ok(summary)
    }

    fn run_stages(&self, input: &FileSet, cancel: &CancelToken) -> Result<Vec<StageReport>> {
        let config = self.config;
        let build_dir = config.layout().build_dir();
        let stages = StageSet::from_config(&config.stages)?;
        let partition = stages.partition(input);
        for key in &partition.unclaimed {
            debug!("build"; "no stage claims {key}, left out");
        }

        let ctx = StageContext {
            minify: config.minify(),
            build_dir: build_dir.clone(),
        };
        let jobs: Vec<Job<'_>> = stages
            .fanout
            .iter()
            .zip(partition.fanout)
            .map(|(stage, keys)| Job { stage, keys })
            .collect();

        let mut reports = run_parallel(&jobs, input, &build_dir, &ctx, cancel)?;
        // SVG inlining reads the optimized SVGs, so HTML waits for the barrier
        reports.push(
            stages
                .html
                .run(input, &partition.html, &build_dir, &ctx, cancel, None)
                .context("HTML stage failed")?,
        );

        for report in reports.iter().filter(|r| r.files > 0) {
            log!("stages"; "{:<16} {report}", report.name);
        }
        let total_in: u64 = reports.iter().map(|r| r.bytes_in).sum();
        let total_out: u64 = reports.iter().map(|r| r.bytes_out).sum();
        debug!(
            "stages";
            "{} total, {} -> {}",
            plural_count(reports.iter().map(|r| r.files).sum(), "file"),
            format_size(total_in),
            format_size(total_out)
        );
        Ok(reports)
    }
}

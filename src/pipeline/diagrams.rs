//! Diagram rendering inside the generation snapshot.

use super::error::PipelineError;
use super::fileset::{FileSet, write_file};
use super::selector::Selector;
use crate::config::DiagramsConfig;
use crate::core::CancelToken;
use crate::external::Renderer;
use crate::log;
use anyhow::Result;
use rayon::prelude::*;
use std::fs;

const STAGE: &str = "render-diagrams";

/// `docs/flow.dot` -> `docs/flow.svg`
pub fn rendered_key(key: &str, extension: &str) -> String {
    let (dir, name) = key.rsplit_once('/').map_or(("", key), |(d, n)| (d, n));
    let stem = match name.rfind('.') {
        Some(0) | None => name,
        Some(pos) => &name[..pos],
    };
    if dir.is_empty() {
        format!("{stem}.{extension}")
    } else {
        format!("{dir}/{stem}.{extension}")
    }
}

/// Render every matching source in `snapshot` next to itself, then remove
/// the source so later stages never see it. Returns the number rendered.
pub fn render_diagrams(
    snapshot: &FileSet,
    config: &DiagramsConfig,
    renderer: &dyn Renderer,
    cancel: &CancelToken,
) -> Result<usize, PipelineError> {
    let selector = Selector::new(&config.globs).map_err(|err| PipelineError::Stage {
        stage: STAGE.to_string(),
        path: String::new(),
        message: err.to_string(),
    })?;
    let sources: Vec<&String> = snapshot
        .keys()
        .iter()
        .filter(|k| selector.matches(k))
        .collect();
    if sources.is_empty() {
        return Ok(0);
    }

    sources.par_iter().try_for_each(|key| {
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled(STAGE.to_string()));
        }
        render_one(snapshot, key, config, renderer).map_err(|err| PipelineError::stage(STAGE, key, &err))
    })?;

    log!("diagrams"; "rendered {}", crate::utils::plural::plural_count(sources.len(), "diagram"));
    Ok(sources.len())
}

fn render_one(
    snapshot: &FileSet,
    key: &str,
    config: &DiagramsConfig,
    renderer: &dyn Renderer,
) -> Result<()> {
    let source = snapshot.read(key)?;
    let image = renderer.render(&source)?;
    write_file(snapshot.root(), &rendered_key(key, &config.extension), &image)?;
    fs::remove_file(snapshot.path_of(key))?;
    Ok(())
}

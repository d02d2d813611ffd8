use thiserror::Error;

/// Typed failures of a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A transform rejected a file. Fatal for the whole build.
    #[error("[{stage}] {path}: {message}")]
    Stage {
        stage: String,
        path: String,
        message: String,
    },

    /// The stage stopped early because a sibling failed or Ctrl+C was pressed.
    #[error("[{0}] cancelled")]
    Cancelled(String),

    #[error("`{program}` failed: {message}")]
    Subprocess { program: String, message: String },
}

impl PipelineError {
    pub fn stage(stage: &str, path: &str, err: &anyhow::Error) -> Self {
        Self::Stage {
            stage: stage.to_string(),
            path: path.to_string(),
            message: format!("{err:#}"),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

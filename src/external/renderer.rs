use crate::config::DiagramsConfig;
use crate::utils::exec::{Cmd, SILENT_FILTER};
use anyhow::{Context, Result, bail};

/// Turns diagram source bytes into image bytes.
pub trait Renderer: Send + Sync {
    fn render(&self, source: &[u8]) -> Result<Vec<u8>>;
}

/// Pipes the source through `diagrams.command` (stdin to stdout).
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    command: Vec<String>,
}

impl CommandRenderer {
    pub fn new(config: &DiagramsConfig) -> Self {
        Self {
            command: config.command.clone(),
        }
    }

    /// Checked once per build instead of once per diagram.
    pub fn ensure_available(&self) -> Result<()> {
        Cmd::from_slice(&self.command).ensure_available()
    }
}

impl Renderer for CommandRenderer {
    fn render(&self, source: &[u8]) -> Result<Vec<u8>> {
        let output = Cmd::from_slice(&self.command)
            .stdin(source)
            .filter(&SILENT_FILTER)
            .run()
            .with_context(|| format!("diagram renderer `{}` failed", self.command.join(" ")))?;
        if output.stdout.is_empty() {
            bail!("diagram renderer `{}` produced no output", self.command.join(" "));
        }
        Ok(output.stdout)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn renderer(command: &[&str]) -> CommandRenderer {
        CommandRenderer::new(&DiagramsConfig {
            command: command.iter().map(ToString::to_string).collect(),
            ..DiagramsConfig::default()
        })
    }

    #[test]
    fn test_render_pipes_stdin_to_stdout() {
        let out = renderer(&["tr", "a-z", "A-Z"]).render(b"digraph{a->b}").unwrap();
        assert_eq!(out, b"DIGRAPH{A->B}");
    }

    #[test]
    fn test_render_empty_output_is_error() {
        assert!(renderer(&["true"]).render(b"digraph{}").is_err());
    }

    #[test]
    fn test_render_failure() {
        let err = renderer(&["sh", "-c", "echo 'syntax error in line 1' >&2; exit 2"])
            .render(b"digraph{")
            .unwrap_err();
        assert!(format!("{err:#}").contains("syntax error in line 1"));
    }
}

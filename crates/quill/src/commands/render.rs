//! `quill render` command implementation.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use quill_config::Config;
use quill_renderer::Document;

use super::{PipelineArgs, build_pipeline};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the render command.
#[derive(Args, Debug)]
pub(crate) struct RenderArgs {
    /// Markdown or MDX file to render.
    file: PathBuf,

    /// Write HTML to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid, the file cannot be read
    /// or rendering fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let config = Config::load(
            self.pipeline.config.as_deref(),
            Some(&self.pipeline.settings()),
        )?;
        let pipeline = build_pipeline(&config)?;

        let source = std::fs::read_to_string(&self.file).map_err(|source| CliError::Read {
            path: self.file.clone(),
            source,
        })?;
        let rendered = pipeline.render(&Document::from_path(&self.file, source))?;

        for warning in &rendered.warnings {
            output.warning(&format!("warning: {warning}"));
        }

        match &self.output {
            Some(path) => {
                std::fs::write(path, &rendered.html)?;
                output.success(&format!("Rendered {}", path.display()));
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(rendered.html.as_bytes())?;
                stdout.write_all(b"\n")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("quill.toml");
        std::fs::write(&config, "[markdown]\nutility_classes = false\n").unwrap();
        let input = dir.path().join("page.md");
        std::fs::write(&input, "# Hello\n").unwrap();
        let out = dir.path().join("page.html");

        RenderArgs {
            file: input,
            output: Some(out.clone()),
            pipeline: PipelineArgs {
                config: Some(config),
                ..PipelineArgs::default()
            },
        }
        .execute()
        .unwrap();

        assert_eq!(
            std::fs::read_to_string(out).unwrap(),
            "<h1 id=\"hello\">Hello</h1>"
        );
    }

    #[test]
    fn test_missing_input_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("quill.toml");
        std::fs::write(&config, "").unwrap();

        let err = RenderArgs {
            file: dir.path().join("missing.md"),
            output: None,
            pipeline: PipelineArgs {
                config: Some(config),
                ..PipelineArgs::default()
            },
        }
        .execute()
        .unwrap_err();

        assert!(err.to_string().contains("missing.md"));
    }
}

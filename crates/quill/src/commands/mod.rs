//! CLI command implementations.

pub(crate) mod build;
pub(crate) mod render;

pub(crate) use build::BuildArgs;
pub(crate) use render::RenderArgs;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use quill_config::{CliSettings, Config};
use quill_diagrams::KrokiRenderer;
use quill_renderer::{DiagramStrategy, Pipeline};

use crate::error::CliError;

/// Options shared by every command.
#[derive(Args, Debug, Default)]
pub(crate) struct PipelineArgs {
    /// Path to configuration file (default: auto-discover quill.toml).
    #[arg(short, long, env = "QUILL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Site URL; links to other origins are treated as external (overrides config).
    #[arg(long, env = "QUILL_SITE_URL")]
    pub site_url: Option<String>,

    /// Kroki server URL for diagram rendering (overrides config).
    #[arg(long, env = "KROKI_URL")]
    pub kroki_url: Option<String>,

    /// Diagram strategy: inline-svg or pre (overrides config).
    #[arg(long, value_parser = parse_strategy)]
    pub diagrams: Option<DiagramStrategy>,

    /// Treat `$x$` as inline math.
    #[arg(long)]
    pub single_dollar_math: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_strategy(s: &str) -> Result<DiagramStrategy, String> {
    s.parse()
}

impl PipelineArgs {
    /// CLI overrides, with room for command-specific directories.
    pub(crate) fn settings(&self) -> CliSettings {
        CliSettings {
            site_url: self.site_url.clone(),
            kroki_url: self.kroki_url.clone(),
            diagram_strategy: self.diagrams,
            single_dollar_math: self.single_dollar_math.then_some(true),
            ..CliSettings::default()
        }
    }
}

/// Build the pipeline a loaded configuration describes.
///
/// A Kroki renderer is attached when diagrams are rendered inline.
pub(crate) fn build_pipeline(config: &Config) -> Result<Pipeline, CliError> {
    let mut options = config.pipeline_options()?;
    let diagrams = &config.diagrams_resolved;

    if diagrams.strategy == DiagramStrategy::InlineSvg {
        let url = diagrams.kroki_url.as_deref().ok_or_else(|| {
            CliError::Validation("inline diagrams require a Kroki URL (--kroki-url)".to_owned())
        })?;
        let renderer = KrokiRenderer::new(url).with_timeout(diagrams.timeout);
        tracing::info!(kroki_url = url, "Rendering diagrams with Kroki");
        options = options.with_diagram_renderer(Arc::new(renderer));
    }

    Ok(Pipeline::new(options))
}

//! `quill build` command implementation.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use quill_config::Config;
use quill_renderer::Document;

use super::{PipelineArgs, build_pipeline};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the build command.
#[derive(Args, Debug)]
pub(crate) struct BuildArgs {
    /// Markdown source directory (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Output directory for rendered HTML (overrides config).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

impl BuildArgs {
    /// Execute the build command.
    ///
    /// Every document is rendered before anything is written; one
    /// document-fatal error fails the whole build.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid, a document cannot be
    /// read or written, or any document fails to render.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let mut settings = self.pipeline.settings();
        settings.source_dir = self.source_dir;
        settings.output_dir = self.output_dir;
        let config = Config::load(self.pipeline.config.as_deref(), Some(&settings))?;
        let pipeline = build_pipeline(&config)?;

        let source_dir = &config.build_resolved.source_dir;
        let output_dir = &config.build_resolved.output_dir;
        output.info(&format!("Source: {}", source_dir.display()));
        output.info(&format!("Output: {}", output_dir.display()));

        let start = Instant::now();
        let documents = load_documents(source_dir)?;
        let results = pipeline.render_all(&documents);

        let mut rendered = Vec::with_capacity(results.len());
        for (doc, result) in documents.iter().zip(results) {
            let result = result?;
            for warning in &result.warnings {
                output.warning(&format!("{}: {warning}", doc.id));
            }
            rendered.push((doc, result));
        }

        for (doc, result) in &rendered {
            let target = output_dir.join(Path::new(&doc.id).with_extension("html"));
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&target, &result.html)?;
            output.detail(&format!("  {} -> {}", doc.id, target.display()));
        }

        tracing::info!(documents = rendered.len(), elapsed = ?start.elapsed(), "Build finished");
        output.success(&format!(
            "Rendered {} documents to {}",
            rendered.len(),
            output_dir.display()
        ));
        Ok(())
    }
}

/// Read every `.md` and `.mdx` file under `root`, sorted by path.
///
/// Document ids are paths relative to `root`.
fn load_documents(root: &Path) -> Result<Vec<Document>, CliError> {
    let mut paths = Vec::new();
    collect_sources(root, &mut paths).map_err(|source| CliError::Read {
        path: root.to_path_buf(),
        source,
    })?;
    paths.sort();

    paths
        .into_iter()
        .map(|path| {
            let source = std::fs::read_to_string(&path).map_err(|source| CliError::Read {
                path: path.clone(),
                source,
            })?;
            let relative = path.strip_prefix(root).unwrap_or(&path);
            let mut doc = Document::from_path(&path, source);
            doc.id = relative.display().to_string();
            Ok(doc)
        })
        .collect()
}

fn collect_sources(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_sources(&path, out)?;
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == "md" || e == "mdx")
        {
            out.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("quill.toml"),
            "[markdown]\nutility_classes = false\n",
        )
        .unwrap();
        let docs = dir.path().join("docs");
        std::fs::create_dir_all(docs.join("guide")).unwrap();
        std::fs::write(docs.join("index.md"), "# Home\n").unwrap();
        std::fs::write(docs.join("guide/setup.mdx"), "## Setup\n").unwrap();
        std::fs::write(docs.join("notes.txt"), "ignored").unwrap();
        dir
    }

    fn args(dir: &Path) -> BuildArgs {
        BuildArgs {
            source_dir: None,
            output_dir: None,
            pipeline: PipelineArgs {
                config: Some(dir.join("quill.toml")),
                ..PipelineArgs::default()
            },
        }
    }

    #[test]
    fn test_load_documents_sorted_relative() {
        let dir = project();
        let docs = load_documents(&dir.path().join("docs")).unwrap();
        let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["guide/setup.mdx", "index.md"]);
        assert_eq!(docs[0].content_type, quill_renderer::ContentType::Mdx);
    }

    #[test]
    fn test_build_writes_html() {
        let dir = project();
        args(dir.path()).execute().unwrap();

        let dist = dir.path().join("dist");
        assert_eq!(
            std::fs::read_to_string(dist.join("index.html")).unwrap(),
            "<h1 id=\"home\">Home</h1>"
        );
        assert!(
            std::fs::read_to_string(dist.join("guide/setup.html"))
                .unwrap()
                .contains("id=\"setup\"")
        );
        assert!(!dist.join("notes.html").exists());
    }

    #[test]
    fn test_inline_diagrams_without_kroki_fail() {
        let dir = project();
        let mut args = args(dir.path());
        args.pipeline.diagrams = Some(quill_renderer::DiagramStrategy::InlineSvg);
        assert!(args.execute().is_err());
    }
}

//! Configuration management for Quill.
//!
//! Parses `quill.toml` with serde and discovers it in the current directory
//! or its parents. CLI settings are applied during load via
//! [`CliSettings`] and take precedence over file values.
//!
//! ## Environment Variable Expansion
//!
//! `site.url` and `diagrams.kroki_url` support `${VAR}` (error if unset)
//! and `${VAR:-default}`.
//!
//! ## Example
//!
//! ```toml
//! [site]
//! url = "https://docs.example.com"
//!
//! [markdown]
//! single_dollar_math = false
//! heading_suffix_format = "-{n}"
//!
//! [markdown.custom_blocks.spoiler]
//! title = "required"
//! details = true
//!
//! [diagrams]
//! kroki_url = "${KROKI_URL:-https://kroki.io}"
//! ```

mod expand;

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use quill_renderer::{CaptionLabels, CustomBlockDefinition, DiagramStrategy, PipelineOptions, TitleMode};
use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "quill.toml";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// CLI settings that override configuration file values.
///
/// Only `Some` values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    pub site_url: Option<String>,
    pub kroki_url: Option<String>,
    pub diagram_strategy: Option<DiagramStrategy>,
    pub single_dollar_math: Option<bool>,
    pub source_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub markdown: MarkdownConfig,
    pub highlight: HighlightConfig,
    pub math: MathConfig,
    diagrams: DiagramsConfigRaw,
    build: BuildConfigRaw,

    /// Resolved diagram configuration (set after loading).
    #[serde(skip)]
    pub diagrams_resolved: DiagramsConfig,
    /// Resolved build directories (set after loading).
    #[serde(skip)]
    pub build_resolved: BuildConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Site configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Own URL; links to any other origin are external.
    pub url: Option<String>,
}

/// Markdown pass configuration. Unset values keep the pipeline defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MarkdownConfig {
    pub single_dollar_math: Option<bool>,
    pub tab_group_syntax: Option<bool>,
    pub heading_suffix_format: Option<String>,
    pub heading_anchors: Option<bool>,
    pub external_link_rel: Option<Vec<String>>,
    pub external_link_target: Option<String>,
    pub smartypants: Option<bool>,
    pub replacements: Option<bool>,
    pub disabled_replacements: Vec<String>,
    pub emoji: Option<bool>,
    pub linkify: Option<bool>,
    pub breaks: Option<bool>,
    pub attributes: Option<bool>,
    pub align: Option<bool>,
    pub accessible_emojis: Option<bool>,
    /// Heading whose section receives the table of contents. Empty turns
    /// the table off.
    pub toc_heading: Option<String>,
    pub utility_classes: Option<bool>,
    pub footnote_label: Option<String>,
    pub footnote_backref_title: Option<String>,
    pub captions: CaptionsConfig,
    pub custom_blocks: BTreeMap<String, CustomBlockConfig>,
}

/// Caption labels.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CaptionsConfig {
    pub table: Option<String>,
    pub code: Option<String>,
    pub image: Option<String>,
    pub quote: Option<String>,
}

/// One `[[name | title]]` block type.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CustomBlockConfig {
    /// `required`, `optional` or `none`.
    pub title: Option<String>,
    pub details: bool,
    pub container: Option<String>,
    pub title_element: Option<String>,
    pub content_element: Option<String>,
    pub classes: Vec<String>,
    pub default_title: Option<String>,
}

/// Syntax highlighting configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// Extra language aliases, e.g. `sh = "bash"`.
    pub lang_alias: HashMap<String, String>,
    /// Languages left unhighlighted in addition to the defaults.
    pub exclude_langs: Vec<String>,
}

/// Math configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MathConfig {
    /// Stylesheet linked once from documents containing math. Empty links
    /// nothing; unset keeps the built-in default.
    pub stylesheet_href: Option<String>,
}

/// Raw diagrams configuration as parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DiagramsConfigRaw {
    strategy: Option<String>,
    kroki_url: Option<String>,
    timeout_secs: Option<u64>,
    languages: Option<Vec<String>>,
}

/// Resolved diagram configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramsConfig {
    pub strategy: DiagramStrategy,
    /// Kroki server URL; required for inline SVG.
    pub kroki_url: Option<String>,
    pub timeout: Duration,
    /// Fence languages treated as diagrams.
    pub languages: Vec<String>,
}

impl Default for DiagramsConfig {
    fn default() -> Self {
        Self {
            strategy: DiagramStrategy::Pre,
            kroki_url: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            languages: PipelineOptions::default().diagram_languages,
        }
    }
}

/// Raw build configuration as parsed from TOML (paths as strings).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BuildConfigRaw {
    source_dir: Option<String>,
    output_dir: Option<String>,
}

/// Resolved build directories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildConfig {
    /// Directory scanned for `.md` and `.mdx` documents.
    pub source_dir: PathBuf,
    /// Directory receiving rendered `.html` files.
    pub output_dir: PathBuf,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`site.url`").
        field: String,
        /// Error message (e.g., "${`SITE_URL`} not set").
        message: String,
    },
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise searches
    /// for `quill.toml` in the current directory and its parents, falling
    /// back to defaults.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails
    /// or the result is invalid.
    pub fn load(config_path: Option<&Path>, cli_settings: Option<&CliSettings>) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Search for the config file in the current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        Self::discover_from(&current)
    }

    fn discover_from(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILENAME))
            .find(|candidate| candidate.is_file())
    }

    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Default config with directories relative to `base`.
    fn default_with_base(base: &Path) -> Self {
        Self {
            build_resolved: BuildConfig {
                source_dir: base.join("docs"),
                output_dir: base.join("dist"),
            },
            ..Self::default()
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve(config_dir)?;
        config.config_path = Some(path.to_path_buf());

        config.validate()?;
        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(url) = &settings.site_url {
            self.site.url = Some(url.clone());
        }
        if let Some(url) = &settings.kroki_url {
            self.diagrams_resolved.kroki_url = Some(url.clone());
            if self.diagrams.strategy.is_none() && settings.diagram_strategy.is_none() {
                self.diagrams_resolved.strategy = DiagramStrategy::InlineSvg;
            }
        }
        if let Some(strategy) = settings.diagram_strategy {
            self.diagrams_resolved.strategy = strategy;
        }
        if let Some(enabled) = settings.single_dollar_math {
            self.markdown.single_dollar_math = Some(enabled);
        }
        if let Some(dir) = &settings.source_dir {
            self.build_resolved.source_dir.clone_from(dir);
        }
        if let Some(dir) = &settings.output_dir {
            self.build_resolved.output_dir.clone_from(dir);
        }
    }

    /// Expand environment variable references.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(url) = &self.site.url {
            self.site.url = Some(expand::expand_env(url, "site.url")?);
        }
        if let Some(url) = &self.diagrams.kroki_url {
            self.diagrams.kroki_url = Some(expand::expand_env(url, "diagrams.kroki_url")?);
        }
        Ok(())
    }

    /// Resolve raw sections: directories against `config_dir`, diagram
    /// strategy and timeout.
    fn resolve(&mut self, config_dir: &Path) -> Result<(), ConfigError> {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));
        self.build_resolved = BuildConfig {
            source_dir: resolve(self.build.source_dir.as_deref(), "docs"),
            output_dir: resolve(self.build.output_dir.as_deref(), "dist"),
        };

        let raw = &self.diagrams;
        // Without a renderer URL the only workable default is client-side rendering.
        let strategy = match raw.strategy.as_deref() {
            Some(s) => s
                .parse::<DiagramStrategy>()
                .map_err(|e: String| ConfigError::Validation(format!("diagrams.strategy: {e}")))?,
            None if raw.kroki_url.is_some() => DiagramStrategy::InlineSvg,
            None => DiagramStrategy::Pre,
        };
        let defaults = DiagramsConfig::default();
        self.diagrams_resolved = DiagramsConfig {
            strategy,
            kroki_url: raw.kroki_url.clone(),
            timeout: raw.timeout_secs.map_or(defaults.timeout, Duration::from_secs),
            languages: raw.languages.clone().unwrap_or(defaults.languages),
        };

        if raw.timeout_secs == Some(0) {
            return Err(ConfigError::Validation(
                "diagrams.timeout_secs must be greater than 0".to_owned(),
            ));
        }
        Ok(())
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.site.url {
            require_http_url(url, "site.url")?;
        }

        let diagrams = &self.diagrams_resolved;
        match &diagrams.kroki_url {
            Some(url) => require_http_url(url, "diagrams.kroki_url")?,
            None if diagrams.strategy == DiagramStrategy::InlineSvg => {
                return Err(ConfigError::Validation(
                    "diagrams.strategy = \"inline-svg\" requires diagrams.kroki_url".to_owned(),
                ));
            }
            None => {}
        }

        if let Some(format) = &self.markdown.heading_suffix_format
            && !format.contains("{n}")
        {
            return Err(ConfigError::Validation(
                "markdown.heading_suffix_format must contain {n}".to_owned(),
            ));
        }

        for (name, block) in &self.markdown.custom_blocks {
            custom_block_definition(name, block)?;
        }
        Ok(())
    }

    /// Pipeline options described by this configuration.
    ///
    /// No diagram renderer is attached; hosts add one for inline SVG.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` for an invalid custom block.
    pub fn pipeline_options(&self) -> Result<PipelineOptions, ConfigError> {
        let md = &self.markdown;
        let mut options = PipelineOptions::default();

        options.site_url.clone_from(&self.site.url);
        set(&mut options.single_dollar_math, md.single_dollar_math);
        set(&mut options.tab_group_syntax, md.tab_group_syntax);
        set(&mut options.heading_anchors, md.heading_anchors);
        set(&mut options.smartypants, md.smartypants);
        set(&mut options.replacements, md.replacements);
        set(&mut options.emoji, md.emoji);
        set(&mut options.linkify, md.linkify);
        set(&mut options.breaks, md.breaks);
        set(&mut options.attributes, md.attributes);
        set(&mut options.align, md.align);
        set(&mut options.accessible_emojis, md.accessible_emojis);
        if let Some(heading) = &md.toc_heading {
            options.toc_heading = (!heading.is_empty()).then(|| heading.clone());
        }
        set(&mut options.utility_classes, md.utility_classes);
        set(&mut options.heading_suffix_format, md.heading_suffix_format.clone());
        set(&mut options.external_link_rel, md.external_link_rel.clone());
        set(&mut options.footnote_label, md.footnote_label.clone());
        set(&mut options.footnote_backref_title, md.footnote_backref_title.clone());
        if let Some(target) = &md.external_link_target {
            // An empty target switches the attribute off.
            options.external_link_target = (!target.is_empty()).then(|| target.clone());
        }
        options.disabled_replacements.clone_from(&md.disabled_replacements);

        let labels = &md.captions;
        let defaults = CaptionLabels::default();
        options.caption_labels = CaptionLabels {
            table: labels.table.clone().unwrap_or(defaults.table),
            code: labels.code.clone().unwrap_or(defaults.code),
            image: labels.image.clone().unwrap_or(defaults.image),
            quote: labels.quote.clone().unwrap_or(defaults.quote),
        };

        for (name, block) in &md.custom_blocks {
            options
                .custom_blocks
                .insert(name.clone(), custom_block_definition(name, block)?);
        }

        options.lang_aliases.extend(
            self.highlight
                .lang_alias
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        options
            .highlight_exclude
            .extend(self.highlight.exclude_langs.iter().cloned());

        options.diagram_strategy = self.diagrams_resolved.strategy;
        options.diagram_languages.clone_from(&self.diagrams_resolved.languages);
        match self.math.stylesheet_href.as_deref() {
            Some("") => options.math_stylesheet_href = None,
            Some(href) => options.math_stylesheet_href = Some(href.to_owned()),
            None => {}
        }

        Ok(options)
    }
}

fn set<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

/// Build and check one custom block definition.
fn custom_block_definition(name: &str, block: &CustomBlockConfig) -> Result<CustomBlockDefinition, ConfigError> {
    let field = format!("markdown.custom_blocks.{name}");
    if name.trim().is_empty() || name.contains(char::is_whitespace) || name.contains('|') {
        return Err(ConfigError::Validation(format!(
            "invalid custom block name '{name}'"
        )));
    }
    let title: TitleMode = match &block.title {
        Some(mode) => mode
            .parse::<TitleMode>()
            .map_err(|e: String| ConfigError::Validation(format!("{field}.title: {e}")))?,
        None => TitleMode::Optional,
    };

    let mut definition = CustomBlockDefinition::new(title);
    definition.details = block.details;
    set(&mut definition.wrapper_tag, block.container.clone());
    set(&mut definition.title_tag, block.title_element.clone());
    set(&mut definition.content_tag, block.content_element.clone());
    definition.classes.clone_from(&block.classes);
    definition.default_title.clone_from(&block.default_title);
    Ok(definition)
}

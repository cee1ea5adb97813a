//! Kroki rendering over HTTP.
//!
//! Each diagram is sent as `POST {server}/{endpoint}/svg` with the diagram
//! source as a plain-text body. A document's diagrams are sent in parallel
//! on the global rayon pool. Rendered SVG is memoized per language and
//! source, so a diagram shared by many documents is fetched once. The memo
//! holds at most [`DEFAULT_CACHE_CAPACITY`] diagrams unless configured
//! otherwise; when full, an arbitrary entry makes room.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use quill_renderer::{BoxError, DiagramRenderer, DiagramRequest};
use rayon::prelude::*;
use ureq::Agent;

use crate::language::DiagramLanguage;

/// Request timeout used unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Rendered diagrams kept in memory unless configured otherwise.
pub const DEFAULT_CACHE_CAPACITY: usize = 512;

/// Single diagram rendering error.
#[derive(Debug, thiserror::Error)]
#[error("diagram {index}: {kind}")]
pub struct DiagramError {
    pub index: usize,
    pub kind: DiagramErrorKind,
}

/// Kind of diagram rendering error.
#[derive(Debug, thiserror::Error)]
pub enum DiagramErrorKind {
    #[error("unsupported diagram language '{0}'")]
    UnsupportedLanguage(String),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("I/O error: {0}")]
    Io(String),
}

/// Create an HTTP agent with the given timeout.
///
/// Non-2xx responses are returned as responses rather than errors so their
/// body can be reported.
pub fn create_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

/// Renders diagrams to SVG through a Kroki server.
pub struct KrokiRenderer {
    server_url: String,
    timeout: Duration,
    agent: OnceLock<Agent>,
    cache: Mutex<HashMap<(DiagramLanguage, String), String>>,
    cache_capacity: usize,
}

impl std::fmt::Debug for KrokiRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KrokiRenderer")
            .field("server_url", &self.server_url)
            .field("timeout", &self.timeout)
            .field("cache_capacity", &self.cache_capacity)
            .finish_non_exhaustive()
    }
}

impl KrokiRenderer {
    #[must_use]
    pub fn new(server_url: impl Into<String>) -> Self {
        let server_url = server_url.into().trim_end_matches('/').to_owned();
        Self {
            server_url,
            timeout: DEFAULT_TIMEOUT,
            agent: OnceLock::new(),
            cache: Mutex::new(HashMap::new()),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }

    /// Keep at most `capacity` rendered diagrams; zero disables the memo.
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// The shared agent, created on first use.
    fn agent(&self) -> &Agent {
        self.agent.get_or_init(|| {
            tracing::debug!(server = %self.server_url, timeout = ?self.timeout, "Creating Kroki agent");
            create_agent(self.timeout)
        })
    }

    fn cached(&self, key: &(DiagramLanguage, String)) -> Option<String> {
        self.cache.lock().ok()?.get(key).cloned()
    }

    fn remember(&self, key: (DiagramLanguage, String), svg: &str) {
        if self.cache_capacity == 0 {
            return;
        }
        let Ok(mut cache) = self.cache.lock() else {
            return;
        };
        if cache.len() >= self.cache_capacity
            && !cache.contains_key(&key)
            && let Some(evicted) = cache.keys().next().cloned()
        {
            cache.remove(&evicted);
        }
        cache.insert(key, svg.to_owned());
    }

    /// Render one diagram, consulting the memo first.
    pub fn render(&self, request: &DiagramRequest) -> Result<String, DiagramError> {
        let language = DiagramLanguage::parse(&request.language).ok_or_else(|| DiagramError {
            index: request.index,
            kind: DiagramErrorKind::UnsupportedLanguage(request.language.clone()),
        })?;

        let key = (language, request.source.clone());
        if let Some(svg) = self.cached(&key) {
            return Ok(svg);
        }

        let data = self.send(request.index, language, &request.source)?;
        let svg = String::from_utf8(data).map_err(|e| DiagramError {
            index: request.index,
            kind: DiagramErrorKind::Io(format!("invalid UTF-8 in SVG: {e}")),
        })?;
        self.remember(key, &svg);
        Ok(svg)
    }

    /// POST the source to Kroki and return the response body.
    ///
    /// Error responses are read for their body to give the server's message.
    fn send(&self, index: usize, language: DiagramLanguage, source: &str) -> Result<Vec<u8>, DiagramError> {
        let url = format!("{}/{}/svg", self.server_url, language.kroki_endpoint());
        tracing::debug!(%url, index, "Rendering diagram");

        let response = self
            .agent()
            .post(&url)
            .header("Content-Type", "text/plain")
            .send(source.as_bytes())
            .map_err(|e| DiagramError {
                index,
                kind: DiagramErrorKind::Http(e.to_string()),
            })?;

        let status = response.status().as_u16();
        let mut body = response.into_body();

        if status >= 400 {
            let error_body = body
                .read_to_string()
                .unwrap_or_else(|_| String::from("(unable to read error body)"));
            return Err(DiagramError {
                index,
                kind: DiagramErrorKind::Http(format!("HTTP {status}: {}", error_body.trim())),
            });
        }

        body.read_to_vec().map_err(|e| DiagramError {
            index,
            kind: DiagramErrorKind::Io(e.to_string()),
        })
    }
}

impl DiagramRenderer for KrokiRenderer {
    fn render_svg(&self, request: &DiagramRequest) -> Result<String, BoxError> {
        self.render(request).map_err(Into::into)
    }

    fn render_batch(&self, requests: &[DiagramRequest]) -> Vec<Result<String, BoxError>> {
        requests
            .par_iter()
            .map(|request| self.render_svg(request))
            .collect()
    }
}

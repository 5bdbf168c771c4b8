//! AST parsing service client and end-to-end window resolution
//!
//! The parsing service accepts `POST {url}` with `{"query": "<flux>"}` and
//! answers `{"ast": <tree>}`.

use crate::ast::Node;
use crate::config::WindowSettings;
use crate::error::{error_for_status, ApiError, WindowError};
use crate::window::{min_duration_from_ast_at, now_millis};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Something that can turn Flux source text into an AST
#[async_trait]
pub trait AstSource: Send + Sync {
    async fn fetch_ast(&self, url: &str, query: &str) -> Result<Node, ApiError>;
}

#[derive(Debug, Serialize)]
struct AstRequest<'a> {
    query: &'a str,
}

#[derive(Debug, Deserialize)]
struct AstResponse {
    ast: Node,
}

/// [`AstSource`] backed by the HTTP parsing service
#[derive(Debug, Clone, Default)]
pub struct HttpAstSource {
    client: reqwest::Client,
}

impl HttpAstSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuse an existing client (connection pool, proxy settings)
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AstSource for HttpAstSource {
    async fn fetch_ast(&self, url: &str, query: &str) -> Result<Node, ApiError> {
        let response = self
            .client
            .post(url)
            .json(&AstRequest { query })
            .send()
            .await?;
        let body: AstResponse = error_for_status(response).await?.json().await?;

        info!(url, "fetched query AST");
        Ok(body.ast)
    }
}

/// Resolves the minimum window of a query, fetching its AST on demand
pub struct WindowResolver<S> {
    settings: WindowSettings,
    source: S,
}

impl<S: AstSource> WindowResolver<S> {
    pub fn new(settings: WindowSettings, source: S) -> Self {
        Self { settings, source }
    }

    pub fn settings(&self) -> &WindowSettings {
        &self.settings
    }

    /// Minimum window of `query` in milliseconds.
    ///
    /// Without an AST link the configured default is returned and the
    /// parsing service is never contacted. `Ok(None)` means the window could
    /// not be determined from the query's range calls.
    pub async fn resolve_min_window(
        &self,
        ast_link: &str,
        query: &str,
    ) -> Result<Option<f64>, WindowError> {
        self.resolve_min_window_at(ast_link, query, now_millis()).await
    }

    /// Like [`Self::resolve_min_window`], with relative bounds taken from `now`
    pub async fn resolve_min_window_at(
        &self,
        ast_link: &str,
        query: &str,
        now: f64,
    ) -> Result<Option<f64>, WindowError> {
        if ast_link.trim().is_empty() {
            debug!(
                default_ms = self.settings.default_ms,
                "no AST link, using default window"
            );
            return Ok(Some(self.settings.default_ms));
        }

        let ast = self.source.fetch_ast(ast_link, query).await?;
        Ok(min_duration_from_ast_at(&ast, now)?)
    }
}

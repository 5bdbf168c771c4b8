//! fluxwindow.toml configuration
//!
//! Every section is optional; a missing file or section falls back to the
//! defaults below.
//!
//! # Example fluxwindow.toml
//!
//! ```toml
//! [window]
//! default_ms = 600000
//!
//! [ast]
//! url = "http://localhost:8888/chronograf/v1/flux/ast"
//!
//! [kapacitor]
//! url = "http://localhost:9092"
//! username = "admin"
//! password = "secret"
//! task_limit = 500
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Window returned when no AST service is available (10 minutes)
pub const DEFAULT_WINDOW_MS: f64 = 600_000.0;

/// File picked up from the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "fluxwindow.toml";

const DEFAULT_TASK_LIMIT: usize = 500;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct FluxWindowConfig {
    pub window: WindowSettings,
    pub ast: AstSettings,
    pub kapacitor: Option<KapacitorSettings>,
}

/// Settings for window resolution
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowSettings {
    /// Fallback window in milliseconds when no AST link is configured
    pub default_ms: f64,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            default_ms: DEFAULT_WINDOW_MS,
        }
    }
}

/// AST parsing service
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct AstSettings {
    pub url: Option<String>,
}

/// Kapacitor connection used for Flux task management
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct KapacitorSettings {
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Maximum number of tasks requested when listing
    #[serde(default = "default_task_limit")]
    pub task_limit: usize,
}

fn default_task_limit() -> usize {
    DEFAULT_TASK_LIMIT
}

impl KapacitorSettings {
    /// Settings for an unauthenticated Kapacitor at `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: None,
            password: None,
            task_limit: DEFAULT_TASK_LIMIT,
        }
    }
}

impl FluxWindowConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    /// Load configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML")
    }

    /// Load `path` if given, else `fluxwindow.toml` in the working directory
    /// when present, else the defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }
}

// Workspace configuration
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::layout::LayoutConfig;

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:3000/api";
pub const DEFAULT_PROGRESS_TICK_MS: u64 = 600;
pub const DEFAULT_PASTE_PREFIX_CHARS: usize = 20;

/// Settings for one workspace session.
///
/// Loaded from a JSON file when one is given, otherwise from environment
/// variables. Environment variables always win over file values so a
/// deployment can repoint the judge without editing the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkspaceConfig {
    /// Base URL of the judge; `run` and `submit` are appended to it.
    pub backend_url: String,

    /// Bearer token forwarded to the judge. Obtaining it is someone else's job.
    pub auth_token: Option<String>,

    /// Interval of the cosmetic progress ticker.
    pub progress_tick_ms: u64,

    /// Client-side request timeout. `None` waits for the judge indefinitely.
    pub request_timeout_ms: Option<u64>,

    /// How many leading characters of a paste are searched for in the document.
    pub paste_prefix_chars: usize,

    pub layout: LayoutConfig,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            auth_token: None,
            progress_tick_ms: DEFAULT_PROGRESS_TICK_MS,
            request_timeout_ms: None,
            paste_prefix_chars: DEFAULT_PASTE_PREFIX_CHARS,
            layout: LayoutConfig::default(),
        }
    }
}

impl WorkspaceConfig {
    /// Load configuration from a JSON file, then apply env overrides.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!("Workspace config file not found: {}", path.display());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read workspace config: {}", path.display()))?;

        let config: WorkspaceConfig =
            serde_json::from_str(&content).context("Failed to parse workspace config")?;

        let config = config.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> Result<Self> {
        let config = Self::default().with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when given, otherwise fall back to the environment.
    pub fn load_or_env(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Self::from_env(),
        }
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("ARENA_BACKEND_URL") {
            self.backend_url = url;
        }
        if let Ok(token) = std::env::var("ARENA_AUTH_TOKEN") {
            if !token.trim().is_empty() {
                self.auth_token = Some(token);
            }
        }
        if let Some(ms) = env_u64("ARENA_PROGRESS_TICK_MS") {
            self.progress_tick_ms = ms;
        }
        if let Some(ms) = env_u64("ARENA_REQUEST_TIMEOUT_MS") {
            self.request_timeout_ms = Some(ms);
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.backend_url.trim().is_empty() {
            bail!("backendUrl cannot be empty");
        }
        if self.progress_tick_ms == 0 {
            bail!("progressTickMs must be greater than zero");
        }
        if self.paste_prefix_chars == 0 {
            bail!("pastePrefixChars must be greater than zero");
        }
        if self.request_timeout_ms == Some(0) {
            bail!("requestTimeoutMs must be greater than zero when set");
        }
        self.layout.validate()?;
        Ok(())
    }

    pub fn progress_tick(&self) -> Duration {
        Duration::from_millis(self.progress_tick_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

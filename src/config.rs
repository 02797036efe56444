use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::routing::RedirectTable;

/// Names the YAML configuration file to load.
pub const CONFIG_ENV: &str = "TINYWEB_CONFIG";

/// Overrides `server.listen_addr`.
pub const LISTEN_ENV: &str = "LISTEN";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub site: SiteConfig,
    pub redirects: RedirectConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Idle time allowed while waiting for request data, in milliseconds.
    pub read_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            read_timeout_ms: 10_000,
        }
    }
}

impl ServerConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    pub document_root: PathBuf,
    /// Directory holding `<code>.html` error pages; the document root if unset.
    pub error_pages: Option<PathBuf>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            document_root: PathBuf::from("htdocs"),
            error_pages: None,
        }
    }
}

/// Exact-match redirects, answered with `307 Temporary Redirect`.
///
/// ```yaml
/// redirects:
///   base: "https://example.com/"
///   table:
///     /old: /new
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RedirectConfig {
    /// Absolute URL every target is resolved against.
    pub base: Option<String>,
    pub table: HashMap<String, String>,
}

impl Config {
    /// Loads the file named by `TINYWEB_CONFIG` (defaults when unset), then
    /// applies the `LISTEN` override.
    pub fn load() -> Result<Self> {
        let mut cfg = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };

        if let Ok(listen_addr) = std::env::var(LISTEN_ENV) {
            cfg.server.listen_addr = listen_addr;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let cfg: Config = serde_yaml::from_str(text).context("Failed to parse configuration")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.read_timeout_ms == 0 {
            bail!("server.read_timeout_ms must be greater than zero");
        }
        RedirectTable::from_config(&self.redirects)?;
        Ok(())
    }

    pub fn error_pages(&self) -> &Path {
        self.site
            .error_pages
            .as_deref()
            .unwrap_or(&self.site.document_root)
    }
}

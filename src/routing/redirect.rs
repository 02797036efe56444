//! Redirect rules
//!
//! A rule decides whether a request target is redirected and where to. The
//! router answers matching targets with `307 Temporary Redirect`.

use std::collections::HashMap;

use anyhow::{bail, Context, Result};
use url::Url;

use crate::config::RedirectConfig;

pub trait Redirect: Send + Sync {
    /// Whether `uri` is redirected.
    fn can_redirect(&self, uri: &str) -> bool;

    /// The `Location` for `uri`. Only called when `can_redirect` said yes.
    fn target_for(&self, uri: &str) -> String;
}

/// Exact-match redirect table.
///
/// Targets are resolved against the optional base URL once, when the table is
/// built, so lookups never fail.
#[derive(Debug, Clone, Default)]
pub struct RedirectTable {
    table: HashMap<String, String>,
}

impl RedirectTable {
    /// Builds a table from `from → to` pairs used verbatim as `Location`.
    pub fn new(table: HashMap<String, String>) -> Self {
        Self { table }
    }

    /// Builds a table from configuration, resolving every target against
    /// `redirects.base` when one is set.
    ///
    /// Every resulting target must be either an absolute URL or an absolute
    /// path.
    pub fn from_config(config: &RedirectConfig) -> Result<Self> {
        let base = config
            .base
            .as_deref()
            .map(Url::parse)
            .transpose()
            .context("Invalid redirect base URL")?;

        let mut table = HashMap::with_capacity(config.table.len());
        for (from, to) in &config.table {
            let location = match &base {
                Some(base) => base
                    .join(to)
                    .with_context(|| format!("Invalid redirect target for {}: {}", from, to))?
                    .to_string(),
                None => to.clone(),
            };

            if !location.starts_with('/') && Url::parse(&location).is_err() {
                bail!(
                    "Redirect target for {} is neither an absolute URL nor an absolute path: {}",
                    from,
                    location
                );
            }

            table.insert(from.clone(), location);
        }

        Ok(Self { table })
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Redirect for RedirectTable {
    fn can_redirect(&self, uri: &str) -> bool {
        self.table.contains_key(uri)
    }

    fn target_for(&self, uri: &str) -> String {
        self.table
            .get(uri)
            .cloned()
            .unwrap_or_else(|| uri.to_string())
    }
}

//! Request routing
//!
//! `RouteConfig` is built once, before serving, and then shared read-only by
//! every session behind an `Arc`. Nothing in it is mutated afterwards, so the
//! request path never takes a lock.

pub mod handler;
pub mod path;
pub mod redirect;
pub mod router;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::http::response::{ResponseModel, StatusCode};

pub use handler::{Handler, HandlerOutput};
pub use path::{PathResolver, SafePath};
pub use redirect::{Redirect, RedirectTable};
pub use router::route;

/// Everything a session needs to turn a request into a response.
pub struct RouteConfig {
    redirect: Option<Box<dyn Redirect>>,
    handlers: HashMap<String, Arc<dyn Handler>>,
    resolver: PathResolver,
    error_pages: PathBuf,
}

impl RouteConfig {
    pub fn builder(document_root: impl Into<PathBuf>) -> RouteConfigBuilder {
        RouteConfigBuilder::new(document_root)
    }

    /// Builds the routes described by the configuration file: document root,
    /// error pages and redirect table. Handlers are registered in code, on a
    /// builder.
    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::builder_from_config(cfg)?.build()
    }

    pub fn builder_from_config(cfg: &Config) -> Result<RouteConfigBuilder> {
        let mut builder = Self::builder(&cfg.site.document_root).error_pages(cfg.error_pages());

        let redirects = RedirectTable::from_config(&cfg.redirects)?;
        if !redirects.is_empty() {
            builder = builder.redirect(redirects);
        }

        Ok(builder)
    }

    pub fn redirect(&self) -> Option<&dyn Redirect> {
        self.redirect.as_deref()
    }

    /// The handler registered for exactly `uri`.
    pub fn handler(&self, uri: &str) -> Option<Arc<dyn Handler>> {
        self.handlers.get(uri).cloned()
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// The error page for `status`: `<code>.html` from the error-page
    /// directory, or a built-in page when that file does not exist.
    pub fn error_response(&self, status: StatusCode) -> ResponseModel {
        ResponseModel::error_page(status, &self.error_pages)
    }
}

pub struct RouteConfigBuilder {
    document_root: PathBuf,
    error_pages: Option<PathBuf>,
    redirect: Option<Box<dyn Redirect>>,
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl RouteConfigBuilder {
    pub fn new(document_root: impl Into<PathBuf>) -> Self {
        Self {
            document_root: document_root.into(),
            error_pages: None,
            redirect: None,
            handlers: HashMap::new(),
        }
    }

    /// Directory holding `<code>.html` error pages. Defaults to the
    /// document root.
    pub fn error_pages(mut self, dir: impl Into<PathBuf>) -> Self {
        self.error_pages = Some(dir.into());
        self
    }

    pub fn redirect(mut self, redirect: impl Redirect + 'static) -> Self {
        self.redirect = Some(Box::new(redirect));
        self
    }

    /// Registers `handler` for exactly `uri`. A later registration for the
    /// same URI replaces the earlier one.
    pub fn handler(mut self, uri: impl Into<String>, handler: impl Handler + 'static) -> Self {
        self.handlers.insert(uri.into(), Arc::new(handler));
        self
    }

    pub fn build(self) -> Result<RouteConfig> {
        let resolver = PathResolver::new(&self.document_root).with_context(|| {
            format!("Invalid document root {}", self.document_root.display())
        })?;
        let error_pages = self
            .error_pages
            .unwrap_or_else(|| resolver.root().to_path_buf());

        tracing::debug!(
            root = %resolver.root().display(),
            error_pages = %error_pages.display(),
            handlers = self.handlers.len(),
            redirect = self.redirect.is_some(),
            "Routes configured"
        );

        Ok(RouteConfig {
            redirect: self.redirect,
            handlers: self.handlers,
            resolver,
            error_pages,
        })
    }
}

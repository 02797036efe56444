//! Mapping request targets onto the document root
//!
//! Dot segments are removed on the raw URI, before percent-decoding. Encoded
//! dots (`%2e%2e`) therefore survive normalization and only become `..` in the
//! joined filesystem path. That is safe because containment is decided on the
//! canonical path, after symlinks and every `..` are resolved, and it is
//! decided before existence: a target outside the root is `Forbidden` whether
//! or not it exists.
//!
//! Resolution runs synchronously on the session task. It only issues
//! metadata calls (`canonicalize`, `symlink_metadata`), never reads file
//! contents; the file itself is opened with `tokio::fs` when rendered.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use percent_encoding::percent_decode_str;

use crate::http::error::HttpError;

const INDEX_FILE: &str = "index.html";

/// An existing path inside the document root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafePath(PathBuf);

impl SafePath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

impl AsRef<Path> for SafePath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    /// Creates a resolver for `document_root`, which must be an existing
    /// directory. The root is canonicalized once, here.
    pub fn new(document_root: impl AsRef<Path>) -> io::Result<Self> {
        let root = fs::canonicalize(document_root.as_ref())?;
        if !root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("document root {} is not a directory", root.display()),
            ));
        }
        Ok(Self { root })
    }

    /// The canonical document root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, raw_uri: &str) -> Result<SafePath, HttpError> {
        let rest = raw_uri.strip_prefix('/').ok_or(HttpError::BadRequest)?;
        let path = match rest.find(['?', '#']) {
            Some(end) => &rest[..end],
            None => rest,
        };
        check_uri_syntax(path)?;

        let mut candidate = self.root.clone();
        for segment in remove_dot_segments(path) {
            let decoded = percent_decode_str(segment)
                .decode_utf8()
                .map_err(|_| HttpError::BadRequest)?;
            if decoded.contains('\0') {
                return Err(HttpError::BadRequest);
            }
            candidate.push(&*decoded);
        }

        if candidate.is_dir() {
            candidate.push(INDEX_FILE);
        }

        let canonical = canonicalize_lenient(&candidate).map_err(|_| HttpError::Forbidden)?;
        if !canonical.starts_with(&self.root) {
            return Err(HttpError::Forbidden);
        }
        if !canonical.exists() {
            return Err(HttpError::NotFound);
        }

        Ok(SafePath(canonical))
    }
}

/// Rejects malformed percent escapes and characters that may not appear in
/// a URI path.
fn check_uri_syntax(path: &str) -> Result<(), HttpError> {
    let mut bytes = path.bytes();
    while let Some(b) = bytes.next() {
        match b {
            b'%' => {
                let hi = bytes.next();
                let lo = bytes.next();
                let valid = hi.is_some_and(|h| h.is_ascii_hexdigit())
                    && lo.is_some_and(|l| l.is_ascii_hexdigit());
                if !valid {
                    return Err(HttpError::BadRequest);
                }
            }
            b if b.is_ascii_control() || b" \"<>\\^`{|}".contains(&b) => {
                return Err(HttpError::BadRequest);
            }
            _ => {}
        }
    }
    Ok(())
}

/// Removes `.` and `..` segments from a relative URI path.
///
/// A `..` with nothing left to remove is kept, so `../x` stays `../x` and is
/// caught by the containment check later. Empty segments are dropped.
fn remove_dot_segments(path: &str) -> Vec<&str> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }
    segments
}

/// Like `fs::canonicalize`, but the path does not have to exist.
///
/// Every existing prefix is canonicalized so symlinks are followed; the
/// missing tail is resolved lexically.
fn canonicalize_lenient(path: &Path) -> io::Result<PathBuf> {
    let mut resolved = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => resolved.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            Component::Normal(name) => {
                resolved.push(name);
                if fs::symlink_metadata(&resolved).is_ok() {
                    resolved = fs::canonicalize(&resolved)?;
                }
            }
        }
    }
    Ok(resolved)
}

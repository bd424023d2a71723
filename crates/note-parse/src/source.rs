//! Where document text comes from.
//!
//! A source id is either a local path or an `http://`/`https://` URL. The
//! parser asks a [`SourceProvider`] for the text of the root document and of
//! every import.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

/// Loads document text by source id.
pub trait SourceProvider {
    /// Read the whole text of `id`.
    fn fetch(&self, id: &str) -> Result<String, SourceError>;

    /// Turn an import `target` written inside `base` into a source id.
    fn resolve(&self, base: &str, target: &str) -> String {
        let _ = base;
        target.to_string()
    }
}

/// Failure to load a source.
#[derive(Debug)]
pub enum SourceError {
    /// The id is not known to the provider.
    NotFound(String),
    /// Reading a local file failed.
    Io { path: String, source: io::Error },
    /// Fetching a URL failed, or the server answered with an error status.
    #[cfg(feature = "http")]
    Http { url: String, source: reqwest::Error },
    /// A URL was requested from a build without HTTP support.
    RemoteUnsupported(String),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::NotFound(id) => write!(f, "no source named {id:?}"),
            SourceError::Io { path, source } => write!(f, "cannot read {path}: {source}"),
            #[cfg(feature = "http")]
            SourceError::Http { url, source } => write!(f, "cannot fetch {url}: {source}"),
            SourceError::RemoteUnsupported(url) => {
                write!(f, "cannot fetch {url}: built without HTTP support")
            }
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SourceError::Io { source, .. } => Some(source),
            #[cfg(feature = "http")]
            SourceError::Http { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Whether `id` names a remote document. The scheme is case-insensitive.
pub fn is_remote(id: &str) -> bool {
    let lower = id.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Drop `.` components from a local path so that `./a.note` and `a.note`
/// name the same document. URLs are returned unchanged.
pub(crate) fn normalize(id: &str) -> String {
    if is_remote(id) {
        return id.to_string();
    }
    let path: PathBuf = Path::new(id)
        .components()
        .filter(|component| !matches!(component, Component::CurDir))
        .collect();
    if path.as_os_str().is_empty() {
        return id.to_string();
    }
    path.to_string_lossy().into_owned()
}

/// Reads local files from disk and URLs over HTTP.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultProvider;

impl DefaultProvider {
    pub fn new() -> Self {
        Self
    }

    #[cfg(feature = "http")]
    fn fetch_remote(&self, url: &str) -> Result<String, SourceError> {
        let http = |source| SourceError::Http {
            url: url.to_string(),
            source,
        };
        reqwest::blocking::get(url)
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.text())
            .map_err(http)
    }

    #[cfg(not(feature = "http"))]
    fn fetch_remote(&self, url: &str) -> Result<String, SourceError> {
        Err(SourceError::RemoteUnsupported(url.to_string()))
    }
}

impl SourceProvider for DefaultProvider {
    fn fetch(&self, id: &str) -> Result<String, SourceError> {
        if is_remote(id) {
            debug!("Fetching {}", id);
            return self.fetch_remote(id);
        }
        debug!("Reading {}", id);
        std::fs::read_to_string(id).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => SourceError::NotFound(id.to_string()),
            _ => SourceError::Io {
                path: id.to_string(),
                source,
            },
        })
    }

    /// Relative targets are taken relative to the directory (or URL path)
    /// of `base`. URLs and absolute paths are returned unchanged.
    fn resolve(&self, base: &str, target: &str) -> String {
        if is_remote(target) {
            return target.to_string();
        }

        if is_remote(base) {
            let scheme_end = base.find("://").map_or(0, |i| i + 3);
            let authority_end = base[scheme_end..]
                .find('/')
                .map_or(base.len(), |i| scheme_end + i);
            let origin = &base[..authority_end];
            if let Some(absolute) = target.strip_prefix('/') {
                return format!("{origin}/{absolute}");
            }
            let dir = match base[authority_end..].rfind('/') {
                Some(i) => &base[..authority_end + i],
                None => origin,
            };
            return format!("{dir}/{target}");
        }

        let path = Path::new(target);
        if path.is_absolute() {
            return normalize(target);
        }
        match Path::new(base).parent() {
            Some(dir) if !dir.as_os_str().is_empty() => {
                normalize(&dir.join(path).to_string_lossy())
            }
            _ => normalize(target),
        }
    }
}

/// Serves documents from memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    sources: HashMap<String, String>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document, replacing any previous text for `id`.
    pub fn insert(&mut self, id: impl Into<String>, text: impl Into<String>) {
        self.sources.insert(id.into(), text.into());
    }

    /// Builder-style [`MemoryProvider::insert`].
    pub fn with(mut self, id: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(id, text);
        self
    }
}

impl SourceProvider for MemoryProvider {
    fn fetch(&self, id: &str) -> Result<String, SourceError> {
        self.sources
            .get(id)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(id.to_string()))
    }
}

impl<P: SourceProvider + ?Sized> SourceProvider for &P {
    fn fetch(&self, id: &str) -> Result<String, SourceError> {
        (**self).fetch(id)
    }

    fn resolve(&self, base: &str, target: &str) -> String {
        (**self).resolve(base, target)
    }
}

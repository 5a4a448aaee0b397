//! # Document Transports
//!
//! Repo documents are fetched through a scheme dispatch table owned by a
//! [`Loader`]. Each URL scheme maps to a [`Transport`] implementation:
//!
//! - `file`: [`FileTransport`], reads from the local filesystem.
//! - `pkg`: [`PkgTransport`], reads resources bundled with the application
//!   from the configured resource root (`pkg://<id>/<path>` maps to
//!   `<root>/<id>/<path>`).
//! - `http` / `https`: [`HttpTransport`], a blocking GET through `ureq`.
//!
//! [`MemoryTransport`] serves documents from memory. It is not registered by
//! default; embedders and tests add it with [`Loader::with_transport`].

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use log::debug;
use toml::Table;
use url::Url;

use crate::error::{Error, Result};
use crate::settings::RepoSettings;

const USER_AGENT: &str = concat!("toml-repo/", env!("CARGO_PKG_VERSION"));

/// Trait for fetching documents by URL - allows mocking in tests
pub trait Transport: Send + Sync {
    /// Fetches the raw text at `url`.
    ///
    /// Must fail with `Error::NotFound` when the resource does not exist.
    fn read(&self, url: &Url) -> Result<String>;

    /// Whether `url` names a document directly rather than a directory.
    fn is_document(&self, url: &Url) -> bool;

    /// The local filesystem path behind `url`, for transports that have one.
    fn local_path(&self, _url: &Url) -> Option<PathBuf> {
        None
    }
}

fn file_path(url: &Url) -> Result<PathBuf> {
    url.to_file_path().map_err(|()| Error::Path {
        message: format!("'{}' is not a local file URL", url),
    })
}

/// Reads `file://` URLs from the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileTransport;

impl Transport for FileTransport {
    fn read(&self, url: &Url) -> Result<String> {
        let path = file_path(url)?;
        fs::read_to_string(&path).map_err(|e| Error::from_read(url.as_str(), e))
    }

    fn is_document(&self, url: &Url) -> bool {
        file_path(url).map(|path| path.is_file()).unwrap_or(false)
    }

    fn local_path(&self, url: &Url) -> Option<PathBuf> {
        file_path(url).ok()
    }
}

/// Reads `pkg://` URLs relative to a resource root directory.
#[derive(Debug, Clone)]
pub struct PkgTransport {
    root: PathBuf,
}

impl PkgTransport {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, url: &Url) -> PathBuf {
        let mut path = self.root.clone();
        if let Some(host) = url.host_str() {
            path.push(host);
        }
        if let Some(segments) = url.path_segments() {
            for segment in segments.filter(|s| !s.is_empty()) {
                path.push(segment);
            }
        }
        path
    }
}

impl Transport for PkgTransport {
    fn read(&self, url: &Url) -> Result<String> {
        let path = self.resolve(url);
        fs::read_to_string(&path).map_err(|e| Error::from_read(url.as_str(), e))
    }

    fn is_document(&self, url: &Url) -> bool {
        self.resolve(url).is_file()
    }

    fn local_path(&self, url: &Url) -> Option<PathBuf> {
        Some(self.resolve(url))
    }
}

/// Fetches `http://` and `https://` URLs.
///
/// Directory detection cannot probe the server, so a URL whose path ends in
/// `.toml` is taken to be a document.
#[derive(Clone)]
pub struct HttpTransport {
    agent: ureq::Agent,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new().user_agent(USER_AGENT).build(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport").finish_non_exhaustive()
    }
}

impl Transport for HttpTransport {
    fn read(&self, url: &Url) -> Result<String> {
        debug!("GET {}", url);
        match self.agent.get(url.as_str()).call() {
            Ok(response) => response.into_string().map_err(|e| Error::Network {
                url: url.to_string(),
                message: e.to_string(),
            }),
            Err(ureq::Error::Status(404, _)) => Err(Error::NotFound {
                location: url.to_string(),
                message: "HTTP 404".to_string(),
            }),
            Err(ureq::Error::Status(code, response)) => {
                let body = response.into_string().unwrap_or_default();
                Err(Error::Network {
                    url: url.to_string(),
                    message: format!("HTTP {}: {}", code, body),
                })
            }
            Err(e) => Err(Error::Network {
                url: url.to_string(),
                message: e.to_string(),
            }),
        }
    }

    fn is_document(&self, url: &Url) -> bool {
        url.path().ends_with(".toml")
    }
}

/// Serves documents held in memory, keyed by their exact URL string.
#[derive(Debug, Default, Clone)]
pub struct MemoryTransport {
    documents: HashMap<String, String>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a document, replacing any previous one at the same URL.
    pub fn insert(&mut self, url: impl Into<String>, content: impl Into<String>) {
        self.documents.insert(url.into(), content.into());
    }

    pub fn with_document(mut self, url: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert(url, content);
        self
    }
}

impl Transport for MemoryTransport {
    fn read(&self, url: &Url) -> Result<String> {
        self.documents
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| Error::NotFound {
                location: url.to_string(),
                message: "no such in-memory document".to_string(),
            })
    }

    fn is_document(&self, url: &Url) -> bool {
        self.documents.contains_key(url.as_str())
    }
}

/// Settings plus the scheme dispatch table used to fetch and parse documents.
///
/// Cloning is cheap: transports are shared behind `Arc`.
#[derive(Clone)]
pub struct Loader {
    settings: RepoSettings,
    transports: BTreeMap<String, Arc<dyn Transport>>,
}

impl Loader {
    /// Creates a loader with the built-in transports.
    ///
    /// `pkg` is only registered when the settings carry a resource root.
    pub fn new(settings: RepoSettings) -> Self {
        let mut transports: BTreeMap<String, Arc<dyn Transport>> = BTreeMap::new();
        transports.insert("file".to_string(), Arc::new(FileTransport));
        if let Some(root) = &settings.pkg_resource_root {
            transports.insert("pkg".to_string(), Arc::new(PkgTransport::new(root)));
        }
        let http: Arc<dyn Transport> = Arc::new(HttpTransport::new());
        transports.insert("http".to_string(), Arc::clone(&http));
        transports.insert("https".to_string(), http);

        Self {
            settings,
            transports,
        }
    }

    /// Registers `transport` for `scheme`, replacing any existing entry.
    pub fn with_transport(mut self, scheme: &str, transport: impl Transport + 'static) -> Self {
        self.transports
            .insert(scheme.to_ascii_lowercase(), Arc::new(transport));
        self
    }

    pub fn settings(&self) -> &RepoSettings {
        &self.settings
    }

    /// Looks up the transport for `url`'s scheme.
    pub fn transport(&self, url: &Url) -> Result<&dyn Transport> {
        match self.transports.get(url.scheme()) {
            Some(transport) => Ok(transport.as_ref()),
            None if url.scheme() == "pkg" => Err(Error::Settings {
                message: format!("cannot load {}: no package resource root configured", url),
            }),
            None => Err(Error::UnsupportedScheme {
                url: url.to_string(),
                scheme: url.scheme().to_string(),
            }),
        }
    }

    /// Fetches and parses the document at `url`.
    pub fn read_document(&self, url: &Url) -> Result<Table> {
        debug!("Loading document {}", url);
        let text = self.transport(url)?.read(url)?;
        toml::from_str::<Table>(&text).map_err(|e| Error::Parse {
            location: url.to_string(),
            message: e.to_string(),
        })
    }
}

impl Default for Loader {
    /// A loader built from the process-wide settings.
    fn default() -> Self {
        Self::new(RepoSettings::global())
    }
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader")
            .field("settings", &self.settings)
            .field("schemes", &self.transports.keys().collect::<Vec<_>>())
            .finish()
    }
}

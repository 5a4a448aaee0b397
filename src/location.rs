//! Repo locations: identity strings and parsed URLs
//!
//! A repo is identified by the URL string it was added with. Local locations,
//! whether given as bare paths or `file://` URLs, are rendered as
//! `file://<normalized absolute path>`, so the same directory added any way
//! yields one identity.

use std::path::{Component, Path, PathBuf};

use url::Url;

use crate::error::{Error, Result};
use crate::transport::Loader;

/// Where a repo lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoLocation {
    id: String,
    url: Url,
}

impl RepoLocation {
    /// Parses a scheme-qualified URL or a bare filesystem path.
    pub fn parse(input: &str) -> Result<Self> {
        if has_scheme(input) {
            let id = trim_trailing_slash(input);
            if id.starts_with("file:") {
                let url = Url::parse(id)?;
                let path = url.to_file_path().map_err(|()| Error::Path {
                    message: format!("'{}' is not a local file URL", input),
                })?;
                return Self::from_path(&path);
            }
            let url = Url::parse(id)?;
            Ok(Self {
                id: id.to_string(),
                url,
            })
        } else {
            Self::from_path(Path::new(input))
        }
    }

    /// Builds a `file://` location from a filesystem path.
    ///
    /// Relative paths are made absolute against the working directory and
    /// `.`/`..` components are removed lexically.
    pub fn from_path(path: &Path) -> Result<Self> {
        let absolute = normalize(&std::path::absolute(path)?);
        let url = Url::from_file_path(&absolute).map_err(|()| Error::Path {
            message: format!("cannot express '{}' as a file URL", absolute.display()),
        })?;
        let id = format!("file://{}", absolute.display());
        Ok(Self {
            id: trim_trailing_slash(&id).to_string(),
            url,
        })
    }

    /// Resolves `input` against the document that referenced it.
    ///
    /// Inputs with their own scheme are parsed as-is. Otherwise the result
    /// keeps `base`'s scheme: for `file` bases the input is a filesystem path
    /// (relative ones are taken from the document's directory), for other
    /// schemes it is joined as a relative URL.
    pub fn resolve(input: &str, base: &Url) -> Result<Self> {
        if has_scheme(input) {
            return Self::parse(input);
        }

        if base.scheme() == "file" {
            let path = Path::new(input);
            if path.is_absolute() {
                return Self::from_path(path);
            }
            let document = base.to_file_path().map_err(|()| Error::Path {
                message: format!("'{}' is not a local file URL", base),
            })?;
            let dir = document.parent().unwrap_or_else(|| Path::new("/"));
            return Self::from_path(&dir.join(path));
        }

        let url = base.join(input)?;
        Ok(Self {
            id: trim_trailing_slash(url.as_str()).to_string(),
            url,
        })
    }

    /// The identity string of this location.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Determines the document to load for this location.
    ///
    /// A location that ends with the configured suffix, or that the transport
    /// recognizes as a document, is loaded directly. Anything else is treated
    /// as a directory and the suffix is appended. Returns the document's
    /// identity string and URL.
    pub fn document(&self, loader: &Loader) -> Result<(String, Url)> {
        let suffix = loader.settings().config_suffix.as_str();
        let transport = loader.transport(&self.url)?;

        if self.id.ends_with(suffix) || transport.is_document(&self.url) {
            return Ok((self.id.clone(), self.url.clone()));
        }

        let mut url = self.url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::Path {
                message: format!("'{}' cannot hold a document path", self.id),
            })?
            .pop_if_empty()
            .push(suffix);
        Ok((format!("{}/{}", self.id, suffix), url))
    }
}

fn has_scheme(input: &str) -> bool {
    input.contains("://")
}

fn trim_trailing_slash(input: &str) -> &str {
    let trimmed = input.trim_end_matches('/');
    if trimmed.ends_with(':') || trimmed.is_empty() {
        input
    } else {
        trimmed
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

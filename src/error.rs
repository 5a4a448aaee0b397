//! # Error Handling
//!
//! This module defines the centralized error type for `toml-repo`. It uses
//! `thiserror` to derive a single `Error` enum covering every failure mode of
//! loading, parsing and import resolution.
//!
//! Loading failures fall into three broad groups:
//!
//! - **Not found**: a document, an import file, or an import `node` path
//!   could not be located.
//! - **Parse**: a document is not valid TOML.
//! - **Invalid import**: an `import` declaration is malformed.
//!
//! All of them abort the load of the document that triggered them. The only
//! silent fallback in the crate is the explicit default accepted by the
//! `get_or` family of lookups.

use thiserror::Error;

/// Main error type for toml-repo operations
#[derive(Error, Debug)]
pub enum Error {
    /// A document, import file or import node could not be found.
    #[error("Not found: {location} - {message}")]
    NotFound { location: String, message: String },

    /// A document could not be parsed as TOML.
    #[error("TOML parsing error in {location}: {message}")]
    Parse { location: String, message: String },

    /// An `import` declaration is malformed.
    ///
    /// `node` is the dotted path of the node hosting the declaration.
    #[error("Invalid import at '{node}' in {location}: {message}")]
    InvalidImport {
        location: String,
        node: String,
        message: String,
    },

    /// An import chain, or a chain of cross-repo imports, loops back on itself.
    #[error("Cycle detected in imports: {cycle}")]
    CycleDetected { cycle: String },

    /// No transport is registered for the URL's scheme.
    #[error("Unsupported URL scheme '{scheme}' in {url}")]
    UnsupportedScheme { url: String, scheme: String },

    /// A remote fetch failed for a reason other than the resource being absent.
    #[error("Network operation error: {url} - {message}")]
    Network { url: String, message: String },

    /// The loader settings cannot satisfy a request.
    #[error("Settings error: {message}")]
    Settings { message: String },

    /// A path or URL could not be mapped onto the local filesystem.
    #[error("Path operation error: {message}")]
    Path { message: String },

    /// A value could not be converted into the requested type.
    #[error("Cannot deserialize '{path}': {message}")]
    Deserialize { path: String, message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl Error {
    /// Maps a read failure to `NotFound` when the resource is absent, and to
    /// `Io` otherwise.
    pub(crate) fn from_read(location: &str, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound {
                location: location.to_string(),
                message: err.to_string(),
            }
        } else {
            Error::Io(err)
        }
    }

    /// Returns true for the `NotFound` variant.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

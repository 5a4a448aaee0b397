//! # TOML Repository Library
//!
//! This library loads layered application configuration from *repos*:
//! directories or single TOML documents addressed by URL. It is used by the
//! `toml-repo` command-line tool but is meant to be embedded in applications
//! that assemble their settings from several sources (defaults, recipe
//! packs, user preferences).
//!
//! ## Quick Example
//!
//! ```
//! use toml_repo::{Loader, MemoryTransport, Repo, RepoManager, RepoSettings};
//!
//! let memory = MemoryTransport::new()
//!     .with_document("mem://defaults/repo.toml", "[user]\nname = \"default\"\n")
//!     .with_document(
//!         "mem://prefs/repo.toml",
//!         "[user]\nemail = \"x@example.com\"\n\n[profile.import]\nnode = \"user\"\n",
//!     );
//! let loader = Loader::new(RepoSettings::default()).with_transport("mem", memory);
//!
//! let prefs = Repo::open_with("mem://prefs", &loader)?;
//! assert_eq!(
//!     prefs.get("profile.email").and_then(|v| v.as_str()),
//!     Some("x@example.com")
//! );
//!
//! let mut manager = RepoManager::with_loader(loader);
//! manager.add_repo("mem://defaults")?;
//! manager.add_repo("mem://prefs")?;
//! assert_eq!(manager.get("user.name").and_then(|v| v.as_str()), Some("default"));
//! # Ok::<(), toml_repo::Error>(())
//! ```
//!
//! ## Core Concepts
//!
//! - **Repos (`repo`)**: one loaded document with every `import` declaration
//!   already resolved, plus path lookups and `repo-ref` discovery.
//! - **Imports (`import`)**: a table holding an `import` key is replaced by a
//!   deep copy of another node, from the same document, another file, or
//!   another repo.
//! - **Manager (`manager`)**: an ordered set of repos where later repos win
//!   per key path.
//! - **Transports (`transport`)**: how documents are fetched for each URL
//!   scheme (`file`, `pkg`, `http`, `https`, plus any registered by the
//!   caller).
//! - **Settings (`settings`)**: the configuration file suffix and the root
//!   for `pkg://` resources.

pub mod cache;
pub mod error;
pub mod import;
pub mod location;
pub mod manager;
pub mod path;
pub mod repo;
pub mod settings;
pub mod transport;

#[cfg(test)]
mod import_proptest;

pub use cache::{CacheKey, ImportCache};
pub use error::{Error, Result};
pub use import::{ImportSite, ImportSpec, IMPORT_KEY};
pub use location::RepoLocation;
pub use manager::{RepoManager, Sourced};
pub use repo::{Repo, DEFAULT_KIND, REPO_REF};
pub use settings::{
    config_suffix, pkg_resource_root, reset_settings, set_config_suffix, set_pkg_resource_root,
    RepoSettings, DEFAULT_CONFIG_SUFFIX,
};
pub use transport::{
    FileTransport, HttpTransport, Loader, MemoryTransport, PkgTransport, Transport,
};

//! Loader settings for toml-repo.
//!
//! Settings come in two forms:
//!
//! - [`RepoSettings`], an explicit value handed to a [`Loader`](crate::Loader).
//! - A process-wide copy mutated through [`set_config_suffix`] and
//!   [`set_pkg_resource_root`]. It is read once per repo construction through
//!   [`RepoSettings::global`], so it must be set before the repos that depend
//!   on it are loaded. [`reset_settings`] restores the defaults.

use std::path::PathBuf;
use std::sync::RwLock;

/// Document name used when a repo URL names a directory.
pub const DEFAULT_CONFIG_SUFFIX: &str = "repo.toml";

/// Settings consulted while locating and fetching repo documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSettings {
    /// File name appended to directory URLs to find their document.
    pub config_suffix: String,
    /// Base directory for `pkg://` URLs.
    pub pkg_resource_root: Option<PathBuf>,
}

impl Default for RepoSettings {
    fn default() -> Self {
        Self {
            config_suffix: DEFAULT_CONFIG_SUFFIX.to_string(),
            pkg_resource_root: None,
        }
    }
}

impl RepoSettings {
    /// Snapshot of the process-wide settings.
    pub fn global() -> Self {
        GLOBAL
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
            .unwrap_or_default()
    }

    pub fn with_config_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config_suffix = suffix.into();
        self
    }

    pub fn with_pkg_resource_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.pkg_resource_root = Some(root.into());
        self
    }
}

static GLOBAL: RwLock<Option<RepoSettings>> = RwLock::new(None);

fn update_global(update: impl FnOnce(&mut RepoSettings)) {
    let mut guard = GLOBAL
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    update(guard.get_or_insert_with(RepoSettings::default));
}

/// Sets the process-wide document name used for directory repos.
pub fn set_config_suffix(suffix: impl Into<String>) {
    let suffix = suffix.into();
    update_global(|settings| settings.config_suffix = suffix);
}

/// Returns the process-wide document name used for directory repos.
pub fn config_suffix() -> String {
    RepoSettings::global().config_suffix
}

/// Sets the process-wide base directory for `pkg://` URLs.
pub fn set_pkg_resource_root(root: impl Into<PathBuf>) {
    let root = root.into();
    update_global(|settings| settings.pkg_resource_root = Some(root));
}

/// Returns the process-wide base directory for `pkg://` URLs, if any.
pub fn pkg_resource_root() -> Option<PathBuf> {
    RepoSettings::global().pkg_resource_root
}

/// Restores the process-wide settings to their defaults.
pub fn reset_settings() {
    let mut guard = GLOBAL
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = None;
}

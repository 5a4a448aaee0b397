//! # Repo Manager
//!
//! [`RepoManager`] keeps an ordered list of [`Repo`]s and answers lookups
//! across all of them. Order encodes precedence: a repo added later overrides
//! earlier ones, one key path at a time. Two repos can each contribute
//! different keys that both show up in the effective configuration.
//!
//! Adding a repo also adds every repo named by its `repo-ref` entries,
//! recursively. Repos are deduplicated by url, so reference cycles terminate.

use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use toml::{Table, Value};

use crate::error::{Error, Result};
use crate::location::RepoLocation;
use crate::path::{lookup_in_table, parse_path};
use crate::repo::Repo;
use crate::transport::Loader;

/// A value together with the repo that supplied it.
#[derive(Debug, Clone, Copy)]
pub struct Sourced<'a> {
    pub value: &'a Value,
    pub repo: &'a Repo,
}

/// Ordered repos with last-wins lookup
#[derive(Debug, Default)]
pub struct RepoManager {
    repos: Vec<Repo>,
    loader: Option<Loader>,
}

impl RepoManager {
    /// Creates a manager that reads the process-wide settings each time a
    /// repo is added.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a manager that loads every repo through `loader`.
    pub fn with_loader(loader: Loader) -> Self {
        Self {
            repos: Vec::new(),
            loader: Some(loader),
        }
    }

    /// Adds the repo at `url`, then the repos its `repo-ref` entries name.
    ///
    /// Adding a url that is already present does nothing.
    pub fn add_repo(&mut self, url: &str) -> Result<()> {
        let loader = self.loader.clone().unwrap_or_default();
        self.add_location(RepoLocation::parse(url)?, &loader)
    }

    fn add_location(&mut self, location: RepoLocation, loader: &Loader) -> Result<()> {
        if self.contains(location.id()) {
            debug!("Repo {} already added; skipping", location.id());
            return Ok(());
        }

        let repo = Repo::load(location, loader, &[])?;
        let refs = repo.repo_refs()?;
        info!("Added repo {} ({})", repo.url(), repo.kind());
        self.repos.push(repo);

        for reference in refs {
            self.add_location(reference, loader)?;
        }
        Ok(())
    }

    /// Repos in insertion order, lowest precedence first.
    pub fn repos(&self) -> &[Repo] {
        &self.repos
    }

    pub fn len(&self) -> usize {
        self.repos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
    }

    /// Whether a repo with this url has been added.
    ///
    /// `url` is normalized the same way [`add_repo`](Self::add_repo) does.
    pub fn contains(&self, url: &str) -> bool {
        let id = RepoLocation::parse(url)
            .map(|location| location.id().to_string())
            .unwrap_or_else(|_| url.to_string());
        self.repos.iter().any(|repo| repo.url() == id)
    }

    /// Repos whose `repo.kind` equals `kind`, in insertion order.
    pub fn repos_of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Repo> + 'a {
        self.repos.iter().filter(move |repo| repo.kind() == kind)
    }

    /// Looks up `path` in the most recently added repo that defines it.
    pub fn lookup(&self, path: &str) -> Option<Sourced<'_>> {
        let segments = parse_path(path);
        self.repos.iter().rev().find_map(|repo| {
            lookup_in_table(repo.config(), &segments).map(|value| Sourced { value, repo })
        })
    }

    /// Looks up `path` with last-wins precedence.
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.lookup(path).map(|found| found.value)
    }

    /// Looks up `path` with last-wins precedence, falling back to `default`.
    pub fn get_or<'a>(&'a self, path: &str, default: &'a Value) -> &'a Value {
        self.get(path).unwrap_or(default)
    }

    /// Looks up `path` with last-wins precedence and deserializes the value.
    pub fn get_as<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        self.get(path)
            .map(|value| {
                T::deserialize(value.clone()).map_err(|e| Error::Deserialize {
                    path: path.to_string(),
                    message: e.to_string(),
                })
            })
            .transpose()
    }

    /// The effective configuration as a single table.
    ///
    /// Tables are merged recursively; any other value from a later repo
    /// replaces the earlier one. Every leaf path therefore holds the same
    /// value [`get`](Self::get) returns for it.
    pub fn merged(&self) -> Table {
        let mut merged = Table::new();
        for repo in &self.repos {
            merge_tables(&mut merged, repo.config());
        }
        merged
    }
}

/// Recursively merge `source` into `target`, with `source` winning conflicts.
fn merge_tables(target: &mut Table, source: &Table) {
    for (key, value) in source {
        match (target.get_mut(key), value) {
            (Some(Value::Table(existing)), Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

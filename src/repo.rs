//! # Configuration Repositories
//!
//! A [`Repo`] is one configuration repository: a directory or a single TOML
//! document addressed by URL. Construction is eager. The document is fetched
//! through the [`Loader`]'s transport for the URL's scheme, parsed, and every
//! `import` declaration in it is resolved before the repo is returned.
//!
//! ```no_run
//! use toml_repo::Repo;
//!
//! let repo = Repo::open("file:///srv/config/recipes")?;
//! println!("{} is a {} repo", repo.url(), repo.kind());
//! let tool = repo.get("stages.preprocessing.tool");
//! # Ok::<(), toml_repo::Error>(())
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use toml::{Table, Value};
use url::Url;

use crate::cache::ImportCache;
use crate::error::{Error, Result};
use crate::import::{ImportSite, Resolver};
use crate::location::RepoLocation;
use crate::path::{lookup_in_table, lookup_in_table_mut, parse_path};
use crate::transport::Loader;

/// Kind reported for repos whose document has no `repo.kind`.
pub const DEFAULT_KIND: &str = "unknown";

/// Array of tables listing further repos to load, each with a `dir` entry.
pub const REPO_REF: &str = "repo-ref";

/// One configuration repository with its import-resolved document.
#[derive(Debug, Clone)]
pub struct Repo {
    location: RepoLocation,
    config_url: String,
    document_url: Url,
    local_document: Option<PathBuf>,
    config: Table,
    imports: Vec<ImportSite>,
    import_cache: ImportCache,
}

impl Repo {
    /// Loads the repo at `url` using the process-wide settings.
    ///
    /// `url` may be `file://`, `pkg://`, `http(s)://` or a bare filesystem
    /// path.
    pub fn open(url: &str) -> Result<Self> {
        Self::open_with(url, &Loader::default())
    }

    /// Loads the repo at `url` with an explicit loader.
    pub fn open_with(url: &str, loader: &Loader) -> Result<Self> {
        Self::load(RepoLocation::parse(url)?, loader, &[])
    }

    /// Loads the repo at a filesystem path using the process-wide settings.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let location = RepoLocation::from_path(path.as_ref())?;
        Self::load(location, &Loader::default(), &[])
    }

    /// Loads `location` while the repos in `parents` are being constructed.
    pub(crate) fn load(
        location: RepoLocation,
        loader: &Loader,
        parents: &[String],
    ) -> Result<Self> {
        let (config_url, document_url) = location.document(loader)?;
        debug!("Loading repo {} from {}", location.id(), config_url);

        let raw = loader.read_document(&document_url)?;
        let resolver = Resolver::new(loader, location.id(), parents);
        let resolution = resolver.resolve(document_url.clone(), raw)?;
        let local_document = loader
            .transport(&document_url)?
            .local_path(&document_url);

        Ok(Self {
            location,
            config_url,
            document_url,
            local_document,
            config: resolution.config,
            imports: resolution.sites,
            import_cache: resolution.cache,
        })
    }

    /// The URL this repo was opened with; its identity.
    pub fn url(&self) -> &str {
        self.location.id()
    }

    pub fn location(&self) -> &RepoLocation {
        &self.location
    }

    /// URL of the document actually loaded.
    ///
    /// Equal to [`url`](Self::url) when that names a document, otherwise the
    /// url with the configured suffix appended.
    pub fn config_url(&self) -> &str {
        &self.config_url
    }

    /// The import-resolved configuration tree.
    pub fn config(&self) -> &Table {
        &self.config
    }

    /// Mutable access for applications that adjust the tree after loading.
    pub fn config_mut(&mut self) -> &mut Table {
        &mut self.config
    }

    pub(crate) fn into_config(self) -> Table {
        self.config
    }

    /// The repo's declared `repo.kind`, or [`DEFAULT_KIND`].
    pub fn kind(&self) -> &str {
        self.get("repo.kind")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_KIND)
    }

    /// Looks up a dotted path, returning `None` if any segment is missing.
    pub fn get(&self, path: &str) -> Option<&Value> {
        lookup_in_table(&self.config, &parse_path(path))
    }

    /// Mutable lookup of a dotted path.
    pub fn get_mut(&mut self, path: &str) -> Option<&mut Value> {
        lookup_in_table_mut(&mut self.config, &parse_path(path))
    }

    /// Looks up a dotted path, falling back to `default`.
    pub fn get_or<'a>(&'a self, path: &str, default: &'a Value) -> &'a Value {
        self.get(path).unwrap_or(default)
    }

    /// Looks up a dotted path and deserializes the value.
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

    /// Joins `relative` onto the directory holding this repo's document.
    ///
    /// Only available for repos backed by the local filesystem (`file://`
    /// and `pkg://`).
    pub fn resolve_path(&self, relative: impl AsRef<Path>) -> Result<PathBuf> {
        let document = self.local_document.as_ref().ok_or_else(|| Error::Path {
            message: format!("repo '{}' is not on the local filesystem", self.url()),
        })?;
        let dir = document.parent().unwrap_or_else(|| Path::new("/"));
        Ok(dir.join(relative))
    }

    /// Resolves `relative` as a URL against this repo's document.
    pub fn resolve_url(&self, relative: &str) -> Result<Url> {
        Ok(self.document_url.join(relative)?)
    }

    /// Every node that was replaced by an import, in document order.
    pub fn imports(&self) -> &[ImportSite] {
        &self.imports
    }

    /// The repo owning the imported subtree that contains `path`.
    ///
    /// Always this repo's url when `path` lies inside an import site, and
    /// `None` for nodes written directly in the document.
    pub fn source_of(&self, path: &str) -> Option<&str> {
        let segments = parse_path(path);
        self.imports
            .iter()
            .find(|site| site.contains(&segments))
            .map(|site| site.source.as_str())
    }

    /// Documents cached while this repo's imports were resolved.
    pub fn import_cache(&self) -> &ImportCache {
        &self.import_cache
    }

    /// Locations named by the document's `repo-ref` entries.
    ///
    /// Relative `dir` values are taken from this repo's document directory.
    /// Entries without a string `dir` are skipped with a warning.
    pub fn repo_refs(&self) -> Result<Vec<RepoLocation>> {
        let Some(value) = self.config.get(REPO_REF) else {
            return Ok(Vec::new());
        };
        let Some(entries) = value.as_array() else {
            warn!(
                "'{}' in {} is not an array; ignoring it",
                REPO_REF, self.config_url
            );
            return Ok(Vec::new());
        };

        let mut refs = Vec::new();
        for (idx, entry) in entries.iter().enumerate() {
            match entry.get("dir").and_then(Value::as_str) {
                Some(dir) => refs.push(RepoLocation::resolve(dir, &self.document_url)?),
                None => warn!(
                    "{}[{}] in {} has no 'dir'; skipping",
                    REPO_REF, idx, self.config_url
                ),
            }
        }
        Ok(refs)
    }
}

impl fmt::Display for Repo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.url(), self.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::RepoSettings;
    use crate::transport::MemoryTransport;

    fn memory_loader(documents: &[(&str, &str)]) -> Loader {
        let mut memory = MemoryTransport::new();
        for (url, content) in documents {
            memory.insert(*url, *content);
        }
        Loader::new(RepoSettings::default()).with_transport("mem", memory)
    }

    #[test]
    fn test_open_directory_repo() {
        let loader = memory_loader(&[(
            "mem://app/repo.toml",
            "[repo]\nkind = \"recipe\"\n[user]\nname = \"default\"\n",
        )]);
        let repo = Repo::open_with("mem://app", &loader).unwrap();

        assert_eq!(repo.url(), "mem://app");
        assert_eq!(repo.config_url(), "mem://app/repo.toml");
        assert_eq!(repo.kind(), "recipe");
        assert_eq!(
            repo.get("user.name").and_then(Value::as_str),
            Some("default")
        );
        assert_eq!(repo.to_string(), "mem://app (recipe)");
    }

    #[test]
    fn test_kind_defaults() {
        let loader = memory_loader(&[("mem://app/repo.toml", "[settings]\na = 1\n")]);
        let repo = Repo::open_with("mem://app", &loader).unwrap();
        assert_eq!(repo.kind(), DEFAULT_KIND);
    }

    #[test]
    fn test_get_or_and_missing_paths() {
        let loader = memory_loader(&[("mem://app/repo.toml", "[user]\nname = \"x\"\n")]);
        let repo = Repo::open_with("mem://app", &loader).unwrap();
        let fallback = Value::String("fallback".to_string());

        assert!(repo.get("user.missing").is_none());
        assert!(repo.get("user.name.deeper").is_none());
        assert_eq!(
            repo.get_or("user.missing", &fallback).as_str(),
            Some("fallback")
        );
        assert_eq!(repo.get_or("user.name", &fallback).as_str(), Some("x"));
    }

    #[test]
    fn test_get_as() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Stage {
            tool: String,
            priority: i64,
        }

        let loader = memory_loader(&[(
            "mem://app/repo.toml",
            "[stage]\ntool = \"siril\"\npriority = 10\n",
        )]);
        let repo = Repo::open_with("mem://app", &loader).unwrap();

        let stage: Option<Stage> = repo.get_as("stage").unwrap();
        assert_eq!(
            stage,
            Some(Stage {
                tool: "siril".to_string(),
                priority: 10
            })
        );
        assert_eq!(repo.get_as::<Stage>("missing").unwrap(), None);

        let err = repo.get_as::<i64>("stage.tool").unwrap_err();
        assert!(matches!(err, Error::Deserialize { .. }));
    }

    #[test]
    fn test_source_of_imported_nodes() {
        let loader = memory_loader(&[(
            "mem://app/repo.toml",
            "[base.inner]\nv = 1\n\n[copy.import]\nnode = \"base\"\n",
        )]);
        let repo = Repo::open_with("mem://app", &loader).unwrap();

        assert_eq!(repo.source_of("copy"), Some("mem://app"));
        assert_eq!(repo.source_of("copy.inner.v"), Some("mem://app"));
        assert_eq!(repo.source_of("base.inner"), None);
        assert_eq!(repo.imports().len(), 1);
    }

    #[test]
    fn test_config_mut_is_independent_per_import_site() {
        let loader = memory_loader(&[(
            "mem://app/repo.toml",
            r#"
            [shared.mutable]
            value = 10

            [copy1.import]
            node = "shared"

            [copy2.import]
            node = "shared"
            "#,
        )]);
        let mut repo = Repo::open_with("mem://app", &loader).unwrap();

        if let Some(Value::Table(mutable)) = repo
            .config_mut()
            .get_mut("copy1")
            .and_then(|copy| copy.get_mut("mutable"))
        {
            mutable.insert("value".to_string(), Value::Integer(20));
        }

        assert_eq!(
            repo.get("copy1.mutable.value").and_then(Value::as_integer),
            Some(20)
        );
        assert_eq!(
            repo.get("copy2.mutable.value").and_then(Value::as_integer),
            Some(10)
        );
        assert_eq!(
            repo.get("shared.mutable.value").and_then(Value::as_integer),
            Some(10)
        );
    }

    #[test]
    fn test_resolve_path_requires_local_repo() {
        let loader = memory_loader(&[("mem://app/repo.toml", "")]);
        let repo = Repo::open_with("mem://app", &loader).unwrap();
        assert!(matches!(repo.resolve_path("data.txt"), Err(Error::Path { .. })));
        assert_eq!(
            repo.resolve_url("assets/data.txt").unwrap().as_str(),
            "mem://app/assets/data.txt"
        );
    }

    #[test]
    fn test_repo_refs() {
        let loader = memory_loader(&[(
            "mem://app/main/repo.toml",
            r#"
            [[repo-ref]]
            dir = "../recipes"

            [[repo-ref]]
            note = "no dir here"

            [[repo-ref]]
            dir = "file:///srv/raws"
            "#,
        )]);
        let repo = Repo::open_with("mem://app/main", &loader).unwrap();
        let refs: Vec<_> = repo
            .repo_refs()
            .unwrap()
            .iter()
            .map(|location| location.id().to_string())
            .collect();
        assert_eq!(refs, vec!["mem://app/recipes", "file:///srv/raws"]);
    }

    #[test]
    fn test_missing_document_is_not_found() {
        let loader = memory_loader(&[]);
        let err = Repo::open_with("mem://app", &loader).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_cross_repo_import_cycle() {
        let loader = memory_loader(&[
            (
                "mem://a/repo.toml",
                "[x.import]\nrepo = \"mem://b\"\nnode = \"y\"\n",
            ),
            (
                "mem://b/repo.toml",
                "[y.import]\nrepo = \"mem://a\"\nnode = \"z\"\n[z]\nv = 1\n",
            ),
        ]);
        let err = Repo::open_with("mem://a", &loader).unwrap_err();
        match err {
            Error::CycleDetected { cycle } => {
                assert_eq!(cycle, "mem://a -> mem://b -> mem://a");
            }
            other => panic!("expected cycle, got {}", other),
        }
    }
}

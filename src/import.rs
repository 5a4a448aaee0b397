//! # Import Resolution
//!
//! Any table below the document root may carry an `import` declaration:
//!
//! ```toml
//! [my_stage.import]
//! node = "library.stages.preprocessing"  # required, resolved in the target document
//! file = "lib/stages.toml"               # optional, relative to the importing document
//! repo = "file:///srv/shared"            # optional, another repo's document
//! ```
//!
//! The hosting table is replaced wholesale by a deep copy of the target node.
//! Sibling keys next to `import` are discarded. Array-of-tables elements are
//! the exception: an element keeps its own keys, laid over the imported
//! table, so `[[stages]]` entries can share a base and still carry a `name`.
//!
//! ## Algorithm
//!
//! The resolver is a pure tree transform. It walks the parsed document
//! depth-first, in document order, descending into arrays of tables. It
//! builds a new owned tree, so two sites importing the same node never share
//! data.
//!
//! Target documents are handled as follows:
//!
//! - **Same document**: the target node is looked up lazily in the raw tree.
//!   Any import met on the way, or inside the target, is resolved first.
//! - **Other file**: the document is loaded and fully resolved once, then
//!   kept in the [`ImportCache`]. A file whose own resolution is still in
//!   progress (A imports from B, which imports from A) is read lazily like
//!   the same document.
//! - **Other repo**: a complete [`Repo`] is constructed for the URL and its
//!   resolved tree is cached.
//!
//! Cycles are detected at two levels. An import site that is reached again
//! while it is being resolved is a cycle. So is a repo that, through its
//! imports, needs itself to be constructed.

use std::sync::Arc;

use log::{debug, warn};
use toml::{Table, Value};
use url::Url;

use crate::cache::{CacheKey, ImportCache};
use crate::error::{Error, Result};
use crate::location::RepoLocation;
use crate::path::{format_path, lookup, parse_path, step, PathSegment};
use crate::repo::Repo;
use crate::transport::Loader;

/// Key under which import declarations live.
pub const IMPORT_KEY: &str = "import";

const ROOT_NODE: &str = "<root>";

/// A parsed `import` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    /// Dotted path of the node to copy, resolved against the target document.
    pub node: String,
    /// Document path relative to the importing document.
    pub file: Option<String>,
    /// URL of another repo whose document is the target.
    pub repo: Option<String>,
}

impl ImportSpec {
    /// Validates the `import` entry of `host`.
    ///
    /// `location` and `node_path` identify the host for error messages.
    pub fn parse(host: &Table, location: &str, node_path: &str) -> Result<Self> {
        let invalid = |message: &str| Error::InvalidImport {
            location: location.to_string(),
            node: node_path.to_string(),
            message: message.to_string(),
        };

        let Some(Value::Table(declaration)) = host.get(IMPORT_KEY) else {
            return Err(invalid("'import' must be a table"));
        };

        let node = match declaration.get("node") {
            Some(Value::String(node)) => node.clone(),
            Some(_) => return Err(invalid("'node' must be a string")),
            None => return Err(invalid("import must specify a 'node' key")),
        };
        if parse_path(&node).is_empty() {
            return Err(invalid("'node' must name a path"));
        }

        let optional = |key: &str| match declaration.get(key) {
            Some(Value::String(value)) => Ok(Some(value.clone())),
            Some(_) => Err(invalid(&format!("'{}' must be a string", key))),
            None => Ok(None),
        };
        let file = optional("file")?;
        let repo = optional("repo")?;

        for key in declaration.keys() {
            if !matches!(key.as_str(), "node" | "file" | "repo") {
                warn!(
                    "Ignoring unknown key '{}' in import at '{}' in {}",
                    key, node_path, location
                );
            }
        }

        Ok(Self { node, file, repo })
    }
}

/// A node that was replaced by an import.
///
/// The `source` is the repo that declared the import, which is the repo whose
/// location relative paths inside the imported subtree are resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSite {
    pub path: Vec<PathSegment>,
    pub spec: ImportSpec,
    pub source: String,
}

impl ImportSite {
    /// The site's path in dotted form.
    pub fn path_string(&self) -> String {
        format_path(&self.path)
    }

    /// Whether `path` is this site or lies inside it.
    pub fn contains(&self, path: &[PathSegment]) -> bool {
        path.starts_with(&self.path)
    }
}

/// Output of resolving one repo's document.
#[derive(Debug)]
pub(crate) struct Resolution {
    pub config: Table,
    pub sites: Vec<ImportSite>,
    pub cache: ImportCache,
}

/// A document taking part in resolution.
#[derive(Debug, Clone)]
struct Document {
    /// Identity of the repo the document belongs to.
    repo: String,
    url: Url,
    root: Arc<Table>,
    /// Resolved documents contain no imports and are navigated directly.
    resolved: bool,
}

pub(crate) struct Resolver<'a> {
    loader: &'a Loader,
    repo: String,
    /// Repos under construction, outermost first, ending with `repo`.
    chain: Vec<String>,
    cache: ImportCache,
    /// Documents whose full resolution is in progress.
    open: Vec<Document>,
    /// Import sites being resolved, as `document#path`.
    active: Vec<String>,
    sites: Vec<ImportSite>,
}

impl<'a> Resolver<'a> {
    /// Creates a resolver for the repo `repo`, nested inside the
    /// constructions of `parents`.
    pub(crate) fn new(loader: &'a Loader, repo: &str, parents: &[String]) -> Self {
        let mut chain = parents.to_vec();
        chain.push(repo.to_string());
        Self {
            loader,
            repo: repo.to_string(),
            chain,
            cache: ImportCache::new(),
            open: Vec::new(),
            active: Vec::new(),
            sites: Vec::new(),
        }
    }

    /// Resolves every import in the repo's root document.
    pub(crate) fn resolve(mut self, url: Url, root: Table) -> Result<Resolution> {
        let document = Document {
            repo: self.repo.clone(),
            url,
            root: Arc::new(root),
            resolved: false,
        };
        let config = self.resolve_document(&document, true)?;
        Ok(Resolution {
            config,
            sites: self.sites,
            cache: self.cache,
        })
    }

    fn resolve_document(&mut self, document: &Document, record: bool) -> Result<Table> {
        check_root(document)?;
        self.open.push(document.clone());
        let result = self.resolve_entries(document, &document.root, &mut Vec::new(), record);
        self.open.pop();
        result
    }

    fn resolve_entries(
        &mut self,
        document: &Document,
        table: &Table,
        path: &mut Vec<PathSegment>,
        record: bool,
    ) -> Result<Table> {
        let mut out = Table::new();
        for (key, value) in table {
            path.push(PathSegment::Key(key.clone()));
            let resolved = self.resolve_value(document, value, path, record);
            path.pop();
            out.insert(key.clone(), resolved?);
        }
        Ok(out)
    }

    fn resolve_value(
        &mut self,
        document: &Document,
        value: &Value,
        path: &mut Vec<PathSegment>,
        record: bool,
    ) -> Result<Value> {
        match value {
            Value::Table(table) if table.contains_key(IMPORT_KEY) => {
                self.resolve_site(document, table, path, record)
            }
            Value::Table(table) => Ok(Value::Table(
                self.resolve_entries(document, table, path, record)?,
            )),
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (idx, item) in items.iter().enumerate() {
                    path.push(PathSegment::Index(idx));
                    let resolved = self.resolve_value(document, item, path, record);
                    path.pop();
                    out.push(resolved?);
                }
                Ok(Value::Array(out))
            }
            other => Ok(other.clone()),
        }
    }

    /// Replaces the table at `path` with the content its import names.
    fn resolve_site(
        &mut self,
        document: &Document,
        host: &Table,
        path: &[PathSegment],
        record: bool,
    ) -> Result<Value> {
        let node_path = format_path(path);
        let spec = ImportSpec::parse(host, document.url.as_str(), &node_path)?;

        let marker = format!("{}#{}", document.url, node_path);
        if let Some(start) = self.active.iter().position(|m| *m == marker) {
            let mut cycle = self.active[start..].to_vec();
            cycle.push(marker);
            return Err(Error::CycleDetected {
                cycle: cycle.join(" -> "),
            });
        }

        let in_array = matches!(path.last(), Some(PathSegment::Index(_)));
        if host.len() > 1 && !in_array {
            debug!(
                "Import at '{}' in {} discards {} sibling key(s)",
                node_path, document.url, host.len() - 1
            );
        }

        self.active.push(marker);
        let result = self.import(document, &spec);
        self.active.pop();
        let mut value = result?;

        if in_array && host.len() > 1 {
            value = self.overlay_element_keys(document, host, path, value, record)?;
        }

        if record {
            debug!(
                "Resolved import '{}' at '{}' in {}",
                spec.node, node_path, self.repo
            );
            self.sites.push(ImportSite {
                path: path.to_vec(),
                spec,
                source: self.repo.clone(),
            });
        }
        Ok(value)
    }

    /// Lays an array element's own keys over the table it imports.
    fn overlay_element_keys(
        &mut self,
        document: &Document,
        host: &Table,
        path: &[PathSegment],
        imported: Value,
        record: bool,
    ) -> Result<Value> {
        let mut merged = match imported {
            Value::Table(table) => table,
            other => {
                debug!(
                    "Import at '{}' in {} is not a table; discarding {} element key(s)",
                    format_path(path), document.url, host.len() - 1
                );
                return Ok(other);
            }
        };

        let mut walked = path.to_vec();
        for (key, value) in host.iter().filter(|(key, _)| key.as_str() != IMPORT_KEY) {
            walked.push(PathSegment::Key(key.clone()));
            let resolved = self.resolve_value(document, value, &mut walked, record);
            walked.pop();
            merged.insert(key.clone(), resolved?);
        }
        Ok(Value::Table(merged))
    }

    fn import(&mut self, document: &Document, spec: &ImportSpec) -> Result<Value> {
        let target = match (&spec.repo, &spec.file) {
            (Some(repo), file) => {
                let location = RepoLocation::resolve(repo, &document.url)?;
                let foreign = self.foreign_repo(location)?;
                match file {
                    Some(file) => {
                        let url = foreign.url.join(file)?;
                        self.file_document(&foreign.repo, url)?
                    }
                    None => foreign,
                }
            }
            (None, Some(file)) => {
                let url = document.url.join(file)?;
                let repo = document.repo.clone();
                self.file_document(&repo, url)?
            }
            (None, None) => document.clone(),
        };

        self.lookup(&target, &parse_path(&spec.node), &spec.node)
    }

    /// Loads another document of a repo, fully resolved.
    fn file_document(&mut self, repo: &str, url: Url) -> Result<Document> {
        if let Some(open) = self.open.iter().find(|d| d.url == url) {
            return Ok(open.clone());
        }

        let key = CacheKey::new(repo, url.as_str());
        if let Some(root) = self.cache.get(&key) {
            debug!("Import cache hit for {}", url);
            return Ok(Document {
                repo: repo.to_string(),
                url,
                root: Arc::clone(root),
                resolved: true,
            });
        }

        let raw = Document {
            repo: repo.to_string(),
            root: Arc::new(self.loader.read_document(&url)?),
            url,
            resolved: false,
        };
        let root = Arc::new(self.resolve_document(&raw, false)?);
        self.cache.insert(key, Arc::clone(&root));

        Ok(Document {
            root,
            resolved: true,
            ..raw
        })
    }

    /// Constructs another repo and returns its resolved root document.
    fn foreign_repo(&mut self, location: RepoLocation) -> Result<Document> {
        if let Some(start) = self.chain.iter().position(|r| r == location.id()) {
            let mut cycle = self.chain[start..].to_vec();
            cycle.push(location.id().to_string());
            return Err(Error::CycleDetected {
                cycle: cycle.join(" -> "),
            });
        }

        let (config_url, url) = location.document(self.loader)?;
        let key = CacheKey::new(location.id(), &config_url);
        let loader = self.loader;
        let chain = &self.chain;
        let root = self.cache.get_or_load(key, || {
            let repo = Repo::load(location.clone(), loader, chain)?;
            Ok(Arc::new(repo.into_config()))
        })?;

        Ok(Document {
            repo: location.id().to_string(),
            url,
            root,
            resolved: true,
        })
    }

    /// Finds `segments` in `target` and returns a resolved deep copy.
    fn lookup(&mut self, target: &Document, segments: &[PathSegment], node: &str) -> Result<Value> {
        let not_found = |missing: &PathSegment| Error::NotFound {
            location: target.url.to_string(),
            message: format!(
                "import node '{}' not found in path (missing '{}')",
                node, missing
            ),
        };

        if !target.resolved {
            check_root(target)?;
        }

        let Some((first, rest)) = segments.split_first() else {
            return Err(Error::NotFound {
                location: target.url.to_string(),
                message: format!("import node '{}' not found in path", node),
            });
        };
        let mut current = match first {
            PathSegment::Key(key) => target.root.get(key),
            PathSegment::Index(_) => None,
        }
        .ok_or_else(|| not_found(first))?;
        let mut walked = vec![first.clone()];

        for (idx, segment) in rest.iter().enumerate() {
            if !target.resolved {
                if let Value::Table(host) = current {
                    if host.contains_key(IMPORT_KEY) {
                        let replaced = self.resolve_site(target, host, &walked, false)?;
                        let remaining = &rest[idx..];
                        return lookup(&replaced, remaining)
                            .cloned()
                            .ok_or_else(|| not_found(first_missing(&replaced, remaining)));
                    }
                }
            }
            current = step(current, segment).ok_or_else(|| not_found(segment))?;
            walked.push(segment.clone());
        }

        if target.resolved {
            Ok(current.clone())
        } else {
            self.resolve_value(target, current, &mut walked, false)
        }
    }
}

fn check_root(document: &Document) -> Result<()> {
    if document.root.contains_key(IMPORT_KEY) {
        return Err(Error::InvalidImport {
            location: document.url.to_string(),
            node: ROOT_NODE.to_string(),
            message: "Cannot use import at the root level".to_string(),
        });
    }
    Ok(())
}

fn first_missing<'s>(value: &Value, segments: &'s [PathSegment]) -> &'s PathSegment {
    let mut current = value;
    for segment in segments {
        match step(current, segment) {
            Some(next) => current = next,
            None => return segment,
        }
    }
    &segments[segments.len() - 1]
}

//! Shared test utilities for integration and E2E tests.
//!
//! Add `mod common;` to a test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_file("main.toml", "[a]\nb = 1\n");
//!     let repo = fixture.open("main.toml");
//! }
//! ```

use std::path::{Path, PathBuf};

use assert_fs::prelude::*;
use toml_repo::{Loader, Repo, RepoSettings};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::{file_url, loader, TestFixture, SUFFIX};
}

/// Config file name used by the fixtures in these tests.
pub const SUFFIX: &str = "starbash.toml";

/// A loader whose directory repos use [`SUFFIX`].
pub fn loader() -> Loader {
    Loader::new(RepoSettings::default().with_config_suffix(SUFFIX))
}

/// The identity string a bare path is given.
#[allow(dead_code)]
pub fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}

/// A temporary directory populated with TOML documents.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add a file with the given relative path and content.
    ///
    /// Parent directories are created as needed.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of a child entry.
    pub fn join(&self, path: &str) -> PathBuf {
        self.temp_dir.path().join(path)
    }

    /// Open the repo at a child path with [`loader`].
    pub fn open(&self, path: &str) -> Repo {
        self.try_open(path).expect("Failed to open repo")
    }

    /// Open the repo at a child path, returning any load error.
    pub fn try_open(&self, path: &str) -> toml_repo::Result<Repo> {
        Repo::open_with(&self.join(path).to_string_lossy(), &loader())
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

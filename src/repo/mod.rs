mod add;
pub mod database;
mod workspace;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::*;

use crate::digest::Digest;
use crate::index::Index;
use crate::storable::commit::{Author, Commit};
use crate::storable::tree::Tree;
use crate::storable::Storable;
use crate::timestamp::Timestamp;
use crate::util;
use crate::{Error, Result};

use database::Database;

/// Name of the repository directory inside the working tree.
pub const REPO_DIR: &str = ".avc";

#[derive(Debug)]
pub struct Repo {
    workdir: Utf8PathBuf,
    root: Utf8PathBuf,
    pub database: Database,
}

impl Repo {
    fn new(workdir: Utf8PathBuf) -> Self {
        let root = workdir.join(REPO_DIR);
        let database = Database::new(&root);
        Self {
            workdir,
            root,
            database,
        }
    }

    /// Create an empty repository in `workdir`.
    pub fn init(workdir: impl AsRef<Utf8Path>) -> Result<Self> {
        let workdir = workdir.as_ref().canonicalize_utf8()?;
        let repo = Self::new(workdir);
        trace!(path = %repo.root, "Initialising repo");

        if repo.root.exists() {
            return Err(Error::AlreadyInitialized);
        }

        std::fs::create_dir(&repo.root)?;
        std::fs::create_dir(repo.database.path())?;

        Ok(repo)
    }

    /// Open the repository in `workdir`.
    pub fn open(workdir: impl AsRef<Utf8Path>) -> Result<Self> {
        let workdir = workdir.as_ref().canonicalize_utf8()?;
        let repo = Self::new(workdir);

        if !repo.root.is_dir() {
            return Err(Error::NotInitialized);
        }

        trace!(path = %repo.root, "Opened repo");
        Ok(repo)
    }

    pub fn workdir(&self) -> &Utf8Path {
        &self.workdir
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn index(&self) -> Result<Index> {
        Index::load(&self.root)
    }

    /// Snapshot `path` (relative to the working tree) and store it, returning the tree's
    /// digest.
    pub fn write_tree(&self, path: &Utf8Path) -> Result<Digest> {
        let path = self.workdir.join(path);
        let tree = Tree::build_from_path(&path)?;
        let oid = tree.store(&self.database)?;
        debug!(%path, %oid, "Stored tree");
        Ok(oid)
    }

    /// Store a commit of an already stored tree.
    pub fn commit_tree(
        &self,
        tree_id: &str,
        parent: Option<&str>,
        author: Author,
        committer: Author,
    ) -> Result<Digest> {
        let tree_id = self.resolve::<Tree>(tree_id)?;
        let parent = parent.map(|p| self.resolve::<Commit>(p)).transpose()?;

        let commit = Commit::new(parent, tree_id, author, committer, Timestamp::now());
        let oid = commit.store(&self.database)?;
        debug!(%oid, %tree_id, ?parent, "Stored commit");
        Ok(oid)
    }

    /// Full digest of the object `prefix` refers to, checking that it is a `T`.
    fn resolve<T: Storable>(&self, prefix: &str) -> Result<Digest> {
        let object = self.database.fetch_by_hash(prefix)?;
        T::decode(&object.content)?;
        Ok(object.hash)
    }

    /// The working-tree-relative name for `path`, which must be absolute.
    fn relative_name(&self, path: &Utf8Path) -> Result<String> {
        let relative = path
            .strip_prefix(&self.workdir)
            .map_err(|_| Error::OutsideRepository(path.to_string()))?;

        let mut parts = Vec::new();
        for component in relative.components() {
            let part = component.as_str();
            if part.starts_with(util::HIDDEN_MARKER) {
                return Err(Error::HiddenPath(relative.to_string()));
            }
            parts.push(part);
        }

        Ok(parts.join("/"))
    }
}

mod parse;
mod write;

use std::io::{ErrorKind, Write as _};

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, trace};

use crate::digest::Digest;
use crate::timestamp::Timestamp;
use crate::util;
use crate::{Error, Result};

/// One staged regular file.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct IndexEntry {
    oid: Digest,
    name: String,
    created: Timestamp,
    modified: Timestamp,
}

impl IndexEntry {
    pub fn new(
        oid: Digest,
        name: impl Into<String>,
        created: Timestamp,
        modified: Timestamp,
    ) -> Self {
        Self {
            oid,
            name: name.into(),
            created,
            modified,
        }
    }

    pub fn oid(&self) -> &Digest {
        &self.oid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Utf8Path {
        Utf8Path::new(&self.name)
    }

    pub fn created(&self) -> &Timestamp {
        &self.created
    }

    pub fn modified(&self) -> &Timestamp {
        &self.modified
    }
}

/// The staging list, kept in insertion order. Each name appears at most once.
#[derive(Debug)]
pub struct Index {
    path: Utf8PathBuf,
    entries: Vec<IndexEntry>,
}

impl Index {
    /// Read the index of the repository rooted at `repo_root`. A missing index file is an empty
    /// index.
    pub fn load(repo_root: &Utf8Path) -> Result<Self> {
        if !repo_root.is_dir() {
            return Err(Error::NotInitialized);
        }

        let path = repo_root.join("index");
        let entries = match std::fs::read(&path) {
            Ok(bytes) => parse::parse_index(&bytes)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(%path, "No index file yet, starting empty");
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        trace!(%path, "Opened index with {} entries", entries.len());

        Ok(Self { path, entries })
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&IndexEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Append an entry. Fails if its name is already staged.
    pub fn insert(&mut self, entry: IndexEntry) -> Result<()> {
        if self.contains(&entry.name) {
            return Err(Error::IndexEntryAlreadyExists(entry.name));
        }
        trace!(name = %entry.name, oid = %entry.oid, "Adding entry to index");
        self.entries.push(entry);
        Ok(())
    }

    /// Remove the entry with exactly this name.
    pub fn remove(&mut self, name: &str) -> Result<IndexEntry> {
        let idx = self
            .entries
            .iter()
            .position(|e| e.name == name)
            .ok_or_else(|| Error::IndexEntryNotFound(name.to_owned()))?;
        trace!(%name, "Removing entry from index");
        Ok(self.entries.remove(idx))
    }

    /// Rewrite the whole index file.
    pub fn write_out(&self) -> Result<()> {
        let parent = self.path.parent().ok_or(Error::NotInitialized)?;
        if !parent.is_dir() {
            return Err(Error::NotInitialized);
        }

        let bytes = write::write_index(&self.entries)?;

        // Replace the file in one step so readers never see half an index.
        let temp_path = parent.join(util::tmp_file_name());
        let mut file = std::fs::File::create(&temp_path)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        drop(file);

        if let Err(e) = std::fs::rename(&temp_path, &self.path) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(e.into());
        }

        trace!(path = %self.path, entries = self.entries.len(), "Wrote index");
        Ok(())
    }
}

use camino::Utf8Path;
use tracing::{debug, trace};

use crate::index::{Index, IndexEntry};
use crate::storable::blob::Blob;
use crate::storable::Storable;
use crate::timestamp::Timestamp;
use crate::{Error, Result};

impl super::Repo {
    /// Stage `path`, relative to the working tree.
    ///
    /// A regular file gets one index entry. A directory has every regular file beneath it staged
    /// in turn, with the index written after each one. Staging a name that is already in the
    /// index is an error.
    pub fn add(&self, path: &Utf8Path) -> Result<()> {
        let path = self.workdir.join(path);
        trace!(%path, "Adding path to index");

        let file_type = std::fs::symlink_metadata(&path)?.file_type();
        let path = path.canonicalize_utf8()?;

        let files = if file_type.is_file() {
            vec![path]
        } else if file_type.is_dir() {
            self.list_files(&path)?
        } else {
            return Err(Error::UnsupportedFileType(path.to_string()));
        };

        let mut index = self.index()?;
        for file in files {
            self.stage_file(&mut index, &file)?;
            index.write_out()?;
        }

        Ok(())
    }

    fn stage_file(&self, index: &mut Index, path: &Utf8Path) -> Result<()> {
        let name = self.relative_name(path)?;
        if index.contains(&name) {
            return Err(Error::IndexEntryAlreadyExists(name));
        }

        let data = std::fs::read(path)?;
        let metadata = std::fs::metadata(path)?;

        let oid = Blob::new(data).store(&self.database)?;

        let created = metadata
            .created()
            .map(Timestamp::from_system_time)
            .unwrap_or_else(|_| Timestamp::now());
        let modified = metadata
            .modified()
            .map(Timestamp::from_system_time)
            .unwrap_or(created);

        debug!(%name, %oid, "Staging file");
        index.insert(IndexEntry::new(oid, name, created, modified))
    }

    /// Unstage the entry named exactly `name`.
    pub fn remove(&self, name: &str) -> Result<()> {
        let mut index = self.index()?;
        index.remove(name)?;
        index.write_out()
    }
}

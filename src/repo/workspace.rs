use camino::{Utf8Path, Utf8PathBuf};
use tracing::trace;
use walkdir::WalkDir;

use crate::util;
use crate::Result;

impl super::Repo {
    /// Every regular file under `path`, in file name order. Hidden entries are skipped at any
    /// depth below `path`, the same as when building a tree.
    pub fn list_files(&self, path: &Utf8Path) -> Result<Vec<Utf8PathBuf>> {
        let mut entries = Vec::new();

        let walker = WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !util::is_hidden(e));

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = util::utf8_path(entry.path())?;
            trace!(%path, "Found file");
            entries.push(path.to_owned());
        }

        Ok(entries)
    }
}

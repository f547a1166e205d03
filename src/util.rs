use std::path::Path;

use camino::{Utf8Path, Utf8PathBuf};
use rand::prelude::*;
use walkdir::DirEntry;

use crate::{Error, Result};

/// Names starting with this marker are never tracked.
pub const HIDDEN_MARKER: char = '.';

pub fn tmp_file_name() -> String {
    const ALPHANUM_CHARS: [char; 52] = [
        'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R',
        'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j',
        'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
    ];

    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .filter_map(|_| ALPHANUM_CHARS.choose(&mut rng))
        .collect();

    format!("tmp_obj_{suffix}")
}

/// Whether a walked entry is hidden. The walk root itself is never considered hidden, so that
/// walking `.` works.
pub fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map_or(false, |name| name.starts_with(HIDDEN_MARKER))
}

pub fn utf8_path(path: &Path) -> Result<&Utf8Path> {
    Utf8Path::from_path(path).ok_or_else(|| Error::NonUtf8Path(path.to_owned()))
}

pub fn utf8_path_buf(path: std::path::PathBuf) -> Result<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path).map_err(Error::NonUtf8Path)
}

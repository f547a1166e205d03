use std::path::PathBuf;

use crate::digest::Digest;

/// Errors returned by the object store, the object model and the index.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("not an avc repository (or any of the parent directories)")]
    NotInitialized,

    #[error("avc repository is already initialized")]
    AlreadyInitialized,

    #[error("provided hash '{0}' is too short, it should be at least 2 characters")]
    HashTooShort(String),

    #[error("object not found: {0}")]
    ObjectNotFound(String),

    /// A hash prefix matched more than one stored object. Holds every candidate's full hash.
    #[error("hash is ambiguous. Possible matches:\n{}", .0.join("\n"))]
    HashCollision(Vec<String>),

    /// The content is already stored. Holds the digest of the existing object.
    #[error("object {0:x} already exists in the object database")]
    DuplicateObject(Digest),

    #[error("wrong object type: expected {expected}, found signature {signature}")]
    WrongObjectType {
        expected: &'static str,
        signature: u16,
    },

    /// A directory was found inside a shard directory. Something other than avc has been
    /// writing to the object database.
    #[error("unexpected directory in object database: {0}")]
    UnexpectedDirectory(PathBuf),

    #[error("path is not in the index: {0}")]
    IndexEntryNotFound(String),

    #[error("path is already in the index: {0}")]
    IndexEntryAlreadyExists(String),

    #[error("corrupt {what}: {reason}")]
    Corrupt { what: &'static str, reason: String },

    #[error("tree entry '{0}' has not been stored yet")]
    UnhashedEntry(String),

    #[error("all paths must be valid unicode: found '{}'", .0.display())]
    NonUtf8Path(PathBuf),

    #[error("'{0}' is outside the repository")]
    OutsideRepository(String),

    #[error("'{0}' is hidden and cannot be tracked")]
    HiddenPath(String),

    #[error("unsupported file type at '{0}', expected a regular file or a directory")]
    UnsupportedFileType(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    WalkDir(#[from] walkdir::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

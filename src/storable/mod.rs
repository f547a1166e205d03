pub mod blob;
pub mod commit;
pub(crate) mod parse;
pub mod tree;
pub(crate) mod write;

use std::fmt::Display;

use crate::digest::Digest;
use crate::repo::database::Database;
use crate::{Error, Result};

/// Byte written between the signature and the body.
pub const SEPARATOR: u8 = b'\0';

/// Length of every header: a big-endian `u16` signature and the separator.
pub const HEADER_LEN: usize = 3;

/// The kinds of file that carry a signature header. Each one owns a range of 100 signatures;
/// the lower two digits are the structure version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
    Index,
}

impl ObjectKind {
    const fn base(self) -> u16 {
        match self {
            ObjectKind::Blob => 100,
            ObjectKind::Tree => 200,
            ObjectKind::Commit => 300,
            ObjectKind::Index => 400,
        }
    }

    /// The structure version written by this build.
    const fn current_version(self) -> u16 {
        0
    }

    pub const fn signature(self) -> u16 {
        self.base() + self.current_version()
    }

    /// The header written in front of every new file of this kind.
    pub const fn header(self) -> [u8; HEADER_LEN] {
        let [hi, lo] = self.signature().to_be_bytes();
        [hi, lo, SEPARATOR]
    }

    pub fn from_signature(signature: u16) -> Option<Self> {
        match signature {
            100..=199 => Some(ObjectKind::Blob),
            200..=299 => Some(ObjectKind::Tree),
            300..=399 => Some(ObjectKind::Commit),
            400..=499 => Some(ObjectKind::Index),
            _ => None,
        }
    }

    pub fn accepts(self, signature: u16) -> bool {
        Self::from_signature(signature) == Some(self)
    }

    /// Recover the kind of an encoded file from its header alone.
    pub fn of(bytes: &[u8]) -> Result<Self> {
        let (_, signature) = parse::split_header(bytes)?;
        Self::from_signature(signature).ok_or(Error::WrongObjectType {
            expected: "a known object type",
            signature,
        })
    }

    pub const fn name(self) -> &'static str {
        match self {
            ObjectKind::Blob => "blob",
            ObjectKind::Tree => "tree",
            ObjectKind::Commit => "commit",
            ObjectKind::Index => "index",
        }
    }
}

impl Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Something that can be written to, and read back from, the object database.
pub trait Storable: Sized {
    const KIND: ObjectKind;

    /// Append the type-specific body to `out`.
    fn encode_body(&self, out: &mut Vec<u8>) -> Result<()>;

    /// Parse the type-specific body. The header has already been checked.
    fn decode_body(body: &[u8]) -> Result<Self>;

    /// The full on-disk form: header, separator, body.
    fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Self::KIND.header().to_vec();
        self.encode_body(&mut out)?;
        Ok(out)
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        let (body, signature) = parse::split_header(bytes)?;
        if !Self::KIND.accepts(signature) {
            return Err(Error::WrongObjectType {
                expected: Self::KIND.name(),
                signature,
            });
        }
        Self::decode_body(body)
    }

    /// Persist the encoded form. Content that is already stored is not an error here: the
    /// existing digest is returned.
    fn store(&self, database: &Database) -> Result<Digest> {
        database.store_or_existing(&self.encode()?)
    }
}

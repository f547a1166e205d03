use std::io::Write;

use super::{ObjectKind, Storable};
use crate::digest::Digest;
use crate::Result;

/// The content of a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    data: Vec<u8>,
}

impl Storable for Blob {
    const KIND: ObjectKind = ObjectKind::Blob;

    fn encode_body(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(&self.data);
        Ok(())
    }

    fn decode_body(body: &[u8]) -> Result<Self> {
        Ok(Self::new(body.to_vec()))
    }
}

impl Blob {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &[u8] {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// The digest this blob is stored under, without touching the database.
    pub fn digest(&self) -> Digest {
        let mut formatted = ObjectKind::Blob.header().to_vec();
        formatted.extend_from_slice(&self.data);
        Digest::new(&formatted)
    }

    /// Pretty-printing a blob is simple - just dump the contents of the file to stdout
    pub fn pretty_print(&self) -> std::io::Result<()> {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&self.data)?;
        stdout.flush()?;
        Ok(())
    }
}

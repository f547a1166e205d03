use std::io::Write;

use camino::Utf8Path;
use nom::{
    combinator::{all_consuming, map_opt},
    multi::many0,
    IResult,
};
use once_cell::sync::OnceCell;
use tracing::*;
use walkdir::WalkDir;

use super::blob::Blob;
use super::parse::{finish, kind_tag, prefixed_digest, prefixed_str};
use super::write::{put_kind_tag, put_prefixed};
use super::{ObjectKind, Storable};
use crate::digest::Digest;
use crate::repo::database::Database;
use crate::timestamp::Timestamp;
use crate::util;
use crate::{Error, Result};

/// What a tree entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Tree,
    Blob,
}

impl EntryKind {
    fn tag(self) -> u16 {
        match self {
            EntryKind::Tree => 0,
            EntryKind::Blob => 1,
        }
    }

    fn from_tag(tag: u16) -> Option<Self> {
        match tag {
            0 => Some(EntryKind::Tree),
            1 => Some(EntryKind::Blob),
            _ => None,
        }
    }
}

/// An entry's object, once it is held in memory.
#[derive(Debug)]
pub enum Node {
    Tree(Tree),
    Blob(Blob),
}

#[derive(Debug)]
enum Child {
    /// Only the digest is known; the object lives in the database.
    Unresolved(Digest),
    /// The object is in memory. The digest is filled in once it has been stored (or, for a
    /// child that was read from the database, straight away).
    Resolved { node: Node, oid: OnceCell<Digest> },
}

#[derive(Debug)]
pub struct TreeEntry {
    name: String,
    kind: EntryKind,
    child: Child,
    created: Option<Timestamp>,
    modified: Option<Timestamp>,
}

impl TreeEntry {
    pub fn file(name: impl Into<String>, blob: Blob) -> Self {
        Self::resolved(name.into(), EntryKind::Blob, Node::Blob(blob))
    }

    pub fn directory(name: impl Into<String>, tree: Tree) -> Self {
        Self::resolved(name.into(), EntryKind::Tree, Node::Tree(tree))
    }

    fn resolved(name: String, kind: EntryKind, node: Node) -> Self {
        Self {
            name,
            kind,
            child: Child::Resolved {
                node,
                oid: OnceCell::new(),
            },
            created: None,
            modified: None,
        }
    }

    fn unresolved(name: String, kind: EntryKind, oid: Digest) -> Self {
        Self {
            name,
            kind,
            child: Child::Unresolved(oid),
            created: None,
            modified: None,
        }
    }

    fn with_times(mut self, metadata: &std::fs::Metadata) -> Self {
        self.created = metadata.created().ok().map(Timestamp::from_system_time);
        self.modified = metadata.modified().ok().map(Timestamp::from_system_time);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// The digest of the child, if it is known yet.
    pub fn oid(&self) -> Option<&Digest> {
        match &self.child {
            Child::Unresolved(oid) => Some(oid),
            Child::Resolved { oid, .. } => oid.get(),
        }
    }

    pub fn created(&self) -> Option<&Timestamp> {
        self.created.as_ref()
    }

    pub fn modified(&self) -> Option<&Timestamp> {
        self.modified.as_ref()
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.child, Child::Resolved { .. })
    }

    /// The child, if it is in memory.
    pub fn node(&self) -> Option<&Node> {
        match &self.child {
            Child::Resolved { node, .. } => Some(node),
            Child::Unresolved(_) => None,
        }
    }

    /// Read the child from the database if it is not in memory yet. Later calls return the
    /// cached child.
    pub fn resolve(&mut self, database: &Database) -> Result<&Node> {
        if let Child::Unresolved(oid) = self.child {
            trace!(name = %self.name, %oid, "Resolving tree entry");
            let content = database.fetch_by_hash(&oid.to_hex())?.content;
            let node = match self.kind {
                EntryKind::Tree => Node::Tree(Tree::from_stored(&content, oid)?),
                EntryKind::Blob => Node::Blob(Blob::decode(&content)?),
            };
            self.child = Child::Resolved {
                node,
                oid: OnceCell::from(oid),
            };
        }

        match &self.child {
            Child::Resolved { node, .. } => Ok(node),
            Child::Unresolved(_) => unreachable!("entry was resolved above"),
        }
    }

    /// Store the child (recursively, for a directory) and return its digest.
    fn store_child(&self, database: &Database) -> Result<Digest> {
        match &self.child {
            Child::Unresolved(oid) => {
                // Read from the database, so it is already there unless someone removed it.
                if database.contains(oid) {
                    Ok(*oid)
                } else {
                    Err(Error::ObjectNotFound(oid.to_hex()))
                }
            }
            Child::Resolved { node, oid } => oid
                .get_or_try_init(|| match node {
                    Node::Tree(tree) => tree.store(database),
                    Node::Blob(blob) => blob.store(database),
                })
                .copied(),
        }
    }
}

/// A directory snapshot. Entries keep the order they were built or decoded in.
#[derive(Debug, Default)]
pub struct Tree {
    entries: Vec<TreeEntry>,
    oid: OnceCell<Digest>,
}

impl Tree {
    pub fn new(entries: Vec<TreeEntry>) -> Self {
        Self {
            entries,
            oid: OnceCell::new(),
        }
    }

    /// Snapshot a directory from the filesystem.
    ///
    /// Regular files become blob entries and subdirectories become tree entries, all held in
    /// memory. Hidden entries are skipped at every depth, as is anything that is neither a file
    /// nor a directory. Nothing is written to the database.
    pub fn build_from_path(path: &Utf8Path) -> Result<Self> {
        trace!(%path, "Building tree");
        let mut entries = Vec::new();

        let walker = WalkDir::new(path)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !util::is_hidden(e));

        for entry in walker {
            let entry = entry?;
            let entry_path = util::utf8_path(entry.path())?;
            let name = entry_path
                .file_name()
                .ok_or_else(|| Error::NonUtf8Path(entry.path().to_owned()))?;
            let file_type = entry.file_type();

            if file_type.is_dir() {
                let subtree = Self::build_from_path(entry_path)?;
                entries.push(TreeEntry::directory(name, subtree).with_times(&entry.metadata()?));
            } else if file_type.is_file() {
                let data = std::fs::read(entry_path)?;
                entries.push(TreeEntry::file(name, Blob::new(data)).with_times(&entry.metadata()?));
            } else {
                debug!(path = %entry_path, "Skipping entry that is neither a file nor a directory");
            }
        }

        Ok(Self::new(entries))
    }

    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [TreeEntry] {
        &mut self.entries
    }

    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The digest of this tree, once it has been stored or read from the database.
    pub fn oid(&self) -> Option<&Digest> {
        self.oid.get()
    }

    /// Decode a tree read from the database under `oid`.
    ///
    /// The digest is only remembered when the object was written in the current structure
    /// version. An older or newer tree re-encodes to different bytes, so storing it again yields
    /// a new digest, and that is the one [`Tree::oid`] reports afterwards.
    pub(crate) fn from_stored(content: &[u8], oid: Digest) -> Result<Self> {
        let tree = Self::decode(content)?;
        if content.starts_with(&ObjectKind::Tree.header()) {
            tree.remember_oid(oid);
        }
        Ok(tree)
    }

    fn remember_oid(&self, oid: Digest) {
        if let Err(oid) = self.oid.set(oid) {
            debug_assert_eq!(self.oid.get(), Some(&oid), "Oid should not change once known");
        }
    }

    pub fn pretty_print(&self) -> std::io::Result<()> {
        let mut stdout = std::io::stdout().lock();
        for entry in &self.entries {
            let kind = match entry.kind {
                EntryKind::Tree => ObjectKind::Tree,
                EntryKind::Blob => ObjectKind::Blob,
            };
            let oid = entry
                .oid()
                .map_or_else(|| "-".repeat(crate::digest::HEX_LEN), Digest::to_hex);
            writeln!(stdout, "{kind} {oid}\t{}", entry.name)?;
        }
        stdout.flush()
    }
}

impl Storable for Tree {
    const KIND: ObjectKind = ObjectKind::Tree;

    fn encode_body(&self, out: &mut Vec<u8>) -> Result<()> {
        for entry in &self.entries {
            let oid = entry
                .oid()
                .ok_or_else(|| Error::UnhashedEntry(entry.name.clone()))?;
            put_kind_tag(out, entry.kind.tag());
            put_prefixed(out, oid.to_hex().as_bytes())?;
            put_prefixed(out, entry.name.as_bytes())?;
        }
        Ok(())
    }

    fn decode_body(body: &[u8]) -> Result<Self> {
        let (_, entries) = finish("tree", all_consuming(many0(tree_entry))(body))?;
        Ok(Self::new(entries))
    }

    /// Store every child depth-first, then the tree itself. Children that are already in the
    /// database are reused, so identical files and subtrees share one object.
    fn store(&self, database: &Database) -> Result<Digest> {
        for entry in &self.entries {
            let oid = entry.store_child(database)?;
            trace!(name = %entry.name, %oid, "Stored tree entry");
        }

        let oid = database.store_or_existing(&self.encode()?)?;
        self.remember_oid(oid);
        Ok(oid)
    }
}

fn tree_entry(input: &[u8]) -> IResult<&[u8], TreeEntry> {
    let (input, kind) = map_opt(kind_tag, EntryKind::from_tag)(input)?;
    let (input, oid) = prefixed_digest(input)?;
    let (input, name) = prefixed_str(input)?;
    Ok((input, TreeEntry::unresolved(name.to_owned(), kind, oid)))
}

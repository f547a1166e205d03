use std::collections::BTreeSet;
use std::io::{ErrorKind, Write};

use camino::{Utf8Path, Utf8PathBuf};
use tracing::*;

use crate::digest::{Digest, HEX_LEN, SHARD_KEY_LEN};
use crate::storable::blob::Blob;
use crate::storable::commit::Commit;
use crate::storable::tree::Tree;
use crate::storable::{ObjectKind, Storable};
use crate::util;
use crate::{Error, Result};

/// A stored object: its digest and its full encoded content, header included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
    pub hash: Digest,
    pub content: Vec<u8>,
}

impl Object {
    pub fn kind(&self) -> Result<ObjectKind> {
        ObjectKind::of(&self.content)
    }
}

/// Link a fully written temp file into place. Linking never replaces an existing file, so when
/// two writers race on the same content the second one sees [`Error::DuplicateObject`].
fn publish(temp_path: &Utf8Path, object_path: &Utf8Path, oid: Digest) -> Result<()> {
    match std::fs::hard_link(temp_path, object_path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            trace!(%oid, "Object written concurrently");
            Err(Error::DuplicateObject(oid))
        }
        Err(e) => Err(e.into()),
    }
}

/// The content-addressed object database, laid out as `objects/<2 hex>/<38 hex>`.
#[derive(Debug, Clone)]
pub struct Database {
    repo_root: Utf8PathBuf,
    database_root: Utf8PathBuf,
}

impl Database {
    pub fn new(repo_root: impl AsRef<Utf8Path>) -> Self {
        Self {
            repo_root: repo_root.as_ref().to_owned(),
            database_root: repo_root.as_ref().join("objects"),
        }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.database_root
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.repo_root.is_dir() {
            Ok(())
        } else {
            Err(Error::NotInitialized)
        }
    }

    fn object_path(&self, oid: &Digest) -> Utf8PathBuf {
        let (shard, rest) = oid.shard();
        self.database_root.join(shard).join(rest)
    }

    pub fn contains(&self, oid: &Digest) -> bool {
        self.object_path(oid).is_file()
    }

    /// Write `content` under its digest.
    ///
    /// If identical content is already stored, nothing is written and
    /// [`Error::DuplicateObject`] carries the existing digest.
    pub fn store(&self, content: &[u8]) -> Result<Digest> {
        self.ensure_initialized()?;

        let oid = Digest::new(content);
        let object_path = self.object_path(&oid);

        if object_path.exists() {
            trace!(%oid, "Object already in database");
            return Err(Error::DuplicateObject(oid));
        }

        trace!(%oid, len = content.len(), "Writing object to database");

        let (shard, _) = oid.shard();
        let dirname = self.database_root.join(shard);
        std::fs::create_dir_all(&dirname)?;

        // Written beside the shards and linked into place, so a shard never holds a partial
        // object.
        let temp_path = self.database_root.join(util::tmp_file_name());
        let mut file = std::fs::File::options()
            .write(true)
            .create_new(true)
            .open(&temp_path)?;
        file.write_all(content)?;
        file.sync_all()?;
        drop(file);

        let published = publish(&temp_path, &object_path, oid);
        let _ = std::fs::remove_file(&temp_path);
        published?;

        Ok(oid)
    }

    /// [`Database::store`], treating already-stored content as success.
    pub fn store_or_existing(&self, content: &[u8]) -> Result<Digest> {
        match self.store(content) {
            Err(Error::DuplicateObject(oid)) => Ok(oid),
            other => other,
        }
    }

    /// Find the single object whose hash contains `prefix`.
    ///
    /// The first two characters select the shard directory. A prefix of exactly two characters
    /// resolves only when that shard holds a single object.
    pub fn fetch_by_hash(&self, prefix: &str) -> Result<Object> {
        self.ensure_initialized()?;

        if prefix.len() < SHARD_KEY_LEN {
            return Err(Error::HashTooShort(prefix.to_owned()));
        }
        if prefix.len() > HEX_LEN || !prefix.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::ObjectNotFound(prefix.to_owned()));
        }

        let prefix = prefix.to_ascii_lowercase();
        let (shard, rest) = prefix.split_at(SHARD_KEY_LEN);
        let shard_path = self.database_root.join(shard);

        let names = match self.shard_entries(&shard_path) {
            Ok(names) => names,
            Err(Error::Io(e)) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::ObjectNotFound(prefix));
            }
            Err(e) => return Err(e),
        };

        let candidates: Vec<&String> = if rest.is_empty() {
            names.iter().collect()
        } else {
            names
                .iter()
                .filter(|name| format!("{shard}{name}").contains(prefix.as_str()))
                .collect()
        };

        trace!(%prefix, candidates = candidates.len(), "Resolved hash prefix");

        match candidates.as_slice() {
            [] => Err(Error::ObjectNotFound(prefix)),
            [name] => {
                let full = format!("{shard}{name}");
                let hash = full.parse().map_err(|_| Error::Corrupt {
                    what: "object name",
                    reason: format!("'{full}' is not a valid digest"),
                })?;
                let content = match std::fs::read(shard_path.join(name)) {
                    Ok(content) => content,
                    Err(e) if e.kind() == ErrorKind::NotFound => {
                        return Err(Error::ObjectNotFound(prefix))
                    }
                    Err(e) => return Err(e.into()),
                };
                Ok(Object { hash, content })
            }
            many => Err(Error::HashCollision(
                many.iter().map(|name| format!("{shard}{name}")).collect(),
            )),
        }
    }

    /// Every stored object's full hash.
    pub fn fetch_all_object_names(&self) -> Result<BTreeSet<String>> {
        self.ensure_initialized()?;

        let shards = match std::fs::read_dir(&self.database_root) {
            Ok(shards) => shards,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(e) => return Err(e.into()),
        };

        let mut out = BTreeSet::new();
        for shard in shards {
            let shard = shard?;
            // Anything but a directory at the top level is a temporary file.
            if !shard.file_type()?.is_dir() {
                continue;
            }
            let shard_name = shard.file_name();
            let shard_name = shard_name
                .to_str()
                .ok_or_else(|| Error::NonUtf8Path(shard.path()))?;
            let shard_path = util::utf8_path_buf(shard.path())?;

            for name in self.shard_entries(&shard_path)? {
                out.insert(format!("{shard_name}{name}"));
            }
        }

        Ok(out)
    }

    /// File names within one shard directory, sorted.
    fn shard_entries(&self, shard_path: &Utf8Path) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in shard_path.read_dir_utf8()? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                warn!(path = %entry.path(), "Found a directory inside a shard");
                return Err(Error::UnexpectedDirectory(entry.path().as_std_path().to_owned()));
            }
            names.push(entry.file_name().to_owned());
        }
        names.sort_unstable();
        Ok(names)
    }

    /// Fetch and decode an object of any kind.
    pub fn load(&self, prefix: &str) -> Result<LoadedItem> {
        let object = self.fetch_by_hash(prefix)?;
        trace!(oid = %object.hash, "Loading object");

        match object.kind()? {
            ObjectKind::Blob => Ok(LoadedItem::Blob(Blob::decode(&object.content)?)),
            ObjectKind::Tree => Ok(LoadedItem::Tree(Tree::from_stored(
                &object.content,
                object.hash,
            )?)),
            ObjectKind::Commit => Ok(LoadedItem::Commit(Commit::decode(&object.content)?)),
            ObjectKind::Index => Err(Error::WrongObjectType {
                expected: "blob, tree or commit",
                signature: ObjectKind::Index.signature(),
            }),
        }
    }

    /// Fetch an object that is expected to be a `T`.
    pub fn load_as<T: Storable>(&self, prefix: &str) -> Result<T> {
        T::decode(&self.fetch_by_hash(prefix)?.content)
    }
}

#[derive(Debug)]
pub enum LoadedItem {
    Commit(Commit),
    Tree(Tree),
    Blob(Blob),
}

impl LoadedItem {
    pub fn kind(&self) -> ObjectKind {
        match self {
            LoadedItem::Commit(_) => ObjectKind::Commit,
            LoadedItem::Tree(_) => ObjectKind::Tree,
            LoadedItem::Blob(_) => ObjectKind::Blob,
        }
    }

    pub fn into_commit(self) -> Option<Commit> {
        if let Self::Commit(v) = self {
            Some(v)
        } else {
            None
        }
    }

    pub fn into_tree(self) -> Option<Tree> {
        if let Self::Tree(v) = self {
            Some(v)
        } else {
            None
        }
    }

    pub fn into_blob(self) -> Option<Blob> {
        if let Self::Blob(v) = self {
            Some(v)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempdir::TempDir;

    use super::*;

    fn database() -> Result<(TempDir, Database)> {
        let dir = TempDir::new("")?;
        let root = util::utf8_path(dir.path())?.join(".avc");
        std::fs::create_dir_all(&root)?;
        Ok((dir, Database::new(root)))
    }

    /// Store `count` distinct contents whose digests all start with `shard`.
    fn store_in_shard(db: &Database, shard: &str, count: usize) -> Result<Vec<Digest>> {
        let mut stored = Vec::new();
        for i in 0.. {
            if stored.len() == count {
                break;
            }
            let content = format!("content {i}");
            if Digest::new(content.as_bytes()).to_hex().starts_with(shard) {
                stored.push(db.store(content.as_bytes())?);
            }
        }
        Ok(stored)
    }

    #[test]
    fn store_then_fetch_full_hash() -> Result<()> {
        let (_dir, db) = database()?;
        let oid = db.store(b"some content")?;

        let (shard, rest) = oid.shard();
        assert!(db.path().join(shard).join(rest).is_file());

        let object = db.fetch_by_hash(&oid.to_hex())?;
        assert_eq!(object.hash, oid);
        assert_eq!(object.content, b"some content");
        Ok(())
    }

    #[test]
    fn duplicate_store_reports_existing_digest() -> Result<()> {
        let (_dir, db) = database()?;
        let first = db.store(b"same")?;

        match db.store(b"same") {
            Err(Error::DuplicateObject(existing)) => assert_eq!(existing, first),
            other => panic!("expected a duplicate, got {other:?}"),
        }
        assert_eq!(db.store_or_existing(b"same")?, first);
        assert_eq!(db.fetch_all_object_names()?.len(), 1);
        Ok(())
    }

    #[test]
    fn distinct_content_distinct_paths() -> Result<()> {
        let (_dir, db) = database()?;
        let a = db.store(b"a")?;
        let b = db.store(b"b")?;
        assert_ne!(a, b);
        assert_ne!(db.object_path(&a), db.object_path(&b));
        Ok(())
    }

    #[test]
    fn short_prefix_is_rejected() -> Result<()> {
        let (_dir, db) = database()?;
        let oid = db.store(b"x")?;
        for prefix in ["", &oid.to_hex()[..1]] {
            assert!(matches!(
                db.fetch_by_hash(prefix),
                Err(Error::HashTooShort(_))
            ));
        }
        Ok(())
    }

    #[test]
    fn missing_object_is_not_found() -> Result<()> {
        let (_dir, db) = database()?;
        let oid = db.store(b"x")?;
        let other_shard = if oid.to_hex().starts_with("00") { "ff" } else { "00" };

        assert!(matches!(
            db.fetch_by_hash(other_shard),
            Err(Error::ObjectNotFound(_))
        ));
        assert!(matches!(
            db.fetch_by_hash(&format!("{}zz", &oid.to_hex()[..2])),
            Err(Error::ObjectNotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn ambiguous_prefix_lists_every_candidate() -> Result<()> {
        let (_dir, db) = database()?;
        let stored = store_in_shard(&db, "ab", 2)?;
        // Something elsewhere that must not be listed.
        store_in_shard(&db, "cd", 1)?;

        let mut expected: Vec<String> = stored.iter().map(Digest::to_hex).collect();
        expected.sort();

        match db.fetch_by_hash("ab") {
            Err(Error::HashCollision(candidates)) => assert_eq!(candidates, expected),
            other => panic!("expected a collision, got {other:?}"),
        }

        // A longer prefix narrows it down.
        let unique = &expected[0];
        let len = (3..=HEX_LEN)
            .find(|&len| !expected[1].contains(&unique[..len]))
            .unwrap();
        assert_eq!(db.fetch_by_hash(&unique[..len])?.hash.to_hex(), *unique);
        Ok(())
    }

    #[test]
    fn longer_prefix_can_still_be_ambiguous() -> Result<()> {
        let (_dir, db) = database()?;
        let stored = store_in_shard(&db, "abc", 2)?;
        // Same shard, but without "abc" anywhere in the hash.
        let other = (0..)
            .map(|i| format!("other {i}"))
            .find(|c| {
                let hex = Digest::new(c.as_bytes()).to_hex();
                hex.starts_with("ab") && !hex.contains("abc")
            })
            .unwrap();
        db.store(other.as_bytes())?;

        let mut expected: Vec<String> = stored.iter().map(Digest::to_hex).collect();
        expected.sort();

        match db.fetch_by_hash("ABC") {
            Err(Error::HashCollision(candidates)) => assert_eq!(candidates, expected),
            other => panic!("expected a collision, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn losing_a_write_race_is_a_duplicate() -> Result<()> {
        let (_dir, db) = database()?;
        let oid = Digest::new(b"raced");
        let object_path = db.object_path(&oid);
        std::fs::create_dir_all(object_path.parent().unwrap())?;
        // Another writer got there first.
        std::fs::write(&object_path, b"raced")?;

        let temp_path = db.path().join(util::tmp_file_name());
        std::fs::write(&temp_path, b"raced")?;

        match publish(&temp_path, &object_path, oid) {
            Err(Error::DuplicateObject(existing)) => assert_eq!(existing, oid),
            other => panic!("expected a duplicate, got {other:?}"),
        }
        assert_eq!(std::fs::read(&object_path)?, b"raced");
        Ok(())
    }

    #[test]
    fn store_leaves_no_temporary_files() -> Result<()> {
        let (_dir, db) = database()?;
        db.store(b"tidy")?;

        let stray = std::fs::read_dir(db.path())?
            .filter(|e| e.as_ref().map_or(true, |e| !e.path().is_dir()))
            .count();
        assert_eq!(stray, 0);
        Ok(())
    }

    #[test]
    fn shard_key_alone_resolves_sole_object() -> Result<()> {
        let (_dir, db) = database()?;
        let oid = db.store(b"lonely")?;
        let object = db.fetch_by_hash(&oid.to_hex()[..2])?;
        assert_eq!(object.hash, oid);
        Ok(())
    }

    #[test]
    fn prefix_is_case_insensitive() -> Result<()> {
        let (_dir, db) = database()?;
        let oid = db.store(b"shouting")?;
        let object = db.fetch_by_hash(&oid.to_hex().to_uppercase())?;
        assert_eq!(object.hash, oid);
        Ok(())
    }

    #[test]
    fn all_object_names() -> Result<()> {
        let (_dir, db) = database()?;
        let expected: BTreeSet<String> = [&b"one"[..], &b"two"[..], &b"three"[..]]
            .into_iter()
            .map(|c| db.store(c).map(|oid| oid.to_hex()))
            .collect::<Result<_>>()?;

        // Stray temporary files at the top level are not objects.
        std::fs::write(db.path().join(util::tmp_file_name()), b"partial")?;

        assert_eq!(db.fetch_all_object_names()?, expected);
        Ok(())
    }

    #[test]
    fn nested_directory_is_fatal() -> Result<()> {
        let (_dir, db) = database()?;
        let oid = db.store(b"x")?;
        let (shard, _) = oid.shard();
        std::fs::create_dir_all(db.path().join(&shard).join("nested"))?;

        assert!(matches!(
            db.fetch_all_object_names(),
            Err(Error::UnexpectedDirectory(_))
        ));
        assert!(matches!(
            db.fetch_by_hash(&shard),
            Err(Error::UnexpectedDirectory(_))
        ));
        Ok(())
    }

    #[test]
    fn missing_root_is_not_initialized() -> Result<()> {
        let dir = TempDir::new("")?;
        let db = Database::new(util::utf8_path(dir.path())?.join(".avc"));
        assert!(matches!(db.store(b"x"), Err(Error::NotInitialized)));
        assert!(matches!(db.fetch_by_hash("abcd"), Err(Error::NotInitialized)));
        assert!(matches!(
            db.fetch_all_object_names(),
            Err(Error::NotInitialized)
        ));
        Ok(())
    }

    #[test]
    fn load_dispatches_on_header() -> Result<()> {
        let (_dir, db) = database()?;
        let blob = Blob::new(b"hello".to_vec());
        let oid = blob.store(&db)?;

        let loaded = db.load(&oid.to_hex())?;
        assert_eq!(loaded.kind(), ObjectKind::Blob);
        assert_eq!(loaded.into_blob(), Some(blob));

        assert!(matches!(
            db.load_as::<Tree>(&oid.to_hex()),
            Err(Error::WrongObjectType { .. })
        ));
        Ok(())
    }
}

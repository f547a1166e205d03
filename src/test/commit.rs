use camino::Utf8Path;
use pretty_assertions::assert_eq;

use crate::storable::blob::Blob;
use crate::storable::commit::{Author, Commit};
use crate::storable::{ObjectKind, Storable, HEADER_LEN};
use crate::test::{scratch_repo, COMMIT_EMAIL, COMMIT_NAME};
use crate::*;

fn author() -> Author {
    Author {
        name: COMMIT_NAME.to_owned(),
        email: COMMIT_EMAIL.to_owned(),
    }
}

#[test]
/// Store "hello" in a fresh repository and fetch it back by the two character shard key.
fn store_and_fetch_by_shard_key() -> Result<()> {
    let (_dir, repo) = scratch_repo()?;

    let content = Blob::new(b"hello".to_vec()).encode()?;
    let stored = repo.database.store(&content)?;
    let oid = Digest::new(&content);
    assert_eq!(stored, oid);

    let object = repo.database.fetch_by_hash(&oid.to_hex()[..2])?;
    assert_eq!(object.hash, oid);
    assert_eq!(&object.content[HEADER_LEN..], b"hello");
    assert_eq!(Blob::decode(&object.content)?.data(), b"hello");

    match repo.database.store(&content) {
        Err(Error::DuplicateObject(existing)) => assert_eq!(existing, oid),
        other => panic!("expected a duplicate, got {other:?}"),
    }
    Ok(())
}

#[test]
/// Snapshot the working tree, commit it, then commit again on top. The second commit points at
/// the first, and both point at the same tree.
fn commit_chain() -> Result<()> {
    let (_dir, repo) = scratch_repo()?;
    let root = repo.workdir();
    crate::create_test_files!(root, ["file1", "dir/file2"]);

    let tree = repo.write_tree(Utf8Path::new("."))?;
    let first = repo.commit_tree(&tree.to_hex(), None, author(), author())?;
    let second = repo.commit_tree(&tree.short(), Some(&first.to_hex()), author(), author())?;

    let first_commit: Commit = repo.database.load_as(&first.to_hex())?;
    assert!(first_commit.is_root());
    assert_eq!(first_commit.tree_id(), &tree);

    let loaded = repo.database.load(&second.to_hex())?;
    assert_eq!(loaded.kind(), ObjectKind::Commit);
    let second_commit = loaded.into_commit().expect("object should be a commit");
    assert_eq!(second_commit.parent(), Some(&first));
    assert_eq!(second_commit.tree_id(), &tree);
    assert_eq!(second_commit.author(), &author());
    Ok(())
}

#[test]
/// A commit must point at a tree, and its parent must be a commit.
fn commit_tree_checks_object_types() -> Result<()> {
    let (_dir, repo) = scratch_repo()?;
    let blob = Blob::new(b"not a tree".to_vec()).store(&repo.database)?;

    assert!(matches!(
        repo.commit_tree(&blob.to_hex(), None, author(), author()),
        Err(Error::WrongObjectType { .. })
    ));

    let root = repo.workdir();
    crate::create_test_files!(root, ["file1"]);
    let tree = repo.write_tree(Utf8Path::new("."))?;
    assert!(matches!(
        repo.commit_tree(&tree.to_hex(), Some(&blob.to_hex()), author(), author()),
        Err(Error::WrongObjectType { .. })
    ));
    Ok(())
}

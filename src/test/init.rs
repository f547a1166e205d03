use pretty_assertions::assert_eq;
use tempdir::TempDir;

use crate::repo::REPO_DIR;
use crate::util::utf8_path;
use crate::*;

#[test]
fn avc_init() -> Result<()> {
    let dir = TempDir::new("")?;
    let repo = Repo::init(utf8_path(dir.path())?)?;

    let avc_dir = dir.path().join(REPO_DIR);
    assert!(avc_dir.is_dir());
    assert!(avc_dir.join("objects").is_dir());
    assert_eq!(repo.root().as_std_path(), avc_dir.canonicalize()?);
    assert!(repo.database.fetch_all_object_names()?.is_empty());

    Ok(())
}

#[test]
fn init_twice_fails() -> Result<()> {
    let dir = TempDir::new("")?;
    Repo::init(utf8_path(dir.path())?)?;
    assert!(matches!(
        Repo::init(utf8_path(dir.path())?),
        Err(Error::AlreadyInitialized)
    ));
    Ok(())
}

#[test]
fn open_without_init_fails() -> Result<()> {
    let dir = TempDir::new("")?;
    assert!(matches!(
        Repo::open(utf8_path(dir.path())?),
        Err(Error::NotInitialized)
    ));
    Ok(())
}

#[test]
fn removed_root_is_noticed() -> Result<()> {
    let (_dir, repo) = crate::test::scratch_repo()?;
    std::fs::remove_dir_all(repo.root())?;

    assert!(matches!(repo.database.store(b"x"), Err(Error::NotInitialized)));
    assert!(matches!(repo.index(), Err(Error::NotInitialized)));
    Ok(())
}

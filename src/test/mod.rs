mod commit;
mod init;

pub const COMMIT_NAME: &str = "A U Thor";
pub const COMMIT_EMAIL: &str = "author@example.com";

/// Create each file (and its parent directories) under `$root`, containing
/// [`test_file_contents!`] for its path.
#[macro_export]
macro_rules! create_test_files {
    ($root:expr, [$($path:expr),* $(,)?]) => {{
        use std::io::Write;
        $({
            let path = $root.join($path);
            std::fs::create_dir_all(path.parent().unwrap())?;
            write!(
                std::fs::File::create(&path)?,
                "{}",
                $crate::test_file_contents!($path)
            )?;
        })*
    }};
}

#[macro_export]
macro_rules! test_file_contents {
    ($path:expr) => {
        format!("{}-contents\n", $path)
    };
}

/// A scratch directory holding a freshly initialised repository.
pub fn scratch_repo() -> crate::Result<(tempdir::TempDir, crate::Repo)> {
    let dir = tempdir::TempDir::new("")?;
    let repo = crate::Repo::init(crate::util::utf8_path(dir.path())?)?;
    Ok((dir, repo))
}

mod interface;

use avc::repo::database::LoadedItem;
use avc::storable::blob::Blob;
use avc::storable::commit::Author;
use avc::storable::Storable;
use avc::Repo;
use camino::Utf8PathBuf;
use color_eyre::eyre::{eyre, Context};
pub use color_eyre::Result;

use crate::interface::*;

use clap::Parser;
use tracing_subscriber::prelude::*;

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Opt::parse();

    let path = match args.path {
        Some(ref path) => path
            .canonicalize_utf8()
            .wrap_err(format!("Directory not found: '{path}'"))?,
        None => Utf8PathBuf::try_from(std::env::current_dir()?)?,
    };

    if matches!(args.command, Command::Init) {
        let repo = Repo::init(&path)?;
        println!("Initialized empty avc repository in {}", repo.root());
        return Ok(());
    }

    let repo = Repo::open(&path).wrap_err(format!("Could not open repository at '{path}'"))?;

    match args.command {
        Command::Init => unreachable!(),
        Command::HashObject {
            write,
            content,
            file,
        } => {
            let oid = match (content, file) {
                (Some(content), _) => {
                    let blob = Blob::new(content.into_bytes());
                    if write {
                        blob.store(&repo.database)?
                    } else {
                        blob.digest()
                    }
                }
                (None, Some(file)) => {
                    let abs = repo.workdir().join(&file);
                    if abs.is_dir() {
                        repo.write_tree(&file)?
                    } else {
                        let data = std::fs::read(&abs)
                            .wrap_err(format!("Failed to read file: {abs}"))?;
                        let blob = Blob::new(data);
                        if write {
                            blob.store(&repo.database)?
                        } else {
                            blob.digest()
                        }
                    }
                }
                (None, None) => return Err(eyre!("either --content or --file is required")),
            };
            println!("{oid}");
        }
        Command::CatFile { object, r#type } => {
            let item = repo.database.load(&object)?;
            if r#type {
                println!("{}", item.kind());
            } else {
                match item {
                    LoadedItem::Blob(blob) => blob.pretty_print()?,
                    LoadedItem::Tree(tree) => tree.pretty_print()?,
                    LoadedItem::Commit(commit) => commit.pretty_print()?,
                }
            }
        }
        Command::LsObjects => {
            for name in repo.database.fetch_all_object_names()? {
                println!("{name}");
            }
        }
        Command::Add { path } => {
            repo.add(&path).wrap_err(format!("Failed to add '{path}'"))?;
        }
        Command::Rm { name } => {
            repo.remove(&name)?;
            println!("{name} removed from index");
        }
        Command::LsFiles => {
            for entry in repo.index()?.entries() {
                println!("{} {}", entry.oid(), entry.name());
            }
        }
        Command::CommitTree {
            tree,
            parent,
            author_name,
            author_email,
            committer_name,
            committer_email,
        } => {
            let committer = Author {
                name: committer_name.unwrap_or_else(|| author_name.clone()),
                email: committer_email.unwrap_or_else(|| author_email.clone()),
            };
            let author = Author {
                name: author_name,
                email: author_email,
            };
            let oid = repo.commit_tree(&tree, parent.as_deref(), author, committer)?;
            println!("{oid}");
        }
    }

    Ok(())
}

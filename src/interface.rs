use camino::Utf8PathBuf;
use clap::{ArgGroup, Parser, Subcommand};

#[derive(Clone, Debug, Subcommand)]
pub enum Command {
    /// Create an empty repository
    Init,

    /// Compute the object id of some content, optionally storing it
    #[command(group(ArgGroup::new("source").required(true).args(["content", "file"])))]
    HashObject {
        /// Store the object in the database. A directory is always stored.
        #[arg(short, long)]
        write: bool,

        /// Hash this string as a blob
        #[arg(short, long)]
        content: Option<String>,

        /// Hash the file, or the directory as a tree
        #[arg(short, long)]
        file: Option<Utf8PathBuf>,
    },

    /// Print the object with the given (possibly abbreviated) hash
    CatFile {
        #[arg(value_name = "object")]
        object: String,

        /// Print only the type of the object
        #[arg(short, long)]
        r#type: bool,
    },

    /// List the full hash of every stored object
    LsObjects,

    /// Stage a file, or every file in a directory
    Add {
        #[arg(env = "AVC_ADD_PATH")]
        path: Utf8PathBuf,
    },

    /// Unstage an index entry by name
    Rm { name: String },

    /// List the staged files
    LsFiles,

    /// Create a commit of a stored tree
    CommitTree {
        #[arg(value_name = "tree")]
        tree: String,

        #[arg(short, long)]
        parent: Option<String>,

        #[arg(long, env = "AVC_AUTHOR_NAME")]
        author_name: String,

        #[arg(long, env = "AVC_AUTHOR_EMAIL")]
        author_email: String,

        /// Defaults to the author name
        #[arg(long, env = "AVC_COMMITTER_NAME")]
        committer_name: Option<String>,

        /// Defaults to the author email
        #[arg(long, env = "AVC_COMMITTER_EMAIL")]
        committer_email: Option<String>,
    },
}

#[derive(Debug, Parser)]
#[command(name = "avc", version, about = "A small content-addressed version control tool")]
pub struct Opt {
    #[command(subcommand)]
    pub command: Command,

    /// Run as if started in this directory
    #[arg(short = 'C', long)]
    pub path: Option<Utf8PathBuf>,
}

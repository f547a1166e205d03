use std::io::Write;

use nom::{combinator::all_consuming, IResult};

use super::parse::{
    finish, prefixed_digest, prefixed_optional_digest, prefixed_str, prefixed_timestamp,
};
use super::write::put_prefixed;
use super::{ObjectKind, Storable};
use crate::digest::Digest;
use crate::timestamp::Timestamp;
use crate::Result;

/// A name and email pair, as configured by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub email: String,
}

/// A snapshot with at most one parent. Holds the digest of its tree, never the tree itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    parent: Option<Digest>,
    author: Author,
    committer: Author,
    commit_date: Timestamp,
    tree_id: Digest,
}

impl Commit {
    pub fn new(
        parent: Option<Digest>,
        tree_id: Digest,
        author: Author,
        committer: Author,
        commit_date: Timestamp,
    ) -> Self {
        Self {
            parent,
            author,
            committer,
            commit_date,
            tree_id,
        }
    }

    pub fn tree_id(&self) -> &Digest {
        &self.tree_id
    }

    pub fn parent(&self) -> Option<&Digest> {
        self.parent.as_ref()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn author(&self) -> &Author {
        &self.author
    }

    pub fn committer(&self) -> &Author {
        &self.committer
    }

    pub fn commit_date(&self) -> &Timestamp {
        &self.commit_date
    }

    pub fn pretty_print(&self) -> std::io::Result<()> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "tree {:x}", self.tree_id)?;
        if let Some(parent) = &self.parent {
            writeln!(stdout, "parent {parent:x}")?;
        }
        writeln!(stdout, "author {} <{}>", self.author.name, self.author.email)?;
        writeln!(
            stdout,
            "committer {} <{}> {}",
            self.committer.name, self.committer.email, self.commit_date
        )?;
        stdout.flush()
    }
}

impl Storable for Commit {
    const KIND: ObjectKind = ObjectKind::Commit;

    fn encode_body(&self, out: &mut Vec<u8>) -> Result<()> {
        let parent = self.parent.map(|p| p.to_hex()).unwrap_or_default();
        put_prefixed(out, parent.as_bytes())?;
        put_prefixed(out, self.author.name.as_bytes())?;
        put_prefixed(out, self.author.email.as_bytes())?;
        put_prefixed(out, self.committer.name.as_bytes())?;
        put_prefixed(out, self.committer.email.as_bytes())?;
        put_prefixed(out, &self.commit_date.to_bytes())?;
        put_prefixed(out, self.tree_id.to_hex().as_bytes())?;
        Ok(())
    }

    fn decode_body(body: &[u8]) -> Result<Self> {
        let (_, commit) = finish("commit", all_consuming(commit_body)(body))?;
        Ok(commit)
    }
}

fn commit_body(input: &[u8]) -> IResult<&[u8], Commit> {
    let (input, parent) = prefixed_optional_digest(input)?;
    let (input, author_name) = prefixed_str(input)?;
    let (input, author_email) = prefixed_str(input)?;
    let (input, committer_name) = prefixed_str(input)?;
    let (input, committer_email) = prefixed_str(input)?;
    let (input, commit_date) = prefixed_timestamp(input)?;
    let (input, tree_id) = prefixed_digest(input)?;

    let author = Author {
        name: author_name.to_owned(),
        email: author_email.to_owned(),
    };
    let committer = Author {
        name: committer_name.to_owned(),
        email: committer_email.to_owned(),
    };

    Ok((
        input,
        Commit::new(parent, tree_id, author, committer, commit_date),
    ))
}

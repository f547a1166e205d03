//! A content-addressed object store and staging index for a small git-like version control
//! tool.
//!
//! Objects (blobs, trees and commits) are stored under `.avc/objects`, keyed by the SHA-1 of
//! their encoded bytes. The index at `.avc/index` lists the files staged for the next commit.

#[cfg(test)]
mod test;

pub mod digest;
mod error;
pub mod index;
pub mod repo;
pub mod storable;
pub mod timestamp;
mod util;

pub use crate::digest::Digest;
pub use crate::error::{Error, Result};
pub use crate::repo::Repo;

use std::collections::HashSet;

use nom::{combinator::all_consuming, multi::many0, IResult};
use tracing::trace;

use super::IndexEntry;
use crate::storable::parse::{
    finish, prefixed_digest, prefixed_str, prefixed_timestamp, split_header,
};
use crate::storable::ObjectKind;
use crate::{Error, Result};

pub(super) fn parse_index(bytes: &[u8]) -> Result<Vec<IndexEntry>> {
    trace!("Parsing bytes as index...");

    let (body, signature) = split_header(bytes)?;
    if !ObjectKind::Index.accepts(signature) {
        return Err(Error::WrongObjectType {
            expected: ObjectKind::Index.name(),
            signature,
        });
    }

    let (_, entries) = finish("index", all_consuming(many0(parse_index_entry))(body))?;

    let mut seen = HashSet::with_capacity(entries.len());
    if let Some(dup) = entries.iter().find(|e| !seen.insert(e.name.as_str())) {
        return Err(Error::Corrupt {
            what: "index",
            reason: format!("'{}' is listed more than once", dup.name),
        });
    }

    trace!("Parsing bytes as index... done");
    Ok(entries)
}

fn parse_index_entry(input: &[u8]) -> IResult<&[u8], IndexEntry> {
    let (input, oid) = prefixed_digest(input)?;
    let (input, name) = prefixed_str(input)?;
    let (input, created) = prefixed_timestamp(input)?;
    let (input, modified) = prefixed_timestamp(input)?;

    Ok((
        input,
        IndexEntry {
            oid,
            name: name.to_owned(),
            created,
            modified,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::super::write::write_index;
    use super::*;
    use crate::digest::Digest;
    use crate::timestamp::Timestamp;

    #[test]
    fn entry_layout() -> Result<()> {
        let now = Timestamp::now();
        let entry = IndexEntry::new(Digest::new(b"x"), "f", now, now);
        let bytes = write_index(&[entry])?;

        // header, then 40 hex chars, 1 name byte and two 16 byte timestamps, each with a
        // 4 byte length.
        assert_eq!(bytes.len(), 3 + (4 + 40) + (4 + 1) + 2 * (4 + 16));
        assert_eq!(&bytes[3..7], &40u32.to_be_bytes());
        Ok(())
    }

    #[test]
    fn truncated_index_is_corrupt() -> Result<()> {
        let now = Timestamp::now();
        let bytes = write_index(&[IndexEntry::new(Digest::new(b"x"), "f", now, now)])?;
        let err = parse_index(&bytes[..bytes.len() - 3]).unwrap_err();
        assert!(matches!(err, Error::Corrupt { what: "index", .. }));
        Ok(())
    }

    #[test]
    fn repeated_name_is_corrupt() -> Result<()> {
        let now = Timestamp::now();
        let bytes = write_index(&[
            IndexEntry::new(Digest::new(b"x"), "f", now, now),
            IndexEntry::new(Digest::new(b"y"), "g", now, now),
            IndexEntry::new(Digest::new(b"z"), "f", now, now),
        ])?;
        let err = parse_index(&bytes).unwrap_err();
        assert!(matches!(err, Error::Corrupt { what: "index", .. }), "{err:?}");
        Ok(())
    }

    #[test]
    fn tree_is_not_an_index() {
        let err = parse_index(&[0, 200, 0]).unwrap_err();
        assert!(matches!(err, Error::WrongObjectType { .. }));
    }
}

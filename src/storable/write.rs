use crate::{Error, Result};

/// Write `bytes` preceded by their length as a big-endian `u32`.
pub(crate) fn put_prefixed(out: &mut Vec<u8>, bytes: &[u8]) -> Result<()> {
    let len = u32::try_from(bytes.len()).map_err(|_| Error::Corrupt {
        what: "field",
        reason: format!("{} bytes do not fit a u32 length prefix", bytes.len()),
    })?;
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(bytes);
    Ok(())
}

pub(crate) fn put_kind_tag(out: &mut Vec<u8>, tag: u16) {
    out.extend_from_slice(&tag.to_be_bytes());
}

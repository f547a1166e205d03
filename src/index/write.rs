use super::IndexEntry;
use crate::storable::write::put_prefixed;
use crate::storable::ObjectKind;
use crate::Result;

pub(super) fn write_index(entries: &[IndexEntry]) -> Result<Vec<u8>> {
    let mut out = ObjectKind::Index.header().to_vec();

    for entry in entries {
        write_index_entry(entry, &mut out)?;
    }

    Ok(out)
}

fn write_index_entry(
    IndexEntry {
        oid,
        name,
        created,
        modified,
    }: &IndexEntry,
    out: &mut Vec<u8>,
) -> Result<()> {
    put_prefixed(out, oid.to_hex().as_bytes())?;
    put_prefixed(out, name.as_bytes())?;
    put_prefixed(out, &created.to_bytes())?;
    put_prefixed(out, &modified.to_bytes())?;
    Ok(())
}

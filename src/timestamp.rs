use std::fmt::Display;
use std::time::SystemTime;

use chrono::{DateTime, FixedOffset, Local};

use crate::{Error, Result};

/// A point in time with the UTC offset it was recorded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(pub DateTime<FixedOffset>);

impl Timestamp {
    /// Width of [`Timestamp::to_bytes`]: seconds (i64), nanoseconds (u32), offset (i32).
    pub const ENCODED_LEN: usize = 16;

    pub fn now() -> Self {
        Self(Local::now().into())
    }

    pub fn from_system_time(time: SystemTime) -> Self {
        Self(DateTime::<Local>::from(time).into())
    }

    /// Big-endian binary form, used by the index and commits.
    pub fn to_bytes(&self) -> [u8; Self::ENCODED_LEN] {
        let mut out = [0; Self::ENCODED_LEN];
        out[..8].copy_from_slice(&self.0.timestamp().to_be_bytes());
        out[8..12].copy_from_slice(&self.0.timestamp_subsec_nanos().to_be_bytes());
        out[12..].copy_from_slice(&self.0.offset().local_minus_utc().to_be_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let corrupt = |reason: String| Error::Corrupt {
            what: "timestamp",
            reason,
        };

        let bytes: &[u8; Self::ENCODED_LEN] = bytes.try_into().map_err(|_| {
            corrupt(format!(
                "expected {} bytes, found {}",
                Self::ENCODED_LEN,
                bytes.len()
            ))
        })?;

        let mut secs = [0; 8];
        secs.copy_from_slice(&bytes[..8]);
        let mut nanos = [0; 4];
        nanos.copy_from_slice(&bytes[8..12]);
        let mut offset = [0; 4];
        offset.copy_from_slice(&bytes[12..]);

        let secs = i64::from_be_bytes(secs);
        let nanos = u32::from_be_bytes(nanos);
        let offset = i32::from_be_bytes(offset);

        let offset = FixedOffset::east_opt(offset)
            .ok_or_else(|| corrupt(format!("utc offset out of range: {offset}")))?;
        let utc = DateTime::from_timestamp(secs, nanos)
            .ok_or_else(|| corrupt(format!("time out of range: {secs}.{nanos}")))?;

        Ok(Self(utc.with_timezone(&offset)))
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%s %z"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn binary_form_keeps_offset_and_nanos() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let time = offset.timestamp_opt(1_658_312_219, 123_456_789).unwrap();
        let ts = Timestamp(time);

        let decoded = Timestamp::from_bytes(&ts.to_bytes()).unwrap();
        assert_eq!(decoded, ts);
        assert_eq!(decoded.0.offset().local_minus_utc(), 7200);
        assert_eq!(decoded.to_string(), "1658312219 +0200");
    }

    #[test]
    fn wrong_length_is_corrupt() {
        let err = Timestamp::from_bytes(&[0; 15]).unwrap_err();
        assert!(matches!(err, Error::Corrupt { .. }));
    }

    #[test]
    fn out_of_range_offset_is_corrupt() {
        let mut bytes = Timestamp::now().to_bytes();
        bytes[12..].copy_from_slice(&i32::MAX.to_be_bytes());
        let err = Timestamp::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, Error::Corrupt { .. }));
    }
}

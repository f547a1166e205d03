use std::{
    fmt::{Debug, Display, LowerHex},
    ops::Deref,
    str::FromStr,
};

use hex::FromHexError;
use sha1::{Digest as _, Sha1};
use tap::Tap;

/// Number of hex characters of a digest used to select its shard directory.
pub const SHARD_KEY_LEN: usize = 2;

/// Length of a digest rendered as hex.
pub const HEX_LEN: usize = 40;

#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Digest(pub [u8; 20]);

impl Digest {
    /// Hash the input bytes and return the resulting digest.
    pub fn new(bytes: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(bytes);
        let mut out = [0; 20];
        out.copy_from_slice(&hasher.finalize());
        Self(out)
    }

    /// Format the digest as a hex string.
    ///
    /// Identical to `format!("{:x}", self)`.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Shorten a Digest, usually for display purposes.
    ///
    /// Note: This doesn't check for collisions.
    pub fn short(&self) -> String {
        self.to_hex().tap_mut(|x| x.truncate(7))
    }

    /// Split the hex form into the shard directory name and the file name within it.
    pub fn shard(&self) -> (String, String) {
        let hex = self.to_hex();
        let (shard, rest) = hex.split_at(SHARD_KEY_LEN);
        (shard.to_owned(), rest.to_owned())
    }
}

impl Deref for Digest {
    type Target = [u8; 20];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl LowerHex for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Debug for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl FromStr for Digest {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        let bytes: [u8; 20] = bytes
            .try_into()
            .map_err(|_| FromHexError::InvalidStringLength)?;
        Ok(Digest(bytes))
    }
}

//! Content hash type using Blake3.

use std::fmt;

/// A 32-byte content hash using Blake3.
///
/// Used to name persisted results after the grid point that produced them,
/// so the same point always maps to the same file stem.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash([u8; 32]);

impl Hash {
    /// Number of hex characters used by [`Hash::short_hex`].
    pub const SHORT_HEX_LEN: usize = 16;

    /// Create hash from bytes using Blake3.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let hash = blake3::hash(bytes);
        Self(*hash.as_bytes())
    }

    /// Convert hash to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Leading hex characters, short enough for file names.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..Self::SHORT_HEX_LEN / 2])
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "Hash({}..{})", &hex[..8], &hex[56..])
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

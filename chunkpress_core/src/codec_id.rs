use std::fmt;
use std::str::FromStr;

use crate::error::UnknownCodecError;

/// Stable codec identifier persisted in every chunk file header.
///
/// Values are append-only: a new algorithm gets a new number, and an existing
/// number is never reused or given different semantics.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecId {
    PassThrough = 0,
    Snappy = 1,
    Zstd = 2,
    Lz4 = 3,
    Lz4LengthPrefixed = 4,
    Gzip = 5,
}

impl CodecId {
    /// Every identifier, in numeric order.
    pub const ALL: [CodecId; 6] = [
        CodecId::PassThrough,
        CodecId::Snappy,
        CodecId::Zstd,
        CodecId::Lz4,
        CodecId::Lz4LengthPrefixed,
        CodecId::Gzip,
    ];

    #[inline]
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    pub fn name(self) -> &'static str {
        match self {
            CodecId::PassThrough => "passthrough",
            CodecId::Snappy => "snappy",
            CodecId::Zstd => "zstd",
            CodecId::Lz4 => "lz4",
            CodecId::Lz4LengthPrefixed => "lz4-length-prefixed",
            CodecId::Gzip => "gzip",
        }
    }
}

impl TryFrom<u16> for CodecId {
    type Error = UnknownCodecError;

    fn try_from(raw: u16) -> Result<Self, Self::Error> {
        CodecId::ALL
            .into_iter()
            .find(|id| id.as_u16() == raw)
            .ok_or(UnknownCodecError::Id(raw))
    }
}

impl FromStr for CodecId {
    type Err = UnknownCodecError;

    /// Accepts the canonical name plus the short aliases used on the command line.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "passthrough" | "pass" | "none" => Ok(CodecId::PassThrough),
            "snappy" | "snap" => Ok(CodecId::Snappy),
            "zstd" | "zstandard" | "z" => Ok(CodecId::Zstd),
            "lz4" | "l" => Ok(CodecId::Lz4),
            "lz4-length-prefixed" | "lz4lp" => Ok(CodecId::Lz4LengthPrefixed),
            "gzip" | "gz" => Ok(CodecId::Gzip),
            _ => Err(UnknownCodecError::Name(s.to_string())),
        }
    }
}

impl fmt::Display for CodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

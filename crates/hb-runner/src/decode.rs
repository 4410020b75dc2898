//! Decoding of the executable's output stream.

/// How raw output bytes become text. Decoding never fails: bytes that cannot
/// be represented are dropped by policy, never raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputDecoding {
    /// Single-byte Latin-1: every byte maps to exactly one character.
    #[default]
    Latin1,
    /// UTF-8, silently skipping invalid sequences.
    Utf8Skip,
}

impl OutputDecoding {
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Self::Latin1 => bytes.iter().map(|&b| b as char).collect(),
            Self::Utf8Skip => bytes.utf8_chunks().map(|chunk| chunk.valid()).collect(),
        }
    }
}

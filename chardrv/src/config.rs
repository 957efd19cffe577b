use crate::core::ByteSet;

/// Line framing options
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Characters that never terminate a line. They are stored as line data even if they are
    /// also listed in `terminators`.
    pub exceptional_chars: ByteSet,
    /// Characters that complete the current line. Terminators are not stored.
    pub terminators: ByteSet,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exceptional_chars: ByteSet::NONE,
            terminators: ByteSet::from_bytes(b"\0\r\n"),
        }
    }
}

impl Config {
    /// Returns `true` if `byte` completes a line under this configuration.
    pub const fn is_terminator(&self, byte: u8) -> bool {
        self.terminators.contains(byte) && !self.exceptional_chars.contains(byte)
    }
}

//! Stream type identifiers carried in byte 0 of every frame header.
//!
//! The engine only documents stdin, stdout and stderr. Newer daemons may send
//! other values; they are preserved as [`StreamType::Other`] and it is up to
//! the consumer how to route them.

/// Standard input echo (attach with stdin, no TTY).
pub const STDIN: u8 = 0;

/// Standard output.
pub const STDOUT: u8 = 1;

/// Standard error.
pub const STDERR: u8 = 2;

/// The logical output stream a frame belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamType {
    Stdin,
    Stdout,
    Stderr,
    /// Any stream id outside the documented range.
    Other(u8),
}

impl StreamType {
    /// Map a raw header byte to a stream type.
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            STDIN => Self::Stdin,
            STDOUT => Self::Stdout,
            STDERR => Self::Stderr,
            other => Self::Other(other),
        }
    }

    /// The raw header byte for this stream type.
    pub fn as_byte(self) -> u8 {
        match self {
            Self::Stdin => STDIN,
            Self::Stdout => STDOUT,
            Self::Stderr => STDERR,
            Self::Other(byte) => byte,
        }
    }

    /// Returns a human-readable name for the stream type.
    pub fn name(self) -> &'static str {
        match self {
            Self::Stdin => "stdin",
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
            Self::Other(_) => "unknown",
        }
    }

    /// Returns true if output on this stream belongs on the error channel.
    pub fn is_stderr(self) -> bool {
        self == Self::Stderr
    }
}

impl From<u8> for StreamType {
    fn from(byte: u8) -> Self {
        Self::from_byte(byte)
    }
}

impl std::fmt::Display for StreamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Other(byte) => write!(f, "unknown({byte})"),
            known => f.write_str(known.name()),
        }
    }
}

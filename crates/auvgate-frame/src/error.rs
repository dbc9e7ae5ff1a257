/// Errors that can occur while decoding a frame from the vehicle link.
///
/// Encoding is total and never fails; every variant here describes a
/// frame that must be dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// The frame is too short to carry the checksum trailer.
    #[error("frame too short ({len} bytes, min {min})")]
    TooShort { len: usize, min: usize },

    /// The trailing checksum does not match the frame body.
    #[error("checksum mismatch (received {received:#06x}, computed {computed:#06x})")]
    ChecksumMismatch { received: u16, computed: u16 },

    /// The checksum is valid but the frame has the wrong size for its kind.
    #[error("{kind} frame has {actual} bytes, expected {expected}")]
    LengthMismatch {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The opcode byte does not name a known command frame.
    #[error("unknown opcode {0}")]
    UnknownOpcode(u8),
}

pub type Result<T> = std::result::Result<T, FrameError>;

/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload contains the frame delimiter and cannot be framed
    /// unambiguously.
    #[error("payload contains frame delimiter at byte {at}")]
    DelimiterInPayload { at: usize },

    /// A frame (or the bytes buffered while waiting for a delimiter)
    /// exceeds the configured maximum size.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;

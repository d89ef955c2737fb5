/// Errors surfaced by session calls.
///
/// Failures inside the worker are never raised here; they reach the caller
/// through the event stream.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// `start()` was already called on this session.
    #[error("session already started")]
    AlreadyStarted,

    /// `send()` outside the Connected state. Payloads are not queued
    /// before connect or after termination.
    #[error("session not connected")]
    NotConnected,

    /// The payload cannot be framed.
    #[error("frame error: {0}")]
    Frame(#[from] serlink_frame::FrameError),
}

pub type Result<T> = std::result::Result<T, SessionError>;

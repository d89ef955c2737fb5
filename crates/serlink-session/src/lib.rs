//! Session engine driving one point-to-point link.
//!
//! This is the "just works" layer. A [`Session`] owns a single connection
//! attempt plus its I/O loop: a dedicated worker thread connects, reads
//! and reassembles inbound frames, drains outbound sends, and reports
//! lifecycle transitions — all through one ordered [`SessionEvent`] stream,
//! so the caller never blocks on link I/O.

pub mod error;
pub mod event;
pub mod session;

pub use error::{Result, SessionError};
pub use event::{EventSink, SessionEvent};
pub use session::{Session, SessionConfig, SessionState};

use std::io;

use crate::error::Result;

/// A connected duplex byte-stream link.
///
/// This is the fundamental I/O contract the session worker drives. Reads
/// are poll-style so the worker can interleave them with outbound writes
/// and cancellation checks; writes may block until the link accepts the
/// bytes.
pub trait LinkStream: Send {
    /// Read whatever bytes are currently available into `buf`.
    ///
    /// Returns `Ok(0)` when nothing is pending. Must not block
    /// indefinitely waiting for data.
    fn poll_read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write all of `bytes` to the link. May block.
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Whether the link still has usable read/write handles.
    fn is_open(&self) -> bool;

    /// Release the link and its underlying resources.
    ///
    /// Idempotent. Close failures are logged, not surfaced.
    fn close(&mut self);
}

/// Opens a [`LinkStream`] to a remote endpoint named by an opaque address.
///
/// `connect` may block for the duration of the underlying handshake, so it
/// must only be called from a context that can afford to wait (the session
/// worker, in practice).
pub trait Connector: Send {
    type Stream: LinkStream;

    fn connect(&self, address: &str) -> Result<Self::Stream>;
}

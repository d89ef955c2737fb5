//! Delimiter-based message framing for serial links.
//!
//! Every message is a run of bytes terminated by a single newline. No
//! length prefix, no checksum, no escaping — the peer device must apply
//! the same framing on its side of the link. The codec turns a fragmented
//! inbound byte stream back into complete messages and appends exactly one
//! delimiter per outbound message.

pub mod codec;
pub mod error;

pub use codec::{
    decode_frame, encode_frame, Frame, FrameCodec, Frames, DEFAULT_MAX_FRAME, DELIMITER,
};
pub use error::{FrameError, Result};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Frame boundary marker on the wire.
pub const DELIMITER: u8 = b'\n';

/// Default maximum frame size: 64 KiB.
pub const DEFAULT_MAX_FRAME: usize = 64 * 1024;

/// One complete application message.
///
/// The payload never contains the delimiter. Consecutive delimiters on the
/// wire decode to empty frames, which are delivered as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub payload: Bytes,
}

impl Frame {
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// Payload as UTF-8 text, if it is valid UTF-8.
    pub fn as_text(&self) -> Option<&str> {
        std::str::from_utf8(self.payload.as_ref()).ok()
    }
}

/// Encode a payload into the wire format.
///
/// Appends the payload plus exactly one delimiter byte to `dst`. Rejects
/// payloads that already contain the delimiter, since the framing would be
/// ambiguous on the receiving side.
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if let Some(at) = payload.iter().position(|&b| b == DELIMITER) {
        return Err(FrameError::DelimiterInPayload { at });
    }
    dst.reserve(payload.len() + 1);
    dst.put_slice(payload);
    dst.put_u8(DELIMITER);
    Ok(())
}

/// Decode the next complete frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a delimiter yet.
/// On success, consumes the frame bytes and the delimiter from the buffer.
pub fn decode_frame(src: &mut BytesMut, max_frame: usize) -> Result<Option<Frame>> {
    match src.iter().position(|&b| b == DELIMITER) {
        Some(at) => {
            if at > max_frame {
                return Err(FrameError::FrameTooLarge {
                    size: at,
                    max: max_frame,
                });
            }
            let payload = src.split_to(at).freeze();
            src.advance(1);
            Ok(Some(Frame { payload }))
        }
        None => {
            if src.len() > max_frame {
                return Err(FrameError::FrameTooLarge {
                    size: src.len(),
                    max: max_frame,
                });
            }
            Ok(None)
        }
    }
}

/// Accumulates raw link bytes and yields complete frames.
///
/// Handles fragmentation internally — callers feed whatever the link had
/// pending and always get back complete frames, with any trailing partial
/// frame buffered for the next feed.
#[derive(Debug)]
pub struct FrameCodec {
    buf: BytesMut,
    max_frame: usize,
}

impl FrameCodec {
    /// Create a codec with the default maximum frame size.
    pub fn new() -> Self {
        Self::with_max_frame(DEFAULT_MAX_FRAME)
    }

    /// Create a codec with an explicit maximum frame size.
    pub fn with_max_frame(max_frame: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            max_frame,
        }
    }

    /// Append bytes and drain the complete frames they unlock.
    ///
    /// The returned iterator is lazy and finite: it yields each complete
    /// frame in arrival order and stops at the first partial frame, which
    /// stays buffered. An oversized frame (or an oversized partial) yields
    /// one `Err` and fuses the iterator.
    pub fn feed(&mut self, bytes: &[u8]) -> Frames<'_> {
        self.buf.extend_from_slice(bytes);
        Frames {
            codec: self,
            failed: false,
        }
    }

    /// Bytes currently buffered while waiting for a delimiter.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// Lazy iterator over the complete frames unlocked by a feed call.
#[derive(Debug)]
pub struct Frames<'a> {
    codec: &'a mut FrameCodec,
    failed: bool,
}

impl Iterator for Frames<'_> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match decode_frame(&mut self.codec.buf, self.codec.max_frame) {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => None,
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

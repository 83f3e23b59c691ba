//! Frame classification shared by the compressor and decompressor.

use crate::protocol::{Frame, OpCode};

/// Text or binary frame: the first frame of a message.
#[inline]
#[must_use]
pub fn is_data_frame(frame: &Frame) -> bool {
    frame.opcode.is_message_start()
}

/// First frame of a message that the peer compressed.
#[inline]
#[must_use]
pub fn is_compressed_data_frame(frame: &Frame) -> bool {
    is_data_frame(frame) && frame.rsv1
}

#[inline]
#[must_use]
pub fn is_continuation_frame(frame: &Frame) -> bool {
    frame.opcode == OpCode::Continuation
}

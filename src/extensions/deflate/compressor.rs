//! Outbound stage: reassembles outgoing messages and compresses them.

use bytes::BytesMut;
use tracing::{trace, warn};

use crate::config::ContextConfig;
use crate::error::{Error, Result};
use crate::extensions::FrameStage;
use crate::extensions::deflate::context::{Deflater, FlateDeflater};
use crate::protocol::{Frame, OpCode, is_continuation_frame, is_data_frame};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Accumulating(OpCode),
}

/// Compresses each outgoing message into a single RSV1 frame.
///
/// Data frames are held until the frame with FIN arrives, then the whole
/// message is deflated and emitted as one final frame carrying the
/// message's opcode and the last frame's mask key. Control frames pass
/// straight through, including when they interleave a fragmented message.
pub struct MessageCompressor<D: Deflater = FlateDeflater> {
    deflater: D,
    config: ContextConfig,
    state: State,
    buffer: BytesMut,
}

impl MessageCompressor<FlateDeflater> {
    /// Create a compressor backed by zlib.
    pub fn new(config: ContextConfig) -> Self {
        Self::with_deflater(FlateDeflater::new(config), config)
    }
}

impl<D: Deflater> MessageCompressor<D> {
    /// Create a compressor over any [`Deflater`].
    pub fn with_deflater(deflater: D, config: ContextConfig) -> Self {
        Self {
            deflater,
            config,
            state: State::Idle,
            buffer: BytesMut::new(),
        }
    }

    /// Whether a fragmented message is waiting for its final frame.
    pub fn is_accumulating(&self) -> bool {
        matches!(self.state, State::Accumulating(_))
    }

    pub fn deflater(&self) -> &D {
        &self.deflater
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.state = State::Idle;
    }

    fn append(&mut self, payload: &[u8]) -> Result<()> {
        let size = self.buffer.len() + payload.len();
        if let Err(err) = self.config.check_message_size(size) {
            self.reset();
            return Err(err);
        }
        self.buffer.extend_from_slice(payload);
        Ok(())
    }
}

impl<D: Deflater> FrameStage for MessageCompressor<D> {
    fn process(&mut self, frame: Frame) -> Result<Option<Frame>> {
        let opcode = if is_data_frame(&frame) {
            if frame.rsv1 {
                self.reset();
                return Err(Error::ProtocolViolation(
                    "RSV1 already set on outgoing data frame".into(),
                ));
            }
            if let State::Accumulating(previous) = self.state {
                warn!(%previous, "new message started before FIN, discarding partial message");
            }
            self.buffer.clear();
            frame.opcode
        } else if is_continuation_frame(&frame) {
            match self.state {
                State::Accumulating(opcode) => opcode,
                State::Idle => {
                    return Err(Error::ProtocolViolation(
                        "Unexpected continuation frame".into(),
                    ));
                }
            }
        } else {
            return Ok(Some(frame));
        };

        self.state = State::Accumulating(opcode);
        self.append(frame.payload())?;
        if !frame.fin {
            return Ok(None);
        }

        self.state = State::Idle;
        let payload = self.buffer.split().freeze();

        let mut out = if payload.is_empty() {
            Frame::new(true, opcode, Vec::new())
        } else {
            let compressed = self.deflater.compress(&payload, true)?;
            trace!(%opcode, original = payload.len(), compressed = compressed.len(), "message compressed");
            Frame::new(true, opcode, compressed).with_rsv1(true)
        };
        out.mask = frame.mask;
        Ok(Some(out))
    }

    fn close(&mut self) {
        self.reset();
        self.deflater.end();
    }
}

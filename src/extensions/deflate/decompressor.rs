//! Inbound stage: reassembles compressed messages and inflates them.

use bytes::BytesMut;
use tracing::{debug, trace, warn};

use crate::config::ContextConfig;
use crate::error::{Error, Result};
use crate::extensions::FrameStage;
use crate::extensions::deflate::context::{DEFLATE_TRAILER, FlateInflater, Inflater};
use crate::message::CloseCode;
use crate::protocol::{
    Frame, OpCode, apply_mask_fast, is_compressed_data_frame, is_continuation_frame,
    is_data_frame,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    ReceivingCompressed(OpCode),
}

/// Inflates incoming RSV1 messages into a single final frame.
///
/// Incoming payloads are expected already unmasked. A message that starts
/// with RSV1 is collected until FIN, the sync-flush trailer is put back,
/// and the inflated payload is emitted with RSV1 cleared. When re-masking
/// is enabled the frame's mask key is applied to the inflated bytes, so
/// the forwarded payload stays consistent with the `mask` field.
///
/// The emitted frame always carries the message opcode and RSV1 clear,
/// also for an empty compressed message, since RSV1 belongs to this
/// extension and the downstream sees a whole message. RSV2, RSV3 and the
/// mask key are taken from the frame that carried FIN.
///
/// Uncompressed messages and control frames pass through untouched.
pub struct MessageDecompressor<I: Inflater = FlateInflater> {
    inflater: I,
    config: ContextConfig,
    remask: bool,
    state: State,
    buffer: BytesMut,
}

impl MessageDecompressor<FlateInflater> {
    /// Create a decompressor backed by zlib.
    pub fn new(config: ContextConfig, remask: bool) -> Self {
        Self::with_inflater(FlateInflater::new(config), config, remask)
    }
}

impl<I: Inflater> MessageDecompressor<I> {
    /// Create a decompressor over any [`Inflater`].
    pub fn with_inflater(inflater: I, config: ContextConfig, remask: bool) -> Self {
        Self {
            inflater,
            config,
            remask,
            state: State::Idle,
            buffer: BytesMut::new(),
        }
    }

    /// Whether a compressed message is waiting for its final frame.
    pub fn is_receiving(&self) -> bool {
        matches!(self.state, State::ReceivingCompressed(_))
    }

    pub fn inflater(&self) -> &I {
        &self.inflater
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.state = State::Idle;
    }

    fn fail(&mut self, err: Error) -> Error {
        self.reset();
        err
    }

    fn passthrough(&mut self, frame: Frame) -> Frame {
        if frame.opcode == OpCode::Close && self.config.no_context_takeover {
            debug!(
                code = ?CloseCode::from_close_payload(frame.payload()),
                "close received, ending inflate context"
            );
            self.inflater.end();
        }
        frame
    }
}

impl<I: Inflater> FrameStage for MessageDecompressor<I> {
    fn process(&mut self, frame: Frame) -> Result<Option<Frame>> {
        if frame.opcode.is_control() && frame.rsv1 {
            return Err(self.fail(Error::ProtocolViolation(
                "RSV1 set on control frame".into(),
            )));
        }

        let opcode = if is_compressed_data_frame(&frame) {
            if let State::ReceivingCompressed(previous) = self.state {
                warn!(%previous, "new compressed message before FIN, discarding partial message");
            }
            self.buffer.clear();
            frame.opcode
        } else if let (true, State::ReceivingCompressed(opcode)) =
            (is_continuation_frame(&frame), self.state)
        {
            if frame.rsv1 {
                return Err(self.fail(Error::ProtocolViolation(
                    "RSV1 set on continuation frame".into(),
                )));
            }
            opcode
        } else {
            if let (true, State::ReceivingCompressed(pending)) =
                (is_data_frame(&frame), self.state)
            {
                warn!(
                    %pending,
                    opcode = %frame.opcode,
                    "uncompressed data frame inside compressed message"
                );
            }
            return Ok(Some(self.passthrough(frame)));
        };

        self.state = State::ReceivingCompressed(opcode);
        let size = self.buffer.len() + frame.payload().len();
        if let Err(err) = self.config.check_message_size(size) {
            return Err(self.fail(err));
        }
        self.buffer.extend_from_slice(frame.payload());
        if !frame.fin {
            return Ok(None);
        }

        self.state = State::Idle;
        let mut compressed = self.buffer.split();

        let mut out = if compressed.is_empty() {
            Frame::new(true, opcode, Vec::new())
        } else {
            compressed.extend_from_slice(&DEFLATE_TRAILER);
            let mut payload = self.inflater.decompress(&compressed)?;
            trace!(%opcode, compressed = compressed.len(), inflated = payload.len(), "message decompressed");

            if let (true, Some(mask)) = (self.remask, frame.mask) {
                apply_mask_fast(&mut payload, mask);
            }
            Frame::new(true, opcode, payload)
        };
        out.rsv2 = frame.rsv2;
        out.rsv3 = frame.rsv3;
        out.mask = frame.mask;
        Ok(Some(out))
    }

    fn close(&mut self) {
        self.reset();
        self.inflater.end();
    }
}

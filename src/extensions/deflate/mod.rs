//! Permessage-deflate WebSocket compression extension (RFC 7692).
//!
//! [`PerMessageDeflate`] is the per-connection session: it owns one
//! [`MessageCompressor`] for frames being sent and one
//! [`MessageDecompressor`] for frames being received, each with its own
//! compression context. Parameters come from an already agreed
//! [`DeflateConfig`]; the handshake itself is the caller's business.
//!
//! ```rust,ignore
//! use rsws_deflate::{DeflateConfig, PerMessageDeflate, Role};
//!
//! let mut pmd = PerMessageDeflate::new(Role::Server, &DeflateConfig::default());
//! if let Some(frame) = pmd.encode(outgoing)? {
//!     transport.send(frame)?;
//! }
//! pmd.close();
//! ```

pub mod compressor;
pub mod context;
pub mod decompressor;

pub use compressor::MessageCompressor;
pub use context::{DEFLATE_TRAILER, Deflater, FlateDeflater, FlateInflater, Inflater};
pub use decompressor::MessageDecompressor;

use tracing::debug;

use crate::config::DeflateConfig;
use crate::error::Result;
use crate::extensions::{FrameStage, RsvBits};
use crate::protocol::Frame;
use crate::role::Role;

/// Registered extension token.
pub const EXTENSION_NAME: &str = "permessage-deflate";

/// Per-connection permessage-deflate session.
pub struct PerMessageDeflate<D: Deflater = FlateDeflater, I: Inflater = FlateInflater> {
    role: Role,
    compressor: MessageCompressor<D>,
    decompressor: MessageDecompressor<I>,
    closed: bool,
}

impl PerMessageDeflate {
    /// Create a zlib-backed session for one side of a connection.
    pub fn new(role: Role, config: &DeflateConfig) -> Self {
        let outbound = config.outbound(role);
        let inbound = config.inbound(role);
        Self::with_contexts(
            role,
            config,
            FlateDeflater::new(outbound),
            FlateInflater::new(inbound),
        )
    }
}

impl<D: Deflater, I: Inflater> PerMessageDeflate<D, I> {
    /// Create a session over caller-supplied compression contexts.
    pub fn with_contexts(role: Role, config: &DeflateConfig, deflater: D, inflater: I) -> Self {
        debug!(%role, ?config, "permessage-deflate session created");
        Self {
            role,
            compressor: MessageCompressor::with_deflater(deflater, config.outbound(role)),
            decompressor: MessageDecompressor::with_inflater(
                inflater,
                config.inbound(role),
                config.remask_inbound,
            ),
            closed: false,
        }
    }

    pub fn name(&self) -> &'static str {
        EXTENSION_NAME
    }

    pub fn rsv_bits(&self) -> RsvBits {
        RsvBits::RSV1
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn compressor(&self) -> &MessageCompressor<D> {
        &self.compressor
    }

    pub fn decompressor(&self) -> &MessageDecompressor<I> {
        &self.decompressor
    }

    /// Pass an outgoing frame through the compressor.
    ///
    /// # Errors
    ///
    /// See [`FrameStage::process`].
    pub fn encode(&mut self, frame: Frame) -> Result<Option<Frame>> {
        self.compressor.process(frame)
    }

    /// Pass an incoming frame through the decompressor.
    ///
    /// # Errors
    ///
    /// See [`FrameStage::process`].
    pub fn decode(&mut self, frame: Frame) -> Result<Option<Frame>> {
        self.decompressor.process(frame)
    }

    /// Tear down both directions. Later calls do nothing.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.compressor.close();
        self.decompressor.close();
        debug!(role = %self.role, "permessage-deflate session closed");
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

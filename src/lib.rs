//! # rsws-deflate - Permessage-deflate for RFC 6455 WebSocket pipelines
//!
//! `rsws-deflate` implements the permessage-deflate extension (RFC 7692)
//! as a pair of frame stages that slot into a WebSocket frame pipeline.
//!
//! ## Features
//!
//! - **Whole-message compression**: fragmented outgoing messages are
//!   compressed and re-emitted as a single RSV1 frame
//! - **Context takeover** per direction, or a fresh codec per message
//! - **RFC 7692 wire format**: raw deflate, sync-flush trailer stripped on
//!   send and restored on receive
//! - **Deterministic cleanup**: codec sessions are released when a message
//!   finishes (no context takeover) or when the connection closes
//! - **Pluggable codecs** through the [`Deflater`] / [`Inflater`] traits
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rsws_deflate::{DeflateConfig, PerMessageDeflate, Role};
//!
//! let config = DeflateConfig::new().client_no_context_takeover(true);
//! let mut pmd = PerMessageDeflate::new(Role::Client, &config);
//!
//! let frame = pmd.encode(Frame::text("hello"))?;
//! ```

pub mod config;
pub mod error;
pub mod extensions;
pub mod message;
pub mod protocol;
pub mod role;

pub use config::{ContextConfig, DeflateConfig};
pub use error::{Error, Result};
pub use extensions::deflate::{
    Deflater, FlateDeflater, FlateInflater, Inflater, MessageCompressor, MessageDecompressor,
    PerMessageDeflate,
};
pub use extensions::{ExtensionParam, FrameStage, RsvBits};
pub use message::CloseCode;
pub use protocol::{Frame, OpCode};
pub use role::Role;

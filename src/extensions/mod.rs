//! WebSocket extension plumbing (RFC 6455 Section 9).
//!
//! An extension sits in the frame pipeline as a pair of [`FrameStage`]s:
//! one transforming frames before they are sent, one transforming frames
//! after they are received. A stage may hold frames back (for example
//! while a fragmented message accumulates), so it yields zero or one
//! frame per input frame.
//!
//! # Example
//!
//! ```rust,ignore
//! use rsws_deflate::extensions::FrameStage;
//!
//! for frame in incoming {
//!     if let Some(frame) = stage.process(frame)? {
//!         deliver(frame);
//!     }
//! }
//! stage.close();
//! ```

pub mod deflate;

use std::fmt;

use crate::error::Result;
use crate::protocol::Frame;

/// Represents a single extension parameter.
///
/// For example `client_max_window_bits=15` or `server_no_context_takeover`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionParam {
    /// Parameter name (e.g., "client_max_window_bits").
    pub name: String,
    /// Optional parameter value. None for boolean parameters.
    pub value: Option<String>,
}

impl ExtensionParam {
    /// Create a new parameter with a value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    /// Create a boolean/flag parameter (no value).
    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    /// Parse a single parameter (e.g., `param=value`, `param="value"` or `param`).
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if let Some((name, value)) = s.split_once('=') {
            Self::new(name.trim(), value.trim().trim_matches('"'))
        } else {
            Self::flag(s)
        }
    }

    /// Parse the parameters of one agreed extension entry.
    ///
    /// `permessage-deflate; client_max_window_bits=10` yields the name and
    /// one parameter.
    pub fn parse_entry(entry: &str) -> (String, Vec<Self>) {
        let mut parts = entry.split(';');
        let name = parts.next().unwrap_or_default().trim().to_string();
        let params = parts
            .filter(|p| !p.trim().is_empty())
            .map(Self::parse)
            .collect();
        (name, params)
    }
}

impl fmt::Display for ExtensionParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => write!(f, "{}={}", self.name, v),
            None => write!(f, "{}", self.name),
        }
    }
}

/// RSV bit usage declaration for extensions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RsvBits {
    pub rsv1: bool,
    pub rsv2: bool,
    pub rsv3: bool,
}

impl RsvBits {
    /// RSV1 only (used by permessage-deflate).
    pub const RSV1: Self = Self {
        rsv1: true,
        rsv2: false,
        rsv3: false,
    };
}

/// One direction of an extension's frame transformation.
///
/// Frames are fed strictly in order, one at a time, by the single task
/// that owns the connection; stages hold per-connection state and are
/// never shared.
pub trait FrameStage: Send {
    /// Process one frame.
    ///
    /// Returns `Ok(None)` when the frame was absorbed into a pending
    /// message and nothing is ready to forward yet.
    ///
    /// # Errors
    ///
    /// Any error is terminal: the connection must be failed with
    /// [`Error::close_code`](crate::Error::close_code) and no further
    /// frames passed to this stage.
    fn process(&mut self, frame: Frame) -> Result<Option<Frame>>;

    /// Release codec resources at connection teardown.
    ///
    /// Discards any partially accumulated message. Calling it twice is
    /// harmless.
    fn close(&mut self);
}

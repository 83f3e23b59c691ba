//! Close status codes (RFC 6455 Section 7.4) relevant to the extension.

/// WebSocket close status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum CloseCode {
    /// Normal closure (1000).
    #[default]
    Normal,
    /// Protocol error (1002). Sent when a compressed stream cannot be processed.
    ProtocolError,
    /// Message too big (1009). Sent when an inflated message exceeds the limit.
    MessageTooBig,
    /// Any other code.
    Other(u16),
}

impl CloseCode {
    /// Create a `CloseCode` from its numeric value.
    #[must_use]
    pub const fn from_u16(code: u16) -> Self {
        match code {
            1000 => CloseCode::Normal,
            1002 => CloseCode::ProtocolError,
            1009 => CloseCode::MessageTooBig,
            other => CloseCode::Other(other),
        }
    }

    /// Get the numeric value of this close code.
    #[must_use]
    pub const fn as_u16(&self) -> u16 {
        match self {
            CloseCode::Normal => 1000,
            CloseCode::ProtocolError => 1002,
            CloseCode::MessageTooBig => 1009,
            CloseCode::Other(code) => *code,
        }
    }

    /// Read the status code from an (unmasked) close frame payload.
    ///
    /// Returns `None` for an empty payload, which carries no status.
    #[must_use]
    pub fn from_close_payload(payload: &[u8]) -> Option<Self> {
        match payload {
            [hi, lo, ..] => Some(Self::from_u16(u16::from_be_bytes([*hi, *lo]))),
            _ => None,
        }
    }
}

impl std::fmt::Display for CloseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

//! Configuration for the permessage-deflate extension.
//!
//! [`DeflateConfig`] holds the agreed parameters for both directions of a
//! connection. [`ContextConfig`] is the slice of it that one compression
//! context needs, selected by [`DeflateConfig::outbound`] and
//! [`DeflateConfig::inbound`] for a given [`Role`].

use crate::error::{Error, Result};
use crate::extensions::ExtensionParam;
use crate::role::Role;

/// Smallest LZ77 window RFC 7692 allows to be negotiated.
pub const MIN_WINDOW_BITS: u8 = 8;
/// Largest LZ77 window (32 KB).
pub const MAX_WINDOW_BITS: u8 = 15;
/// Window used when no `*_max_window_bits` parameter was agreed.
pub const DEFAULT_WINDOW_BITS: u8 = 15;
/// zlib default compression level.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;
/// Default cap on a reassembled or inflated message: 64 MB.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 64 * 1024 * 1024;

fn check_window_bits(name: &str, bits: u8) -> Result<u8> {
    if !(MIN_WINDOW_BITS..=MAX_WINDOW_BITS).contains(&bits) {
        return Err(Error::InvalidExtension(format!(
            "{} must be {}-{}, got {}",
            name, MIN_WINDOW_BITS, MAX_WINDOW_BITS, bits
        )));
    }
    Ok(bits)
}

/// Settings for a single compression context (one direction).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextConfig {
    /// Reset the codec history at the start of every message.
    pub no_context_takeover: bool,
    /// LZ77 window size in bits (8-15).
    pub max_window_bits: u8,
    /// Deflate level (0-9). Ignored by inflaters.
    pub compression_level: u32,
    /// Upper bound on the uncompressed message size.
    pub max_message_size: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            no_context_takeover: false,
            max_window_bits: DEFAULT_WINDOW_BITS,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

impl ContextConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn no_context_takeover(mut self, value: bool) -> Self {
        self.no_context_takeover = value;
        self
    }

    /// Set the window size.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidExtension`] if `bits` is outside 8-15.
    pub fn max_window_bits(mut self, bits: u8) -> Result<Self> {
        self.max_window_bits = check_window_bits("max_window_bits", bits)?;
        Ok(self)
    }

    #[must_use]
    pub const fn max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Validate that a message size is within limits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MessageTooLarge`] if `size` exceeds the configured maximum.
    pub fn check_message_size(&self, size: usize) -> Result<()> {
        if size > self.max_message_size {
            Err(Error::MessageTooLarge {
                size,
                max: self.max_message_size,
            })
        } else {
            Ok(())
        }
    }
}

/// Agreed permessage-deflate parameters for both directions of a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeflateConfig {
    pub server_no_context_takeover: bool,
    pub client_no_context_takeover: bool,
    pub server_max_window_bits: u8,
    pub client_max_window_bits: u8,
    pub compression_level: u32,
    pub max_message_size: usize,
    /// Re-apply the frame's mask key to inflated payloads before forwarding.
    ///
    /// Downstream stages that unmask again expect this; turn it off when the
    /// consumer reads payloads as plain bytes.
    pub remask_inbound: bool,
}

impl Default for DeflateConfig {
    fn default() -> Self {
        Self {
            server_no_context_takeover: false,
            client_no_context_takeover: false,
            server_max_window_bits: DEFAULT_WINDOW_BITS,
            client_max_window_bits: DEFAULT_WINDOW_BITS,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            remask_inbound: true,
        }
    }
}

impl DeflateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn server_no_context_takeover(mut self, value: bool) -> Self {
        self.server_no_context_takeover = value;
        self
    }

    pub fn client_no_context_takeover(mut self, value: bool) -> Self {
        self.client_no_context_takeover = value;
        self
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidExtension`] if `bits` is outside 8-15.
    pub fn server_max_window_bits(mut self, bits: u8) -> Result<Self> {
        self.server_max_window_bits = check_window_bits("server_max_window_bits", bits)?;
        Ok(self)
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidExtension`] if `bits` is outside 8-15.
    pub fn client_max_window_bits(mut self, bits: u8) -> Result<Self> {
        self.client_max_window_bits = check_window_bits("client_max_window_bits", bits)?;
        Ok(self)
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidExtension`] if `level` is above 9.
    pub fn compression_level(mut self, level: u32) -> Result<Self> {
        if level > 9 {
            return Err(Error::InvalidExtension(format!(
                "compression_level must be 0-9, got {}",
                level
            )));
        }
        self.compression_level = level;
        Ok(self)
    }

    pub fn max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    pub fn remask_inbound(mut self, value: bool) -> Self {
        self.remask_inbound = value;
        self
    }

    /// Apply the final parameter list agreed during the handshake.
    ///
    /// A `*_max_window_bits` parameter without a value leaves the window
    /// at its current setting.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidExtension`] for unknown parameter names or
    /// malformed window sizes.
    pub fn apply_params(mut self, params: &[ExtensionParam]) -> Result<Self> {
        for param in params {
            match param.name.as_str() {
                "server_no_context_takeover" => {
                    self.server_no_context_takeover = true;
                }
                "client_no_context_takeover" => {
                    self.client_no_context_takeover = true;
                }
                "server_max_window_bits" => {
                    if let Some(bits) = parse_window_bits(param)? {
                        self.server_max_window_bits = bits;
                    }
                }
                "client_max_window_bits" => {
                    if let Some(bits) = parse_window_bits(param)? {
                        self.client_max_window_bits = bits;
                    }
                }
                _ => {
                    return Err(Error::InvalidExtension(format!(
                        "Unknown parameter: {}",
                        param.name
                    )));
                }
            }
        }
        Ok(self)
    }

    /// Context settings for frames this endpoint sends.
    #[must_use]
    pub fn outbound(&self, role: Role) -> ContextConfig {
        self.for_sender(role)
    }

    /// Context settings for frames this endpoint receives.
    #[must_use]
    pub fn inbound(&self, role: Role) -> ContextConfig {
        self.for_sender(role.peer())
    }

    fn for_sender(&self, sender: Role) -> ContextConfig {
        let (no_context_takeover, max_window_bits) = match sender {
            Role::Server => (self.server_no_context_takeover, self.server_max_window_bits),
            Role::Client => (self.client_no_context_takeover, self.client_max_window_bits),
        };
        ContextConfig {
            no_context_takeover,
            max_window_bits,
            compression_level: self.compression_level,
            max_message_size: self.max_message_size,
        }
    }
}

fn parse_window_bits(param: &ExtensionParam) -> Result<Option<u8>> {
    let Some(value) = param.value.as_deref() else {
        return Ok(None);
    };
    let bits: u8 = value.parse().map_err(|_| {
        Error::InvalidExtension(format!("Invalid window bits value: {}", value))
    })?;
    check_window_bits(&param.name, bits).map(Some)
}

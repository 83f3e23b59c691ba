//! Compression contexts: one live codec session per direction.
//!
//! A context owns a raw (headerless) deflate or inflate stream and decides,
//! per message, whether to keep the stream's history or start over. With
//! context takeover the session lives across messages and is only released
//! by [`Deflater::end`] / [`Inflater::end`] at connection teardown. Without
//! it, the session is created at the start of each message and released as
//! soon as the message is done.
//!
//! All buffer exchange with the codec goes through flate2's
//! `compress_vec` / `decompress_vec`, which write only into a `Vec`'s spare
//! capacity; nothing above this module sees codec buffers.

use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};
use tracing::{debug, trace};

use crate::config::{ContextConfig, MAX_WINDOW_BITS, MIN_WINDOW_BITS};
use crate::error::{Error, Result};

/// Empty stored block emitted by a sync flush; RFC 7692 strips it on the wire.
pub const DEFLATE_TRAILER: [u8; 4] = [0x00, 0x00, 0xff, 0xff];

const OUTPUT_CHUNK: usize = 4096;

/// zlib refuses raw streams with an 8-bit window; 9 bits covers 8-bit peers.
fn codec_window_bits(bits: u8) -> Result<u8> {
    if !(MIN_WINDOW_BITS..=MAX_WINDOW_BITS).contains(&bits) {
        return Err(Error::CodecInit(format!(
            "window bits must be {}-{}, got {}",
            MIN_WINDOW_BITS, MAX_WINDOW_BITS, bits
        )));
    }
    Ok(bits.max(9))
}

/// zlib asserts on levels above 9 instead of failing the init call.
fn codec_level(level: u32) -> Result<Compression> {
    if level > 9 {
        return Err(Error::CodecInit(format!(
            "compression level must be 0-9, got {}",
            level
        )));
    }
    Ok(Compression::new(level))
}

/// Outbound compression capability.
pub trait Deflater: Send {
    /// Compress one whole message with a sync flush.
    ///
    /// When `drop_trailer` is set the trailing `00 00 FF FF` is removed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CodecInit`] if no session could be opened and
    /// [`Error::IncompleteConsumption`] / [`Error::Compression`] if the codec
    /// broke its contract. The session is released on error.
    fn compress(&mut self, payload: &[u8], drop_trailer: bool) -> Result<Vec<u8>>;

    /// Release the native session, if one is live.
    fn end(&mut self);

    /// Whether a native session is currently live.
    fn is_initialized(&self) -> bool;
}

/// Inbound decompression capability.
pub trait Inflater: Send {
    /// Inflate one whole message.
    ///
    /// `payload` must already end with [`DEFLATE_TRAILER`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decompression`] for corrupt input,
    /// [`Error::MessageTooLarge`] when the output passes the configured
    /// limit, and [`Error::IncompleteConsumption`] if the codec stalls.
    /// The session is released on error.
    fn decompress(&mut self, payload: &[u8]) -> Result<Vec<u8>>;

    /// Release the native session, if one is live.
    fn end(&mut self);

    /// Whether a native session is currently live.
    fn is_initialized(&self) -> bool;
}

/// zlib-backed [`Deflater`].
pub struct FlateDeflater {
    config: ContextConfig,
    handle: Option<Compress>,
}

impl FlateDeflater {
    pub fn new(config: ContextConfig) -> Self {
        Self {
            config,
            handle: None,
        }
    }

    fn session(&mut self) -> Result<&mut Compress> {
        if self.config.no_context_takeover {
            self.end();
        }
        if self.handle.is_none() {
            let bits = codec_window_bits(self.config.max_window_bits)?;
            let level = codec_level(self.config.compression_level)?;
            debug!(window_bits = bits, level = level.level(), "deflate session started");
            self.handle = Some(Compress::new_with_window_bits(level, false, bits));
        }
        // Populated just above.
        self.handle
            .as_mut()
            .ok_or_else(|| Error::CodecInit("deflate session unavailable".into()))
    }
}

impl Deflater for FlateDeflater {
    fn compress(&mut self, payload: &[u8], drop_trailer: bool) -> Result<Vec<u8>> {
        let result = self.session().and_then(|c| deflate_sync(c, payload));
        if self.config.no_context_takeover || result.is_err() {
            self.end();
        }

        let mut output = result?;
        if !output.ends_with(&DEFLATE_TRAILER) {
            return Err(Error::Compression(
                "sync flush did not end with 00 00 FF FF".into(),
            ));
        }
        if drop_trailer {
            output.truncate(output.len() - DEFLATE_TRAILER.len());
        }
        trace!(input = payload.len(), output = output.len(), "message deflated");
        Ok(output)
    }

    fn end(&mut self) {
        if self.handle.take().is_some() {
            debug!("deflate session ended");
        }
    }

    fn is_initialized(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for FlateDeflater {
    fn drop(&mut self) {
        self.end();
    }
}

/// Feed all of `input` through the stream and sync-flush it.
fn deflate_sync(compress: &mut Compress, input: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(input.len() / 2 + OUTPUT_CHUNK);
    let start_in = compress.total_in();
    let mut consumed = 0;

    loop {
        if output.len() == output.capacity() {
            output.reserve(OUTPUT_CHUNK);
        }
        let before_in = consumed;
        let before_out = output.len();

        compress.compress_vec(&input[consumed..], &mut output, FlushCompress::Sync)?;
        consumed = (compress.total_in() - start_in) as usize;

        // zlib has finished the flush once it stops short of the buffer end.
        if consumed == input.len() && output.len() < output.capacity() {
            break;
        }
        if consumed == before_in && output.len() == before_out {
            // Flush already complete; the last call filled the buffer exactly.
            if consumed == input.len() && !output.is_empty() {
                break;
            }
            return Err(Error::IncompleteConsumption {
                consumed,
                total: input.len(),
            });
        }
    }

    if output.is_empty() && !input.is_empty() {
        return Err(Error::IncompleteConsumption {
            consumed,
            total: input.len(),
        });
    }
    Ok(output)
}

/// zlib-backed [`Inflater`].
pub struct FlateInflater {
    config: ContextConfig,
    handle: Option<Decompress>,
}

impl FlateInflater {
    pub fn new(config: ContextConfig) -> Self {
        Self {
            config,
            handle: None,
        }
    }

    fn session(&mut self) -> Result<&mut Decompress> {
        if self.config.no_context_takeover {
            self.end();
        }
        if self.handle.is_none() {
            let bits = codec_window_bits(self.config.max_window_bits)?;
            debug!(window_bits = bits, "inflate session started");
            self.handle = Some(Decompress::new_with_window_bits(false, bits));
        }
        self.handle
            .as_mut()
            .ok_or_else(|| Error::CodecInit("inflate session unavailable".into()))
    }
}

impl Inflater for FlateInflater {
    fn decompress(&mut self, payload: &[u8]) -> Result<Vec<u8>> {
        let config = self.config;
        let result = self
            .session()
            .and_then(|d| inflate_sync(d, payload, &config));

        let finished = matches!(result, Ok((_, true)));
        if config.no_context_takeover || finished || result.is_err() {
            // A final block closes the stream; the next message needs a new one.
            self.end();
        }

        let (output, _) = result?;
        trace!(input = payload.len(), output = output.len(), "message inflated");
        Ok(output)
    }

    fn end(&mut self) {
        if self.handle.take().is_some() {
            debug!("inflate session ended");
        }
    }

    fn is_initialized(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for FlateInflater {
    fn drop(&mut self) {
        self.end();
    }
}

/// Inflate all of `input`; the flag reports whether the peer ended the stream.
fn inflate_sync(
    decompress: &mut Decompress,
    input: &[u8],
    config: &ContextConfig,
) -> Result<(Vec<u8>, bool)> {
    let estimate = input.len().saturating_mul(2).min(config.max_message_size);
    let mut output = Vec::with_capacity(estimate.max(OUTPUT_CHUNK));
    let start_in = decompress.total_in();
    let mut consumed = 0;

    loop {
        if output.len() == output.capacity() {
            output.reserve(OUTPUT_CHUNK);
        }
        let before_in = consumed;
        let before_out = output.len();

        let status =
            decompress.decompress_vec(&input[consumed..], &mut output, FlushDecompress::Sync)?;
        consumed = (decompress.total_in() - start_in) as usize;
        config.check_message_size(output.len())?;

        if status == Status::StreamEnd {
            return Ok((output, true));
        }
        if consumed == input.len() && output.len() < output.capacity() {
            break;
        }
        if consumed == before_in && output.len() == before_out {
            if consumed == input.len() {
                break;
            }
            return Err(Error::IncompleteConsumption {
                consumed,
                total: input.len(),
            });
        }
    }

    Ok((output, false))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn takeover() -> ContextConfig {
        ContextConfig::default()
    }

    fn no_takeover() -> ContextConfig {
        ContextConfig::default().no_context_takeover(true)
    }

    fn with_trailer(data: &[u8]) -> Vec<u8> {
        let mut v = data.to_vec();
        v.extend_from_slice(&DEFLATE_TRAILER);
        v
    }

    #[test]
    fn test_sync_flush_ends_with_trailer() {
        let mut deflater = FlateDeflater::new(takeover());
        let raw = deflater.compress(b"Hello, WebSocket compression!", false).unwrap();
        assert!(raw.ends_with(&DEFLATE_TRAILER));

        let mut deflater = FlateDeflater::new(takeover());
        let stripped = deflater.compress(b"Hello, WebSocket compression!", true).unwrap();
        assert_eq!(stripped.len(), raw.len() - 4);
        assert_eq!(&raw[..stripped.len()], &stripped[..]);
    }

    #[test]
    fn test_rfc7692_hello_example() {
        // RFC 7692 Section 7.2.3.1: "Hello" compressed without context.
        let mut deflater = FlateDeflater::new(no_takeover());
        let compressed = deflater.compress(b"Hello", true).unwrap();

        let mut inflater = FlateInflater::new(no_takeover());
        let inflated = inflater
            .decompress(&with_trailer(&[0xf2, 0x48, 0xcd, 0xc9, 0xc9, 0x07, 0x00]))
            .unwrap();
        assert_eq!(inflated, b"Hello");

        let inflated = inflater.decompress(&with_trailer(&compressed)).unwrap();
        assert_eq!(inflated, b"Hello");
    }

    #[test]
    fn test_no_context_takeover_releases_session() {
        let mut deflater = FlateDeflater::new(no_takeover());
        let mut inflater = FlateInflater::new(no_takeover());

        let compressed = deflater.compress(b"payload", true).unwrap();
        assert!(!deflater.is_initialized());

        inflater.decompress(&with_trailer(&compressed)).unwrap();
        assert!(!inflater.is_initialized());
    }

    #[test]
    fn test_context_takeover_keeps_session() {
        let mut deflater = FlateDeflater::new(takeover());
        let mut inflater = FlateInflater::new(takeover());

        let compressed = deflater.compress(b"payload", true).unwrap();
        assert!(deflater.is_initialized());
        inflater.decompress(&with_trailer(&compressed)).unwrap();
        assert!(inflater.is_initialized());

        deflater.end();
        inflater.end();
        assert!(!deflater.is_initialized());
        assert!(!inflater.is_initialized());

        // Ending twice is a no-op.
        deflater.end();
        inflater.end();
    }

    #[test]
    fn test_takeover_shrinks_repeated_message() {
        let message = b"The quick brown fox jumps over the lazy dog, again and again.";

        let mut shared = FlateDeflater::new(takeover());
        let first = shared.compress(message, true).unwrap();
        let second = shared.compress(message, true).unwrap();
        assert!(second.len() < first.len());

        let mut inflater = FlateInflater::new(takeover());
        assert_eq!(inflater.decompress(&with_trailer(&first)).unwrap(), message);
        assert_eq!(inflater.decompress(&with_trailer(&second)).unwrap(), message);
    }

    #[test]
    fn test_large_payload_roundtrip() {
        let data: Vec<u8> = (0..200_000u32).map(|i| (i * 7 % 251) as u8).collect();

        let mut deflater = FlateDeflater::new(takeover());
        let compressed = deflater.compress(&data, true).unwrap();

        let mut inflater = FlateInflater::new(takeover());
        assert_eq!(inflater.decompress(&with_trailer(&compressed)).unwrap(), data);
    }

    #[test]
    fn test_small_windows_roundtrip() {
        for bits in [8, 9, 12] {
            let config = ContextConfig::default().max_window_bits(bits).unwrap();
            let data = b"window window window window window".repeat(50);

            let mut deflater = FlateDeflater::new(config);
            let compressed = deflater.compress(&data, true).unwrap();

            let mut inflater = FlateInflater::new(config);
            assert_eq!(inflater.decompress(&with_trailer(&compressed)).unwrap(), data);
        }
    }

    #[test]
    fn test_corrupt_input_is_error() {
        let mut inflater = FlateInflater::new(takeover());
        let result = inflater.decompress(&with_trailer(&[0xff, 0xff, 0xff, 0xff]));
        assert!(matches!(result, Err(Error::Decompression(_))));
        assert!(!inflater.is_initialized());
    }

    #[test]
    fn test_inflate_limit() {
        let data = vec![0u8; 100_000];
        let mut deflater = FlateDeflater::new(takeover());
        let compressed = deflater.compress(&data, true).unwrap();

        let mut inflater = FlateInflater::new(takeover().max_message_size(10_000));
        let result = inflater.decompress(&with_trailer(&compressed));
        assert!(matches!(
            result,
            Err(Error::MessageTooLarge { max: 10_000, .. })
        ));
    }

    #[test]
    fn test_invalid_window_is_init_error() {
        let config = ContextConfig {
            max_window_bits: 20,
            ..ContextConfig::default()
        };
        let mut deflater = FlateDeflater::new(config);
        assert!(matches!(
            deflater.compress(b"data", true),
            Err(Error::CodecInit(_))
        ));
        assert!(!deflater.is_initialized());
    }

    #[test]
    fn test_invalid_level_is_init_error() {
        let config = ContextConfig {
            compression_level: 10,
            ..ContextConfig::default()
        };
        let mut deflater = FlateDeflater::new(config);
        assert!(matches!(
            deflater.compress(b"abc", true),
            Err(Error::CodecInit(_))
        ));
        assert!(!deflater.is_initialized());

        // Levels at both ends of the range still open a session.
        for level in [0, 9] {
            let config = ContextConfig {
                compression_level: level,
                ..ContextConfig::default()
            };
            let mut deflater = FlateDeflater::new(config);
            assert!(deflater.compress(b"abc", true).is_ok());
            assert!(deflater.is_initialized());
        }
    }
}

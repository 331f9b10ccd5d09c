//! Compression codec trait and the gzip implementation.
//!
//! The pipeline only decides *when* a transform applies; the codec wraps a
//! standard container format (for gzip: magic bytes, DEFLATE payload,
//! trailer).

use bytes::Bytes;
use std::io;
use std::io::{Read, Write};

use flate2::Compression as GzipLevel;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

/// Codec trait for whole-body compression.
pub trait Codec: Send + Sync + 'static {
    /// The encoding name for HTTP headers (e.g. "gzip").
    fn name(&self) -> &'static str;

    /// Compress data.
    fn compress(&self, data: &[u8]) -> io::Result<Bytes>;

    /// Decompress data.
    fn decompress(&self, data: &[u8]) -> io::Result<Bytes>;
}

/// Gzip codec using flate2.
#[derive(Debug, Clone, Copy)]
pub struct GzipCodec {
    /// Compression level (0-9). Default is 6.
    pub level: u32,
}

impl Default for GzipCodec {
    fn default() -> Self {
        Self { level: 6 }
    }
}

impl GzipCodec {
    /// Create a new GzipCodec with the specified compression level.
    ///
    /// Level ranges from 0 (no compression) to 9 (best compression).
    pub fn with_level(level: u32) -> Self {
        Self {
            level: level.min(9),
        }
    }
}

impl Codec for GzipCodec {
    fn name(&self) -> &'static str {
        "gzip"
    }

    fn compress(&self, data: &[u8]) -> io::Result<Bytes> {
        let mut encoder = GzEncoder::new(Vec::new(), GzipLevel::new(self.level));
        encoder.write_all(data)?;
        Ok(Bytes::from(encoder.finish()?))
    }

    fn decompress(&self, data: &[u8]) -> io::Result<Bytes> {
        let mut decoder = GzDecoder::new(data);
        let mut decompressed = Vec::new();
        decoder.read_to_end(&mut decompressed)?;
        Ok(Bytes::from(decompressed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sniff::is_gzip;

    #[test]
    fn test_gzip_codec_compress_decompress() {
        let codec = GzipCodec::default();
        assert_eq!(codec.name(), "gzip");

        let original = b"Hello, World! This is a test message.";
        let compressed = codec.compress(original).unwrap();
        assert_ne!(&compressed[..], &original[..]);

        let decompressed = codec.decompress(&compressed).unwrap();
        assert_eq!(&decompressed[..], &original[..]);
    }

    #[test]
    fn test_gzip_codec_output_carries_magic() {
        let codec = GzipCodec::default();
        let compressed = codec.compress(b"payload").unwrap();
        assert!(is_gzip(&compressed));
    }

    #[test]
    fn test_gzip_codec_with_level() {
        let codec = GzipCodec::with_level(9);
        assert_eq!(codec.level, 9);

        let original = b"Hello, World! This is a test message.";
        let compressed = codec.compress(original).unwrap();
        let decompressed = codec.decompress(&compressed).unwrap();
        assert_eq!(&decompressed[..], &original[..]);
    }

    #[test]
    fn test_gzip_codec_level_clamped() {
        let codec = GzipCodec::with_level(42);
        assert_eq!(codec.level, 9);
    }

    #[test]
    fn test_decompress_invalid_gzip() {
        let codec = GzipCodec::default();
        let result = codec.decompress(b"not valid gzip data");
        assert!(result.is_err());
    }
}

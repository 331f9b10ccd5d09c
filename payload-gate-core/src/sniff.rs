//! Gzip magic-number detection.

/// The two-byte gzip signature (RFC 1952).
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Check whether a body prefix carries the gzip magic number.
///
/// An upstream caller may set `Content-Encoding: gzip` without actually
/// sending gzip bytes; this sniff is the authoritative secondary check used
/// before a decoder is applied. The slice is only inspected, so the same
/// buffer can be handed downstream afterwards. A prefix shorter than two
/// bytes is reported as not gzip.
pub fn is_gzip(prefix: &[u8]) -> bool {
    prefix.len() >= 2 && prefix[0] == GZIP_MAGIC[0] && prefix[1] == GZIP_MAGIC[1]
}

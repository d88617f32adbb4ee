//! Transparent gzip compression for large remote payloads.
//!
//! Compressed blobs are recognized on read by the gzip magic bytes, so
//! the remote store never needs an out-of-band flag.

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{Read, Write};

use agro_core::{Error, Result};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Gzip the payload when it exceeds the threshold. Returns the bytes to
/// store and whether compression was applied.
pub fn maybe_compress(bytes: &[u8], threshold: usize) -> (Vec<u8>, bool) {
    if bytes.len() <= threshold {
        return (bytes.to_vec(), false);
    }
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    if encoder.write_all(bytes).is_err() {
        return (bytes.to_vec(), false);
    }
    match encoder.finish() {
        // Incompressible payloads are stored as-is.
        Ok(compressed) if compressed.len() < bytes.len() => (compressed, true),
        _ => (bytes.to_vec(), false),
    }
}

/// Reverse of [`maybe_compress`]: gunzip when the magic bytes match,
/// otherwise pass through.
pub fn decompress_if_needed(bytes: Vec<u8>) -> Result<Vec<u8>> {
    if bytes.len() < 2 || bytes[..2] != GZIP_MAGIC {
        return Ok(bytes);
    }
    let mut decoder = GzDecoder::new(bytes.as_slice());
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| Error::cache_backend(format!("corrupt compressed payload: {e}")))?;
    Ok(out)
}

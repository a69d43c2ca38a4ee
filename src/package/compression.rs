//! Blob compression
//!
//! zlib via `flate2`. A blob is stored compressed only when that makes it
//! strictly smaller; otherwise it is stored raw.

use std::io::{self, Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::memory::ByteArena;

/// Upper bound on deflate's expansion ratio
///
/// A deflate block can encode at most 258 bytes per 2-bit code, about
/// 1032:1. zlib adds a 2-byte header and a 4-byte trailer.
const MAX_EXPANSION: u64 = 1032;

/// Compression method of a package entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CompressionMethod {
    /// Stored as is
    None = 0,
    /// zlib stream (RFC 1950)
    Zlib = 1,
}

impl CompressionMethod {
    /// Convert from the stored method id
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(CompressionMethod::None),
            1 => Some(CompressionMethod::Zlib),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            CompressionMethod::None => "none",
            CompressionMethod::Zlib => "zlib",
        }
    }
}

/// Deflate `data` at `level`, returning the result only if it is smaller
pub fn compress_if_beneficial(data: &[u8], level: u32) -> Option<Vec<u8>> {
    if data.is_empty() {
        return None;
    }
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), Compression::new(level));
    encoder.write_all(data).ok()?;
    let compressed = encoder.finish().ok()?;
    (compressed.len() < data.len()).then_some(compressed)
}

/// Decode a stored blob into an arena of exactly `expected_size` bytes
///
/// Output that is shorter or longer than `expected_size` is
/// `InvalidData`.
pub fn decompress(data: &[u8], method: CompressionMethod, expected_size: u64) -> io::Result<ByteArena> {
    let size = usize::try_from(expected_size)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "entry does not fit in memory"))?;
    match method {
        CompressionMethod::None => {
            if data.len() != size {
                return Err(size_mismatch(size, data.len()));
            }
            Ok(ByteArena::from_slice(data))
        }
        CompressionMethod::Zlib => {
            // Claimed sizes come from an untrusted index; never allocate more
            // than the stream could possibly decode to
            let limit = max_decoded_size(data.len() as u64);
            if expected_size > limit {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "claimed size {} exceeds the {} bytes a {}-byte stream can hold",
                        expected_size,
                        limit,
                        data.len()
                    ),
                ));
            }
            let mut output = ByteArena::with_size(size);
            let mut decoder = ZlibDecoder::new(data);
            let mut filled = 0;
            while filled < size {
                match decoder.read(&mut output[filled..]) {
                    Ok(0) => return Err(size_mismatch(size, filled)),
                    Ok(n) => filled += n,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e),
                }
            }
            let mut extra = [0u8; 1];
            if decoder.read(&mut extra)? != 0 {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("decoded data exceeds {} bytes", size),
                ));
            }
            Ok(output)
        }
    }
}

/// Largest output a zlib stream of `stored` bytes can decode to
pub fn max_decoded_size(stored: u64) -> u64 {
    stored.saturating_mul(MAX_EXPANSION).saturating_add(MAX_EXPANSION)
}

fn size_mismatch(expected: usize, actual: usize) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("expected {} decoded bytes, got {}", expected, actual),
    )
}

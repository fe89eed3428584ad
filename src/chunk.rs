//! Zlib chunk framing for the compressed body.
//!
//! Everything after the plain-text header is stored as a sequence of
//! independently deflated chunks, each preceded by a fixed-layout chunk
//! header. Both length fields in the chunk header are written twice; the
//! duplicates must agree, and the inflated size must match the declared
//! uncompressed length exactly.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::cursor::Cursor;
use crate::error::{Error, Result};

/// Package-level magic opening every chunk header.
pub const PACKAGE_MAGIC: u32 = 0x9E2A_83C1;
/// Secondary magic following the package magic.
pub const CHUNK_MAGIC: u32 = 0x2222_2222;
/// Compression format selector; 3 is zlib.
pub const FORMAT_TAG: u32 = 3;
/// Uncompressed payload cap per chunk.
pub const MAX_CHUNK_SIZE: u64 = 131_072;

/// Read the duplicated compressed/uncompressed length pair of one chunk.
fn read_length_pair(c: &mut Cursor) -> Result<(u64, u64)> {
    let compressed = c.read_u64()?;
    let uncompressed = c.read_u64()?;
    Ok((compressed, uncompressed))
}

/// Inflate every chunk in `data` and concatenate the results.
pub fn decompress_chunks(data: &[u8]) -> Result<Vec<u8>> {
    let mut c = Cursor::new(data);
    let mut out = Vec::new();
    while !c.is_empty() {
        let chunk_offset = c.position();
        c.expect_u32(PACKAGE_MAGIC, "chunk package magic")?;
        c.expect_u32(CHUNK_MAGIC, "chunk magic")?;
        c.expect_u8(0, "chunk reserved byte")?;
        // Historical field; files in the wild always carry the default cap
        // but a chunk may legally inflate past it, so it is not validated
        // against the lengths below.
        let _max_chunk = c.read_u64()?;
        c.expect_u32(FORMAT_TAG, "chunk format tag")?;

        let (compressed, uncompressed) = read_length_pair(&mut c)?;
        let (compressed2, uncompressed2) = read_length_pair(&mut c)?;
        if compressed != compressed2 {
            return Err(Error::DuplicateLengthMismatch {
                offset: chunk_offset,
                what: "compressed",
                first: compressed,
                second: compressed2,
            });
        }
        if uncompressed != uncompressed2 {
            return Err(Error::DuplicateLengthMismatch {
                offset: chunk_offset,
                what: "uncompressed",
                first: uncompressed,
                second: uncompressed2,
            });
        }

        let deflated = c.read_bytes(compressed as usize)?;
        // The declared uncompressed length is untrusted until the inflate
        // check below; cap the allocation hint rather than honoring it.
        let mut inflated = Vec::with_capacity((uncompressed as usize).min(MAX_CHUNK_SIZE as usize));
        ZlibDecoder::new(deflated)
            .read_to_end(&mut inflated)
            .map_err(|source| Error::Decompress {
                offset: chunk_offset,
                source,
            })?;
        if inflated.len() as u64 != uncompressed {
            return Err(Error::InflatedSizeMismatch {
                offset: chunk_offset,
                declared: uncompressed,
                actual: inflated.len() as u64,
            });
        }
        out.extend_from_slice(&inflated);
    }
    log::debug!("inflated body: {} bytes from {} compressed", out.len(), data.len());
    Ok(out)
}

/// Deflate `payload` into the chunked wire form, splitting at
/// [`MAX_CHUNK_SIZE`] uncompressed bytes per chunk.
pub fn compress_chunks(payload: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for chunk in payload.chunks(MAX_CHUNK_SIZE as usize) {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(chunk)
            .and_then(|_| encoder.finish())
            .map(|deflated| {
                out.extend_from_slice(&PACKAGE_MAGIC.to_le_bytes());
                out.extend_from_slice(&CHUNK_MAGIC.to_le_bytes());
                out.push(0);
                out.extend_from_slice(&MAX_CHUNK_SIZE.to_le_bytes());
                out.extend_from_slice(&FORMAT_TAG.to_le_bytes());
                let compressed = deflated.len() as u64;
                let uncompressed = chunk.len() as u64;
                for _ in 0..2 {
                    out.extend_from_slice(&compressed.to_le_bytes());
                    out.extend_from_slice(&uncompressed.to_le_bytes());
                }
                out.extend_from_slice(&deflated);
            })
            .map_err(|source| Error::Decompress {
                offset: out.len(),
                source,
            })?;
    }
    Ok(out)
}

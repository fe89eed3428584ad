//! Top-level save file orchestration.
//!
//! A file is a plain-text [`SaveHeader`] followed by the chunk-framed
//! compressed body. The body carries its own size word, two opaque
//! validation words, the five spatial grids, the named levels, the
//! persistent level and a final list of extra object references.

use crate::chunk::{compress_chunks, decompress_chunks};
use crate::cursor::{Cursor, Writer};
use crate::error::{Error, Result};
use crate::header::SaveHeader;
use crate::level::Level;
use crate::types::{decode_reference_list, encode_reference_list, Grid, ObjectReference, GRID_COUNT};

/// Non-fatal observations collected during decode.
///
/// Decode keeps its tolerances out of the data model: anything the codec
/// accepted but could not fully model is reported here so callers can
/// surface it instead of silently carrying opaque bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    /// Type paths of entities whose trailing bytes had no known shape and
    /// were preserved verbatim.
    pub unmodeled_trailing: Vec<String>,
}

/// A fully decoded save file. Re-encoding an unmodified value reproduces
/// the original bytes modulo the deflate stream (the decompressed body is
/// byte-identical).
#[derive(Debug, Clone, PartialEq)]
pub struct SaveFile {
    pub header: SaveHeader,
    /// Two opaque validation words, preserved verbatim.
    pub validation: [u32; 2],
    /// Always [`GRID_COUNT`] grids.
    pub grids: Vec<Grid>,
    /// Named levels in file order, the persistent level last.
    pub levels: Vec<Level>,
    pub extra_references: Vec<ObjectReference>,
}

impl SaveFile {
    /// Decode a complete save file.
    ///
    /// The header version gate fires before the body is even inflated, so
    /// an unsupported file fails cheaply. The inflated body must be
    /// consumed exactly; trailing bytes mean the reader and the file
    /// disagree about the format and the result cannot be trusted.
    pub fn parse(data: &[u8]) -> Result<(Self, Diagnostics)> {
        let mut c = Cursor::new(data);
        let header = SaveHeader::decode(&mut c)?;
        log::debug!(
            "header ok: session {:?}, build {}",
            header.session_name,
            header.build_version
        );

        let body = decompress_chunks(&data[c.position()..])?;
        let mut c = Cursor::new(&body);

        // The leading size word does not count itself.
        let body_size = c.read_u64()?;
        if body_size > c.remaining() as u64 {
            return Err(Error::SizeMismatch {
                context: "save body",
                declared: body_size,
                actual: c.remaining() as u64,
                offset: c.position(),
            });
        }
        c.truncate(8 + body_size as usize);

        let validation = [c.read_u32()?, c.read_u32()?];
        let mut grids = Vec::with_capacity(GRID_COUNT);
        for _ in 0..GRID_COUNT {
            grids.push(Grid::decode(&mut c)?);
        }

        let mut diag = Diagnostics::default();
        let sub_level_count = c.read_u32()? as usize;
        let mut levels = Vec::with_capacity(sub_level_count.min(4096) + 1);
        for _ in 0..sub_level_count {
            levels.push(Level::decode(&mut c, false, &mut diag)?);
        }
        levels.push(Level::decode(&mut c, true, &mut diag)?);
        log::debug!("decoded {} levels", levels.len());

        let extra_references = decode_reference_list(&mut c)?;

        let consumed = (c.position() - 8) as u64;
        if consumed != body_size {
            return Err(Error::SizeMismatch {
                context: "save body",
                declared: body_size,
                actual: consumed,
                offset: c.position(),
            });
        }

        Ok((
            Self {
                header,
                validation,
                grids,
                levels,
                extra_references,
            },
            diag,
        ))
    }

    /// Encode back to the on-disk form.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        if self.grids.len() != GRID_COUNT {
            return Err(Error::Parse {
                context: "save",
                message: format!("expected {GRID_COUNT} grids, have {}", self.grids.len()),
            });
        }
        match self.levels.last() {
            Some(last) if last.is_persistent() => {}
            _ => {
                return Err(Error::Parse {
                    context: "save",
                    message: "last level must be the persistent level".into(),
                });
            }
        }
        if self.levels[..self.levels.len() - 1]
            .iter()
            .any(Level::is_persistent)
        {
            return Err(Error::Parse {
                context: "save",
                message: "only the last level may be persistent".into(),
            });
        }

        let mut body = Writer::new();
        body.write_u64(0); // patched below
        body.write_u32(self.validation[0]);
        body.write_u32(self.validation[1]);
        for grid in &self.grids {
            grid.encode(&mut body);
        }
        body.write_u32(self.levels.len() as u32 - 1);
        for level in &self.levels {
            level.encode(&mut body)?;
        }
        encode_reference_list(&mut body, &self.extra_references);
        body.patch_u64(0, body.position() as u64 - 8);

        let mut w = Writer::with_capacity(1024);
        self.header.encode(&mut w);
        let mut out = w.into_bytes();
        out.extend_from_slice(&compress_chunks(&body.into_bytes())?);
        log::debug!("encoded save: {} bytes on disk", out.len());
        Ok(out)
    }

    /// Encode, then re-parse the output and verify it decodes to an equal
    /// value. Slower than [`SaveFile::to_bytes`]; intended for callers
    /// about to overwrite a file they care about.
    pub fn write_verified(&self) -> Result<Vec<u8>> {
        let bytes = self.to_bytes()?;
        let (reparsed, _) = Self::parse(&bytes)?;
        if reparsed != *self {
            return Err(Error::Parse {
                context: "save",
                message: "re-parse of encoded output does not match".into(),
            });
        }
        Ok(bytes)
    }

    /// The persistent level. Only absent on a hand-built value that has not
    /// been validated by [`SaveFile::to_bytes`] yet.
    pub fn persistent_level(&self) -> Option<&Level> {
        self.levels.last().filter(|l| l.is_persistent())
    }
}

use crate::error::{Error, Result};

/// Read cursor over a byte slice. All reads are little-endian.
#[derive(Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current byte position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Total length of underlying data.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether we've reached the end.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Remaining bytes from current position.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Skip `n` bytes forward.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.ensure(n)?;
        self.pos += n;
        Ok(())
    }

    /// Drop everything past `len`, keeping the current position.
    /// Used by the container layer to honor the declared body size.
    pub fn truncate(&mut self, len: usize) {
        if len < self.data.len() {
            self.data = &self.data[..len];
        }
    }

    /// Read a slice of `n` bytes without copying.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.ensure(n)?;
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        let v = self.data[self.pos];
        self.pos += 1;
        Ok(v)
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let bytes = self.read_bytes(4)?;
        Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        let bytes = self.read_bytes(8)?;
        Ok(i64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let bytes = self.read_bytes(8)?;
        Ok(u64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        let bytes = self.read_bytes(4)?;
        Ok(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        let bytes = self.read_bytes(8)?;
        Ok(f64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]))
    }

    /// Read a length-prefixed string.
    ///
    /// The prefix is a signed 32-bit count. Non-negative `n` means `n - 1`
    /// single-byte characters followed by one NUL (`0` means the empty string
    /// with no payload at all). Negative `-m` means `m` UTF-16LE code units
    /// including a trailing NUL, stored as `2 * m` bytes. The sign of the
    /// prefix is significant for round-tripping; see [`Writer::write_string`].
    pub fn read_string(&mut self) -> Result<String> {
        let offset = self.pos;
        let len = self.read_i32()?;
        if len == 0 {
            return Ok(String::new());
        }
        if len > 0 {
            let n = len as usize;
            let bytes = self.read_bytes(n)?;
            if bytes[n - 1] != 0 {
                return Err(Error::InvalidString {
                    offset,
                    encoding: "NUL-terminated ASCII",
                });
            }
            String::from_utf8(bytes[..n - 1].to_vec()).map_err(|_| Error::InvalidString {
                offset,
                encoding: "UTF-8",
            })
        } else {
            let units = len
                .checked_neg()
                .ok_or(Error::InvalidStringLength { offset, length: len })?
                as usize;
            let bytes = self.read_bytes(units * 2)?;
            let mut code_units = Vec::with_capacity(units);
            for pair in bytes.chunks_exact(2) {
                code_units.push(u16::from_le_bytes([pair[0], pair[1]]));
            }
            if code_units.pop() != Some(0) {
                return Err(Error::InvalidString {
                    offset,
                    encoding: "NUL-terminated UTF-16",
                });
            }
            String::from_utf16(&code_units).map_err(|_| Error::InvalidString {
                offset,
                encoding: "UTF-16",
            })
        }
    }

    /// Read a boolean stored as a single byte. Anything other than 0/1 is an error.
    pub fn read_bool_u8(&mut self) -> Result<bool> {
        let offset = self.pos;
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            v => Err(Error::InvalidBool {
                offset,
                found: v as u32,
            }),
        }
    }

    /// Read a boolean stored as a 4-byte integer. Anything other than 0/1 is an error.
    pub fn read_bool_u32(&mut self) -> Result<bool> {
        let offset = self.pos;
        match self.read_u32()? {
            0 => Ok(false),
            1 => Ok(true),
            v => Err(Error::InvalidBool { offset, found: v }),
        }
    }

    /// Read a u8 and fail unless it equals `expected`.
    ///
    /// Used for reserved fields whose value the format pins but never
    /// documents; a mismatch means an assumption about the format no longer
    /// holds for this file.
    pub fn expect_u8(&mut self, expected: u8, context: &'static str) -> Result<()> {
        let offset = self.pos;
        let found = self.read_u8()?;
        if found != expected {
            return Err(Error::ReservedConstant {
                context,
                expected: expected as u64,
                found: found as u64,
                offset,
            });
        }
        Ok(())
    }

    /// Read a u32 and fail unless it equals `expected`.
    pub fn expect_u32(&mut self, expected: u32, context: &'static str) -> Result<()> {
        let offset = self.pos;
        let found = self.read_u32()?;
        if found != expected {
            return Err(Error::ReservedConstant {
                context,
                expected: expected as u64,
                found: found as u64,
                offset,
            });
        }
        Ok(())
    }

    /// Read a u64 and fail unless it equals `expected`.
    pub fn expect_u64(&mut self, expected: u64, context: &'static str) -> Result<()> {
        let offset = self.pos;
        let found = self.read_u64()?;
        if found != expected {
            return Err(Error::ReservedConstant {
                context,
                expected,
                found,
                offset,
            });
        }
        Ok(())
    }

    fn ensure(&self, n: usize) -> Result<()> {
        // `n` can come straight from a wire-supplied length; the sum must
        // not be allowed to wrap.
        match self.pos.checked_add(n) {
            Some(end) if end <= self.data.len() => Ok(()),
            _ => Err(Error::UnexpectedEof {
                offset: self.pos,
                need: n,
                have: self.remaining(),
            }),
        }
    }
}

/// Writer that builds a byte buffer. All writes are little-endian.
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            buf: Vec::with_capacity(cap),
        }
    }

    pub fn position(&self) -> usize {
        self.buf.len()
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_i8(&mut self, v: i8) {
        self.buf.push(v as u8);
    }

    pub fn write_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_f32(&mut self, v: f32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_f64(&mut self, v: f64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Write a length-prefixed string, picking the encoding branch by content.
    ///
    /// Pure-ASCII text (and the empty string) takes the positive-prefix
    /// single-byte branch; anything else takes the negative-prefix UTF-16LE
    /// branch. This matches the decode convention in [`Cursor::read_string`].
    pub fn write_string(&mut self, s: &str) {
        if s.is_empty() {
            self.write_i32(0);
        } else if s.is_ascii() {
            self.write_i32(s.len() as i32 + 1);
            self.buf.extend_from_slice(s.as_bytes());
            self.buf.push(0);
        } else {
            let units: Vec<u16> = s.encode_utf16().collect();
            self.write_i32(-(units.len() as i32 + 1));
            for unit in units {
                self.buf.extend_from_slice(&unit.to_le_bytes());
            }
            self.buf.extend_from_slice(&0u16.to_le_bytes());
        }
    }

    pub fn write_bool_u8(&mut self, v: bool) {
        self.buf.push(v as u8);
    }

    pub fn write_bool_u32(&mut self, v: bool) {
        self.write_u32(v as u32);
    }

    /// Patch a u32 at a specific position (for backpatching sizes).
    pub fn patch_u32(&mut self, pos: usize, v: u32) {
        self.buf[pos..pos + 4].copy_from_slice(&v.to_le_bytes());
    }

    /// Patch an i32 at a specific position.
    pub fn patch_i32(&mut self, pos: usize, v: i32) {
        self.buf[pos..pos + 4].copy_from_slice(&v.to_le_bytes());
    }

    /// Patch a u64 at a specific position.
    pub fn patch_u64(&mut self, pos: usize, v: u64) {
        self.buf[pos..pos + 8].copy_from_slice(&v.to_le_bytes());
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn round_trip(s: &str) -> (i32, String) {
        let mut w = Writer::new();
        w.write_string(s);
        let bytes = w.into_bytes();
        let prefix = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let mut c = Cursor::new(&bytes);
        let back = c.read_string().unwrap();
        assert_eq!(c.remaining(), 0, "string codec left trailing bytes");
        (prefix, back)
    }

    #[test]
    fn ascii_string_round_trip_uses_positive_prefix() {
        let (prefix, back) = round_trip("Persistent_Level");
        assert_eq!(back, "Persistent_Level");
        assert_eq!(prefix, "Persistent_Level".len() as i32 + 1);
    }

    #[test]
    fn empty_string_has_zero_prefix_and_no_payload() {
        let mut w = Writer::new();
        w.write_string("");
        assert_eq!(w.into_bytes(), vec![0, 0, 0, 0]);
        let (prefix, back) = round_trip("");
        assert_eq!(back, "");
        assert_eq!(prefix, 0);
    }

    #[test]
    fn non_ascii_string_round_trip_uses_negative_prefix() {
        let s = "Fabrik Süd — 機械";
        let (prefix, back) = round_trip(s);
        assert_eq!(back, s);
        let units = s.encode_utf16().count() as i32;
        assert_eq!(prefix, -(units + 1));
    }

    #[test]
    fn bool_u32_rejects_junk() {
        let data = 7u32.to_le_bytes();
        let mut c = Cursor::new(&data);
        assert!(matches!(
            c.read_bool_u32(),
            Err(Error::InvalidBool { found: 7, .. })
        ));
    }

    #[test]
    fn expect_u32_reports_both_values() {
        let data = 5u32.to_le_bytes();
        let mut c = Cursor::new(&data);
        let err = c.expect_u32(0, "test reserved").unwrap_err();
        assert!(matches!(
            err,
            Error::ReservedConstant {
                expected: 0,
                found: 5,
                ..
            }
        ));
    }

    #[test]
    fn huge_read_request_is_eof_not_overflow() {
        let data = [0u8; 16];
        let mut c = Cursor::new(&data);
        c.skip(8).unwrap();
        // A length field of u64::MAX must fail the bounds check, not wrap
        // the position arithmetic.
        assert!(matches!(
            c.read_bytes(usize::MAX),
            Err(Error::UnexpectedEof {
                offset: 8,
                have: 8,
                ..
            })
        ));
    }

    #[test]
    fn reads_never_run_past_end() {
        let data = [1u8, 2];
        let mut c = Cursor::new(&data);
        assert!(matches!(c.read_u32(), Err(Error::UnexpectedEof { .. })));
        // Position is untouched by the failed read.
        assert_eq!(c.position(), 0);
    }
}

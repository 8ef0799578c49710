//! Big-endian binary codec used by the CMAF box writer and reader.
//!
//! All multi-byte integers in ISO-BMFF are big-endian; this module is the
//! single place that knowledge lives so `cmaf::boxes` never reaches for
//! `to_ne_bytes` or similar.

/// A growable big-endian byte writer.
#[derive(Debug, Default, Clone)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            buf: Vec::with_capacity(cap),
        }
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn write_i16(&mut self, v: i16) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn write_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    /// Writes a 4-byte ASCII box type ("FourCC").
    pub fn write_fourcc(&mut self, fourcc: &[u8; 4]) {
        self.buf.extend_from_slice(fourcc);
    }

    /// Writes a 16.16 fixed-point value from a `f64`.
    pub fn write_fixed_16_16(&mut self, v: f64) {
        let fixed = (v * 65536.0).round() as i32;
        self.write_i32(fixed);
    }

    /// Writes a 8.8 fixed-point value from a `f64`.
    pub fn write_fixed_8_8(&mut self, v: f64) {
        let fixed = (v * 256.0).round() as i16;
        self.write_i16(fixed);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_zeros(&mut self, n: usize) {
        self.buf.extend(std::iter::repeat(0u8).take(n));
    }

    /// Serializes a box size per §4.1: u32 unless `payload_len + 8 >= 2^32`,
    /// in which case the 64-bit large-size form (`size=1`, then `u64`) is
    /// used. `payload_len` excludes the 8-byte (or 16-byte) header itself.
    pub fn write_box_size(&mut self, header_and_payload_len: u64) {
        if header_and_payload_len > u32::MAX as u64 {
            self.write_u32(1);
        } else {
            self.write_u32(header_and_payload_len as u32);
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }
}

/// Errors from bounds-checked reads of a big-endian byte slice.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ByteReadError {
    #[error("attempted to read {needed} bytes at offset {offset}, but only {available} remain")]
    OutOfBounds {
        offset: usize,
        needed: usize,
        available: usize,
    },
    #[error("slice contains invalid UTF-8 at offset {offset}")]
    InvalidUtf8 { offset: usize },
}

/// A bounds-checked big-endian reader over a borrowed byte slice.
#[derive(Debug, Clone, Copy)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn require(&self, n: usize) -> Result<(), ByteReadError> {
        if self.remaining() < n {
            Err(ByteReadError::OutOfBounds {
                offset: self.pos,
                needed: n,
                available: self.remaining(),
            })
        } else {
            Ok(())
        }
    }

    pub fn read_u8(&mut self) -> Result<u8, ByteReadError> {
        self.require(1)?;
        let v = self.data[self.pos];
        self.pos += 1;
        Ok(v)
    }

    pub fn read_u16(&mut self) -> Result<u16, ByteReadError> {
        self.require(2)?;
        let v = u16::from_be_bytes([self.data[self.pos], self.data[self.pos + 1]]);
        self.pos += 2;
        Ok(v)
    }

    pub fn read_u32(&mut self) -> Result<u32, ByteReadError> {
        self.require(4)?;
        let v = u32::from_be_bytes(self.data[self.pos..self.pos + 4].try_into().unwrap());
        self.pos += 4;
        Ok(v)
    }

    pub fn read_u64(&mut self) -> Result<u64, ByteReadError> {
        self.require(8)?;
        let v = u64::from_be_bytes(self.data[self.pos..self.pos + 8].try_into().unwrap());
        self.pos += 8;
        Ok(v)
    }

    pub fn read_i32(&mut self) -> Result<i32, ByteReadError> {
        Ok(self.read_u32()? as i32)
    }

    pub fn read_fourcc(&mut self) -> Result<[u8; 4], ByteReadError> {
        self.require(4)?;
        let mut out = [0u8; 4];
        out.copy_from_slice(&self.data[self.pos..self.pos + 4]);
        self.pos += 4;
        Ok(out)
    }

    /// Reads `n` bytes and returns a borrowed slice, advancing the cursor.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], ByteReadError> {
        self.require(n)?;
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn skip(&mut self, n: usize) -> Result<(), ByteReadError> {
        self.require(n)?;
        self.pos += n;
        Ok(())
    }
}

/// Formats a 4-byte box type as a UTF-8 string for error messages, falling
/// back to a hex dump when the bytes aren't printable ASCII.
pub fn fourcc_to_string(fourcc: &[u8; 4]) -> String {
    if fourcc.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
        String::from_utf8_lossy(fourcc).into_owned()
    } else {
        format!("0x{:02x}{:02x}{:02x}{:02x}", fourcc[0], fourcc[1], fourcc[2], fourcc[3])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_and_reads_round_trip() {
        let mut w = ByteWriter::new();
        w.write_u32(42);
        w.write_u16(7);
        w.write_fourcc(b"ftyp");
        w.write_u64(1_000_000_000_000);
        let bytes = w.into_vec();

        let mut r = ByteReader::new(&bytes);
        assert_eq!(r.read_u32().unwrap(), 42);
        assert_eq!(r.read_u16().unwrap(), 7);
        assert_eq!(&r.read_fourcc().unwrap(), b"ftyp");
        assert_eq!(r.read_u64().unwrap(), 1_000_000_000_000);
        assert!(r.is_empty());
    }

    #[test]
    fn out_of_bounds_read_is_an_error() {
        let bytes = [0u8; 2];
        let mut r = ByteReader::new(&bytes);
        assert_eq!(
            r.read_u32(),
            Err(ByteReadError::OutOfBounds {
                offset: 0,
                needed: 4,
                available: 2
            })
        );
    }

    #[test]
    fn box_size_switches_to_large_size_form() {
        let mut w = ByteWriter::new();
        w.write_box_size(100);
        assert_eq!(w.into_vec(), 100u32.to_be_bytes());

        let mut w = ByteWriter::new();
        w.write_box_size(u32::MAX as u64 + 100);
        assert_eq!(w.into_vec(), 1u32.to_be_bytes());
    }

    #[test]
    fn fixed_point_round_trips_within_precision() {
        let mut w = ByteWriter::new();
        w.write_fixed_16_16(1.5);
        let bytes = w.into_vec();
        let raw = i32::from_be_bytes(bytes.try_into().unwrap());
        assert_eq!(raw, 1 * 65536 + 32768);
    }
}

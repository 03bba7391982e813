use std::io::{Read, Seek, SeekFrom};

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};

use crate::foundation::error::{SpriteError, SpriteResult};

/// Seekable byte source the decoders consume.
pub trait ByteSource: Read + Seek {}

impl<T: Read + Seek + ?Sized> ByteSource for T {}

/// Field-level reads that label truncation errors with the field being read.
pub(crate) trait FieldReader: Read + Seek {
    fn be_u32(&mut self, what: &str) -> SpriteResult<u32> {
        self.read_u32::<BigEndian>()
            .map_err(|e| SpriteError::from_read(e, what))
    }

    fn be_i32(&mut self, what: &str) -> SpriteResult<i32> {
        self.read_i32::<BigEndian>()
            .map_err(|e| SpriteError::from_read(e, what))
    }

    fn le_u32(&mut self, what: &str) -> SpriteResult<u32> {
        self.read_u32::<LittleEndian>()
            .map_err(|e| SpriteError::from_read(e, what))
    }

    fn le_f32(&mut self, what: &str) -> SpriteResult<f32> {
        self.read_f32::<LittleEndian>()
            .map_err(|e| SpriteError::from_read(e, what))
    }

    fn byte(&mut self, what: &str) -> SpriteResult<u8> {
        self.read_u8().map_err(|e| SpriteError::from_read(e, what))
    }

    fn array<const N: usize>(&mut self, what: &str) -> SpriteResult<[u8; N]> {
        let mut buf = [0u8; N];
        self.read_exact(&mut buf)
            .map_err(|e| SpriteError::from_read(e, what))?;
        Ok(buf)
    }

    fn bytes_exact(&mut self, len: usize, what: &str) -> SpriteResult<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_exact(&mut buf)
            .map_err(|e| SpriteError::from_read(e, what))?;
        Ok(buf)
    }

    /// Append exactly `len` bytes to `out`.
    fn append(&mut self, out: &mut Vec<u8>, len: usize, what: &str) -> SpriteResult<()> {
        let start = out.len();
        let read = Read::take(&mut *self, len as u64).read_to_end(out)?;
        if read != len {
            out.truncate(start);
            return Err(SpriteError::malformed(format!(
                "truncated stream while reading {what}"
            )));
        }
        Ok(())
    }

    /// Read a big-endian `u32`, or `None` when the stream ends cleanly before its first byte.
    fn be_u32_or_eof(&mut self, what: &str) -> SpriteResult<Option<u32>> {
        let mut buf = [0u8; 4];
        let mut filled = 0;
        while filled < buf.len() {
            match self.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => return Err(SpriteError::Io(e)),
            }
        }
        match filled {
            0 => Ok(None),
            4 => Ok(Some(u32::from_be_bytes(buf))),
            _ => Err(SpriteError::malformed(format!(
                "truncated stream while reading {what}"
            ))),
        }
    }

    /// Seek forward over `len` bytes.
    fn skip(&mut self, len: u64) -> SpriteResult<()> {
        let offset = i64::try_from(len)
            .map_err(|_| SpriteError::malformed(format!("skip length {len} too large")))?;
        self.seek(SeekFrom::Current(offset))?;
        Ok(())
    }

    /// Read and compare a fixed signature.
    fn expect_signature(&mut self, expected: &[u8; 8], format: &str) -> SpriteResult<()> {
        let sig: [u8; 8] = self.array("signature")?;
        if &sig != expected {
            return Err(SpriteError::malformed(format!(
                "bad {format} signature {sig:02x?}"
            )));
        }
        Ok(())
    }

    /// Read 256 little-endian `0xAARRGGBB` palette entries.
    fn le_palette(&mut self, what: &str) -> SpriteResult<[u32; 256]> {
        let mut palette = [0u32; 256];
        self.read_u32_into::<LittleEndian>(&mut palette)
            .map_err(|e| SpriteError::from_read(e, what))?;
        Ok(palette)
    }
}

impl<T: Read + Seek + ?Sized> FieldReader for T {}

#[cfg(test)]
#[path = "../../tests/unit/decode/reader.rs"]
mod tests;

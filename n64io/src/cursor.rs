use crate::error::*;
use byteorder::{ByteOrder, BE};

/// Sequential reader over an in-memory buffer. Every multi-byte read is
/// big-endian, whatever the host is.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// A cursor positioned at `offset`. The offset may equal the buffer
    /// length (an empty tail), but not exceed it.
    pub fn at(data: &'a [u8], offset: usize) -> Result<Self> {
        let mut cursor = Self::new(data);
        cursor.seek(offset)?;
        Ok(cursor)
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub fn seek(&mut self, offset: usize) -> Result<()> {
        if offset > self.data.len() {
            return Err(CursorError::SeekOutOfRange {
                offset,
                len: self.data.len(),
            });
        }
        self.pos = offset;
        Ok(())
    }

    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.take(count).map(|_| ())
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8]> {
        if self.remaining() < count {
            return Err(CursorError::TruncatedInput {
                offset: self.pos,
                needed: count,
                available: self.remaining(),
            });
        }
        let bytes = &self.data[self.pos..self.pos + count];
        self.pos += count;
        Ok(bytes)
    }

    pub fn peek_u8(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(BE::read_u16(self.take(2)?))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(BE::read_i16(self.take(2)?))
    }

    pub fn read_u24(&mut self) -> Result<u32> {
        Ok(BE::read_u24(self.take(3)?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(BE::read_u32(self.take(4)?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(BE::read_i32(self.take(4)?))
    }

    /// Raw byte range, no byte-order conversion.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        self.take(count)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Reads `N` raw bytes and reverses them as a whole.
    pub fn read_reversed<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut bytes = self.read_array::<N>()?;
        bytes.reverse();
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_big_endian() {
        let data = [0x42, 0x31, 0xff, 0xfe, 0x00, 0x00, 0x01, 0x00];
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(cursor.read_u16().unwrap(), 0x4231);
        assert_eq!(cursor.read_i16().unwrap(), -2);
        assert_eq!(cursor.read_u32().unwrap(), 0x100);
        assert!(cursor.is_at_end());
    }

    #[test]
    fn truncated_read_reports_position() {
        let data = [0x00, 0x01, 0x02];
        let mut cursor = ByteCursor::new(&data);
        cursor.read_u16().unwrap();
        match cursor.read_u32() {
            Err(CursorError::TruncatedInput {
                offset,
                needed,
                available,
            }) => {
                assert_eq!((offset, needed, available), (2, 4, 1));
            }
            other => panic!("unexpected {:?}", other),
        }
        // a failed read does not advance
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn reversed_blob() {
        let data = [1, 2, 3, 4];
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(cursor.read_reversed::<4>().unwrap(), [4, 3, 2, 1]);
    }

    #[test]
    fn seek_past_end_fails() {
        let data = [0u8; 4];
        assert!(ByteCursor::at(&data, 4).is_ok());
        assert!(ByteCursor::at(&data, 5).is_err());
    }
}

use byteorder::{WriteBytesExt, BE};
use std::io::{self, Write};

/// Sequential big-endian writer over any `Write` sink (a `Vec<u8>` or a
/// file handle). Multi-byte values are byte-swapped from host order as
/// they are written.
#[derive(Debug)]
pub struct ByteWriter<W> {
    inner: W,
    written: u64,
}

impl<W: Write> ByteWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    /// Number of bytes written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn write_u8(&mut self, value: u8) -> io::Result<()> {
        self.inner.write_u8(value)?;
        self.written += 1;
        Ok(())
    }

    pub fn write_i8(&mut self, value: i8) -> io::Result<()> {
        self.write_u8(value as u8)
    }

    pub fn write_u16(&mut self, value: u16) -> io::Result<()> {
        self.inner.write_u16::<BE>(value)?;
        self.written += 2;
        Ok(())
    }

    pub fn write_i16(&mut self, value: i16) -> io::Result<()> {
        self.inner.write_i16::<BE>(value)?;
        self.written += 2;
        Ok(())
    }

    pub fn write_u24(&mut self, value: u32) -> io::Result<()> {
        self.inner.write_u24::<BE>(value)?;
        self.written += 3;
        Ok(())
    }

    pub fn write_u32(&mut self, value: u32) -> io::Result<()> {
        self.inner.write_u32::<BE>(value)?;
        self.written += 4;
        Ok(())
    }

    pub fn write_i32(&mut self, value: i32) -> io::Result<()> {
        self.inner.write_i32::<BE>(value)?;
        self.written += 4;
        Ok(())
    }

    /// Raw bytes, written as-is.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.inner.write_all(bytes)?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    /// Writes `bytes` reversed as a whole.
    pub fn write_reversed(&mut self, bytes: &[u8]) -> io::Result<()> {
        for b in bytes.iter().rev() {
            self.write_u8(*b)?;
        }
        Ok(())
    }
}

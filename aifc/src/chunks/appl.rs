//! `APPL` chunks carrying the VADPCM codebook and loop descriptions.
//!
//! Both start with the `stoc` application signature and an 11-character
//! Pascal string naming the payload, followed by a `u16` version.

use crate::error::*;
use crate::types::*;
use n64io::{ByteCursor, ByteWriter};
use std::io::Write;

pub const APPL_SIGNATURE: [u8; 4] = *b"stoc";
pub const CODES_NAME: [u8; 11] = *b"VADPCMCODES";
pub const LOOPS_NAME: [u8; 11] = *b"VADPCMLOOPS";
pub const APPL_VERSION: u16 = 1;

/// Signature, string length byte and the 11 code characters.
const APPL_PREFIX_SIZE: u32 = 4 + 1 + 11;

/// Size of the ADPCM decoder state saved at a loop point.
pub const LOOP_STATE_SIZE: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplKind {
    Codes,
    Loops,
}

/// Reads the signature and code string that open an `APPL` payload.
pub(crate) fn read_appl_kind(cursor: &mut ByteCursor) -> Result<ApplKind> {
    let signature = cursor.read_array::<4>()?;
    if signature != APPL_SIGNATURE {
        return Err(AifcError::UnknownChunkSubtype(
            String::from_utf8_lossy(&signature).into_owned(),
        ));
    }
    let name = read_fixed_pstring::<11>(cursor)
        .map_err(|_| AifcError::UnknownChunkSubtype("<bad code string>".to_owned()))?;
    match name {
        CODES_NAME => Ok(ApplKind::Codes),
        LOOPS_NAME => Ok(ApplKind::Loops),
        _ => Err(AifcError::UnknownChunkSubtype(
            String::from_utf8_lossy(&name).into_owned(),
        )),
    }
}

fn write_appl_prefix<W: Write>(
    w: &mut ByteWriter<W>,
    size: u32,
    name: &[u8; 11],
) -> std::io::Result<()> {
    write_chunk_header(w, ID::APPL, size)?;
    w.write_bytes(&APPL_SIGNATURE)?;
    w.write_u8(name.len() as u8)?;
    w.write_bytes(name)
}

/// The ADPCM predictor codebook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodebookChunk {
    pub version: u16,
    pub order: i16,
    pub nentries: u16,
    coefficients: Vec<u8>,
}

impl CodebookChunk {
    /// `coefficients` must hold exactly `order * nentries * 16` bytes.
    pub fn new(order: i16, nentries: u16, coefficients: Vec<u8>) -> Result<Self> {
        if coefficients.len() != Self::table_size(order, nentries)? {
            return Err(AifcError::InvalidFormat(
                "codebook size does not match order and entry count",
            ));
        }
        Ok(Self {
            version: APPL_VERSION,
            order,
            nentries,
            coefficients,
        })
    }

    fn table_size(order: i16, nentries: u16) -> Result<usize> {
        if order < 0 {
            return Err(AifcError::InvalidFormat("negative codebook order"));
        }
        Ok(order as usize * nentries as usize * 16)
    }

    pub(crate) fn read(cursor: &mut ByteCursor) -> Result<Self> {
        let version = cursor.read_u16()?;
        let order = cursor.read_i16()?;
        let nentries = cursor.read_u16()?;
        let coefficients = cursor
            .read_bytes(Self::table_size(order, nentries)?)?
            .to_vec();
        if !cursor.is_at_end() {
            return Err(AifcError::InvalidFormat("trailing bytes after codebook"));
        }
        Ok(Self {
            version,
            order,
            nentries,
            coefficients,
        })
    }

    pub fn size(&self) -> u32 {
        APPL_PREFIX_SIZE + 2 + 2 + 2 + self.coefficients.len() as u32
    }

    pub(crate) fn write<W: Write>(&self, w: &mut ByteWriter<W>) -> std::io::Result<()> {
        write_appl_prefix(w, self.size(), &CODES_NAME)?;
        w.write_u16(self.version)?;
        w.write_i16(self.order)?;
        w.write_u16(self.nentries)?;
        w.write_bytes(&self.coefficients)?;
        write_pad(w, self.size())
    }

    pub fn coefficients(&self) -> &[u8] {
        &self.coefficients
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdpcmLoop {
    pub start: u32,
    pub end: u32,
    pub count: u32,
    pub state: [u8; LOOP_STATE_SIZE],
}

impl AdpcmLoop {
    const SIZE: u32 = 4 + 4 + 4 + LOOP_STATE_SIZE as u32;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopChunk {
    pub version: u16,
    pub loops: Vec<AdpcmLoop>,
}

impl LoopChunk {
    pub fn single(lp: AdpcmLoop) -> Self {
        Self {
            version: APPL_VERSION,
            loops: vec![lp],
        }
    }

    pub(crate) fn read(cursor: &mut ByteCursor) -> Result<Self> {
        let version = cursor.read_u16()?;
        let nloops = cursor.read_u16()?;
        let mut loops = Vec::with_capacity(nloops as usize);
        for _ in 0..nloops {
            loops.push(AdpcmLoop {
                start: cursor.read_u32()?,
                end: cursor.read_u32()?,
                count: cursor.read_u32()?,
                state: cursor.read_array::<LOOP_STATE_SIZE>()?,
            });
        }
        Ok(Self { version, loops })
    }

    pub fn size(&self) -> u32 {
        APPL_PREFIX_SIZE + 2 + 2 + self.loops.len() as u32 * AdpcmLoop::SIZE
    }

    pub(crate) fn write<W: Write>(&self, w: &mut ByteWriter<W>) -> std::io::Result<()> {
        write_appl_prefix(w, self.size(), &LOOPS_NAME)?;
        w.write_u16(self.version)?;
        w.write_u16(self.loops.len() as u16)?;
        for lp in &self.loops {
            w.write_u32(lp.start)?;
            w.write_u32(lp.end)?;
            w.write_u32(lp.count)?;
            w.write_bytes(&lp.state)?;
        }
        write_pad(w, self.size())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codebook_size_must_match_table() {
        assert!(CodebookChunk::new(2, 2, vec![0; 64]).is_ok());
        assert!(CodebookChunk::new(2, 2, vec![0; 63]).is_err());
        assert!(CodebookChunk::new(-1, 2, vec![]).is_err());
    }

    #[test]
    fn unknown_code_string_is_rejected() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&APPL_SIGNATURE);
        payload.push(11);
        payload.extend_from_slice(b"VADPCMXXXXX");
        let mut cursor = ByteCursor::new(&payload);
        match read_appl_kind(&mut cursor) {
            Err(AifcError::UnknownChunkSubtype(name)) => assert_eq!(name, "VADPCMXXXXX"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn loop_chunk_size() {
        let chunk = LoopChunk::single(AdpcmLoop {
            start: 0,
            end: 0,
            count: 0,
            state: [0; LOOP_STATE_SIZE],
        });
        let mut w = ByteWriter::new(Vec::new());
        chunk.write(&mut w).unwrap();
        assert_eq!(w.written(), 8 + chunk.size() as u64);
        assert_eq!(chunk.size(), 64);
    }
}

use crate::error::*;
use crate::types::*;
use log::warn;
use n64io::{ByteCursor, ByteWriter};
use std::io::Write;

#[derive(Debug, Clone, PartialEq)]
pub struct SoundDataChunk {
    pub offset: u32,
    pub block_size: u32,
    data: Vec<u8>,
}

impl SoundDataChunk {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            offset: 0,
            block_size: 0,
            data,
        }
    }

    pub(crate) fn read(data: &[u8]) -> Result<Self> {
        let mut cursor = ByteCursor::new(data);
        let offset = cursor.read_u32()?;
        let block_size = cursor.read_u32()?;
        if offset != 0 || block_size != 0 {
            warn!(
                "sound data with offset {} and block size {}",
                offset, block_size
            );
        }

        let data = cursor.read_bytes(cursor.remaining())?.to_vec();
        Ok(Self {
            offset,
            block_size,
            data,
        })
    }

    pub fn size(&self) -> u32 {
        8 + self.data.len() as u32
    }

    pub(crate) fn write<W: Write>(&self, w: &mut ByteWriter<W>) -> std::io::Result<()> {
        write_chunk_header(w, ID::SSND, self.size())?;
        w.write_u32(self.offset)?;
        w.write_u32(self.block_size)?;
        w.write_bytes(&self.data)?;
        write_pad(w, self.size())
    }

    pub fn raw_data(&self) -> &[u8] {
        &self.data
    }
}

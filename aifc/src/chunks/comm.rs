use crate::error::*;
use crate::types::*;
use n64io::{ByteCursor, ByteWriter};
use std::io::Write;
use std::time::Duration;

pub const VADPCM_COMPRESSION_NAME: [u8; 11] = *b"VADPCM ~4-1";

/// Bytes of compressed input per decoded frame of 16 samples.
pub const VADPCM_FRAME_BYTES: u32 = 9;
pub const VADPCM_FRAME_SAMPLES: u32 = 16;

#[derive(Debug, Clone, PartialEq)]
pub struct CommonChunk {
    pub num_channels: u16,
    pub num_sample_frames: u32,
    pub sample_size: u16,
    pub sample_rate: Extended80,
    pub compression_type: ID,
    pub compression_name: [u8; 11],
}

impl CommonChunk {
    pub const SIZE: u32 = 2 + 4 + 2 + 10 + 4 + 1 + 11;

    /// Mono 16-bit VADPCM header for `data_len` bytes of compressed data.
    pub fn vadpcm(sample_rate: u32, data_len: u32) -> Self {
        Self {
            num_channels: 1,
            num_sample_frames: (data_len / VADPCM_FRAME_BYTES) * VADPCM_FRAME_SAMPLES,
            sample_size: 16,
            sample_rate: Extended80::from_u32(sample_rate),
            compression_type: ID::VAPC,
            compression_name: VADPCM_COMPRESSION_NAME,
        }
    }

    pub(crate) fn read(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE as usize {
            return Err(AifcError::InvalidFormat("common chunk too short"));
        }
        let mut cursor = ByteCursor::new(data);

        let num_channels = cursor.read_u16()?;
        let num_sample_frames = cursor.read_u32()?;
        let sample_size = cursor.read_u16()?;
        let sample_rate = Extended80::read(&mut cursor)?;
        let compression_type = ID::read(&mut cursor)?;
        let compression_name = read_fixed_pstring::<11>(&mut cursor)?;

        Ok(CommonChunk {
            num_channels,
            num_sample_frames,
            sample_size,
            sample_rate,
            compression_type,
            compression_name,
        })
    }

    pub(crate) fn write<W: Write>(&self, w: &mut ByteWriter<W>) -> std::io::Result<()> {
        write_chunk_header(w, ID::COMM, Self::SIZE)?;
        w.write_u16(self.num_channels)?;
        w.write_u32(self.num_sample_frames)?;
        w.write_u16(self.sample_size)?;
        self.sample_rate.write(w)?;
        w.write_bytes(self.compression_type.data())?;
        w.write_u8(self.compression_name.len() as u8)?;
        w.write_bytes(&self.compression_name)?;
        write_pad(w, Self::SIZE)
    }

    pub fn audio_length(&self) -> Result<Duration> {
        let rate = self.sample_rate.to_f64()?;
        if rate <= 0.0 {
            return Err(AifcError::InvalidSampleRate("not positive"));
        }
        Ok(Duration::from_secs_f64(
            self.num_sample_frames as f64 / rate,
        ))
    }
}

//! AIFF-C reading and writing for N64 VADPCM sound data.
//!
//! Only the container is handled: COMM, SSND and the two `stoc` APPL
//! chunks (codebook and loops). Sample data is carried as opaque bytes.

pub mod chunks;
mod error;
mod types;

pub use chunks::*;
pub use error::{AifcError, Result};
pub use types::{Extended80, ID};

use chunks::appl::read_appl_kind;
use log::{debug, warn};
use n64io::{ByteCursor, ByteWriter};
use std::io::Write;
use types::{read_chunk_header, write_chunk_header, write_pad, ChunkHeader};

#[derive(Debug, Clone, PartialEq)]
pub enum Chunk {
    Common(CommonChunk),
    Codebook(CodebookChunk),
    Loops(LoopChunk),
    SoundData(SoundDataChunk),
    /// Any chunk this crate does not interpret, kept verbatim.
    Other { id: ID, data: Vec<u8> },
}

impl Chunk {
    pub fn id(&self) -> ID {
        match self {
            Chunk::Common(_) => ID::COMM,
            Chunk::Codebook(_) | Chunk::Loops(_) => ID::APPL,
            Chunk::SoundData(_) => ID::SSND,
            Chunk::Other { id, .. } => *id,
        }
    }

    /// Payload size as declared in the chunk header.
    pub fn size(&self) -> u32 {
        match self {
            Chunk::Common(_) => CommonChunk::SIZE,
            Chunk::Codebook(c) => c.size(),
            Chunk::Loops(c) => c.size(),
            Chunk::SoundData(c) => c.size(),
            Chunk::Other { data, .. } => data.len() as u32,
        }
    }

    /// Bytes the chunk occupies in the FORM body: header, payload, pad.
    fn stored_size(&self) -> u32 {
        let size = self.size();
        8 + size + size % 2
    }

    fn write<W: Write>(&self, w: &mut ByteWriter<W>) -> std::io::Result<()> {
        match self {
            Chunk::Common(c) => c.write(w),
            Chunk::Codebook(c) => c.write(w),
            Chunk::Loops(c) => c.write(w),
            Chunk::SoundData(c) => c.write(w),
            Chunk::Other { id, data } => {
                write_chunk_header(w, *id, data.len() as u32)?;
                w.write_bytes(data)?;
                write_pad(w, data.len() as u32)
            }
        }
    }
}

/// Classification of a chunk header, decided before any payload is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkClass {
    Common,
    Appl(ApplKind),
    SoundData,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdpcmAifcFile {
    chunks: Vec<Chunk>,
    comm: usize,
    codes: usize,
    sound: usize,
    loops: Option<usize>,
}

impl AdpcmAifcFile {
    /// Builds the chunk list a VADPCM sound is written with: COMM, the
    /// codebook, SSND, and the loop chunk only when there is a loop.
    pub fn new(
        sample_rate: u32,
        codebook: CodebookChunk,
        lp: Option<AdpcmLoop>,
        sound_data: Vec<u8>,
    ) -> Self {
        let comm = CommonChunk::vadpcm(sample_rate, sound_data.len() as u32);
        let mut chunks = vec![
            Chunk::Common(comm),
            Chunk::Codebook(codebook),
            Chunk::SoundData(SoundDataChunk::new(sound_data)),
        ];
        let loops = lp.map(|lp| {
            chunks.push(Chunk::Loops(LoopChunk::single(lp)));
            chunks.len() - 1
        });

        Self {
            chunks,
            comm: 0,
            codes: 1,
            sound: 2,
            loops,
        }
    }

    pub fn read(data: &[u8]) -> Result<Self> {
        let mut cursor = ByteCursor::new(data);
        let form_id = cursor.read_array::<4>()?;
        if form_id != *ID::FORM.data() {
            return Err(AifcError::MagicMismatch {
                expected: "FORM",
                found: String::from_utf8_lossy(&form_id).into_owned(),
            });
        }
        let form_size = cursor.read_u32()? as usize;
        let form_body = cursor.read_bytes(form_size.min(cursor.remaining()))?;
        if form_body.len() < form_size {
            warn!(
                "FORM declares {} bytes but only {} are present",
                form_size,
                form_body.len()
            );
        }

        let mut cursor = ByteCursor::new(form_body);
        let form_type = cursor.read_array::<4>()?;
        if form_type != *ID::AIFC.data() {
            return Err(AifcError::MagicMismatch {
                expected: "AIFC",
                found: String::from_utf8_lossy(&form_type).into_owned(),
            });
        }

        let headers = scan_chunks(&mut cursor)?;
        Self::materialize(form_body, &headers)
    }

    fn materialize(form_body: &[u8], headers: &[(ChunkHeader, ChunkClass)]) -> Result<Self> {
        let mut chunks = Vec::with_capacity(headers.len());
        let mut comm = None;
        let mut codes = None;
        let mut sound = None;
        let mut loops = None;

        for (header, class) in headers {
            let payload = &form_body[header.offset..][..header.size as usize];
            let index = chunks.len();
            let chunk = match class {
                ChunkClass::Common => {
                    comm = Some(index);
                    Chunk::Common(CommonChunk::read(payload)?)
                }
                ChunkClass::SoundData => {
                    sound = Some(index);
                    Chunk::SoundData(SoundDataChunk::read(payload)?)
                }
                ChunkClass::Appl(kind) => {
                    let mut cursor = ByteCursor::new(payload);
                    read_appl_kind(&mut cursor)?;
                    match kind {
                        ApplKind::Codes => {
                            codes = Some(index);
                            Chunk::Codebook(CodebookChunk::read(&mut cursor)?)
                        }
                        ApplKind::Loops => {
                            loops = Some(index);
                            Chunk::Loops(LoopChunk::read(&mut cursor)?)
                        }
                    }
                }
                ChunkClass::Other => Chunk::Other {
                    id: header.id,
                    data: payload.to_vec(),
                },
            };
            chunks.push(chunk);
        }

        Ok(Self {
            chunks,
            comm: comm.ok_or(AifcError::MissingRequiredChunk("COMM"))?,
            codes: codes.ok_or(AifcError::MissingRequiredChunk("APPL VADPCMCODES"))?,
            sound: sound.ok_or(AifcError::MissingRequiredChunk("SSND"))?,
            loops,
        })
    }

    pub fn write<W: Write>(&self, out: W) -> Result<()> {
        let form_size = 4 + self.chunks.iter().map(Chunk::stored_size).sum::<u32>();

        let mut w = ByteWriter::new(out);
        write_chunk_header(&mut w, ID::FORM, form_size)?;
        w.write_bytes(ID::AIFC.data())?;
        for chunk in &self.chunks {
            chunk.write(&mut w)?;
        }
        debug!("wrote {} chunks, {} bytes", self.chunks.len(), w.written());
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write(&mut out)?;
        Ok(out)
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn comm_chunk(&self) -> &CommonChunk {
        match &self.chunks[self.comm] {
            Chunk::Common(c) => c,
            _ => unreachable!("comm index always points at a COMM chunk"),
        }
    }

    pub fn codes_chunk(&self) -> &CodebookChunk {
        match &self.chunks[self.codes] {
            Chunk::Codebook(c) => c,
            _ => unreachable!("codes index always points at a codebook chunk"),
        }
    }

    pub fn sound_chunk(&self) -> &SoundDataChunk {
        match &self.chunks[self.sound] {
            Chunk::SoundData(c) => c,
            _ => unreachable!("sound index always points at a SSND chunk"),
        }
    }

    pub fn loop_chunk(&self) -> Option<&LoopChunk> {
        self.loops.map(|i| match &self.chunks[i] {
            Chunk::Loops(c) => c,
            _ => unreachable!("loop index always points at a loop chunk"),
        })
    }

    pub fn int_sample_rate(&self) -> Result<u32> {
        self.comm_chunk().sample_rate.to_u32()
    }
}

/// First pass: walk the chunk headers, classifying each one, and check the
/// required chunks are all there before anything is parsed.
fn scan_chunks(cursor: &mut ByteCursor) -> Result<Vec<(ChunkHeader, ChunkClass)>> {
    let mut headers = Vec::new();
    let (mut num_comm, mut num_appl, mut num_ssnd) = (0, 0, 0);

    while !cursor.is_at_end() {
        let header = read_chunk_header(cursor)?;
        let class = match header.id {
            ID::COMM => {
                num_comm += 1;
                ChunkClass::Common
            }
            ID::SSND => {
                num_ssnd += 1;
                ChunkClass::SoundData
            }
            ID::APPL => {
                num_appl += 1;
                let payload = &cursor.data()[header.offset..][..header.size as usize];
                ChunkClass::Appl(read_appl_kind(&mut ByteCursor::new(payload))?)
            }
            _ => {
                debug!("keeping unknown chunk {}", header.id);
                ChunkClass::Other
            }
        };
        headers.push((header, class));
    }

    if headers.len() < 3 {
        return Err(AifcError::TooFewChunks(headers.len()));
    }
    if num_comm == 0 {
        return Err(AifcError::MissingRequiredChunk("COMM"));
    }
    if num_appl == 0 {
        return Err(AifcError::MissingRequiredChunk("APPL"));
    }
    if num_ssnd == 0 {
        return Err(AifcError::MissingRequiredChunk("SSND"));
    }
    if num_comm > 1 || num_ssnd > 1 {
        warn!("duplicate COMM or SSND chunks, the last one wins");
    }
    Ok(headers)
}

use crate::error::*;
use crate::event::GmidTrack;
use log::{debug, warn};
use n64io::ByteCursor;

pub const TRACK_COUNT: usize = 16;
/// Sixteen track offsets followed by the division.
pub const HEADER_LEN: usize = TRACK_COUNT * 4 + 4;

/// A whole cseq file: up to sixteen compressed tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CseqFile {
    /// Ticks per quarter note.
    pub division: u32,
    /// Present tracks, with their slot in the header.
    pub tracks: Vec<(usize, GmidTrack)>,
}

impl CseqFile {
    pub fn read(data: &[u8]) -> Result<Self> {
        let mut cursor = ByteCursor::new(data);
        let mut offsets = [0usize; TRACK_COUNT];
        for offset in offsets.iter_mut() {
            *offset = cursor.read_u32()? as usize;
        }
        let division = cursor.read_u32()?;
        debug!("cseq: division {}, offsets {:x?}", division, offsets);

        let mut tracks = Vec::new();
        for (slot, &start) in offsets.iter().enumerate() {
            if start == 0 {
                continue;
            }
            if start < HEADER_LEN || start > data.len() {
                return Err(CseqError::CorruptStream {
                    offset: slot * 4,
                    reason: "track offset outside the file",
                });
            }

            // A track runs up to the next track that starts after it.
            let end = offsets
                .iter()
                .copied()
                .filter(|&other| other > start)
                .min()
                .unwrap_or(data.len())
                .min(data.len());
            let track = GmidTrack::from_compressed(&data[start..end])?;
            if !track.events.last().map_or(false, |e| e.kind.is_end()) {
                warn!("track {} has no end of track event", slot);
            }
            tracks.push((slot, track));
        }

        Ok(Self { division, tracks })
    }
}

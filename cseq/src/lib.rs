//! Compressed MIDI sequences (`cseq`) as used by libultra games.
//!
//! A cseq track is ordinary MIDI with three twists: note-ons carry their
//! duration instead of having a matching note-off, there are loop meta
//! events, and repeated byte runs are replaced by back-references
//! ("patterns") into the already-decoded stream.

mod error;
pub mod event;
pub mod file;
pub mod midi;
pub mod unroll;

pub use error::{CseqError, Result};
pub use event::{EventKind, GmidEvent, GmidTrack};
pub use file::CseqFile;
pub use midi::write_smf;
pub use unroll::unroll;

use n64io::ByteCursor;

/// Longest variable-length quantity accepted, 28 bits of value.
pub const MAX_VAR_LEN: usize = 4;

/// Reads a MIDI variable-length quantity: 7 bits per byte, most
/// significant first, high bit set on every byte but the last.
pub fn read_var(cursor: &mut ByteCursor) -> Result<u32> {
    let start = cursor.position();
    let mut value = 0u32;
    for _ in 0..MAX_VAR_LEN {
        let byte = cursor.read_u8()?;
        value = (value << 7) | u32::from(byte & 0x7f);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(CseqError::VarintTooLong { offset: start })
}

/// Appends `value` as a variable-length quantity.
pub fn write_var(out: &mut Vec<u8>, value: u32) {
    let mut groups = [0u8; 5];
    let mut len = 0;
    let mut rest = value;
    loop {
        groups[len] = (rest & 0x7f) as u8;
        len += 1;
        rest >>= 7;
        if rest == 0 {
            break;
        }
    }
    for i in (0..len).rev() {
        let continuation = if i > 0 { 0x80 } else { 0 };
        out.push(groups[i] | continuation);
    }
}

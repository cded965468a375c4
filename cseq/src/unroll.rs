use crate::error::*;
use log::trace;
use n64io::ByteCursor;

/// Introduces a pattern reference, or an escaped literal when doubled.
pub const PATTERN_MARKER: u8 = 0xfe;

/// Expands the pattern references of a compressed track.
///
/// `FE FE` stands for a literal `FE`. `FE hi lo len` copies `len` bytes
/// starting `hi lo` bytes back from the current end of the output. The copy
/// runs byte by byte, so it may overlap the bytes it is producing.
pub fn unroll(data: &[u8]) -> Result<Vec<u8>> {
    let (out, result) = unroll_partial(data);
    result.map(|()| out)
}

/// Like [`unroll`], but on error also hands back everything expanded before
/// the bad marker.
pub(crate) fn unroll_partial(data: &[u8]) -> (Vec<u8>, Result<()>) {
    let mut out: Vec<u8> = Vec::with_capacity(data.len());
    let result = unroll_into(data, &mut out);
    out.shrink_to_fit();
    (out, result)
}

fn unroll_into(data: &[u8], out: &mut Vec<u8>) -> Result<()> {
    let mut cursor = ByteCursor::new(data);

    while !cursor.is_at_end() {
        let offset = cursor.position();
        let byte = cursor.read_u8()?;
        if byte != PATTERN_MARKER {
            push(out, byte);
            continue;
        }

        let hi = cursor.read_u8()?;
        if hi == PATTERN_MARKER {
            push(out, PATTERN_MARKER);
            continue;
        }
        let distance = usize::from(u16::from_be_bytes([hi, cursor.read_u8()?]));
        let len = usize::from(cursor.read_u8()?);

        if distance == 0 || distance > out.len() {
            return Err(CseqError::CorruptStream {
                offset,
                reason: "pattern reaches before the start of the track",
            });
        }
        trace!("pattern at {:#x}: {} bytes from {} back", offset, len, distance);
        let start = out.len() - distance;
        for i in 0..len {
            let byte = out[start + i];
            push(out, byte);
        }
    }

    Ok(())
}

/// Grows the buffer by half its capacity when it is full.
fn push(out: &mut Vec<u8>, byte: u8) {
    if out.len() == out.capacity() {
        let extra = (out.capacity() / 2).max(16);
        out.reserve_exact(extra);
    }
    out.push(byte);
}

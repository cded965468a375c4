//! Standard MIDI File output.

use crate::error::*;
use crate::event::{EventKind, GmidTrack};
use crate::write_var;
use log::debug;
use n64io::ByteWriter;
use std::io::Write;

/// Writes `tracks` as a format 1 Standard MIDI File.
///
/// Loop events have no standard counterpart and are dropped; the delta
/// times of the remaining events are taken from their absolute times.
/// The end of track event always comes last, after any note-off that
/// outlasts the original one.
pub fn write_smf<W: Write>(division: u32, tracks: &[GmidTrack], out: W) -> Result<()> {
    let division = u16::try_from(division)
        .ok()
        .filter(|d| d & 0x8000 == 0)
        .ok_or_else(|| {
            CseqError::UnsupportedFeature(format!("division of {} ticks", division))
        })?;
    let track_count = u16::try_from(tracks.len())
        .map_err(|_| CseqError::UnsupportedFeature(format!("{} tracks", tracks.len())))?;

    let mut out = ByteWriter::new(out);
    out.write_bytes(b"MThd")?;
    out.write_u32(6)?;
    out.write_u16(1)?;
    out.write_u16(track_count)?;
    out.write_u16(division)?;

    for track in tracks {
        let body = track_body(track);
        debug!("MTrk: {} bytes", body.len());
        out.write_bytes(b"MTrk")?;
        out.write_u32(body.len() as u32)?;
        out.write_bytes(&body)?;
    }
    Ok(())
}

fn track_body(track: &GmidTrack) -> Vec<u8> {
    let mut body = Vec::new();
    let mut last_time = 0u64;

    for event in &track.events {
        let bytes = match event.kind {
            EventKind::NoteOn {
                channel,
                note,
                velocity,
                ..
            } => vec![0x90 | channel, note, velocity],
            EventKind::NoteOff {
                channel,
                note,
                velocity,
            } => vec![0x80 | channel, note, velocity],
            EventKind::PolyphonicPressure {
                channel,
                note,
                pressure,
            } => vec![0xa0 | channel, note, pressure],
            EventKind::ControlChange {
                channel,
                controller,
                value,
            } => vec![0xb0 | channel, controller, value],
            EventKind::ProgramChange { channel, program } => vec![0xc0 | channel, program],
            EventKind::ChannelPressure { channel, pressure } => vec![0xd0 | channel, pressure],
            EventKind::Tempo(micros) => {
                let [_, a, b, c] = micros.to_be_bytes();
                vec![0xff, 0x51, 0x03, a, b, c]
            }
            EventKind::LoopStart { .. } | EventKind::LoopEnd { .. } | EventKind::EndOfTrack => {
                continue
            }
        };

        let delta = event.absolute_time.saturating_sub(last_time);
        write_var(&mut body, delta.min(0x0fff_ffff) as u32);
        last_time = event.absolute_time;
        body.extend_from_slice(&bytes);
    }

    body.extend_from_slice(&[0x00, 0xff, 0x2f, 0x00]);
    body
}

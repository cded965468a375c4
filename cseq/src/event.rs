//! Track event parsing.
//!
//! A parsed track holds the events of the stream in time order, plus one
//! synthesised note-off per note-on. Each note-on and its note-off point at
//! each other through [`GmidEvent::dual`].

use crate::error::*;
use crate::read_var;
use crate::unroll::unroll_partial;
use log::{debug, trace, warn};
use n64io::ByteCursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    NoteOn {
        channel: u8,
        note: u8,
        velocity: u8,
        /// Ticks until the matching note-off.
        duration: u32,
    },
    /// Never stored in a cseq stream, only synthesised from a note-on.
    NoteOff { channel: u8, note: u8, velocity: u8 },
    PolyphonicPressure { channel: u8, note: u8, pressure: u8 },
    ControlChange {
        channel: u8,
        controller: u8,
        value: u8,
    },
    ProgramChange { channel: u8, program: u8 },
    ChannelPressure { channel: u8, pressure: u8 },
    /// Microseconds per quarter note.
    Tempo(u32),
    LoopStart { number: u8 },
    LoopEnd {
        count: u8,
        current_count: u8,
        /// Byte distance back to the loop start.
        difference: u32,
    },
    EndOfTrack,
}

impl EventKind {
    pub fn channel(&self) -> Option<u8> {
        use EventKind::*;

        match *self {
            NoteOn { channel, .. }
            | NoteOff { channel, .. }
            | PolyphonicPressure { channel, .. }
            | ControlChange { channel, .. }
            | ProgramChange { channel, .. }
            | ChannelPressure { channel, .. } => Some(channel),
            Tempo(_) | LoopStart { .. } | LoopEnd { .. } | EndOfTrack => None,
        }
    }

    pub fn is_end(&self) -> bool {
        matches!(self, EventKind::EndOfTrack)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GmidEvent {
    pub absolute_time: u64,
    pub delta_time: u32,
    pub kind: EventKind,
    /// Index of the paired note-on or note-off in the same track.
    pub dual: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GmidTrack {
    pub events: Vec<GmidEvent>,
}

impl GmidTrack {
    /// Unrolls and parses a compressed track.
    ///
    /// Bytes after the end of track event are never parsed, so a bad
    /// pattern marker there is ignored once the track before it is whole.
    pub fn from_compressed(data: &[u8]) -> Result<Self> {
        let (bytes, unrolled) = unroll_partial(data);
        let error = match unrolled {
            Ok(()) => return Self::parse(&bytes),
            Err(error) => error,
        };
        match Self::parse(&bytes) {
            Ok(track) if track.events.iter().any(|e| e.kind.is_end()) => {
                warn!("ignoring trailing data after end of track: {}", error);
                Ok(track)
            }
            _ => Err(error),
        }
    }

    /// Parses an already unrolled track.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let events = read_events(data)?;
        let mut track = Self {
            events: with_note_offs(events),
        };
        track.sort_by_time();
        debug!("parsed track: {} events", track.events.len());
        Ok(track)
    }

    /// Stable selection sort on absolute time, then delta times are
    /// recomputed from the new neighbours. The first delta is kept as is.
    fn sort_by_time(&mut self) {
        let events = &mut self.events;
        let mut order: Vec<usize> = (0..events.len()).collect();

        for i in 0..events.len() {
            let mut min = i;
            for j in i + 1..events.len() {
                if events[j].absolute_time < events[min].absolute_time {
                    min = j;
                }
            }
            events[i..=min].rotate_right(1);
            order[i..=min].rotate_right(1);
        }

        let mut position = vec![0; order.len()];
        for (new, old) in order.iter().enumerate() {
            position[*old] = new;
        }
        for event in events.iter_mut() {
            event.dual = event.dual.map(|old| position[old]);
        }

        for i in 1..events.len() {
            let delta = events[i].absolute_time - events[i - 1].absolute_time;
            events[i].delta_time = delta.min(u64::from(u32::MAX)) as u32;
        }
    }

    pub fn end_time(&self) -> u64 {
        self.events.last().map_or(0, |e| e.absolute_time)
    }
}

/// Inserts a note-off directly after every note-on and links the two.
fn with_note_offs(events: Vec<GmidEvent>) -> Vec<GmidEvent> {
    let mut out = Vec::with_capacity(events.len() * 2);
    for event in events {
        let on = out.len();
        out.push(event);
        if let EventKind::NoteOn {
            channel,
            note,
            duration,
            ..
        } = event.kind
        {
            out[on].dual = Some(on + 1);
            out.push(GmidEvent {
                absolute_time: event.absolute_time + u64::from(duration),
                delta_time: duration,
                kind: EventKind::NoteOff {
                    channel,
                    note,
                    velocity: 0,
                },
                dual: Some(on),
            });
        }
    }
    out
}

/// One pass over the stream, in stream order.
fn read_events(data: &[u8]) -> Result<Vec<GmidEvent>> {
    let mut cursor = ByteCursor::new(data);
    let mut events = Vec::new();
    let mut running_status = None;
    let mut time = 0u64;

    while !cursor.is_at_end() {
        let delta_time = read_var(&mut cursor)?;
        time += u64::from(delta_time);

        let offset = cursor.position();
        let status = match cursor.peek_u8() {
            Some(byte) if byte & 0x80 != 0 => {
                cursor.skip(1)?;
                byte
            }
            _ => running_status.ok_or(CseqError::CorruptStream {
                offset,
                reason: "data byte without a running status",
            })?,
        };

        let kind = if status == 0xff {
            read_meta(&mut cursor)?
        } else {
            let kind = read_channel(&mut cursor, status)?;
            running_status = Some(status);
            kind
        };
        trace!("{:#06x} +{} {:?}", offset, delta_time, kind);

        events.push(GmidEvent {
            absolute_time: time,
            delta_time,
            kind,
            dual: None,
        });
        if kind.is_end() {
            break;
        }
    }

    Ok(events)
}

fn read_channel(cursor: &mut ByteCursor, status: u8) -> Result<EventKind> {
    let channel = status & 0x0f;
    let kind = match status & 0xf0 {
        0x90 => EventKind::NoteOn {
            channel,
            note: cursor.read_u8()?,
            velocity: cursor.read_u8()?,
            duration: read_var(cursor)?,
        },
        0xa0 => EventKind::PolyphonicPressure {
            channel,
            note: cursor.read_u8()?,
            pressure: cursor.read_u8()?,
        },
        0xb0 => EventKind::ControlChange {
            channel,
            controller: cursor.read_u8()?,
            value: cursor.read_u8()?,
        },
        0xc0 => EventKind::ProgramChange {
            channel,
            program: cursor.read_u8()?,
        },
        0xd0 => EventKind::ChannelPressure {
            channel,
            pressure: cursor.read_u8()?,
        },
        0x80 => return Err(unsupported("note off", status)),
        0xe0 => return Err(unsupported("pitch bend", status)),
        _ => return Err(unsupported("system event", status)),
    };
    Ok(kind)
}

fn read_meta(cursor: &mut ByteCursor) -> Result<EventKind> {
    let offset = cursor.position();
    let kind = match cursor.read_u8()? {
        0x51 => EventKind::Tempo(cursor.read_u24()?),
        0x2e => {
            let number = cursor.read_u8()?;
            if cursor.read_u8()? != 0xff {
                return Err(CseqError::MalformedMeta {
                    offset,
                    kind: "loop start",
                });
            }
            EventKind::LoopStart { number }
        }
        0x2d => EventKind::LoopEnd {
            count: cursor.read_u8()?,
            current_count: cursor.read_u8()?,
            difference: cursor.read_u32()?,
        },
        0x2f => EventKind::EndOfTrack,
        other => return Err(unsupported("meta event", other)),
    };
    Ok(kind)
}

fn unsupported(what: &str, byte: u8) -> CseqError {
    CseqError::UnsupportedFeature(format!("{} {:#04x}", what, byte))
}

//! The bank graph.
//!
//! Every node lives in one arena owned by its [`BankFile`]; parents refer to
//! children through keys, so a node reachable from several parents is
//! stored once and dropped once.

use slotmap::SlotMap;
use std::fmt;

/// `'B1'`, the only revision libultra accepts.
pub const BANK_FILE_REVISION: u16 = 0x4231;

slotmap::new_key_type! {
    pub struct InstrumentKey;
    pub struct SoundKey;
    pub struct EnvelopeKey;
    pub struct KeyMapKey;
    pub struct WaveTableKey;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Bank,
    Instrument,
    Sound,
    Envelope,
    KeyMap,
    WaveTable,
}

impl NodeKind {
    /// Kinds that can be declared in `.inst` text.
    const DECLARABLE: [NodeKind; 5] = [
        NodeKind::Bank,
        NodeKind::Instrument,
        NodeKind::Sound,
        NodeKind::Envelope,
        NodeKind::KeyMap,
    ];

    /// The keyword introducing a declaration of this kind in `.inst` text.
    pub fn keyword(self) -> &'static str {
        match self {
            NodeKind::Bank => "bank",
            NodeKind::Instrument => "instrument",
            NodeKind::Sound => "sound",
            NodeKind::Envelope => "envelope",
            NodeKind::KeyMap => "keymap",
            NodeKind::WaveTable => "wavetable",
        }
    }

    /// Prefix of generated node names.
    fn name_prefix(self) -> &'static str {
        match self {
            NodeKind::Bank => "Bank",
            NodeKind::Instrument => "Instrument",
            NodeKind::Sound => "Sound",
            NodeKind::Envelope => "Envelope",
            NodeKind::KeyMap => "Keymap",
            NodeKind::WaveTable => "WaveTable",
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::DECLARABLE
            .iter()
            .copied()
            .find(|k| k.keyword() == keyword)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Per-kind id counters for one load. A fresh generator is created for
/// every bank file, so ids always start at zero.
#[derive(Debug, Default)]
pub struct IdGenerator {
    next: [u32; 6],
}

impl IdGenerator {
    pub fn next_id(&mut self, kind: NodeKind) -> u32 {
        let id = self.next[kind.index()];
        self.next[kind.index()] += 1;
        id
    }

    /// Next id together with its generated name, e.g. `Sound0003`.
    pub fn next_named(&mut self, kind: NodeKind) -> (u32, String) {
        let id = self.next_id(kind);
        (id, format!("{}{:04}", kind.name_prefix(), id))
    }
}

#[derive(Debug, Default)]
pub struct BankFile {
    pub revision: u16,
    pub banks: Vec<Bank>,
    pub instruments: SlotMap<InstrumentKey, Instrument>,
    pub sounds: SlotMap<SoundKey, Sound>,
    pub envelopes: SlotMap<EnvelopeKey, Envelope>,
    pub keymaps: SlotMap<KeyMapKey, KeyMap>,
    pub wavetables: SlotMap<WaveTableKey, WaveTable>,
}

impl BankFile {
    pub fn new() -> Self {
        Self {
            revision: BANK_FILE_REVISION,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bank {
    pub id: u32,
    pub name: String,
    pub flags: u8,
    pub sample_rate: i32,
    pub percussion: Option<InstrumentKey>,
    /// Slot order is the program number used in-game; empty slots are kept.
    pub instruments: Vec<Option<InstrumentKey>>,
}

impl Bank {
    /// Occupied instrument slots in order, then the percussion instrument.
    pub fn instrument_keys(&self) -> impl Iterator<Item = InstrumentKey> + '_ {
        self.instruments
            .iter()
            .flatten()
            .copied()
            .chain(self.percussion)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modulation {
    pub kind: u8,
    pub rate: u8,
    pub depth: u8,
    pub delay: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instrument {
    pub id: u32,
    pub name: String,
    pub volume: u8,
    pub pan: u8,
    pub priority: u8,
    pub flags: u8,
    pub tremolo: Modulation,
    pub vibrato: Modulation,
    pub bend_range: i16,
    pub sounds: Vec<SoundKey>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sound {
    pub id: u32,
    pub name: String,
    pub pan: u8,
    pub volume: u8,
    pub flags: u8,
    pub envelope: Option<EnvelopeKey>,
    pub keymap: Option<KeyMapKey>,
    pub wavetable: Option<WaveTableKey>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub id: u32,
    pub name: String,
    pub attack_time: i32,
    pub decay_time: i32,
    pub release_time: i32,
    pub attack_volume: u8,
    pub decay_volume: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMap {
    pub id: u32,
    pub name: String,
    pub velocity_min: u8,
    pub velocity_max: u8,
    pub key_min: u8,
    pub key_max: u8,
    pub key_base: u8,
    pub detune: i8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaveTable {
    pub id: u32,
    /// Where the sample is (or will be) written as `.aifc`.
    pub aifc_path: String,
    /// Byte range of the sample inside the `.tbl` file.
    pub base: u32,
    pub len: u32,
    pub flags: u8,
    pub kind: WaveKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaveKind {
    Adpcm {
        looping: Option<AdpcmLoop>,
        book: Option<AdpcmBook>,
    },
    Raw16 {
        looping: Option<RawLoop>,
    },
}

impl WaveKind {
    pub const ADPCM_TAG: u8 = 0;
    pub const RAW16_TAG: u8 = 1;

    pub fn tag(&self) -> u8 {
        match self {
            WaveKind::Adpcm { .. } => Self::ADPCM_TAG,
            WaveKind::Raw16 { .. } => Self::RAW16_TAG,
        }
    }

    pub fn has_loop(&self) -> bool {
        match self {
            WaveKind::Adpcm { looping, .. } => looping.is_some(),
            WaveKind::Raw16 { looping } => looping.is_some(),
        }
    }
}

pub const ADPCM_STATE_SIZE: usize = aifc::LOOP_STATE_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdpcmLoop {
    pub start: u32,
    pub end: u32,
    pub count: u32,
    pub state: [u8; ADPCM_STATE_SIZE],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdpcmBook {
    pub order: i16,
    pub npredictors: u16,
    /// `order * npredictors * 16` raw bytes of big-endian coefficients.
    pub table: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawLoop {
    pub start: u32,
    pub end: u32,
    pub count: u32,
}

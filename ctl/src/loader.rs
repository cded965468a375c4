//! Binary `.ctl` loading.
//!
//! Records are addressed by absolute offsets into the buffer. Every offset is
//! resolved through a [`DedupMap`], so records referenced from several
//! parents become one node in the graph.

use crate::dedup::DedupMap;
use crate::error::*;
use crate::model::*;
use log::{debug, trace};
use n64io::ByteCursor;
use std::convert::TryFrom;

#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Prefix of the generated `.aifc` file names, `sound` gives
    /// `sound0000.aifc`, `sound0001.aifc`, ...
    pub aifc_prefix: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            aifc_prefix: "sound".to_owned(),
        }
    }
}

/// Loads every bank of a `.ctl` buffer.
pub fn load_bank_file(data: &[u8], options: &LoadOptions) -> Result<BankFile> {
    let mut cursor = ByteCursor::new(data);
    let revision = cursor.read_u16()?;
    if revision != BANK_FILE_REVISION {
        return Err(CtlError::MagicMismatch {
            expected: BANK_FILE_REVISION,
            found: revision,
        });
    }

    let bank_count = cursor.read_u16()?;
    if bank_count == 0 {
        return Err(CtlError::EmptyBankFile);
    }
    let offsets = (0..bank_count)
        .map(|_| cursor.read_u32())
        .collect::<n64io::Result<Vec<_>>>()?;

    let mut ctx = LoadContext::new(data, options);
    for offset in offsets {
        let bank = ctx.load_bank(offset)?;
        ctx.file.banks.push(bank);
    }

    let file = ctx.file;
    debug!(
        "loaded {} banks: {} instruments, {} sounds, {} envelopes, {} keymaps, {} wavetables",
        file.banks.len(),
        file.instruments.len(),
        file.sounds.len(),
        file.envelopes.len(),
        file.keymaps.len(),
        file.wavetables.len()
    );
    Ok(file)
}

/// Resolution state for one load. Dropped when the load finishes.
struct LoadContext<'a> {
    data: &'a [u8],
    options: &'a LoadOptions,
    ids: IdGenerator,
    file: BankFile,
    // Envelopes and keymaps go through `get_or_try_create`. Instruments,
    // sounds and wavetables call back into `self` while being built, which
    // a closure holding the map borrow cannot do, so they look up first and
    // insert after.
    instruments: DedupMap<u32, InstrumentKey>,
    sounds: DedupMap<u32, SoundKey>,
    envelopes: DedupMap<u32, EnvelopeKey>,
    keymaps: DedupMap<u32, KeyMapKey>,
    wavetables: DedupMap<u32, WaveTableKey>,
}

impl<'a> LoadContext<'a> {
    fn new(data: &'a [u8], options: &'a LoadOptions) -> Self {
        Self {
            data,
            options,
            ids: IdGenerator::default(),
            file: BankFile::new(),
            instruments: DedupMap::new(),
            sounds: DedupMap::new(),
            envelopes: DedupMap::new(),
            keymaps: DedupMap::new(),
            wavetables: DedupMap::new(),
        }
    }

    fn cursor(&self, kind: NodeKind, offset: u32) -> Result<ByteCursor<'a>> {
        if offset == 0 {
            return Err(CtlError::UnresolvedReference {
                kind,
                name: "offset 0".to_owned(),
            });
        }
        trace!("reading {} at {:#x}", kind, offset);
        Ok(ByteCursor::at(self.data, offset as usize)?)
    }

    fn load_bank(&mut self, offset: u32) -> Result<Bank> {
        let mut cursor = self.cursor(NodeKind::Bank, offset)?;
        let count = read_count(&mut cursor, NodeKind::Bank)?;
        let flags = cursor.read_u8()?;
        cursor.skip(1)?;
        let sample_rate = cursor.read_i32()?;
        let percussion = cursor.read_u32()?;
        let slots = read_offsets(&mut cursor, count)?;

        let (id, name) = self.ids.next_named(NodeKind::Bank);
        let percussion = match percussion {
            0 => None,
            offset => Some(self.load_instrument(offset)?),
        };
        let mut instruments = Vec::with_capacity(slots.len());
        for slot in slots {
            instruments.push(match slot {
                0 => None,
                offset => Some(self.load_instrument(offset)?),
            });
        }

        Ok(Bank {
            id,
            name,
            flags,
            sample_rate,
            percussion,
            instruments,
        })
    }

    fn load_instrument(&mut self, offset: u32) -> Result<InstrumentKey> {
        if let Some(key) = self.instruments.get(&offset) {
            return Ok(key);
        }

        let mut cursor = self.cursor(NodeKind::Instrument, offset)?;
        let volume = cursor.read_u8()?;
        let pan = cursor.read_u8()?;
        let priority = cursor.read_u8()?;
        let flags = cursor.read_u8()?;
        let tremolo = read_modulation(&mut cursor)?;
        let vibrato = read_modulation(&mut cursor)?;
        let bend_range = cursor.read_i16()?;
        let count = read_count(&mut cursor, NodeKind::Instrument)?;
        let sound_offsets = read_offsets(&mut cursor, count)?;

        let (id, name) = self.ids.next_named(NodeKind::Instrument);
        let mut sounds = Vec::with_capacity(sound_offsets.len());
        for (i, sound) in sound_offsets.into_iter().enumerate() {
            if sound == 0 {
                return Err(CtlError::UnresolvedReference {
                    kind: NodeKind::Sound,
                    name: format!("{}.sound[{}]", name, i),
                });
            }
            sounds.push(self.load_sound(sound)?);
        }

        let key = self.file.instruments.insert(Instrument {
            id,
            name,
            volume,
            pan,
            priority,
            flags,
            tremolo,
            vibrato,
            bend_range,
            sounds,
        });
        self.instruments.insert(offset, key);
        Ok(key)
    }

    fn load_sound(&mut self, offset: u32) -> Result<SoundKey> {
        if let Some(key) = self.sounds.get(&offset) {
            return Ok(key);
        }

        let mut cursor = self.cursor(NodeKind::Sound, offset)?;
        let envelope = cursor.read_u32()?;
        let keymap = cursor.read_u32()?;
        let wavetable = cursor.read_u32()?;
        let pan = cursor.read_u8()?;
        let volume = cursor.read_u8()?;
        let flags = cursor.read_u8()?;

        let (id, name) = self.ids.next_named(NodeKind::Sound);
        let envelope = match envelope {
            0 => None,
            offset => Some(self.load_envelope(offset)?),
        };
        let keymap = match keymap {
            0 => None,
            offset => Some(self.load_keymap(offset)?),
        };
        let wavetable = match wavetable {
            0 => None,
            offset => Some(self.load_wavetable(offset)?),
        };

        let key = self.file.sounds.insert(Sound {
            id,
            name,
            pan,
            volume,
            flags,
            envelope,
            keymap,
            wavetable,
        });
        self.sounds.insert(offset, key);
        Ok(key)
    }

    fn load_envelope(&mut self, offset: u32) -> Result<EnvelopeKey> {
        let mut cursor = self.cursor(NodeKind::Envelope, offset)?;
        let Self {
            ids,
            file,
            envelopes,
            ..
        } = self;

        envelopes.get_or_try_create(offset, || -> Result<EnvelopeKey> {
            let attack_time = cursor.read_i32()?;
            let decay_time = cursor.read_i32()?;
            let release_time = cursor.read_i32()?;
            let attack_volume = cursor.read_u8()?;
            let decay_volume = cursor.read_u8()?;
            let (id, name) = ids.next_named(NodeKind::Envelope);
            Ok(file.envelopes.insert(Envelope {
                id,
                name,
                attack_time,
                decay_time,
                release_time,
                attack_volume,
                decay_volume,
            }))
        })
    }

    fn load_keymap(&mut self, offset: u32) -> Result<KeyMapKey> {
        let mut cursor = self.cursor(NodeKind::KeyMap, offset)?;
        let Self {
            ids, file, keymaps, ..
        } = self;

        keymaps.get_or_try_create(offset, || -> Result<KeyMapKey> {
            let velocity_min = cursor.read_u8()?;
            let velocity_max = cursor.read_u8()?;
            let key_min = cursor.read_u8()?;
            let key_max = cursor.read_u8()?;
            let key_base = cursor.read_u8()?;
            let detune = cursor.read_i8()?;
            let (id, name) = ids.next_named(NodeKind::KeyMap);
            Ok(file.keymaps.insert(KeyMap {
                id,
                name,
                velocity_min,
                velocity_max,
                key_min,
                key_max,
                key_base,
                detune,
            }))
        })
    }

    fn load_wavetable(&mut self, offset: u32) -> Result<WaveTableKey> {
        if let Some(key) = self.wavetables.get(&offset) {
            return Ok(key);
        }

        let mut cursor = self.cursor(NodeKind::WaveTable, offset)?;
        let base = cursor.read_u32()?;
        let len = cursor.read_i32()?;
        let len = u32::try_from(len).map_err(|_| CtlError::ValueOutOfRange {
            field: "wavetable len",
            value: len.into(),
        })?;
        let tag = cursor.read_u8()?;
        let flags = cursor.read_u8()?;
        cursor.skip(2)?;

        let kind = match tag {
            WaveKind::ADPCM_TAG => {
                let looping = cursor.read_u32()?;
                let book = cursor.read_u32()?;
                WaveKind::Adpcm {
                    looping: match looping {
                        0 => None,
                        offset => Some(self.read_adpcm_loop(offset)?),
                    },
                    book: match book {
                        0 => None,
                        offset => Some(self.read_book(offset)?),
                    },
                }
            }
            WaveKind::RAW16_TAG => {
                let looping = cursor.read_u32()?;
                WaveKind::Raw16 {
                    looping: match looping {
                        0 => None,
                        offset => Some(self.read_raw_loop(offset)?),
                    },
                }
            }
            other => {
                return Err(CtlError::UnsupportedFeature(format!(
                    "wavetable type {} at {:#x}",
                    other, offset
                )))
            }
        };

        let id = self.ids.next_id(NodeKind::WaveTable);
        let aifc_path = format!("{}{:04}.aifc", self.options.aifc_prefix, id);
        let key = self.file.wavetables.insert(WaveTable {
            id,
            aifc_path,
            base,
            len,
            flags,
            kind,
        });
        self.wavetables.insert(offset, key);
        Ok(key)
    }

    fn read_adpcm_loop(&self, offset: u32) -> Result<AdpcmLoop> {
        let mut cursor = self.cursor(NodeKind::WaveTable, offset)?;
        Ok(AdpcmLoop {
            start: cursor.read_u32()?,
            end: cursor.read_u32()?,
            count: cursor.read_u32()?,
            state: cursor.read_array()?,
        })
    }

    fn read_raw_loop(&self, offset: u32) -> Result<RawLoop> {
        let mut cursor = self.cursor(NodeKind::WaveTable, offset)?;
        Ok(RawLoop {
            start: cursor.read_u32()?,
            end: cursor.read_u32()?,
            count: cursor.read_u32()?,
        })
    }

    fn read_book(&self, offset: u32) -> Result<AdpcmBook> {
        let mut cursor = self.cursor(NodeKind::WaveTable, offset)?;
        let order = cursor.read_i32()?;
        let npredictors = cursor.read_i32()?;

        let order = i16::try_from(order)
            .ok()
            .filter(|order| *order >= 0)
            .ok_or(CtlError::ValueOutOfRange {
                field: "book order",
                value: order.into(),
            })?;
        let npredictors = u16::try_from(npredictors).map_err(|_| CtlError::ValueOutOfRange {
            field: "book npredictors",
            value: npredictors.into(),
        })?;

        let len = order as usize * npredictors as usize * 16;
        let table = cursor.read_bytes(len)?.to_vec();
        Ok(AdpcmBook {
            order,
            npredictors,
            table,
        })
    }
}

fn read_count(cursor: &mut ByteCursor, kind: NodeKind) -> Result<usize> {
    let offset = cursor.position();
    let count = cursor.read_i16()?;
    usize::try_from(count).map_err(|_| CtlError::NegativeCount {
        kind,
        offset,
        count: count.into(),
    })
}

fn read_offsets(cursor: &mut ByteCursor, count: usize) -> Result<Vec<u32>> {
    let mut offsets = Vec::with_capacity(count);
    for _ in 0..count {
        offsets.push(cursor.read_u32()?);
    }
    Ok(offsets)
}

fn read_modulation(cursor: &mut ByteCursor) -> Result<Modulation> {
    Ok(Modulation {
        kind: cursor.read_u8()?,
        rate: cursor.read_u8()?,
        depth: cursor.read_u8()?,
        delay: cursor.read_u8()?,
    })
}

//! Builds a [`BankFile`] from scanned `.inst` declarations.
//!
//! Phase one turns each declaration into a pending node and files it by
//! name in its kind's orphan pool. References are still names at this
//! point, since the text may refer to declarations further down. Phase two
//! starts from the banks and pulls every referenced node out of its pool,
//! so whatever is left in a pool afterwards was never referenced.

use super::lexer::{Declaration, Property, Scanner, Value};
use crate::dedup::DedupMap;
use crate::error::*;
use crate::model::*;
use log::debug;
use std::collections::HashMap;
use std::convert::TryFrom;

/// Parses and resolves a whole `.inst` text.
pub fn parse_inst(text: &str) -> Result<BankFile> {
    let declarations = Scanner::new().scan(text)?;
    let pools = Pools::collect(declarations)?;
    Resolver::new(pools).resolve()
}

/// A reference that has not been looked up yet.
#[derive(Debug, Clone)]
struct NameRef {
    line: usize,
    name: String,
}

#[derive(Debug, Clone)]
struct IndexedRef {
    line: usize,
    index: u32,
    name: String,
}

#[derive(Debug, Default)]
struct PendingBank {
    line: usize,
    name: String,
    flags: u8,
    sample_rate: i32,
    percussion: Option<NameRef>,
    instruments: Vec<IndexedRef>,
    /// Slot count, when it runs past the last assigned index.
    instrument_count: Option<u32>,
}

#[derive(Debug, Default)]
struct PendingInstrument {
    line: usize,
    volume: u8,
    pan: u8,
    priority: u8,
    flags: u8,
    tremolo: Modulation,
    vibrato: Modulation,
    bend_range: i16,
    sounds: Vec<IndexedRef>,
}

#[derive(Debug, Default)]
struct PendingSound {
    line: usize,
    pan: u8,
    volume: u8,
    flags: u8,
    wavetable: Option<String>,
    envelope: Option<NameRef>,
    keymap: Option<NameRef>,
}

#[derive(Debug)]
struct PendingEnvelope {
    line: usize,
    node: Envelope,
}

#[derive(Debug)]
struct PendingKeyMap {
    line: usize,
    node: KeyMap,
}

/// Phase one output: banks in declaration order, everything else pooled by
/// name.
#[derive(Debug, Default)]
struct Pools {
    banks: Vec<PendingBank>,
    instruments: HashMap<String, PendingInstrument>,
    sounds: HashMap<String, PendingSound>,
    envelopes: HashMap<String, PendingEnvelope>,
    keymaps: HashMap<String, PendingKeyMap>,
}

impl Pools {
    fn collect(declarations: Vec<Declaration>) -> Result<Self> {
        let mut pools = Pools::default();
        for declaration in declarations {
            pools.add(declaration)?;
        }
        debug!(
            "pooled {} banks, {} instruments, {} sounds, {} envelopes, {} keymaps",
            pools.banks.len(),
            pools.instruments.len(),
            pools.sounds.len(),
            pools.envelopes.len(),
            pools.keymaps.len()
        );
        Ok(pools)
    }

    fn add(&mut self, declaration: Declaration) -> Result<()> {
        let Declaration {
            line,
            type_name,
            name,
            properties,
        } = declaration;
        let kind = NodeKind::from_keyword(&type_name).ok_or(CtlError::UnknownType {
            line,
            name: type_name,
        })?;

        let duplicate = match kind {
            NodeKind::Bank => self.banks.iter().any(|b| b.name == name),
            NodeKind::Instrument => self.instruments.contains_key(&name),
            NodeKind::Sound => self.sounds.contains_key(&name),
            NodeKind::Envelope => self.envelopes.contains_key(&name),
            NodeKind::KeyMap => self.keymaps.contains_key(&name),
            NodeKind::WaveTable => false,
        };
        if duplicate {
            return Err(CtlError::DuplicateInstance { line, kind, name });
        }

        match kind {
            NodeKind::Bank => {
                let mut bank = PendingBank {
                    line,
                    name,
                    ..Default::default()
                };
                for property in &properties {
                    bank.apply(property)?;
                }
                self.banks.push(bank);
            }
            NodeKind::Instrument => {
                let mut instrument = PendingInstrument {
                    line,
                    ..Default::default()
                };
                for property in &properties {
                    instrument.apply(property)?;
                }
                self.instruments.insert(name, instrument);
            }
            NodeKind::Sound => {
                let mut sound = PendingSound {
                    line,
                    ..Default::default()
                };
                for property in &properties {
                    sound.apply(property)?;
                }
                self.sounds.insert(name, sound);
            }
            NodeKind::Envelope => {
                let mut node = Envelope {
                    id: 0,
                    name: name.clone(),
                    attack_time: 0,
                    decay_time: 0,
                    release_time: 0,
                    attack_volume: 0,
                    decay_volume: 0,
                };
                for property in &properties {
                    apply_envelope(&mut node, property)?;
                }
                self.envelopes.insert(name, PendingEnvelope { line, node });
            }
            NodeKind::KeyMap => {
                let mut node = KeyMap {
                    id: 0,
                    name: name.clone(),
                    velocity_min: 0,
                    velocity_max: 0,
                    key_min: 0,
                    key_max: 0,
                    key_base: 0,
                    detune: 0,
                };
                for property in &properties {
                    apply_keymap(&mut node, property)?;
                }
                self.keymaps.insert(name, PendingKeyMap { line, node });
            }
            NodeKind::WaveTable => {
                return Err(CtlError::UnknownType {
                    line,
                    name: kind.keyword().to_owned(),
                })
            }
        }
        Ok(())
    }

    /// The earliest declared node left in any pool.
    fn first_orphan(&self) -> Option<(usize, NodeKind, &str)> {
        let instruments = self
            .instruments
            .iter()
            .map(|(n, p)| (p.line, NodeKind::Instrument, n.as_str()));
        let sounds = self
            .sounds
            .iter()
            .map(|(n, p)| (p.line, NodeKind::Sound, n.as_str()));
        let envelopes = self
            .envelopes
            .iter()
            .map(|(n, p)| (p.line, NodeKind::Envelope, n.as_str()));
        let keymaps = self
            .keymaps
            .iter()
            .map(|(n, p)| (p.line, NodeKind::KeyMap, n.as_str()));
        instruments
            .chain(sounds)
            .chain(envelopes)
            .chain(keymaps)
            .min_by_key(|(line, _, name)| (*line, *name))
    }
}

fn int(property: &Property) -> Result<i64> {
    match property.value {
        Value::Int(value) => Ok(value),
        _ => Err(wrong_kind(property)),
    }
}

fn narrow<T: TryFrom<i64>>(property: &Property, field: &'static str) -> Result<T> {
    let value = int(property)?;
    T::try_from(value).map_err(|_| CtlError::ValueOutOfRange { field, value })
}

fn reference(property: &Property) -> Result<NameRef> {
    match &property.value {
        Value::Ref(name) => Ok(NameRef {
            line: property.line,
            name: name.clone(),
        }),
        _ => Err(wrong_kind(property)),
    }
}

fn indexed(property: &Property) -> Result<IndexedRef> {
    match &property.value {
        Value::Indexed { index, target } => Ok(IndexedRef {
            line: property.line,
            index: *index,
            name: target.clone(),
        }),
        _ => Err(wrong_kind(property)),
    }
}

fn wrong_kind(property: &Property) -> CtlError {
    CtlError::WrongValueKind {
        line: property.line,
        name: property.name.clone(),
    }
}

fn unknown(property: &Property, kind: NodeKind) -> CtlError {
    CtlError::UnknownProperty {
        line: property.line,
        kind,
        name: property.name.clone(),
    }
}

impl PendingBank {
    fn apply(&mut self, p: &Property) -> Result<()> {
        match p.name.as_str() {
            "sampleRate" => self.sample_rate = narrow(p, "sampleRate")?,
            "flags" => self.flags = narrow(p, "flags")?,
            "percussionDefault" => self.percussion = Some(reference(p)?),
            "instrument" => self.instruments.push(indexed(p)?),
            "instrumentCount" => self.instrument_count = Some(narrow(p, "instrumentCount")?),
            _ => return Err(unknown(p, NodeKind::Bank)),
        }
        Ok(())
    }
}

impl PendingInstrument {
    fn apply(&mut self, p: &Property) -> Result<()> {
        match p.name.as_str() {
            "volume" => self.volume = narrow(p, "volume")?,
            "pan" => self.pan = narrow(p, "pan")?,
            "priority" => self.priority = narrow(p, "priority")?,
            "flags" => self.flags = narrow(p, "flags")?,
            "tremeloType" => self.tremolo.kind = narrow(p, "tremeloType")?,
            "tremeloRate" => self.tremolo.rate = narrow(p, "tremeloRate")?,
            "tremeloDepth" => self.tremolo.depth = narrow(p, "tremeloDepth")?,
            "tremeloDelay" => self.tremolo.delay = narrow(p, "tremeloDelay")?,
            "vibratoType" => self.vibrato.kind = narrow(p, "vibratoType")?,
            "vibratoRate" => self.vibrato.rate = narrow(p, "vibratoRate")?,
            "vibratoDepth" => self.vibrato.depth = narrow(p, "vibratoDepth")?,
            "vibratoDelay" => self.vibrato.delay = narrow(p, "vibratoDelay")?,
            "bendRange" => self.bend_range = narrow(p, "bendRange")?,
            "sound" => self.sounds.push(indexed(p)?),
            _ => return Err(unknown(p, NodeKind::Instrument)),
        }
        Ok(())
    }
}

impl PendingSound {
    fn apply(&mut self, p: &Property) -> Result<()> {
        match p.name.as_str() {
            "use" => match &p.value {
                Value::Use(path) => self.wavetable = Some(path.clone()),
                _ => return Err(wrong_kind(p)),
            },
            "pan" => self.pan = narrow(p, "pan")?,
            "volume" => self.volume = narrow(p, "volume")?,
            "flags" => self.flags = narrow(p, "flags")?,
            "envelope" => self.envelope = Some(reference(p)?),
            "keymap" => self.keymap = Some(reference(p)?),
            _ => return Err(unknown(p, NodeKind::Sound)),
        }
        Ok(())
    }
}

fn apply_envelope(node: &mut Envelope, p: &Property) -> Result<()> {
    match p.name.as_str() {
        "attackTime" => node.attack_time = narrow(p, "attackTime")?,
        "attackVolume" => node.attack_volume = narrow(p, "attackVolume")?,
        "decayTime" => node.decay_time = narrow(p, "decayTime")?,
        "decayVolume" => node.decay_volume = narrow(p, "decayVolume")?,
        "releaseTime" => node.release_time = narrow(p, "releaseTime")?,
        _ => return Err(unknown(p, NodeKind::Envelope)),
    }
    Ok(())
}

fn apply_keymap(node: &mut KeyMap, p: &Property) -> Result<()> {
    match p.name.as_str() {
        "velocityMin" => node.velocity_min = narrow(p, "velocityMin")?,
        "velocityMax" => node.velocity_max = narrow(p, "velocityMax")?,
        "keyMin" => node.key_min = narrow(p, "keyMin")?,
        "keyMax" => node.key_max = narrow(p, "keyMax")?,
        "keyBase" => node.key_base = narrow(p, "keyBase")?,
        "detune" => node.detune = narrow(p, "detune")?,
        _ => return Err(unknown(p, NodeKind::KeyMap)),
    }
    Ok(())
}

/// Largest array index accepted, the element count field of a `.ctl`
/// record is an `i16`.
const MAX_ARRAY_INDEX: u32 = i16::MAX as u32 - 1;

/// Orders array references by their declared index. Ties are an error.
fn sort_indexed(owner: &str, mut refs: Vec<IndexedRef>) -> Result<Vec<IndexedRef>> {
    if let Some(r) = refs.iter().find(|r| r.index > MAX_ARRAY_INDEX) {
        return Err(CtlError::ValueOutOfRange {
            field: "array index",
            value: r.index.into(),
        });
    }
    refs.sort_by_key(|r| r.index);
    if let Some(pair) = refs.windows(2).find(|pair| pair[0].index == pair[1].index) {
        return Err(CtlError::DuplicateIndex {
            line: pair[1].line,
            name: owner.to_owned(),
            index: pair[1].index,
        });
    }
    Ok(refs)
}

/// Phase two.
struct Resolver {
    pools: Pools,
    ids: IdGenerator,
    file: BankFile,
    instruments: DedupMap<String, InstrumentKey>,
    sounds: DedupMap<String, SoundKey>,
    envelopes: DedupMap<String, EnvelopeKey>,
    keymaps: DedupMap<String, KeyMapKey>,
    wavetables: DedupMap<String, WaveTableKey>,
}

impl Resolver {
    fn new(pools: Pools) -> Self {
        Self {
            pools,
            ids: IdGenerator::default(),
            file: BankFile::new(),
            instruments: DedupMap::new(),
            sounds: DedupMap::new(),
            envelopes: DedupMap::new(),
            keymaps: DedupMap::new(),
            wavetables: DedupMap::new(),
        }
    }

    fn resolve(mut self) -> Result<BankFile> {
        let banks = std::mem::take(&mut self.pools.banks);
        for pending in banks {
            let bank = self.resolve_bank(pending)?;
            self.file.banks.push(bank);
        }

        if let Some((_, kind, name)) = self.pools.first_orphan() {
            return Err(CtlError::OrphanedInstance {
                kind,
                name: name.to_owned(),
            });
        }
        if self.file.banks.is_empty() {
            return Err(CtlError::EmptyBankFile);
        }
        Ok(self.file)
    }

    fn resolve_bank(&mut self, pending: PendingBank) -> Result<Bank> {
        let id = self.ids.next_id(NodeKind::Bank);
        let percussion = match &pending.percussion {
            Some(r) => Some(self.resolve_instrument(r.line, &r.name)?),
            None => None,
        };

        let refs = sort_indexed(&pending.name, pending.instruments)?;
        let assigned = refs.last().map_or(0, |r| r.index + 1);
        let slots = match pending.instrument_count {
            Some(count) if count < assigned || count > MAX_ARRAY_INDEX + 1 => {
                return Err(CtlError::ValueOutOfRange {
                    field: "instrumentCount",
                    value: count.into(),
                })
            }
            Some(count) => count,
            None => assigned,
        };
        let mut instruments = vec![None; slots as usize];
        for r in refs {
            instruments[r.index as usize] = Some(self.resolve_instrument(r.line, &r.name)?);
        }

        debug!("resolved bank {} from line {}", pending.name, pending.line);
        Ok(Bank {
            id,
            name: pending.name,
            flags: pending.flags,
            sample_rate: pending.sample_rate,
            percussion,
            instruments,
        })
    }

    fn resolve_instrument(&mut self, line: usize, name: &str) -> Result<InstrumentKey> {
        if let Some(key) = self.instruments.get(name) {
            return Ok(key);
        }
        let pending = self
            .pools
            .instruments
            .remove(name)
            .ok_or_else(|| unresolved(NodeKind::Instrument, name, line))?;

        let id = self.ids.next_id(NodeKind::Instrument);
        // Sound lists are dense, so indices must run 0, 1, 2, ...
        let mut sounds = Vec::with_capacity(pending.sounds.len());
        for (expected, r) in sort_indexed(name, pending.sounds)?.into_iter().enumerate() {
            if r.index as usize != expected {
                return Err(CtlError::IndexGap {
                    line: r.line,
                    name: name.to_owned(),
                    index: r.index,
                    expected: expected as u32,
                });
            }
            sounds.push(self.resolve_sound(r.line, &r.name)?);
        }

        let key = self.file.instruments.insert(Instrument {
            id,
            name: name.to_owned(),
            volume: pending.volume,
            pan: pending.pan,
            priority: pending.priority,
            flags: pending.flags,
            tremolo: pending.tremolo,
            vibrato: pending.vibrato,
            bend_range: pending.bend_range,
            sounds,
        });
        self.instruments.insert(name.to_owned(), key);
        Ok(key)
    }

    fn resolve_sound(&mut self, line: usize, name: &str) -> Result<SoundKey> {
        if let Some(key) = self.sounds.get(name) {
            return Ok(key);
        }
        let pending = self
            .pools
            .sounds
            .remove(name)
            .ok_or_else(|| unresolved(NodeKind::Sound, name, line))?;

        let id = self.ids.next_id(NodeKind::Sound);
        let envelope = match &pending.envelope {
            Some(r) => Some(self.resolve_envelope(r)?),
            None => None,
        };
        let keymap = match &pending.keymap {
            Some(r) => Some(self.resolve_keymap(r)?),
            None => None,
        };
        let wavetable = match pending.wavetable {
            Some(path) => Some(self.resolve_wavetable(path)),
            None => None,
        };

        let key = self.file.sounds.insert(Sound {
            id,
            name: name.to_owned(),
            pan: pending.pan,
            volume: pending.volume,
            flags: pending.flags,
            envelope,
            keymap,
            wavetable,
        });
        self.sounds.insert(name.to_owned(), key);
        Ok(key)
    }

    fn resolve_envelope(&mut self, r: &NameRef) -> Result<EnvelopeKey> {
        let Self {
            pools,
            ids,
            file,
            envelopes,
            ..
        } = self;
        envelopes.get_or_try_create(r.name.clone(), || -> Result<EnvelopeKey> {
            let mut pending = pools
                .envelopes
                .remove(&r.name)
                .ok_or_else(|| unresolved(NodeKind::Envelope, &r.name, r.line))?;
            pending.node.id = ids.next_id(NodeKind::Envelope);
            Ok(file.envelopes.insert(pending.node))
        })
    }

    fn resolve_keymap(&mut self, r: &NameRef) -> Result<KeyMapKey> {
        let Self {
            pools,
            ids,
            file,
            keymaps,
            ..
        } = self;
        keymaps.get_or_try_create(r.name.clone(), || -> Result<KeyMapKey> {
            let mut pending = pools
                .keymaps
                .remove(&r.name)
                .ok_or_else(|| unresolved(NodeKind::KeyMap, &r.name, r.line))?;
            pending.node.id = ids.next_id(NodeKind::KeyMap);
            Ok(file.keymaps.insert(pending.node))
        })
    }

    /// Sounds naming the same file share one wavetable. Only the path is
    /// known from text; the sample itself lives in that file.
    fn resolve_wavetable(&mut self, path: String) -> WaveTableKey {
        if let Some(key) = self.wavetables.get(path.as_str()) {
            return key;
        }
        let key = self.file.wavetables.insert(WaveTable {
            id: self.ids.next_id(NodeKind::WaveTable),
            aifc_path: path.clone(),
            base: 0,
            len: 0,
            flags: 0,
            kind: WaveKind::Adpcm {
                looping: None,
                book: None,
            },
        });
        self.wavetables.insert(path, key);
        key
    }
}

fn unresolved(kind: NodeKind, name: &str, line: usize) -> CtlError {
    debug!("line {}: no {} named {}", line, kind, name);
    CtlError::UnresolvedReference {
        kind,
        name: name.to_owned(),
    }
}

use crate::error::*;
use crate::model::*;
use std::collections::HashSet;
use std::io::Write;

/// Which scalar fields are written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Every field.
    Sfx,
    /// Leaves out flags, tremelo and vibrato, which music banks never set.
    Music,
}

impl Default for OutputMode {
    fn default() -> Self {
        OutputMode::Sfx
    }
}

/// Writes a [`BankFile`] as `.inst` text.
///
/// Declarations come in dependency order: each envelope, keymap, sound and
/// instrument is written once, just before the first declaration that
/// refers to it.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstWriter {
    pub mode: OutputMode,
}

/// Nodes already written during one pass.
#[derive(Default)]
struct Visited {
    instruments: HashSet<InstrumentKey>,
    sounds: HashSet<SoundKey>,
    envelopes: HashSet<EnvelopeKey>,
    keymaps: HashSet<KeyMapKey>,
}

impl InstWriter {
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }

    pub fn write<W: Write>(&self, file: &BankFile, mut out: W) -> Result<()> {
        let mut visited = Visited::default();
        for bank in &file.banks {
            for key in bank.instrument_keys() {
                self.write_instrument(file, key, &mut visited, &mut out)?;
            }
            self.write_bank(file, bank, &mut out)?;
        }
        Ok(())
    }

    pub fn write_to_string(&self, file: &BankFile) -> Result<String> {
        let mut out = Vec::new();
        self.write(file, &mut out)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    fn sfx(&self) -> bool {
        self.mode == OutputMode::Sfx
    }

    fn write_bank<W: Write>(&self, file: &BankFile, bank: &Bank, out: &mut W) -> Result<()> {
        writeln!(out, "bank {}\n{{", bank.name)?;
        if self.sfx() {
            writeln!(out, "    flags = {};", bank.flags)?;
        }
        writeln!(out, "    sampleRate = {};", bank.sample_rate)?;
        if let Some(key) = bank.percussion {
            writeln!(
                out,
                "    percussionDefault = {};",
                file.instruments[key].name
            )?;
        }
        // Empty slots after the last instrument only show up in the count.
        let assigned = bank.instruments.iter().rposition(Option::is_some).map_or(0, |i| i + 1);
        if bank.instruments.len() > assigned {
            writeln!(out, "    instrumentCount = {};", bank.instruments.len())?;
        }
        for (i, slot) in bank.instruments.iter().enumerate() {
            if let Some(key) = slot {
                writeln!(
                    out,
                    "    instrument [{}] = {};",
                    i, file.instruments[*key].name
                )?;
            }
        }
        writeln!(out, "}}\n")?;
        Ok(())
    }

    fn write_instrument<W: Write>(
        &self,
        file: &BankFile,
        key: InstrumentKey,
        visited: &mut Visited,
        out: &mut W,
    ) -> Result<()> {
        if !visited.instruments.insert(key) {
            return Ok(());
        }
        let instrument = &file.instruments[key];
        for sound in &instrument.sounds {
            self.write_sound(file, *sound, visited, out)?;
        }

        writeln!(out, "instrument {}\n{{", instrument.name)?;
        writeln!(out, "    volume = {};", instrument.volume)?;
        writeln!(out, "    pan = {};", instrument.pan)?;
        writeln!(out, "    priority = {};", instrument.priority)?;
        if self.sfx() {
            writeln!(out, "    flags = {};", instrument.flags)?;
            write_modulation(out, "tremelo", &instrument.tremolo)?;
            write_modulation(out, "vibrato", &instrument.vibrato)?;
        }
        writeln!(out, "    bendRange = {};", instrument.bend_range)?;
        for (i, sound) in instrument.sounds.iter().enumerate() {
            writeln!(out, "    sound [{}] = {};", i, file.sounds[*sound].name)?;
        }
        writeln!(out, "}}\n")?;
        Ok(())
    }

    fn write_sound<W: Write>(
        &self,
        file: &BankFile,
        key: SoundKey,
        visited: &mut Visited,
        out: &mut W,
    ) -> Result<()> {
        if !visited.sounds.insert(key) {
            return Ok(());
        }
        let sound = &file.sounds[key];
        if let Some(envelope) = sound.envelope {
            if visited.envelopes.insert(envelope) {
                write_envelope(out, &file.envelopes[envelope])?;
            }
        }
        if let Some(keymap) = sound.keymap {
            if visited.keymaps.insert(keymap) {
                write_keymap(out, &file.keymaps[keymap])?;
            }
        }

        writeln!(out, "sound {}\n{{", sound.name)?;
        if let Some(wavetable) = sound.wavetable {
            writeln!(out, "    use (\"{}\");", file.wavetables[wavetable].aifc_path)?;
        }
        writeln!(out, "    pan = {};", sound.pan)?;
        writeln!(out, "    volume = {};", sound.volume)?;
        if self.sfx() {
            writeln!(out, "    flags = {};", sound.flags)?;
        }
        if let Some(envelope) = sound.envelope {
            writeln!(out, "    envelope = {};", file.envelopes[envelope].name)?;
        }
        if let Some(keymap) = sound.keymap {
            writeln!(out, "    keymap = {};", file.keymaps[keymap].name)?;
        }
        writeln!(out, "}}\n")?;
        Ok(())
    }
}

fn write_modulation<W: Write>(out: &mut W, prefix: &str, m: &Modulation) -> Result<()> {
    writeln!(out, "    {}Type = {};", prefix, m.kind)?;
    writeln!(out, "    {}Rate = {};", prefix, m.rate)?;
    writeln!(out, "    {}Depth = {};", prefix, m.depth)?;
    writeln!(out, "    {}Delay = {};", prefix, m.delay)?;
    Ok(())
}

fn write_envelope<W: Write>(out: &mut W, envelope: &Envelope) -> Result<()> {
    writeln!(out, "envelope {}\n{{", envelope.name)?;
    writeln!(out, "    attackTime = {};", envelope.attack_time)?;
    writeln!(out, "    attackVolume = {};", envelope.attack_volume)?;
    writeln!(out, "    decayTime = {};", envelope.decay_time)?;
    writeln!(out, "    decayVolume = {};", envelope.decay_volume)?;
    writeln!(out, "    releaseTime = {};", envelope.release_time)?;
    writeln!(out, "}}\n")?;
    Ok(())
}

fn write_keymap<W: Write>(out: &mut W, keymap: &KeyMap) -> Result<()> {
    writeln!(out, "keymap {}\n{{", keymap.name)?;
    writeln!(out, "    velocityMin = {};", keymap.velocity_min)?;
    writeln!(out, "    velocityMax = {};", keymap.velocity_max)?;
    writeln!(out, "    keyMin = {};", keymap.key_min)?;
    writeln!(out, "    keyMax = {};", keymap.key_max)?;
    writeln!(out, "    keyBase = {};", keymap.key_base)?;
    writeln!(out, "    detune = {};", keymap.detune)?;
    writeln!(out, "}}\n")?;
    Ok(())
}

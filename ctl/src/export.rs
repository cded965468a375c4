//! Writing the samples of a bank out as `.aifc` files.

use crate::error::*;
use crate::model::*;
use aifc::{AdpcmAifcFile, CodebookChunk};
use log::{debug, warn};
use n64io::ByteCursor;
use std::collections::HashSet;
use std::convert::TryFrom;
use std::path::{Path, PathBuf};

/// Builds the AIFC file for one sound. The sample rate comes from `bank`,
/// the sample bytes from the `(base, len)` range of `tbl`.
pub fn sound_to_aifc(
    file: &BankFile,
    bank: &Bank,
    sound: SoundKey,
    tbl: &[u8],
) -> Result<AdpcmAifcFile> {
    let sound = &file.sounds[sound];
    let wavetable = sound
        .wavetable
        .map(|key| &file.wavetables[key])
        .ok_or_else(|| CtlError::UnsupportedFeature(format!("{} has no wavetable", sound.name)))?;
    wavetable_to_aifc(bank, wavetable, tbl)
}

fn wavetable_to_aifc(bank: &Bank, wavetable: &WaveTable, tbl: &[u8]) -> Result<AdpcmAifcFile> {
    let (looping, book) = match &wavetable.kind {
        WaveKind::Adpcm {
            looping,
            book: Some(book),
        } => (looping, book),
        WaveKind::Adpcm { book: None, .. } => {
            return Err(CtlError::UnsupportedFeature(format!(
                "{} has no codebook",
                wavetable.aifc_path
            )))
        }
        WaveKind::Raw16 { .. } => {
            return Err(CtlError::UnsupportedFeature(format!(
                "{} is raw 16-bit PCM",
                wavetable.aifc_path
            )))
        }
    };

    let sample_rate = u32::try_from(bank.sample_rate).map_err(|_| CtlError::ValueOutOfRange {
        field: "sampleRate",
        value: bank.sample_rate.into(),
    })?;
    let codebook = CodebookChunk::new(book.order, book.npredictors, book.table.clone())?;
    let lp = looping.map(|lp| aifc::AdpcmLoop {
        start: lp.start,
        end: lp.end,
        count: lp.count,
        state: lp.state,
    });
    let data = ByteCursor::at(tbl, wavetable.base as usize)?
        .read_bytes(wavetable.len as usize)?
        .to_vec();

    Ok(AdpcmAifcFile::new(sample_rate, codebook, lp, data))
}

/// Writes one `.aifc` per distinct ADPCM wavetable into `out_dir`, named by
/// the wavetable's `aifc_path`. Raw wavetables are skipped.
pub fn export_bank_file(file: &BankFile, tbl: &[u8], out_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    let mut seen = HashSet::new();

    for bank in &file.banks {
        for instrument in bank.instrument_keys() {
            for sound in &file.instruments[instrument].sounds {
                let key = match file.sounds[*sound].wavetable {
                    Some(key) => key,
                    None => continue,
                };
                if !seen.insert(key) {
                    continue;
                }

                let wavetable = &file.wavetables[key];
                if let WaveKind::Raw16 { .. } = wavetable.kind {
                    warn!("skipping raw wavetable {}", wavetable.aifc_path);
                    continue;
                }
                let aifc = wavetable_to_aifc(bank, wavetable, tbl)?;
                let path = out_dir.join(&wavetable.aifc_path);
                std::fs::write(&path, aifc.to_bytes()?)?;
                debug!("wrote {}", path.display());
                written.push(path);
            }
        }
    }
    Ok(written)
}

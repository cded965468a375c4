use anyhow::{Context, Result};
use clap::Args;
use cseq::{CseqFile, GmidTrack};
use log::info;
use n64io::{read_input, Limits};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

#[derive(Args)]
pub struct Cseq2MidiArgs {
    /// Compressed sequence to read
    pub cseq: PathBuf,

    /// Standard MIDI File to write
    pub midi: PathBuf,
}

pub fn cseq2midi(args: Cseq2MidiArgs, limits: &Limits) -> Result<()> {
    let data = read_input(&args.cseq, limits)
        .with_context(|| format!("Failed to read: {}", args.cseq.display()))?;
    let file = CseqFile::read(&data)
        .with_context(|| format!("Failed to parse sequence: {}", args.cseq.display()))?;
    let tracks: Vec<GmidTrack> = file.tracks.into_iter().map(|(_, track)| track).collect();

    let out = File::create(&args.midi)
        .with_context(|| format!("Failed to create: {}", args.midi.display()))?;
    let mut out = BufWriter::new(out);
    cseq::write_smf(file.division, &tracks, &mut out)
        .with_context(|| format!("Failed to write MIDI: {}", args.midi.display()))?;
    out.flush()?;

    info!("wrote {} tracks to {}", tracks.len(), args.midi.display());
    Ok(())
}

use aifc::AdpcmAifcFile;
use anyhow::{Context, Result};
use clap::Args;
use log::{info, warn};
use n64io::{read_input, Limits};
use std::fs::File;
use std::path::PathBuf;

#[derive(Args)]
pub struct Aifc2WavArgs {
    /// .aifc file to read
    pub aifc: PathBuf,

    /// WAV file to write
    pub wav: PathBuf,
}

/// Reads sample data as big-endian 16-bit words. The data is copied as is,
/// without ADPCM decoding.
fn be_samples(data: &[u8]) -> Vec<i16> {
    if data.len() % 2 != 0 {
        warn!("dropping trailing odd byte of sample data");
    }
    data.chunks_exact(2)
        .map(|pair| i16::from_be_bytes([pair[0], pair[1]]))
        .collect()
}

pub fn aifc2wav(args: Aifc2WavArgs, limits: &Limits) -> Result<()> {
    let data = read_input(&args.aifc, limits)
        .with_context(|| format!("Failed to read: {}", args.aifc.display()))?;
    let aifc = AdpcmAifcFile::read(&data)
        .with_context(|| format!("Failed to parse AIFC: {}", args.aifc.display()))?;
    let sample_rate = aifc.int_sample_rate()?;

    let samples = be_samples(aifc.sound_chunk().raw_data());
    let header = wav::Header::new(wav::WAV_FORMAT_PCM, 1, sample_rate, 16);
    let mut out = File::create(&args.wav)
        .with_context(|| format!("Failed to create: {}", args.wav.display()))?;
    wav::write(header, &wav::BitDepth::Sixteen(samples), &mut out)
        .with_context(|| format!("Failed to write WAV: {}", args.wav.display()))?;

    info!("wrote {} at {} Hz", args.wav.display(), sample_rate);
    Ok(())
}

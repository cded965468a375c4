//! Bank file commands.

use anyhow::{Context, Result};
use clap::Args;
use ctl::{BankFile, InstWriter, LoadOptions, OutputMode};
use log::info;
use n64io::{read_input, Limits};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct Ctl2InstArgs {
    /// Bank file to read
    pub ctl: PathBuf,

    /// Where to write the text (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Leave out the fields only sound effects use
    #[arg(long)]
    pub music: bool,

    /// Prefix of the generated .aifc file names
    #[arg(long, default_value = "sound")]
    pub aifc_prefix: String,
}

#[derive(Args)]
pub struct Ctl2AifcArgs {
    /// Bank file to read
    pub ctl: PathBuf,

    /// Sample table the bank points into
    pub tbl: PathBuf,

    /// Directory for the .aifc files
    #[arg(short, long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Prefix of the generated .aifc file names
    #[arg(long, default_value = "sound")]
    pub aifc_prefix: String,
}

#[derive(Args)]
pub struct InstCheckArgs {
    /// .inst file to parse
    pub inst: PathBuf,

    /// Print the parsed bank back as .inst text
    #[arg(long)]
    pub print: bool,

    /// With --print, leave out the fields only sound effects use
    #[arg(long)]
    pub music: bool,
}

fn load_ctl(path: &Path, prefix: &str, limits: &Limits) -> Result<BankFile> {
    let data = read_input(path, limits)
        .with_context(|| format!("Failed to read bank file: {}", path.display()))?;
    let options = LoadOptions {
        aifc_prefix: prefix.to_owned(),
    };
    ctl::load_bank_file(&data, &options)
        .with_context(|| format!("Failed to load bank file: {}", path.display()))
}

fn mode(music: bool) -> OutputMode {
    if music {
        OutputMode::Music
    } else {
        OutputMode::Sfx
    }
}

pub fn ctl2inst(args: Ctl2InstArgs, limits: &Limits) -> Result<()> {
    let file = load_ctl(&args.ctl, &args.aifc_prefix, limits)?;
    let writer = InstWriter::new(mode(args.music));

    match &args.output {
        Some(path) => {
            let out = File::create(path)
                .with_context(|| format!("Failed to create: {}", path.display()))?;
            let mut out = BufWriter::new(out);
            writer.write(&file, &mut out)?;
            out.flush()?;
            info!("wrote {}", path.display());
        }
        None => writer.write(&file, io::stdout().lock())?,
    }
    Ok(())
}

pub fn ctl2aifc(args: Ctl2AifcArgs, limits: &Limits) -> Result<()> {
    let file = load_ctl(&args.ctl, &args.aifc_prefix, limits)?;
    let tbl = read_input(&args.tbl, limits)
        .with_context(|| format!("Failed to read sample table: {}", args.tbl.display()))?;

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("Failed to create: {}", args.out_dir.display()))?;
    let written = ctl::export_bank_file(&file, &tbl, &args.out_dir)
        .context("Failed to export samples")?;
    for path in &written {
        println!("{}", path.display());
    }
    Ok(())
}

pub fn inst_check(args: InstCheckArgs, limits: &Limits) -> Result<()> {
    let data = read_input(&args.inst, limits)
        .with_context(|| format!("Failed to read: {}", args.inst.display()))?;
    let text = String::from_utf8(data)
        .with_context(|| format!("Not UTF-8 text: {}", args.inst.display()))?;
    let file = ctl::parse_inst(&text)
        .with_context(|| format!("Failed to parse: {}", args.inst.display()))?;

    if args.print {
        InstWriter::new(mode(args.music)).write(&file, io::stdout().lock())?;
        return Ok(());
    }

    println!(
        "{}: {} banks, {} instruments, {} sounds, {} envelopes, {} keymaps, {} samples",
        args.inst.display(),
        file.banks.len(),
        file.instruments.len(),
        file.sounds.len(),
        file.envelopes.len(),
        file.keymaps.len(),
        file.wavetables.len()
    );
    Ok(())
}

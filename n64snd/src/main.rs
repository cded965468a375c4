//! Converts N64 sound data to and from editable forms.
//!
//! - `n64snd ctl2inst` - bank file to `.inst` text
//! - `n64snd ctl2aifc` - bank file plus sample table to `.aifc` files
//! - `n64snd inst-check` - parse an `.inst` file, optionally rewrite it
//! - `n64snd aifc2wav` - `.aifc` sample data to a mono WAV
//! - `n64snd cseq2midi` - compressed sequence to a Standard MIDI File

mod audio;
mod bank;
mod sequence;

use anyhow::Result;
use clap::{Parser, Subcommand};
use n64io::Limits;

#[derive(Parser)]
#[command(name = "n64snd")]
#[command(about = "N64 sound bank and sequence converter")]
#[command(version)]
struct Cli {
    /// Largest input file accepted, in bytes
    #[arg(
        long,
        global = true,
        env = "N64SND_MAX_INPUT_SIZE",
        default_value_t = n64io::DEFAULT_MAX_INPUT_SIZE
    )]
    max_input_size: u64,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a .ctl bank file as .inst text
    Ctl2inst(bank::Ctl2InstArgs),

    /// Export the ADPCM samples of a bank file as .aifc files
    Ctl2aifc(bank::Ctl2AifcArgs),

    /// Parse an .inst file and report what it declares
    InstCheck(bank::InstCheckArgs),

    /// Write the sample data of an .aifc file as a WAV file
    Aifc2wav(audio::Aifc2WavArgs),

    /// Convert a compressed sequence to a Standard MIDI File
    Cseq2midi(sequence::Cseq2MidiArgs),
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let limits = Limits {
        max_input_size: cli.max_input_size,
    };
    match cli.command {
        Commands::Ctl2inst(args) => bank::ctl2inst(args, &limits),
        Commands::Ctl2aifc(args) => bank::ctl2aifc(args, &limits),
        Commands::InstCheck(args) => bank::inst_check(args, &limits),
        Commands::Aifc2wav(args) => audio::aifc2wav(args, &limits),
        Commands::Cseq2midi(args) => sequence::cseq2midi(args, &limits),
    }
}

//! Dumps the events of a cseq file read from stdin.
use cseq::CseqFile;
use std::io::Read;

pub fn main() -> Result<(), cseq::CseqError> {
    let mut buf = Vec::new();
    std::io::stdin().read_to_end(&mut buf)?;

    let file = CseqFile::read(&buf)?;
    println!("division: {}", file.division);
    for (slot, track) in &file.tracks {
        println!("track {}:", slot);
        for (i, event) in track.events.iter().enumerate() {
            print!("  {:4} {:6} +{:<5} {:?}", i, event.absolute_time, event.delta_time, event.kind);
            match event.dual {
                Some(dual) => println!(" (dual {})", dual),
                None => println!(),
            }
        }
    }
    Ok(())
}

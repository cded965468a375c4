//! Summarizes the `.ctl` bank file read from stdin.
use std::io::Read;

fn main() -> Result<(), ctl::CtlError> {
    let mut data = Vec::new();
    std::io::stdin().read_to_end(&mut data)?;

    let file = ctl::load_bank_file(&data, &ctl::LoadOptions::default())?;
    for bank in &file.banks {
        println!(
            "{}: {} Hz, {} instrument slots, percussion {}",
            bank.name,
            bank.sample_rate,
            bank.instruments.len(),
            match bank.percussion {
                Some(key) => file.instruments[key].name.as_str(),
                None => "none",
            }
        );
        for key in bank.instrument_keys() {
            let instrument = &file.instruments[key];
            println!("  {}: {} sounds", instrument.name, instrument.sounds.len());
        }
    }
    println!(
        "{} sounds, {} envelopes, {} keymaps, {} wavetables",
        file.sounds.len(),
        file.envelopes.len(),
        file.keymaps.len(),
        file.wavetables.len()
    );
    Ok(())
}

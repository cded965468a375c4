use std::io::Read;

fn main() -> Result<(), aifc::AifcError> {
    let mut data = Vec::new();
    std::io::stdin().read_to_end(&mut data)?;

    let aifc = aifc::AdpcmAifcFile::read(&data)?;
    println!("{:#?}", aifc.comm_chunk());
    println!("audio length: {:?}", aifc.comm_chunk().audio_length()?);

    let book = aifc.codes_chunk();
    println!(
        "codebook: order {}, {} predictors",
        book.order, book.nentries
    );
    if let Some(loops) = aifc.loop_chunk() {
        for lp in &loops.loops {
            println!("loop: {}..{} x{}", lp.start, lp.end, lp.count);
        }
    }

    print!("chunks:");
    for chunk in aifc.chunks() {
        print!(" {}({})", chunk.id(), chunk.size());
    }
    println!();
    Ok(())
}

mod common;

use common::{fixture, CtlBuilder};
use ctl::*;
use pretty_assertions::assert_eq;

fn load(data: &[u8]) -> Result<BankFile> {
    load_bank_file(data, &LoadOptions::default())
}

#[test]
fn loads_the_whole_graph() {
    let file = load(&fixture().ctl).unwrap();

    assert_eq!(file.revision, BANK_FILE_REVISION);
    assert_eq!(file.banks.len(), 1);
    assert_eq!(file.instruments.len(), 2);
    assert_eq!(file.sounds.len(), 3);
    assert_eq!(file.envelopes.len(), 2);
    assert_eq!(file.keymaps.len(), 2);
    assert_eq!(file.wavetables.len(), 3);

    let bank = &file.banks[0];
    assert_eq!(bank.name, "Bank0000");
    assert_eq!(bank.sample_rate, 22050);
    assert_eq!(bank.instruments.len(), 3);
    assert!(bank.instruments[1].is_none());
    assert_eq!(bank.percussion, bank.instruments[2]);

    let first = &file.instruments[bank.instruments[0].unwrap()];
    assert_eq!(first.name, "Instrument0001");
    assert_eq!(first.volume, 100);
    assert_eq!(first.priority, 5);
    assert_eq!(
        first.tremolo,
        Modulation {
            kind: 1,
            rate: 2,
            depth: 3,
            delay: 4
        }
    );
    assert_eq!(first.vibrato.delay, 8);
    assert_eq!(first.bend_range, 200);

    let envelope = &file.envelopes[file.sounds[first.sounds[0]].envelope.unwrap()];
    assert_eq!(
        (envelope.attack_time, envelope.decay_time, envelope.release_time),
        (10, 20, 30)
    );
    assert_eq!((envelope.attack_volume, envelope.decay_volume), (127, 100));
}

#[test]
fn shared_offsets_become_shared_nodes() {
    let file = load(&fixture().ctl).unwrap();
    let bank = &file.banks[0];
    let first = &file.instruments[bank.instruments[0].unwrap()];
    let second = &file.instruments[bank.instruments[2].unwrap()];

    // Sound `a` is in both instruments.
    assert_eq!(first.sounds[0], second.sounds[0]);

    let a = &file.sounds[first.sounds[0]];
    let b = &file.sounds[first.sounds[1]];
    let c = &file.sounds[second.sounds[1]];
    assert_eq!(a.envelope, b.envelope);
    assert_ne!(a.envelope, c.envelope);
    assert_eq!(a.keymap, c.keymap);
    assert_ne!(a.keymap, b.keymap);
}

#[test]
fn loading_twice_gives_the_same_graph() {
    let data = fixture().ctl;
    let writer = InstWriter::default();
    let once = writer.write_to_string(&load(&data).unwrap()).unwrap();
    let twice = writer.write_to_string(&load(&data).unwrap()).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn generated_names_follow_load_order() {
    let file = load(&fixture().ctl).unwrap();
    let mut sounds: Vec<_> = file.sounds.values().map(|s| (s.id, s.name.clone())).collect();
    sounds.sort();
    assert_eq!(
        sounds,
        vec![
            (0, "Sound0000".to_owned()),
            (1, "Sound0001".to_owned()),
            (2, "Sound0002".to_owned()),
        ]
    );

    let mut keymaps: Vec<_> = file.keymaps.values().map(|k| k.name.clone()).collect();
    keymaps.sort();
    assert_eq!(keymaps, vec!["Keymap0000", "Keymap0001"]);
}

#[test]
fn wavetable_variants() {
    let file = load(&fixture().ctl).unwrap();
    let mut wavetables: Vec<_> = file.wavetables.values().collect();
    wavetables.sort_by_key(|w| w.id);

    let a = wavetables[0];
    assert_eq!(a.aifc_path, "sound0000.aifc");
    assert_eq!((a.base, a.len), (0, 36));
    match &a.kind {
        WaveKind::Adpcm {
            looping: Some(lp),
            book: Some(book),
        } => {
            assert_eq!((lp.start, lp.end, lp.count), (16, 160, u32::MAX));
            assert_eq!(lp.state, [0xab; 32]);
            assert_eq!((book.order, book.npredictors), (2, 2));
            assert_eq!(book.table.len(), 64);
            assert_eq!(book.table[63], 63);
        }
        other => panic!("unexpected wave kind {:?}", other),
    }

    let c = wavetables[1];
    assert_eq!(c.aifc_path, "sound0001.aifc");
    assert!(!c.kind.has_loop());
    assert_eq!(c.kind.tag(), WaveKind::ADPCM_TAG);

    let b = wavetables[2];
    assert_eq!(
        b.kind,
        WaveKind::Raw16 {
            looping: Some(RawLoop {
                start: 0,
                end: 100,
                count: 2
            })
        }
    );
}

#[test]
fn aifc_prefix_is_configurable() {
    let options = LoadOptions {
        aifc_prefix: "sfx_".to_owned(),
    };
    let file = load_bank_file(&fixture().ctl, &options).unwrap();
    let mut paths: Vec<_> = file.wavetables.values().map(|w| w.aifc_path.clone()).collect();
    paths.sort();
    assert_eq!(paths, vec!["sfx_0000.aifc", "sfx_0001.aifc", "sfx_0002.aifc"]);
}

#[test]
fn zero_revision_is_rejected() {
    let mut data = fixture().ctl;
    data[0] = 0;
    data[1] = 0;
    match load(&data) {
        Err(CtlError::MagicMismatch { expected, found }) => {
            assert_eq!((expected, found), (0x4231, 0));
        }
        other => panic!("unexpected result {:?}", other.map(|f| f.banks.len())),
    }
}

#[test]
fn empty_bank_file() {
    let data = CtlBuilder::new(0).finish(&[]);
    assert!(matches!(load(&data), Err(CtlError::EmptyBankFile)));
}

#[test]
fn truncated_record() {
    let mut data = fixture().ctl;
    let len = data.len();
    // The bank record is last; cut into its instrument offsets.
    data.truncate(len - 2);
    assert!(matches!(load(&data), Err(CtlError::Cursor(_))));
}

#[test]
fn offset_past_the_end() {
    let mut b = CtlBuilder::new(1);
    let bank = b.bank(32000, 0, &[0x1000]);
    let data = b.finish(&[bank]);
    assert!(matches!(load(&data), Err(CtlError::Cursor(_))));
}

#[test]
fn negative_instrument_count() {
    let mut b = CtlBuilder::new(1);
    let bank = b.raw(&[0xff, 0xff, 0, 0, 0, 0, 0x7d, 0, 0, 0, 0, 0]);
    let data = b.finish(&[bank]);
    assert!(matches!(
        load(&data),
        Err(CtlError::NegativeCount {
            kind: NodeKind::Bank,
            count: -1,
            ..
        })
    ));
}

#[test]
fn null_sound_in_an_instrument() {
    let mut b = CtlBuilder::new(1);
    let instrument = b.instrument(1, 2, &[0]);
    let bank = b.bank(32000, 0, &[instrument]);
    let data = b.finish(&[bank]);
    assert!(matches!(
        load(&data),
        Err(CtlError::UnresolvedReference {
            kind: NodeKind::Sound,
            ..
        })
    ));
}

#[test]
fn unknown_wavetable_type() {
    let mut b = CtlBuilder::new(1);
    let wt = b.wavetable_header(0, 9, 7);
    let sound = b.sound(0, 0, wt, 0, 0);
    let instrument = b.instrument(1, 2, &[sound]);
    let bank = b.bank(32000, 0, &[instrument]);
    let data = b.finish(&[bank]);
    assert!(matches!(load(&data), Err(CtlError::UnsupportedFeature(_))));
}

#[test]
fn book_order_must_fit() {
    let mut b = CtlBuilder::new(1);
    let book = b.raw(&[0, 1, 0, 0, 0, 0, 0, 1]);
    let wt = b.adpcm_wavetable(0, 9, 0, book);
    let sound = b.sound(0, 0, wt, 0, 0);
    let instrument = b.instrument(1, 2, &[sound]);
    let bank = b.bank(32000, 0, &[instrument]);
    let data = b.finish(&[bank]);
    assert!(matches!(
        load(&data),
        Err(CtlError::ValueOutOfRange {
            field: "book order",
            value: 65536
        })
    ));
}

#[test]
fn exports_adpcm_sounds_as_aifc() {
    let fixture = fixture();
    let file = load(&fixture.ctl).unwrap();
    let bank = &file.banks[0];
    let second = &file.instruments[bank.percussion.unwrap()];

    // Looping sound: COMM, CODES, SSND, LOOPS.
    let looped = sound_to_aifc(&file, bank, second.sounds[0], &fixture.tbl).unwrap();
    assert_eq!(looped.chunks().len(), 4);
    let read = aifc::AdpcmAifcFile::read(&looped.to_bytes().unwrap()).unwrap();
    assert_eq!(read.int_sample_rate().unwrap(), 22050);
    assert_eq!(read.comm_chunk().num_sample_frames, 64);
    assert_eq!(read.codes_chunk().coefficients().len(), 64);
    assert_eq!(read.sound_chunk().raw_data(), &fixture.tbl[0..36]);
    let loops = read.loop_chunk().unwrap();
    assert_eq!((loops.loops[0].start, loops.loops[0].end), (16, 160));

    // Non-looping sound: no loop chunk.
    let plain = sound_to_aifc(&file, bank, second.sounds[1], &fixture.tbl).unwrap();
    let read = aifc::AdpcmAifcFile::read(&plain.to_bytes().unwrap()).unwrap();
    assert_eq!(read.chunks().len(), 3);
    assert!(read.loop_chunk().is_none());
    assert_eq!(read.sound_chunk().raw_data(), &fixture.tbl[44..62]);
    assert_eq!(read.comm_chunk().num_sample_frames, 32);
}

#[test]
fn raw_sounds_are_not_exported() {
    let fixture = fixture();
    let file = load(&fixture.ctl).unwrap();
    let bank = &file.banks[0];
    let first = &file.instruments[bank.instruments[0].unwrap()];
    assert!(matches!(
        sound_to_aifc(&file, bank, first.sounds[1], &fixture.tbl),
        Err(CtlError::UnsupportedFeature(_))
    ));
}

#[test]
fn sample_range_outside_the_tbl() {
    let fixture = fixture();
    let file = load(&fixture.ctl).unwrap();
    let bank = &file.banks[0];
    let second = &file.instruments[bank.percussion.unwrap()];
    assert!(matches!(
        sound_to_aifc(&file, bank, second.sounds[0], &fixture.tbl[..20]),
        Err(CtlError::Cursor(_))
    ));
}

#[test]
fn export_writes_each_wavetable_once() {
    let fixture = fixture();
    let file = load(&fixture.ctl).unwrap();
    let dir = std::env::temp_dir().join(format!("ctl-export-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    let written = export_bank_file(&file, &fixture.tbl, &dir).unwrap();
    let names: Vec<_> = written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["sound0000.aifc", "sound0001.aifc"]);
    for path in &written {
        let data = std::fs::read(path).unwrap();
        assert!(aifc::AdpcmAifcFile::read(&data).is_ok());
    }

    std::fs::remove_dir_all(&dir).unwrap();
}

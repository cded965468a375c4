mod common;

use common::CtlBuilder;
use ctl::*;
use pretty_assertions::assert_eq;

const BANK: &str = r#"# a small bank
bank Main
{
    sampleRate = 32000;
    percussionDefault = Drums;
    instrument [2] = Lead;
    instrument [0] = Bass;
}

instrument Bass
{
    volume = 100;
    sound [1] = BassHigh;
    sound [0] = BassLow;
}

instrument Lead { volume = 90; sound [0] = BassLow; }

instrument Drums { sound [0] = Kick; }

sound BassLow { use ("bass.aifc"); envelope = Env; keymap = Low; }
sound BassHigh { use ("bass.aifc"); envelope = Env; keymap = High; }
sound Kick { use ("kick.aifc"); envelope = Env; }

envelope Env
{
    attackTime = 100; attackVolume = 127;
    decayTime = -1; decayVolume = 127;
    releaseTime = 2000;
}
keymap Low { keyMin = 0; keyMax = 59; keyBase = 48; }
keymap High { keyMin = 60; keyMax = 127; keyBase = 72; detune = -5; }
"#;

fn instrument<'a>(file: &'a BankFile, key: Option<InstrumentKey>) -> &'a Instrument {
    &file.instruments[key.unwrap()]
}

#[test]
fn resolves_forward_references() {
    let file = parse_inst(BANK).unwrap();
    assert_eq!(file.revision, BANK_FILE_REVISION);
    assert_eq!(file.banks.len(), 1);
    assert_eq!(file.instruments.len(), 3);
    assert_eq!(file.sounds.len(), 3);
    assert_eq!(file.envelopes.len(), 1);
    assert_eq!(file.keymaps.len(), 2);

    let bank = &file.banks[0];
    assert_eq!(bank.name, "Main");
    assert_eq!(bank.sample_rate, 32000);
    assert_eq!(instrument(&file, bank.percussion).name, "Drums");

    let slots: Vec<_> = bank
        .instruments
        .iter()
        .map(|slot| slot.map(|key| file.instruments[key].name.as_str()))
        .collect();
    assert_eq!(slots, vec![Some("Bass"), None, Some("Lead")]);
}

#[test]
fn array_order_follows_indices() {
    let file = parse_inst(BANK).unwrap();
    let bass = instrument(&file, file.banks[0].instruments[0]);
    let names: Vec<_> = bass
        .sounds
        .iter()
        .map(|key| file.sounds[*key].name.as_str())
        .collect();
    assert_eq!(names, vec!["BassLow", "BassHigh"]);
}

#[test]
fn references_by_name_are_shared() {
    let file = parse_inst(BANK).unwrap();
    let bank = &file.banks[0];
    let bass = instrument(&file, bank.instruments[0]);
    let lead = instrument(&file, bank.instruments[2]);
    assert_eq!(bass.sounds[0], lead.sounds[0]);

    let low = &file.sounds[bass.sounds[0]];
    let high = &file.sounds[bass.sounds[1]];
    assert_eq!(low.envelope, high.envelope);
    assert_eq!(low.wavetable, high.wavetable);
    assert_ne!(low.keymap, high.keymap);

    let envelope = &file.envelopes[low.envelope.unwrap()];
    assert_eq!(envelope.decay_time, -1);
    assert_eq!(envelope.release_time, 2000);
    let keymap = &file.keymaps[high.keymap.unwrap()];
    assert_eq!((keymap.key_min, keymap.key_base, keymap.detune), (60, 72, -5));

    let mut paths: Vec<_> = file
        .wavetables
        .values()
        .map(|w| w.aifc_path.as_str())
        .collect();
    paths.sort_unstable();
    assert_eq!(paths, vec!["bass.aifc", "kick.aifc"]);
}

#[test]
fn text_round_trip_is_stable() {
    let writer = InstWriter::default();
    let first = writer.write_to_string(&parse_inst(BANK).unwrap()).unwrap();
    let reparsed = parse_inst(&first).unwrap();
    let second = writer.write_to_string(&reparsed).unwrap();
    assert_eq!(first, second);
    assert_eq!(reparsed.sounds.len(), 3);
    assert_eq!(reparsed.envelopes.len(), 1);
}

#[test]
fn ctl_graph_survives_text() {
    let loaded = load_bank_file(&common::fixture().ctl, &LoadOptions::default()).unwrap();
    let writer = InstWriter::default();
    let text = writer.write_to_string(&loaded).unwrap();
    let parsed = parse_inst(&text).unwrap();

    assert_eq!(writer.write_to_string(&parsed).unwrap(), text);
    assert_eq!(parsed.instruments.len(), loaded.instruments.len());
    assert_eq!(parsed.sounds.len(), loaded.sounds.len());
    assert_eq!(parsed.envelopes.len(), loaded.envelopes.len());
    assert_eq!(parsed.keymaps.len(), loaded.keymaps.len());
    assert_eq!(parsed.wavetables.len(), loaded.wavetables.len());

    // Sharing is kept: the first instrument's sounds share an envelope, and
    // sound `a` sits in both instruments.
    let bank = &parsed.banks[0];
    assert!(bank.instruments[1].is_none());
    assert_eq!(bank.percussion, bank.instruments[2]);
    let first = instrument(&parsed, bank.instruments[0]);
    let second = instrument(&parsed, bank.instruments[2]);
    assert_eq!(first.sounds[0], second.sounds[0]);
    assert_eq!(
        parsed.sounds[first.sounds[0]].envelope,
        parsed.sounds[first.sounds[1]].envelope
    );

    // Ids are handed out in the same order by both loaders.
    let mut loaded_ids: Vec<_> = loaded.sounds.values().map(|s| (s.name.clone(), s.id)).collect();
    let mut parsed_ids: Vec<_> = parsed.sounds.values().map(|s| (s.name.clone(), s.id)).collect();
    loaded_ids.sort();
    parsed_ids.sort();
    assert_eq!(loaded_ids, parsed_ids);
}

#[test]
fn shared_declarations_are_written_once_and_first() {
    let loaded = load_bank_file(&common::fixture().ctl, &LoadOptions::default()).unwrap();
    let text = InstWriter::default().write_to_string(&loaded).unwrap();

    assert_eq!(text.matches("sound Sound0000\n{").count(), 1);
    assert_eq!(text.matches("envelope Envelope0000\n{").count(), 1);
    assert_eq!(text.matches("instrument Instrument0000\n{").count(), 1);

    let position = |needle: &str| text.find(needle).unwrap();
    assert!(position("envelope Envelope0000\n") < position("sound Sound0000\n"));
    assert!(position("sound Sound0000\n") < position("instrument Instrument0001\n"));
    assert!(position("instrument Instrument0000\n") < position("bank Bank0000\n"));
    assert!(text.contains("    instrument [2] = Instrument0000;\n"));
    assert!(!text.contains("instrument [1]"));
    assert!(text.contains("    percussionDefault = Instrument0000;\n"));
    assert!(text.contains("    use (\"sound0002.aifc\");\n"));
    assert!(text.contains("    tremeloRate = 2;\n"));
}

fn text_round_trip(data: &[u8]) -> (BankFile, String, BankFile) {
    let loaded = load_bank_file(data, &LoadOptions::default()).unwrap();
    let text = InstWriter::default().write_to_string(&loaded).unwrap();
    let parsed = parse_inst(&text).unwrap();
    (loaded, text, parsed)
}

#[test]
fn trailing_empty_slots_survive_text() {
    let mut b = CtlBuilder::new(1);
    let sound = b.sound(0, 0, 0, 64, 100);
    let instrument = b.instrument(100, 64, &[sound]);
    let bank = b.bank(32000, 0, &[instrument, 0, 0]);
    let data = b.finish(&[bank]);

    let (loaded, text, parsed) = text_round_trip(&data);
    assert_eq!(loaded.banks[0].instruments.len(), 3);
    assert!(text.contains("    instrumentCount = 3;\n"));

    let slots = &parsed.banks[0].instruments;
    assert_eq!(slots.len(), 3);
    assert!(slots[0].is_some());
    assert!(slots[1].is_none() && slots[2].is_none());
}

#[test]
fn bank_of_empty_slots_survives_text() {
    let mut b = CtlBuilder::new(1);
    let bank = b.bank(32000, 0, &[0, 0]);
    let data = b.finish(&[bank]);

    let (_, text, parsed) = text_round_trip(&data);
    assert!(text.contains("    instrumentCount = 2;\n"));
    assert_eq!(parsed.banks[0].instruments, vec![None, None]);
    assert!(parsed.instruments.is_empty());
}

#[test]
fn instrument_count_below_an_assigned_index() {
    let text = "bank B { instrumentCount = 1; instrument [2] = I; }\ninstrument I { }";
    assert!(matches!(
        parse_inst(text),
        Err(CtlError::ValueOutOfRange {
            field: "instrumentCount",
            value: 1
        })
    ));
}

#[test]
fn sound_indices_must_be_dense() {
    let text = "bank B { instrument [0] = I; }\n\
                instrument I {\n sound [0] = S;\n sound [5] = S;\n}\n\
                sound S { }";
    match parse_inst(text) {
        Err(CtlError::IndexGap {
            line,
            name,
            index,
            expected,
        }) => {
            assert_eq!((line, index, expected), (4, 5, 1));
            assert_eq!(name, "I");
        }
        other => panic!("unexpected result {:?}", other.map(|f| f.banks.len())),
    }
}

#[test]
fn music_mode_leaves_out_effect_fields() {
    let loaded = load_bank_file(&common::fixture().ctl, &LoadOptions::default()).unwrap();
    let text = InstWriter::new(OutputMode::Music)
        .write_to_string(&loaded)
        .unwrap();
    assert!(!text.contains("flags"));
    assert!(!text.contains("tremelo"));
    assert!(!text.contains("vibrato"));
    assert!(text.contains("bendRange = 200;"));

    let parsed = parse_inst(&text).unwrap();
    assert!(parsed.instruments.values().all(|i| i.tremolo == Modulation::default()));
}

#[test]
fn unreferenced_declaration_is_an_orphan() {
    let text = format!("{}\nenvelope Unused {{ attackTime = 1; }}\n", BANK);
    match parse_inst(&text) {
        Err(CtlError::OrphanedInstance { kind, name }) => {
            assert_eq!(kind, NodeKind::Envelope);
            assert_eq!(name, "Unused");
        }
        other => panic!("unexpected result {:?}", other.map(|f| f.banks.len())),
    }
}

#[test]
fn missing_reference() {
    let text = "bank B { instrument [0] = Ghost; }";
    match parse_inst(text) {
        Err(CtlError::UnresolvedReference { kind, name }) => {
            assert_eq!(kind, NodeKind::Instrument);
            assert_eq!(name, "Ghost");
        }
        other => panic!("unexpected result {:?}", other.map(|f| f.banks.len())),
    }
}

#[test]
fn reference_to_the_wrong_kind() {
    let text = "bank B { instrument [0] = I; }\n\
                instrument I { sound [0] = S; }\n\
                sound S { envelope = K; }\n\
                keymap K { }";
    assert!(matches!(
        parse_inst(text),
        Err(CtlError::UnresolvedReference {
            kind: NodeKind::Envelope,
            ..
        })
    ));
}

#[test]
fn comment_splits_a_property_name() {
    let text = "bank B { instrument [0] = I; }\n\
                instrument I { vol# split here\nume = 42; }";
    let file = parse_inst(text).unwrap();
    assert_eq!(instrument(&file, file.banks[0].instruments[0]).volume, 42);
}

#[test]
fn errors_carry_line_numbers() {
    assert!(matches!(
        parse_inst("\n\ndrum D { }"),
        Err(CtlError::UnknownType { line: 3, .. })
    ));
    assert!(matches!(
        parse_inst("bank B\n{\n    tempo = 3;\n}"),
        Err(CtlError::UnknownProperty {
            line: 3,
            kind: NodeKind::Bank,
            ..
        })
    ));
    assert!(matches!(
        parse_inst("bank B {\n sampleRate = Fast; }"),
        Err(CtlError::WrongValueKind { line: 2, .. })
    ));
    assert!(matches!(
        parse_inst("bank B {\n\n sampleRate 3; }"),
        Err(CtlError::MalformedGrammar {
            line: 3,
            found: '3',
            ..
        })
    ));
}

#[test]
fn declared_twice() {
    let text = "keymap K { }\nkeymap K { }";
    assert!(matches!(
        parse_inst(text),
        Err(CtlError::DuplicateInstance {
            line: 2,
            kind: NodeKind::KeyMap,
            ..
        })
    ));
}

#[test]
fn index_assigned_twice() {
    let text = "bank B {\n instrument [0] = I;\n instrument [0] = I;\n}\ninstrument I { }";
    assert!(matches!(
        parse_inst(text),
        Err(CtlError::DuplicateIndex {
            line: 3,
            index: 0,
            ..
        })
    ));
}

#[test]
fn out_of_range_values() {
    let text = "bank B { instrument [0] = I; }\ninstrument I { volume = 256; }";
    assert!(matches!(
        parse_inst(text),
        Err(CtlError::ValueOutOfRange {
            field: "volume",
            value: 256
        })
    ));
}

#[test]
fn nothing_declared() {
    assert!(matches!(
        parse_inst("# only a comment\n"),
        Err(CtlError::EmptyBankFile)
    ));
}

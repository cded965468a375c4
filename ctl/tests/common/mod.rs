#![allow(dead_code)]

/// Assembles a `.ctl` buffer record by record. Every method appends one
/// record and returns its offset.
pub struct CtlBuilder {
    data: Vec<u8>,
    bank_count: usize,
}

impl CtlBuilder {
    pub fn new(bank_count: usize) -> Self {
        let mut data = vec![0x42, 0x31];
        data.extend_from_slice(&(bank_count as u16).to_be_bytes());
        data.resize(4 + 4 * bank_count, 0);
        Self { data, bank_count }
    }

    fn offset(&self) -> u32 {
        self.data.len() as u32
    }

    fn put(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    fn align(&mut self) {
        while self.data.len() % 4 != 0 {
            self.data.push(0);
        }
    }

    pub fn envelope(&mut self, attack: i32, decay: i32, release: i32, volumes: [u8; 2]) -> u32 {
        let at = self.offset();
        self.put(&attack.to_be_bytes());
        self.put(&decay.to_be_bytes());
        self.put(&release.to_be_bytes());
        self.put(&volumes);
        self.align();
        at
    }

    /// velocity min/max, key min/max/base, then detune.
    pub fn keymap(&mut self, fields: [u8; 5], detune: i8) -> u32 {
        let at = self.offset();
        self.put(&fields);
        self.put(&detune.to_be_bytes());
        self.align();
        at
    }

    /// The coefficient table counts up from zero.
    pub fn book(&mut self, order: i32, npredictors: i32) -> u32 {
        let at = self.offset();
        self.put(&order.to_be_bytes());
        self.put(&npredictors.to_be_bytes());
        let len = (order * npredictors * 16).max(0) as usize;
        let table: Vec<u8> = (0..len).map(|i| i as u8).collect();
        self.put(&table);
        at
    }

    /// The state block is filled with `0xab`.
    pub fn adpcm_loop(&mut self, start: u32, end: u32, count: u32) -> u32 {
        let at = self.offset();
        self.put(&start.to_be_bytes());
        self.put(&end.to_be_bytes());
        self.put(&count.to_be_bytes());
        self.put(&[0xab; 32]);
        at
    }

    pub fn raw_loop(&mut self, start: u32, end: u32, count: u32) -> u32 {
        let at = self.offset();
        self.put(&start.to_be_bytes());
        self.put(&end.to_be_bytes());
        self.put(&count.to_be_bytes());
        at
    }

    pub fn adpcm_wavetable(&mut self, base: u32, len: i32, lp: u32, book: u32) -> u32 {
        let at = self.wavetable_header(base, len, 0);
        self.put(&lp.to_be_bytes());
        self.put(&book.to_be_bytes());
        at
    }

    pub fn raw_wavetable(&mut self, base: u32, len: i32, lp: u32) -> u32 {
        let at = self.wavetable_header(base, len, 1);
        self.put(&lp.to_be_bytes());
        at
    }

    pub fn wavetable_header(&mut self, base: u32, len: i32, kind: u8) -> u32 {
        let at = self.offset();
        self.put(&base.to_be_bytes());
        self.put(&len.to_be_bytes());
        self.put(&[kind, 0, 0, 0]);
        at
    }

    pub fn sound(&mut self, envelope: u32, keymap: u32, wavetable: u32, pan: u8, volume: u8) -> u32 {
        let at = self.offset();
        self.put(&envelope.to_be_bytes());
        self.put(&keymap.to_be_bytes());
        self.put(&wavetable.to_be_bytes());
        self.put(&[pan, volume, 0, 0]);
        at
    }

    /// Priority 5, tremelo 1..=4, vibrato 5..=8, bend range 200.
    pub fn instrument(&mut self, volume: u8, pan: u8, sounds: &[u32]) -> u32 {
        let at = self.offset();
        self.put(&[volume, pan, 5, 0, 1, 2, 3, 4, 5, 6, 7, 8]);
        self.put(&200i16.to_be_bytes());
        self.put(&(sounds.len() as i16).to_be_bytes());
        for sound in sounds {
            self.put(&sound.to_be_bytes());
        }
        at
    }

    pub fn bank(&mut self, sample_rate: i32, percussion: u32, instruments: &[u32]) -> u32 {
        let at = self.offset();
        self.put(&(instruments.len() as i16).to_be_bytes());
        self.put(&[0, 0]);
        self.put(&sample_rate.to_be_bytes());
        self.put(&percussion.to_be_bytes());
        for instrument in instruments {
            self.put(&instrument.to_be_bytes());
        }
        at
    }

    /// Appends raw bytes, returning their offset.
    pub fn raw(&mut self, bytes: &[u8]) -> u32 {
        let at = self.offset();
        self.put(bytes);
        at
    }

    pub fn finish(mut self, banks: &[u32]) -> Vec<u8> {
        assert_eq!(banks.len(), self.bank_count);
        for (i, bank) in banks.iter().enumerate() {
            self.data[4 + 4 * i..8 + 4 * i].copy_from_slice(&bank.to_be_bytes());
        }
        self.data
    }
}

pub struct Fixture {
    pub ctl: Vec<u8>,
    pub tbl: Vec<u8>,
}

/// One bank at 22050 Hz:
///
/// - slot 0: an instrument with sounds `a` and `b`
/// - slot 1: empty
/// - slot 2: an instrument with sounds `a` and `c`, also the percussion
///   instrument
///
/// `a` has an ADPCM wavetable with a loop, `b` shares its envelope and has a
/// looping raw wavetable, `c` shares `a`'s keymap and has an ADPCM
/// wavetable without a loop.
pub fn fixture() -> Fixture {
    let mut b = CtlBuilder::new(1);

    let env = b.envelope(10, 20, 30, [127, 100]);
    let env2 = b.envelope(1, 2, 3, [4, 5]);
    let km = b.keymap([0, 127, 0, 127, 60], -3);
    let km2 = b.keymap([1, 100, 20, 90, 48], 5);
    let book = b.book(2, 2);
    let lp = b.adpcm_loop(16, 160, u32::MAX);
    let raw_lp = b.raw_loop(0, 100, 2);

    let wt_a = b.adpcm_wavetable(0, 36, lp, book);
    let wt_b = b.raw_wavetable(36, 8, raw_lp);
    let wt_c = b.adpcm_wavetable(44, 18, 0, book);

    let a = b.sound(env, km, wt_a, 64, 127);
    let sb = b.sound(env, km2, wt_b, 10, 20);
    let c = b.sound(env2, km, wt_c, 30, 40);

    let first = b.instrument(100, 64, &[a, sb]);
    let second = b.instrument(90, 32, &[a, c]);
    let bank = b.bank(22050, second, &[first, 0, second]);

    Fixture {
        ctl: b.finish(&[bank]),
        tbl: (0..62).collect(),
    }
}

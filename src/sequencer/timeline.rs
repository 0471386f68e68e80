// Timeline - Tempo and time signature representation
// Handles the fixed meter catalog and beat-duration arithmetic

use std::fmt;

/// Time signature selected from the fixed catalog
///
/// `beats` is the number of pulses in one measure cycle. For compound meters
/// (3/8, 6/8, 9/8, 12/8) it counts eighth-note pulses, not dotted-quarter beats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct TimeSignature {
    pub name: &'static str,
    pub beats: usize,
    pub compound: bool,
}

impl TimeSignature {
    const fn simple(name: &'static str, beats: usize) -> Self {
        Self {
            name,
            beats,
            compound: false,
        }
    }

    const fn compound(name: &'static str, beats: usize) -> Self {
        Self {
            name,
            beats,
            compound: true,
        }
    }

    /// Every time signature the metronome offers
    pub const CATALOG: [TimeSignature; 8] = [
        Self::simple("1/4", 1),
        Self::simple("2/4", 2),
        Self::simple("3/4", 3),
        Self::simple("4/4", 4),
        Self::compound("3/8", 3),
        Self::compound("6/8", 6),
        Self::compound("9/8", 9),
        Self::compound("12/8", 12),
    ];

    /// Look up a catalog entry by its display name ("6/8")
    pub fn from_name(name: &str) -> Option<Self> {
        Self::CATALOG.iter().copied().find(|ts| ts.name == name)
    }

    /// Common 4/4 time signature
    pub fn four_four() -> Self {
        Self::CATALOG[3]
    }

    /// Common 3/4 time signature (waltz)
    pub fn three_four() -> Self {
        Self::CATALOG[2]
    }

    /// Common 6/8 time signature
    pub fn six_eight() -> Self {
        Self::CATALOG[5]
    }

    /// 9/8 compound time signature
    pub fn nine_eight() -> Self {
        Self::CATALOG[6]
    }

    /// Whether pulses group in threes
    pub fn is_compound(&self) -> bool {
        self.compound
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::four_four()
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Tempo in BPM (Beats Per Minute)
///
/// Always within [`Tempo::MIN_BPM`, `Tempo::MAX_BPM`]; out-of-range input is clamped
/// so the beat interval can never be zero or negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
pub struct Tempo {
    bpm: u32,
}

impl Tempo {
    pub const MIN_BPM: u32 = 20;
    pub const MAX_BPM: u32 = 300;

    /// Creates a new tempo, clamped to the supported range
    pub fn new(bpm: u32) -> Self {
        Self {
            bpm: bpm.clamp(Self::MIN_BPM, Self::MAX_BPM),
        }
    }

    /// Get BPM value
    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    /// Return a tempo moved by `delta` BPM, clamped
    pub fn nudge(&self, delta: i32) -> Self {
        let bpm = (self.bpm as i64 + delta as i64).clamp(Self::MIN_BPM as i64, Self::MAX_BPM as i64);
        Self::new(bpm as u32)
    }

    /// Duration of one beat in seconds
    pub fn beat_duration_seconds(&self) -> f64 {
        60.0 / self.bpm as f64
    }

    /// Italian tempo marking for the current BPM
    pub fn marking(&self) -> &'static str {
        match self.bpm {
            0..=39 => "Grave",
            40..=54 => "Largo",
            55..=65 => "Larghetto",
            66..=75 => "Adagio",
            76..=91 => "Andante",
            92..=107 => "Moderato",
            108..=119 => "Allegretto",
            120..=139 => "Allegro",
            140..=167 => "Vivace",
            168..=199 => "Presto",
            _ => "Prestissimo",
        }
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self::new(120)
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} BPM", self.bpm)
    }
}

/// Named tempo shortcut
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TempoPreset {
    pub name: &'static str,
    pub bpm: u32,
}

pub const TEMPO_PRESETS: [TempoPreset; 10] = [
    TempoPreset { name: "Grave", bpm: 35 },
    TempoPreset { name: "Largo", bpm: 50 },
    TempoPreset { name: "Adagio", bpm: 70 },
    TempoPreset { name: "Andante", bpm: 84 },
    TempoPreset { name: "Moderato", bpm: 100 },
    TempoPreset { name: "Allegretto", bpm: 112 },
    TempoPreset { name: "Allegro", bpm: 130 },
    TempoPreset { name: "Vivace", bpm: 152 },
    TempoPreset { name: "Presto", bpm: 180 },
    TempoPreset { name: "Prestissimo", bpm: 220 },
];

// Subdivision - Ratio-based patterns splitting one beat into sub-events

use super::timeline::TimeSignature;

/// How one main beat is split into sub-events
///
/// `pattern` ratios sum to 1.0. `rest_indices` are sub-event positions that stay
/// silent. `muted_beat_mod` silences whole beats whose `beat_index % 3` is listed.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct SubdivisionPattern {
    pub id: &'static str,
    pub label: &'static str,
    pub pattern: &'static [f64],
    pub rest_indices: &'static [usize],
    pub muted_beat_mod: &'static [usize],
}

impl SubdivisionPattern {
    pub const fn new(id: &'static str, label: &'static str, pattern: &'static [f64]) -> Self {
        Self {
            id,
            label,
            pattern,
            rest_indices: &[],
            muted_beat_mod: &[],
        }
    }

    pub const fn with_rest_indices(mut self, rest_indices: &'static [usize]) -> Self {
        self.rest_indices = rest_indices;
        self
    }

    pub const fn with_muted_beats(mut self, muted_beat_mod: &'static [usize]) -> Self {
        self.muted_beat_mod = muted_beat_mod;
        self
    }

    /// Number of sub-events per beat
    pub fn len(&self) -> usize {
        self.pattern.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pattern.is_empty()
    }

    /// Ratio of the beat taken by sub-event `sub_index`
    pub fn ratio(&self, sub_index: usize) -> f64 {
        self.pattern.get(sub_index).copied().unwrap_or(0.0)
    }

    pub fn is_rest(&self, sub_index: usize) -> bool {
        self.rest_indices.contains(&sub_index)
    }

    /// Whether the whole beat at `beat_index` is silenced by this pattern
    pub fn mutes_beat(&self, beat_index: usize) -> bool {
        !self.muted_beat_mod.is_empty() && self.muted_beat_mod.contains(&(beat_index % 3))
    }
}

const THIRD: f64 = 1.0 / 3.0;
const TWO_THIRDS: f64 = 2.0 / 3.0;

/// Id of the compound-meter pattern that sounds once per dotted quarter
pub const DOTTED_QUARTER_PULSE: &str = "c1";

/// Patterns offered for simple meters (x/4)
pub const SIMPLE_SUBDIVISIONS: [SubdivisionPattern; 8] = [
    SubdivisionPattern::new("1", "quarter", &[1.0]),
    SubdivisionPattern::new("2", "eighths", &[0.5, 0.5]),
    SubdivisionPattern::new("3", "triplet", &[THIRD, THIRD, THIRD]),
    SubdivisionPattern::new("4", "sixteenths", &[0.25, 0.25, 0.25, 0.25]),
    SubdivisionPattern::new("5", "dotted eighth + sixteenth", &[0.75, 0.25]),
    SubdivisionPattern::new("6", "sixteenth + dotted eighth", &[0.25, 0.75]),
    SubdivisionPattern::new("7", "swing", &[TWO_THIRDS, THIRD]),
    SubdivisionPattern::new("8", "syncopation", &[0.25, 0.5, 0.25]),
];

/// Patterns offered for compound meters (x/8); every beat is one eighth pulse
pub const COMPOUND_SUBDIVISIONS: [SubdivisionPattern; 3] = [
    SubdivisionPattern::new(DOTTED_QUARTER_PULSE, "dotted quarter", &[1.0]),
    SubdivisionPattern::new("c2", "three eighths", &[1.0]),
    SubdivisionPattern::new("c3", "one-rest-three", &[1.0]).with_muted_beats(&[1]),
];

/// Patterns available for a time signature
pub fn for_time_signature(time_signature: &TimeSignature) -> &'static [SubdivisionPattern] {
    if time_signature.is_compound() {
        &COMPOUND_SUBDIVISIONS
    } else {
        &SIMPLE_SUBDIVISIONS
    }
}

/// Find a pattern by id among those offered for `time_signature`
pub fn find(time_signature: &TimeSignature, id: &str) -> Option<SubdivisionPattern> {
    for_time_signature(time_signature)
        .iter()
        .copied()
        .find(|p| p.id == id)
}

/// Pattern selected when a meter is chosen without an explicit subdivision
pub fn default_for(time_signature: &TimeSignature) -> SubdivisionPattern {
    for_time_signature(time_signature)[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_sums_to_one() {
        for p in SIMPLE_SUBDIVISIONS.iter().chain(COMPOUND_SUBDIVISIONS.iter()) {
            let sum: f64 = p.pattern.iter().sum();
            assert!((sum - 1.0).abs() < 1e-9, "pattern {} sums to {}", p.id, sum);
            assert!(p.pattern.iter().all(|r| *r > 0.0));
        }
    }

    #[test]
    fn test_catalog_per_meter() {
        let four = TimeSignature::four_four();
        let six = TimeSignature::six_eight();

        assert_eq!(for_time_signature(&four).len(), 8);
        assert_eq!(for_time_signature(&six).len(), 3);

        assert!(find(&four, "5").is_some());
        assert!(find(&four, "c1").is_none());
        assert!(find(&six, "c3").is_some());
        assert!(find(&six, "2").is_none());

        assert_eq!(default_for(&four).id, "1");
        assert_eq!(default_for(&six).id, DOTTED_QUARTER_PULSE);
    }

    #[test]
    fn test_muted_beats() {
        let one_rest_three = find(&TimeSignature::nine_eight(), "c3").unwrap();
        let muted: Vec<usize> = (0..9).filter(|b| one_rest_three.mutes_beat(*b)).collect();
        assert_eq!(muted, vec![1, 4, 7]);

        let eighths = find(&TimeSignature::nine_eight(), "c2").unwrap();
        assert!((0..9).all(|b| !eighths.mutes_beat(b)));
    }

    #[test]
    fn test_ratio_out_of_range() {
        let swing = find(&TimeSignature::four_four(), "7").unwrap();
        assert_eq!(swing.len(), 2);
        assert!((swing.ratio(0) - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(swing.ratio(5), 0.0);
        assert!(!swing.is_rest(1));
    }
}

use serde::{Deserialize, Serialize};

pub const POINT_VALUES: usize = 10;
pub const DEFAULT_DECKS: u32 = 8;

/// Remaining cards per point value (0-9) in the shoe.
///
/// Ten and the three faces all collapse onto value 0, so a full shoe holds
/// four times as many zeros as any other value. The tracker only counts
/// down; it never sees suits or symbols.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardComposition {
    counts: [u32; POINT_VALUES],
}

impl CardComposition {
    /// Uniform starting count for every value.
    pub fn uniform(per_value: u32) -> Self {
        Self {
            counts: [per_value; POINT_VALUES],
        }
    }

    /// 32 per value, the simplified eight-deck shoe.
    pub fn fresh() -> Self {
        Self::uniform(DEFAULT_DECKS * 4)
    }

    pub fn from_counts(counts: [u32; POINT_VALUES]) -> Self {
        Self { counts }
    }

    /// Removes one card for each observed value. Values already at zero, or
    /// outside 0-9, are skipped.
    pub fn observe(&mut self, values: &[u8]) {
        for &value in values {
            if let Some(count) = self.counts.get_mut(value as usize) {
                *count = count.saturating_sub(1);
            }
        }
    }

    pub fn remaining(&self) -> [u32; POINT_VALUES] {
        self.counts
    }

    pub fn count(&self, value: u8) -> u32 {
        self.counts.get(value as usize).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    /// Share of remaining cards whose value falls in `values`. Zero on an
    /// empty shoe.
    pub fn ratio(&self, values: std::ops::RangeInclusive<u8>) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let hits: u32 = values.map(|v| self.count(v)).sum();
        hits as f64 / total as f64
    }
}

impl Default for CardComposition {
    fn default() -> Self {
        Self::fresh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_shoe_holds_320_cards() {
        let composition = CardComposition::fresh();
        assert_eq!(composition.total(), 320);
        assert!(composition.remaining().iter().all(|&c| c == 32));
    }

    #[test]
    fn observe_never_goes_negative() {
        let mut composition = CardComposition::uniform(1);
        composition.observe(&[4, 4, 4]);
        assert_eq!(composition.count(4), 0);
        assert_eq!(composition.total(), 9);
    }

    #[test]
    fn out_of_range_values_are_ignored() {
        let mut composition = CardComposition::fresh();
        composition.observe(&[10, 200]);
        assert_eq!(composition.total(), 320);
    }

    #[test]
    fn ratio_of_empty_shoe_is_zero() {
        let composition = CardComposition::uniform(0);
        assert_eq!(composition.ratio(8..=9), 0.0);
    }
}

use std::collections::VecDeque;

use rand::Rng;
use rand::distributions::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

use crate::composition::CardComposition;
use crate::game::{Probabilities, RoundRecord};

/// Long-run banker share of decisive coups in an eight-deck shoe.
pub const BASELINE_BANKER: f64 = 0.5068;

/// Tuning for the banker-advantage heuristic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EstimatorConfig {
    pub baseline: f64,
    /// Weight on the shift of (8-9 share minus 0-5 share) away from a full shoe.
    pub composition_weight: f64,
    /// Weight on the shift of the 6-7 share away from a full shoe.
    pub mid_weight: f64,
    pub trend_weight: f64,
    /// Number of recent rounds averaged for the trend term; 0 uses all of history.
    pub trend_window: usize,
    /// Half-width of the uniform jitter added to the banker figure.
    pub jitter: f64,
    pub clamp_low: f64,
    pub clamp_high: f64,
    /// Fixed tie probability carved out of the player share.
    pub tie: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            baseline: BASELINE_BANKER,
            composition_weight: 0.02,
            mid_weight: 0.0,
            trend_weight: 0.0,
            trend_window: 10,
            jitter: 0.0,
            clamp_low: 0.47,
            clamp_high: 0.53,
            tie: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ShoeProfile {
    high: f64,
    low: f64,
    mid: f64,
}

impl ShoeProfile {
    fn of(composition: &CardComposition) -> Self {
        Self {
            high: composition.ratio(8..=9),
            low: composition.ratio(0..=5),
            mid: composition.ratio(6..=7),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Estimator {
    config: EstimatorConfig,
    reference: ShoeProfile,
}

impl Estimator {
    pub fn new(config: EstimatorConfig) -> Self {
        Self {
            config,
            reference: ShoeProfile::of(&CardComposition::fresh()),
        }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Banker/player/tie split for the next coup. Reads the shoe and history
    /// without touching them; only the jitter draw consumes `rng`.
    pub fn estimate<R: Rng + ?Sized>(
        &self,
        composition: &CardComposition,
        history: &VecDeque<RoundRecord>,
        rng: &mut R,
    ) -> Probabilities {
        let cfg = &self.config;
        if composition.total() == 0 {
            return self.split(cfg.baseline);
        }

        let profile = ShoeProfile::of(composition);
        let skew = (profile.high - profile.low) - (self.reference.high - self.reference.low);
        let mut banker = cfg.baseline
            + skew * cfg.composition_weight
            + (profile.mid - self.reference.mid) * cfg.mid_weight;

        if cfg.trend_weight != 0.0 {
            banker += self.trend(history) * cfg.trend_weight;
        }

        if cfg.jitter > 0.0 {
            let uniform = Uniform::new_inclusive(-cfg.jitter, cfg.jitter);
            banker += uniform.sample(rng);
        }

        self.split(banker.clamp(cfg.clamp_low, cfg.clamp_high))
    }

    /// Mean of +1/-1/0 over the trend window, in [-1, 1].
    fn trend(&self, history: &VecDeque<RoundRecord>) -> f64 {
        let window = match self.config.trend_window {
            0 => history.len(),
            n => n.min(history.len()),
        };
        if window == 0 {
            return 0.0;
        }
        let sum: f64 = history
            .iter()
            .rev()
            .take(window)
            .map(|record| record.winner.trend_sign())
            .sum();
        sum / window as f64
    }

    fn split(&self, banker: f64) -> Probabilities {
        let tie = self.config.tie;
        Probabilities {
            banker,
            player: 1.0 - banker - tie,
            tie,
        }
    }
}

impl Default for Estimator {
    fn default() -> Self {
        Self::new(EstimatorConfig::default())
    }
}

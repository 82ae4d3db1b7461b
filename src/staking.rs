use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StakeError {
    #[error("bankroll {0} is too large to stake against")]
    Overflow(Decimal),
}

/// One bankroll band: below `below`, the base stake is `stake`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StakeBand {
    pub below: Decimal,
    pub stake: Decimal,
}

/// Where the reference stake comes from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BaseStake {
    /// Fixed share of the opening bankroll.
    Fraction { fraction: Decimal },
    /// Recomputed from the current bankroll after every settled round.
    Tiers { bands: Vec<StakeBand>, top: Decimal },
}

impl BaseStake {
    pub fn standard_tiers() -> Self {
        BaseStake::Tiers {
            bands: vec![
                StakeBand { below: dec!(2000), stake: dec!(50) },
                StakeBand { below: dec!(5000), stake: dec!(100) },
                StakeBand { below: dec!(10000), stake: dec!(150) },
                StakeBand { below: dec!(20000), stake: dec!(200) },
            ],
            top: dec!(300),
        }
    }
}

impl Default for BaseStake {
    fn default() -> Self {
        BaseStake::Fraction {
            fraction: dec!(0.03),
        }
    }
}

/// Stake growth while the suggestions keep winning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Press {
    Multiply { factor: Decimal },
    Add { amount: Decimal },
}

impl Press {
    fn apply(&self, stake: Decimal) -> Decimal {
        match self {
            Press::Multiply { factor } => stake * *factor,
            Press::Add { amount } => stake + *amount,
        }
    }
}

impl Default for Press {
    fn default() -> Self {
        Press::Multiply { factor: dec!(1.5) }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StakeConfig {
    pub min_stake: Decimal,
    pub grid: Decimal,
    pub base: BaseStake,
    /// Profit target as a multiple of the opening bankroll.
    pub profit_target: Decimal,
    /// Share of the bankroll a stake may take once the profit target is hit.
    pub profit_lock_fraction: Decimal,
    /// Drawdown brake engages at or below this share of the opening bankroll.
    pub loss_threshold: Decimal,
    /// Brake releases at or above this share of the opening bankroll.
    pub recovery_threshold: Decimal,
    pub press: Press,
    pub press_after_wins: u32,
    pub cut_after_losses: u32,
    pub reset_after_losses: u32,
}

impl Default for StakeConfig {
    fn default() -> Self {
        Self {
            min_stake: dec!(100),
            grid: dec!(50),
            base: BaseStake::default(),
            profit_target: dec!(2),
            profit_lock_fraction: dec!(0.05),
            loss_threshold: dec!(0.6),
            recovery_threshold: dec!(0.8),
            press: Press::default(),
            press_after_wins: 2,
            cut_after_losses: 3,
            reset_after_losses: 5,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StakePolicy {
    config: StakeConfig,
}

impl StakePolicy {
    pub fn new(config: StakeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StakeConfig {
        &self.config
    }

    /// Rounds half-to-even onto the grid, then floors at the minimum stake.
    pub fn finish(&self, amount: Decimal) -> Decimal {
        let cfg = &self.config;
        let snapped = if cfg.grid > Decimal::ZERO {
            (amount / cfg.grid).round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
                * cfg.grid
        } else {
            amount
        };
        snapped.max(cfg.min_stake)
    }

    pub fn base_stake(&self, bankroll: Decimal, initial: Decimal) -> Decimal {
        let raw = match &self.config.base {
            BaseStake::Fraction { fraction } => initial * *fraction,
            BaseStake::Tiers { bands, top } => bands
                .iter()
                .find(|band| bankroll < band.below)
                .map(|band| band.stake)
                .unwrap_or(*top),
        };
        self.finish(raw)
    }

    /// Seeds stakes and thresholds once the opening bankroll is known. The
    /// session is left untouched when a threshold cannot be represented.
    pub fn open(&self, session: &mut Session, bankroll: Decimal) -> Result<(), StakeError> {
        let cfg = &self.config;
        let scaled = |factor: Decimal| {
            bankroll
                .checked_mul(factor)
                .ok_or(StakeError::Overflow(bankroll))
        };
        let profit_target = scaled(cfg.profit_target)?;
        let loss_threshold = scaled(cfg.loss_threshold)?;
        let recovery_threshold = scaled(cfg.recovery_threshold)?;
        scaled(cfg.profit_lock_fraction)?;

        session.bankroll = bankroll;
        session.initial_bankroll = Some(bankroll);
        session.profit_target = profit_target;
        session.loss_threshold = loss_threshold;
        session.recovery_threshold = recovery_threshold;
        session.base_stake = self.base_stake(bankroll, bankroll);
        session.current_stake = session.base_stake;
        session.drawdown_brake = false;
        Ok(())
    }

    /// Updates streaks for a settled suggestion and sets the stake for the
    /// next round. The first matching rule wins: profit lock, drawdown brake,
    /// recovery, then streak response.
    pub fn next_stake(&self, session: &mut Session, outcome_was_win: bool) -> Decimal {
        let cfg = &self.config;
        if outcome_was_win {
            session.streak.record_win();
        } else {
            session.streak.record_loss();
        }

        let bankroll = session.bankroll;
        let initial = session.initial_bankroll.unwrap_or(bankroll);
        let base = self.base_stake(bankroll, initial);
        session.base_stake = base;
        let current = session.current_stake;

        let stake = if bankroll >= session.profit_target {
            current.min(bankroll * cfg.profit_lock_fraction)
        } else if bankroll <= session.loss_threshold {
            session.drawdown_brake = true;
            base / dec!(2)
        } else if session.drawdown_brake {
            if bankroll >= session.recovery_threshold {
                session.drawdown_brake = false;
                base
            } else {
                current
            }
        } else if session.streak.losses() >= cfg.reset_after_losses {
            base
        } else if session.streak.losses() >= cfg.cut_after_losses {
            (current + base) / dec!(2)
        } else if session.streak.wins() >= cfg.press_after_wins {
            cfg.press.apply(current)
        } else {
            current
        };

        session.current_stake = self.finish(stake);
        session.current_stake
    }
}

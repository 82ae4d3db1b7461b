use std::collections::VecDeque;

use rand::{SeedableRng, rngs::StdRng};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::composition::CardComposition;
use crate::game::{RoundRecord, Side, Streak, Winner};

pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// Closed with the end command; state kept for resume.
    Closed,
    /// Bankroll exhausted.
    Ruined,
}

/// Where a conversation sits in the turn state machine. Settlement happens
/// inside a single turn and lands back in `AwaitingRound` or `Ended`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    AwaitingBankroll,
    AwaitingRound,
    Paused,
    Ended(EndReason),
}

impl Phase {
    pub fn is_active(self) -> bool {
        matches!(
            self,
            Phase::AwaitingBankroll | Phase::AwaitingRound | Phase::Paused
        )
    }
}

/// Counters that survive history eviction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Tally {
    pub banker_wins: u32,
    pub player_wins: u32,
    pub ties: u32,
    pub suggestions_won: u32,
    pub suggestions_lost: u32,
}

impl Tally {
    pub fn record_winner(&mut self, winner: Winner) {
        match winner {
            Winner::Banker => self.banker_wins += 1,
            Winner::Player => self.player_wins += 1,
            Winner::Tie => self.ties += 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSummary {
    pub rounds: u32,
    pub banker_wins: u32,
    pub player_wins: u32,
    pub ties: u32,
    pub suggestions_won: u32,
    pub suggestions_lost: u32,
    pub initial_bankroll: Decimal,
    pub final_bankroll: Decimal,
    pub net: Decimal,
}

/// Serializable snapshot handed to transports and the console.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub phase: Phase,
    pub bankroll: Decimal,
    pub base_stake: Decimal,
    pub current_stake: Decimal,
    pub round_number: u32,
    pub streak: Streak,
    pub last_suggestion: Option<Side>,
    pub shoe_remaining: u32,
    pub history: Vec<RoundRecord>,
    pub summary: SessionSummary,
}

/// All per-conversation state. The engine reads and writes it, and keeps
/// nothing of its own between turns.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub phase: Phase,
    pub bankroll: Decimal,
    pub initial_bankroll: Option<Decimal>,
    pub base_stake: Decimal,
    pub current_stake: Decimal,
    pub profit_target: Decimal,
    pub loss_threshold: Decimal,
    pub recovery_threshold: Decimal,
    pub drawdown_brake: bool,
    pub round_number: u32,
    pub streak: Streak,
    pub last_suggestion: Option<Side>,
    pub history: VecDeque<RoundRecord>,
    pub history_capacity: usize,
    pub composition: CardComposition,
    pub tally: Tally,
    pub(crate) rng: StdRng,
}

impl Session {
    pub fn new(seed: Option<u64>, history_capacity: usize) -> Self {
        let seed = seed.unwrap_or_else(rand::random);
        let history_capacity = history_capacity.max(1);
        Self {
            id: Uuid::new_v4(),
            phase: Phase::Idle,
            bankroll: Decimal::ZERO,
            initial_bankroll: None,
            base_stake: Decimal::ZERO,
            current_stake: Decimal::ZERO,
            profit_target: Decimal::ZERO,
            loss_threshold: Decimal::ZERO,
            recovery_threshold: Decimal::ZERO,
            drawdown_brake: false,
            round_number: 0,
            streak: Streak::None,
            last_suggestion: None,
            history: VecDeque::with_capacity(history_capacity),
            history_capacity,
            composition: CardComposition::fresh(),
            tally: Tally::default(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn is_active(&self) -> bool {
        self.phase.is_active()
    }

    /// Appends a record, evicting the oldest once the cap is reached.
    pub fn push_record(&mut self, record: RoundRecord) {
        while self.history.len() >= self.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(record);
    }

    /// Drops every bankroll, stake, streak and history field and returns to
    /// `Idle`. The id and random stream are kept.
    pub fn clear(&mut self) {
        self.phase = Phase::Idle;
        self.bankroll = Decimal::ZERO;
        self.initial_bankroll = None;
        self.base_stake = Decimal::ZERO;
        self.current_stake = Decimal::ZERO;
        self.profit_target = Decimal::ZERO;
        self.loss_threshold = Decimal::ZERO;
        self.recovery_threshold = Decimal::ZERO;
        self.drawdown_brake = false;
        self.round_number = 0;
        self.streak = Streak::None;
        self.last_suggestion = None;
        self.history.clear();
        self.composition = CardComposition::fresh();
        self.tally = Tally::default();
    }

    pub fn summary(&self) -> SessionSummary {
        let initial = self.initial_bankroll.unwrap_or(Decimal::ZERO);
        let final_bankroll = if self.initial_bankroll.is_some() {
            self.bankroll
        } else {
            Decimal::ZERO
        };
        SessionSummary {
            rounds: self.round_number,
            banker_wins: self.tally.banker_wins,
            player_wins: self.tally.player_wins,
            ties: self.tally.ties,
            suggestions_won: self.tally.suggestions_won,
            suggestions_lost: self.tally.suggestions_lost,
            initial_bankroll: initial,
            final_bankroll,
            net: final_bankroll - initial,
        }
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            session_id: self.id,
            phase: self.phase,
            bankroll: self.bankroll,
            base_stake: self.base_stake,
            current_stake: self.current_stake,
            round_number: self.round_number,
            streak: self.streak,
            last_suggestion: self.last_suggestion,
            shoe_remaining: self.composition.total(),
            history: self.history.iter().cloned().collect(),
            summary: self.summary(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(None, DEFAULT_HISTORY_CAPACITY)
    }
}

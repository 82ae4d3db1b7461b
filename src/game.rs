use std::fmt::{Display, Formatter};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Banker,
    Player,
}

impl Display for Side {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Banker => f.write_str("Banker"),
            Side::Player => f.write_str("Player"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    Banker,
    Player,
    Tie,
}

impl Winner {
    pub fn from_totals(player_total: u8, banker_total: u8) -> Self {
        if player_total > banker_total {
            Winner::Player
        } else if player_total == banker_total {
            Winner::Tie
        } else {
            Winner::Banker
        }
    }

    /// +1 banker, -1 player, 0 tie.
    pub fn trend_sign(self) -> f64 {
        match self {
            Winner::Banker => 1.0,
            Winner::Player => -1.0,
            Winner::Tie => 0.0,
        }
    }

    pub fn side(self) -> Option<Side> {
        match self {
            Winner::Banker => Some(Side::Banker),
            Winner::Player => Some(Side::Player),
            Winner::Tie => None,
        }
    }
}

impl Display for Winner {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Winner::Banker => f.write_str("Banker wins"),
            Winner::Player => f.write_str("Player wins"),
            Winner::Tie => f.write_str("Tie"),
        }
    }
}

/// Consecutive suggestion outcomes. A win and a loss streak cannot coexist.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case", tag = "kind", content = "length")]
pub enum Streak {
    #[default]
    None,
    Winning(u32),
    Losing(u32),
}

impl Streak {
    pub fn record_win(&mut self) {
        *self = Streak::Winning(self.wins() + 1);
    }

    pub fn record_loss(&mut self) {
        *self = Streak::Losing(self.losses() + 1);
    }

    pub fn wins(self) -> u32 {
        match self {
            Streak::Winning(n) => n,
            _ => 0,
        }
    }

    pub fn losses(self) -> u32 {
        match self {
            Streak::Losing(n) => n,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Probabilities {
    pub banker: f64,
    pub player: f64,
    pub tie: f64,
}

impl Probabilities {
    pub fn favoured(&self) -> Side {
        if self.banker >= self.player {
            Side::Banker
        } else {
            Side::Player
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BetResult {
    Won,
    Lost,
    Push,
}

/// How the standing suggestion fared against the dealt result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settlement {
    pub side: Side,
    pub stake: Decimal,
    pub result: BetResult,
    pub delta: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Suggestion {
    pub side: Side,
    pub stake: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoundRecord {
    pub round: u32,
    pub winner: Winner,
    pub player_total: u8,
    pub banker_total: u8,
    pub stake: Decimal,
    pub bankroll: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoundReport {
    pub round: u32,
    pub winner: Winner,
    pub player_total: u8,
    pub banker_total: u8,
    pub settlement: Option<Settlement>,
    pub bankroll: Decimal,
    pub probabilities: Probabilities,
    /// `None` once the bankroll is gone.
    pub next: Option<Suggestion>,
    pub ruined: bool,
}

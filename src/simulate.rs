use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cards::{Card, Shoe, play_coup};
use crate::composition::CardComposition;
use crate::engine::{Engine, TurnError, TurnEvent};
use crate::game::BetResult;
use crate::parse::{Command, RoundInput};
use crate::session::Session;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationParams {
    pub rounds: u32,
    pub bankroll: u64,
    pub decks: usize,
    /// Reshuffle once fewer cards than this remain.
    pub cut_card: usize,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            rounds: 10_000,
            bankroll: 5_000,
            decks: 8,
            cut_card: 14,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationReport {
    pub rounds_played: u32,
    pub banker_wins: u32,
    pub player_wins: u32,
    pub ties: u32,
    pub suggestions_won: u32,
    pub suggestions_lost: u32,
    pub final_bankroll: Decimal,
    pub peak_bankroll: Decimal,
    pub low_bankroll: Decimal,
    pub ruined_at: Option<u32>,
    pub reshuffles: u32,
}

fn values(cards: &[Card]) -> Vec<u8> {
    cards.iter().map(Card::point_value).collect()
}

/// Deals coups from a shuffled shoe and feeds them through the engine until
/// `rounds` are played or the bankroll is gone. Every random draw, including
/// the session's jitter stream, comes from `rng`.
pub fn simulate<R: Rng + ?Sized>(
    engine: &Engine,
    params: &SimulationParams,
    rng: &mut R,
) -> Result<SimulationReport, TurnError> {
    let decks = params.decks.max(1);
    let mut session = Session::new(Some(rng.r#gen()), engine.config().history_capacity);
    let commands = &engine.config().commands;
    engine.handle(&mut session, commands.word(Command::Start));
    let opened = engine.handle(&mut session, &params.bankroll.to_string());
    if let TurnEvent::Rejected(err) = opened.event {
        return Err(err);
    }

    let fresh_composition = || CardComposition::uniform(decks as u32 * 4);
    session.composition = fresh_composition();
    let mut shoe = Shoe::new(decks, rng);
    let mut report = SimulationReport {
        rounds_played: 0,
        banker_wins: 0,
        player_wins: 0,
        ties: 0,
        suggestions_won: 0,
        suggestions_lost: 0,
        final_bankroll: session.bankroll,
        peak_bankroll: session.bankroll,
        low_bankroll: session.bankroll,
        ruined_at: None,
        reshuffles: 0,
    };

    while report.rounds_played < params.rounds {
        if shoe.remaining() < params.cut_card.max(6) {
            shoe = Shoe::new(decks, rng);
            session.composition = fresh_composition();
            report.reshuffles += 1;
            debug!(round = report.rounds_played, "shoe reshuffled");
        }
        let Some(coup) = play_coup(&mut shoe) else {
            shoe = Shoe::new(decks, rng);
            session.composition = fresh_composition();
            report.reshuffles += 1;
            continue;
        };

        debug!(round = report.rounds_played + 1, %coup, "coup dealt");
        let round = engine.submit_round(
            &mut session,
            RoundInput::Cards {
                player: values(&coup.player),
                banker: values(&coup.banker),
            },
        )?;
        report.rounds_played += 1;
        if let Some(settlement) = &round.settlement {
            match settlement.result {
                BetResult::Won => report.suggestions_won += 1,
                BetResult::Lost => report.suggestions_lost += 1,
                BetResult::Push => {}
            }
        }
        report.peak_bankroll = report.peak_bankroll.max(round.bankroll);
        report.low_bankroll = report.low_bankroll.min(round.bankroll);
        if round.ruined {
            report.ruined_at = Some(round.round);
            break;
        }
    }

    report.banker_wins = session.tally.banker_wins;
    report.player_wins = session.tally.player_wins;
    report.ties = session.tally.ties;
    report.final_bankroll = session.bankroll;
    info!(
        rounds = report.rounds_played,
        final_bankroll = %report.final_bankroll,
        ruined = report.ruined_at.is_some(),
        "simulation finished"
    );
    Ok(report)
}

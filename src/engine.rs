use std::fmt::Write as _;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cards::RankNotation;
use crate::estimator::{Estimator, EstimatorConfig};
use crate::game::{
    BetResult, Probabilities, RoundRecord, RoundReport, Settlement, Side, Suggestion, Winner,
};
use crate::parse::{
    Command, CommandTable, ParseError, RoundFormat, RoundInput, parse_bankroll, parse_round,
};
use crate::session::{
    DEFAULT_HISTORY_CAPACITY, EndReason, Phase, Session, SessionSummary, SessionView,
};
use crate::staking::{StakeConfig, StakePolicy};

const BANKER_PAYOUT: Decimal = dec!(0.95);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub round_format: RoundFormat,
    pub rank_notation: RankNotation,
    /// First round after the bankroll is set is recorded but not staked.
    pub calibration_round: bool,
    pub history_capacity: usize,
    /// Seeds every new session's random stream; random when absent.
    pub seed: Option<u64>,
    pub commands: CommandTable,
    pub estimator: EstimatorConfig,
    pub stake: StakeConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            round_format: RoundFormat::Auto,
            rank_notation: RankNotation::Symbols,
            calibration_round: true,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            seed: None,
            commands: CommandTable::default(),
            estimator: EstimatorConfig::default(),
            stake: StakeConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TurnError {
    #[error("No game in progress. Send \"{start}\" to begin.")]
    NotStarted { start: String },
    #[error("Send your bankroll first, for example 5000.")]
    BankrollFirst,
    #[error("Bankroll {0}. Send a whole amount such as 5000.")]
    InvalidBankroll(ParseError),
    #[error("Could not read that round: {source}. Expected {example}.")]
    Malformed {
        source: ParseError,
        example: &'static str,
    },
    #[error("Game is paused. Send \"{resume}\" to continue.")]
    Paused { resume: String },
    #[error("Only a game waiting for a round can be paused.")]
    NothingToPause,
    #[error("There is no game to resume. Send \"{start}\" to begin.")]
    CannotResume { start: String },
}

#[derive(Debug, Clone)]
pub enum TurnEvent {
    Started,
    BankrollSet { bankroll: Decimal, base_stake: Decimal },
    Settled(RoundReport),
    Paused,
    Resumed,
    Ended(SessionSummary),
    Reset,
    Status(SessionView),
    Help,
    Rejected(TurnError),
}

/// Text for the transport plus what happened, for callers that care.
#[derive(Debug, Clone)]
pub struct Reply {
    pub text: String,
    pub event: TurnEvent,
}

impl Reply {
    fn new(text: impl Into<String>, event: TurnEvent) -> Self {
        Self {
            text: text.into(),
            event,
        }
    }

    fn rejected(error: TurnError) -> Self {
        Self::new(error.to_string(), TurnEvent::Rejected(error))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self.event, TurnEvent::Rejected(_))
    }
}

/// The round engine. Holds configuration only; all mutable state lives in
/// the `Session` passed to each call.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    estimator: Estimator,
    policy: StakePolicy,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let estimator = Estimator::new(config.estimator.clone());
        let policy = StakePolicy::new(config.stake.clone());
        Self {
            config,
            estimator,
            policy,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn new_session(&self) -> Session {
        Session::new(self.config.seed, self.config.history_capacity)
    }

    fn word(&self, command: Command) -> String {
        self.config.commands.word(command).to_string()
    }

    /// Handles one inbound line and returns the line to send back.
    pub fn handle(&self, session: &mut Session, text: &str) -> Reply {
        let text = text.trim();
        if let Some(command) = self.config.commands.lookup(text) {
            return self.command(session, command);
        }

        match session.phase {
            Phase::Idle | Phase::Ended(_) => Reply::rejected(TurnError::NotStarted {
                start: self.word(Command::Start),
            }),
            Phase::Paused => Reply::rejected(TurnError::Paused {
                resume: self.word(Command::Resume),
            }),
            Phase::AwaitingBankroll => match parse_bankroll(text) {
                Ok(bankroll) => self.set_bankroll(session, bankroll),
                Err(err) => Reply::rejected(TurnError::InvalidBankroll(err)),
            },
            Phase::AwaitingRound => {
                let parsed = parse_round(text, self.config.round_format, self.config.rank_notation);
                let input = match parsed {
                    Ok(input) => input,
                    Err(source) => {
                        warn!(session_id = %session.id, input = text, error = %source, "malformed round input");
                        return Reply::rejected(TurnError::Malformed {
                            source,
                            example: self.config.round_format.example(),
                        });
                    }
                };
                match self.submit_round(session, input) {
                    Ok(report) => Reply::new(self.render_round(session, &report), TurnEvent::Settled(report)),
                    Err(err) => Reply::rejected(err),
                }
            }
        }
    }

    fn command(&self, session: &mut Session, command: Command) -> Reply {
        match command {
            Command::Start => {
                session.clear();
                session.phase = Phase::AwaitingBankroll;
                info!(session_id = %session.id, "session started");
                Reply::new(
                    "New game. Send your bankroll, for example 5000.",
                    TurnEvent::Started,
                )
            }
            Command::End => {
                if !session.is_active() {
                    return Reply::rejected(TurnError::NotStarted {
                        start: self.word(Command::Start),
                    });
                }
                session.phase = Phase::Ended(EndReason::Closed);
                let summary = session.summary();
                info!(session_id = %session.id, rounds = summary.rounds, net = %summary.net, "session ended");
                let mut text = String::from("Game ended.\n");
                text.push_str(&render_summary(&summary));
                Reply::new(text, TurnEvent::Ended(summary))
            }
            Command::Reset => {
                session.clear();
                info!(session_id = %session.id, "session reset");
                Reply::new(
                    format!("Game reset. Send \"{}\" to begin.", self.word(Command::Start)),
                    TurnEvent::Reset,
                )
            }
            Command::Pause => {
                if session.phase != Phase::AwaitingRound {
                    return Reply::rejected(TurnError::NothingToPause);
                }
                session.phase = Phase::Paused;
                Reply::new(
                    format!("Game paused. Send \"{}\" to continue.", self.word(Command::Resume)),
                    TurnEvent::Paused,
                )
            }
            Command::Resume => {
                let resumable = match session.phase {
                    Phase::Paused => true,
                    Phase::Ended(EndReason::Closed) => session.initial_bankroll.is_some(),
                    _ => false,
                };
                if !resumable {
                    return Reply::rejected(TurnError::CannotResume {
                        start: self.word(Command::Start),
                    });
                }
                session.phase = Phase::AwaitingRound;
                info!(session_id = %session.id, "session resumed");
                let mut text = format!("Game resumed. Bankroll: {}", money(session.bankroll));
                if let Some(side) = session.last_suggestion {
                    let _ = write!(text, "\nNext: {side} {}", money(session.current_stake));
                }
                Reply::new(text, TurnEvent::Resumed)
            }
            Command::Status => {
                let view = session.view();
                Reply::new(self.render_status(session), TurnEvent::Status(view))
            }
            Command::Help => Reply::new(self.render_help(), TurnEvent::Help),
        }
    }

    fn set_bankroll(&self, session: &mut Session, bankroll: Decimal) -> Reply {
        if let Err(err) = self.policy.open(session, bankroll) {
            warn!(session_id = %session.id, error = %err, "bankroll refused");
            return Reply::rejected(TurnError::InvalidBankroll(ParseError::BankrollTooLarge(
                bankroll.to_string(),
            )));
        }
        session.phase = Phase::AwaitingRound;
        info!(session_id = %session.id, bankroll = %bankroll, base_stake = %session.base_stake, "bankroll set");

        let mut text = format!(
            "Bankroll set: {}\nBase stake: {}\nProfit target: {}\nDrawdown brake at: {}",
            money(bankroll),
            money(session.base_stake),
            money(session.profit_target),
            money(session.loss_threshold),
        );
        if self.config.calibration_round {
            let _ = write!(
                text,
                "\nRound 1 is a calibration round with no stake. Send the result as {}.",
                self.config.round_format.example()
            );
        } else {
            let probs = self.suggest(session);
            let _ = write!(
                text,
                "\nFirst bet: {} {} ({})",
                probs.favoured(),
                money(session.current_stake),
                percentages(&probs)
            );
        }

        Reply::new(
            text,
            TurnEvent::BankrollSet {
                bankroll,
                base_stake: session.base_stake,
            },
        )
    }

    fn suggest(&self, session: &mut Session) -> Probabilities {
        let probs = self
            .estimator
            .estimate(&session.composition, &session.history, &mut session.rng);
        session.last_suggestion = Some(probs.favoured());
        probs
    }

    /// Settles one round against the standing suggestion and issues the next.
    /// Leaves the session untouched when it is not waiting for a round.
    pub fn submit_round(
        &self,
        session: &mut Session,
        input: RoundInput,
    ) -> Result<RoundReport, TurnError> {
        match session.phase {
            Phase::AwaitingRound => {}
            Phase::AwaitingBankroll => return Err(TurnError::BankrollFirst),
            Phase::Paused => {
                return Err(TurnError::Paused {
                    resume: self.word(Command::Resume),
                });
            }
            Phase::Idle | Phase::Ended(_) => {
                return Err(TurnError::NotStarted {
                    start: self.word(Command::Start),
                });
            }
        }

        session.composition.observe(&input.observed());
        let (player_total, banker_total) = input.totals();
        let winner = Winner::from_totals(player_total, banker_total);
        session.round_number += 1;
        session.tally.record_winner(winner);

        let calibrating = self.config.calibration_round && session.round_number == 1;
        let standing = session.last_suggestion;
        let settlement = match standing {
            Some(side) if !calibrating => Some(self.settle(session, side, winner)),
            _ => None,
        };

        session.push_record(RoundRecord {
            round: session.round_number,
            winner,
            player_total,
            banker_total,
            stake: settlement.as_ref().map(|s| s.stake).unwrap_or(Decimal::ZERO),
            bankroll: session.bankroll,
        });

        let probabilities = self.suggest(session);
        let ruined = session.bankroll <= Decimal::ZERO;
        let next = if ruined {
            session.phase = Phase::Ended(EndReason::Ruined);
            session.last_suggestion = None;
            warn!(session_id = %session.id, round = session.round_number, bankroll = %session.bankroll, "bankroll exhausted");
            None
        } else {
            Some(Suggestion {
                side: probabilities.favoured(),
                stake: session.current_stake,
            })
        };

        debug!(
            session_id = %session.id,
            round = session.round_number,
            ?winner,
            bankroll = %session.bankroll,
            stake = %session.current_stake,
            banker = probabilities.banker,
            "round settled"
        );

        Ok(RoundReport {
            round: session.round_number,
            winner,
            player_total,
            banker_total,
            settlement,
            bankroll: session.bankroll,
            probabilities,
            next,
            ruined,
        })
    }

    fn settle(&self, session: &mut Session, side: Side, winner: Winner) -> Settlement {
        let stake = session.current_stake;
        let (result, delta) = match winner.side() {
            None => (BetResult::Push, Decimal::ZERO),
            Some(actual) if actual == side => {
                let payout = match side {
                    Side::Banker => stake * BANKER_PAYOUT,
                    Side::Player => stake,
                };
                (BetResult::Won, payout)
            }
            Some(_) => (BetResult::Lost, -stake),
        };

        session.bankroll += delta;
        match result {
            BetResult::Won => {
                session.tally.suggestions_won += 1;
                self.policy.next_stake(session, true);
            }
            BetResult::Lost => {
                session.tally.suggestions_lost += 1;
                self.policy.next_stake(session, false);
            }
            BetResult::Push => {}
        }

        Settlement {
            side,
            stake,
            result,
            delta,
        }
    }

    fn render_round(&self, session: &Session, report: &RoundReport) -> String {
        let mut text = format!(
            "Round {}: {} (Player {} - Banker {})",
            report.round, report.winner, report.player_total, report.banker_total
        );
        match &report.settlement {
            Some(s) => {
                let outcome = match s.result {
                    BetResult::Won => format!("won +{}", money(s.delta)),
                    BetResult::Lost => format!("lost {}", money(-s.delta)),
                    BetResult::Push => "push".to_string(),
                };
                let _ = write!(text, "\n{} {} {outcome}", s.side, money(s.stake));
            }
            None => text.push_str("\nNo stake this round."),
        }
        let _ = write!(text, "\nBankroll: {}", money(report.bankroll));

        match &report.next {
            Some(next) => {
                let _ = write!(
                    text,
                    "\nNext: {} {} ({})",
                    next.side,
                    money(next.stake),
                    percentages(&report.probabilities)
                );
            }
            None => {
                let _ = write!(
                    text,
                    "\nBankroll exhausted. Game over.\n{}\nSend \"{}\" to play again.",
                    render_summary(&session.summary()),
                    self.word(Command::Start)
                );
            }
        }
        text
    }

    fn render_status(&self, session: &Session) -> String {
        let phase = match session.phase {
            Phase::Idle => "idle",
            Phase::AwaitingBankroll => "waiting for bankroll",
            Phase::AwaitingRound => "waiting for round",
            Phase::Paused => "paused",
            Phase::Ended(EndReason::Closed) => "ended",
            Phase::Ended(EndReason::Ruined) => "ruined",
        };
        let mut text = format!("Status: {phase}");
        if session.initial_bankroll.is_some() {
            let _ = write!(
                text,
                "\nBankroll: {}\nStake: {}\nRounds: {}\nWin streak: {} / Lose streak: {}",
                money(session.bankroll),
                money(session.current_stake),
                session.round_number,
                session.streak.wins(),
                session.streak.losses(),
            );
        }
        let _ = write!(text, "\nCards left: {}", session.composition.total());
        if let Some(side) = session.last_suggestion {
            let _ = write!(text, "\nNext: {side}");
        }
        text
    }

    fn render_help(&self) -> String {
        let commands = &self.config.commands;
        let names: Vec<&str> = [
            Command::Start,
            Command::End,
            Command::Reset,
            Command::Pause,
            Command::Resume,
            Command::Status,
            Command::Help,
        ]
        .into_iter()
        .map(|c| commands.word(c))
        .collect();
        format!(
            "Commands: {}\nRound input: {} (player first)",
            names.join(", "),
            self.config.round_format.example()
        )
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

pub fn money(amount: Decimal) -> String {
    format!("{:.2}", amount)
}

fn percentages(probs: &Probabilities) -> String {
    let mut text = format!(
        "Banker {:.2}% / Player {:.2}%",
        probs.banker * 100.0,
        probs.player * 100.0
    );
    if probs.tie > 0.0 {
        let _ = write!(text, " / Tie {:.2}%", probs.tie * 100.0);
    }
    text
}

pub fn render_summary(summary: &SessionSummary) -> String {
    format!(
        "Rounds: {}\nBanker {} / Player {} / Tie {}\nSuggestions won {}, lost {}\nFinal bankroll: {}\nNet: {}",
        summary.rounds,
        summary.banker_wins,
        summary.player_wins,
        summary.ties,
        summary.suggestions_won,
        summary.suggestions_lost,
        money(summary.final_bankroll),
        money(summary.net),
    )
}

use itertools::Itertools;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cards::{RankNotation, point_total};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Start,
    End,
    Reset,
    Pause,
    Resume,
    Status,
    Help,
}

/// Words recognised for each command, matched case-insensitively against the
/// whole message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CommandTable {
    pub start: Vec<String>,
    pub end: Vec<String>,
    pub reset: Vec<String>,
    pub pause: Vec<String>,
    pub resume: Vec<String>,
    pub status: Vec<String>,
    pub help: Vec<String>,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

impl Default for CommandTable {
    fn default() -> Self {
        Self {
            start: words(&["start", "開始"]),
            end: words(&["end", "結束"]),
            reset: words(&["reset", "重置"]),
            pause: words(&["pause", "暫停"]),
            resume: words(&["resume", "繼續"]),
            status: words(&["status", "狀態"]),
            help: words(&["help", "說明"]),
        }
    }
}

impl CommandTable {
    pub fn lookup(&self, text: &str) -> Option<Command> {
        let needle = text.trim().to_lowercase();
        let entries = [
            (Command::Start, &self.start),
            (Command::End, &self.end),
            (Command::Reset, &self.reset),
            (Command::Pause, &self.pause),
            (Command::Resume, &self.resume),
            (Command::Status, &self.status),
            (Command::Help, &self.help),
        ];
        entries
            .into_iter()
            .find(|(_, list)| list.iter().any(|w| w.to_lowercase() == needle))
            .map(|(command, _)| command)
    }

    /// First word configured for a command, used in prompts.
    pub fn word(&self, command: Command) -> &str {
        let list = match command {
            Command::Start => &self.start,
            Command::End => &self.end,
            Command::Reset => &self.reset,
            Command::Pause => &self.pause,
            Command::Resume => &self.resume,
            Command::Status => &self.status,
            Command::Help => &self.help,
        };
        list.first().map(String::as_str).unwrap_or("?")
    }
}

/// Accepted shape of round input for a deployment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RoundFormat {
    /// Cards when the text has a slash or a letter, scores otherwise.
    #[default]
    Auto,
    /// `6 8` or `68`: player total then banker total.
    Scores,
    /// `AJ / K8J`: player hand then banker hand.
    Cards,
}

impl RoundFormat {
    pub fn example(self) -> &'static str {
        match self {
            RoundFormat::Auto => "6 8 or AJ / K8J",
            RoundFormat::Scores => "6 8",
            RoundFormat::Cards => "AJ / K8J",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundInput {
    Scores { player: u8, banker: u8 },
    Cards { player: Vec<u8>, banker: Vec<u8> },
}

impl RoundInput {
    /// (player, banker) point totals.
    pub fn totals(&self) -> (u8, u8) {
        match self {
            RoundInput::Scores { player, banker } => (*player, *banker),
            RoundInput::Cards { player, banker } => (point_total(player), point_total(banker)),
        }
    }

    /// Card values seen this round; empty for score input.
    pub fn observed(&self) -> Vec<u8> {
        match self {
            RoundInput::Scores { .. } => Vec::new(),
            RoundInput::Cards { player, banker } => {
                player.iter().chain(banker.iter()).copied().collect()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("nothing to read")]
    Empty,
    #[error("expected two parts (player then banker), found {0}")]
    PartCount(usize),
    #[error("score '{0}' is not a digit from 0 to 9")]
    Score(String),
    #[error("{0}")]
    Card(String),
    #[error("a hand holds 2 or 3 cards, found {0}")]
    HandSize(usize),
    #[error("'{0}' is not a positive whole amount")]
    Bankroll(String),
    #[error("'{0}' is too large for the configured thresholds")]
    BankrollTooLarge(String),
}

pub fn parse_bankroll(text: &str) -> Result<Decimal, ParseError> {
    let trimmed = text.trim();
    match trimmed.parse::<u64>() {
        Ok(amount) if amount > 0 && trimmed.chars().all(|c| c.is_ascii_digit()) => {
            Ok(Decimal::from(amount))
        }
        _ => Err(ParseError::Bankroll(trimmed.to_string())),
    }
}

pub fn parse_round(
    text: &str,
    format: RoundFormat,
    notation: RankNotation,
) -> Result<RoundInput, ParseError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }

    let format = match format {
        RoundFormat::Auto if looks_like_cards(trimmed) => RoundFormat::Cards,
        RoundFormat::Auto => RoundFormat::Scores,
        other => other,
    };

    match format {
        RoundFormat::Cards => parse_cards(trimmed, notation),
        _ => parse_scores(trimmed),
    }
}

/// Hands are separated by `/`, use rank letters, or have a multi-card token
/// next to another token. A lone two-digit token is a compact score pair.
fn looks_like_cards(text: &str) -> bool {
    if text.contains('/') || text.chars().any(char::is_alphabetic) {
        return true;
    }
    let tokens: Vec<&str> = text.split_whitespace().collect();
    tokens.len() > 1 && tokens.iter().any(|token| token.chars().count() > 1)
}

fn parse_scores(text: &str) -> Result<RoundInput, ParseError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let (player, banker) = match tokens.as_slice() {
        [compact] if compact.chars().count() == 2 => {
            let chars: Vec<char> = compact.chars().collect();
            (chars[0].to_string(), chars[1].to_string())
        }
        [player, banker] => (player.to_string(), banker.to_string()),
        other => return Err(ParseError::PartCount(other.len())),
    };
    Ok(RoundInput::Scores {
        player: score(&player)?,
        banker: score(&banker)?,
    })
}

fn score(token: &str) -> Result<u8, ParseError> {
    match token.parse::<u8>() {
        Ok(value) if value <= 9 && token.len() == 1 => Ok(value),
        _ => Err(ParseError::Score(token.to_string())),
    }
}

fn parse_cards(text: &str, notation: RankNotation) -> Result<RoundInput, ParseError> {
    let parts: Vec<&str> = if text.contains('/') {
        text.split('/').map(str::trim).collect()
    } else {
        text.split_whitespace().collect()
    };
    let count = parts.len();
    let (player, banker) = parts
        .into_iter()
        .collect_tuple()
        .ok_or(ParseError::PartCount(count))?;
    Ok(RoundInput::Cards {
        player: hand(player, notation)?,
        banker: hand(banker, notation)?,
    })
}

fn hand(text: &str, notation: RankNotation) -> Result<Vec<u8>, ParseError> {
    let values = notation.point_values(text).map_err(ParseError::Card)?;
    if !(2..=3).contains(&values.len()) {
        return Err(ParseError::HandSize(values.len()));
    }
    Ok(values)
}

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

pub const CARDS_PER_DECK: usize = 52;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Suit {
    Clubs,
    Diamonds,
    Hearts,
    Spades,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];

    pub fn symbol(self) -> &'static str {
        match self {
            Suit::Clubs => "♣",
            Suit::Diamonds => "♦",
            Suit::Hearts => "♥",
            Suit::Spades => "♠",
        }
    }
}

impl Display for Suit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[repr(u8)]
pub enum Rank {
    Ace = 1,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Ace,
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
    ];

    /// Baccarat point value: ace counts one, tens and faces count zero.
    pub fn point_value(self) -> u8 {
        match self {
            Rank::Ten | Rank::Jack | Rank::Queen | Rank::King => 0,
            other => other as u8,
        }
    }

    pub fn short_label(self) -> &'static str {
        match self {
            Rank::Ace => "A",
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
        }
    }
}

impl Display for Rank {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.short_label())
    }
}

impl FromStr for Rank {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "A" | "1" => Ok(Rank::Ace),
            "2" => Ok(Rank::Two),
            "3" => Ok(Rank::Three),
            "4" => Ok(Rank::Four),
            "5" => Ok(Rank::Five),
            "6" => Ok(Rank::Six),
            "7" => Ok(Rank::Seven),
            "8" => Ok(Rank::Eight),
            "9" => Ok(Rank::Nine),
            "T" | "10" => Ok(Rank::Ten),
            "J" => Ok(Rank::Jack),
            "Q" => Ok(Rank::Queen),
            "K" => Ok(Rank::King),
            _ => Err(format!("Invalid rank '{s}'")),
        }
    }
}

/// How card ranks are written in round input.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RankNotation {
    /// `A 2..9 10 T J Q K`.
    #[default]
    Symbols,
    /// One digit per card, already reduced to its point value.
    Digits,
}

impl RankNotation {
    /// Splits a hand such as `K8J` or `A10` into point values.
    pub fn point_values(self, hand: &str) -> Result<Vec<u8>, String> {
        let chars: Vec<char> = hand.chars().filter(|c| !c.is_whitespace()).collect();
        let mut values = Vec::with_capacity(3);
        let mut idx = 0;
        while idx < chars.len() {
            let ch = chars[idx];
            match self {
                RankNotation::Digits => {
                    let value = ch
                        .to_digit(10)
                        .ok_or_else(|| format!("Invalid card digit '{ch}'"))?;
                    values.push(value as u8);
                    idx += 1;
                }
                RankNotation::Symbols => {
                    if ch == '1' && chars.get(idx + 1) == Some(&'0') {
                        values.push(Rank::Ten.point_value());
                        idx += 2;
                        continue;
                    }
                    let rank: Rank = ch.to_string().parse()?;
                    values.push(rank.point_value());
                    idx += 1;
                }
            }
        }
        Ok(values)
    }
}

/// Sum of card values modulo ten.
pub fn point_total(values: &[u8]) -> u8 {
    (values.iter().map(|&v| v as u32).sum::<u32>() % 10) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    pub fn point_value(&self) -> u8 {
        self.rank.point_value()
    }

    pub fn notation(&self) -> String {
        format!("{}{}", self.rank.short_label(), self.suit.symbol())
    }
}

impl Display for Card {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.notation())
    }
}

pub fn standard_deck() -> Vec<Card> {
    let mut cards = Vec::with_capacity(CARDS_PER_DECK);
    for suit in Suit::ALL {
        for rank in Rank::ALL {
            cards.push(Card::new(rank, suit));
        }
    }
    cards
}

/// A shuffled multi-deck shoe dealt from the top.
#[derive(Debug, Clone)]
pub struct Shoe {
    cards: Vec<Card>,
}

impl Shoe {
    pub fn new<R: Rng + ?Sized>(decks: usize, rng: &mut R) -> Self {
        let mut cards = Vec::with_capacity(decks * CARDS_PER_DECK);
        for _ in 0..decks {
            cards.extend(standard_deck());
        }
        cards.shuffle(rng);
        Self { cards }
    }

    pub fn remaining(&self) -> usize {
        self.cards.len()
    }

    pub fn draw(&mut self) -> Option<Card> {
        self.cards.pop()
    }
}

/// Cards dealt to both hands for one coup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coup {
    pub player: Vec<Card>,
    pub banker: Vec<Card>,
}

impl Coup {
    pub fn player_total(&self) -> u8 {
        hand_total(&self.player)
    }

    pub fn banker_total(&self) -> u8 {
        hand_total(&self.banker)
    }
}

impl Display for Coup {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let hand = |cards: &[Card]| cards.iter().map(Card::to_string).collect::<Vec<_>>().join(" ");
        write!(f, "{} / {}", hand(&self.player), hand(&self.banker))
    }
}

fn hand_total(cards: &[Card]) -> u8 {
    let values: Vec<u8> = cards.iter().map(Card::point_value).collect();
    point_total(&values)
}

/// Deals one coup under the standard third-card tableau. Returns `None` when
/// the shoe runs dry mid-deal.
pub fn play_coup(shoe: &mut Shoe) -> Option<Coup> {
    let mut player = vec![shoe.draw()?];
    let mut banker = vec![shoe.draw()?];
    player.push(shoe.draw()?);
    banker.push(shoe.draw()?);

    let player_total = hand_total(&player);
    let banker_total = hand_total(&banker);
    if player_total >= 8 || banker_total >= 8 {
        return Some(Coup { player, banker });
    }

    let mut player_third = None;
    if player_total <= 5 {
        let card = shoe.draw()?;
        player_third = Some(card.point_value());
        player.push(card);
    }

    if banker_draws(banker_total, player_third) {
        banker.push(shoe.draw()?);
    }

    Some(Coup { player, banker })
}

fn banker_draws(banker_total: u8, player_third: Option<u8>) -> bool {
    match player_third {
        None => banker_total <= 5,
        Some(third) => match banker_total {
            0..=2 => true,
            3 => third != 8,
            4 => (2..=7).contains(&third),
            5 => (4..=7).contains(&third),
            6 => (6..=7).contains(&third),
            _ => false,
        },
    }
}

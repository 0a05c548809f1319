use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::rules::RuleError;

/// 每种颜色的押注牌数量。
pub const WAGERS_PER_COLOR: usize = 3;
/// 每种颜色的牌数：2~10 各一张，外加押注牌。
pub const CARDS_PER_COLOR: usize = 9 + WAGERS_PER_COLOR;

const MIN_NUMBER: u8 = 2;
const MAX_NUMBER: u8 = 10;

/// 探险颜色，声明顺序即排序顺序。
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub enum Color {
    Yellow,
    Blue,
    White,
    Green,
    Red,
    Purple,
}

impl Color {
    pub const ALL: [Color; 6] = [
        Color::Yellow,
        Color::Blue,
        Color::White,
        Color::Green,
        Color::Red,
        Color::Purple,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Color::Yellow => "Yellow",
            Color::Blue => "Blue",
            Color::White => "White",
            Color::Green => "Green",
            Color::Red => "Red",
            Color::Purple => "Purple",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Color {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::ALL
            .iter()
            .copied()
            .find(|color| color.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RuleError::InvalidCard {
                input: s.to_string(),
            })
    }
}

/// 点数：2~10，或 0 表示押注牌。
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rank(u8);

impl Rank {
    pub const WAGER: Rank = Rank(0);

    pub fn new(value: u8) -> Result<Self, RuleError> {
        match value {
            0 => Ok(Rank::WAGER),
            MIN_NUMBER..=MAX_NUMBER => Ok(Rank(value)),
            _ => Err(RuleError::InvalidCard {
                input: value.to_string(),
            }),
        }
    }

    pub fn numbers() -> impl Iterator<Item = Rank> {
        (MIN_NUMBER..=MAX_NUMBER).map(Rank)
    }

    pub fn is_wager(self) -> bool {
        self.0 == 0
    }

    /// 计分用的数值，押注牌为 0。
    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rank {
    type Error = RuleError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Rank::new(value)
    }
}

impl From<Rank> for u8 {
    fn from(rank: Rank) -> Self {
        rank.0
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_wager() {
            f.write_str("W")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// 一张牌：颜色 + 点数，构造后不可变。
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct Card {
    pub color: Color,
    pub rank: Rank,
}

impl Card {
    pub fn new(color: Color, value: u8) -> Result<Self, RuleError> {
        Ok(Self {
            color,
            rank: Rank::new(value)?,
        })
    }

    pub fn with_rank(color: Color, rank: Rank) -> Self {
        Self { color, rank }
    }

    pub fn wager(color: Color) -> Self {
        Self::with_rank(color, Rank::WAGER)
    }

    pub fn is_wager(&self) -> bool {
        self.rank.is_wager()
    }

    pub fn value(&self) -> u8 {
        self.rank.value()
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.rank, self.color)
    }
}

/// 解析 `"7:Red"`、`"W:Blue"` 形式的文本。
impl FromStr for Card {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RuleError::InvalidCard {
            input: s.to_string(),
        };
        let (rank, color) = s.split_once(':').ok_or_else(invalid)?;
        let color: Color = color.parse().map_err(|_| invalid())?;
        let rank = match rank.trim() {
            "W" | "w" | "Bet" | "bet" => Rank::WAGER,
            digits => {
                let value: u8 = digits.parse().map_err(|_| invalid())?;
                Rank::new(value).map_err(|_| invalid())?
            }
        };
        Ok(Card::with_rank(color, rank))
    }
}

/// 5 色或 6 色规则。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(try_from = "u8", into = "u8")]
pub enum ColorVariant {
    #[default]
    FiveColors,
    SixColors,
}

impl ColorVariant {
    pub fn from_count(count: u8) -> Result<Self, RuleError> {
        match count {
            5 => Ok(ColorVariant::FiveColors),
            6 => Ok(ColorVariant::SixColors),
            other => Err(RuleError::InvalidVariant { colors: other }),
        }
    }

    pub fn colors(self) -> &'static [Color] {
        match self {
            ColorVariant::FiveColors => &Color::ALL[..5],
            ColorVariant::SixColors => &Color::ALL[..],
        }
    }

    pub fn color_count(self) -> usize {
        self.colors().len()
    }

    pub fn deck_size(self) -> usize {
        self.color_count() * CARDS_PER_COLOR
    }

    pub fn contains(self, color: Color) -> bool {
        self.colors().contains(&color)
    }

    pub fn ensure_contains(self, card: &Card) -> Result<(), RuleError> {
        if self.contains(card.color) {
            Ok(())
        } else {
            Err(RuleError::InvalidCard {
                input: card.to_string(),
            })
        }
    }

    /// 按颜色、点数顺序枚举整副牌（未洗牌）。
    pub fn full_deck(self) -> Vec<Card> {
        let mut cards = Vec::with_capacity(self.deck_size());
        for &color in self.colors() {
            for _ in 0..WAGERS_PER_COLOR {
                cards.push(Card::wager(color));
            }
            cards.extend(Rank::numbers().map(|rank| Card::with_rank(color, rank)));
        }
        cards
    }
}

impl TryFrom<u8> for ColorVariant {
    type Error = RuleError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        ColorVariant::from_count(value)
    }
}

impl From<ColorVariant> for u8 {
    fn from(variant: ColorVariant) -> Self {
        variant.color_count() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_rejects_values_outside_the_deck() {
        assert!(Rank::new(1).is_err());
        assert!(Rank::new(11).is_err());
        assert!(matches!(
            Card::new(Color::Blue, 1),
            Err(RuleError::InvalidCard { .. })
        ));
        assert!(Rank::new(0).expect("wager rank").is_wager());
        assert_eq!(Rank::new(10).expect("rank 10").value(), 10);
    }

    #[test]
    fn wager_sorts_below_two_and_color_is_primary_key() {
        let wager = Card::wager(Color::Red);
        let two = Card::new(Color::Red, 2).expect("valid card");
        let yellow_ten = Card::new(Color::Yellow, 10).expect("valid card");
        assert!(wager < two);
        assert!(yellow_ten < wager, "Yellow precedes Red regardless of rank");
    }

    #[test]
    fn card_text_form_round_trips() {
        let card: Card = "7:Red".parse().expect("card should parse");
        assert_eq!(card, Card::new(Color::Red, 7).expect("valid card"));
        assert_eq!(card.to_string(), "7:Red");

        let wager: Card = "Bet:blue".parse().expect("wager should parse");
        assert_eq!(wager, Card::wager(Color::Blue));
        assert_eq!(wager.to_string(), "W:Blue");

        assert!("11:Red".parse::<Card>().is_err());
        assert!("5:Orange".parse::<Card>().is_err());
        assert!("5Red".parse::<Card>().is_err());
    }

    #[test]
    fn variant_counts_and_membership() {
        assert_eq!(ColorVariant::FiveColors.deck_size(), 60);
        assert_eq!(ColorVariant::SixColors.deck_size(), 72);
        assert!(!ColorVariant::FiveColors.contains(Color::Purple));
        assert!(ColorVariant::FiveColors
            .ensure_contains(&Card::wager(Color::Purple))
            .is_err());
        for count in [0, 4, 7] {
            assert!(matches!(
                ColorVariant::from_count(count),
                Err(RuleError::InvalidVariant { .. })
            ));
        }
    }

    #[test]
    fn full_deck_has_three_wagers_and_each_number_once_per_color() {
        let deck = ColorVariant::FiveColors.full_deck();
        assert_eq!(deck.len(), 60);
        for &color in ColorVariant::FiveColors.colors() {
            let wagers = deck
                .iter()
                .filter(|card| card.color == color && card.is_wager())
                .count();
            assert_eq!(wagers, WAGERS_PER_COLOR);
            for rank in Rank::numbers() {
                assert_eq!(
                    deck.iter()
                        .filter(|card| **card == Card::with_rank(color, rank))
                        .count(),
                    1
                );
            }
        }
    }

    #[test]
    fn card_serializes_with_numeric_rank() {
        let json = serde_json::to_string(&Card::wager(Color::Green)).expect("serialize");
        assert_eq!(json, r#"{"color":"Green","rank":0}"#);
        let parsed: Card = serde_json::from_str(r#"{"color":"Red","rank":9}"#).expect("parse");
        assert_eq!(parsed, Card::new(Color::Red, 9).expect("valid card"));
        assert!(serde_json::from_str::<Card>(r#"{"color":"Red","rank":1}"#).is_err());
    }
}

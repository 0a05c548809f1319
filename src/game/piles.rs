use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::card::{Card, Color, ColorVariant};
use super::rules::RuleError;

/// 抽牌堆：从末尾取牌（栈语义）。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Deck {
    #[serde(default)]
    cards: Vec<Card>,
}

impl Deck {
    /// 按固定顺序生成整副牌，需要调用 [`Deck::shuffle`]。
    pub fn full(variant: ColorVariant) -> Self {
        Self {
            cards: variant.full_deck(),
        }
    }

    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    pub fn draw(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
}

/// 每种颜色一个弃牌堆，栈顶为最后弃掉的牌。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DiscardPiles {
    #[serde(default)]
    piles: BTreeMap<Color, Vec<Card>>,
}

impl DiscardPiles {
    pub fn new(variant: ColorVariant) -> Self {
        Self {
            piles: variant
                .colors()
                .iter()
                .map(|&color| (color, Vec::new()))
                .collect(),
        }
    }

    pub fn push(&mut self, card: Card) {
        self.piles.entry(card.color).or_default().push(card);
    }

    pub fn top(&self, color: Color) -> Option<&Card> {
        self.piles.get(&color).and_then(|pile| pile.last())
    }

    pub fn take(&mut self, color: Color) -> Result<Card, RuleError> {
        self.piles
            .get_mut(&color)
            .and_then(|pile| pile.pop())
            .ok_or(RuleError::EmptyPile { color })
    }

    pub fn pile(&self, color: Color) -> &[Card] {
        self.piles.get(&color).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 所有非空弃牌堆的栈顶。
    pub fn tops(&self) -> impl Iterator<Item = &Card> + '_ {
        self.piles.values().filter_map(|pile| pile.last())
    }

    pub fn len(&self) -> usize {
        self.piles.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.piles.values().all(Vec::is_empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> + '_ {
        self.piles.values().flatten()
    }
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::card::{Card, Color, ColorVariant};
use super::rules::RuleError;

/// 开启一条探险的成本。
pub const EXPEDITION_COST: i32 = 20;
/// 长探险奖励分。
pub const LENGTH_BONUS: i32 = 20;
pub const DEFAULT_BONUS_THRESHOLD: usize = 8;

/// 计算一条探险的得分，与出牌顺序无关。
pub fn score_cards(cards: &[Card], bonus_threshold: usize) -> i32 {
    if cards.is_empty() {
        return 0;
    }
    let multiplier = cards.iter().filter(|card| card.is_wager()).count() as i32 + 1;
    let sum: i32 = cards.iter().map(|card| card.value() as i32).sum();
    let mut score = (sum - EXPEDITION_COST) * multiplier;
    if cards.len() >= bonus_threshold {
        score += LENGTH_BONUS;
    }
    score
}

/// 单个颜色的已出牌序列（按出牌顺序）。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Expedition {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    cards: Vec<Card>,
}

impl Expedition {
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn top(&self) -> Option<&Card> {
        self.cards.last()
    }

    pub fn is_started(&self) -> bool {
        !self.cards.is_empty()
    }

    pub fn wager_count(&self) -> usize {
        self.cards.iter().filter(|card| card.is_wager()).count()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// 顶牌的点数，未开启或只有押注牌时为 0。
    pub fn top_value(&self) -> u8 {
        self.top().map(Card::value).unwrap_or(0)
    }

    /// 押注牌只能在第一张数字牌之前；数字牌不能小于顶牌。
    pub fn accepts(&self, card: &Card) -> Result<(), RuleError> {
        let Some(top) = self.top() else {
            return Ok(());
        };
        let playable = if card.is_wager() {
            top.is_wager()
        } else {
            card.rank >= top.rank
        };
        if playable {
            Ok(())
        } else {
            Err(RuleError::CardNotPlayable {
                card: *card,
                required: *top,
            })
        }
    }

    pub fn push(&mut self, card: Card) -> Result<(), RuleError> {
        self.accepts(&card)?;
        self.cards.push(card);
        Ok(())
    }

    pub fn score(&self, bonus_threshold: usize) -> i32 {
        score_cards(&self.cards, bonus_threshold)
    }

    /// 检查序列是否满足出牌规则，用于状态完整性校验。
    pub fn is_well_ordered(&self) -> bool {
        let mut seen_number: Option<&Card> = None;
        for card in &self.cards {
            match (card.is_wager(), seen_number) {
                (true, Some(_)) => return false,
                (true, None) => {}
                (false, Some(previous)) if card.rank < previous.rank => return false,
                (false, _) => seen_number = Some(card),
            }
        }
        true
    }
}

/// 一名玩家的全部探险。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Board {
    expeditions: BTreeMap<Color, Expedition>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ScoreSheet {
    pub total: i32,
    pub per_color: BTreeMap<Color, i32>,
}

impl Board {
    pub fn new(variant: ColorVariant) -> Self {
        Self {
            expeditions: variant
                .colors()
                .iter()
                .map(|&color| (color, Expedition::default()))
                .collect(),
        }
    }

    pub fn expedition(&self, color: Color) -> Option<&Expedition> {
        self.expeditions.get(&color)
    }

    pub fn top(&self, color: Color) -> Option<&Card> {
        self.expedition(color).and_then(Expedition::top)
    }

    pub fn is_started(&self, color: Color) -> bool {
        self.expedition(color).is_some_and(Expedition::is_started)
    }

    pub fn accepts(&self, card: &Card) -> Result<(), RuleError> {
        match self.expedition(card.color) {
            Some(expedition) => expedition.accepts(card),
            None => Err(RuleError::InvalidCard {
                input: card.to_string(),
            }),
        }
    }

    pub fn play(&mut self, card: Card) -> Result<(), RuleError> {
        match self.expeditions.get_mut(&card.color) {
            Some(expedition) => expedition.push(card),
            None => Err(RuleError::InvalidCard {
                input: card.to_string(),
            }),
        }
    }

    pub fn colors(&self) -> impl Iterator<Item = Color> + '_ {
        self.expeditions.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Color, &Expedition)> + '_ {
        self.expeditions
            .iter()
            .map(|(color, expedition)| (*color, expedition))
    }

    pub fn card_count(&self) -> usize {
        self.expeditions.values().map(Expedition::len).sum()
    }

    pub fn score_sheet(&self, bonus_threshold: usize) -> ScoreSheet {
        let per_color: BTreeMap<Color, i32> = self
            .expeditions
            .iter()
            .map(|(color, expedition)| (*color, expedition.score(bonus_threshold)))
            .collect();
        ScoreSheet {
            total: per_color.values().sum(),
            per_color,
        }
    }
}

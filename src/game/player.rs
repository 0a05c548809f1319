use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::card::{Card, ColorVariant};
use super::expedition::{Board, ScoreSheet};
use super::rules::RuleError;
use crate::ai::AiConfig;

/// 玩家标识。
pub type PlayerId = u8;

/// 由谁来做决定：外部调用方（人类）或内置策略（电脑）。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "type")]
pub enum Controller {
    #[default]
    Human,
    Computer {
        #[serde(default)]
        config: AiConfig,
    },
}

impl Controller {
    pub fn computer() -> Self {
        Controller::Computer {
            config: AiConfig::default(),
        }
    }
}

/// 玩家状态：手牌与各颜色的探险。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    #[serde(default)]
    pub controller: Controller,
    #[serde(default)]
    pub hand: Vec<Card>,
    pub board: Board,
}

impl Player {
    pub fn new(
        id: PlayerId,
        name: impl Into<String>,
        controller: Controller,
        variant: ColorVariant,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            controller,
            hand: Vec::new(),
            board: Board::new(variant),
        }
    }

    pub fn find_card_in_hand_index(&self, card: &Card) -> Option<usize> {
        self.hand.iter().position(|held| held == card)
    }

    pub fn holds(&self, card: &Card) -> bool {
        self.find_card_in_hand_index(card).is_some()
    }

    /// 不修改状态的出牌合法性检查。
    pub fn can_play(&self, card: &Card) -> Result<(), RuleError> {
        if !self.holds(card) {
            return Err(RuleError::CardNotInHand { card: *card });
        }
        self.board.accepts(card)
    }

    pub fn playable_cards(&self) -> impl Iterator<Item = &Card> + '_ {
        self.hand
            .iter()
            .filter(|card| self.board.accepts(card).is_ok())
    }

    pub fn play(&mut self, card: Card) -> Result<(), RuleError> {
        let index = self
            .find_card_in_hand_index(&card)
            .ok_or(RuleError::CardNotInHand { card })?;
        if let Err(error) = self.board.accepts(&card) {
            if let RuleError::CardNotPlayable { required, .. } = &error {
                info!(
                    "{} can not play {} because the last card is {}",
                    self.name, card, required
                );
            }
            return Err(error);
        }
        self.hand.remove(index);
        self.board.play(card)?;
        info!("{} plays {}", self.name, card);
        Ok(())
    }

    pub fn discard(&mut self, card: Card) -> Result<Card, RuleError> {
        let index = self
            .find_card_in_hand_index(&card)
            .ok_or(RuleError::CardNotInHand { card })?;
        let removed = self.hand.remove(index);
        info!("{} discards {}", self.name, removed);
        Ok(removed)
    }

    pub fn draw(&mut self, card: Card) {
        self.hand.push(card);
    }

    /// 按颜色、点数整理手牌，不影响计分。
    pub fn reorder_hand(&mut self) {
        self.hand.sort();
    }

    pub fn score_sheet(&self, bonus_threshold: usize) -> ScoreSheet {
        self.board.score_sheet(bonus_threshold)
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} playing with {} colors, {} cards in hand",
            self.name,
            self.board.colors().count(),
            self.hand.len()
        )
    }
}

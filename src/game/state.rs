use log::info;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::card::{Card, Color};
use super::config::GameConfig;
use super::expedition::ScoreSheet;
use super::piles::{Deck, DiscardPiles};
use super::player::{Player, PlayerId};
use super::rules::DrawSource;

pub const PLAYER_COUNT: usize = 2;

/// 回合阶段：先出牌或弃牌，再抽牌。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TurnPhase {
    #[default]
    AwaitingAction,
    AwaitingDraw,
    Finished,
}

/// 终局结果，平局单独报告。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameOutcome {
    Winner {
        player_id: PlayerId,
        score: i32,
        margin: i32,
    },
    Tie {
        score: i32,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerScore {
    pub name: String,
    pub total: i32,
    pub per_color: BTreeMap<Color, i32>,
}

impl PlayerScore {
    fn new(name: &str, sheet: ScoreSheet) -> Self {
        Self {
            name: name.to_string(),
            total: sheet.total,
            per_color: sheet.per_color,
        }
    }
}

/// 玩家最近一次弃牌，电脑据此决定是否拿对手刚弃的牌。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiscardRecord {
    pub player_id: PlayerId,
    pub card: Card,
    pub turn: u32,
}

/// 游戏事件流。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameEvent {
    CardPlayed {
        player_id: PlayerId,
        card: Card,
    },
    CardDiscarded {
        player_id: PlayerId,
        card: Card,
    },
    CardDrawn {
        player_id: PlayerId,
        card: Card,
        source: DrawSource,
    },
    DrawFallback {
        player_id: PlayerId,
        requested: DrawSource,
    },
    TurnEnded {
        player_id: PlayerId,
    },
    GameFinished {
        outcome: GameOutcome,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[serde(tag = "type")]
pub enum IntegrityError {
    #[error("expected {expected} players, found {actual}")]
    InvalidPlayerCount { expected: usize, actual: usize },
    #[error("current player {player_id} is not seated")]
    InvalidPlayerIndex { player_id: PlayerId },
    #[error("card {card} does not belong to this variant")]
    ForeignCard { card: Card },
    #[error("card {card} appears {count} times, at most {allowed} allowed")]
    DuplicateCard {
        card: Card,
        count: usize,
        allowed: usize,
    },
    #[error("{actual} cards in play, expected {expected}")]
    CardCountMismatch { expected: usize, actual: usize },
    #[error("player {player_id} holds {size} cards, limit is {limit}")]
    HandOverflow {
        player_id: PlayerId,
        size: usize,
        limit: usize,
    },
    #[error("player {player_id} has an out-of-order {color} expedition")]
    ExpeditionOutOfOrder { player_id: PlayerId, color: Color },
}

/// 游戏整体状态。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameState {
    #[serde(default)]
    pub config: GameConfig,
    pub deck: Deck,
    pub discard_piles: DiscardPiles,
    #[serde(default)]
    pub players: Vec<Player>,
    pub current_player: PlayerId,
    pub turn: u32,
    #[serde(default)]
    pub phase: TurnPhase,
    /// 每位玩家各自最近一次弃牌，互不覆盖。
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub last_discards: BTreeMap<PlayerId, DiscardRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event_log: Vec<GameEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<GameOutcome>,
}

impl GameState {
    /// 创建未发牌的状态：牌堆按固定顺序排列。
    pub fn new(config: GameConfig, players: Vec<Player>) -> Self {
        let current_player = players.first().map(|player| player.id).unwrap_or_default();
        Self {
            deck: Deck::full(config.variant),
            discard_piles: DiscardPiles::new(config.variant),
            players,
            current_player,
            turn: 1,
            phase: TurnPhase::default(),
            last_discards: BTreeMap::new(),
            event_log: Vec::new(),
            outcome: None,
            config,
        }
    }

    /// 洗牌并轮流给每位玩家发牌。
    pub fn setup<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.deck = Deck::full(self.config.variant);
        self.deck.shuffle(rng);
        for _ in 0..self.config.hand_size {
            for player in &mut self.players {
                if let Some(card) = self.deck.draw() {
                    player.draw(card);
                }
            }
        }
        for player in &mut self.players {
            player.reorder_hand();
        }
    }

    pub fn record_event(&mut self, event: GameEvent) {
        self.event_log.push(event);
    }

    pub fn get_player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|player| player.id == id)
    }

    pub fn player_index(&self, id: PlayerId) -> Option<usize> {
        self.players.iter().position(|player| player.id == id)
    }

    pub fn opponent_of(&self, player_id: PlayerId) -> Option<PlayerId> {
        self.players
            .iter()
            .find(|player| player.id != player_id)
            .map(|player| player.id)
    }

    pub fn current(&self) -> Option<&Player> {
        self.get_player(self.current_player)
    }

    pub fn is_finished(&self) -> bool {
        self.phase == TurnPhase::Finished
    }

    /// 对手上一回合弃掉且仍在堆顶的牌；自己本回合的弃牌不影响它。
    pub fn opponent_discard(&self, player_id: PlayerId) -> Option<Card> {
        let opponent = self.opponent_of(player_id)?;
        self.last_discards
            .get(&opponent)
            .filter(|record| record.turn + 1 == self.turn)
            .map(|record| record.card)
            .filter(|card| self.discard_piles.top(card.color) == Some(card))
    }

    pub(crate) fn record_discard(&mut self, player_id: PlayerId, card: Card) {
        self.last_discards.insert(
            player_id,
            DiscardRecord {
                player_id,
                card,
                turn: self.turn,
            },
        );
    }

    /// 把回合交给对手；牌堆耗尽时直接结束游戏。
    pub fn end_turn(&mut self) {
        let current = self.current_player;
        self.record_event(GameEvent::TurnEnded { player_id: current });
        if self.deck.is_empty() {
            self.finish();
            return;
        }
        if let Some(next_player) = self.opponent_of(current) {
            self.current_player = next_player;
        }
        self.turn += 1;
        self.phase = TurnPhase::AwaitingAction;
        if let Some(player) = self.current() {
            info!("{}'s turn ({} cards left)", player.name, self.deck.len());
        }
    }

    pub fn scores(&self) -> BTreeMap<PlayerId, PlayerScore> {
        self.players
            .iter()
            .map(|player| {
                let sheet = player.score_sheet(self.config.bonus_threshold);
                (player.id, PlayerScore::new(&player.name, sheet))
            })
            .collect()
    }

    pub fn evaluate_outcome(&self) -> Option<GameOutcome> {
        let scores = self.scores();
        let mut ranked: Vec<(PlayerId, i32)> = scores
            .iter()
            .map(|(id, score)| (*id, score.total))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        match ranked.as_slice() {
            [] => None,
            [(player_id, score)] => Some(GameOutcome::Winner {
                player_id: *player_id,
                score: *score,
                margin: *score,
            }),
            [(leader, best), (_, second), ..] => {
                if best == second {
                    Some(GameOutcome::Tie { score: *best })
                } else {
                    Some(GameOutcome::Winner {
                        player_id: *leader,
                        score: *best,
                        margin: best - second,
                    })
                }
            }
        }
    }

    /// 结束游戏并记录结果，重复调用返回同一结果。
    pub fn finish(&mut self) -> Option<GameOutcome> {
        if self.outcome.is_some() {
            return self.outcome.clone();
        }
        self.phase = TurnPhase::Finished;
        let outcome = self.evaluate_outcome()?;
        for (_, score) in self.scores() {
            info!("{}'s score: {} {:?}", score.name, score.total, score.per_color);
        }
        match &outcome {
            GameOutcome::Winner {
                player_id, margin, ..
            } => {
                let name = self
                    .get_player(*player_id)
                    .map(|player| player.name.clone())
                    .unwrap_or_default();
                info!("Winner: {} by {} points", name, margin);
            }
            GameOutcome::Tie { score } => info!("Tie at {} points", score),
        }
        self.record_event(GameEvent::GameFinished {
            outcome: outcome.clone(),
        });
        self.outcome = Some(outcome.clone());
        Some(outcome)
    }

    pub fn integrity_check(&self) -> Result<(), IntegrityError> {
        if self.players.len() != PLAYER_COUNT {
            return Err(IntegrityError::InvalidPlayerCount {
                expected: PLAYER_COUNT,
                actual: self.players.len(),
            });
        }
        if self.get_player(self.current_player).is_none() {
            return Err(IntegrityError::InvalidPlayerIndex {
                player_id: self.current_player,
            });
        }

        let variant = self.config.variant;
        let mut allowed: BTreeMap<Card, usize> = BTreeMap::new();
        for card in variant.full_deck() {
            *allowed.entry(card).or_default() += 1;
        }

        let mut seen: BTreeMap<Card, usize> = BTreeMap::new();
        let mut total = 0;
        let in_hands_and_boards = self.players.iter().flat_map(|player| {
            player.hand.iter().chain(
                player
                    .board
                    .iter()
                    .flat_map(|(_, expedition)| expedition.cards().iter()),
            )
        });
        for card in self
            .deck
            .cards()
            .iter()
            .chain(self.discard_piles.iter())
            .chain(in_hands_and_boards)
        {
            let limit = allowed
                .get(card)
                .copied()
                .ok_or(IntegrityError::ForeignCard { card: *card })?;
            let count = seen.entry(*card).or_default();
            *count += 1;
            if *count > limit {
                return Err(IntegrityError::DuplicateCard {
                    card: *card,
                    count: *count,
                    allowed: limit,
                });
            }
            total += 1;
        }
        if total != variant.deck_size() {
            return Err(IntegrityError::CardCountMismatch {
                expected: variant.deck_size(),
                actual: total,
            });
        }

        let limit = self.config.hand_size as usize;
        for player in &self.players {
            if player.hand.len() > limit {
                return Err(IntegrityError::HandOverflow {
                    player_id: player.id,
                    size: player.hand.len(),
                    limit,
                });
            }
            if let Some((color, _)) = player
                .board
                .iter()
                .find(|(_, expedition)| !expedition.is_well_ordered())
            {
                return Err(IntegrityError::ExpeditionOutOfOrder {
                    player_id: player.id,
                    color,
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::card::ColorVariant;
    use crate::game::player::Controller;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn seated(config: GameConfig) -> GameState {
        let variant = config.variant;
        GameState::new(
            config,
            vec![
                Player::new(0, "Player1", Controller::Human, variant),
                Player::new(1, "Player2", Controller::computer(), variant),
            ],
        )
    }

    fn dealt(config: GameConfig, seed: u64) -> GameState {
        let mut state = seated(config);
        state.setup(&mut SmallRng::seed_from_u64(seed));
        state
    }

    #[test]
    fn setup_deals_eight_cards_each() {
        for variant in [ColorVariant::FiveColors, ColorVariant::SixColors] {
            let state = dealt(GameConfig::default().with_variant(variant), 3);
            let in_hands: usize = state.players.iter().map(|player| player.hand.len()).sum();
            assert_eq!(in_hands, 16);
            assert_eq!(state.deck.len(), variant.deck_size() - 16);
            assert!(state.discard_piles.is_empty());
            state.integrity_check().expect("fresh state is consistent");
        }
    }

    #[test]
    fn setup_shuffles_the_deck() {
        let state = dealt(GameConfig::default(), 11);
        let ordered = ColorVariant::FiveColors.full_deck();
        assert_ne!(state.deck.cards(), &ordered[..state.deck.len()]);
        assert_ne!(state.deck.cards(), &ordered[16..]);
    }

    #[test]
    fn integrity_check_catches_duplicates_and_lost_cards() {
        let mut state = dealt(GameConfig::default(), 5);
        let card = state.players[0]
            .hand
            .iter()
            .copied()
            .find(|card| !card.is_wager())
            .expect("numbered card in hand");
        state.players[1].hand[0] = card;
        assert!(matches!(
            state.integrity_check(),
            Err(IntegrityError::DuplicateCard { count: 2, allowed: 1, .. })
        ));

        let mut state = dealt(GameConfig::default(), 5);
        state.players[0].hand.pop();
        assert!(matches!(
            state.integrity_check(),
            Err(IntegrityError::CardCountMismatch { expected: 60, actual: 59 })
        ));

        let mut state = dealt(GameConfig::default(), 5);
        state.players[0].hand.push(Card::wager(Color::Purple));
        assert!(matches!(
            state.integrity_check(),
            Err(IntegrityError::ForeignCard { .. })
        ));
    }

    #[test]
    fn tie_is_reported_explicitly() {
        let mut state = seated(GameConfig::default());
        let outcome = state.finish().expect("two players");
        assert_eq!(outcome, GameOutcome::Tie { score: 0 });
        assert!(state.is_finished());
        assert!(matches!(
            state.event_log.last(),
            Some(GameEvent::GameFinished { .. })
        ));
        assert_eq!(state.finish(), Some(outcome));
        assert_eq!(state.event_log.len(), 1);
    }

    #[test]
    fn higher_total_wins_with_margin() {
        let mut state = seated(GameConfig::default());
        for value in [6, 7, 8, 9, 10] {
            state.players[1]
                .board
                .play(Card::new(Color::Red, value).expect("valid card"))
                .expect("ascending run");
        }
        state.players[0]
            .board
            .play(Card::new(Color::Blue, 10).expect("valid card"))
            .expect("opening card");

        let outcome = state.finish().expect("two players");
        assert_eq!(
            outcome,
            GameOutcome::Winner {
                player_id: 1,
                score: 20,
                margin: 30
            }
        );
        let scores = state.scores();
        assert_eq!(scores[&0].total, -10);
        assert_eq!(scores[&1].per_color[&Color::Red], 20);
    }

    #[test]
    fn opponent_discard_is_visible_for_one_turn() {
        let mut state = dealt(GameConfig::default(), 9);
        let card = state.players[0].hand[0];
        state.players[0].hand.remove(0);
        state.discard_piles.push(card);
        state.record_discard(0, card);
        assert_eq!(state.opponent_discard(1), None);

        state.end_turn();
        assert_eq!(state.current_player, 1);
        assert_eq!(state.opponent_discard(1), Some(card));
        assert_eq!(state.opponent_discard(0), None);

        let own = state
            .players[1]
            .hand
            .iter()
            .copied()
            .find(|held| held.color != card.color)
            .expect("a second color in hand");
        state.players[1].discard(own).expect("held card");
        state.discard_piles.push(own);
        state.record_discard(1, own);
        assert_eq!(state.opponent_discard(1), Some(card));

        state.end_turn();
        assert_eq!(state.opponent_discard(1), None);
        assert_eq!(state.opponent_discard(0), Some(own));
    }
}

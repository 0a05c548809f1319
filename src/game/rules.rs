use log::{debug, error, info, warn};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::{
    card::{Card, Color},
    config::GameConfig,
    player::{Controller, Player, PlayerId},
    state::{GameEvent, GameOutcome, GameState, IntegrityError, PlayerScore, TurnPhase},
};
use crate::ai::{heuristic, StrategyView};

/// 回合第一步：出一张牌或弃一张牌。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(tag = "type")]
pub enum Action {
    Play { card: Card },
    Discard { card: Card },
}

impl Action {
    pub fn card(&self) -> Card {
        match self {
            Action::Play { card } | Action::Discard { card } => *card,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Play { card } => write!(f, "play {card}"),
            Action::Discard { card } => write!(f, "discard {card}"),
        }
    }
}

/// 回合第二步的抽牌来源。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(tag = "type")]
pub enum DrawSource {
    Deck,
    Discard { color: Color },
}

impl fmt::Display for DrawSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrawSource::Deck => f.write_str("deck"),
            DrawSource::Discard { color } => write!(f, "discard:{color}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerSeat {
    pub name: String,
    #[serde(default)]
    pub controller: Controller,
}

impl PlayerSeat {
    pub fn human(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            controller: Controller::Human,
        }
    }

    pub fn computer(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            controller: Controller::computer(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[serde(tag = "type")]
pub enum RuleError {
    #[error("invalid card `{input}`")]
    InvalidCard { input: String },
    #[error("version should be 5 or 6 colors, not {colors}")]
    InvalidVariant { colors: u8 },
    #[error("can not play {card} because the last card is {required}")]
    CardNotPlayable { card: Card, required: Card },
    #[error("{card} is not in hand")]
    CardNotInHand { card: Card },
    #[error("no more card in the {color} discard pile, choose deck")]
    EmptyPile { color: Color },
    #[error("the deck is empty")]
    EmptyDeck,
    #[error("expected phase {expected:?}, found {actual:?}")]
    InvalidPhase {
        expected: TurnPhase,
        actual: TurnPhase,
    },
    #[error("the game is finished")]
    GameFinished,
    #[error("player {player_id} not found")]
    PlayerNotFound { player_id: PlayerId },
    #[error("player {player_id} is human and must choose a move")]
    HumanTurn { player_id: PlayerId },
    #[error("player {player_id} has no card left to play or discard")]
    EmptyHand { player_id: PlayerId },
    #[error("strategy for player {player_id} chose illegal move {action}: {cause}")]
    StrategyViolation {
        player_id: PlayerId,
        action: String,
        cause: Box<RuleError>,
    },
    #[error("state integrity violated: {error}")]
    IntegrityViolation { error: IntegrityError },
}

impl RuleError {
    /// 可以让调用方重新选择的错误；其余错误说明调用方或策略有缺陷。
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            RuleError::InvalidCard { .. }
                | RuleError::InvalidVariant { .. }
                | RuleError::StrategyViolation { .. }
                | RuleError::IntegrityViolation { .. }
        )
    }
}

/// 出牌/弃牌后的结果。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TurnOutcome {
    pub player_id: PlayerId,
    pub action: Action,
    pub phase: TurnPhase,
    pub events: Vec<GameEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleResolution {
    pub state: GameState,
    pub events: Vec<GameEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<GameOutcome>,
}

impl RuleResolution {
    pub fn new(state: GameState, events: Vec<GameEvent>) -> Self {
        let outcome = state.outcome.clone();
        Self {
            state,
            events,
            outcome,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RuleEngine;

impl RuleEngine {
    pub fn new() -> Self {
        Self
    }

    fn ensure_not_finished(state: &GameState) -> Result<(), RuleError> {
        if state.is_finished() {
            return Err(RuleError::GameFinished);
        }
        Ok(())
    }

    fn ensure_phase(state: &GameState, expected: TurnPhase) -> Result<(), RuleError> {
        if state.phase != expected {
            return Err(RuleError::InvalidPhase {
                expected,
                actual: state.phase,
            });
        }
        Ok(())
    }

    fn ensure_integrity(state: &GameState) -> Result<(), RuleError> {
        state
            .integrity_check()
            .map_err(|error| RuleError::IntegrityViolation { error })
    }

    fn current_index(state: &GameState) -> Result<usize, RuleError> {
        state
            .player_index(state.current_player)
            .ok_or(RuleError::PlayerNotFound {
                player_id: state.current_player,
            })
    }

    /// 建立一局新游戏：洗牌并发牌，`config.seed` 固定时结果可复现。
    pub fn new_game(&self, config: GameConfig, seats: [PlayerSeat; 2]) -> GameState {
        let mut rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let variant = config.variant;
        let players = seats
            .into_iter()
            .zip(0..)
            .map(|(seat, id)| Player::new(id, seat.name, seat.controller, variant))
            .collect();
        let mut state = GameState::new(config, players);
        state.setup(&mut rng);
        if let Some(player) = state.current() {
            info!(
                "New game with {} colors, {} starts",
                variant.color_count(),
                player.name
            );
        }
        state
    }

    /// 当前玩家可选的出牌与弃牌，非出牌阶段为空。
    pub fn legal_actions(&self, state: &GameState) -> BTreeSet<Action> {
        let mut actions = BTreeSet::new();
        if state.phase != TurnPhase::AwaitingAction {
            return actions;
        }
        let Some(player) = state.current() else {
            return actions;
        };
        for card in &player.hand {
            if player.board.accepts(card).is_ok() {
                actions.insert(Action::Play { card: *card });
            }
            actions.insert(Action::Discard { card: *card });
        }
        actions
    }

    pub fn legal_draws(&self, state: &GameState) -> BTreeSet<DrawSource> {
        let mut sources = BTreeSet::new();
        if state.phase != TurnPhase::AwaitingDraw {
            return sources;
        }
        if !state.deck.is_empty() {
            sources.insert(DrawSource::Deck);
        }
        for card in state.discard_piles.tops() {
            sources.insert(DrawSource::Discard { color: card.color });
        }
        sources
    }

    pub fn apply_action(
        &self,
        state: &mut GameState,
        action: Action,
    ) -> Result<TurnOutcome, RuleError> {
        Self::ensure_not_finished(state)?;
        Self::ensure_integrity(state)?;
        Self::ensure_phase(state, TurnPhase::AwaitingAction)?;

        let index = Self::current_index(state)?;
        let player_id = state.current_player;
        let event = match action {
            Action::Play { card } => {
                state.players[index].play(card)?;
                GameEvent::CardPlayed { player_id, card }
            }
            Action::Discard { card } => {
                let card = state.players[index].discard(card)?;
                state.discard_piles.push(card);
                state.record_discard(player_id, card);
                GameEvent::CardDiscarded { player_id, card }
            }
        };
        state.record_event(event.clone());
        state.phase = TurnPhase::AwaitingDraw;

        Ok(TurnOutcome {
            player_id,
            action,
            phase: state.phase,
            events: vec![event],
        })
    }

    /// 抽一张牌并结束回合。牌堆为空时游戏结束并返回 `EmptyDeck`。
    pub fn draw(
        &self,
        state: &mut GameState,
        source: DrawSource,
    ) -> Result<Vec<GameEvent>, RuleError> {
        Self::ensure_not_finished(state)?;
        Self::ensure_integrity(state)?;
        Self::ensure_phase(state, TurnPhase::AwaitingDraw)?;

        let index = Self::current_index(state)?;
        let player_id = state.current_player;
        let card = match source {
            DrawSource::Deck => match state.deck.draw() {
                Some(card) => card,
                None => {
                    state.finish();
                    return Err(RuleError::EmptyDeck);
                }
            },
            DrawSource::Discard { color } => state.discard_piles.take(color)?,
        };

        let player = &mut state.players[index];
        player.draw(card);
        player.reorder_hand();
        debug!("{} draws {} from {}", player.name, card, source);

        let drawn = GameEvent::CardDrawn {
            player_id,
            card,
            source,
        };
        state.record_event(drawn.clone());
        let log_start = state.event_log.len();
        state.end_turn();

        let mut events = vec![drawn];
        events.extend(state.event_log[log_start..].iter().cloned());
        Ok(events)
    }

    /// 从弃牌堆抽不到时改为从牌堆抽。
    pub fn draw_with_fallback(
        &self,
        state: &mut GameState,
        source: DrawSource,
    ) -> Result<Vec<GameEvent>, RuleError> {
        match self.draw(state, source) {
            Err(error @ RuleError::EmptyPile { .. }) => {
                warn!("{error}, drawing from the deck instead");
                let fallback = GameEvent::DrawFallback {
                    player_id: state.current_player,
                    requested: source,
                };
                state.record_event(fallback.clone());
                let mut events = vec![fallback];
                events.extend(self.draw(state, DrawSource::Deck)?);
                Ok(events)
            }
            other => other,
        }
    }

    pub fn is_finished(&self, state: &GameState) -> bool {
        state.is_finished()
    }

    pub fn scores(&self, state: &GameState) -> BTreeMap<PlayerId, PlayerScore> {
        state.scores()
    }

    pub fn outcome(&self, state: &GameState) -> Option<GameOutcome> {
        state.outcome.clone()
    }

    /// 由内置策略替当前电脑玩家完成剩余的回合步骤。
    pub fn play_computer_turn(&self, state: &mut GameState) -> Result<Vec<GameEvent>, RuleError> {
        Self::ensure_not_finished(state)?;
        let player_id = state.current_player;
        let config = match state.current().map(|player| &player.controller) {
            Some(Controller::Computer { config }) => config.clone(),
            Some(Controller::Human) => return Err(RuleError::HumanTurn { player_id }),
            None => return Err(RuleError::PlayerNotFound { player_id }),
        };

        let mut events = Vec::new();
        if state.phase == TurnPhase::AwaitingAction {
            let view = StrategyView::for_player(state, player_id)?;
            let decision = heuristic::choose_action(&view, &config)
                .ok_or(RuleError::EmptyHand { player_id })?;
            debug!("{} chooses to {} ({:?})", view.name, decision.action, decision.rule);
            let outcome = self
                .apply_action(state, decision.action)
                .map_err(|cause| Self::strategy_violation(player_id, decision.action, cause))?;
            events.extend(outcome.events);
        }

        if state.phase == TurnPhase::AwaitingDraw {
            let view = StrategyView::for_player(state, player_id)?;
            let source = heuristic::choose_pile(&view, &config);
            events.extend(self.draw_with_fallback(state, source)?);
        }

        Ok(events)
    }

    fn strategy_violation(player_id: PlayerId, action: Action, cause: RuleError) -> RuleError {
        error!("strategy for player {player_id} proposed illegal action {action}: {cause}");
        RuleError::StrategyViolation {
            player_id,
            action: action.to_string(),
            cause: Box::new(cause),
        }
    }

    /// 电脑对电脑时一直打到结束；轮到人类时返回 `HumanTurn`。
    pub fn play_out(&self, state: &mut GameState) -> Result<GameOutcome, RuleError> {
        while !state.is_finished() {
            self.play_computer_turn(state)?;
        }
        state.finish().ok_or(RuleError::PlayerNotFound {
            player_id: state.current_player,
        })
    }
}

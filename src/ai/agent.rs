use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::heuristic::{self, DecisionRule, StrategyView};
use crate::game::{Action, DrawSource, GameState, PlayerId, RuleError, TurnPhase};

/// 电脑下一步要做的事：回合第一步或抽牌。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameAction {
    Act { action: Action },
    Draw { source: DrawSource },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AiDifficulty {
    Cautious,
    Normal,
    Bold,
}

impl FromStr for AiDifficulty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cautious" | "easy" => Ok(AiDifficulty::Cautious),
            "normal" | "medium" => Ok(AiDifficulty::Normal),
            "bold" | "hard" => Ok(AiDifficulty::Bold),
            _ => Err(()),
        }
    }
}

/// 启发式策略的阈值。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AiConfig {
    /// 手里同色牌达到该数量才押注开局。
    pub wager_min_cards: usize,
    /// 或者同色数字牌点数之和达到该值。
    pub wager_min_sum: u32,
    /// 某色低于顶牌的牌达到该数量时弃掉最小的一张。
    pub stranded_min: usize,
    /// 拿对手弃掉的押注牌所需的同色手牌数。
    pub take_wager_min_cards: usize,
    /// 对手弃掉未开局颜色的牌，点数不低于该值就拿走。
    pub deny_min_rank: u8,
}

impl AiConfig {
    pub fn from_difficulty(difficulty: AiDifficulty) -> Self {
        match difficulty {
            AiDifficulty::Cautious => Self {
                wager_min_cards: 5,
                wager_min_sum: 14,
                stranded_min: 2,
                take_wager_min_cards: 3,
                deny_min_rank: 6,
            },
            AiDifficulty::Normal => Self {
                wager_min_cards: 4,
                wager_min_sum: 10,
                stranded_min: 3,
                take_wager_min_cards: 2,
                deny_min_rank: 4,
            },
            AiDifficulty::Bold => Self {
                wager_min_cards: 3,
                wager_min_sum: 8,
                stranded_min: 4,
                take_wager_min_cards: 1,
                deny_min_rank: 3,
            },
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        AiConfig::from_difficulty(AiDifficulty::Normal)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AiDecision {
    pub player_id: PlayerId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<GameAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<DecisionRule>,
}

impl AiDecision {
    fn idle(player_id: PlayerId) -> Self {
        Self {
            player_id,
            action: None,
            rule: None,
        }
    }
}

/// 只读地给出下一步建议，不修改局面。
pub struct AiAgent {
    config: AiConfig,
}

impl AiAgent {
    pub fn new(config: AiConfig) -> Self {
        Self { config }
    }

    /// 不是该玩家的回合或对局已结束时返回空决定。
    pub fn decide_action(
        &self,
        state: &GameState,
        player_id: PlayerId,
    ) -> Result<AiDecision, RuleError> {
        let view = StrategyView::for_player(state, player_id)?;
        if state.is_finished() || state.current_player != player_id {
            return Ok(AiDecision::idle(player_id));
        }

        let decision = match state.phase {
            TurnPhase::AwaitingAction => match heuristic::choose_action(&view, &self.config) {
                Some(choice) => AiDecision {
                    player_id,
                    action: Some(GameAction::Act {
                        action: choice.action,
                    }),
                    rule: Some(choice.rule),
                },
                None => AiDecision::idle(player_id),
            },
            TurnPhase::AwaitingDraw => {
                let source = heuristic::choose_pile(&view, &self.config);
                let rule = match source {
                    DrawSource::Deck => DecisionRule::DrawFromDeck,
                    DrawSource::Discard { .. } => DecisionRule::TakeDiscard,
                };
                AiDecision {
                    player_id,
                    action: Some(GameAction::Draw { source }),
                    rule: Some(rule),
                }
            }
            TurnPhase::Finished => AiDecision::idle(player_id),
        };
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{GameConfig, PlayerSeat, RuleEngine};

    fn game() -> GameState {
        RuleEngine::new().new_game(
            GameConfig::default().with_seed(11),
            [PlayerSeat::human("Player1"), PlayerSeat::computer("Computer")],
        )
    }

    #[test]
    fn difficulty_parses_aliases() {
        assert_eq!("HARD".parse::<AiDifficulty>(), Ok(AiDifficulty::Bold));
        assert_eq!("easy".parse::<AiDifficulty>(), Ok(AiDifficulty::Cautious));
        assert_eq!("medium".parse::<AiDifficulty>(), Ok(AiDifficulty::Normal));
        assert!("expert".parse::<AiDifficulty>().is_err());
    }

    #[test]
    fn default_config_uses_normal_thresholds() {
        let config = AiConfig::default();
        assert_eq!(config.wager_min_cards, 4);
        assert_eq!(config.wager_min_sum, 10);
        assert_eq!(config.stranded_min, 3);
        assert_eq!(config.take_wager_min_cards, 2);
        assert_eq!(config.deny_min_rank, 4);

        let partial: AiConfig =
            serde_json::from_str(r#"{"deny_min_rank":7}"#).expect("partial config");
        assert_eq!(partial.deny_min_rank, 7);
        assert_eq!(partial.wager_min_cards, 4);
    }

    #[test]
    fn suggests_a_legal_move_for_each_phase() {
        let engine = RuleEngine::new();
        let mut state = game();
        let agent = AiAgent::new(AiConfig::default());

        let decision = agent.decide_action(&state, 0).expect("known player");
        let Some(GameAction::Act { action }) = decision.action else {
            panic!("expected an action, got {decision:?}");
        };
        assert!(engine.legal_actions(&state).contains(&action));
        engine.apply_action(&mut state, action).expect("suggested move is legal");

        let decision = agent.decide_action(&state, 0).expect("known player");
        let Some(GameAction::Draw { source }) = decision.action else {
            panic!("expected a draw, got {decision:?}");
        };
        assert!(engine.legal_draws(&state).contains(&source));
    }

    #[test]
    fn idle_when_not_on_turn() {
        let state = game();
        let agent = AiAgent::new(AiConfig::default());
        let decision = agent.decide_action(&state, 1).expect("known player");
        assert_eq!(decision, AiDecision::idle(1));
        assert!(matches!(
            agent.decide_action(&state, 7),
            Err(RuleError::PlayerNotFound { player_id: 7 })
        ));
    }
}

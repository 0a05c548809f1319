//! 电脑玩家：基于规则优先级的启发式策略。

pub mod agent;
pub mod heuristic;

pub use agent::{AiAgent, AiConfig, AiDecision, AiDifficulty, GameAction};
pub use heuristic::{ActionChoice, DecisionRule, StrategyView};

//! 游戏核心逻辑模块（牌、牌堆、探险、状态机、规则引擎等）。

pub mod card;
pub mod config;
pub mod expedition;
pub mod piles;
pub mod player;
pub mod rules;
pub mod state;

pub use card::{Card, Color, ColorVariant, Rank};
pub use config::GameConfig;
pub use expedition::{score_cards, Board, Expedition, ScoreSheet};
pub use piles::{Deck, DiscardPiles};
pub use player::{Controller, Player, PlayerId};
pub use rules::{
    Action,
    DrawSource,
    PlayerSeat,
    RuleEngine,
    RuleError,
    RuleResolution,
    TurnOutcome,
};
pub use state::{
    DiscardRecord,
    GameEvent,
    GameOutcome,
    GameState,
    IntegrityError,
    PlayerScore,
    TurnPhase,
};

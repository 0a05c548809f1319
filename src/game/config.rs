use serde::{Deserialize, Serialize};

use super::card::ColorVariant;
use super::expedition::DEFAULT_BONUS_THRESHOLD;
use crate::ai::AiConfig;

pub const DEFAULT_HAND_SIZE: u8 = 8;

/// 一局游戏的配置，所有字段均可省略。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    pub variant: ColorVariant,
    pub hand_size: u8,
    pub bonus_threshold: usize,
    /// 固定种子用于复现洗牌结果；`None` 时使用系统熵。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// 电脑玩家未单独配置时使用的参数。
    pub ai: AiConfig,
}

impl GameConfig {
    pub fn with_variant(mut self, variant: ColorVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            variant: ColorVariant::default(),
            hand_size: DEFAULT_HAND_SIZE,
            bonus_threshold: DEFAULT_BONUS_THRESHOLD,
            seed: None,
            ai: AiConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: GameConfig =
            serde_json::from_str(r#"{"variant":6,"seed":42}"#).expect("config should parse");
        assert_eq!(config.variant, ColorVariant::SixColors);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.hand_size, DEFAULT_HAND_SIZE);
        assert_eq!(config.bonus_threshold, DEFAULT_BONUS_THRESHOLD);
        assert_eq!(config.ai, AiConfig::default());
    }

    #[test]
    fn unsupported_variant_is_rejected() {
        assert!(serde_json::from_str::<GameConfig>(r#"{"variant":4}"#).is_err());
    }
}

pub mod ai;
pub mod game;

use gloo_timers::future::TimeoutFuture;
use log::{Level, LevelFilter, Log, Metadata, Record};
use serde_wasm_bindgen::{from_value, to_value};
use std::str::FromStr;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::Promise;

pub use ai::{AiAgent, AiConfig, AiDecision, AiDifficulty, GameAction};
pub use game::{
    score_cards, Action, Card, Color, ColorVariant, Controller, DrawSource, GameConfig, GameEvent,
    GameOutcome, GameState, IntegrityError, Player, PlayerId, PlayerSeat, RuleEngine, RuleError,
    RuleResolution, TurnPhase,
};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// 把 `log` 记录转发到浏览器控制台。
struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            Level::Error => web_sys::console::error_1(&message),
            Level::Warn => web_sys::console::warn_1(&message),
            Level::Info => web_sys::console::info_1(&message),
            Level::Debug | Level::Trace => web_sys::console::debug_1(&message),
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

#[wasm_bindgen(start)]
pub fn start() {
    set_panic_hook();
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Info);
    }
}

/// 调整控制台日志级别，例如 `"debug"` 可以看到电脑的决策过程。
#[wasm_bindgen(js_name = "setLogLevel")]
pub fn set_log_level(level: &str) -> Result<(), JsValue> {
    let filter = LevelFilter::from_str(level).map_err(serde_to_js_error)?;
    log::set_max_level(filter);
    Ok(())
}

fn to_js_error(error: RuleError) -> JsValue {
    to_value(&error).unwrap_or_else(|serialize_err| JsValue::from_str(&serialize_err.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn make_resolution_json(state: &GameState, events: Vec<GameEvent>) -> Result<String, JsValue> {
    serde_json::to_string(&RuleResolution::new(state.clone(), events)).map_err(serde_to_js_error)
}

/// 当前玩家若是电脑就用它自己的参数，否则用对局的默认参数。
fn computer_config(state: &GameState) -> AiConfig {
    match state.current().map(|player| &player.controller) {
        Some(Controller::Computer { config }) => config.clone(),
        _ => state.config.ai.clone(),
    }
}

#[wasm_bindgen]
pub struct GameEngine {
    state: GameState,
    rules: RuleEngine,
}

#[wasm_bindgen]
impl GameEngine {
    /// 新开一局：第一位玩家总是人类，第二位默认由电脑控制。
    #[wasm_bindgen(constructor)]
    pub fn new(
        player_name: String,
        opponent_name: String,
        computer_opponent: Option<bool>,
        config_json: Option<String>,
    ) -> Result<GameEngine, JsValue> {
        let config: GameConfig = match config_json {
            Some(json) => serde_json::from_str(&json).map_err(serde_to_js_error)?,
            None => GameConfig::default(),
        };
        let opponent = if computer_opponent.unwrap_or(true) {
            PlayerSeat {
                name: opponent_name,
                controller: Controller::Computer {
                    config: config.ai.clone(),
                },
            }
        } else {
            PlayerSeat::human(opponent_name)
        };
        let rules = RuleEngine::new();
        let state = rules.new_game(config, [PlayerSeat::human(player_name), opponent]);
        Ok(GameEngine { state, rules })
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.state).map_err(serde_to_js_error)
    }

    /// 载入保存的对局，完整性检查失败时保持原状态。
    pub fn set_state_json(&mut self, json: &str) -> Result<(), JsValue> {
        let state: GameState = serde_json::from_str(json).map_err(serde_to_js_error)?;
        state
            .integrity_check()
            .map_err(|error| to_js_error(RuleError::IntegrityViolation { error }))?;
        self.state = state;
        Ok(())
    }

    pub fn current_player(&self) -> PlayerId {
        self.state.current_player
    }

    pub fn legal_actions_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.rules.legal_actions(&self.state)).map_err(serde_to_js_error)
    }

    pub fn legal_draws_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.rules.legal_draws(&self.state)).map_err(serde_to_js_error)
    }

    /// 接受 `{"type":"Play","card":{...}}` 或 `{"type":"Discard",...}`。
    pub fn apply_action_json(&mut self, action_json: &str) -> Result<String, JsValue> {
        let action: Action = serde_json::from_str(action_json).map_err(serde_to_js_error)?;
        let outcome = self
            .rules
            .apply_action(&mut self.state, action)
            .map_err(to_js_error)?;
        make_resolution_json(&self.state, outcome.events)
    }

    /// 指定的弃牌堆为空时改从牌堆抽，事件里会带上 `DrawFallback`。
    pub fn draw_json(&mut self, source_json: &str) -> Result<String, JsValue> {
        let source: DrawSource = serde_json::from_str(source_json).map_err(serde_to_js_error)?;
        let events = self
            .rules
            .draw_with_fallback(&mut self.state, source)
            .map_err(to_js_error)?;
        make_resolution_json(&self.state, events)
    }

    pub fn play_computer_turn(&mut self) -> Result<String, JsValue> {
        let events = self
            .rules
            .play_computer_turn(&mut self.state)
            .map_err(to_js_error)?;
        make_resolution_json(&self.state, events)
    }

    pub fn is_finished(&self) -> bool {
        self.rules.is_finished(&self.state)
    }

    pub fn scores_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.rules.scores(&self.state)).map_err(serde_to_js_error)
    }

    pub fn outcome_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.rules.outcome(&self.state)).map_err(serde_to_js_error)
    }

    /// 给当前玩家一个建议；`difficulty` 省略时使用该玩家自己的参数。
    pub fn suggest_move_json(&self, difficulty: Option<String>) -> Result<String, JsValue> {
        let config = difficulty
            .as_deref()
            .and_then(|value| AiDifficulty::from_str(value).ok())
            .map(AiConfig::from_difficulty)
            .unwrap_or_else(|| computer_config(&self.state));
        let decision = AiAgent::new(config)
            .decide_action(&self.state, self.state.current_player)
            .map_err(to_js_error)?;
        serde_json::to_string(&decision).map_err(serde_to_js_error)
    }

    /// 延迟后在状态副本上计算电脑的下一步，不修改当前对局。
    pub fn think_computer(&self, delay_ms: Option<u32>) -> Promise {
        let state = self.state.clone();
        let delay = delay_ms.unwrap_or(0);

        future_to_promise(async move {
            if delay > 0 {
                TimeoutFuture::new(delay).await;
            }
            let agent = AiAgent::new(computer_config(&state));
            let decision = agent
                .decide_action(&state, state.current_player)
                .map_err(to_js_error)?;
            let json = serde_json::to_string(&decision).map_err(serde_to_js_error)?;
            Ok(JsValue::from_str(&json))
        })
    }
}

/// 计算一条探险的得分，牌以 `"7:Red"`、`"W:Red"` 的文本形式给出。
#[wasm_bindgen(js_name = "scoreExpedition")]
pub fn score_expedition(cards: Vec<String>, bonus_threshold: Option<usize>) -> Result<i32, JsValue> {
    let cards = cards
        .iter()
        .map(|text| Card::from_str(text))
        .collect::<Result<Vec<Card>, RuleError>>()
        .map_err(to_js_error)?;
    let threshold = bonus_threshold.unwrap_or(GameConfig::default().bonus_threshold);
    Ok(score_cards(&cards, threshold))
}

#[wasm_bindgen(js_name = "validateState")]
pub fn validate_state(state: JsValue) -> Result<(), JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    state
        .integrity_check()
        .map_err(|error| to_js_error(RuleError::IntegrityViolation { error }))?;
    Ok(())
}

#[cfg(feature = "console_error_panic_hook")]
fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
fn set_panic_hook() {}

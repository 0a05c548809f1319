//! 浏览器环境下的接口测试，使用 `wasm-pack test --headless --chrome` 运行。
#![cfg(target_arch = "wasm32")]

use lost_cities::{
    score_expedition, Action, Color, DrawSource, GameEngine, GameEvent, GameState, RuleResolution,
};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn engine(computer_opponent: bool) -> GameEngine {
    GameEngine::new(
        "Player1".to_string(),
        "Computer".to_string(),
        Some(computer_opponent),
        Some(r#"{"seed":7}"#.to_string()),
    )
    .expect("engine should start")
}

#[wasm_bindgen_test]
fn scores_text_cards() {
    let cards = ["W:Red", "3:Red", "4:Red", "6:Red", "10:Red"]
        .iter()
        .map(|text| text.to_string())
        .collect();
    assert_eq!(score_expedition(cards, None).expect("valid cards"), 6);
    assert!(score_expedition(vec!["1:Red".to_string()], None).is_err());
}

#[wasm_bindgen_test]
fn human_turn_round_trips_through_json() {
    let mut engine = engine(true);
    let actions: Vec<Action> =
        serde_json::from_str(&engine.legal_actions_json().expect("actions")).expect("json");
    let discard = actions
        .iter()
        .find(|action| matches!(action, Action::Discard { .. }))
        .expect("a discard is always legal");
    engine
        .apply_action_json(&serde_json::to_string(discard).expect("json"))
        .expect("legal action");

    let draws: Vec<DrawSource> =
        serde_json::from_str(&engine.legal_draws_json().expect("draws")).expect("json");
    assert_eq!(
        draws,
        vec![DrawSource::Deck, DrawSource::Discard { color: discard.card().color }]
    );
    engine
        .draw_json(r#"{"type":"Deck"}"#)
        .expect("deck draw");
    assert_eq!(engine.current_player(), 1);

    engine.play_computer_turn().expect("computer turn");
    assert_eq!(engine.current_player(), 0);
}

#[wasm_bindgen_test]
fn rejected_moves_keep_the_state() {
    let mut engine = engine(false);
    let before = engine.state_json().expect("state");
    assert!(engine.draw_json(r#"{"type":"Deck"}"#).is_err());
    assert!(engine.play_computer_turn().is_err());
    assert_eq!(engine.state_json().expect("state"), before);

    let state: GameState = serde_json::from_str(&before).expect("state json");
    assert!(state.integrity_check().is_ok());
    assert!(!engine.is_finished());
    assert_eq!(engine.outcome_json().expect("outcome"), "null");
}

#[wasm_bindgen_test]
fn empty_pile_draw_falls_back_to_the_deck() {
    let mut engine = engine(false);
    let actions: Vec<Action> =
        serde_json::from_str(&engine.legal_actions_json().expect("actions")).expect("json");
    let discard = actions
        .iter()
        .find(|action| matches!(action, Action::Discard { .. }))
        .expect("a discard is always legal");
    engine
        .apply_action_json(&serde_json::to_string(discard).expect("json"))
        .expect("legal action");

    let empty = Color::ALL
        .iter()
        .copied()
        .find(|color| *color != discard.card().color)
        .expect("another color");
    let source = serde_json::to_string(&DrawSource::Discard { color: empty }).expect("json");
    let resolution: RuleResolution =
        serde_json::from_str(&engine.draw_json(&source).expect("falls back")).expect("json");
    assert!(matches!(
        resolution.events[0],
        GameEvent::DrawFallback { player_id: 0, .. }
    ));
    assert!(resolution.events.iter().any(|event| matches!(
        event,
        GameEvent::CardDrawn {
            source: DrawSource::Deck,
            ..
        }
    )));
    assert_eq!(engine.current_player(), 1);
}

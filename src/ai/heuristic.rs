//! 电脑玩家的贪心规则：按优先级逐条匹配，第一条命中的规则给出动作。

use log::debug;
use serde::{Deserialize, Serialize};

use super::AiConfig;
use crate::game::{
    Action, Board, Card, Color, DrawSource, GameState, PlayerId, RuleError,
};

/// 策略能看到的信息：自己的手牌与探险、对手上一手弃掉的牌。
#[derive(Debug, Clone)]
pub struct StrategyView<'a> {
    pub player_id: PlayerId,
    pub name: &'a str,
    pub hand: &'a [Card],
    pub board: &'a Board,
    /// 对手上一回合弃掉且仍在堆顶的牌；对手上一手不是弃牌时为 `None`。
    pub opponent_discard: Option<Card>,
}

impl<'a> StrategyView<'a> {
    pub fn for_player(state: &'a GameState, player_id: PlayerId) -> Result<Self, RuleError> {
        let player = state
            .get_player(player_id)
            .ok_or(RuleError::PlayerNotFound { player_id })?;
        Ok(Self {
            player_id,
            name: &player.name,
            hand: &player.hand,
            board: &player.board,
            opponent_discard: state.opponent_discard(player_id),
        })
    }

    fn cards_of(&self, color: Color) -> impl Iterator<Item = &'a Card> + '_ {
        self.hand.iter().filter(move |card| card.color == color)
    }

    fn holds(&self, card: &Card) -> bool {
        self.hand.contains(card)
    }
}

/// 命中的规则，便于日志与前端展示。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DecisionRule {
    OpenWithWager,
    Successor,
    DiscardStranded,
    ClosestPlayable,
    LastResortDiscard,
    TakeDiscard,
    DrawFromDeck,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionChoice {
    pub action: Action,
    pub rule: DecisionRule,
}

impl ActionChoice {
    fn play(card: Card, rule: DecisionRule) -> Self {
        Self {
            action: Action::Play { card },
            rule,
        }
    }

    fn discard(card: Card, rule: DecisionRule) -> Self {
        Self {
            action: Action::Discard { card },
            rule,
        }
    }
}

/// 手牌为空时没有可选动作。
pub fn choose_action(view: &StrategyView<'_>, config: &AiConfig) -> Option<ActionChoice> {
    let choice = open_with_wager(view, config)
        .or_else(|| play_successor(view))
        .or_else(|| discard_stranded(view, config))
        .or_else(|| closest_playable(view))?;
    debug!(
        "{}: {:?} -> {}",
        view.name, choice.rule, choice.action
    );
    Some(choice)
}

fn open_with_wager(view: &StrategyView<'_>, config: &AiConfig) -> Option<ActionChoice> {
    view.board
        .colors()
        .filter(|&color| !view.board.is_started(color))
        .find(|&color| {
            let wager = Card::wager(color);
            if !view.holds(&wager) {
                return false;
            }
            let count = view.cards_of(color).count();
            let sum: u32 = view.cards_of(color).map(|card| card.value() as u32).sum();
            count >= config.wager_min_cards || sum >= config.wager_min_sum
        })
        .map(|color| ActionChoice::play(Card::wager(color), DecisionRule::OpenWithWager))
}

fn play_successor(view: &StrategyView<'_>) -> Option<ActionChoice> {
    for gap in 1..=2u8 {
        for (color, expedition) in view.board.iter() {
            if !expedition.is_started() {
                continue;
            }
            let target = expedition.top_value() + gap;
            if let Some(card) = view
                .cards_of(color)
                .find(|card| !card.is_wager() && card.value() == target)
            {
                return Some(ActionChoice::play(*card, DecisionRule::Successor));
            }
        }
    }
    None
}

fn discard_stranded(view: &StrategyView<'_>, config: &AiConfig) -> Option<ActionChoice> {
    view.board.iter().find_map(|(color, expedition)| {
        let top = expedition.top()?;
        let stranded: Vec<&Card> = view
            .cards_of(color)
            .filter(|card| card.rank < top.rank)
            .collect();
        if stranded.len() < config.stranded_min {
            return None;
        }
        stranded
            .into_iter()
            .min()
            .map(|card| ActionChoice::discard(*card, DecisionRule::DiscardStranded))
    })
}

fn closest_playable(view: &StrategyView<'_>) -> Option<ActionChoice> {
    let closest = view
        .hand
        .iter()
        .filter(|card| view.board.accepts(card).is_ok())
        .min_by_key(|card| {
            let top = view
                .board
                .expedition(card.color)
                .map(|expedition| expedition.top_value())
                .unwrap_or(0);
            (card.value() - top, **card)
        });
    match closest {
        Some(card) => Some(ActionChoice::play(*card, DecisionRule::ClosestPlayable)),
        None => view
            .hand
            .first()
            .map(|card| ActionChoice::discard(*card, DecisionRule::LastResortDiscard)),
    }
}

/// 决定从牌堆还是对手刚弃的那一堆抽牌。
pub fn choose_pile(view: &StrategyView<'_>, config: &AiConfig) -> DrawSource {
    let Some(card) = view.opponent_discard else {
        return DrawSource::Deck;
    };
    let started = view.board.is_started(card.color);
    let wanted = if card.is_wager() {
        !started && view.cards_of(card.color).count() >= config.take_wager_min_cards
    } else if !started {
        card.value() >= config.deny_min_rank
    } else {
        view.board
            .top(card.color)
            .is_some_and(|top| card.rank > top.rank)
    };

    if wanted {
        debug!("{}: {:?} {}", view.name, DecisionRule::TakeDiscard, card);
        DrawSource::Discard { color: card.color }
    } else {
        DrawSource::Deck
    }
}

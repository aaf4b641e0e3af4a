use crate::card::Card;
use crate::meld::MeldKind;
use crate::player::PlayerId;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DrawSource {
    #[strum(serialize = "stock")]
    Stock,
    #[strum(serialize = "discard")]
    Discard,
}

/// One line of a hand's score settlement.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HandScore {
    pub player: PlayerId,
    /// Points added this hand (0 for the closer).
    pub delta: u32,
    /// Cumulative score after the hand.
    pub total: u32,
}

/// Structured log entries emitted by committed actions. Fixed field
/// sets per kind; the wire names are the snake_case tags.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum GameEvent {
    HandStart {
        hand_number: u32,
        dealer: PlayerId,
        starter: PlayerId,
    },
    Draw {
        player: PlayerId,
        source: DrawSource,
        stock_remaining: usize,
    },
    Reshuffle {
        /// Cards moved from under the discard top back into the stock.
        recycled: usize,
    },
    Open {
        player: PlayerId,
        points: u32,
        melds: usize,
    },
    LayMeld {
        player: PlayerId,
        kind: MeldKind,
        cards: Vec<Card>,
    },
    Attach {
        player: PlayerId,
        card: Card,
        meld: usize,
    },
    SubstituteJoker {
        player: PlayerId,
        card: Card,
        meld: usize,
    },
    Discard {
        player: PlayerId,
        card: Card,
    },
    Closure {
        player: PlayerId,
        close_in_hand: bool,
    },
    Elimination {
        player: PlayerId,
        score: u32,
    },
    HandEnd {
        hand_number: u32,
        closer: PlayerId,
        scores: Vec<HandScore>,
    },
    MatchEnd {
        winner: PlayerId,
    },
    InvalidAction {
        player: PlayerId,
        kind: String,
    },
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::HandStart {
                hand_number,
                dealer,
                starter,
            } => write!(f, "hand {hand_number} dealt by {dealer}, {starter} to act"),
            Self::Draw {
                player,
                source,
                stock_remaining,
            } => write!(f, "{player} draws from {source} ({stock_remaining} left in stock)"),
            Self::Reshuffle { recycled } => {
                write!(f, "stock rebuilt from {recycled} discarded cards")
            }
            Self::Open { player, points, melds } => {
                write!(f, "{player} opens with {melds} melds worth {points}")
            }
            Self::LayMeld { player, kind, cards } => {
                write!(f, "{player} lays a {kind} of {} cards", cards.len())
            }
            Self::Attach { player, card, meld } => {
                write!(f, "{player} attaches {card} to meld {meld}")
            }
            Self::SubstituteJoker { player, card, meld } => {
                write!(f, "{player} swaps {card} for the joker in meld {meld}")
            }
            Self::Discard { player, card } => write!(f, "{player} discards {card}"),
            Self::Closure { player, close_in_hand } => match close_in_hand {
                true => write!(f, "{player} closes in hand"),
                false => write!(f, "{player} closes"),
            },
            Self::Elimination { player, score } => {
                write!(f, "{player} is eliminated at {score}")
            }
            Self::HandEnd { hand_number, closer, .. } => {
                write!(f, "hand {hand_number} ends, closed by {closer}")
            }
            Self::MatchEnd { winner } => write!(f, "match over, {winner} wins"),
            Self::InvalidAction { player, kind } => {
                write!(f, "rejected action by {player}: {kind}")
            }
        }
    }
}

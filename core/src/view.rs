//! Projections of a game for the two audiences: everyone at the table,
//! and the single requesting player.

use crate::card::Card;
use crate::game::{Game, GameId, MatchStatus};
use crate::meld::Meld;
use crate::player::PlayerId;
use crate::turn::TurnPhase;

/// What every player may know about a seat.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SeatView {
    pub id: PlayerId,
    pub hand_size: usize,
    pub has_opened: bool,
    pub score: u32,
    pub is_eliminated: bool,
}

/// The table as all players see it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PublicView {
    pub game_id: GameId,
    pub players: Vec<SeatView>,
    pub discard_top: Option<Card>,
    pub stock_size: usize,
    pub melds: Vec<Meld>,
    pub current: PlayerId,
    pub phase: TurnPhase,
    pub dealer: PlayerId,
    pub hand_number: u32,
    pub round_number: u32,
    pub first_round_complete: bool,
    pub status: MatchStatus,
    pub winner: Option<PlayerId>,
}

impl PublicView {
    pub fn of(game: &Game) -> Self {
        Self {
            game_id: game.id,
            players: game
                .players
                .iter()
                .map(|p| SeatView {
                    id: p.id.clone(),
                    hand_size: p.hand.len(),
                    has_opened: p.has_opened,
                    score: p.score,
                    is_eliminated: p.is_eliminated,
                })
                .collect(),
            discard_top: game.discard.last().copied(),
            stock_size: game.stock.len(),
            melds: game.melds.clone(),
            current: game.current.clone(),
            phase: game.phase,
            dealer: game.dealer.clone(),
            hand_number: game.hand_number,
            round_number: game.round_number,
            first_round_complete: game.first_round_complete,
            status: game.status,
            winner: game.winner.clone(),
        }
    }
}

/// What only the requesting player sees: their hand, in their kept
/// order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PrivateView {
    pub hand: Vec<Card>,
}

impl PrivateView {
    pub fn of(game: &Game, player: &PlayerId) -> Self {
        Self {
            hand: game
                .player(player)
                .map(|p| p.hand.clone())
                .unwrap_or_default(),
        }
    }
}

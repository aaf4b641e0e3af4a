use crate::card::Card;

/// States of the per-turn state machine.
///
/// `AwaitDiscard` and `TurnEnd` are transient: a committed document is
/// always waiting on a draw or on plays, because the discard action
/// carries the turn through both transient states in one mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TurnPhase {
    #[strum(serialize = "await_draw")]
    AwaitDraw,
    #[strum(serialize = "await_play")]
    AwaitPlay,
    #[strum(serialize = "await_discard")]
    AwaitDiscard,
    #[strum(serialize = "turn_end")]
    TurnEnd,
}

/// Per-turn bookkeeping, cleared on turn end. "Must be used this turn"
/// obligations live here rather than on the cards themselves.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TurnScratch {
    /// Card taken from the discard pile this turn, if any. It must
    /// leave the hand through a play before the turn can end, and it
    /// cannot itself be discarded without a declared duplicate.
    pub picked_from_discard: Option<Card>,
    /// Joker withdrawn from a table meld this turn. The turn cannot
    /// end while it is unresolved.
    pub pending_joker: Option<Card>,
    /// Whether `has_opened` flipped during this turn.
    pub opened_this_turn: bool,
    /// Whether any lay/attach followed the opening within this turn.
    /// Distinguishes a whole-hand opening from a piecemeal one for the
    /// close-in-hand variant.
    pub played_after_open: bool,
}

impl TurnScratch {
    pub fn clear(&mut self) {
        *self = TurnScratch::default();
    }

    /// True when nothing this turn still blocks the turn from ending.
    pub fn obligations_settled(&self) -> bool {
        self.pending_joker.is_none()
    }
}

//! Structural invariants over a whole game state. Pure observer:
//! returns the violations it finds and changes nothing. Tests and the
//! simulation driver run it after every mutation; production gates it
//! behind `Config::check_integrity`.

use crate::card::Card;
use crate::deck::{CANONICAL, DECK_SIZE};
use crate::error::MeldCode;
use crate::game::{Game, MatchStatus};
use crate::meld;
use crate::turn::TurnPhase;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    /// Total card count across hands, melds, stock, discard and the
    /// pending-joker slot differs from 108.
    CardCount { found: usize },
    /// The multiset of cards differs from the canonical double deck.
    MultisetMismatch,
    /// A table meld no longer validates, or its stored kind disagrees
    /// with what its cards make.
    InvalidMeld { index: usize, code: MeldCode },
    /// The current player id does not name a seat.
    NoCurrentPlayer,
    /// The current player is eliminated.
    CurrentEliminated,
    /// A committed document can only be waiting on a draw or on plays.
    TransientPhase { phase: TurnPhase },
    /// Scratch state that presupposes a draw exists before any draw
    /// happened this turn.
    ScratchBeforeDraw,
    /// The match is finished but carries no winner (or vice versa).
    WinnerInconsistent,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::CardCount { found } => {
                write!(f, "card count is {found}, expected {DECK_SIZE}")
            }
            Self::MultisetMismatch => write!(f, "card multiset differs from the canonical deck"),
            Self::InvalidMeld { index, code } => {
                write!(f, "table meld {index} is invalid: {code}")
            }
            Self::NoCurrentPlayer => write!(f, "current player is not seated"),
            Self::CurrentEliminated => write!(f, "current player is eliminated"),
            Self::TransientPhase { phase } => {
                write!(f, "committed state rests in transient phase {phase}")
            }
            Self::ScratchBeforeDraw => {
                write!(f, "turn scratch carries draw effects before any draw")
            }
            Self::WinnerInconsistent => write!(f, "match status and winner disagree"),
        }
    }
}

/// Run every check and collect what fails. An empty vec is a clean
/// state.
pub fn check(game: &Game) -> Vec<Violation> {
    let mut violations = Vec::new();

    // I1: conservation over every place a card can be
    let mut cards: Vec<Card> = Vec::with_capacity(DECK_SIZE);
    for player in &game.players {
        cards.extend(&player.hand);
    }
    for meld in &game.melds {
        cards.extend(&meld.cards);
    }
    cards.extend(game.stock.cards());
    cards.extend(&game.discard);
    if let Some(joker) = &game.scratch.pending_joker {
        cards.push(*joker);
    }
    if cards.len() != DECK_SIZE {
        violations.push(Violation::CardCount { found: cards.len() });
    } else {
        cards.sort();
        if cards != *CANONICAL {
            violations.push(Violation::MultisetMismatch);
        }
    }

    // I3: every table meld still validates as its stored kind
    for (index, m) in game.melds.iter().enumerate() {
        match meld::validate_cards(&m.cards) {
            Ok((kind, _)) if kind == m.kind => {}
            Ok(_) => violations.push(Violation::InvalidMeld {
                index,
                code: MeldCode::UnknownCard,
            }),
            Err(code) => violations.push(Violation::InvalidMeld { index, code }),
        }
    }

    // I2 and phase consistency only bind a live game
    if game.status == MatchStatus::Playing {
        match game.player(&game.current) {
            None => violations.push(Violation::NoCurrentPlayer),
            Some(player) if player.is_eliminated => violations.push(Violation::CurrentEliminated),
            Some(_) => {}
        }
        match game.phase {
            TurnPhase::AwaitDraw => {
                if game.scratch != Default::default() {
                    violations.push(Violation::ScratchBeforeDraw);
                }
            }
            TurnPhase::AwaitPlay => {}
            phase => violations.push(Violation::TransientPhase { phase }),
        }
    }

    match (game.status, &game.winner) {
        (MatchStatus::Finished, None) => violations.push(Violation::WinnerInconsistent),
        (MatchStatus::Playing | MatchStatus::HandEnd, Some(_)) => {
            violations.push(Violation::WinnerInconsistent)
        }
        _ => {}
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Rank, Suit};
    use crate::config::Config;
    use crate::player::PlayerId;

    fn fresh_game() -> Game {
        let ids: Vec<PlayerId> = vec!["anna".into(), "bruno".into(), "carla".into()];
        Game::create(&ids, Config::default(), 42).unwrap().0
    }

    #[test]
    fn test_fresh_game_is_clean() {
        assert_eq!(check(&fresh_game()), vec![]);
    }

    #[test]
    fn test_detects_lost_card() {
        let mut game = fresh_game();
        game.players[0].hand.pop();
        assert_eq!(
            check(&game),
            vec![Violation::CardCount {
                found: DECK_SIZE - 1
            }]
        );
    }

    #[test]
    fn test_detects_duplicated_card() {
        let mut game = fresh_game();
        let card = game.players[0].hand[0];
        *game.players[1].hand.last_mut().unwrap() = card;
        assert_eq!(check(&game), vec![Violation::MultisetMismatch]);
    }

    #[test]
    fn test_detects_broken_meld() {
        let mut game = fresh_game();
        // move three unrelated hand cards onto the table as a fake meld
        let cards = vec![
            game.players[0].hand.remove(0),
            game.players[0].hand.remove(0),
            game.players[0].hand.remove(0),
        ];
        let valid = crate::meld::validate_cards(&cards).is_ok();
        game.melds.push(crate::meld::Meld {
            kind: crate::meld::MeldKind::Combination,
            cards,
            owner: "anna".into(),
        });
        let violations = check(&game);
        if valid {
            // a seeded deal may coincidentally hand out a real meld;
            // then the only possible complaint is a kind mismatch
            assert!(violations.len() <= 1);
        } else {
            assert_eq!(violations.len(), 1);
            assert!(matches!(violations[0], Violation::InvalidMeld { index: 0, .. }));
        }
    }

    #[test]
    fn test_detects_eliminated_current() {
        let mut game = fresh_game();
        let seat = game.seat_of(&game.current.clone()).unwrap();
        game.players[seat].is_eliminated = true;
        assert!(check(&game).contains(&Violation::CurrentEliminated));
    }

    #[test]
    fn test_detects_scratch_before_draw() {
        let mut game = fresh_game();
        game.scratch.picked_from_discard = Some(Card::natural(Suit::Hearts, Rank::Two, 0));
        assert!(check(&game).contains(&Violation::ScratchBeforeDraw));
    }

    #[test]
    fn test_detects_winner_mismatch() {
        let mut game = fresh_game();
        game.status = MatchStatus::Finished;
        assert!(check(&game).contains(&Violation::WinnerInconsistent));
    }
}

use crate::card::Card;
use std::fmt;

/// Everything a seated player can ask the engine to do. Wire encoding
/// is adjacently tagged so a request reads as `action` + `payload`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(tag = "action", content = "payload", rename_all = "snake_case")
)]
pub enum Action {
    DrawStock,
    DrawDiscard,
    /// Opening move: each inner list is one candidate meld.
    Open(Vec<Vec<Card>>),
    LayMeld(Vec<Card>),
    Attach { card: Card, meld: usize },
    SubstituteJoker { meld: usize, card: Card },
    Discard(Card),
    /// Timeout substitution: draw from stock, discard the highest
    /// legal card.
    AutoPlay,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::DrawStock => write!(f, "draw from stock"),
            Self::DrawDiscard => write!(f, "draw from discard"),
            Self::Open(melds) => {
                write!(f, "open with ")?;
                for (i, meld) in melds.iter().enumerate() {
                    if i > 0 {
                        write!(f, " + ")?;
                    }
                    write_cards(f, meld)?;
                }
                Ok(())
            }
            Self::LayMeld(cards) => {
                write!(f, "lay ")?;
                write_cards(f, cards)
            }
            Self::Attach { card, meld } => write!(f, "attach {card} to meld {meld}"),
            Self::SubstituteJoker { meld, card } => {
                write!(f, "swap {card} for the joker in meld {meld}")
            }
            Self::Discard(card) => write!(f, "discard {card}"),
            Self::AutoPlay => write!(f, "auto-play"),
        }
    }
}

fn write_cards(f: &mut fmt::Formatter, cards: &[Card]) -> fmt::Result {
    write!(f, "[")?;
    for (i, card) in cards.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{card}")?;
    }
    write!(f, "]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Rank, Suit};

    #[cfg(feature = "serde")]
    #[test]
    fn test_action_wire_shape() {
        let action = Action::Discard(Card::natural(Suit::Hearts, Rank::Jack, 0));
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["action"], "discard");
        assert_eq!(json["payload"]["suit"], "hearts");

        let action = Action::DrawStock;
        assert_eq!(serde_json::to_value(&action).unwrap()["action"], "draw_stock");

        let action = Action::SubstituteJoker {
            meld: 2,
            card: Card::natural(Suit::Clubs, Rank::Six, 1),
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["action"], "substitute_joker");
        assert_eq!(json["payload"]["meld"], 2);
    }

    #[test]
    fn test_display() {
        let action = Action::Attach {
            card: Card::natural(Suit::Spades, Rank::Four, 0),
            meld: 1,
        };
        assert!(action.to_string().contains("meld 1"));
    }
}

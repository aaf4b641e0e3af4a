#[cfg(feature = "colored")]
use colored::Colorize;
use std::fmt;
use strum::EnumIter;

/// Card rank. Discriminants follow the run order used in sequences,
/// with the ace movable to either end (see `meld`).
#[derive(PartialEq, PartialOrd, Eq, Ord, Debug, Clone, Copy, Hash, EnumIter)]
pub enum Rank {
    Ace = 1,
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
    Six = 6,
    Seven = 7,
    Eight = 8,
    Nine = 9,
    Ten = 10,
    Jack = 11,
    Queen = 12,
    King = 13,
}

impl Rank {
    /// Position of this rank in a low-ace run, 1..=13.
    pub fn order(&self) -> u8 {
        *self as u8
    }

    pub fn from_order(order: u8) -> Option<Self> {
        match order {
            1 => Some(Rank::Ace),
            2 => Some(Rank::Two),
            3 => Some(Rank::Three),
            4 => Some(Rank::Four),
            5 => Some(Rank::Five),
            6 => Some(Rank::Six),
            7 => Some(Rank::Seven),
            8 => Some(Rank::Eight),
            9 => Some(Rank::Nine),
            10 => Some(Rank::Ten),
            11 => Some(Rank::Jack),
            12 => Some(Rank::Queen),
            13 => Some(Rank::King),
            _ => None,
        }
    }

    /// Point value of the rank when counted on its own: ace high.
    /// The low-ace case (1 point) only arises positionally inside a
    /// sequence and is handled by the meld validator.
    pub fn points(&self) -> u32 {
        match self {
            Rank::Ace => 11,
            Rank::Jack | Rank::Queen | Rank::King => 10,
            other => other.order() as u32,
        }
    }
}

impl From<Rank> for char {
    fn from(rank: Rank) -> Self {
        match rank {
            Rank::Ace => 'A',
            Rank::Two => '2',
            Rank::Three => '3',
            Rank::Four => '4',
            Rank::Five => '5',
            Rank::Six => '6',
            Rank::Seven => '7',
            Rank::Eight => '8',
            Rank::Nine => '9',
            Rank::Ten => 'T',
            Rank::Jack => 'J',
            Rank::Queen => 'Q',
            Rank::King => 'K',
        }
    }
}

/// The four French suits. Jokers carry no suit and are modelled as a
/// distinct `Card` variant.
#[derive(PartialEq, PartialOrd, Eq, Ord, Debug, Clone, Copy, Hash, EnumIter)]
pub enum Suit {
    Spades,
    Hearts,
    Diamonds,
    Clubs,
}

impl Suit {
    pub fn unicode(&self) -> &'static str {
        match self {
            Self::Spades => "♠",
            Self::Hearts => "♥",
            Self::Diamonds => "♦",
            Self::Clubs => "♣",
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Spades => "spades",
            Self::Hearts => "hearts",
            Self::Diamonds => "diamonds",
            Self::Clubs => "clubs",
        }
    }

    pub(crate) fn from_name(name: &str) -> Option<Self> {
        match name {
            "spades" => Some(Self::Spades),
            "hearts" => Some(Self::Hearts),
            "diamonds" => Some(Self::Diamonds),
            "clubs" => Some(Self::Clubs),
            _ => None,
        }
    }
}

impl From<Suit> for char {
    fn from(suit: Suit) -> Self {
        match suit {
            Suit::Spades => 's',
            Suit::Hearts => 'h',
            Suit::Diamonds => 'd',
            Suit::Clubs => 'c',
        }
    }
}

/// A single card out of the 108-card double deck. Identity for
/// persistence and conservation checks is the triple (suit, rank, deck);
/// the two jokers per deck side are indistinguishable in play but remain
/// distinct objects through their deck index.
#[derive(PartialEq, PartialOrd, Eq, Ord, Debug, Clone, Copy, Hash)]
pub enum Card {
    Natural { suit: Suit, rank: Rank, deck: u8 },
    Joker { deck: u8 },
}

impl Card {
    pub fn natural(suit: Suit, rank: Rank, deck: u8) -> Self {
        Card::Natural { suit, rank, deck }
    }

    pub fn joker(deck: u8) -> Self {
        Card::Joker { deck }
    }

    pub fn is_joker(&self) -> bool {
        matches!(self, Card::Joker { .. })
    }

    pub fn suit(&self) -> Option<Suit> {
        match self {
            Card::Natural { suit, .. } => Some(*suit),
            Card::Joker { .. } => None,
        }
    }

    pub fn rank(&self) -> Option<Rank> {
        match self {
            Card::Natural { rank, .. } => Some(*rank),
            Card::Joker { .. } => None,
        }
    }

    pub fn deck(&self) -> u8 {
        match self {
            Card::Natural { deck, .. } | Card::Joker { deck } => *deck,
        }
    }

    /// Point value of the card counted loose in a hand: joker 25, ace 11,
    /// faces 10, pips at face value.
    pub fn points(&self) -> u32 {
        match self {
            Card::Joker { .. } => 25,
            Card::Natural { rank, .. } => rank.points(),
        }
    }

    /// Same card in the other deck copy.
    pub fn twin(&self) -> Self {
        match *self {
            Card::Natural { suit, rank, deck } => Card::Natural {
                suit,
                rank,
                deck: 1 - deck,
            },
            Card::Joker { deck } => Card::Joker { deck: 1 - deck },
        }
    }

    /// True when `other` names the same suit and rank, regardless of
    /// which deck copy it is.
    pub fn same_face(&self, other: &Card) -> bool {
        match (self, other) {
            (Card::Natural { suit, rank, .. }, Card::Natural { suit: s, rank: r, .. }) => {
                suit == s && rank == r
            }
            (Card::Joker { .. }, Card::Joker { .. }) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Card::Joker { .. } => {
                #[cfg(feature = "colored")]
                return write!(f, "{}", "Jo".magenta().bold());
                #[cfg(not(feature = "colored"))]
                write!(f, "Jo")
            }
            Card::Natural { suit, rank, .. } => {
                #[cfg(feature = "colored")]
                let glyph = match suit {
                    Suit::Spades | Suit::Clubs => suit.unicode().bold(),
                    Suit::Hearts | Suit::Diamonds => suit.unicode().red().bold(),
                };
                #[cfg(not(feature = "colored"))]
                let glyph = suit.unicode();
                write!(f, "{}{}", char::from(*rank), glyph)
            }
        }
    }
}

// Cards persist as the identity triple {suit, rank, deck}, with the
// joker written as suit "joker", rank 0. The wire shape stays flat
// instead of serde's tagged enum encoding so the exported state
// document is stable and self-describing.
#[cfg(feature = "serde")]
mod wire {
    use super::{Card, Rank, Suit};
    use serde::de::Error as DeError;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct CardWire {
        suit: String,
        rank: u8,
        deck: u8,
    }

    impl Serialize for Card {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let wire = match self {
                Card::Natural { suit, rank, deck } => CardWire {
                    suit: suit.name().to_string(),
                    rank: rank.order(),
                    deck: *deck,
                },
                Card::Joker { deck } => CardWire {
                    suit: "joker".to_string(),
                    rank: 0,
                    deck: *deck,
                },
            };
            wire.serialize(serializer)
        }
    }

    impl<'de> Deserialize<'de> for Card {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let wire = CardWire::deserialize(deserializer)?;
            if wire.deck > 1 {
                return Err(D::Error::custom(format!(
                    "deck index out of range: {}",
                    wire.deck
                )));
            }
            if wire.suit == "joker" {
                if wire.rank != 0 {
                    return Err(D::Error::custom("joker must carry rank 0"));
                }
                return Ok(Card::Joker { deck: wire.deck });
            }
            let suit = Suit::from_name(&wire.suit)
                .ok_or_else(|| D::Error::custom(format!("unknown suit: {}", wire.suit)))?;
            let rank = Rank::from_order(wire.rank)
                .ok_or_else(|| D::Error::custom(format!("rank out of range: {}", wire.rank)))?;
            Ok(Card::Natural {
                suit,
                rank,
                deck: wire.deck,
            })
        }
    }
}

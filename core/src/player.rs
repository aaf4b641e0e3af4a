use crate::card::Card;

/// External player identifier, assigned by whatever transport fronts
/// the engine.
pub type PlayerId = String;

/// One seat in a match. The hand order is the player's preferred
/// display order and is preserved across actions.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Player {
    pub id: PlayerId,
    pub hand: Vec<Card>,
    /// Set once the player first commits melds worth the opening
    /// threshold; never resets within a hand.
    pub has_opened: bool,
    /// Cumulative score across hands.
    pub score: u32,
    /// Eliminated players are skipped in rotation and keep their seat
    /// only for display.
    pub is_eliminated: bool,
}

impl Player {
    pub fn new(id: impl Into<PlayerId>) -> Self {
        Self {
            id: id.into(),
            hand: Vec::new(),
            has_opened: false,
            score: 0,
            is_eliminated: false,
        }
    }

    pub fn holds(&self, card: &Card) -> bool {
        self.hand.contains(card)
    }

    /// Remove one exact card from the hand, preserving the order of the
    /// rest. Returns false when the card is not there.
    pub fn remove_card(&mut self, card: &Card) -> bool {
        match self.hand.iter().position(|c| c == card) {
            Some(idx) => {
                self.hand.remove(idx);
                true
            }
            None => false,
        }
    }

    /// A card in hand with the same suit and rank as `card` but a
    /// different deck index.
    pub fn duplicate_of(&self, card: &Card) -> Option<Card> {
        self.hand
            .iter()
            .find(|c| c.same_face(card) && *c != card)
            .copied()
    }

    /// Sum of loose card values over the remaining hand.
    pub fn hand_points(&self) -> u32 {
        self.hand.iter().map(Card::points).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Rank, Suit};

    #[test]
    fn test_remove_preserves_order() {
        let mut player = Player::new("anna");
        player.hand = vec![
            Card::natural(Suit::Spades, Rank::Two, 0),
            Card::natural(Suit::Hearts, Rank::Nine, 0),
            Card::natural(Suit::Clubs, Rank::King, 1),
        ];
        assert!(player.remove_card(&Card::natural(Suit::Hearts, Rank::Nine, 0)));
        assert_eq!(
            player.hand,
            vec![
                Card::natural(Suit::Spades, Rank::Two, 0),
                Card::natural(Suit::Clubs, Rank::King, 1),
            ]
        );
        assert!(!player.remove_card(&Card::natural(Suit::Hearts, Rank::Nine, 0)));
    }

    #[test]
    fn test_duplicate_of() {
        let mut player = Player::new("bruno");
        let seven = Card::natural(Suit::Diamonds, Rank::Seven, 0);
        player.hand = vec![seven, seven.twin()];
        assert_eq!(player.duplicate_of(&seven), Some(seven.twin()));
        player.hand = vec![seven];
        assert_eq!(player.duplicate_of(&seven), None);
    }

    #[test]
    fn test_hand_points() {
        let mut player = Player::new("carla");
        player.hand = vec![
            Card::joker(0),
            Card::natural(Suit::Spades, Rank::Ace, 0),
            Card::natural(Suit::Hearts, Rank::Queen, 1),
            Card::natural(Suit::Clubs, Rank::Four, 0),
        ];
        assert_eq!(player.hand_points(), 25 + 11 + 10 + 4);
    }
}

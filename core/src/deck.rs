use crate::card::{Card, Rank, Suit};
use crate::error::GameError;
use crate::rng::GameRng;
use once_cell::sync::Lazy;
use strum::IntoEnumIterator;

/// Two 52-card French decks plus four jokers.
pub const DECK_SIZE: usize = 108;

/// Jokers carried per deck side.
const JOKERS_PER_SIDE: usize = 2;

/// The canonical 108-card multiset in sorted order. Conservation checks
/// compare a sorted collection against this.
pub static CANONICAL: Lazy<Vec<Card>> = Lazy::new(|| {
    let mut cards = fresh_order();
    cards.sort();
    cards
});

fn fresh_order() -> Vec<Card> {
    let mut cards = Vec::with_capacity(DECK_SIZE);
    for deck in 0..2u8 {
        for suit in Suit::iter() {
            for rank in Rank::iter() {
                cards.push(Card::natural(suit, rank, deck));
            }
        }
        for _ in 0..JOKERS_PER_SIDE {
            cards.push(Card::joker(deck));
        }
    }
    cards
}

/// The draw stock. Top of the stock is the last element, so drawing is
/// a pop.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// Full unshuffled 108-card stock.
    pub fn standard() -> Self {
        Self {
            cards: fresh_order(),
        }
    }

    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    pub fn shuffle(&mut self, rng: &mut GameRng) {
        rng.shuffle_in_place(&mut self.cards);
    }

    /// Pop the top card; `None` on an empty stock.
    pub fn draw(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Deal `hand_size` cards to each of `players` hands, one card at a
    /// time in seating order, then pop one card as the initial discard.
    pub fn deal(
        &mut self,
        players: usize,
        hand_size: usize,
    ) -> Result<(Vec<Vec<Card>>, Card), GameError> {
        if !(2..=4).contains(&players) {
            return Err(GameError::PlayerCount(players));
        }
        let mut hands = vec![Vec::with_capacity(hand_size); players];
        for _ in 0..hand_size {
            for hand in hands.iter_mut() {
                hand.push(self.draw().ok_or(GameError::NoCards)?);
            }
        }
        let upcard = self.draw().ok_or(GameError::NoCards)?;
        Ok((hands, upcard))
    }

    /// Rebuild the stock from the discard pile when a draw finds the
    /// stock empty: everything below the discard top is shuffled into a
    /// fresh stock, and the top stays as the sole discard. Conservation
    /// holds because cards only move between the two piles.
    pub fn rebuild_from_discard(discard: &mut Vec<Card>, rng: &mut GameRng) -> Self {
        let top = discard.pop();
        let mut stock = Deck::from_cards(std::mem::take(discard));
        stock.shuffle(rng);
        if let Some(top) = top {
            discard.push(top);
        }
        stock
    }
}

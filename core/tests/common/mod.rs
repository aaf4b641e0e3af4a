//! Helpers for building exact table states. Cards move between the
//! piles rather than appearing from nowhere, so rigged games still
//! satisfy the conservation invariant.

use scala40_rs::card::{Card, Rank, Suit};
use scala40_rs::config::Config;
use scala40_rs::deck::Deck;
use scala40_rs::game::Game;
use scala40_rs::meld::Meld;
use scala40_rs::player::PlayerId;
use scala40_rs::turn::TurnPhase;

pub fn n(suit: Suit, rank: Rank) -> Card {
    Card::natural(suit, rank, 0)
}

fn pull(pool: &mut Vec<Card>, card: &Card) -> Card {
    let pos = pool
        .iter()
        .position(|c| c == card)
        .or_else(|| pool.iter().position(|c| c.same_face(card)))
        .unwrap_or_else(|| panic!("card {card} not available"));
    pool.remove(pos)
}

/// A game with the given exact hands (dealer first; the second id acts
/// first). Whatever the hands leave of the 108 becomes the stock, bar
/// one upcard on the discard pile.
pub fn rig(ids: &[&str], hands: &[Vec<Card>], config: Config) -> Game {
    assert_eq!(ids.len(), hands.len());
    let player_ids: Vec<PlayerId> = ids.iter().map(|s| s.to_string()).collect();
    let (mut game, _) = Game::create(&player_ids, config, 1).unwrap();

    let mut pool: Vec<Card> = Deck::standard().cards().to_vec();
    for (player, hand) in game.players.iter_mut().zip(hands) {
        player.hand = hand.iter().map(|card| pull(&mut pool, card)).collect();
    }
    let upcard = pool.pop().expect("pool left an upcard");
    game.stock = Deck::from_cards(pool);
    game.discard = vec![upcard];
    game.melds.clear();
    game.scratch.clear();
    game.phase = TurnPhase::AwaitDraw;
    game.current = game.players[1].id.clone();
    game
}

/// Like `rig`, with hands of the given sizes drawn off the top of the
/// deck instead of named cards.
pub fn rig_sized(ids: &[&str], sizes: &[usize], config: Config) -> Game {
    let hands: Vec<Vec<Card>> = {
        let mut deck = Deck::standard();
        sizes
            .iter()
            .map(|&size| (0..size).map(|_| deck.draw().unwrap()).collect())
            .collect()
    };
    rig(ids, &hands, config)
}

/// Move the named cards from the stock onto the table as a meld.
pub fn give_meld(game: &mut Game, cards: &[Card], owner: &str) -> usize {
    let mut stock: Vec<Card> = game.stock.cards().to_vec();
    let moved: Vec<Card> = cards.iter().map(|card| pull(&mut stock, card)).collect();
    game.stock = Deck::from_cards(stock);
    game.melds.push(Meld::try_new(moved, owner).unwrap());
    game.melds.len() - 1
}

/// Put a specific card (pulled from the stock) on top of the discard
/// pile.
pub fn stack_discard(game: &mut Game, card: &Card) {
    let mut stock: Vec<Card> = game.stock.cards().to_vec();
    let card = pull(&mut stock, card);
    game.stock = Deck::from_cards(stock);
    game.discard.push(card);
}

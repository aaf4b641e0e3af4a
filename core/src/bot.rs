//! Deterministic baseline player: greedy meld discovery, a fixed
//! priority of plays, and highest-legal-card discards. Drives the
//! simulator and backs the interactive CLI's action menu. No search,
//! no randomness; the same position always produces the same action.

use crate::action::Action;
use crate::card::{Card, Suit};
use crate::game::{Game, MatchStatus};
use crate::meld::validate_cards;
use crate::player::PlayerId;
use crate::turn::TurnPhase;
use itertools::Itertools;
use strum::IntoEnumIterator;

/// Greedy meld discovery over a hand: suit runs first, then rank
/// groups. Jokers stay in hand; the baseline never spends them.
pub fn find_melds(hand: &[Card]) -> Vec<Vec<Card>> {
    let mut pool: Vec<Card> = hand.iter().filter(|c| !c.is_joker()).copied().collect();
    let mut found = Vec::new();

    for suit in Suit::iter() {
        while let Some(run) = longest_run(&pool, suit) {
            for card in &run {
                if let Some(pos) = pool.iter().position(|c| c == card) {
                    pool.remove(pos);
                }
            }
            found.push(run);
        }
    }

    for order in 1..=13u8 {
        let group: Vec<Card> = pool
            .iter()
            .filter(|c| c.rank().map(|r| r.order()) == Some(order))
            .unique_by(|c| c.suit())
            .take(4)
            .copied()
            .collect();
        if group.len() >= 3 {
            for card in &group {
                if let Some(pos) = pool.iter().position(|c| c == card) {
                    pool.remove(pos);
                }
            }
            found.push(group);
        }
    }
    found
}

/// Longest low-ace run of at least three distinct consecutive ranks in
/// one suit, or `None`.
fn longest_run(pool: &[Card], suit: Suit) -> Option<Vec<Card>> {
    let suited: Vec<Card> = pool
        .iter()
        .filter(|c| c.suit() == Some(suit))
        .sorted_by_key(|c| (c.rank().map(|r| r.order()), c.deck()))
        .unique_by(|c| c.rank())
        .copied()
        .collect();

    let mut best: Option<Vec<Card>> = None;
    let mut run: Vec<Card> = Vec::new();
    for card in suited {
        let order = card.rank().map(|r| r.order()).unwrap_or(0);
        let extends = run
            .last()
            .and_then(|c| c.rank())
            .map(|r| r.order() + 1 == order)
            .unwrap_or(false);
        if !extends {
            run.clear();
        }
        run.push(card);
        if run.len() >= 3 && run.len() > best.as_ref().map_or(0, Vec::len) {
            best = Some(run.clone());
        }
    }
    best
}

/// The baseline's next action for `player`, or `None` when it is not
/// that player's move.
pub fn choose(game: &Game, player: &PlayerId) -> Option<Action> {
    if game.status != MatchStatus::Playing || game.current != *player {
        return None;
    }
    let seat = game.seat_of(player)?;
    let hand = &game.players[seat].hand;

    match game.phase {
        TurnPhase::AwaitDraw => Some(Action::DrawStock),
        TurnPhase::AwaitPlay => {
            if let Some(action) = choose_play(game, seat) {
                return Some(action);
            }
            let mut ranked = hand.clone();
            ranked.sort_by(|a, b| b.points().cmp(&a.points()).then(a.cmp(b)));
            for card in &ranked {
                if game.check_discard(seat, card, false).is_ok() {
                    return Some(Action::Discard(*card));
                }
            }
            // nothing discards cleanly, let the engine force one
            Some(Action::AutoPlay)
        }
        _ => None,
    }
}

fn choose_play(game: &Game, seat: usize) -> Option<Action> {
    let player = &game.players[seat];
    if !player.has_opened {
        let melds = opening_candidate(game, &player.hand)?;
        return Some(Action::Open(melds));
    }
    let melds = find_melds(&player.hand);
    if let Some(meld) = melds.first() {
        if player.hand.len() > meld.len() {
            return Some(Action::LayMeld(meld.clone()));
        }
    }
    if player.hand.len() >= 2 {
        for card in &player.hand {
            for (idx, meld) in game.melds.iter().enumerate() {
                if meld.can_attach(card) {
                    return Some(Action::Attach {
                        card: *card,
                        meld: idx,
                    });
                }
            }
        }
    }
    None
}

/// A greedy opening that clears the threshold and keeps a discard
/// card, trimming melds from the back if the whole hand would go down.
fn opening_candidate(game: &Game, hand: &[Card]) -> Option<Vec<Vec<Card>>> {
    let mut melds = find_melds(hand);
    while melds.iter().map(Vec::len).sum::<usize>() >= hand.len() {
        melds.pop()?;
    }
    let points: u32 = melds
        .iter()
        .filter_map(|cards| validate_cards(cards).ok())
        .map(|(_, pts)| pts)
        .sum();
    if melds.is_empty() || points < game.config.opening_points {
        return None;
    }
    Some(melds)
}

/// Every action worth offering in an interactive menu, in a stable
/// order: draws, opening, lays, attaches, substitutions, discards.
pub fn legal_actions(game: &Game, player: &PlayerId) -> Vec<Action> {
    let mut actions = Vec::new();
    if game.status != MatchStatus::Playing || game.current != *player {
        return actions;
    }
    let Some(seat) = game.seat_of(player) else {
        return actions;
    };
    let p = &game.players[seat];

    match game.phase {
        TurnPhase::AwaitDraw => {
            actions.push(Action::DrawStock);
            if !game.discard.is_empty() && (p.has_opened || game.config.open_with_discard) {
                actions.push(Action::DrawDiscard);
            }
        }
        TurnPhase::AwaitPlay => {
            if !p.has_opened {
                if let Some(melds) = opening_candidate(game, &p.hand) {
                    actions.push(Action::Open(melds));
                }
            } else {
                for meld in find_melds(&p.hand) {
                    if p.hand.len() > meld.len() {
                        actions.push(Action::LayMeld(meld));
                    }
                }
                if p.hand.len() >= 2 {
                    for card in p.hand.iter().unique() {
                        for (idx, meld) in game.melds.iter().enumerate() {
                            if meld.can_attach(card) {
                                actions.push(Action::Attach {
                                    card: *card,
                                    meld: idx,
                                });
                            }
                        }
                    }
                }
                if game.scratch.pending_joker.is_none() {
                    for (idx, meld) in game.melds.iter().enumerate() {
                        if !meld.has_joker() {
                            continue;
                        }
                        for card in p.hand.iter().unique() {
                            if meld.substitute_joker(card).is_ok() {
                                actions.push(Action::SubstituteJoker {
                                    meld: idx,
                                    card: *card,
                                });
                            }
                        }
                    }
                }
            }
            for card in p.hand.iter().unique() {
                if game.check_discard(seat, card, false).is_ok() {
                    actions.push(Action::Discard(*card));
                }
            }
            if !actions.iter().any(|a| matches!(a, Action::Discard(_))) {
                actions.push(Action::AutoPlay);
            }
        }
        _ => {}
    }
    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::Rank;
    use crate::config::Config;
    use crate::meld::MeldKind;

    fn n(suit: Suit, rank: Rank) -> Card {
        Card::natural(suit, rank, 0)
    }

    #[test]
    fn test_find_melds_runs_and_groups() {
        let hand = vec![
            n(Suit::Spades, Rank::Ace),
            n(Suit::Spades, Rank::Two),
            n(Suit::Spades, Rank::Three),
            n(Suit::Hearts, Rank::Nine),
            n(Suit::Diamonds, Rank::Nine),
            n(Suit::Clubs, Rank::Nine),
            n(Suit::Hearts, Rank::King),
            Card::joker(0),
        ];
        let melds = find_melds(&hand);
        assert_eq!(melds.len(), 2);
        for cards in &melds {
            assert!(validate_cards(cards).is_ok());
        }
        // jokers and loose cards stay in hand
        assert!(melds.iter().flatten().all(|c| !c.is_joker()));
    }

    #[test]
    fn test_find_melds_prefers_runs() {
        // the 9♠ belongs to the spade run, leaving only two nines
        let hand = vec![
            n(Suit::Spades, Rank::Eight),
            n(Suit::Spades, Rank::Nine),
            n(Suit::Spades, Rank::Ten),
            n(Suit::Hearts, Rank::Nine),
            n(Suit::Diamonds, Rank::Nine),
        ];
        let melds = find_melds(&hand);
        assert_eq!(melds.len(), 1);
        assert_eq!(
            validate_cards(&melds[0]).unwrap().0,
            MeldKind::Sequence
        );
    }

    #[test]
    fn test_choose_draws_then_discards() {
        let ids: Vec<PlayerId> = vec!["anna".into(), "bruno".into()];
        let (mut game, _) = Game::create(&ids, Config::default(), 42).unwrap();
        let current = game.current.clone();

        let action = choose(&game, &current).unwrap();
        assert_eq!(action, Action::DrawStock);
        game.handle_action(&current, action, false).unwrap();

        // off-turn player gets nothing
        let other = game
            .players
            .iter()
            .find(|p| p.id != current)
            .unwrap()
            .id
            .clone();
        assert_eq!(choose(&game, &other), None);

        // the turn always terminates in a discard or a forced one
        let action = loop {
            let action = choose(&game, &current).unwrap();
            if matches!(action, Action::Discard(_) | Action::AutoPlay) {
                break action;
            }
            game.handle_action(&current, action, false).unwrap();
        };
        game.handle_action(&current, action, false).unwrap();
        assert_ne!(game.current, current);
    }

    #[test]
    fn test_choose_is_deterministic() {
        let ids: Vec<PlayerId> = vec!["anna".into(), "bruno".into()];
        let (game_a, _) = Game::create(&ids, Config::default(), 7).unwrap();
        let (game_b, _) = Game::create(&ids, Config::default(), 7).unwrap();
        let current = game_a.current.clone();
        assert_eq!(choose(&game_a, &current), choose(&game_b, &current));
    }

    #[test]
    fn test_legal_actions_menu() {
        let ids: Vec<PlayerId> = vec!["anna".into(), "bruno".into()];
        let (game, _) = Game::create(&ids, Config::default(), 42).unwrap();
        let current = game.current.clone();
        let menu = legal_actions(&game, &current);
        // an unopened player may only draw from stock
        assert_eq!(menu, vec![Action::DrawStock]);
        assert!(legal_actions(&game, &"nobody".to_string()).is_empty());
    }
}

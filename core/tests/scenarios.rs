//! End-to-end rule scenarios: whole turns driven through the public
//! API against exactly rigged tables.

mod common;

use common::{give_meld, n, rig, rig_sized, stack_discard};
use scala40_rs::action::Action;
use scala40_rs::card::{Card, Rank, Suit};
use scala40_rs::config::Config;
use scala40_rs::engine::{ActionRequest, Engine};
use scala40_rs::error::GameError;
use scala40_rs::event::GameEvent;
use scala40_rs::game::{Game, MatchStatus};
use scala40_rs::integrity;
use scala40_rs::repo::{GameStore, MemoryRepository};
use scala40_rs::turn::TurnPhase;

fn act(game: &mut Game, player: &str, action: Action) -> Vec<GameEvent> {
    game.handle_action(&player.to_string(), action, false)
        .unwrap_or_else(|err| panic!("{player}: {err}"))
}

/// Two-player opening exchange: a 51-point opening with an attach goes
/// through, the 30-point reply is rejected at the threshold.
#[test]
fn test_two_player_quick_opening() {
    let alice_hand = vec![
        n(Suit::Spades, Rank::Ace),
        n(Suit::Spades, Rank::Two),
        n(Suit::Spades, Rank::Three),
        n(Suit::Spades, Rank::Four),
        n(Suit::Spades, Rank::Five),
        n(Suit::Spades, Rank::Six),
        n(Suit::Hearts, Rank::Ten),
        n(Suit::Diamonds, Rank::Ten),
        n(Suit::Clubs, Rank::Ten),
        n(Suit::Spades, Rank::Seven),
        n(Suit::Hearts, Rank::Jack),
        n(Suit::Diamonds, Rank::Nine),
        n(Suit::Clubs, Rank::Four),
    ];
    let bea_hand = vec![
        n(Suit::Hearts, Rank::Queen),
        n(Suit::Hearts, Rank::King),
        n(Suit::Clubs, Rank::Two),
        n(Suit::Clubs, Rank::Seven),
        n(Suit::Clubs, Rank::Eight),
        n(Suit::Diamonds, Rank::Two),
        n(Suit::Diamonds, Rank::Four),
        n(Suit::Diamonds, Rank::Six),
        n(Suit::Hearts, Rank::Three),
        n(Suit::Hearts, Rank::Five),
        n(Suit::Hearts, Rank::Seven),
        n(Suit::Spades, Rank::Nine),
        n(Suit::Spades, Rank::Jack),
    ];
    let mut config = Config::default();
    config.open_with_discard = true;
    let mut game = rig(&["bea", "alice"], &[bea_hand, alice_hand], config);

    act(&mut game, "alice", Action::DrawStock);
    let events = act(
        &mut game,
        "alice",
        Action::Open(vec![
            vec![
                n(Suit::Spades, Rank::Ace),
                n(Suit::Spades, Rank::Two),
                n(Suit::Spades, Rank::Three),
                n(Suit::Spades, Rank::Four),
                n(Suit::Spades, Rank::Five),
                n(Suit::Spades, Rank::Six),
            ],
            vec![
                n(Suit::Hearts, Rank::Ten),
                n(Suit::Diamonds, Rank::Ten),
                n(Suit::Clubs, Rank::Ten),
            ],
        ]),
    );
    assert!(matches!(
        events[0],
        GameEvent::Open {
            points: 51,
            melds: 2,
            ..
        }
    ));

    act(
        &mut game,
        "alice",
        Action::Attach {
            card: n(Suit::Spades, Rank::Seven),
            meld: 0,
        },
    );
    assert_eq!(game.melds[0].cards.len(), 7);

    act(&mut game, "alice", Action::Discard(n(Suit::Hearts, Rank::Jack)));
    assert_eq!(game.current, "bea");

    // bea takes the jack from the pile under the open-with-discard
    // variant, but her 30 points do not open
    act(&mut game, "bea", Action::DrawDiscard);
    let err = game
        .handle_action(
            &"bea".to_string(),
            Action::Open(vec![vec![
                n(Suit::Hearts, Rank::Jack),
                n(Suit::Hearts, Rank::Queen),
                n(Suit::Hearts, Rank::King),
            ]]),
            false,
        )
        .unwrap_err();
    assert_eq!(err, GameError::OpeningBelowThreshold { points: 30 });
    assert_eq!(err.kind(), "OpeningBelowThreshold");
    assert!(!game.player(&"bea".to_string()).unwrap().has_opened);
}

/// Closing on the very first turn is blocked even for a hand that
/// could go down whole.
#[test]
fn test_first_round_closure_blocked() {
    let full_run: Vec<Card> = (1..=13)
        .map(|order| n(Suit::Spades, Rank::from_order(order).unwrap()))
        .collect();
    let filler: Vec<Card> = vec![
        n(Suit::Hearts, Rank::Two),
        n(Suit::Hearts, Rank::Four),
        n(Suit::Hearts, Rank::Six),
        n(Suit::Hearts, Rank::Eight),
        n(Suit::Hearts, Rank::Ten),
        n(Suit::Hearts, Rank::Queen),
        n(Suit::Clubs, Rank::Three),
        n(Suit::Clubs, Rank::Five),
        n(Suit::Clubs, Rank::Seven),
        n(Suit::Clubs, Rank::Nine),
        n(Suit::Clubs, Rank::Jack),
        n(Suit::Diamonds, Rank::Three),
        n(Suit::Diamonds, Rank::Five),
    ];
    let mut game = rig(&["bo", "ann"], &[filler, full_run], Config::default());

    act(&mut game, "ann", Action::DrawStock);
    let open: Vec<Card> = (1..=13)
        .map(|order| n(Suit::Spades, Rank::from_order(order).unwrap()))
        .collect();
    act(&mut game, "ann", Action::Open(vec![open]));
    assert_eq!(game.player(&"ann".to_string()).unwrap().hand.len(), 1);

    let last = game.player(&"ann".to_string()).unwrap().hand[0];
    assert_eq!(
        game.handle_action(&"ann".to_string(), Action::Discard(last), false),
        Err(GameError::CannotCloseFirstRound)
    );
    // the hand goes on: same player, same phase, meld still down
    assert_eq!(game.current, "ann");
    assert_eq!(game.phase, TurnPhase::AwaitPlay);
    assert_eq!(game.melds.len(), 1);
    assert_eq!(game.status, MatchStatus::Playing);
}

/// A withdrawn joker pins the turn open until it lands in a meld; the
/// failed attempt changes nothing.
#[test]
fn test_joker_must_be_used() {
    let hand = vec![
        n(Suit::Hearts, Rank::Six),
        n(Suit::Clubs, Rank::Two),
        n(Suit::Clubs, Rank::Nine),
        n(Suit::Diamonds, Rank::Four),
    ];
    let other = vec![
        n(Suit::Spades, Rank::Two),
        n(Suit::Spades, Rank::Four),
        n(Suit::Spades, Rank::Six),
    ];
    let mut game = rig(&["bo", "ann"], &[other, hand], Config::default());
    give_meld(
        &mut game,
        &[
            n(Suit::Hearts, Rank::Five),
            Card::joker(0),
            n(Suit::Hearts, Rank::Seven),
        ],
        "bo",
    );
    game.players[1].has_opened = true;

    act(&mut game, "ann", Action::DrawStock);
    act(
        &mut game,
        "ann",
        Action::SubstituteJoker {
            meld: 0,
            card: n(Suit::Hearts, Rank::Six),
        },
    );
    assert_eq!(game.scratch.pending_joker, Some(Card::joker(0)));

    let before = game.clone();
    let spare = game.player(&"ann".to_string()).unwrap().hand[0];
    assert_eq!(
        game.handle_action(&"ann".to_string(), Action::Discard(spare), false),
        Err(GameError::JokerMustBeUsed)
    );
    // engine state unchanged by the rejected transition
    assert_eq!(game, before);
}

/// In a three-player game a discard that fits a table meld is turned
/// back, unless that same discard closes the hand.
#[test]
fn test_discard_attaches_to_table() {
    let carl_hand = vec![
        n(Suit::Diamonds, Rank::Nine),
        n(Suit::Diamonds, Rank::Jack),
        n(Suit::Diamonds, Rank::King),
    ];
    let ann_hand = vec![
        n(Suit::Hearts, Rank::Seven),
        n(Suit::Clubs, Rank::Nine),
        n(Suit::Diamonds, Rank::Two),
    ];
    let bob_hand = vec![
        n(Suit::Clubs, Rank::Ace),
        n(Suit::Clubs, Rank::Three),
        n(Suit::Clubs, Rank::Five),
    ];
    let mut game = rig(
        &["carl", "ann", "bob"],
        &[carl_hand, ann_hand, bob_hand],
        Config::default(),
    );
    give_meld(
        &mut game,
        &[
            n(Suit::Hearts, Rank::Four),
            n(Suit::Hearts, Rank::Five),
            n(Suit::Hearts, Rank::Six),
        ],
        "carl",
    );
    game.players[1].has_opened = true;
    game.first_round_complete = true;

    act(&mut game, "ann", Action::DrawStock);
    assert_eq!(
        game.handle_action(
            &"ann".to_string(),
            Action::Discard(n(Suit::Hearts, Rank::Seven)),
            false
        ),
        Err(GameError::DiscardAttachesToTable)
    );

    // same discard, but as the closing card: accepted, scored, logged
    let engine = Engine::new(MemoryRepository::new());
    let mut closing = rig(
        &["carl", "ann", "bob"],
        &[
            vec![n(Suit::Diamonds, Rank::Nine), n(Suit::Diamonds, Rank::Jack)],
            vec![n(Suit::Hearts, Rank::Seven)],
            vec![n(Suit::Clubs, Rank::Ace), n(Suit::Clubs, Rank::Three)],
        ],
        Config::default(),
    );
    give_meld(
        &mut closing,
        &[
            n(Suit::Hearts, Rank::Four),
            n(Suit::Hearts, Rank::Five),
            n(Suit::Hearts, Rank::Six),
        ],
        "carl",
    );
    closing.players[1].has_opened = true;
    closing.first_round_complete = true;
    closing.phase = TurnPhase::AwaitPlay;
    let game_id = closing.id;
    engine.repo().put_game(&game_id, &closing, None).unwrap();

    let response = engine
        .process(&ActionRequest::new(
            game_id,
            "ann".to_string(),
            "close-1",
            Action::Discard(n(Suit::Hearts, Rank::Seven)),
        ))
        .unwrap();
    assert!(response
        .events
        .iter()
        .any(|e| matches!(e, GameEvent::Closure { player, .. } if player == "ann")));
    assert!(response
        .events
        .iter()
        .any(|e| matches!(e, GameEvent::HandEnd { closer, .. } if closer == "ann")));
    // scoring ran: the opponents' cards counted against them
    let game = engine.game(&game_id).unwrap();
    assert_eq!(game.player(&"ann".to_string()).unwrap().score, 0);
    assert_eq!(game.player(&"carl".to_string()).unwrap().score, 9 + 10);
    assert_eq!(game.player(&"bob".to_string()).unwrap().score, 11 + 3);
}

/// An empty stock refills from under the discard top at the moment of
/// the draw, conserving all 108 cards.
#[test]
fn test_stock_exhaustion_reshuffle() {
    let mut game = rig_sized(&["bea", "alice"], &[47, 47], Config::default());
    // push the whole stock under the existing discard top
    while let Some(card) = game.stock.draw() {
        game.discard.insert(0, card);
    }
    assert_eq!(game.discard.len(), 14);
    assert!(game.stock.is_empty());
    let top = *game.discard.last().unwrap();

    let engine = Engine::new(MemoryRepository::new());
    let game_id = game.id;
    engine.repo().put_game(&game_id, &game, None).unwrap();

    let response = engine
        .process(&ActionRequest::new(
            game_id,
            "alice".to_string(),
            "draw-1",
            Action::DrawStock,
        ))
        .unwrap();
    assert!(matches!(response.events[0], GameEvent::Reshuffle { recycled: 13 }));
    assert!(matches!(response.events[1], GameEvent::Draw { .. }));

    let game = engine.game(&game_id).unwrap();
    assert_eq!(game.discard, vec![top]);
    assert_eq!(game.stock.len(), 12);
    assert_eq!(game.player(&"alice".to_string()).unwrap().hand.len(), 48);
    assert_eq!(integrity::check(&game), vec![]);
}

/// Four players, two simultaneous eliminations, then the match ends
/// when a third player crosses the threshold.
#[test]
fn test_elimination_cascade() {
    let mut game = rig(
        &["c", "d", "a", "b"],
        &[
            // 14 points
            vec![n(Suit::Spades, Rank::Ten), n(Suit::Spades, Rank::Four)],
            vec![n(Suit::Clubs, Rank::Two)],
            // 18 points
            vec![n(Suit::Diamonds, Rank::Ten), n(Suit::Diamonds, Rank::Eight)],
            // 5 points
            vec![n(Suit::Clubs, Rank::Five)],
        ],
        Config::default(),
    );
    for (id, score) in [("c", 90u32), ("d", 95), ("a", 85), ("b", 40)] {
        let seat = game.seat_of(&id.to_string()).unwrap();
        game.players[seat].score = score;
    }
    game.players[1].has_opened = true;
    game.first_round_complete = true;
    game.phase = TurnPhase::AwaitPlay;

    let engine = Engine::new(MemoryRepository::new());
    let game_id = game.id;
    engine.repo().put_game(&game_id, &game, None).unwrap();

    let response = engine
        .process(&ActionRequest::new(
            game_id,
            "d".to_string(),
            "close-hand-1",
            Action::Discard(n(Suit::Clubs, Rank::Two)),
        ))
        .unwrap();

    let eliminations: Vec<(&String, &u32)> = response
        .events
        .iter()
        .filter_map(|e| match e {
            GameEvent::Elimination { player, score } => Some((player, score)),
            _ => None,
        })
        .collect();
    assert_eq!(eliminations.len(), 2);
    assert!(eliminations.contains(&(&"a".to_string(), &103)));
    assert!(eliminations.contains(&(&"c".to_string(), &104)));
    assert!(!response
        .events
        .iter()
        .any(|e| matches!(e, GameEvent::MatchEnd { .. })));

    // the match went on with b and d
    let game = engine.game(&game_id).unwrap();
    assert_eq!(game.status, MatchStatus::Playing);
    assert_eq!(game.active_count(), 2);
    assert_eq!(game.hand_number, 2);

    // next hand: d closes again and b crosses the line
    let (mut game, version) = engine.repo().get_game(&game_id).unwrap();
    let d = game.seat_of(&"d".to_string()).unwrap();
    let b = game.seat_of(&"b".to_string()).unwrap();
    game.current = "d".to_string();
    game.phase = TurnPhase::AwaitPlay;
    game.first_round_complete = true;
    game.players[d].hand = vec![n(Suit::Clubs, Rank::Three)];
    game.players[d].has_opened = true;
    game.players[b].score = 98;
    game.players[b].hand = vec![n(Suit::Hearts, Rank::Nine)];
    engine.repo().put_game(&game_id, &game, Some(&version)).unwrap();

    let response = engine
        .process(&ActionRequest::new(
            game_id,
            "d".to_string(),
            "close-hand-2",
            Action::Discard(n(Suit::Clubs, Rank::Three)),
        ))
        .unwrap();
    assert!(response
        .events
        .iter()
        .any(|e| matches!(e, GameEvent::Elimination { player, score } if player == "b" && *score == 107)));
    assert!(response
        .events
        .iter()
        .any(|e| matches!(e, GameEvent::MatchEnd { winner } if winner == "d")));
    let game = engine.game(&game_id).unwrap();
    assert_eq!(game.status, MatchStatus::Finished);
    assert_eq!(game.winner.as_deref(), Some("d"));
}

/// The discard-drawn card has to leave the hand through a play, and
/// only a declared duplicate lets it go straight back to the pile.
#[test]
fn test_picked_card_obligations() {
    let seven = n(Suit::Diamonds, Rank::Seven);
    let mut config = Config::default();
    config.open_with_discard = true;
    let mut game = rig(
        &["bo", "ann"],
        &[
            vec![n(Suit::Spades, Rank::Two), n(Suit::Spades, Rank::Four)],
            vec![
                seven.twin(),
                n(Suit::Hearts, Rank::Two),
                n(Suit::Clubs, Rank::Four),
            ],
        ],
        config,
    );
    stack_discard(&mut game, &seven);

    act(&mut game, "ann", Action::DrawDiscard);
    assert_eq!(game.scratch.picked_from_discard, Some(seven));

    // a different discard strands the picked card
    assert_eq!(
        game.handle_action(
            &"ann".to_string(),
            Action::Discard(n(Suit::Hearts, Rank::Two)),
            false
        ),
        Err(GameError::PickedCardMustBePlayed)
    );
    // the picked card itself needs the declared duplicate
    assert_eq!(
        game.handle_action(&"ann".to_string(), Action::Discard(seven), false),
        Err(GameError::DiscardIsPickedUpCard)
    );
    let events = game
        .handle_action(&"ann".to_string(), Action::Discard(seven), true)
        .unwrap();
    assert!(matches!(events[0], GameEvent::Discard { .. }));
    assert_eq!(game.current, "bo");
}

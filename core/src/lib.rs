//! Rules engine for Scala 40, the Italian rummy variant: 108 cards,
//! 2 to 4 players, a 40-point opening, and a match that runs until one
//! player stands below the elimination threshold.
//!
//! The crate splits into the pure rules core (cards, melds, scoring,
//! the turn state machine, integrity checks) and the coordination
//! shell around it (repository contract with optimistic concurrency,
//! action engine, lobby manager, state codec). All rule code is
//! synchronous and side-effect free; the only blocking points are
//! repository reads and writes.

pub mod action;
pub mod bot;
pub mod card;
#[cfg(feature = "serde")]
pub mod codec;
pub mod config;
pub mod deck;
pub mod engine;
pub mod error;
pub mod event;
pub mod game;
pub mod integrity;
pub mod lobby;
pub mod meld;
pub mod player;
pub mod repo;
pub mod rng;
pub mod score;
pub mod turn;
pub mod view;

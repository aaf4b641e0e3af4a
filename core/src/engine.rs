//! The request/response boundary: read the game document, apply one
//! action, commit with optimistic concurrency.
//!
//! Per game id the engine is logically single-threaded: two concurrent
//! handlers both proceed, the first conditional write wins, the loser
//! rereads and retries. Commit order, not arrival order, is the game
//! history. All in-handler state is local and discarded on return; the
//! store is the sole source of truth.

use crate::action::Action;
use crate::config::Config;
use crate::error::{EngineError, RepoError};
use crate::event::GameEvent;
use crate::game::{AppliedAction, Game, GameId};
use crate::integrity;
use crate::player::PlayerId;
use crate::repo::{Repository, User};
use crate::rng::GameRng;
use crate::turn::TurnPhase;
use crate::view::{PrivateView, PublicView};
use std::time::{Duration, Instant};

/// Conflict retries after the initial attempt.
pub const MAX_RETRIES: u32 = 3;
/// Backoff before retry `n` is `RETRY_BASE_DELAY * 2^n`.
pub const RETRY_BASE_DELAY: Duration = Duration::from_millis(20);

/// One action against one game, as delivered by the transport.
#[derive(Debug, Clone)]
pub struct ActionRequest {
    pub game_id: GameId,
    pub player_id: PlayerId,
    /// Client-supplied idempotency token, e.g. the external callback
    /// id. A redelivery with a known nonce returns the stored result.
    pub nonce: String,
    pub action: Action,
    pub declare_duplicate: bool,
    pub deadline: Option<Instant>,
}

impl ActionRequest {
    pub fn new(
        game_id: GameId,
        player_id: impl Into<PlayerId>,
        nonce: impl Into<String>,
        action: Action,
    ) -> Self {
        Self {
            game_id,
            player_id: player_id.into(),
            nonce: nonce.into(),
            action,
            declare_duplicate: false,
            deadline: None,
        }
    }

    pub fn declaring_duplicate(mut self) -> Self {
        self.declare_duplicate = true;
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    fn expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionResponse {
    pub phase: TurnPhase,
    pub public: PublicView,
    pub private: PrivateView,
    pub events: Vec<GameEvent>,
}

/// Wire shape of a failed request.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorBody {
    pub kind: String,
    pub detail: String,
}

impl From<&EngineError> for ErrorBody {
    fn from(err: &EngineError) -> Self {
        Self {
            kind: err.kind().to_string(),
            detail: err.to_string(),
        }
    }
}

pub struct Engine<R: Repository> {
    repo: R,
}

impl<R: Repository> Engine<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Deal a fresh match and persist it. Without an explicit seed the
    /// game takes one from the secure source and proceeds
    /// deterministically from there.
    pub fn create_game(
        &self,
        players: &[PlayerId],
        config: Config,
        seed: Option<u64>,
    ) -> Result<(GameId, Vec<GameEvent>), EngineError> {
        let seed = seed.unwrap_or_else(|| GameRng::secure().next_seed());
        let (game, events) = Game::create(players, config, seed)?;
        self.repo.put_game(&game.id, &game, None)?;
        Ok((game.id, events))
    }

    pub fn game(&self, id: &GameId) -> Result<Game, EngineError> {
        Ok(self.repo.get_game(id)?.0)
    }

    /// Apply one request end to end: read, short-circuit duplicates,
    /// validate, conditional write, retry on conflict.
    pub fn process(&self, request: &ActionRequest) -> Result<ActionResponse, EngineError> {
        for attempt in 0..=MAX_RETRIES {
            if request.expired() {
                return Err(EngineError::DeadlineExceeded);
            }
            let (mut game, version) = self.repo.get_game(&request.game_id)?;
            if game.config.check_integrity {
                let violations = integrity::check(&game);
                if !violations.is_empty() {
                    let detail = violations
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join("; ");
                    return Err(EngineError::CorruptState(detail));
                }
            }

            if let Some(last) = &game.last_applied {
                if last.nonce == request.nonce {
                    tracing::debug!(
                        game = %game.id,
                        nonce = %request.nonce,
                        "duplicate delivery short-circuited"
                    );
                    let events = last.events.clone();
                    return Ok(Self::respond(&game, &request.player_id, events));
                }
            }

            let events = match game.handle_action(
                &request.player_id,
                request.action.clone(),
                request.declare_duplicate,
            ) {
                Ok(events) => events,
                Err(err) => {
                    let event = GameEvent::InvalidAction {
                        player: request.player_id.clone(),
                        kind: err.kind().to_string(),
                    };
                    tracing::debug!(target: "scala40::events", game = %game.id, %event);
                    return Err(err.into());
                }
            };
            game.last_applied = Some(AppliedAction {
                nonce: request.nonce.clone(),
                events: events.clone(),
                phase: game.phase,
            });

            if request.expired() {
                return Err(EngineError::DeadlineExceeded);
            }
            match self.repo.put_game(&request.game_id, &game, Some(&version)) {
                Ok(_) => {
                    self.record_match_end(&game, &events);
                    return Ok(Self::respond(&game, &request.player_id, events));
                }
                Err(RepoError::VersionConflict) => {
                    if attempt == MAX_RETRIES {
                        break;
                    }
                    let backoff = RETRY_BASE_DELAY * 2u32.pow(attempt);
                    tracing::debug!(
                        game = %request.game_id,
                        attempt,
                        ?backoff,
                        "version conflict, retrying"
                    );
                    std::thread::sleep(backoff);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(EngineError::StaleState)
    }

    fn respond(game: &Game, player: &PlayerId, events: Vec<GameEvent>) -> ActionResponse {
        ActionResponse {
            phase: game.phase,
            public: PublicView::of(game),
            private: PrivateView::of(game, player),
            events,
        }
    }

    /// On a committed match end, bump the per-user match counters.
    /// Best effort: a lost race here never fails the action.
    fn record_match_end(&self, game: &Game, events: &[GameEvent]) {
        let winner = events.iter().find_map(|e| match e {
            GameEvent::MatchEnd { winner } => Some(winner.clone()),
            _ => None,
        });
        let Some(winner) = winner else { return };
        for player in &game.players {
            let won = player.id == winner;
            let result = match self.repo.get_user(&player.id) {
                Ok((mut user, version)) => {
                    user.matches_played += 1;
                    user.matches_won += u32::from(won);
                    self.repo.put_user(&player.id, &user, Some(&version)).map(|_| ())
                }
                Err(RepoError::NotFound) => {
                    let mut user = User::new(player.id.clone(), player.id.clone());
                    user.matches_played = 1;
                    user.matches_won = u32::from(won);
                    self.repo.put_user(&player.id, &user, None).map(|_| ())
                }
                Err(err) => Err(err),
            };
            if let Err(err) = result {
                tracing::debug!(user = %player.id, %err, "match counter update skipped");
            }
        }
    }
}

//! Lobby lifecycle: a rendezvous code, ready flags, and the handoff
//! that turns a full lobby into a live game document.

use crate::config::Config;
use crate::error::{LobbyError, RepoError};
use crate::event::GameEvent;
use crate::game::{Game, GameId};
use crate::player::PlayerId;
use crate::repo::{Repository, User};
use crate::rng::GameRng;
use std::time::{SystemTime, UNIX_EPOCH};

pub const LOBBY_CAPACITY: usize = 4;
const DEFAULT_TTL_SECS: u64 = 60 * 60;
const WRITE_RETRIES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LobbyStatus {
    #[strum(serialize = "waiting")]
    Waiting,
    #[strum(serialize = "starting")]
    Starting,
    #[strum(serialize = "in_game")]
    InGame,
    #[strum(serialize = "closed")]
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LobbyPlayer {
    pub id: PlayerId,
    pub name: String,
    pub ready: bool,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Lobby {
    /// Six characters from the unambiguous alphabet; the rendezvous key.
    pub code: String,
    pub host: PlayerId,
    /// Chat the lobby was opened from; opaque to the engine.
    pub chat_id: String,
    /// Join order; becomes the seating order on start.
    pub players: Vec<LobbyPlayer>,
    pub status: LobbyStatus,
    pub settings: Config,
    /// Seconds since the epoch at creation.
    pub created_at: u64,
    pub ttl_secs: u64,
    pub game_id: Option<GameId>,
}

impl Lobby {
    pub fn is_expired(&self, now_epoch_secs: u64) -> bool {
        now_epoch_secs >= self.created_at + self.ttl_secs
    }

    fn seat_of(&self, player: &PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == *player)
    }
}

fn epoch_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn store_err(err: RepoError) -> LobbyError {
    match err {
        RepoError::NotFound => LobbyError::NotFound,
        RepoError::VersionConflict => LobbyError::Stale,
        RepoError::Unavailable(detail) => LobbyError::Unavailable(detail),
    }
}

/// Lobby operations over the repository, with the same
/// optimistic-concurrency retry discipline as the engine.
pub struct LobbyManager<'a, R: Repository> {
    repo: &'a R,
}

impl<'a, R: Repository> LobbyManager<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    /// Open a lobby and return it. Code collisions are resolved by
    /// regenerating; the must-not-exist write makes the race harmless.
    pub fn create(
        &self,
        host: PlayerId,
        host_name: &str,
        chat_id: &str,
        settings: Config,
    ) -> Result<Lobby, LobbyError> {
        let mut rng = GameRng::secure();
        for _ in 0..WRITE_RETRIES {
            let lobby = Lobby {
                code: rng.lobby_code(),
                host: host.clone(),
                chat_id: chat_id.to_string(),
                players: vec![LobbyPlayer {
                    id: host.clone(),
                    name: host_name.to_string(),
                    ready: false,
                }],
                status: LobbyStatus::Waiting,
                settings: settings.clone(),
                created_at: epoch_now(),
                ttl_secs: DEFAULT_TTL_SECS,
                game_id: None,
            };
            match self.repo.put_lobby(&lobby.code, &lobby, None) {
                Ok(_) => {
                    self.upsert_user(&host, host_name);
                    return Ok(lobby);
                }
                Err(RepoError::VersionConflict) => continue,
                Err(err) => return Err(store_err(err)),
            }
        }
        Err(LobbyError::Stale)
    }

    pub fn join(&self, code: &str, player: PlayerId, name: &str) -> Result<Lobby, LobbyError> {
        let lobby = self.mutate(code, |lobby| {
            match lobby.status {
                LobbyStatus::Waiting => {}
                LobbyStatus::Starting | LobbyStatus::InGame => return Err(LobbyError::InGame),
                LobbyStatus::Closed => return Err(LobbyError::Closed),
            }
            if lobby.players.len() >= LOBBY_CAPACITY {
                return Err(LobbyError::Full);
            }
            if lobby.seat_of(&player).is_some() {
                return Err(LobbyError::AlreadyJoined);
            }
            lobby.players.push(LobbyPlayer {
                id: player.clone(),
                name: name.to_string(),
                ready: false,
            });
            Ok(())
        })?;
        self.upsert_user(&player, name);
        Ok(lobby)
    }

    /// Remove a player. A departing host hands the lobby to the next
    /// seat; the last player out closes it.
    pub fn leave(&self, code: &str, player: PlayerId) -> Result<Lobby, LobbyError> {
        self.mutate(code, |lobby| {
            let seat = lobby.seat_of(&player).ok_or(LobbyError::NotJoined)?;
            lobby.players.remove(seat);
            if lobby.players.is_empty() {
                lobby.status = LobbyStatus::Closed;
            } else if lobby.host == player {
                lobby.host = lobby.players[0].id.clone();
            }
            Ok(())
        })
    }

    pub fn toggle_ready(&self, code: &str, player: PlayerId) -> Result<Lobby, LobbyError> {
        self.mutate(code, |lobby| {
            if lobby.status != LobbyStatus::Waiting {
                return Err(LobbyError::Closed);
            }
            let seat = lobby.seat_of(&player).ok_or(LobbyError::NotJoined)?;
            lobby.players[seat].ready = !lobby.players[seat].ready;
            Ok(())
        })
    }

    /// Host-only: claim the lobby, create the game document and hand
    /// back the new game id with its opening events.
    pub fn start(
        &self,
        code: &str,
        caller: &PlayerId,
    ) -> Result<(Lobby, GameId, Vec<GameEvent>), LobbyError> {
        let claimed = self.mutate(code, |lobby| {
            if lobby.host != *caller {
                return Err(LobbyError::NotHost);
            }
            match lobby.status {
                LobbyStatus::Waiting => {}
                LobbyStatus::Starting | LobbyStatus::InGame => return Err(LobbyError::InGame),
                LobbyStatus::Closed => return Err(LobbyError::Closed),
            }
            if lobby.players.len() < 2 {
                return Err(LobbyError::TooFewPlayers);
            }
            if !lobby.players.iter().all(|p| p.ready) {
                return Err(LobbyError::NotAllReady);
            }
            lobby.status = LobbyStatus::Starting;
            Ok(())
        })?;

        let ids: Vec<PlayerId> = claimed.players.iter().map(|p| p.id.clone()).collect();
        let seed = GameRng::secure().next_seed();
        let (game, events) = Game::create(&ids, claimed.settings.clone(), seed)
            .map_err(|err| LobbyError::Unavailable(format!("game creation failed: {err}")))?;
        self.repo
            .put_game(&game.id, &game, None)
            .map_err(store_err)?;

        let lobby = self.mutate(code, |lobby| {
            lobby.status = LobbyStatus::InGame;
            lobby.game_id = Some(game.id);
            Ok(())
        })?;
        Ok((lobby, game.id, events))
    }

    /// Read-modify-write with conflict retries. The closure sees the
    /// freshly read document on every attempt.
    fn mutate<F>(&self, code: &str, mut apply: F) -> Result<Lobby, LobbyError>
    where
        F: FnMut(&mut Lobby) -> Result<(), LobbyError>,
    {
        for _ in 0..=WRITE_RETRIES {
            let (mut lobby, version) = self.repo.get_lobby(code).map_err(store_err)?;
            if lobby.status != LobbyStatus::Closed && lobby.is_expired(epoch_now()) {
                lobby.status = LobbyStatus::Closed;
            }
            apply(&mut lobby)?;
            match self.repo.put_lobby(code, &lobby, Some(&version)) {
                Ok(_) => return Ok(lobby),
                Err(RepoError::VersionConflict) => continue,
                Err(err) => return Err(store_err(err)),
            }
        }
        Err(LobbyError::Stale)
    }

    /// Keep the user document fresh; never fatal.
    fn upsert_user(&self, id: &PlayerId, name: &str) {
        let result = match self.repo.get_user(id) {
            Ok((mut user, version)) => {
                if user.name == name {
                    return;
                }
                user.name = name.to_string();
                self.repo.put_user(id, &user, Some(&version)).map(|_| ())
            }
            Err(RepoError::NotFound) => self
                .repo
                .put_user(id, &User::new(id.clone(), name), None)
                .map(|_| ()),
            Err(err) => Err(err),
        };
        if let Err(err) = result {
            tracing::debug!(user = %id, %err, "user upsert skipped");
        }
    }
}

//! Persistence contract with optimistic concurrency, plus the
//! in-memory reference implementation.
//!
//! Three resources: games, lobbies, users. Every document carries an
//! opaque version token; a write names the version it read and fails
//! with `VersionConflict` when the store has moved on. A write with no
//! expected version means "must not exist". The production
//! implementation maps these onto a conditional-write database
//! primitive; the in-memory one counts versions monotonically.

use crate::error::RepoError;
use crate::game::{Game, GameId};
use crate::lobby::Lobby;
use indexmap::IndexMap;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::SystemTime;

/// Opaque version token. Values only ever come from the store; callers
/// hand them back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version(u64);

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A user document: long-lived identity bookkeeping across matches.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct User {
    pub id: String,
    pub name: String,
    pub matches_played: u32,
    pub matches_won: u32,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            matches_played: 0,
            matches_won: 0,
        }
    }
}

pub trait GameStore {
    fn get_game(&self, id: &GameId) -> Result<(Game, Version), RepoError>;
    fn put_game(
        &self,
        id: &GameId,
        game: &Game,
        expected: Option<&Version>,
    ) -> Result<Version, RepoError>;
    fn delete_game(&self, id: &GameId, expected: &Version) -> Result<(), RepoError>;
}

pub trait LobbyStore {
    fn get_lobby(&self, code: &str) -> Result<(Lobby, Version), RepoError>;
    fn put_lobby(
        &self,
        code: &str,
        lobby: &Lobby,
        expected: Option<&Version>,
    ) -> Result<Version, RepoError>;
    fn delete_lobby(&self, code: &str, expected: &Version) -> Result<(), RepoError>;
}

pub trait UserStore {
    fn get_user(&self, id: &str) -> Result<(User, Version), RepoError>;
    fn put_user(
        &self,
        id: &str,
        user: &User,
        expected: Option<&Version>,
    ) -> Result<Version, RepoError>;
    fn delete_user(&self, id: &str, expected: &Version) -> Result<(), RepoError>;
}

/// The full persistence surface the engine and lobby manager write
/// through.
pub trait Repository: GameStore + LobbyStore + UserStore + Send + Sync {}

impl<T: GameStore + LobbyStore + UserStore + Send + Sync> Repository for T {}

#[derive(Debug, Clone)]
struct Record<T> {
    doc: T,
    version: Version,
    updated_at: SystemTime,
}

/// Reference implementation backed by per-resource maps behind
/// mutexes. Iteration order is insertion order, which keeps tests and
/// the simulation driver deterministic.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    counter: AtomicU64,
    games: Mutex<IndexMap<GameId, Record<Game>>>,
    lobbies: Mutex<IndexMap<String, Record<Lobby>>>,
    users: Mutex<IndexMap<String, Record<User>>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_version(&self) -> Version {
        Version(self.counter.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn get_from<K, T>(map: &Mutex<IndexMap<K, Record<T>>>, key: &K) -> Result<(T, Version), RepoError>
    where
        K: Hash + Eq,
        T: Clone,
    {
        let map = map
            .lock()
            .map_err(|_| RepoError::Unavailable("poisoned store lock".into()))?;
        let record = map.get(key).ok_or(RepoError::NotFound)?;
        Ok((record.doc.clone(), record.version.clone()))
    }

    fn put_into<K, T>(
        &self,
        map: &Mutex<IndexMap<K, Record<T>>>,
        key: K,
        doc: T,
        expected: Option<&Version>,
    ) -> Result<Version, RepoError>
    where
        K: Hash + Eq,
        T: Clone,
    {
        let mut map = map
            .lock()
            .map_err(|_| RepoError::Unavailable("poisoned store lock".into()))?;
        match (map.get(&key), expected) {
            (Some(_), None) => return Err(RepoError::VersionConflict),
            (None, Some(_)) => return Err(RepoError::NotFound),
            (Some(record), Some(version)) if record.version != *version => {
                return Err(RepoError::VersionConflict)
            }
            _ => {}
        }
        let version = self.next_version();
        map.insert(
            key,
            Record {
                doc,
                version: version.clone(),
                updated_at: SystemTime::now(),
            },
        );
        Ok(version)
    }

    fn delete_from<K, T>(
        map: &Mutex<IndexMap<K, Record<T>>>,
        key: &K,
        expected: &Version,
    ) -> Result<(), RepoError>
    where
        K: Hash + Eq,
    {
        let mut map = map
            .lock()
            .map_err(|_| RepoError::Unavailable("poisoned store lock".into()))?;
        match map.get(key) {
            None => Err(RepoError::NotFound),
            Some(record) if record.version != *expected => Err(RepoError::VersionConflict),
            Some(_) => {
                map.shift_remove(key);
                Ok(())
            }
        }
    }
}

impl GameStore for MemoryRepository {
    fn get_game(&self, id: &GameId) -> Result<(Game, Version), RepoError> {
        Self::get_from(&self.games, id)
    }

    fn put_game(
        &self,
        id: &GameId,
        game: &Game,
        expected: Option<&Version>,
    ) -> Result<Version, RepoError> {
        self.put_into(&self.games, *id, game.clone(), expected)
    }

    fn delete_game(&self, id: &GameId, expected: &Version) -> Result<(), RepoError> {
        Self::delete_from(&self.games, id, expected)
    }
}

impl LobbyStore for MemoryRepository {
    fn get_lobby(&self, code: &str) -> Result<(Lobby, Version), RepoError> {
        Self::get_from(&self.lobbies, &code.to_string())
    }

    fn put_lobby(
        &self,
        code: &str,
        lobby: &Lobby,
        expected: Option<&Version>,
    ) -> Result<Version, RepoError> {
        self.put_into(&self.lobbies, code.to_string(), lobby.clone(), expected)
    }

    fn delete_lobby(&self, code: &str, expected: &Version) -> Result<(), RepoError> {
        Self::delete_from(&self.lobbies, &code.to_string(), expected)
    }
}

impl UserStore for MemoryRepository {
    fn get_user(&self, id: &str) -> Result<(User, Version), RepoError> {
        Self::get_from(&self.users, &id.to_string())
    }

    fn put_user(
        &self,
        id: &str,
        user: &User,
        expected: Option<&Version>,
    ) -> Result<Version, RepoError> {
        self.put_into(&self.users, id.to_string(), user.clone(), expected)
    }

    fn delete_user(&self, id: &str, expected: &Version) -> Result<(), RepoError> {
        Self::delete_from(&self.users, &id.to_string(), expected)
    }
}

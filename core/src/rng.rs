//! RNG sources for shuffling and lobby codes.
//!
//! Two modes behind one interface: a cryptographically secure source for
//! production shuffles and lobby-code generation, and a seeded
//! deterministic source for tests, simulation and reproducible debugging.
//! Given the same seed the deterministic source replays the exact same
//! stream.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Lobby-code alphabet: unambiguous subset of alphanumerics, with
/// `0/O` and `1/I/L` removed.
pub const LOBBY_CODE_ALPHABET: &[u8] = b"23456789ABCDEFGHJKMNPQRSTUVWXYZ";

/// Length of a lobby code.
pub const LOBBY_CODE_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RngMode {
    /// Seeded deterministic stream for tests and simulation.
    Seeded(u64),
    /// Cryptographically secure stream for production games.
    Secure,
}

/// A shuffle/draw source. Construction picks the backing generator;
/// both answer the same two questions: an integer below `n`, and an
/// in-place Fisher-Yates shuffle.
#[derive(Debug, Clone)]
pub struct GameRng {
    mode: RngMode,
    seeded: Option<StdRng>,
    secure: Option<ChaCha20Rng>,
}

impl GameRng {
    pub fn seeded(seed: u64) -> Self {
        Self {
            mode: RngMode::Seeded(seed),
            seeded: Some(StdRng::seed_from_u64(seed)),
            secure: None,
        }
    }

    pub fn secure() -> Self {
        Self {
            mode: RngMode::Secure,
            seeded: None,
            secure: Some(ChaCha20Rng::from_entropy()),
        }
    }

    pub fn mode(&self) -> RngMode {
        self.mode
    }

    pub fn seed(&self) -> Option<u64> {
        match self.mode {
            RngMode::Seeded(seed) => Some(seed),
            RngMode::Secure => None,
        }
    }

    /// Uniform integer in `0..n`. `n` must be non-zero.
    pub fn uniform_int(&mut self, n: usize) -> usize {
        match self.mode {
            RngMode::Seeded(_) => self.seeded.as_mut().expect("seeded rng").gen_range(0..n),
            RngMode::Secure => self.secure.as_mut().expect("secure rng").gen_range(0..n),
        }
    }

    /// Fisher-Yates over the whole slice.
    pub fn shuffle_in_place<T>(&mut self, seq: &mut [T]) {
        for i in (1..seq.len()).rev() {
            let j = self.uniform_int(i + 1);
            seq.swap(i, j);
        }
    }

    /// Fresh u64 from the stream, used to seed a new game from the
    /// secure source before the game proceeds deterministically.
    pub fn next_seed(&mut self) -> u64 {
        match self.mode {
            RngMode::Seeded(_) => self.seeded.as_mut().expect("seeded rng").next_u64(),
            RngMode::Secure => self.secure.as_mut().expect("secure rng").next_u64(),
        }
    }

    /// A 6-character lobby code from the unambiguous alphabet.
    pub fn lobby_code(&mut self) -> String {
        (0..LOBBY_CODE_LEN)
            .map(|_| LOBBY_CODE_ALPHABET[self.uniform_int(LOBBY_CODE_ALPHABET.len())] as char)
            .collect()
    }
}

/// Sub-seed for the `cursor`-th shuffle of a game. Every
/// non-deterministic step consumes one cursor position from the game's
/// recorded seed, so a replay of the action history reproduces every
/// shuffle bit for bit.
pub fn derive_seed(game_seed: u64, cursor: u64) -> u64 {
    // splitmix64 finalizer over seed + cursor step
    let mut z = game_seed.wrapping_add(cursor.wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

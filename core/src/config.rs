const DEFAULT_OPENING_POINTS: u32 = 40;
const DEFAULT_ELIMINATION_SCORE: u32 = 101;
const DEFAULT_HAND_SIZE: usize = 13;
const DEFAULT_TURN_TIMEOUT_SECS: u64 = 300;
const DEFAULT_NEVER_ACTED_PENALTY: u32 = 100;

/// Per-game settings. The variant booleans are the flags recognised at
/// the engine boundary; lobbies carry a copy and hand it to the game on
/// start.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Minimum meld total for a player's opening.
    pub opening_points: u32,
    /// Cumulative score at which a player is eliminated (101 or 201
    /// recommended).
    pub elimination_score: u32,
    /// Cards dealt to each player at hand start.
    pub hand_size: usize,
    /// Inactivity window before an external timer may substitute an
    /// auto-play action. The timer itself lives outside the engine.
    pub turn_timeout_secs: u64,
    /// Allow drawing from the discard pile before opening, provided the
    /// picked card is part of the opening laid in the same turn.
    pub open_with_discard: bool,
    /// Double opponents' hand scores when the closer lays everything
    /// down in one turn; opponents who never opened pay a fixed penalty.
    pub close_in_hand_bonus: bool,
    /// Fixed penalty for a player who never opened, applied only under
    /// a close-in-hand closure.
    pub never_acted_penalty: u32,
    /// Jokered melds do not count toward the opening threshold unless
    /// the clean melds alone already reach it.
    pub opening_without_joker: bool,
    /// Run the integrity checker after every committed mutation.
    pub check_integrity: bool,
}

impl Config {
    pub fn new() -> Self {
        Self {
            opening_points: DEFAULT_OPENING_POINTS,
            elimination_score: DEFAULT_ELIMINATION_SCORE,
            hand_size: DEFAULT_HAND_SIZE,
            turn_timeout_secs: DEFAULT_TURN_TIMEOUT_SECS,
            open_with_discard: false,
            close_in_hand_bonus: false,
            never_acted_penalty: DEFAULT_NEVER_ACTED_PENALTY,
            opening_without_joker: false,
            check_integrity: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.opening_points, 40);
        assert_eq!(config.elimination_score, 101);
        assert_eq!(config.hand_size, 13);
        assert_eq!(config.turn_timeout_secs, 300);
        assert!(!config.open_with_discard);
        assert!(!config.close_in_hand_bonus);
        assert!(!config.opening_without_joker);
    }
}

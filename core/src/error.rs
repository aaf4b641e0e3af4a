use crate::turn::TurnPhase;
use thiserror::Error;

/// Rejection codes for an invalid meld. Rendered with the stable
/// camel-case names used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MeldCode {
    #[strum(serialize = "tooShort")]
    TooShort,
    #[strum(serialize = "tooLong")]
    TooLong,
    #[strum(serialize = "multipleJokers")]
    MultipleJokers,
    #[strum(serialize = "mixedSuitsInSequence")]
    MixedSuitsInSequence,
    #[strum(serialize = "sameSuitInCombination")]
    SameSuitInCombination,
    #[strum(serialize = "nonConsecutive")]
    NonConsecutive,
    #[strum(serialize = "wrap")]
    Wrap,
    #[strum(serialize = "onlyJokers")]
    OnlyJokers,
    #[strum(serialize = "unknownCard")]
    UnknownCard,
}

/// Rule violations. Returned to the caller without any state mutation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GameError {
    #[error("not your turn")]
    NotYourTurn,
    #[error("action not permitted in phase {0}")]
    WrongPhase(TurnPhase),
    #[error("illegal meld: {code}")]
    IllegalMeld { code: MeldCode },
    #[error("opening totals {points} points, below the required threshold")]
    OpeningBelowThreshold { points: u32 },
    #[error("player has not opened")]
    NotOpened,
    #[error("player has already opened")]
    AlreadyOpened,
    #[error("a withdrawn joker must be used before the turn ends")]
    JokerMustBeUsed,
    #[error("the card taken from the discard pile must be played this turn")]
    PickedCardMustBePlayed,
    #[error("discard would attach to a table meld")]
    DiscardAttachesToTable,
    #[error("cannot discard the card just taken from the discard pile")]
    DiscardIsPickedUpCard,
    #[error("cannot close before the first full round")]
    CannotCloseFirstRound,
    #[error("closing in hand after a partial opening is not allowed")]
    CloseInHandNotAllowed,
    #[error("no cards available")]
    NoCards,
    #[error("draw stock is empty")]
    StockEmpty,
    #[error("a game needs 2 to 4 players, got {0}")]
    PlayerCount(usize),
    #[error("player is not part of this game")]
    UnknownPlayer,
    #[error("no table meld at that position")]
    UnknownMeld,
    #[error("the match is over")]
    MatchOver,
}

impl GameError {
    /// Stable error kind for the action-response wire contract.
    pub fn kind(&self) -> &'static str {
        match self {
            GameError::NotYourTurn => "NotYourTurn",
            GameError::WrongPhase(_) => "WrongPhase",
            GameError::IllegalMeld { .. } => "IllegalMeld",
            GameError::OpeningBelowThreshold { .. } => "OpeningBelowThreshold",
            GameError::NotOpened => "NotOpened",
            GameError::AlreadyOpened => "AlreadyOpened",
            GameError::JokerMustBeUsed => "JokerMustBeUsed",
            GameError::PickedCardMustBePlayed => "PickedCardMustBePlayed",
            GameError::DiscardAttachesToTable => "DiscardAttachesToTable",
            GameError::DiscardIsPickedUpCard => "DiscardIsPickedUpCard",
            GameError::CannotCloseFirstRound => "CannotCloseFirstRound",
            GameError::CloseInHandNotAllowed => "CloseInHandNotAllowed",
            GameError::NoCards => "NoCards",
            GameError::StockEmpty => "StockEmpty",
            GameError::PlayerCount(_) => "PlayerCount",
            GameError::UnknownPlayer => "NotFound",
            GameError::UnknownMeld => "NotFound",
            GameError::MatchOver => "MatchOver",
        }
    }
}

/// Persistence failures. `VersionConflict` is distinct from `NotFound`
/// and from generic unavailability; the retry policy that consumes it
/// lives in the engine, not in callers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RepoError {
    #[error("document not found")]
    NotFound,
    #[error("stored version differs from the expected version")]
    VersionConflict,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Failures surfaced at the engine boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error(transparent)]
    Rule(#[from] GameError),
    #[error("game not found")]
    NotFound,
    #[error("state changed under the request and retries were exhausted")]
    StaleState,
    #[error("deadline exceeded before commit")]
    DeadlineExceeded,
    #[error("integrity violation on load: {0}")]
    CorruptState(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl EngineError {
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Rule(e) => e.kind(),
            EngineError::NotFound => "NotFound",
            EngineError::StaleState => "StaleState",
            EngineError::DeadlineExceeded => "DeadlineExceeded",
            EngineError::CorruptState(_) => "CorruptState",
            EngineError::Unavailable(_) => "Unavailable",
        }
    }
}

impl From<RepoError> for EngineError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => EngineError::NotFound,
            // Callers never see a raw conflict; the engine retries and
            // surfaces StaleState only once retries are exhausted.
            RepoError::VersionConflict => EngineError::StaleState,
            RepoError::Unavailable(detail) => EngineError::Unavailable(detail),
        }
    }
}

/// Lobby lifecycle failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LobbyError {
    #[error("lobby not found")]
    NotFound,
    #[error("lobby is closed")]
    Closed,
    #[error("lobby is full")]
    Full,
    #[error("game already started")]
    InGame,
    #[error("player already joined")]
    AlreadyJoined,
    #[error("player is not in this lobby")]
    NotJoined,
    #[error("only the host can do that")]
    NotHost,
    #[error("at least 2 players are required")]
    TooFewPlayers,
    #[error("not all players are ready")]
    NotAllReady,
    #[error("lobby changed under the request and retries were exhausted")]
    Stale,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

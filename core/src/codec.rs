//! Export and import of complete game state as a stable,
//! self-describing document. Import refuses anything the integrity
//! checker would flag, so a loaded game is always playable.

use crate::game::Game;
use crate::integrity;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bump when the document layout changes; import only accepts versions
/// it knows how to read.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("unsupported schema version {0}")]
    Schema(u32),
    #[error("malformed document: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("corrupt state: {0}")]
    CorruptState(String),
}

/// The exported shape: a schema marker plus every field of the game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDocument {
    pub schema: u32,
    pub game: Game,
}

pub fn export_state(game: &Game) -> StateDocument {
    StateDocument {
        schema: SCHEMA_VERSION,
        game: game.clone(),
    }
}

pub fn export_json(game: &Game) -> Result<String, CodecError> {
    Ok(serde_json::to_string_pretty(&export_state(game))?)
}

/// Validate and unwrap a document: schema check first, then the full
/// integrity pass.
pub fn import_state(document: StateDocument) -> Result<Game, CodecError> {
    if document.schema != SCHEMA_VERSION {
        return Err(CodecError::Schema(document.schema));
    }
    let violations = integrity::check(&document.game);
    if !violations.is_empty() {
        let detail = violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(CodecError::CorruptState(detail));
    }
    Ok(document.game)
}

pub fn import_json(raw: &str) -> Result<Game, CodecError> {
    let document: StateDocument = serde_json::from_str(raw)?;
    import_state(document)
}

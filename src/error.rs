//! Error handling module
//!
//! Defines custom error types for the Lurk server and the response
//! classification handed back to the protocol layer.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the Lurk server
#[derive(Error, Debug)]
pub enum LurkError {
    /// Player record storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Game logic errors
    #[error("Game error: {0}")]
    Game(#[from] GameError),
}

/// Player record storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Invalid player name for storage: {0:?}")]
    InvalidName(String),

    #[error("I/O failure on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed player record {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Game logic errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Player not found: {0}")]
    PlayerNotFound(String),
}

/// Result type alias for Lurk operations
pub type Result<T> = std::result::Result<T, LurkError>;

/// Response classification returned to the protocol layer.
///
/// Validation outcomes are reported with these values rather than errors;
/// the session layer translates them into protocol replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseMessage {
    /// Request accepted
    Fine,
    /// Stat allocation exceeds the remaining budget
    StatsTooHigh,
    /// Request is malformed or not valid in the current state
    IncorrectState,
    /// Name is already logged in
    NameTaken,
    /// First login for this name
    NewPlayer,
    /// Returning player with a saved record
    ReprisingPlayer,
    /// Character died in an earlier session and cannot log in
    DeadPlayer,
}

impl ResponseMessage {
    /// Protocol name of the response
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fine => "FINE",
            Self::StatsTooHigh => "STATS_TOO_HIGH",
            Self::IncorrectState => "INCORRECT_STATE",
            Self::NameTaken => "NAME_TAKEN",
            Self::NewPlayer => "NEW_PLAYER",
            Self::ReprisingPlayer => "REPRISING_PLAYER",
            Self::DeadPlayer => "DEAD_PLAYER",
        }
    }

    /// Whether a login with this response left the player registered
    pub fn is_logged_in(self) -> bool {
        matches!(self, Self::NewPlayer | Self::ReprisingPlayer)
    }
}

impl fmt::Display for ResponseMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<GameError> for ResponseMessage {
    fn from(err: GameError) -> Self {
        match err {
            GameError::PlayerNotFound(_) => ResponseMessage::IncorrectState,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_names() {
        assert_eq!(ResponseMessage::Fine.to_string(), "FINE");
        assert_eq!(ResponseMessage::StatsTooHigh.to_string(), "STATS_TOO_HIGH");
        assert_eq!(ResponseMessage::DeadPlayer.as_str(), "DEAD_PLAYER");
    }

    #[test]
    fn test_login_classification() {
        assert!(ResponseMessage::NewPlayer.is_logged_in());
        assert!(ResponseMessage::ReprisingPlayer.is_logged_in());
        assert!(!ResponseMessage::DeadPlayer.is_logged_in());
        assert!(!ResponseMessage::NameTaken.is_logged_in());
    }

    #[test]
    fn test_game_error_to_response() {
        let response: ResponseMessage = GameError::PlayerNotFound("Trudy".into()).into();
        assert_eq!(response, ResponseMessage::IncorrectState);
    }

    #[test]
    fn test_error_display() {
        let err = GameError::PlayerNotFound("Trudy".to_string());
        assert_eq!(err.to_string(), "Player not found: Trudy");

        let err = StorageError::InvalidName("../etc".to_string());
        assert_eq!(err.to_string(), "Invalid player name for storage: \"../etc\"");

        let err: LurkError = GameError::PlayerNotFound("Trudy".to_string()).into();
        assert_eq!(err.to_string(), "Game error: Player not found: Trudy");
    }
}

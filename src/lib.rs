//! Lurk Game Server Library
//!
//! This library provides the player core of the Lurk game server: character
//! state and rules, on-disk player records, and the registry of logged-in
//! players shared by all session tasks.
//!
//! ## Modules
//!
//! - `config` - Server configuration management
//! - `error` - Error types, result definitions and protocol response codes
//! - `game` - Players, player pool, combat contract and collaborator traits

pub mod config;
pub mod error;
pub mod game;

// Re-export commonly used types
pub use config::ServerConfig;
pub use error::{GameError, LurkError, ResponseMessage, Result};
pub use game::combat::Being;
pub use game::player::{Player, StatKind};
pub use game::pool::PlayerPool;

/// Server version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

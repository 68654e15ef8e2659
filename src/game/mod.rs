//! Game module
//!
//! This module contains the player core of the Lurk server:
//! - Player records on disk (load/save)
//! - Player entities (stats, health, gold, keys, room)
//! - The player pool (login, logout, autosave hook)
//! - Combat capability shared by players and future non-player combatants
//! - Collaborator contracts for the world map and connected sessions

pub mod combat;
pub mod player;
pub mod pool;
pub mod record;
pub mod session;
pub mod world;

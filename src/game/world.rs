//! World module
//!
//! The player core only needs a few things from the map: where new sessions
//! start, and hooks to place a freshly logged-in player and to take a
//! logged-out one off the map. Room topology and movement rules stay behind
//! the [`World`] trait.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::game::player::Player;

/// Room identifier
pub type RoomId = String;

/// Map collaborator consumed by the player pool
pub trait World: Send + Sync {
    /// Room every login starts in
    fn starting_room(&self) -> RoomId;

    /// Place a player that just logged in
    fn spawn_player(&self, player: &Arc<Player>);

    /// Take a logged-out player off the map
    fn despawn_player(&self, name: &str);
}

/// In-memory world with a single spawn room and per-room occupancy
#[derive(Debug)]
pub struct StaticWorld {
    starting_room: RoomId,
    occupants: Mutex<BTreeMap<RoomId, BTreeSet<String>>>,
}

impl StaticWorld {
    pub fn new(starting_room: impl Into<RoomId>) -> Self {
        Self {
            starting_room: starting_room.into(),
            occupants: Mutex::new(BTreeMap::new()),
        }
    }

    /// Names of players currently in `room`, sorted
    pub fn occupants(&self, room: &str) -> Vec<String> {
        self.occupants
            .lock()
            .get(room)
            .map(|names| names.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Rooms with at least one occupant, sorted
    pub fn occupied_rooms(&self) -> Vec<RoomId> {
        self.occupants.lock().keys().cloned().collect()
    }
}

impl World for StaticWorld {
    fn starting_room(&self) -> RoomId {
        self.starting_room.clone()
    }

    fn spawn_player(&self, player: &Arc<Player>) {
        let room = player.current_room();
        let name = player.name().to_string();

        // World lock is released before the player is notified
        let lines = {
            let mut occupants = self.occupants.lock();
            for names in occupants.values_mut() {
                names.remove(&name);
            }
            occupants.retain(|_, names| !names.is_empty());
            let here = occupants.entry(room.clone()).or_default();
            here.insert(name.clone());

            let mut lines = vec![format!("Room: {}", room)];
            lines.extend(
                here.iter()
                    .filter(|other| **other != name)
                    .map(|other| format!("Player: {}", other)),
            );
            lines
        };

        debug!(player = %name, room = %room, "Player spawned");
        player.send_room_info(&lines);
    }

    fn despawn_player(&self, name: &str) {
        let mut occupants = self.occupants.lock();
        for names in occupants.values_mut() {
            names.remove(name);
        }
        occupants.retain(|_, names| !names.is_empty());
        debug!(player = %name, "Player despawned");
    }
}

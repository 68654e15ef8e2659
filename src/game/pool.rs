//! Player pool - the registry of logged-in characters
//!
//! Guarantees at most one live [`Player`] per name and drives login, logout
//! and saving. Every registry operation runs under the registry lock, so a
//! character is registered and placed in the world in one step and is saved
//! and taken off the map in one step. Lock order: registry, then world, then
//! a single player. The world never calls back into the pool.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::error::{GameError, ResponseMessage, Result};
use crate::game::player::{PersistOutcome, Player};
use crate::game::record::RecordStore;
use crate::game::world::World;

/// Registry of players currently in the game
pub struct PlayerPool {
    world: Arc<dyn World>,
    store: RecordStore,
    players: Mutex<BTreeMap<String, Arc<Player>>>,
}

impl PlayerPool {
    pub fn new(world: Arc<dyn World>, store: RecordStore) -> Self {
        Self {
            world,
            store,
            players: Mutex::new(BTreeMap::new()),
        }
    }

    /// Create a pool over the configured player data directory
    pub fn from_config(config: &ServerConfig, world: Arc<dyn World>) -> Result<Self> {
        let store = RecordStore::open(config.player_data_dir())?;
        info!(
            dir = %store.dir().display(),
            starting_room = %world.starting_room(),
            "Player pool ready"
        );
        Ok(Self::new(world, store))
    }

    /// Record store backing the pool
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Log a character in.
    ///
    /// Returns `NEW_PLAYER` or `REPRISING_PLAYER` when the character is now
    /// registered and placed in the world, `DEAD_PLAYER` when it died in an
    /// earlier session, and `NAME_TAKEN` when it is already logged in.
    pub fn login(&self, name: &str) -> ResponseMessage {
        let starting_room = self.world.starting_room();
        let mut players = self.players.lock();

        if players.contains_key(name) {
            warn!(
                player = %name,
                "Session layer tried to load a player that is already in the game"
            );
            return ResponseMessage::NameTaken;
        }

        let response = if self.store.exists(name) {
            ResponseMessage::ReprisingPlayer
        } else {
            ResponseMessage::NewPlayer
        };

        let player = Arc::new(Player::load(name, &self.store, starting_room));
        if player.is_dead() {
            info!(player = %name, "Dead player refused login");
            return ResponseMessage::DeadPlayer;
        }

        players.insert(name.to_string(), player.clone());
        self.world.spawn_player(&player);

        info!(player = %name, response = %response, "Player logged in");
        response
    }

    /// Get a logged-in player by name
    pub fn get(&self, name: &str) -> Option<Arc<Player>> {
        self.players.lock().get(name).cloned()
    }

    /// Save a player, remove it from the game and take it off the map.
    ///
    /// Fails with [`GameError::PlayerNotFound`] if `name` is not logged in.
    pub fn logout(&self, name: &str) -> Result<()> {
        let mut players = self.players.lock();

        let player = players
            .get(name)
            .ok_or_else(|| GameError::PlayerNotFound(name.to_string()))?;

        player.persist();
        players.remove(name);
        self.world.despawn_player(name);

        info!(player = %name, "Player logged out");
        Ok(())
    }

    /// Names of logged-in players except `excluded`, sorted
    pub fn list_online(&self, excluded: &str) -> Vec<String> {
        self.players
            .lock()
            .keys()
            .filter(|name| name.as_str() != excluded)
            .cloned()
            .collect()
    }

    /// Player list for a QUERY reply, one `Player: <name>` line each
    pub fn player_list(&self, excluded: &str) -> String {
        self.list_online(excluded)
            .into_iter()
            .map(|name| format!("Player: {}\n", name))
            .collect()
    }

    /// Check whether a player is logged in
    pub fn is_online(&self, name: &str) -> bool {
        self.players.lock().contains_key(name)
    }

    /// Get the number of logged-in players
    pub fn count(&self) -> usize {
        self.players.lock().len()
    }

    /// Save every logged-in player; the autosave hook.
    ///
    /// Holds the registry lock for the whole pass, so logins and logouts wait
    /// until it finishes. Returns how many records were written.
    pub fn persist_all(&self) -> usize {
        let players = self.players.lock();

        let mut saved = 0;
        let mut failed = 0;
        for player in players.values() {
            match player.persist() {
                PersistOutcome::Saved => saved += 1,
                PersistOutcome::Failed => failed += 1,
                PersistOutcome::Skipped => {}
            }
        }

        info!(
            online = players.len(),
            saved,
            failed,
            "Saved logged-in players"
        );
        saved
    }
}

impl std::fmt::Debug for PlayerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerPool")
            .field("store", &self.store.dir())
            .field("online", &self.count())
            .finish()
    }
}

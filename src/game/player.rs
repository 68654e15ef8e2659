//! Player module
//!
//! Manages a character's state:
//! - Persistent data (description, gold, stat allocation, health, vital status)
//! - Session data (current room, carried keys, session sink)
//! - Stat allocation against the shared budget
//! - Combat capability (see [`crate::game::combat::Being`])
//!
//! Every operation runs under the player's own lock, so no two operations on
//! the same character interleave.

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::error::ResponseMessage;
use crate::game::combat::Being;
use crate::game::record::{PlayerRecord, RecordStore, VitalStatus};
use crate::game::session::SessionSink;
use crate::game::world::RoomId;

/// Points shared between attack, defense and regen
pub const MAX_STAT_POINTS: u32 = 100;

/// Health of a fresh or fully regenerated character
pub const MAX_HEALTH: u32 = 100;

/// Stat a client may set before starting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatKind {
    Description,
    Attack,
    Defense,
    Regen,
}

/// Why a raw stat value was refused
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatParseError {
    #[error("not a number: {0:?}")]
    NotANumber(String),

    #[error("stat value {0} is out of range")]
    OutOfRange(i64),
}

impl From<StatParseError> for ResponseMessage {
    fn from(err: StatParseError) -> Self {
        match err {
            StatParseError::NotANumber(_) => ResponseMessage::IncorrectState,
            StatParseError::OutOfRange(_) => ResponseMessage::StatsTooHigh,
        }
    }
}

/// Parse a stat value the way clients send it: a plain decimal integer
pub fn parse_stat(raw: &str) -> Result<u32, StatParseError> {
    let value: i32 = raw
        .parse()
        .map_err(|_| StatParseError::NotANumber(raw.to_string()))?;
    u32::try_from(value).map_err(|_| StatParseError::OutOfRange(i64::from(value)))
}

/// Result of a save attempt; failures are already logged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    /// Record written
    Saved,
    /// Character not configured yet, storage untouched
    Skipped,
    /// Write failed, in-memory state kept
    Failed,
}

struct PlayerState {
    description: Option<String>,
    gold: u32,
    attack: u32,
    defense: u32,
    regen: u32,
    status: VitalStatus,
    health: u32,
    configured: bool,
    location: RoomId,
    keys: BTreeSet<String>,
    sink: Option<Arc<dyn SessionSink>>,
}

impl PlayerState {
    fn fresh(starting_room: RoomId) -> Self {
        Self {
            description: None,
            gold: 0,
            attack: 0,
            defense: 0,
            regen: 0,
            status: VitalStatus::Alive,
            health: MAX_HEALTH,
            configured: false,
            location: starting_room,
            keys: BTreeSet::new(),
            sink: None,
        }
    }

    fn from_record(record: PlayerRecord, starting_room: RoomId) -> Self {
        Self {
            description: record.description,
            gold: record.gold,
            attack: record.attack,
            defense: record.defense,
            regen: record.regen,
            status: record.vital_status,
            health: record.health,
            configured: record.configured,
            location: starting_room,
            keys: BTreeSet::new(),
            sink: None,
        }
    }

    fn to_record(&self) -> PlayerRecord {
        PlayerRecord {
            description: self.description.clone(),
            gold: self.gold,
            attack: self.attack,
            defense: self.defense,
            regen: self.regen,
            vital_status: self.status,
            health: self.health,
            configured: self.configured,
        }
    }

    fn is_ready(&self) -> bool {
        self.description.is_some() && (self.attack != 0 || self.defense != 0 || self.regen != 0)
    }
}

/// Whether a stored record respects the health cap and the stat budget
pub fn record_within_limits(record: &PlayerRecord) -> bool {
    record.health <= MAX_HEALTH
        && u64::from(record.attack) + u64::from(record.defense) + u64::from(record.regen)
            <= u64::from(MAX_STAT_POINTS)
}

/// A character, live for the duration of one login
pub struct Player {
    name: String,
    store: RecordStore,
    state: Mutex<PlayerState>,
}

impl Player {
    /// Build the character for `name`, from its record when one exists.
    ///
    /// Location always starts at `starting_room` and keys always start
    /// empty. An unreadable record is logged and the character falls back
    /// to defaults.
    pub fn load(name: impl Into<String>, store: &RecordStore, starting_room: RoomId) -> Self {
        let name = name.into();

        let state = match store.load(&name) {
            Ok(Some(record)) if record_within_limits(&record) => {
                debug!(player = %name, "Loaded player record");
                PlayerState::from_record(record, starting_room)
            }
            Ok(Some(record)) => {
                error!(
                    player = %name,
                    health = record.health,
                    attack = record.attack,
                    defense = record.defense,
                    regen = record.regen,
                    "Player record violates stat limits, using defaults"
                );
                PlayerState::fresh(starting_room)
            }
            Ok(None) => PlayerState::fresh(starting_room),
            Err(e) => {
                error!(player = %name, error = %e, "Problem loading the player data file");
                PlayerState::fresh(starting_room)
            }
        };

        Self {
            name,
            store: store.clone(),
            state: Mutex::new(state),
        }
    }

    /// Get the player's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set a stat before starting.
    ///
    /// Numeric stats are checked against what the other two leave of the
    /// budget at the time of the call.
    pub fn set_stat(&self, kind: StatKind, raw: &str) -> ResponseMessage {
        let mut state = self.state.lock();

        let (current_others, slot) = match kind {
            StatKind::Description => {
                state.description = Some(raw.to_string());
                return ResponseMessage::Fine;
            }
            StatKind::Attack => (state.defense + state.regen, &mut state.attack),
            StatKind::Defense => (state.attack + state.regen, &mut state.defense),
            StatKind::Regen => (state.attack + state.defense, &mut state.regen),
        };

        let value = match parse_stat(raw) {
            Ok(value) => value,
            Err(e) => {
                debug!(player = %self.name, ?kind, error = %e, "Rejected stat value");
                return e.into();
            }
        };

        let remaining = MAX_STAT_POINTS.saturating_sub(current_others);
        if value > remaining {
            return ResponseMessage::StatsTooHigh;
        }

        *slot = value;
        ResponseMessage::Fine
    }

    /// Mark the player as started if it has a description and some stats.
    ///
    /// Returns whether the player is started afterwards.
    pub fn try_configure(&self) -> bool {
        let mut state = self.state.lock();
        if state.configured {
            return true;
        }
        if !state.is_ready() {
            return false;
        }
        state.configured = true;
        info!(player = %self.name, "Player started");
        true
    }

    /// Regenerate health for `elapsed_secs` seconds at the player's regen rate
    pub fn regenerate_health(&self, elapsed_secs: u32) {
        let mut state = self.state.lock();
        let gained = u64::from(elapsed_secs) * u64::from(state.regen) / 10;
        let health = (u64::from(state.health) + gained).min(u64::from(MAX_HEALTH));
        state.health = health as u32;
    }

    /// Attack power used against others; dead players deal nothing
    pub fn effective_attack(&self) -> u32 {
        let state = self.state.lock();
        match state.status {
            VitalStatus::Dead => 0,
            VitalStatus::Alive => state.attack,
        }
    }

    /// Take a blow of `incoming` power.
    ///
    /// Only the part above defense hurts. When health hits zero the player
    /// dies and drops all gold, which is returned; otherwise returns 0.
    pub fn apply_damage(&self, incoming: u32) -> u32 {
        let mut state = self.state.lock();

        if incoming > state.defense {
            state.health = state.health.saturating_sub(incoming - state.defense);
        }

        if state.health > 0 {
            return 0;
        }

        let dropped = std::mem::take(&mut state.gold);
        if state.status == VitalStatus::Alive {
            state.status = VitalStatus::Dead;
            info!(player = %self.name, gold_dropped = dropped, "Player died");
        }
        dropped
    }

    /// Add looted gold and push the new status to the session
    pub fn credit_gold(&self, amount: u32) {
        let mut state = self.state.lock();
        state.gold = state.gold.saturating_add(amount);

        match &state.sink {
            Some(sink) => sink.send_status(state.health, amount),
            None => debug!(
                player = %self.name,
                amount,
                "No session attached, status notification dropped"
            ),
        }
    }

    /// Check whether the player carries a key
    pub fn has_key(&self, key: &str) -> bool {
        self.state.lock().keys.contains(key)
    }

    /// Pick up a key; returns false if it was already carried
    pub fn acquire_key(&self, key: impl Into<String>) -> bool {
        self.state.lock().keys.insert(key.into())
    }

    /// Keys carried this session, sorted
    pub fn keys(&self) -> Vec<String> {
        self.state.lock().keys.iter().cloned().collect()
    }

    /// Get the player's room
    pub fn current_room(&self) -> RoomId {
        self.state.lock().location.clone()
    }

    /// Move the player. Whether the move is legal is the world's business.
    pub fn relocate(&self, room: impl Into<RoomId>) {
        self.state.lock().location = room.into();
    }

    /// Connect the session that receives this player's notifications
    pub fn attach_session(&self, sink: Arc<dyn SessionSink>) {
        self.state.lock().sink = Some(sink);
    }

    /// Disconnect the session; returns whether one was attached
    pub fn detach_session(&self) -> bool {
        self.state.lock().sink.take().is_some()
    }

    /// Whether a session is attached
    pub fn has_session(&self) -> bool {
        self.state.lock().sink.is_some()
    }

    /// Forward a room description to the session
    pub fn send_room_info(&self, lines: &[String]) {
        let state = self.state.lock();
        match &state.sink {
            Some(sink) => sink.send_room_info(lines),
            None => debug!(player = %self.name, "No session attached, room info dropped"),
        }
    }

    pub fn is_dead(&self) -> bool {
        self.state.lock().status == VitalStatus::Dead
    }

    pub fn is_configured(&self) -> bool {
        self.state.lock().configured
    }

    pub fn vital_status(&self) -> VitalStatus {
        self.state.lock().status
    }

    pub fn description(&self) -> Option<String> {
        self.state.lock().description.clone()
    }

    pub fn gold(&self) -> u32 {
        self.state.lock().gold
    }

    pub fn attack(&self) -> u32 {
        self.state.lock().attack
    }

    pub fn defense(&self) -> u32 {
        self.state.lock().defense
    }

    pub fn regen(&self) -> u32 {
        self.state.lock().regen
    }

    pub fn health(&self) -> u32 {
        self.state.lock().health
    }

    /// Persistent projection of the current state
    pub fn record(&self) -> PlayerRecord {
        self.state.lock().to_record()
    }

    /// Human-readable summary of every field, for inspection only
    pub fn snapshot(&self) -> String {
        let state = self.state.lock();
        let keys: Vec<&str> = state.keys.iter().map(String::as_str).collect();

        format!(
            "Name: {}\n\
             Description: {}\n\
             Gold: {}\n\
             Attack: {}\n\
             Defense: {}\n\
             Regen: {}\n\
             Status: {}\n\
             Location: {}\n\
             Keys: {}\n\
             Health: {}\n\
             Started: {}",
            self.name,
            state.description.as_deref().unwrap_or("(none)"),
            state.gold,
            state.attack,
            state.defense,
            state.regen,
            state.status,
            state.location,
            keys.join(", "),
            state.health,
            if state.configured { "YES" } else { "NO" },
        )
    }

    /// Save the record if the player has started.
    ///
    /// Never fails the caller: a failed write is logged and the pending
    /// update is lost.
    pub fn persist(&self) -> PersistOutcome {
        let state = self.state.lock();
        if !state.configured {
            debug!(player = %self.name, "Player not started, skipping save");
            return PersistOutcome::Skipped;
        }

        match self.store.save(&self.name, &state.to_record()) {
            Ok(()) => {
                debug!(player = %self.name, "Player data saved");
                PersistOutcome::Saved
            }
            Err(e) => {
                error!(player = %self.name, error = %e, "Player data file failed to save");
                PersistOutcome::Failed
            }
        }
    }
}

impl Being for Player {
    fn name(&self) -> &str {
        Player::name(self)
    }

    fn effective_attack(&self) -> u32 {
        Player::effective_attack(self)
    }

    fn apply_damage(&self, incoming: u32) -> u32 {
        Player::apply_damage(self, incoming)
    }

    fn credit_gold(&self, amount: u32) {
        Player::credit_gold(self, amount)
    }
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Player")
            .field("name", &self.name)
            .field("status", &state.status)
            .field("health", &state.health)
            .field("configured", &state.configured)
            .field("location", &state.location)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::session::{ChannelSink, SessionEvent};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn store() -> (TempDir, RecordStore) {
        let dir = TempDir::new().expect("tempdir");
        let store = RecordStore::open(dir.path()).unwrap();
        (dir, store)
    }

    fn fresh(store: &RecordStore) -> Player {
        Player::load("Trudy", store, "Broom Closet".to_string())
    }

    fn started(store: &RecordStore, attack: &str, defense: &str, regen: &str) -> Player {
        let player = fresh(store);
        assert_eq!(player.set_stat(StatKind::Description, "Hat"), ResponseMessage::Fine);
        assert_eq!(player.set_stat(StatKind::Attack, attack), ResponseMessage::Fine);
        assert_eq!(player.set_stat(StatKind::Defense, defense), ResponseMessage::Fine);
        assert_eq!(player.set_stat(StatKind::Regen, regen), ResponseMessage::Fine);
        assert!(player.try_configure());
        player
    }

    #[test]
    fn test_player_defaults() {
        let (_dir, store) = store();
        let player = fresh(&store);

        assert_eq!(player.name(), "Trudy");
        assert_eq!(player.description(), None);
        assert_eq!(player.gold(), 0);
        assert_eq!(player.health(), MAX_HEALTH);
        assert_eq!(player.vital_status(), VitalStatus::Alive);
        assert!(!player.is_configured());
        assert_eq!(player.current_room(), "Broom Closet");
        assert!(player.keys().is_empty());
        assert!(!player.has_session());
    }

    #[test]
    fn test_parse_stat() {
        assert_eq!(parse_stat("42"), Ok(42));
        assert_eq!(parse_stat("+7"), Ok(7));
        assert_eq!(parse_stat("-1"), Err(StatParseError::OutOfRange(-1)));
        assert!(matches!(parse_stat("ten"), Err(StatParseError::NotANumber(_))));
        assert!(matches!(parse_stat(""), Err(StatParseError::NotANumber(_))));
        assert!(matches!(
            parse_stat("99999999999"),
            Err(StatParseError::NotANumber(_))
        ));
    }

    #[test]
    fn test_set_stat_budget() {
        let (_dir, store) = store();
        let player = fresh(&store);

        assert_eq!(player.set_stat(StatKind::Defense, "30"), ResponseMessage::Fine);
        assert_eq!(player.set_stat(StatKind::Regen, "10"), ResponseMessage::Fine);
        assert_eq!(player.set_stat(StatKind::Attack, "60"), ResponseMessage::Fine);

        // Re-setting attack is checked against the current defense and regen
        assert_eq!(player.set_stat(StatKind::Attack, "61"), ResponseMessage::StatsTooHigh);
        assert_eq!(player.attack(), 60);
        assert_eq!(player.set_stat(StatKind::Attack, "20"), ResponseMessage::Fine);
        assert_eq!(player.set_stat(StatKind::Defense, "70"), ResponseMessage::Fine);
        assert_eq!(player.attack() + player.defense() + player.regen(), 100);
    }

    #[test]
    fn test_set_stat_over_budget_leaves_value() {
        let (_dir, store) = store();
        let player = fresh(&store);
        player.set_stat(StatKind::Attack, "60");
        player.set_stat(StatKind::Defense, "30");
        player.set_stat(StatKind::Regen, "10");

        assert_eq!(player.set_stat(StatKind::Attack, "70"), ResponseMessage::StatsTooHigh);
        assert_eq!(player.attack(), 60);
    }

    #[test]
    fn test_set_stat_bad_input() {
        let (_dir, store) = store();
        let player = fresh(&store);

        assert_eq!(
            player.set_stat(StatKind::Attack, "lots"),
            ResponseMessage::IncorrectState
        );
        assert_eq!(
            player.set_stat(StatKind::Regen, "-5"),
            ResponseMessage::StatsTooHigh
        );
        assert_eq!(player.attack(), 0);
        assert_eq!(player.regen(), 0);
    }

    #[test]
    fn test_description_has_no_bound() {
        let (_dir, store) = store();
        let player = fresh(&store);
        let long = "x".repeat(10_000);

        assert_eq!(player.set_stat(StatKind::Description, &long), ResponseMessage::Fine);
        assert_eq!(player.description().as_deref(), Some(long.as_str()));
        assert_eq!(player.set_stat(StatKind::Description, "Hat"), ResponseMessage::Fine);
        assert_eq!(player.description().as_deref(), Some("Hat"));
    }

    #[test]
    fn test_stat_sum_holds_for_any_sequence() {
        let (_dir, store) = store();
        let player = fresh(&store);
        let kinds = [StatKind::Attack, StatKind::Defense, StatKind::Regen];

        let mut seed: u32 = 12345;
        for _ in 0..500 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12345);
            let kind = kinds[(seed >> 16) as usize % 3];
            let value = (seed >> 8) % 120;
            player.set_stat(kind, &value.to_string());
            assert!(player.attack() + player.defense() + player.regen() <= MAX_STAT_POINTS);
        }
    }

    #[test]
    fn test_try_configure() {
        let (_dir, store) = store();
        let player = fresh(&store);

        assert!(!player.try_configure());
        player.set_stat(StatKind::Description, "Hat");
        assert!(!player.try_configure());
        player.set_stat(StatKind::Regen, "1");
        assert!(player.try_configure());
        assert!(player.is_configured());

        // Stays started even if stats are later zeroed
        player.set_stat(StatKind::Regen, "0");
        assert!(player.try_configure());
        assert!(player.is_configured());
    }

    #[test]
    fn test_regenerate_health() {
        let (_dir, store) = store();
        let player = started(&store, "60", "35", "5");

        player.apply_damage(85);
        assert_eq!(player.health(), 50);

        // 7 seconds at regen 5 is 3.5, truncated
        player.regenerate_health(7);
        assert_eq!(player.health(), 53);

        player.regenerate_health(0);
        assert_eq!(player.health(), 53);

        player.regenerate_health(1_000);
        assert_eq!(player.health(), MAX_HEALTH);
    }

    #[test]
    fn test_apply_damage_below_defense() {
        let (_dir, store) = store();
        let player = started(&store, "60", "30", "10");

        assert_eq!(player.apply_damage(30), 0);
        assert_eq!(player.health(), 100);
        assert_eq!(player.apply_damage(50), 0);
        assert_eq!(player.health(), 80);
    }

    #[test]
    fn test_death_drops_gold_once() {
        let (_dir, store) = store();
        let player = started(&store, "60", "30", "10");
        player.credit_gold(25);

        assert_eq!(player.apply_damage(200), 25);
        assert_eq!(player.health(), 0);
        assert_eq!(player.gold(), 0);
        assert!(player.is_dead());
        assert_eq!(player.effective_attack(), 0);
        assert_eq!(player.attack(), 60);

        assert_eq!(player.apply_damage(200), 0);
        assert_eq!(player.apply_damage(0), 0);
    }

    #[test]
    fn test_health_bounds_for_any_sequence() {
        let (_dir, store) = store();
        let player = started(&store, "40", "20", "40");

        let mut seed: u32 = 99;
        for _ in 0..300 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12345);
            if seed & 1 == 0 {
                player.apply_damage((seed >> 4) % 60);
            } else {
                player.regenerate_health((seed >> 4) % 30);
            }
            assert!(player.health() <= MAX_HEALTH);
        }
    }

    #[test]
    fn test_credit_gold_notifies_session() {
        let (_dir, store) = store();
        let player = started(&store, "60", "30", "10");
        let (sink, mut rx) = ChannelSink::channel(4);
        player.attach_session(Arc::new(sink));

        player.apply_damage(40);
        player.credit_gold(12);

        assert_eq!(player.gold(), 12);
        assert_eq!(
            rx.try_recv().unwrap(),
            SessionEvent::Status {
                health: 90,
                gold_delta: 12
            }
        );
    }

    #[test]
    fn test_credit_gold_without_session() {
        let (_dir, store) = store();
        let player = fresh(&store);

        player.credit_gold(3);
        player.credit_gold(4);
        assert_eq!(player.gold(), 7);
    }

    #[test]
    fn test_detach_session() {
        let (_dir, store) = store();
        let player = fresh(&store);
        let (sink, mut rx) = ChannelSink::channel(4);
        player.attach_session(Arc::new(sink));

        assert!(player.detach_session());
        assert!(!player.detach_session());
        player.send_room_info(&["Room: Broom Closet".to_string()]);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_keys() {
        let (_dir, store) = store();
        let player = fresh(&store);

        assert!(!player.has_key("brass"));
        assert!(player.acquire_key("brass"));
        assert!(!player.acquire_key("brass"));
        assert!(player.has_key("brass"));
        assert_eq!(player.keys(), vec!["brass"]);
    }

    #[test]
    fn test_relocate() {
        let (_dir, store) = store();
        let player = fresh(&store);

        player.relocate("Nowhere In Particular");
        assert_eq!(player.current_room(), "Nowhere In Particular");
    }

    #[test]
    fn test_snapshot() {
        let (_dir, store) = store();
        let player = started(&store, "60", "30", "10");
        player.acquire_key("brass");

        let expected = "Name: Trudy\n\
                        Description: Hat\n\
                        Gold: 0\n\
                        Attack: 60\n\
                        Defense: 30\n\
                        Regen: 10\n\
                        Status: ALIVE\n\
                        Location: Broom Closet\n\
                        Keys: brass\n\
                        Health: 100\n\
                        Started: YES";
        assert_eq!(player.snapshot(), expected);
    }

    #[test]
    fn test_unconfigured_player_never_saved() {
        let (dir, store) = store();
        let player = fresh(&store);
        player.set_stat(StatKind::Description, "Hat");

        assert_eq!(player.persist(), PersistOutcome::Skipped);
        assert!(!store.exists("Trudy"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_persist_round_trip() {
        let (_dir, store) = store();
        let player = started(&store, "60", "30", "10");
        player.credit_gold(17);
        player.apply_damage(45);
        player.acquire_key("brass");
        player.relocate("Great Hall");
        let before = player.record();

        assert_eq!(player.persist(), PersistOutcome::Saved);

        let reloaded = Player::load("Trudy", &store, "Cellar".to_string());
        assert_eq!(reloaded.record(), before);
        assert_eq!(reloaded.current_room(), "Cellar");
        assert!(reloaded.keys().is_empty());
        assert!(reloaded.is_configured());
        assert_eq!(reloaded.health(), 85);
        assert_eq!(reloaded.gold(), 17);
    }

    #[test]
    fn test_persist_failure_is_absorbed() {
        let (dir, store) = store();
        let player = started(&store, "60", "30", "10");
        drop(dir);

        assert_eq!(player.persist(), PersistOutcome::Failed);
        assert_eq!(player.attack(), 60);
    }

    #[test]
    fn test_corrupt_record_falls_back_to_defaults() {
        let (dir, store) = store();
        std::fs::write(dir.path().join("Trudy.pldat"), "garbage").unwrap();

        let player = fresh(&store);
        assert!(!player.is_configured());
        assert_eq!(player.health(), MAX_HEALTH);
    }

    #[test]
    fn test_inconsistent_record_falls_back_to_defaults() {
        let (_dir, store) = store();
        let record = PlayerRecord {
            description: Some("Cheater".to_string()),
            gold: 0,
            attack: 90,
            defense: 90,
            regen: 0,
            vital_status: VitalStatus::Alive,
            health: 100,
            configured: true,
        };
        store.save("Trudy", &record).unwrap();

        let player = fresh(&store);
        assert_eq!(player.attack(), 0);
        assert!(!player.is_configured());
    }
}

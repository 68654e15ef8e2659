//! Combat module
//!
//! [`Being`] is the capability contract for anything that can deal and take
//! damage and pick up loot. Strike resolution only talks to that contract,
//! so monsters or other non-player combatants can join a fight by
//! implementing it.
//!
//! A strike is three separate calls on two entities (read attack, apply
//! damage, credit loot). Each call is atomic for its own entity, the strike
//! as a whole is not: an observer may see the target dead before the striker
//! has been credited.

use rand::Rng;
use tracing::debug;

/// Sides of a d20
pub const D20_SIDES: u32 = 20;

/// Roll on which the blow rebounds onto the striker
pub const FUMBLE_ROLL: u32 = 1;

/// Combat capability contract
pub trait Being: Send + Sync {
    /// Name shown in combat messages
    fn name(&self) -> &str;

    /// Offensive power; zero for anything dead
    fn effective_attack(&self) -> u32;

    /// Take a blow; returns the gold dropped if it was fatal, else 0
    fn apply_damage(&self, incoming: u32) -> u32;

    /// Add looted gold (possibly 0) after dealing damage
    fn credit_gold(&self, amount: u32);
}

/// Roll a d20
pub fn roll_d20() -> u32 {
    rand::thread_rng().gen_range(1..=D20_SIDES)
}

/// Which side of a strike took the blow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrikeTarget {
    Defender,
    /// Fumbled roll, the striker hit itself
    Attacker,
}

/// Result of one strike
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrikeOutcome {
    pub target: StrikeTarget,
    pub roll: u32,
    /// Power of the blow before the target's defense
    pub power: u32,
    /// Gold the target dropped and the other side picked up
    pub gold_looted: u32,
}

impl StrikeOutcome {
    /// Whether the blow rebounded onto the striker
    pub fn fumbled(&self) -> bool {
        self.target == StrikeTarget::Attacker
    }
}

/// Resolve one strike of `attacker` against `defender` with a d20 `roll`.
///
/// The blow lands with the attacker's effective attack plus the roll and the
/// attacker picks up whatever the defender drops. On a fumble the defender's
/// effective attack plus the roll lands on the attacker instead, and the
/// defender picks up the loot.
pub fn resolve_strike(attacker: &dyn Being, defender: &dyn Being, roll: u32) -> StrikeOutcome {
    let (striker, target, side) = if roll == FUMBLE_ROLL {
        (defender, attacker, StrikeTarget::Attacker)
    } else {
        (attacker, defender, StrikeTarget::Defender)
    };

    let power = striker.effective_attack().saturating_add(roll);
    let gold_looted = target.apply_damage(power);
    striker.credit_gold(gold_looted);

    debug!(
        striker = striker.name(),
        target = target.name(),
        roll,
        power,
        gold_looted,
        "Strike resolved"
    );

    StrikeOutcome {
        target: side,
        roll,
        power,
        gold_looted,
    }
}

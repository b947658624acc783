//! Shared simulation types
//!
//! Everything a state needs during one tick travels in a [`TickContext`]:
//! the frame delta, a view of the player, the seeded RNG and the command
//! queue that carries effects back to the world.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::audio::Cue;

/// Stable entity handle (allocation order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// What kind of actor an entity is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorKind {
    Player,
    Sword,
    Enemy,
    Boss,
    Dummy,
    EnemyBullet,
    SwordBullet,
}

/// Player data visible to every other actor during a tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerView {
    pub pos: Vec2,
    /// Mouse cursor in world coordinates
    pub mouse_world: Vec2,
}

/// Projectiles a state may ask the world to create
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Spawn {
    EnemyBullet { pos: Vec2, angle: f32 },
    SwordBullet { pos: Vec2, angle: f32 },
}

/// Deferred effect requested by an actor, applied by the world after the pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Spawn(Spawn),
    Despawn(EntityId),
    Cue(Cue),
}

/// Per-tick context threaded through every state hook
pub struct TickContext<'a> {
    /// Frame delta in seconds
    pub dt: f32,
    pub player: PlayerView,
    pub rng: &'a mut Pcg32,
    pub commands: &'a mut Vec<Command>,
}

impl<'a> TickContext<'a> {
    pub fn new(
        dt: f32,
        player: PlayerView,
        rng: &'a mut Pcg32,
        commands: &'a mut Vec<Command>,
    ) -> Self {
        Self {
            dt,
            player,
            rng,
            commands,
        }
    }

    pub fn spawn(&mut self, spawn: Spawn) {
        self.commands.push(Command::Spawn(spawn));
    }

    pub fn despawn(&mut self, id: EntityId) {
        self.commands.push(Command::Despawn(id));
    }

    pub fn cue(&mut self, cue: Cue) {
        self.commands.push(Command::Cue(cue));
    }
}

/// Snapshot of a collision participant, handed to the other side
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub id: EntityId,
    pub kind: ActorKind,
    pub pos: Vec2,
    pub velocity: Vec2,
    /// True for a sword mid-swing
    pub swinging: bool,
    /// Position of whoever wields this participant (the player for a sword)
    pub wielder: Option<Vec2>,
}

impl Contact {
    pub fn new(id: EntityId, kind: ActorKind, pos: Vec2) -> Self {
        Self {
            id,
            kind,
            pos,
            velocity: Vec2::ZERO,
            swinging: false,
            wielder: None,
        }
    }
}

/// RNG state wrapper for serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed)
    }
}

/// Owns the pieces a [`TickContext`] borrows, for driving actors in tests
#[cfg(test)]
pub(crate) struct Harness {
    pub rng: Pcg32,
    pub commands: Vec<Command>,
    pub player: PlayerView,
}

#[cfg(test)]
impl Harness {
    pub fn new() -> Self {
        Self {
            rng: RngState::new(7).to_rng(),
            commands: Vec::new(),
            player: PlayerView::default(),
        }
    }

    pub fn ctx(&mut self, dt: f32) -> TickContext<'_> {
        TickContext::new(dt, self.player, &mut self.rng, &mut self.commands)
    }

    pub fn spawns(&self) -> Vec<Spawn> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::Spawn(s) => Some(*s),
                _ => None,
            })
            .collect()
    }

    pub fn despawned(&self, id: EntityId) -> bool {
        self.commands.contains(&Command::Despawn(id))
    }
}

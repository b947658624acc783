//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No platform dependencies; drawing only fills a backend-agnostic list

pub mod actors;
pub mod collision;
pub mod event;
pub mod fsm;
pub mod mission;
pub mod phase;
pub mod state;
pub mod tick;
pub mod world;

pub use actors::{Actor, Entity};
pub use collision::{Aabb, CollisionGroup, CollisionRegistry};
pub use event::{Event, EventKind, InputEvent, Key, MouseButton, Trigger};
pub use fsm::{StateMachine, States, TransitionTable};
pub use mission::{Mission, Stage};
pub use phase::{PhaseTick, PhaseTimer};
pub use state::{ActorKind, Command, EntityId, PlayerView, Spawn, TickContext};
pub use tick::Game;
pub use world::{Layer, World};

//! Game actors
//!
//! Each actor pairs a [`StateMachine`](super::fsm::StateMachine) with a core
//! struct that implements [`States`](super::fsm::States). The [`Actor`]
//! trait is what the world sees; [`Entity`] is the closed set it stores.

pub mod boss;
pub mod dummy;
pub mod enemy;
pub mod gun;
pub mod player;
pub mod projectile;
pub mod sword;

use glam::Vec2;

use super::collision::{Aabb, CollisionGroup};
use super::event::InputEvent;
use super::state::{ActorKind, Contact, EntityId, TickContext};
use crate::renderer::{Camera, DrawList};

pub use boss::{Boss, BossState};
pub use dummy::Dummy;
pub use enemy::{Enemy, EnemyState};
pub use gun::{Gun, GunState};
pub use player::{Player, PlayerState};
pub use projectile::{EnemyBullet, SwordBullet};
pub use sword::{Sword, SwordState};

/// Data every character shares
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub pos: Vec2,
    pub hp: i32,
    pub draw_scale: f32,
    /// Fractional animation frame
    pub frame: f32,
    /// Mirror the sprite horizontally
    pub flip: bool,
}

impl Body {
    pub fn new(pos: Vec2, hp: i32, draw_scale: f32) -> Self {
        Self {
            pos,
            hp,
            draw_scale,
            frame: 0.0,
            flip: false,
        }
    }

    /// Advance a looping animation and wrap it to the sheet length
    pub fn animate(&mut self, fps: f32, frames: u32, dt: f32) {
        self.frame = (self.frame + fps * dt) % frames.max(1) as f32;
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }
}

/// What the world can ask of any entity
pub trait Actor {
    fn id(&self) -> EntityId;
    fn kind(&self) -> ActorKind;
    fn pos(&self) -> Vec2;

    fn update(&mut self, ctx: &mut TickContext);
    fn draw(&self, camera: &Camera, out: &mut DrawList);

    /// World-space box; [`Aabb::EMPTY`] when the actor cannot collide right now
    fn bounding_box(&self) -> Aabb;

    /// Snapshot handed to whatever this actor collides with
    fn contact(&self) -> Contact {
        Contact::new(self.id(), self.kind(), self.pos())
    }

    fn handle_collision(&mut self, _group: CollisionGroup, _other: &Contact, _ctx: &mut TickContext) {}

    fn handle_input(&mut self, _event: &InputEvent, _ctx: &mut TickContext) {}
}

/// Outline `bbox` if hitbox display is on
pub(crate) fn draw_hitbox(bbox: Aabb, camera: &Camera, out: &mut DrawList) {
    if bbox.is_empty() {
        return;
    }
    out.hitbox(camera.to_screen(bbox.min), camera.to_screen(bbox.max));
}

/// Everything that can live in the world
#[derive(Debug)]
pub enum Entity {
    Player(Player),
    Sword(Sword),
    Enemy(Enemy),
    Boss(Boss),
    Dummy(Dummy),
    EnemyBullet(EnemyBullet),
    SwordBullet(SwordBullet),
}

impl Entity {
    pub fn actor(&self) -> &dyn Actor {
        match self {
            Entity::Player(a) => a,
            Entity::Sword(a) => a,
            Entity::Enemy(a) => a,
            Entity::Boss(a) => a,
            Entity::Dummy(a) => a,
            Entity::EnemyBullet(a) => a,
            Entity::SwordBullet(a) => a,
        }
    }

    pub fn actor_mut(&mut self) -> &mut dyn Actor {
        match self {
            Entity::Player(a) => a,
            Entity::Sword(a) => a,
            Entity::Enemy(a) => a,
            Entity::Boss(a) => a,
            Entity::Dummy(a) => a,
            Entity::EnemyBullet(a) => a,
            Entity::SwordBullet(a) => a,
        }
    }

    pub fn kind(&self) -> ActorKind {
        self.actor().kind()
    }

    pub fn as_player(&self) -> Option<&Player> {
        match self {
            Entity::Player(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_player_mut(&mut self) -> Option<&mut Player> {
        match self {
            Entity::Player(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_sword(&self) -> Option<&Sword> {
        match self {
            Entity::Sword(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_enemy(&self) -> Option<&Enemy> {
        match self {
            Entity::Enemy(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_boss(&self) -> Option<&Boss> {
        match self {
            Entity::Boss(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_dummy(&self) -> Option<&Dummy> {
        match self {
            Entity::Dummy(d) => Some(d),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_animate_wraps() {
        let mut body = Body::new(Vec2::ZERO, 1, 1.0);
        body.animate(5.0, 4, 0.5);
        assert_eq!(body.frame, 2.5);
        body.animate(5.0, 4, 0.5);
        assert_eq!(body.frame, 1.0);
    }
}

//! Training dummy
//!
//! A stationary target for the tutorial stage. It never takes damage; it
//! only remembers that it was struck.

use glam::Vec2;

use super::{Actor, Body, draw_hitbox};
use crate::audio::{Cue, SoundEffect};
use crate::renderer::{Camera, DrawList, Sprite, SpriteKey};
use crate::sim::collision::{Aabb, CollisionGroup};
use crate::sim::state::{Contact, EntityId, ActorKind, TickContext};

pub const HALF_EXTENT: f32 = 50.0;
/// Idle sway is very slow: ten frames per hundred seconds
pub const ANIM_FPS: f32 = 0.1;
pub const DRAW_SIZE: f32 = 100.0;

#[derive(Debug, Clone)]
pub struct Dummy {
    id: EntityId,
    body: Body,
    struck: bool,
}

impl Dummy {
    pub fn new(id: EntityId, pos: Vec2) -> Self {
        Self {
            id,
            body: Body::new(pos, 1, 1.0),
            struck: false,
        }
    }

    pub fn struck(&self) -> bool {
        self.struck
    }
}

impl Actor for Dummy {
    fn id(&self) -> EntityId {
        self.id
    }

    fn kind(&self) -> ActorKind {
        ActorKind::Dummy
    }

    fn pos(&self) -> Vec2 {
        self.body.pos
    }

    fn update(&mut self, ctx: &mut TickContext) {
        self.body.animate(ANIM_FPS, SpriteKey::Dummy.frames(), ctx.dt);
        self.body.flip = ctx.player.pos.x < self.body.pos.x;
    }

    fn draw(&self, camera: &Camera, out: &mut DrawList) {
        out.sprite(
            Sprite::new(SpriteKey::Dummy, camera.to_screen(self.body.pos), Vec2::splat(DRAW_SIZE))
                .frame(self.body.frame)
                .flipped(self.body.flip),
        );
        draw_hitbox(self.bounding_box(), camera, out);
    }

    fn bounding_box(&self) -> Aabb {
        Aabb::from_center(self.body.pos, Vec2::splat(HALF_EXTENT))
    }

    fn handle_collision(&mut self, group: CollisionGroup, other: &Contact, ctx: &mut TickContext) {
        let hit = match group {
            CollisionGroup::SwordEnemy => other.swinging,
            CollisionGroup::SwordBulletEnemy => true,
            _ => false,
        };
        if hit && !self.struck {
            self.struck = true;
            ctx.cue(Cue::Sfx(SoundEffect::EnemyHit));
            log::debug!("training dummy struck via {group}");
        }
    }
}

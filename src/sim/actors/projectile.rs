//! Straight-line projectiles
//!
//! Both kinds fly at constant velocity and remove themselves once they are
//! [`PROJECTILE_RANGE`] away from where they were fired.

use glam::Vec2;

use super::{Actor, draw_hitbox};
use crate::consts::PROJECTILE_RANGE;
use crate::renderer::{Camera, DrawList, Sprite, SpriteKey};
use crate::sim::collision::{Aabb, CollisionGroup};
use crate::sim::state::{ActorKind, Contact, EntityId, TickContext};
use crate::{kmph_to_pps, polar_to_cartesian};

pub const ENEMY_BULLET_SPEED: f32 = kmph_to_pps(60.0);
pub const ENEMY_BULLET_RADIUS: f32 = 10.0;
pub const SWORD_WAVE_SPEED: f32 = kmph_to_pps(90.0);
pub const SWORD_WAVE_SIZE: Vec2 = Vec2::new(128.0, 64.0);

/// Shared flight state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Flight {
    pub pos: Vec2,
    pub origin: Vec2,
    pub angle: f32,
    pub velocity: Vec2,
}

impl Flight {
    pub fn new(pos: Vec2, angle: f32, speed: f32) -> Self {
        Self {
            pos,
            origin: pos,
            angle,
            velocity: polar_to_cartesian(speed, angle),
        }
    }

    /// Move one step; false once out of range
    pub fn advance(&mut self, dt: f32) -> bool {
        self.pos += self.velocity * dt;
        self.pos.distance_squared(self.origin) <= PROJECTILE_RANGE * PROJECTILE_RANGE
    }
}

#[derive(Debug, Clone)]
pub struct EnemyBullet {
    id: EntityId,
    flight: Flight,
}

impl EnemyBullet {
    pub fn new(id: EntityId, pos: Vec2, angle: f32) -> Self {
        Self {
            id,
            flight: Flight::new(pos, angle, ENEMY_BULLET_SPEED),
        }
    }

    pub fn flight(&self) -> &Flight {
        &self.flight
    }
}

impl Actor for EnemyBullet {
    fn id(&self) -> EntityId {
        self.id
    }

    fn kind(&self) -> ActorKind {
        ActorKind::EnemyBullet
    }

    fn pos(&self) -> Vec2 {
        self.flight.pos
    }

    fn update(&mut self, ctx: &mut TickContext) {
        if !self.flight.advance(ctx.dt) {
            ctx.despawn(self.id);
        }
    }

    fn draw(&self, camera: &Camera, out: &mut DrawList) {
        out.sprite(Sprite::new(
            SpriteKey::EnemyBullet,
            camera.to_screen(self.flight.pos),
            SpriteKey::EnemyBullet.frame_size() * 1.3,
        ));
        draw_hitbox(self.bounding_box(), camera, out);
    }

    fn bounding_box(&self) -> Aabb {
        Aabb::from_center(self.flight.pos, Vec2::splat(ENEMY_BULLET_RADIUS))
    }

    fn contact(&self) -> Contact {
        Contact {
            velocity: self.flight.velocity,
            ..Contact::new(self.id, ActorKind::EnemyBullet, self.flight.pos)
        }
    }

    fn handle_collision(&mut self, group: CollisionGroup, other: &Contact, ctx: &mut TickContext) {
        match group {
            CollisionGroup::PlayerEnemyBullet => ctx.despawn(self.id),
            // Parried by a swinging blade
            CollisionGroup::SwordEnemyBullet if other.swinging => ctx.despawn(self.id),
            _ => {}
        }
    }
}

/// Crescent thrown by each sword swing
#[derive(Debug, Clone)]
pub struct SwordBullet {
    id: EntityId,
    flight: Flight,
}

impl SwordBullet {
    pub fn new(id: EntityId, pos: Vec2, angle: f32) -> Self {
        Self {
            id,
            flight: Flight::new(pos, angle, SWORD_WAVE_SPEED),
        }
    }

    pub fn flight(&self) -> &Flight {
        &self.flight
    }
}

impl Actor for SwordBullet {
    fn id(&self) -> EntityId {
        self.id
    }

    fn kind(&self) -> ActorKind {
        ActorKind::SwordBullet
    }

    fn pos(&self) -> Vec2 {
        self.flight.pos
    }

    fn update(&mut self, ctx: &mut TickContext) {
        if !self.flight.advance(ctx.dt) {
            ctx.despawn(self.id);
        }
    }

    fn draw(&self, camera: &Camera, out: &mut DrawList) {
        out.sprite(
            Sprite::new(SpriteKey::SwordWave, camera.to_screen(self.flight.pos), Vec2::splat(128.0))
                .rotated(self.flight.angle),
        );
        draw_hitbox(self.bounding_box(), camera, out);
    }

    fn bounding_box(&self) -> Aabb {
        Aabb::from_center(self.flight.pos, SWORD_WAVE_SIZE * 0.5)
    }

    fn contact(&self) -> Contact {
        Contact {
            velocity: self.flight.velocity,
            ..Contact::new(self.id, ActorKind::SwordBullet, self.flight.pos)
        }
    }

    fn handle_collision(&mut self, group: CollisionGroup, _other: &Contact, ctx: &mut TickContext) {
        if group == CollisionGroup::SwordBulletEnemy {
            ctx.despawn(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Harness;

    #[test]
    fn test_flies_straight() {
        let mut h = Harness::new();
        let mut b = EnemyBullet::new(EntityId(1), Vec2::ZERO, std::f32::consts::FRAC_PI_2);
        b.update(&mut h.ctx(1.0));
        assert!(b.pos().x.abs() < 1e-3);
        assert!((b.pos().y - ENEMY_BULLET_SPEED).abs() < 1e-2);
        assert!(h.commands.is_empty());
    }

    #[test]
    fn test_out_of_range_despawns() {
        let mut h = Harness::new();
        let mut w = SwordBullet::new(EntityId(4), Vec2::new(7.0, 7.0), 0.0);
        let steps = (PROJECTILE_RANGE / SWORD_WAVE_SPEED).ceil() as u32 + 2;
        for _ in 0..steps {
            w.update(&mut h.ctx(1.0));
        }
        assert!(h.despawned(EntityId(4)));
    }

    #[test]
    fn test_parry_needs_swing() {
        let mut h = Harness::new();
        let mut b = EnemyBullet::new(EntityId(1), Vec2::ZERO, 0.0);
        let blade = Contact::new(EntityId(2), ActorKind::Sword, Vec2::ZERO);
        b.handle_collision(CollisionGroup::SwordEnemyBullet, &blade, &mut h.ctx(0.0));
        assert!(!h.despawned(EntityId(1)));

        let swinging = Contact { swinging: true, ..blade };
        b.handle_collision(CollisionGroup::SwordEnemyBullet, &swinging, &mut h.ctx(0.0));
        assert!(h.despawned(EntityId(1)));
    }

    #[test]
    fn test_wave_consumed_on_enemy() {
        let mut h = Harness::new();
        let mut w = SwordBullet::new(EntityId(4), Vec2::ZERO, 0.0);
        let enemy = Contact::new(EntityId(5), ActorKind::Enemy, Vec2::ZERO);
        w.handle_collision(CollisionGroup::SwordBulletEnemy, &enemy, &mut h.ctx(0.0));
        assert!(h.despawned(EntityId(4)));
        assert!(w.contact().velocity.x > 0.0);
    }
}

//! Basic gunner
//!
//! Chases the player from afar, strafes randomly once inside combat range and
//! shoots on a fixed cadence while the player is within detection range.
//! Sword hits knock it back; the killing blow plays a short death slide.

use std::sync::LazyLock;

use glam::Vec2;
use rand::Rng;

use super::gun::Gun;
use super::{Actor, Body, draw_hitbox};
use crate::audio::{Cue, SoundEffect};
use crate::renderer::{Camera, DrawList, Sprite, SpriteKey};
use crate::sim::collision::{Aabb, CollisionGroup};
use crate::sim::event::{Event, EventKind};
use crate::sim::fsm::{StateMachine, States, TransitionTable};
use crate::sim::phase::{PhaseTick, PhaseTimer};
use crate::sim::state::{ActorKind, Contact, EntityId, TickContext};
use crate::{kmph_to_pps, polar_to_cartesian, unit_or};

pub const CHASE_SPEED: f32 = kmph_to_pps(15.0);
pub const BATTLE_SPEED: f32 = kmph_to_pps(10.0);
/// Walk cycle: one frame every 0.2 s
pub const ANIM_FPS: f32 = 5.0;
pub const HIT_TIME: f32 = 0.5;
pub const DEATH_TIME: f32 = 1.0;
pub const KNOCKBACK_SPEED: f32 = 200.0;
pub const DRAW_SCALE: f32 = 2.5;
/// Seconds between strafe direction changes
pub const STRAFE_INTERVAL: (f32, f32) = (0.5, 1.5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum EnemyState {
    Chase,
    BattleMove,
    Hit,
    Death,
    /// Death has run out; waiting for the world to remove it
    Despawned,
}

static TABLE: LazyLock<TransitionTable<EnemyState>> = LazyLock::new(|| {
    TransitionTable::new()
        .state(
            EnemyState::Chase,
            &[
                (EventKind::CloseRange.into(), EnemyState::BattleMove),
                (EventKind::HitBySword.into(), EnemyState::Hit),
                (EventKind::DeathBlow.into(), EnemyState::Death),
            ],
        )
        .state(
            EnemyState::BattleMove,
            &[
                (EventKind::LongRange.into(), EnemyState::Chase),
                (EventKind::HitBySword.into(), EnemyState::Hit),
                (EventKind::DeathBlow.into(), EnemyState::Death),
            ],
        )
        .state(EnemyState::Hit, &[(EventKind::Timeout.into(), EnemyState::Chase)])
        .state(EnemyState::Death, &[(EventKind::Expire.into(), EnemyState::Despawned)])
        .state(EnemyState::Despawned, &[])
});

/// Range event for a squared distance; the boundary counts as close
pub fn range_event(dist_sq: f32, range: f32) -> EventKind {
    if dist_sq <= range * range {
        EventKind::CloseRange
    } else {
        EventKind::LongRange
    }
}

/// Per-enemy tuning, copied from the settings at spawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyConfig {
    pub hp: i32,
    pub combat_range: f32,
    pub detection_range: f32,
    pub fire_interval: f32,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            hp: 3,
            combat_range: 300.0,
            detection_range: 600.0,
            fire_interval: 1.5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnemyCore {
    id: EntityId,
    pub body: Body,
    /// Unit vector, set on every hit
    pub knockback: Vec2,
    /// Walking away from the viewer (player is above)
    facing_back: bool,
    strafe_dir: Vec2,
    strafe_timer: f32,
    strafe_interval: f32,
    hit: PhaseTimer,
    death: PhaseTimer,
}

impl EnemyCore {
    fn face_player(&mut self, player: Vec2) {
        self.body.flip = self.body.pos.x < player.x;
        self.facing_back = self.body.pos.y <= player.y;
    }

    fn walk_key(&self) -> SpriteKey {
        if self.facing_back { SpriteKey::EnemyWalkB } else { SpriteKey::EnemyWalkF }
    }

    fn walk_anim(&mut self, dt: f32) {
        let frames = self.walk_key().frames();
        self.body.animate(ANIM_FPS, frames, dt);
    }

    fn reroll_strafe(&mut self, ctx: &mut TickContext) {
        let v = Vec2::new(ctx.rng.random_range(-1.0..=1.0), ctx.rng.random_range(-1.0..=1.0));
        self.strafe_dir = v.normalize_or_zero();
        self.strafe_interval = ctx.rng.random_range(STRAFE_INTERVAL.0..=STRAFE_INTERVAL.1);
        self.strafe_timer = 0.0;
    }
}

impl States for EnemyCore {
    type Id = EnemyState;

    fn enter(&mut self, state: EnemyState, _event: &Event, ctx: &mut TickContext) {
        match state {
            EnemyState::Chase => self.body.frame = 0.0,
            EnemyState::BattleMove => {
                self.body.frame = 0.0;
                self.reroll_strafe(ctx);
            }
            EnemyState::Hit | EnemyState::Death => {
                self.body.frame = 0.0;
                self.body.flip = self.knockback.x <= 0.0;
                if state == EnemyState::Hit {
                    self.hit.reset();
                    ctx.cue(Cue::Sfx(SoundEffect::EnemyHit));
                } else {
                    self.death.reset();
                    ctx.cue(Cue::Sfx(SoundEffect::EnemyDeath));
                }
            }
            EnemyState::Despawned => {}
        }
    }

    fn exit(&mut self, state: EnemyState, _event: &Event, ctx: &mut TickContext) {
        if state == EnemyState::Death {
            ctx.despawn(self.id);
        }
    }

    fn step(&mut self, state: EnemyState, ctx: &mut TickContext) -> Option<Event> {
        let dt = ctx.dt;
        match state {
            EnemyState::Chase => {
                let dir = (ctx.player.pos - self.body.pos).normalize_or_zero();
                self.body.pos += dir * CHASE_SPEED * dt;
                self.face_player(ctx.player.pos);
                self.walk_anim(dt);
                None
            }
            EnemyState::BattleMove => {
                self.strafe_timer += dt;
                if self.strafe_timer > self.strafe_interval {
                    self.reroll_strafe(ctx);
                }
                self.body.pos += self.strafe_dir * BATTLE_SPEED * dt;
                self.face_player(ctx.player.pos);
                self.walk_anim(dt);
                None
            }
            EnemyState::Hit => {
                self.body.pos += self.knockback * KNOCKBACK_SPEED * dt;
                match self.hit.advance(dt) {
                    PhaseTick::Completed => Some(EventKind::Timeout.into()),
                    _ => None,
                }
            }
            EnemyState::Death => {
                let last = (SpriteKey::EnemyDeath.frames() - 1) as f32;
                if self.body.frame < last {
                    self.body.pos += self.knockback * KNOCKBACK_SPEED * dt;
                    self.body.frame = (self.body.frame + (last + 1.0) / DEATH_TIME * dt).min(last);
                } else {
                    self.body.frame = last;
                }
                match self.death.advance(dt) {
                    PhaseTick::Completed => Some(EventKind::Expire.into()),
                    _ => None,
                }
            }
            EnemyState::Despawned => None,
        }
    }

    fn draw(&self, state: EnemyState, camera: &Camera, out: &mut DrawList) {
        let key = match state {
            EnemyState::Chase | EnemyState::BattleMove => self.walk_key(),
            EnemyState::Hit => SpriteKey::EnemyHit,
            EnemyState::Death | EnemyState::Despawned => SpriteKey::EnemyDeath,
        };
        out.sprite(
            Sprite::new(key, camera.to_screen(self.body.pos), key.frame_size() * self.body.draw_scale)
                .frame(self.body.frame)
                .flipped(self.body.flip),
        );
    }
}

#[derive(Debug)]
pub struct Enemy {
    id: EntityId,
    fsm: StateMachine<EnemyState>,
    core: EnemyCore,
    gun: Gun,
    config: EnemyConfig,
    attack_timer: f32,
}

impl Enemy {
    pub fn new(id: EntityId, pos: Vec2, config: EnemyConfig, ctx: &mut TickContext) -> Self {
        let mut core = EnemyCore {
            id,
            body: Body::new(pos, config.hp, DRAW_SCALE),
            knockback: Vec2::X,
            facing_back: false,
            strafe_dir: Vec2::ZERO,
            strafe_timer: 0.0,
            strafe_interval: STRAFE_INTERVAL.1,
            hit: PhaseTimer::single(HIT_TIME),
            death: PhaseTimer::single(DEATH_TIME),
        };
        let fsm = StateMachine::start(EnemyState::Chase, &TABLE, &mut core, ctx);
        let gun = Gun::new(pos, ctx);
        Self {
            id,
            fsm,
            core,
            gun,
            config,
            attack_timer: 0.0,
        }
    }

    pub fn state(&self) -> EnemyState {
        self.fsm.current()
    }

    pub fn hp(&self) -> i32 {
        self.core.body.hp
    }

    pub fn knockback(&self) -> Vec2 {
        self.core.knockback
    }

    pub fn gun(&self) -> &Gun {
        &self.gun
    }

    /// Dying or gone
    pub fn is_down(&self) -> bool {
        matches!(self.state(), EnemyState::Death | EnemyState::Despawned)
    }

    fn take_hit(&mut self, impulse: Vec2, ctx: &mut TickContext) {
        self.core.body.hp -= 1;
        self.core.knockback = unit_or(impulse, Vec2::X);
        let kind = if self.core.body.hp <= 0 {
            EventKind::DeathBlow
        } else {
            EventKind::HitBySword
        };
        self.fsm.handle_event(kind.into(), &mut self.core, ctx);
    }
}

impl Actor for Enemy {
    fn id(&self) -> EntityId {
        self.id
    }

    fn kind(&self) -> ActorKind {
        ActorKind::Enemy
    }

    fn pos(&self) -> Vec2 {
        self.core.body.pos
    }

    fn update(&mut self, ctx: &mut TickContext) {
        let state = self.fsm.current();
        if !matches!(state, EnemyState::Hit | EnemyState::Death | EnemyState::Despawned) {
            let dist_sq = self.core.body.pos.distance_squared(ctx.player.pos);
            let event = range_event(dist_sq, self.config.combat_range);
            self.fsm.handle_event(event.into(), &mut self.core, ctx);

            if dist_sq < self.config.detection_range * self.config.detection_range {
                self.attack_timer += ctx.dt;
                if self.attack_timer > self.config.fire_interval {
                    self.gun.fire(ctx);
                    self.attack_timer = 0.0;
                }
            }
        }

        self.fsm.update(&mut self.core, ctx);
        if !self.is_down() {
            self.gun.update(self.core.body.pos, ctx);
        }
    }

    fn draw(&self, camera: &Camera, out: &mut DrawList) {
        let shadow = self.core.body.pos - Vec2::new(0.0, 33.0);
        out.sprite(Sprite::new(SpriteKey::Shadow, camera.to_screen(shadow), Vec2::new(40.0, 20.0)));
        self.fsm.draw(&self.core, camera, out);
        if !self.is_down() {
            self.gun.draw(camera, out);
        }
        draw_hitbox(self.bounding_box(), camera, out);
    }

    fn bounding_box(&self) -> Aabb {
        // A body going down stops touching anything
        if self.is_down() {
            return Aabb::EMPTY;
        }
        let half = Vec2::new(15.0, 23.0) * self.core.body.draw_scale * 0.5;
        Aabb::from_center(self.core.body.pos, half)
    }

    fn handle_collision(&mut self, group: CollisionGroup, other: &Contact, ctx: &mut TickContext) {
        if matches!(self.state(), EnemyState::Hit | EnemyState::Death | EnemyState::Despawned) {
            return;
        }
        match group {
            CollisionGroup::SwordEnemy if other.swinging => {
                let wielder = other.wielder.unwrap_or(other.pos);
                self.take_hit(self.core.body.pos - wielder, ctx);
            }
            CollisionGroup::SwordBulletEnemy => self.take_hit(other.velocity, ctx),
            _ => {}
        }
    }
}

/// Spawn position on a ring of `radius` around `center`, at a random angle
pub fn ring_position(center: Vec2, radius: f32, ctx: &mut TickContext) -> Vec2 {
    let theta = ctx.rng.random_range(0.0..std::f32::consts::TAU);
    center + polar_to_cartesian(radius, theta)
}

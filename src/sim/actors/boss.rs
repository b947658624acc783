//! Boss
//!
//! Walks straight at the player. Once inside attack range it commits to one
//! of three patterns, each a two-phase timed state:
//! - Jump: slow rise, quick fall, a 16-bullet ring on landing
//! - Shot: charge, then four aimed five-bullet fans
//! - Dash: wind up, then charge along the direction locked at the start
//!
//! Hits grant a second of invulnerability, shown as flicker.

use std::sync::LazyLock;

use glam::Vec2;
use rand::Rng;

use super::{Actor, Body, draw_hitbox};
use crate::audio::{Cue, SoundEffect};
use crate::consts::{CANVAS_HEIGHT, CANVAS_WIDTH};
use crate::renderer::{Camera, DrawList, Sprite, SpriteKey};
use crate::sim::collision::{Aabb, CollisionGroup};
use crate::sim::event::{Event, EventKind, Trigger};
use crate::sim::fsm::{StateMachine, States, TransitionTable};
use crate::sim::phase::{PhaseTick, PhaseTimer};
use crate::sim::state::{ActorKind, Contact, EntityId, Spawn, TickContext};
use crate::{angle_to, kmph_to_pps};

pub const WALK_SPEED: f32 = kmph_to_pps(60.0);
pub const WALK_FPS: f32 = 6.0;
pub const DRAW_SCALE: f32 = 3.0;
pub const HIT_INVULNERABILITY: f32 = 1.0;

/// Rise, fall
pub const JUMP_PHASES: [f32; 2] = [1.5, 0.3];
pub const JUMP_HEIGHT: f32 = 100.0;
pub const RING_BULLETS: u32 = 16;

/// Charge, fire
pub const SHOT_PHASES: [f32; 2] = [0.5, 1.0];
pub const VOLLEYS: u32 = 4;
pub const FAN_OFFSETS_DEG: [f32; 5] = [-20.0, -10.0, 0.0, 10.0, 20.0];

/// Wind-up, charge
pub const DASH_PHASES: [f32; 2] = [1.0, 2.0];
pub const DASH_SPEED: f32 = 900.0;

pub const DEATH_TIME: f32 = 2.0;

/// Attack patterns the walk state picks from
pub const PATTERNS: [EventKind; 3] = [EventKind::StartJump, EventKind::StartShot, EventKind::StartDash];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum BossState {
    Walk,
    Jump,
    Shot,
    Dash,
    Death,
    Despawned,
}

static TABLE: LazyLock<TransitionTable<BossState>> = LazyLock::new(|| {
    let death: (Trigger, BossState) = (EventKind::Death.into(), BossState::Death);
    TransitionTable::new()
        .state(
            BossState::Walk,
            &[
                (EventKind::StartJump.into(), BossState::Jump),
                (EventKind::StartShot.into(), BossState::Shot),
                (EventKind::StartDash.into(), BossState::Dash),
                death,
            ],
        )
        .state(BossState::Jump, &[(EventKind::FinishJump.into(), BossState::Walk), death])
        .state(BossState::Shot, &[(EventKind::FinishShot.into(), BossState::Walk), death])
        .state(BossState::Dash, &[(EventKind::FinishDash.into(), BossState::Walk), death])
        .state(BossState::Death, &[(EventKind::Expire.into(), BossState::Despawned)])
        .state(BossState::Despawned, &[])
});

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BossConfig {
    pub hp: i32,
    pub attack_range: f32,
    /// Allow picking the pattern that was just used
    pub repeat_patterns: bool,
}

impl Default for BossConfig {
    fn default() -> Self {
        Self {
            hp: 20,
            attack_range: 800.0,
            repeat_patterns: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BossCore {
    id: EntityId,
    pub body: Body,
    pub max_hp: i32,
    /// Invulnerability left after a hit
    pub hit_timer: f32,
    config: BossConfig,
    last_pattern: Option<EventKind>,
    jump: PhaseTimer,
    base_y: f32,
    shot: PhaseTimer,
    volleys_fired: u32,
    dash: PhaseTimer,
    dash_dir: Vec2,
    death: PhaseTimer,
}

impl BossCore {
    fn face_player(&mut self, player: Vec2) {
        self.body.flip = self.body.pos.x < player.x;
    }

    fn pick_pattern(&mut self, ctx: &mut TickContext) -> EventKind {
        let pool: Vec<EventKind> = PATTERNS
            .iter()
            .copied()
            .filter(|p| self.config.repeat_patterns || Some(*p) != self.last_pattern)
            .collect();
        let choice = pool[ctx.rng.random_range(0..pool.len())];
        self.last_pattern = Some(choice);
        choice
    }

    fn fire(&self, angle: f32, ctx: &mut TickContext) {
        ctx.spawn(Spawn::EnemyBullet {
            pos: self.body.pos,
            angle,
        });
    }

    fn fire_fan(&mut self, ctx: &mut TickContext) {
        let base = angle_to(self.body.pos, ctx.player.pos);
        for deg in FAN_OFFSETS_DEG {
            self.fire(base + deg.to_radians(), ctx);
        }
        self.volleys_fired += 1;
        ctx.cue(Cue::Sfx(SoundEffect::BossShot));
    }

    /// Fire every volley whose time has come within the fire phase
    fn fire_due_volleys(&mut self, elapsed: f32, ctx: &mut TickContext) {
        let interval = SHOT_PHASES[1] / VOLLEYS as f32;
        while self.volleys_fired < VOLLEYS && elapsed >= self.volleys_fired as f32 * interval {
            self.fire_fan(ctx);
        }
    }

    fn step_walk(&mut self, ctx: &mut TickContext) -> Option<Event> {
        let to_player = ctx.player.pos - self.body.pos;
        self.body.pos += to_player.normalize_or_zero() * WALK_SPEED * ctx.dt;
        self.face_player(ctx.player.pos);
        self.body.animate(WALK_FPS, SpriteKey::BossWalk.frames(), ctx.dt);

        let range = self.config.attack_range;
        if to_player.length_squared() <= range * range {
            return Some(self.pick_pattern(ctx).into());
        }
        None
    }

    fn step_jump(&mut self, ctx: &mut TickContext) -> Option<Event> {
        self.face_player(ctx.player.pos);
        match self.jump.advance(ctx.dt) {
            PhaseTick::Running { phase: 0, progress } => {
                self.body.pos.y = self.base_y + JUMP_HEIGHT * progress;
                self.body.frame = (progress * 2.0) % 3.0;
            }
            PhaseTick::Running { progress, .. } => {
                self.body.pos.y = self.base_y + JUMP_HEIGHT * (1.0 - progress);
                self.body.frame = (2.0 - progress * 2.0).max(0.0);
            }
            PhaseTick::Completed => return Some(EventKind::FinishJump.into()),
            PhaseTick::Spent => {}
        }
        None
    }

    fn step_shot(&mut self, ctx: &mut TickContext) -> Option<Event> {
        self.face_player(ctx.player.pos);
        match self.shot.advance(ctx.dt) {
            PhaseTick::Running { phase: 0, progress } => {
                self.body.frame = (progress * 2.0) % 3.0;
            }
            PhaseTick::Running { .. } => {
                self.body.frame = 2.0;
                let elapsed = self.shot.elapsed();
                self.fire_due_volleys(elapsed, ctx);
            }
            PhaseTick::Completed => {
                // A long frame may have skipped volleys
                self.fire_due_volleys(f32::INFINITY, ctx);
                return Some(EventKind::FinishShot.into());
            }
            PhaseTick::Spent => {}
        }
        None
    }

    fn step_dash(&mut self, ctx: &mut TickContext) -> Option<Event> {
        self.face_player(ctx.player.pos);
        let frames = SpriteKey::BossWalk.frames() as f32;
        match self.dash.advance(ctx.dt) {
            PhaseTick::Running { phase: 0, progress } => {
                self.body.frame = (progress * frames) % frames;
            }
            PhaseTick::Running { progress, .. } => {
                self.body.frame = (progress * frames * 2.0) % frames;
                self.body.pos += self.dash_dir * DASH_SPEED * ctx.dt;
            }
            PhaseTick::Completed => {
                self.body.pos += self.dash_dir * DASH_SPEED * ctx.dt;
                return Some(EventKind::FinishDash.into());
            }
            PhaseTick::Spent => {}
        }
        None
    }

    fn step_death(&mut self, dt: f32) -> Option<Event> {
        let last = (SpriteKey::BossDeath.frames() - 1) as f32;
        match self.death.advance(dt) {
            PhaseTick::Running { progress, .. } => {
                self.body.frame = (progress * (last + 1.0)).min(last);
                None
            }
            PhaseTick::Completed => {
                self.body.frame = last;
                Some(EventKind::Expire.into())
            }
            PhaseTick::Spent => None,
        }
    }

    fn draw_shadow(&self, state: BossState, camera: &Camera, out: &mut DrawList) {
        let mut ground_y = self.body.pos.y;
        let mut scale = 2.0;
        if state == BossState::Jump {
            // Shrinks to half size at the top of the jump
            ground_y = self.base_y;
            let ratio = ((self.body.pos.y - ground_y) / JUMP_HEIGHT).clamp(0.0, 1.0);
            scale *= 1.0 - 0.5 * ratio;
        }
        let center = Vec2::new(self.body.pos.x, ground_y - 100.0);
        out.sprite(Sprite::new(
            SpriteKey::Shadow,
            camera.to_screen(center),
            SpriteKey::Shadow.frame_size() * scale,
        ));
    }

    fn draw_hp_bar(&self, out: &mut DrawList) {
        let center = Vec2::new(CANVAS_WIDTH * 0.5, CANVAS_HEIGHT * 0.5 - 450.0);
        let fill = self.body.hp.max(0) as f32 / self.max_hp.max(1) as f32;
        out.hp_bar(center, SpriteKey::BossHpBar.frame_size(), fill);
    }
}

impl States for BossCore {
    type Id = BossState;

    fn enter(&mut self, state: BossState, _event: &Event, ctx: &mut TickContext) {
        match state {
            BossState::Walk | BossState::Despawned => {}
            BossState::Jump => {
                self.jump.reset();
                self.base_y = self.body.pos.y;
                self.body.frame = 0.0;
            }
            BossState::Shot => {
                self.shot.reset();
                self.volleys_fired = 0;
            }
            BossState::Dash => {
                self.dash.reset();
                self.dash_dir = (ctx.player.pos - self.body.pos).normalize_or_zero();
                ctx.cue(Cue::Sfx(SoundEffect::BossDash));
            }
            BossState::Death => {
                self.death.reset();
                self.body.frame = 0.0;
                ctx.cue(Cue::Sfx(SoundEffect::BossDeath));
            }
        }
    }

    fn exit(&mut self, state: BossState, _event: &Event, ctx: &mut TickContext) {
        match state {
            BossState::Jump => {
                // Land, then the ring
                self.body.pos.y = self.base_y;
                let step = 360.0 / RING_BULLETS as f32;
                for i in 0..RING_BULLETS {
                    self.fire((i as f32 * step).to_radians(), ctx);
                }
                ctx.cue(Cue::Sfx(SoundEffect::BossSlam));
            }
            BossState::Death => ctx.despawn(self.id),
            _ => {}
        }
    }

    fn step(&mut self, state: BossState, ctx: &mut TickContext) -> Option<Event> {
        match state {
            BossState::Walk => self.step_walk(ctx),
            BossState::Jump => self.step_jump(ctx),
            BossState::Shot => self.step_shot(ctx),
            BossState::Dash => self.step_dash(ctx),
            BossState::Death => self.step_death(ctx.dt),
            BossState::Despawned => None,
        }
    }

    fn draw(&self, state: BossState, camera: &Camera, out: &mut DrawList) {
        let flicker = self.hit_timer > 0.0 && (self.hit_timer * 10.0) as i32 % 2 != 0;
        if !flicker {
            self.draw_shadow(state, camera, out);
            let key = match state {
                BossState::Death | BossState::Despawned => SpriteKey::BossDeath,
                _ => SpriteKey::BossWalk,
            };
            out.sprite(
                Sprite::new(key, camera.to_screen(self.body.pos), key.frame_size() * self.body.draw_scale)
                    .frame(self.body.frame)
                    .flipped(self.body.flip),
            );
        }
        self.draw_hp_bar(out);
    }
}

#[derive(Debug)]
pub struct Boss {
    id: EntityId,
    fsm: StateMachine<BossState>,
    core: BossCore,
}

impl Boss {
    pub fn new(id: EntityId, pos: Vec2, config: BossConfig, ctx: &mut TickContext) -> Self {
        let mut core = BossCore {
            id,
            body: Body::new(pos, config.hp, DRAW_SCALE),
            max_hp: config.hp,
            hit_timer: 0.0,
            config,
            last_pattern: None,
            jump: PhaseTimer::new(&JUMP_PHASES),
            base_y: pos.y,
            shot: PhaseTimer::new(&SHOT_PHASES),
            volleys_fired: 0,
            dash: PhaseTimer::new(&DASH_PHASES),
            dash_dir: Vec2::ZERO,
            death: PhaseTimer::single(DEATH_TIME),
        };
        let fsm = StateMachine::start(BossState::Walk, &TABLE, &mut core, ctx);
        Self { id, fsm, core }
    }

    pub fn state(&self) -> BossState {
        self.fsm.current()
    }

    pub fn hp(&self) -> i32 {
        self.core.body.hp
    }

    pub fn max_hp(&self) -> i32 {
        self.core.max_hp
    }

    pub fn is_down(&self) -> bool {
        matches!(self.state(), BossState::Death | BossState::Despawned)
    }
}

impl Actor for Boss {
    fn id(&self) -> EntityId {
        self.id
    }

    fn kind(&self) -> ActorKind {
        ActorKind::Boss
    }

    fn pos(&self) -> Vec2 {
        self.core.body.pos
    }

    fn update(&mut self, ctx: &mut TickContext) {
        self.core.hit_timer = (self.core.hit_timer - ctx.dt).max(0.0);
        self.fsm.update(&mut self.core, ctx);
    }

    fn draw(&self, camera: &Camera, out: &mut DrawList) {
        self.fsm.draw(&self.core, camera, out);
        draw_hitbox(self.bounding_box(), camera, out);
    }

    fn bounding_box(&self) -> Aabb {
        // A body going down stops touching anything
        if self.is_down() {
            return Aabb::EMPTY;
        }
        let scale = self.core.body.draw_scale;
        let size = Vec2::new(50.0 * scale * 0.5, 60.0 * scale * 0.8);
        Aabb::from_center(self.core.body.pos, size * 0.5)
    }

    fn handle_collision(&mut self, group: CollisionGroup, other: &Contact, ctx: &mut TickContext) {
        if self.is_down() || self.core.hit_timer > 0.0 {
            return;
        }
        match group {
            CollisionGroup::SwordEnemy if other.swinging => {}
            CollisionGroup::SwordBulletEnemy => {}
            // Body contact hurts the player, not the boss
            _ => return,
        }

        self.core.body.hp -= 1;
        self.core.hit_timer = HIT_INVULNERABILITY;
        ctx.cue(Cue::Sfx(SoundEffect::BossHit));
        if self.core.body.hp <= 0 {
            log::info!("boss defeated");
            self.fsm.handle_event(EventKind::Death.into(), &mut self.core, ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{Command, Harness};

    fn far_boss(h: &mut Harness, config: BossConfig) -> Boss {
        // Well outside attack range so Walk never picks on its own
        Boss::new(EntityId(3), Vec2::new(5000.0, 0.0), config, &mut h.ctx(0.0))
    }

    fn bullet_angles(h: &Harness) -> Vec<f32> {
        h.spawns()
            .iter()
            .filter_map(|s| match s {
                Spawn::EnemyBullet { angle, .. } => Some(*angle),
                _ => None,
            })
            .collect()
    }

    fn run_jump(dt: f32) -> (Vec<f32>, f32) {
        let mut h = Harness::new();
        let mut boss = far_boss(&mut h, BossConfig::default());
        boss.fsm.handle_event(EventKind::StartJump.into(), &mut boss.core, &mut h.ctx(0.0));
        let mut guard = 0;
        while boss.state() == BossState::Jump {
            boss.update(&mut h.ctx(dt));
            guard += 1;
            assert!(guard < 10_000, "jump never finished");
        }
        (bullet_angles(&h), boss.pos().y)
    }

    #[test]
    fn test_jump_ring_is_frame_rate_independent() {
        let (coarse, coarse_y) = run_jump(1.0 / 30.0);
        let (fine, fine_y) = run_jump(1.0 / 240.0);

        assert_eq!(coarse.len(), RING_BULLETS as usize);
        assert_eq!(fine.len(), RING_BULLETS as usize);
        for (i, (a, b)) in coarse.iter().zip(&fine).enumerate() {
            let expected = (i as f32 * 22.5).to_radians();
            assert!((a - expected).abs() < 1e-6);
            assert!((b - expected).abs() < 1e-6);
        }
        // Landed back where it took off
        assert_eq!(coarse_y, 0.0);
        assert_eq!(fine_y, 0.0);
    }

    #[test]
    fn test_shot_fires_four_fans() {
        for dt in [1.0 / 60.0, 0.4] {
            let mut h = Harness::new();
            let mut boss = far_boss(&mut h, BossConfig::default());
            boss.fsm.handle_event(EventKind::StartShot.into(), &mut boss.core, &mut h.ctx(0.0));
            while boss.state() == BossState::Shot {
                boss.update(&mut h.ctx(dt));
            }
            assert_eq!(bullet_angles(&h).len(), (VOLLEYS as usize) * FAN_OFFSETS_DEG.len());
        }
    }

    #[test]
    fn test_dash_keeps_locked_direction() {
        let mut h = Harness::new();
        let mut boss = far_boss(&mut h, BossConfig::default());
        boss.fsm.handle_event(EventKind::StartDash.into(), &mut boss.core, &mut h.ctx(0.0));

        // Player moves after the wind-up starts; the charge ignores it
        h.player.pos = Vec2::new(5000.0, 5000.0);
        let dt = 1.0 / 60.0;
        while boss.state() == BossState::Dash {
            boss.update(&mut h.ctx(dt));
        }
        let p = boss.pos();
        assert!(p.y.abs() < 1e-3);
        assert!((5000.0 - p.x - DASH_SPEED * DASH_PHASES[1]).abs() < DASH_SPEED * dt * 2.0);
    }

    #[test]
    fn test_walk_picks_pattern_in_range() {
        let mut h = Harness::new();
        let mut boss = Boss::new(EntityId(3), Vec2::new(100.0, 0.0), BossConfig::default(), &mut h.ctx(0.0));
        boss.update(&mut h.ctx(1.0 / 60.0));
        assert!(matches!(boss.state(), BossState::Jump | BossState::Shot | BossState::Dash));
    }

    #[test]
    fn test_no_repeat_when_disabled() {
        let mut h = Harness::new();
        let config = BossConfig {
            repeat_patterns: false,
            ..BossConfig::default()
        };
        let mut boss = far_boss(&mut h, config);
        let mut last = None;
        for _ in 0..200 {
            let pick = boss.core.pick_pattern(&mut h.ctx(0.0));
            assert_ne!(Some(pick), last);
            last = Some(pick);
        }
    }

    #[test]
    fn test_hits_need_swing_and_respect_invulnerability() {
        let mut h = Harness::new();
        let mut boss = far_boss(&mut h, BossConfig::default());
        let idle_sword = Contact::new(EntityId(2), ActorKind::Sword, Vec2::ZERO);
        let swing = Contact {
            swinging: true,
            ..idle_sword
        };

        boss.handle_collision(CollisionGroup::SwordEnemy, &idle_sword, &mut h.ctx(0.0));
        assert_eq!(boss.hp(), 20);
        boss.handle_collision(CollisionGroup::PlayerBoss, &swing, &mut h.ctx(0.0));
        assert_eq!(boss.hp(), 20);

        boss.handle_collision(CollisionGroup::SwordEnemy, &swing, &mut h.ctx(0.0));
        boss.handle_collision(CollisionGroup::SwordEnemy, &swing, &mut h.ctx(0.0));
        assert_eq!(boss.hp(), 19);

        boss.update(&mut h.ctx(1.0));
        boss.handle_collision(CollisionGroup::SwordEnemy, &swing, &mut h.ctx(0.0));
        assert_eq!(boss.hp(), 18);
    }

    #[test]
    fn test_death_expires_into_despawn() {
        let mut h = Harness::new();
        let config = BossConfig {
            hp: 1,
            ..BossConfig::default()
        };
        let mut boss = far_boss(&mut h, config);
        let wave = Contact::new(EntityId(8), ActorKind::SwordBullet, Vec2::ZERO);
        boss.handle_collision(CollisionGroup::SwordBulletEnemy, &wave, &mut h.ctx(0.0));
        assert_eq!(boss.state(), BossState::Death);

        for _ in 0..130 {
            boss.update(&mut h.ctx(1.0 / 60.0));
        }
        assert_eq!(boss.state(), BossState::Despawned);
        assert!(h.despawned(EntityId(3)));
        assert_eq!(boss.bounding_box(), Aabb::EMPTY);
        assert_eq!(h.commands.iter().filter(|c| matches!(c, Command::Despawn(_))).count(), 1);
    }

    #[test]
    fn test_hp_bar_always_drawn() {
        let mut h = Harness::new();
        let mut boss = far_boss(&mut h, BossConfig::default());
        boss.core.hit_timer = 0.15;
        let mut out = DrawList::new();
        boss.draw(&Camera::default(), &mut out);
        // Flickered out, but the bar stays
        assert_eq!(out.sprites().count(), 0);
        assert_eq!(out.len(), 1);
    }
}

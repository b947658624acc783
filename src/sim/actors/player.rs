//! Player character
//!
//! WASD drives an integer intent vector; a change in intent raises `Run` or
//! `Stop`. The player always faces the mouse in one of six directions.

use std::sync::LazyLock;

use glam::{IVec2, Vec2};

use super::{Actor, Body, draw_hitbox};
use crate::audio::{Cue, SoundEffect};
use crate::consts::CANVAS_HEIGHT;
use crate::kmph_to_pps;
use crate::renderer::{Camera, DrawList, Facing, Sprite, SpriteKey};
use crate::sim::collision::{Aabb, CollisionGroup};
use crate::sim::event::{Event, EventKind, InputEvent, Key};
use crate::sim::fsm::{StateMachine, States, TransitionTable};
use crate::sim::state::{ActorKind, Contact, EntityId, TickContext};

pub const WALK_SPEED: f32 = kmph_to_pps(30.0);
/// 8 frames every 0.75 s
pub const ANIM_FPS: f32 = 8.0 / 0.75;
pub const DRAW_SCALE: f32 = 2.5;
pub const HALF_EXTENTS: Vec2 = Vec2::new(15.0, 25.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum PlayerState {
    Idle,
    Walk,
}

static TABLE: LazyLock<TransitionTable<PlayerState>> = LazyLock::new(|| {
    TransitionTable::new()
        .state(PlayerState::Idle, &[(EventKind::Run.into(), PlayerState::Walk)])
        .state(PlayerState::Walk, &[(EventKind::Stop.into(), PlayerState::Idle)])
});

/// Six-way facing for a look angle in degrees (`atan2` range).
/// Left-facing sectors reuse the right-facing sheets mirrored.
pub fn facing_for(angle_deg: f32) -> (Facing, bool) {
    if (-120.0..-60.0).contains(&angle_deg) {
        (Facing::F, false)
    } else if (60.0..120.0).contains(&angle_deg) {
        (Facing::B, false)
    } else if (-60.0..0.0).contains(&angle_deg) {
        (Facing::RF, false)
    } else if (0.0..60.0).contains(&angle_deg) {
        (Facing::RB, false)
    } else if (-180.0..-120.0).contains(&angle_deg) {
        (Facing::RF, true)
    } else {
        (Facing::RB, true)
    }
}

/// Intent change for a movement key; `None` for anything else
fn intent_delta(raw: &InputEvent) -> Option<IVec2> {
    let (key, sign) = match raw {
        InputEvent::KeyDown(k) => (*k, 1),
        InputEvent::KeyUp(k) => (*k, -1),
        _ => return None,
    };
    let dir = match key {
        Key::A => IVec2::new(-1, 0),
        Key::D => IVec2::new(1, 0),
        Key::W => IVec2::new(0, 1),
        Key::S => IVec2::new(0, -1),
        _ => return None,
    };
    Some(dir * sign)
}

#[derive(Debug, Clone)]
pub struct PlayerCore {
    pub body: Body,
    pub max_hp: i32,
    /// Net WASD direction
    pub intent: IVec2,
    /// Cursor in screen coordinates (y-up)
    pub mouse_screen: Vec2,
    pub facing: Facing,
    /// Seconds of hit immunity left
    pub invulnerable: f32,
    invulnerability: f32,
}

impl PlayerCore {
    fn look(&mut self, mouse_world: Vec2) {
        let d = mouse_world - self.body.pos;
        let (facing, flip) = facing_for(d.y.atan2(d.x).to_degrees());
        self.facing = facing;
        self.body.flip = flip;
    }

    fn sprite_key(&self, state: PlayerState) -> SpriteKey {
        match state {
            PlayerState::Idle => SpriteKey::PlayerIdle(self.facing),
            PlayerState::Walk => SpriteKey::PlayerWalk(self.facing),
        }
    }
}

impl States for PlayerCore {
    type Id = PlayerState;

    fn step(&mut self, state: PlayerState, ctx: &mut TickContext) -> Option<Event> {
        self.look(ctx.player.mouse_world);
        let frames = self.sprite_key(state).frames();
        self.body.animate(ANIM_FPS, frames, ctx.dt);

        if state == PlayerState::Walk {
            let dir = self.intent.as_vec2().normalize_or_zero();
            self.body.pos += dir * WALK_SPEED * ctx.dt;
        }
        None
    }

    fn draw(&self, state: PlayerState, camera: &Camera, out: &mut DrawList) {
        let key = self.sprite_key(state);
        // Blink while immune
        let alpha = if self.invulnerable > 0.0 { 0.5 } else { 1.0 };
        out.sprite(
            Sprite::new(key, camera.to_screen(self.body.pos), key.frame_size() * self.body.draw_scale)
                .frame(self.body.frame)
                .flipped(self.body.flip)
                .alpha(alpha),
        );
    }
}

#[derive(Debug)]
pub struct Player {
    id: EntityId,
    fsm: StateMachine<PlayerState>,
    core: PlayerCore,
}

impl Player {
    pub fn new(id: EntityId, pos: Vec2, hp: i32, invulnerability: f32, ctx: &mut TickContext) -> Self {
        let mut core = PlayerCore {
            body: Body::new(pos, hp, DRAW_SCALE),
            max_hp: hp,
            intent: IVec2::ZERO,
            mouse_screen: Vec2::ZERO,
            facing: Facing::F,
            invulnerable: 0.0,
            invulnerability,
        };
        let fsm = StateMachine::start(PlayerState::Idle, &TABLE, &mut core, ctx);
        Self { id, fsm, core }
    }

    pub fn state(&self) -> PlayerState {
        self.fsm.current()
    }

    pub fn is_walking(&self) -> bool {
        self.fsm.is_in(PlayerState::Walk)
    }

    pub fn hp(&self) -> i32 {
        self.core.body.hp
    }

    pub fn max_hp(&self) -> i32 {
        self.core.max_hp
    }

    pub fn is_alive(&self) -> bool {
        self.core.body.is_alive()
    }

    pub fn mouse_screen(&self) -> Vec2 {
        self.core.mouse_screen
    }

    pub fn core(&self) -> &PlayerCore {
        &self.core
    }

    /// Put the player back on its feet at `pos` with full health
    pub fn respawn(&mut self, pos: Vec2) {
        self.core.body.pos = pos;
        self.core.body.hp = self.core.max_hp;
        self.core.invulnerable = 0.0;
    }
}

impl Actor for Player {
    fn id(&self) -> EntityId {
        self.id
    }

    fn kind(&self) -> ActorKind {
        ActorKind::Player
    }

    fn pos(&self) -> Vec2 {
        self.core.body.pos
    }

    fn update(&mut self, ctx: &mut TickContext) {
        self.core.invulnerable = (self.core.invulnerable - ctx.dt).max(0.0);
        self.fsm.update(&mut self.core, ctx);
    }

    fn draw(&self, camera: &Camera, out: &mut DrawList) {
        self.fsm.draw(&self.core, camera, out);
        draw_hitbox(self.bounding_box(), camera, out);
    }

    fn bounding_box(&self) -> Aabb {
        Aabb::from_center(self.core.body.pos, HALF_EXTENTS)
    }

    fn handle_input(&mut self, raw: &InputEvent, ctx: &mut TickContext) {
        if let InputEvent::MouseMotion { x, y } = *raw {
            self.core.mouse_screen = Vec2::new(x, CANVAS_HEIGHT - 1.0 - y);
            return;
        }

        let Some(delta) = intent_delta(raw) else { return };
        let before = self.core.intent;
        self.core.intent += delta;
        if self.core.intent != before {
            let kind = if self.core.intent == IVec2::ZERO {
                EventKind::Stop
            } else {
                EventKind::Run
            };
            self.fsm.handle_event(kind.into(), &mut self.core, ctx);
        }
    }

    fn handle_collision(&mut self, group: CollisionGroup, _other: &Contact, ctx: &mut TickContext) {
        if !matches!(group, CollisionGroup::PlayerEnemyBullet | CollisionGroup::PlayerBoss) {
            return;
        }
        if self.core.invulnerable > 0.0 || !self.core.body.is_alive() {
            return;
        }
        self.core.body.hp -= 1;
        self.core.invulnerable = self.core.invulnerability;
        ctx.cue(Cue::Sfx(SoundEffect::PlayerHit));
        log::debug!("player hit by {group}, hp {}", self.core.body.hp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Harness;

    fn player(h: &mut Harness) -> Player {
        Player::new(EntityId(1), Vec2::ZERO, 3, 1.0, &mut h.ctx(0.0))
    }

    fn press(p: &mut Player, h: &mut Harness, raw: InputEvent) {
        p.handle_input(&raw, &mut h.ctx(0.0));
    }

    #[test]
    fn test_facing_sectors() {
        assert_eq!(facing_for(-90.0), (Facing::F, false));
        assert_eq!(facing_for(90.0), (Facing::B, false));
        assert_eq!(facing_for(-30.0), (Facing::RF, false));
        assert_eq!(facing_for(0.0), (Facing::RB, false));
        assert_eq!(facing_for(-150.0), (Facing::RF, true));
        assert_eq!(facing_for(180.0), (Facing::RB, true));
    }

    #[test]
    fn test_idle_walk_round_trip() {
        let mut h = Harness::new();
        let mut p = player(&mut h);
        assert_eq!(p.state(), PlayerState::Idle);

        press(&mut p, &mut h, InputEvent::KeyDown(Key::D));
        assert_eq!(p.state(), PlayerState::Walk);
        press(&mut p, &mut h, InputEvent::KeyUp(Key::D));
        assert_eq!(p.state(), PlayerState::Idle);

        // Nothing leaks: intent is back to zero and no effects were queued
        assert_eq!(p.core.intent, IVec2::ZERO);
        assert!(h.commands.is_empty());
    }

    #[test]
    fn test_opposing_keys_cancel() {
        let mut h = Harness::new();
        let mut p = player(&mut h);
        press(&mut p, &mut h, InputEvent::KeyDown(Key::A));
        press(&mut p, &mut h, InputEvent::KeyDown(Key::D));
        assert_eq!(p.state(), PlayerState::Idle);
        press(&mut p, &mut h, InputEvent::KeyUp(Key::A));
        assert_eq!(p.state(), PlayerState::Walk);
    }

    #[test]
    fn test_walk_moves_normalized() {
        let mut h = Harness::new();
        let mut p = player(&mut h);
        press(&mut p, &mut h, InputEvent::KeyDown(Key::W));
        press(&mut p, &mut h, InputEvent::KeyDown(Key::D));

        p.update(&mut h.ctx(1.0));
        let moved = p.pos().length();
        assert!((moved - WALK_SPEED).abs() < 1e-2);
        assert!((p.pos().x - p.pos().y).abs() < 1e-3);
    }

    #[test]
    fn test_mouse_motion_flips_y() {
        let mut h = Harness::new();
        let mut p = player(&mut h);
        press(&mut p, &mut h, InputEvent::MouseMotion { x: 10.0, y: 0.0 });
        assert_eq!(p.mouse_screen(), Vec2::new(10.0, CANVAS_HEIGHT - 1.0));
    }

    #[test]
    fn test_hit_grants_invulnerability() {
        let mut h = Harness::new();
        let mut p = player(&mut h);
        let bullet = Contact::new(EntityId(9), ActorKind::EnemyBullet, Vec2::ZERO);

        p.handle_collision(CollisionGroup::PlayerEnemyBullet, &bullet, &mut h.ctx(0.0));
        p.handle_collision(CollisionGroup::PlayerEnemyBullet, &bullet, &mut h.ctx(0.0));
        assert_eq!(p.hp(), 2);

        p.update(&mut h.ctx(1.0));
        p.handle_collision(CollisionGroup::PlayerEnemyBullet, &bullet, &mut h.ctx(0.0));
        assert_eq!(p.hp(), 1);
    }
}

//! Player's sword
//!
//! Orbits the player at a fixed radius, pointing at the mouse. A left click
//! in Idle launches a sword wave and starts a two-part swing: a 120° sweep
//! across the aim direction, then a return to wherever the mouse is now.
//! Cooldown keeps tracking the mouse but ignores clicks.

use std::f32::consts::PI;
use std::sync::LazyLock;

use glam::Vec2;

use super::{Actor, draw_hitbox};
use crate::audio::{Cue, SoundEffect};
use crate::renderer::{Camera, DrawList, Sprite, SpriteKey};
use crate::sim::collision::Aabb;
use crate::sim::event::{Event, EventKind, InputEvent, Trigger};
use crate::sim::fsm::{StateMachine, States, TransitionTable};
use crate::sim::phase::{PhaseTick, PhaseTimer};
use crate::sim::state::{ActorKind, Contact, EntityId, PlayerView, Spawn, TickContext};
use crate::{angle_to, lerp, polar_to_cartesian};

/// Distance from pivot to hilt
pub const ORBIT_RADIUS: f32 = 30.0;
/// Pivot shifts this far toward the mouse side
pub const PIVOT_SHIFT: f32 = 5.0;
pub const SWING_ARC: f32 = PI / 3.0;
/// Sweep, then return
pub const SWING_PHASES: [f32; 2] = [0.1, 0.1];
pub const COOLDOWN: f32 = 0.5;
pub const DRAW_SIZE: Vec2 = Vec2::new(75.0, 25.0);
pub const AURA_SIZE: f32 = 150.0;
/// Sword wave spawns this far ahead of the player
pub const WAVE_SPAWN_DIST: f32 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum SwordState {
    Idle,
    Swing,
    Cooldown,
}

static TABLE: LazyLock<TransitionTable<SwordState>> = LazyLock::new(|| {
    TransitionTable::new()
        .state(SwordState::Idle, &[(Trigger::ATTACK_DOWN, SwordState::Swing)])
        .state(SwordState::Swing, &[(EventKind::SwingFinish.into(), SwordState::Cooldown)])
        .state(SwordState::Cooldown, &[(EventKind::Timeout.into(), SwordState::Idle)])
});

#[derive(Debug, Clone)]
pub struct SwordCore {
    pub pos: Vec2,
    pub pivot: Vec2,
    pub angle: f32,
    /// Aim angle at the moment of the attack click
    pub attack_start_angle: f32,
    /// Last known player position
    pub wielder: Vec2,
    swing: PhaseTimer,
    swing_start: f32,
    swing_mid: f32,
    cooldown: PhaseTimer,
}

impl SwordCore {
    /// Place the sword on its orbit for the current `angle`
    fn place(&mut self, player: &PlayerView) {
        self.wielder = player.pos;
        let shift = if player.mouse_world.x < player.pos.x {
            -PIVOT_SHIFT
        } else if player.mouse_world.x > player.pos.x {
            PIVOT_SHIFT
        } else {
            0.0
        };
        self.pivot = player.pos + Vec2::new(shift, 0.0);
        self.pos = self.pivot + polar_to_cartesian(ORBIT_RADIUS, self.angle);
    }

    fn track_mouse(&mut self, player: &PlayerView) {
        self.angle = angle_to(player.pos, player.mouse_world);
        self.place(player);
    }

    fn blade_sprite(&self, camera: &Camera) -> Sprite {
        let center = self.pos + polar_to_cartesian(DRAW_SIZE.x * 0.5, self.angle);
        Sprite::new(SpriteKey::Sword, camera.to_screen(center), DRAW_SIZE).rotated(self.angle)
    }
}

impl States for SwordCore {
    type Id = SwordState;

    fn enter(&mut self, state: SwordState, _event: &Event, ctx: &mut TickContext) {
        match state {
            SwordState::Swing => {
                self.swing.reset();
                // Sweep away from the side the mouse is on
                let sign = if ctx.player.mouse_world.x >= ctx.player.pos.x { 1.0 } else { -1.0 };
                self.swing_start = self.attack_start_angle + sign * SWING_ARC;
                self.swing_mid = self.attack_start_angle - sign * SWING_ARC;
            }
            SwordState::Cooldown => self.cooldown.reset(),
            SwordState::Idle => {}
        }
    }

    fn exit(&mut self, state: SwordState, event: &Event, ctx: &mut TickContext) {
        if state != SwordState::Idle || !Trigger::ATTACK_DOWN.matches(event) {
            return;
        }
        let aim = angle_to(ctx.player.pos, ctx.player.mouse_world);
        self.attack_start_angle = aim;
        self.angle = aim;
        self.place(&ctx.player);
        ctx.spawn(Spawn::SwordBullet {
            pos: ctx.player.pos + polar_to_cartesian(WAVE_SPAWN_DIST, aim),
            angle: aim,
        });
        ctx.cue(Cue::Sfx(SoundEffect::SwordSwing));
    }

    fn step(&mut self, state: SwordState, ctx: &mut TickContext) -> Option<Event> {
        match state {
            SwordState::Idle => {
                self.track_mouse(&ctx.player);
                None
            }
            SwordState::Swing => {
                match self.swing.advance(ctx.dt) {
                    PhaseTick::Running { phase: 0, progress } => {
                        self.angle = lerp(self.swing_start, self.swing_mid, progress);
                    }
                    PhaseTick::Running { progress, .. } => {
                        let target = angle_to(ctx.player.pos, ctx.player.mouse_world);
                        self.angle = lerp(self.swing_mid, target, progress);
                    }
                    PhaseTick::Completed => return Some(EventKind::SwingFinish.into()),
                    PhaseTick::Spent => return None,
                }
                self.place(&ctx.player);
                None
            }
            SwordState::Cooldown => match self.cooldown.advance(ctx.dt) {
                PhaseTick::Completed => Some(EventKind::Timeout.into()),
                _ => {
                    self.track_mouse(&ctx.player);
                    None
                }
            },
        }
    }

    fn draw(&self, state: SwordState, camera: &Camera, out: &mut DrawList) {
        out.sprite(self.blade_sprite(camera));
        if state == SwordState::Swing {
            // The aura stays fixed along the aim taken at the click
            let fixed = self.attack_start_angle;
            let hilt = self.pivot + polar_to_cartesian(ORBIT_RADIUS, fixed);
            let center = hilt + polar_to_cartesian(DRAW_SIZE.x * 0.5, fixed);
            out.sprite(
                Sprite::new(SpriteKey::SwordAura, camera.to_screen(center), Vec2::splat(AURA_SIZE))
                    .rotated(fixed + PI * 0.2),
            );
        }
    }
}

#[derive(Debug)]
pub struct Sword {
    id: EntityId,
    owner: EntityId,
    fsm: StateMachine<SwordState>,
    core: SwordCore,
}

impl Sword {
    pub fn new(id: EntityId, owner: EntityId, ctx: &mut TickContext) -> Self {
        let mut core = SwordCore {
            pos: Vec2::ZERO,
            pivot: Vec2::ZERO,
            angle: 0.0,
            attack_start_angle: 0.0,
            wielder: ctx.player.pos,
            swing: PhaseTimer::new(&SWING_PHASES),
            swing_start: 0.0,
            swing_mid: 0.0,
            cooldown: PhaseTimer::single(COOLDOWN),
        };
        core.track_mouse(&ctx.player);
        let fsm = StateMachine::start(SwordState::Idle, &TABLE, &mut core, ctx);
        Self { id, owner, fsm, core }
    }

    pub fn owner(&self) -> EntityId {
        self.owner
    }

    pub fn state(&self) -> SwordState {
        self.fsm.current()
    }

    pub fn is_swinging(&self) -> bool {
        self.fsm.is_in(SwordState::Swing)
    }

    pub fn angle(&self) -> f32 {
        self.core.angle
    }

    pub fn attack_start_angle(&self) -> f32 {
        self.core.attack_start_angle
    }
}

impl Actor for Sword {
    fn id(&self) -> EntityId {
        self.id
    }

    fn kind(&self) -> ActorKind {
        ActorKind::Sword
    }

    fn pos(&self) -> Vec2 {
        self.core.pos
    }

    fn update(&mut self, ctx: &mut TickContext) {
        self.fsm.update(&mut self.core, ctx);
    }

    fn draw(&self, camera: &Camera, out: &mut DrawList) {
        self.fsm.draw(&self.core, camera, out);
        draw_hitbox(self.bounding_box(), camera, out);
    }

    /// Only a swinging blade can hit anything
    fn bounding_box(&self) -> Aabb {
        if self.is_swinging() {
            Aabb::from_center(self.core.pos, Vec2::splat(AURA_SIZE * 0.5))
        } else {
            Aabb::EMPTY
        }
    }

    fn contact(&self) -> Contact {
        Contact {
            swinging: self.is_swinging(),
            wielder: Some(self.core.wielder),
            ..Contact::new(self.id, ActorKind::Sword, self.core.pos)
        }
    }

    fn handle_input(&mut self, raw: &InputEvent, ctx: &mut TickContext) {
        self.fsm.handle_event(Event::input(*raw), &mut self.core, ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::event::MouseButton;
    use crate::sim::state::Harness;

    fn click() -> InputEvent {
        InputEvent::MouseDown(MouseButton::Left)
    }

    fn sword(h: &mut Harness) -> Sword {
        Sword::new(EntityId(2), EntityId(1), &mut h.ctx(0.0))
    }

    #[test]
    fn test_idle_tracks_mouse_on_orbit() {
        let mut h = Harness::new();
        h.player.mouse_world = Vec2::new(0.0, 100.0);
        let mut s = sword(&mut h);
        s.update(&mut h.ctx(1.0 / 60.0));

        assert!((s.angle() - PI / 2.0).abs() < 1e-5);
        // Mouse straight above: no pivot shift
        assert!((s.pos() - Vec2::new(0.0, ORBIT_RADIUS)).length() < 1e-4);
        assert_eq!(s.bounding_box(), Aabb::EMPTY);
    }

    #[test]
    fn test_click_captures_angle_at_click() {
        let mut h = Harness::new();
        h.player.mouse_world = Vec2::new(100.0, 0.0);
        let mut s = sword(&mut h);
        s.update(&mut h.ctx(1.0 / 60.0));
        assert!(s.angle().abs() < 1e-6);

        // Mouse moves, then the click lands before the next update
        h.player.mouse_world = Vec2::new(0.0, 100.0);
        s.handle_input(&click(), &mut h.ctx(0.0));

        assert_eq!(s.state(), SwordState::Swing);
        assert!((s.attack_start_angle() - PI / 2.0).abs() < 1e-6);

        // A sword wave went out along the click direction
        let spawns = h.spawns();
        assert_eq!(spawns.len(), 1);
        let Spawn::SwordBullet { pos, angle } = spawns[0] else {
            panic!("expected a sword wave");
        };
        assert!((angle - PI / 2.0).abs() < 1e-6);
        assert!((pos - Vec2::new(0.0, WAVE_SPAWN_DIST)).length() < 1e-4);
    }

    #[test]
    fn test_swing_then_cooldown_ignores_clicks() {
        let mut h = Harness::new();
        h.player.mouse_world = Vec2::new(100.0, 0.0);
        let mut s = sword(&mut h);
        s.handle_input(&click(), &mut h.ctx(0.0));
        assert_eq!(s.bounding_box().max.x - s.bounding_box().min.x, AURA_SIZE);

        let dt = 1.0 / 60.0;
        // First frame of the sweep starts near start + 60°
        s.update(&mut h.ctx(dt));
        assert!(s.angle() > 0.0);

        for _ in 0..20 {
            s.update(&mut h.ctx(dt));
        }
        assert_eq!(s.state(), SwordState::Cooldown);
        assert_eq!(s.bounding_box(), Aabb::EMPTY);

        s.handle_input(&click(), &mut h.ctx(0.0));
        assert_eq!(s.state(), SwordState::Cooldown);
        assert_eq!(h.spawns().len(), 1);

        for _ in 0..40 {
            s.update(&mut h.ctx(dt));
        }
        assert_eq!(s.state(), SwordState::Idle);
        s.handle_input(&click(), &mut h.ctx(0.0));
        assert_eq!(s.state(), SwordState::Swing);
    }

    #[test]
    fn test_swing_direction_follows_mouse_side() {
        let mut h = Harness::new();
        h.player.mouse_world = Vec2::new(-100.0, 0.0);
        let mut s = sword(&mut h);
        s.handle_input(&click(), &mut h.ctx(0.0));
        // Mouse on the left: sweep starts at start - 60°
        let start = s.core.attack_start_angle;
        assert!((s.core.swing_start - (start - SWING_ARC)).abs() < 1e-6);
        assert!((s.core.swing_mid - (start + SWING_ARC)).abs() < 1e-6);
    }

    #[test]
    fn test_contact_reports_swing() {
        let mut h = Harness::new();
        h.player.pos = Vec2::new(5.0, 5.0);
        let mut s = sword(&mut h);
        assert!(!s.contact().swinging);
        s.handle_input(&click(), &mut h.ctx(0.0));
        let c = s.contact();
        assert!(c.swinging);
        assert_eq!(c.wielder, Some(Vec2::new(5.0, 5.0)));
    }
}

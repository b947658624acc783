//! Enemy sidearm
//!
//! Not a world entity: the owning enemy updates and draws it. The gun orbits
//! its owner facing the player, fires one slightly inaccurate shot per
//! trigger pull and reloads after emptying its magazine.

use std::sync::LazyLock;

use glam::Vec2;
use rand::Rng;

use crate::audio::{Cue, SoundEffect};
use crate::renderer::{Camera, DrawList, Sprite, SpriteKey};
use crate::sim::event::{Event, EventKind};
use crate::sim::fsm::{StateMachine, States, TransitionTable};
use crate::sim::phase::{PhaseTick, PhaseTimer};
use crate::sim::state::{Spawn, TickContext};
use crate::{angle_to, polar_to_cartesian};

pub const ORBIT_RADIUS: f32 = 20.0;
pub const MAGAZINE: u32 = 4;
pub const SHOOT_TIME: f32 = 0.25;
pub const RELOAD_TIME: f32 = 1.0;
/// Shoot animation frame that releases the bullet
pub const FIRE_FRAME: f32 = 2.0;
pub const SPREAD_DEG: f32 = 5.0;
/// Muzzle distance ahead of the gun
pub const MUZZLE_DIST: f32 = 30.0;
pub const DRAW_SCALE: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum GunState {
    Idle,
    Shoot,
    Reload,
}

static TABLE: LazyLock<TransitionTable<GunState>> = LazyLock::new(|| {
    TransitionTable::new()
        .state(
            GunState::Idle,
            &[
                (EventKind::Fire.into(), GunState::Shoot),
                (EventKind::ReloadNeeded.into(), GunState::Reload),
            ],
        )
        .state(
            GunState::Shoot,
            &[
                (EventKind::ShootFinish.into(), GunState::Idle),
                (EventKind::ReloadNeeded.into(), GunState::Reload),
            ],
        )
        .state(GunState::Reload, &[(EventKind::ReloadFinish.into(), GunState::Idle)])
});

#[derive(Debug, Clone)]
pub struct GunCore {
    pub pos: Vec2,
    pub angle: f32,
    pub ammo: u32,
    pub frame: f32,
    owner_pos: Vec2,
    shoot: PhaseTimer,
    reload: PhaseTimer,
    fired: bool,
}

impl GunCore {
    fn aim(&mut self, target: Vec2) {
        self.angle = angle_to(self.owner_pos, target);
    }

    fn fire_bullet(&mut self, ctx: &mut TickContext) {
        let error = ctx.rng.random_range(-SPREAD_DEG..=SPREAD_DEG).to_radians();
        let angle = self.angle + error;
        ctx.spawn(Spawn::EnemyBullet {
            pos: self.pos + polar_to_cartesian(MUZZLE_DIST, angle),
            angle,
        });
        ctx.cue(Cue::Sfx(SoundEffect::Gunshot));
        self.fired = true;
        self.ammo = self.ammo.saturating_sub(1);
    }
}

impl States for GunCore {
    type Id = GunState;

    fn enter(&mut self, state: GunState, _event: &Event, ctx: &mut TickContext) {
        self.frame = 0.0;
        match state {
            GunState::Shoot => {
                self.shoot.reset();
                self.fired = false;
            }
            GunState::Reload => {
                self.reload.reset();
                ctx.cue(Cue::Sfx(SoundEffect::Reload));
            }
            GunState::Idle => {}
        }
    }

    fn exit(&mut self, state: GunState, _event: &Event, _ctx: &mut TickContext) {
        if state == GunState::Reload {
            self.ammo = MAGAZINE;
        }
    }

    fn step(&mut self, state: GunState, ctx: &mut TickContext) -> Option<Event> {
        self.aim(ctx.player.pos);
        match state {
            GunState::Idle => None,
            GunState::Shoot => {
                let frames = SpriteKey::GunShoot.frames() as f32;
                let tick = self.shoot.advance(ctx.dt);
                self.frame = match tick {
                    PhaseTick::Running { progress, .. } => progress * frames,
                    _ => frames,
                };
                if self.frame >= FIRE_FRAME && !self.fired {
                    self.fire_bullet(ctx);
                }
                match tick {
                    PhaseTick::Completed if self.ammo == 0 => Some(EventKind::ReloadNeeded.into()),
                    PhaseTick::Completed => Some(EventKind::ShootFinish.into()),
                    _ => None,
                }
            }
            GunState::Reload => match self.reload.advance(ctx.dt) {
                PhaseTick::Running { progress, .. } => {
                    self.frame = progress * SpriteKey::GunReload.frames() as f32;
                    None
                }
                PhaseTick::Completed => Some(EventKind::ReloadFinish.into()),
                PhaseTick::Spent => None,
            },
        }
    }

    fn draw(&self, state: GunState, camera: &Camera, out: &mut DrawList) {
        let key = match state {
            GunState::Reload => SpriteKey::GunReload,
            _ => SpriteKey::GunShoot,
        };
        let frame = if state == GunState::Idle { 0.0 } else { self.frame };
        // Pointing left: mirror so the gun is not drawn upside down
        let flip = self.angle.to_degrees().abs() > 90.0;
        out.sprite(
            Sprite::new(key, camera.to_screen(self.pos), key.frame_size() * DRAW_SCALE)
                .frame(frame)
                .rotated(self.angle)
                .flipped(flip),
        );
    }
}

#[derive(Debug)]
pub struct Gun {
    fsm: StateMachine<GunState>,
    core: GunCore,
}

impl Gun {
    pub fn new(owner_pos: Vec2, ctx: &mut TickContext) -> Self {
        let mut core = GunCore {
            pos: owner_pos,
            angle: 0.0,
            ammo: MAGAZINE,
            frame: 0.0,
            owner_pos,
            shoot: PhaseTimer::single(SHOOT_TIME),
            reload: PhaseTimer::single(RELOAD_TIME),
            fired: false,
        };
        let fsm = StateMachine::start(GunState::Idle, &TABLE, &mut core, ctx);
        Self { fsm, core }
    }

    pub fn state(&self) -> GunState {
        self.fsm.current()
    }

    pub fn ammo(&self) -> u32 {
        self.core.ammo
    }

    pub fn pos(&self) -> Vec2 {
        self.core.pos
    }

    /// Pull the trigger. Only an idle gun with ammo responds.
    pub fn fire(&mut self, ctx: &mut TickContext) -> bool {
        if self.fsm.is_in(GunState::Idle) && self.core.ammo > 0 {
            return self.fsm.handle_event(EventKind::Fire.into(), &mut self.core, ctx);
        }
        false
    }

    /// Step the gun, then put it back on its orbit around `owner_pos`
    pub fn update(&mut self, owner_pos: Vec2, ctx: &mut TickContext) {
        self.core.owner_pos = owner_pos;
        self.fsm.update(&mut self.core, ctx);
        self.core.pos = owner_pos + polar_to_cartesian(ORBIT_RADIUS, self.core.angle);
    }

    pub fn draw(&self, camera: &Camera, out: &mut DrawList) {
        self.fsm.draw(&self.core, camera, out);
    }
}

//! Mission stage ladder
//!
//! Movement → Target → Skirmish → Boss → Cleared, with Failed reachable from
//! any running stage once the player is out of hit points.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::actors::Actor;
use super::actors::boss::BossConfig;
use super::actors::enemy::EnemyConfig;
use super::state::ActorKind;
use super::world::World;
use crate::audio::{Cue, MusicTrack, SoundEffect};
use crate::consts::{CANVAS_HEIGHT, CANVAS_WIDTH};
use crate::settings::Tuning;

pub const PLAYER_START: Vec2 = Vec2::new(CANVAS_WIDTH / 2.0, CANVAS_HEIGHT / 2.0);
/// Training dummy placement relative to the player
pub const DUMMY_OFFSET: Vec2 = Vec2::new(300.0, 0.0);
/// Boss entry point relative to the player
pub const BOSS_OFFSET: Vec2 = Vec2::new(0.0, 700.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Movement,
    Target,
    Skirmish,
    Boss,
    Cleared,
    Failed,
}

impl Stage {
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Movement => Some(Stage::Target),
            Stage::Target => Some(Stage::Skirmish),
            Stage::Skirmish => Some(Stage::Boss),
            Stage::Boss => Some(Stage::Cleared),
            Stage::Cleared | Stage::Failed => None,
        }
    }

    pub fn is_over(self) -> bool {
        matches!(self, Stage::Cleared | Stage::Failed)
    }

    /// One-line objective shown while the stage runs
    pub fn briefing(self) -> &'static str {
        match self {
            Stage::Movement => "Move around with WASD",
            Stage::Target => "Strike the training dummy with the left mouse button",
            Stage::Skirmish => "Defeat every enemy",
            Stage::Boss => "Defeat the boss",
            Stage::Cleared => "Mission complete",
            Stage::Failed => "Mission failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Mission {
    stage: Stage,
    tuning: Tuning,
    /// Seconds spent walking during Movement
    walked: f32,
    /// Seconds since the current stage began
    elapsed: f32,
}

impl Mission {
    pub fn new(tuning: Tuning) -> Self {
        Self {
            stage: Stage::Movement,
            tuning,
            walked: 0.0,
            elapsed: 0.0,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn briefing(&self) -> &'static str {
        self.stage.briefing()
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn walked(&self) -> f32 {
        self.walked
    }

    /// Reset the world and begin at the first stage
    pub fn start(&mut self, world: &mut World) {
        world.clear();
        let hp = self.tuning.player_hp as i32;
        world.spawn_player(PLAYER_START, hp, self.tuning.player_invulnerability);
        self.enter(Stage::Movement, world);
    }

    pub fn restart(&mut self, world: &mut World) {
        log::info!("mission restarted");
        self.start(world);
    }

    /// Check the current stage's goal; run after the collision pass
    pub fn update(&mut self, world: &mut World, dt: f32) {
        if self.stage.is_over() {
            return;
        }
        self.elapsed += dt;

        let Some(player) = world.player() else {
            self.enter(Stage::Failed, world);
            return;
        };
        if !player.is_alive() {
            self.enter(Stage::Failed, world);
            return;
        }

        let done = match self.stage {
            Stage::Movement => {
                if player.is_walking() {
                    self.walked += dt;
                }
                self.walked >= self.tuning.movement_goal
            }
            Stage::Target => world.dummy_struck(),
            Stage::Skirmish => world.enemy_count() == 0,
            Stage::Boss => world.boss_count() == 0,
            Stage::Cleared | Stage::Failed => false,
        };
        if done && let Some(next) = self.stage.next() {
            world.queue_cue(Cue::Sfx(SoundEffect::StageClear));
            self.enter(next, world);
        }
    }

    fn enter(&mut self, stage: Stage, world: &mut World) {
        log::info!("stage {:?} -> {:?}: {}", self.stage, stage, stage.briefing());
        self.stage = stage;
        self.walked = 0.0;
        self.elapsed = 0.0;

        let origin = world.player().map(|p| p.pos()).unwrap_or(PLAYER_START);
        match stage {
            Stage::Movement => world.queue_cue(Cue::Music(MusicTrack::Field)),
            Stage::Target => {
                world.spawn_dummy(origin + DUMMY_OFFSET);
            }
            Stage::Skirmish => {
                world.despawn_kind(ActorKind::Dummy);
                world.clear_projectiles();
                let config = EnemyConfig {
                    hp: self.tuning.enemy_hp as i32,
                    combat_range: self.tuning.enemy_combat_range,
                    detection_range: self.tuning.enemy_detection_range,
                    fire_interval: self.tuning.enemy_fire_interval,
                };
                world.spawn_enemy_ring(
                    origin,
                    self.tuning.enemy_spawn_radius,
                    self.tuning.enemy_count,
                    config,
                );
            }
            Stage::Boss => {
                world.clear_projectiles();
                let config = BossConfig {
                    hp: self.tuning.boss_hp as i32,
                    attack_range: self.tuning.boss_attack_range,
                    repeat_patterns: self.tuning.boss_repeat_patterns,
                };
                world.spawn_boss(origin + BOSS_OFFSET, config);
                world.queue_cue(Cue::Music(MusicTrack::Boss));
            }
            Stage::Cleared => {
                world.clear_projectiles();
                world.queue_cue(Cue::Music(MusicTrack::Victory));
            }
            Stage::Failed => world.queue_cue(Cue::Music(MusicTrack::Defeat)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::event::{InputEvent, Key};

    const DT: f32 = 1.0 / 60.0;

    fn setup() -> (Mission, World) {
        let mut world = World::new(3);
        let mut mission = Mission::new(Tuning::default());
        mission.start(&mut world);
        (mission, world)
    }

    fn run(mission: &mut Mission, world: &mut World, seconds: f32) {
        for _ in 0..(seconds / DT).ceil() as u32 {
            world.update(DT);
            world.resolve_collisions();
            mission.update(world, DT);
        }
    }

    #[test]
    fn test_stage_ladder() {
        let order: Vec<Stage> =
            std::iter::successors(Some(Stage::Movement), |s| s.next()).collect();
        assert_eq!(
            order,
            [Stage::Movement, Stage::Target, Stage::Skirmish, Stage::Boss, Stage::Cleared]
        );
        assert_eq!(Stage::Failed.next(), None);
    }

    #[test]
    fn test_standing_still_does_not_count() {
        let (mut mission, mut world) = setup();
        run(&mut mission, &mut world, 4.0);
        assert_eq!(mission.stage(), Stage::Movement);
        assert_eq!(mission.walked(), 0.0);
    }

    #[test]
    fn test_walking_unlocks_target() {
        let (mut mission, mut world) = setup();
        world.handle_input(&InputEvent::KeyDown(Key::D));
        run(&mut mission, &mut world, 3.1);
        assert_eq!(mission.stage(), Stage::Target);
        assert_eq!(world.count(ActorKind::Dummy), 1);
        let cues = world.drain_cues();
        assert!(cues.contains(&Cue::Sfx(SoundEffect::StageClear)));
    }

    #[test]
    fn test_skirmish_clears_when_enemies_gone() {
        let (mut mission, mut world) = setup();
        mission.enter(Stage::Skirmish, &mut world);
        assert_eq!(world.enemy_count(), Tuning::default().enemy_count as usize);
        assert_eq!(world.count(ActorKind::Dummy), 0);

        world.despawn_kind(ActorKind::Enemy);
        mission.update(&mut world, DT);
        assert_eq!(mission.stage(), Stage::Boss);
        assert_eq!(world.boss_count(), 1);
    }

    #[test]
    fn test_boss_defeat_clears_mission() {
        let (mut mission, mut world) = setup();
        mission.enter(Stage::Boss, &mut world);
        world.despawn_kind(ActorKind::Boss);
        mission.update(&mut world, DT);
        assert_eq!(mission.stage(), Stage::Cleared);

        // Terminal stages stay put
        mission.update(&mut world, DT);
        assert_eq!(mission.stage(), Stage::Cleared);
    }

    #[test]
    fn test_dead_player_fails_then_restarts() {
        let (mut mission, mut world) = setup();
        for i in 0..Tuning::default().player_hp {
            world.spawn_enemy_bullet(PLAYER_START + Vec2::new(0.1 * i as f32, 0.0), 0.0);
            world.resolve_collisions();
            // Let invulnerability run out
            run(&mut mission, &mut world, 1.1);
        }
        assert_eq!(mission.stage(), Stage::Failed);
        assert!(world.drain_cues().contains(&Cue::Music(MusicTrack::Defeat)));

        mission.restart(&mut world);
        assert_eq!(mission.stage(), Stage::Movement);
        assert_eq!(world.player().map(|p| p.hp()), Some(Tuning::default().player_hp as i32));
    }
}

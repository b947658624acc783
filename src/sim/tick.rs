//! Fixed-timestep game loop
//!
//! One tick runs, in order: actor updates, camera and mouse-world refresh,
//! the collision pass, then the mission pass. Drawing is a separate,
//! read-only pass over the result.

use glam::Vec2;

use super::event::{InputEvent, Key};
use super::mission::{Mission, Stage};
use super::world::World;
use crate::audio::{AudioMixer, Playback};
use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};
use crate::renderer::{Background, Camera, DrawList};
use crate::settings::Settings;

pub struct Game {
    world: World,
    camera: Camera,
    background: Background,
    mission: Mission,
    settings: Settings,
    mixer: AudioMixer,
    playback: Vec<Playback>,
    accumulator: f32,
    ticks: u64,
    quit: bool,
}

impl Game {
    pub fn new(settings: Settings) -> Self {
        let mut world = World::new(settings.seed);
        let mut mission = Mission::new(settings.tuning.clone());
        mission.start(&mut world);
        log::info!("game initialized with seed {:#x}", settings.seed);

        let mut game = Self {
            world,
            camera: Camera::default(),
            background: Background::default(),
            mission,
            mixer: AudioMixer::new(&settings.audio),
            settings,
            playback: Vec::new(),
            accumulator: 0.0,
            ticks: 0,
            quit: false,
        };
        game.refresh_camera();
        game.mix_cues();
        game
    }

    /// Feed one raw input event. Quit and Escape end the run; everything
    /// else goes to the player and its sword.
    pub fn handle_input(&mut self, raw: InputEvent) {
        match raw {
            InputEvent::Quit | InputEvent::KeyDown(Key::Escape) => {
                log::info!("quit requested");
                self.quit = true;
            }
            InputEvent::MouseMotion { .. } => {
                self.world.handle_input(&raw);
                // A click later in the same frame aims at the new cursor
                self.refresh_camera();
            }
            _ => self.world.handle_input(&raw),
        }
    }

    /// Advance the simulation by exactly `dt`
    pub fn tick(&mut self, dt: f32) {
        self.world.update(dt);
        self.refresh_camera();
        self.world.resolve_collisions();
        self.mission.update(&mut self.world, dt);
        self.mix_cues();
        self.ticks += 1;
    }

    /// Run as many fixed ticks as `frame_dt` covers. Returns the number of
    /// ticks taken.
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        self.accumulator += frame_dt.clamp(0.0, MAX_FRAME_DT);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.tick(SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        if substeps == MAX_SUBSTEPS {
            // Spiral of death guard
            self.accumulator = self.accumulator.min(SIM_DT);
        }
        substeps
    }

    /// Camera follows the player; the mouse is re-projected into the world
    fn refresh_camera(&mut self) {
        let Some(player) = self.world.player() else {
            return;
        };
        let (pos, mouse) = (player.core().body.pos, player.mouse_screen());
        self.camera.update(pos, mouse);
        self.world.set_mouse_world(self.camera.to_world(mouse));
    }

    fn mix_cues(&mut self) {
        let cues = self.world.drain_cues();
        self.playback.extend(self.mixer.mix_all(cues));
    }

    pub fn draw(&self) -> DrawList {
        let mut out = DrawList::with_hitboxes(self.settings.show_hitboxes);
        self.background.draw(&self.camera, &mut out);
        self.world.draw(&self.camera, &mut out);
        out
    }

    /// Playback requests produced since the last call
    pub fn drain_playback(&mut self) -> Vec<Playback> {
        std::mem::take(&mut self.playback)
    }

    pub fn restart(&mut self) {
        self.mission.restart(&mut self.world);
        self.accumulator = 0.0;
        self.refresh_camera();
        self.mix_cues();
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn mission(&self) -> &Mission {
        &self.mission
    }

    pub fn stage(&self) -> Stage {
        self.mission.stage()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn mixer_mut(&mut self) -> &mut AudioMixer {
        &mut self.mixer
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Seconds of simulated time so far
    pub fn elapsed(&self) -> f32 {
        self.ticks as f32 * SIM_DT
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Screen position (y-up) of a world point, for input scripting
    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        self.camera.to_screen(world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::MusicTrack;
    use crate::renderer::{DrawCmd, SpriteKey};
    use crate::sim::event::MouseButton;
    use crate::sim::state::ActorKind;

    fn game() -> Game {
        Game::new(Settings::default())
    }

    #[test]
    fn test_starts_with_field_music() {
        let mut g = game();
        let playback = g.drain_playback();
        assert!(matches!(
            playback.first(),
            Some(Playback::Music { track: MusicTrack::Field, .. })
        ));
        assert!(g.drain_playback().is_empty());
    }

    #[test]
    fn test_accumulator_substeps() {
        let mut g = game();
        assert_eq!(g.advance(SIM_DT * 0.5), 0);
        assert_eq!(g.advance(SIM_DT * 0.6), 1);
        // Capped frame delta
        let steps = g.advance(10.0);
        assert!(steps <= MAX_SUBSTEPS);
        assert_eq!(steps, 6);
    }

    #[test]
    fn test_escape_quits() {
        let mut g = game();
        assert!(!g.should_quit());
        g.handle_input(InputEvent::KeyDown(Key::Escape));
        assert!(g.should_quit());
    }

    #[test]
    fn test_camera_tracks_player() {
        let mut g = game();
        g.handle_input(InputEvent::MouseMotion { x: 960.0, y: 540.0 });
        g.handle_input(InputEvent::KeyDown(Key::W));
        for _ in 0..60 {
            g.tick(SIM_DT);
        }
        let player = g.world().player().map(|p| p.core().body.pos).unwrap();
        assert!(player.y > 540.0);
        let centre = g.world_to_screen(player);
        assert!((centre - g.camera().viewport() * 0.5).length() < 2.0);
    }

    #[test]
    fn test_click_aims_at_latest_motion() {
        let mut g = game();
        g.handle_input(InputEvent::MouseMotion { x: 1800.0, y: 540.0 });
        g.tick(SIM_DT);

        // Centre column, near the top of the window: straight above the player
        g.handle_input(InputEvent::MouseMotion { x: 960.0, y: 80.0 });
        g.handle_input(InputEvent::MouseDown(MouseButton::Left));
        let angle = g.world().sword().map(|s| s.attack_start_angle()).unwrap();
        assert!((angle - std::f32::consts::FRAC_PI_2).abs() < 0.05, "angle {angle}");
    }

    #[test]
    fn test_draw_starts_with_background() {
        let g = game();
        let list = g.draw();
        let Some(DrawCmd::Sprite(first)) = list.commands().first() else {
            panic!("empty draw list");
        };
        assert_eq!(first.key, SpriteKey::Background);
        assert!(list.sprites().any(|s| matches!(s.key, SpriteKey::PlayerIdle(_))));
    }

    #[test]
    fn test_hitboxes_follow_settings() {
        let settings = Settings {
            show_hitboxes: true,
            ..Settings::default()
        };
        let g = Game::new(settings);
        let list = g.draw();
        assert!(list.commands().iter().any(|c| matches!(c, DrawCmd::Rect { .. })));
    }

    #[test]
    fn test_same_seed_same_run() {
        let run = || {
            let mut g = game();
            g.restart();
            g.handle_input(InputEvent::KeyDown(Key::D));
            for _ in 0..200 {
                g.tick(SIM_DT);
            }
            (g.stage(), g.world().count(ActorKind::Dummy), g.world().player().map(|p| p.core().body.pos))
        };
        assert_eq!(run(), run());
        assert_eq!(run().0, Stage::Target);
    }
}

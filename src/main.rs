//! Swordfall headless runner
//!
//! Plays the mission with a scripted autopilot at the fixed timestep and
//! logs how far it got. Usage: `swordfall [settings.json]`.

#[cfg(not(target_arch = "wasm32"))]
mod autopilot {
    use glam::{IVec2, Vec2};

    use swordfall::consts::{CANVAS_HEIGHT, SIM_DT};
    use swordfall::sim::{Game, InputEvent, Key, MouseButton, Stage};

    /// Give up after this much simulated time
    pub const TIME_LIMIT: f32 = 600.0;
    /// Seconds between sword swings
    const SWING_INTERVAL: f32 = 0.6;
    /// Keep roughly this far from the current target
    const STANDOFF: f32 = 120.0;

    /// Turns the game state into a stream of raw inputs
    #[derive(Default)]
    pub struct Autopilot {
        held: IVec2,
        swing_timer: f32,
        mouse_down: bool,
    }

    impl Autopilot {
        pub fn new() -> Self {
            Self::default()
        }

        fn key_events(from: IVec2, to: IVec2) -> Vec<InputEvent> {
            let mut events = Vec::new();
            let axes = [(from.x, to.x, Key::A, Key::D), (from.y, to.y, Key::S, Key::W)];
            for (old, new, neg, pos) in axes {
                if old == new {
                    continue;
                }
                match old {
                    -1 => events.push(InputEvent::KeyUp(neg)),
                    1 => events.push(InputEvent::KeyUp(pos)),
                    _ => {}
                }
                match new {
                    -1 => events.push(InputEvent::KeyDown(neg)),
                    1 => events.push(InputEvent::KeyDown(pos)),
                    _ => {}
                }
            }
            events
        }

        /// Inputs for the next tick
        pub fn plan(&mut self, game: &Game) -> Vec<InputEvent> {
            let mut events = Vec::new();
            let Some(player) = game.world().player() else {
                return events;
            };
            let pos = player.core().body.pos;

            let wanted = match game.stage() {
                // Walk in a slow square
                Stage::Movement => {
                    let leg = game.elapsed() as usize % 4;
                    [IVec2::X, IVec2::Y, IVec2::NEG_X, IVec2::NEG_Y][leg]
                }
                Stage::Cleared | Stage::Failed => IVec2::ZERO,
                _ => match game.world().nearest_target(pos) {
                    Some(target) => {
                        let to = target - pos;
                        let dir = if to.length() > STANDOFF { to } else { -to };
                        let step = |v: f32| if v.abs() > 20.0 { v.signum() as i32 } else { 0 };
                        let wanted = IVec2::new(step(dir.x), step(dir.y));
                        self.aim(game, target, &mut events);
                        wanted
                    }
                    None => IVec2::ZERO,
                },
            };
            events.extend(Self::key_events(self.held, wanted));
            self.held = wanted;
            events
        }

        fn aim(&mut self, game: &Game, target: Vec2, events: &mut Vec<InputEvent>) {
            let screen = game.world_to_screen(target);
            events.push(InputEvent::MouseMotion {
                x: screen.x,
                y: CANVAS_HEIGHT - 1.0 - screen.y,
            });

            self.swing_timer += SIM_DT;
            if self.mouse_down {
                events.push(InputEvent::MouseUp(MouseButton::Left));
                self.mouse_down = false;
            } else if self.swing_timer >= SWING_INTERVAL {
                events.push(InputEvent::MouseDown(MouseButton::Left));
                self.mouse_down = true;
                self.swing_timer = 0.0;
            }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use swordfall::Settings;
    use swordfall::consts::SIM_DT;
    use swordfall::sim::{Game, Stage};

    env_logger::init();
    log::info!("Swordfall (headless) starting...");

    let settings = match std::env::args().nth(1) {
        Some(path) => Settings::load(&path).unwrap_or_else(|e| {
            log::warn!("{e}; using default settings");
            Settings::default()
        }),
        None => Settings::default(),
    };

    let mut game = Game::new(settings);
    let mut pilot = autopilot::Autopilot::new();
    let mut stage = game.stage();
    log::info!("{:?}: {}", stage, game.mission().briefing());

    while !game.should_quit() && !stage.is_over() && game.elapsed() < autopilot::TIME_LIMIT {
        for event in pilot.plan(&game) {
            game.handle_input(event);
        }
        game.advance(SIM_DT);

        for playback in game.drain_playback() {
            log::trace!("audio {playback:?}");
        }
        if game.stage() != stage {
            stage = game.stage();
            log::info!("{:.1}s {:?}: {}", game.elapsed(), stage, game.mission().briefing());
        }
    }

    let hp = game.world().player().map(|p| p.hp()).unwrap_or(0);
    match stage {
        Stage::Cleared => log::info!("mission cleared in {:.1}s with {hp} hp left", game.elapsed()),
        Stage::Failed => log::info!("mission failed after {:.1}s", game.elapsed()),
        _ => log::info!("stopped in {:?} after {:.1}s", stage, game.elapsed()),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // No browser front end; the library is the product on this target
}

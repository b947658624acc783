//! Timed multi-phase clock shared by every timed state
//!
//! A `PhaseTimer` walks through a fixed list of phase durations. Each call to
//! [`PhaseTimer::advance`] reports the active phase and its progress ratio
//! (`elapsed / duration`, clamped to 1.0). Crossing a phase boundary carries
//! the overshoot into the next phase; crossing the last one reports
//! [`PhaseTick::Completed`] exactly once.

/// Result of advancing a [`PhaseTimer`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhaseTick {
    /// Still inside `phase`; `progress` is in `[0, 1]`
    Running { phase: usize, progress: f32 },
    /// The final phase just elapsed (reported once)
    Completed,
    /// Already completed on an earlier call
    Spent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhaseTimer {
    durations: Vec<f32>,
    phase: usize,
    elapsed: f32,
    done: bool,
}

impl PhaseTimer {
    pub fn new(durations: &[f32]) -> Self {
        assert!(!durations.is_empty(), "phase timer needs at least one phase");
        assert!(
            durations.iter().all(|d| *d > 0.0),
            "phase durations must be positive"
        );
        Self {
            durations: durations.to_vec(),
            phase: 0,
            elapsed: 0.0,
            done: false,
        }
    }

    /// Single-phase timer
    pub fn single(duration: f32) -> Self {
        Self::new(&[duration])
    }

    /// Rewind to the start of the first phase
    pub fn reset(&mut self) {
        self.phase = 0;
        self.elapsed = 0.0;
        self.done = false;
    }

    pub fn advance(&mut self, dt: f32) -> PhaseTick {
        if self.done {
            return PhaseTick::Spent;
        }

        self.elapsed += dt;
        let duration = self.durations[self.phase];
        if self.elapsed < duration {
            return PhaseTick::Running {
                phase: self.phase,
                progress: self.elapsed / duration,
            };
        }

        if self.phase + 1 == self.durations.len() {
            self.done = true;
            return PhaseTick::Completed;
        }

        // Finish this phase at full progress; the overshoot counts toward the next
        let finished = self.phase;
        self.phase += 1;
        self.elapsed -= duration;
        PhaseTick::Running {
            phase: finished,
            progress: 1.0,
        }
    }

    pub fn phase(&self) -> usize {
        self.phase
    }

    /// Seconds spent in the current phase
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn duration(&self, phase: usize) -> f32 {
        self.durations[phase]
    }

    pub fn total_duration(&self) -> f32 {
        self.durations.iter().sum()
    }

    pub fn is_done(&self) -> bool {
        self.done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_two_phase_progress() {
        let mut t = PhaseTimer::new(&[1.0, 0.5]);

        assert_eq!(t.advance(0.25), PhaseTick::Running { phase: 0, progress: 0.25 });
        assert_eq!(t.advance(0.25), PhaseTick::Running { phase: 0, progress: 0.5 });
        // Boundary frame reports the finished phase at full progress
        assert_eq!(t.advance(0.5), PhaseTick::Running { phase: 0, progress: 1.0 });
        assert_eq!(t.phase(), 1);
        assert_eq!(t.advance(0.25), PhaseTick::Running { phase: 1, progress: 0.5 });
        assert_eq!(t.advance(0.25), PhaseTick::Completed);
        assert_eq!(t.advance(0.25), PhaseTick::Spent);
    }

    #[test]
    fn test_overshoot_carries_into_next_phase() {
        let mut t = PhaseTimer::new(&[1.0, 0.5]);
        assert_eq!(t.advance(1.125), PhaseTick::Running { phase: 0, progress: 1.0 });
        assert_eq!(t.elapsed(), 0.125);
        assert_eq!(t.advance(0.125), PhaseTick::Running { phase: 1, progress: 0.5 });
        // Total run time matches the summed durations, not one frame more
        assert_eq!(t.advance(0.25), PhaseTick::Completed);
    }

    #[test]
    fn test_reset_restarts() {
        let mut t = PhaseTimer::single(0.1);
        assert_eq!(t.advance(0.2), PhaseTick::Completed);
        t.reset();
        assert!(!t.is_done());
        assert!(matches!(t.advance(0.05), PhaseTick::Running { phase: 0, .. }));
    }

    proptest! {
        #[test]
        fn completes_exactly_once(dt in 0.001f32..0.2, a in 0.05f32..2.0, b in 0.05f32..2.0) {
            let mut t = PhaseTimer::new(&[a, b]);
            let mut completions = 0;
            for _ in 0..20_000 {
                if t.advance(dt) == PhaseTick::Completed {
                    completions += 1;
                }
            }
            prop_assert_eq!(completions, 1);
        }

        #[test]
        fn progress_stays_in_unit_range(dt in 0.001f32..0.5) {
            let mut t = PhaseTimer::new(&[0.3, 0.7, 0.2]);
            while let PhaseTick::Running { progress, .. } = t.advance(dt) {
                prop_assert!((0.0..=1.0).contains(&progress));
            }
        }
    }
}

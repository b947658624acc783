//! Generic event-driven state machine
//!
//! The machine only tracks *which* state is current and the immutable
//! transition table. State behavior lives in a host implementing [`States`],
//! usually the actor's core data, so hooks can mutate the actor freely while
//! the machine sits in a sibling field.
//!
//! # Usage
//! ```ignore
//! static TABLE: LazyLock<TransitionTable<Mode>> = LazyLock::new(|| {
//!     TransitionTable::new()
//!         .state(Mode::Idle, &[(EventKind::Run.into(), Mode::Walk)])
//!         .state(Mode::Walk, &[(EventKind::Stop.into(), Mode::Idle)])
//! });
//! let mut fsm = StateMachine::start(Mode::Idle, &TABLE, &mut core, &mut ctx);
//! fsm.handle_event(Event::signal(EventKind::Run), &mut core, &mut ctx);
//! fsm.update(&mut core, &mut ctx);
//! ```

use std::fmt::Debug;

use serde::Serialize;

use super::event::{Event, Trigger};
use super::state::TickContext;
use crate::renderer::{Camera, DrawList};

/// Behavior hooks for every state of one actor type
pub trait States {
    type Id: Copy + Eq + Debug;

    /// Called when `state` becomes current. `event` caused the transition.
    fn enter(&mut self, _state: Self::Id, _event: &Event, _ctx: &mut TickContext) {}

    /// Called when `state` stops being current. `event` caused the transition.
    fn exit(&mut self, _state: Self::Id, _event: &Event, _ctx: &mut TickContext) {}

    /// Per-frame work. A returned event is handed back into the same machine.
    fn step(&mut self, state: Self::Id, ctx: &mut TickContext) -> Option<Event>;

    fn draw(&self, state: Self::Id, camera: &Camera, out: &mut DrawList);
}

/// One row of the table: a state and its ordered outgoing edges
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row<S> {
    pub from: S,
    pub edges: Vec<(Trigger, S)>,
}

/// Immutable transition table keyed by state id
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionTable<S> {
    rows: Vec<Row<S>>,
}

impl<S> Default for TransitionTable<S> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<S: Copy + Eq + Debug> TransitionTable<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a state with its outgoing edges, in priority order.
    /// Terminal states are registered with no edges.
    pub fn state(mut self, from: S, edges: &[(Trigger, S)]) -> Self {
        assert!(
            self.edges(from).is_none(),
            "state {from:?} registered twice in transition table"
        );
        self.rows.push(Row {
            from,
            edges: edges.to_vec(),
        });
        self
    }

    /// Outgoing edges of `from`, if the state is registered
    pub fn edges(&self, from: S) -> Option<&[(Trigger, S)]> {
        self.rows
            .iter()
            .find(|row| row.from == from)
            .map(|row| row.edges.as_slice())
    }

    /// Target of the first edge of `from` whose trigger matches `event`
    ///
    /// # Panics
    /// If `from` is not in the table; that is a wiring bug, not a runtime condition.
    pub fn next_state(&self, from: S, event: &Event) -> Option<S> {
        let Some(edges) = self.edges(from) else {
            panic!("state {from:?} missing from transition table");
        };
        edges
            .iter()
            .find(|(trigger, _)| trigger.matches(event))
            .map(|(_, to)| *to)
    }

    pub fn states(&self) -> impl Iterator<Item = S> + '_ {
        self.rows.iter().map(|row| row.from)
    }
}

/// The running machine: current state plus a shared table
#[derive(Debug, Clone)]
pub struct StateMachine<S: 'static> {
    current: S,
    table: &'static TransitionTable<S>,
}

impl<S: Copy + Eq + Debug + 'static> StateMachine<S> {
    /// Create a machine and enter `initial` with a `Start` event
    pub fn start<H: States<Id = S>>(
        initial: S,
        table: &'static TransitionTable<S>,
        host: &mut H,
        ctx: &mut TickContext,
    ) -> Self {
        host.enter(initial, &Event::START, ctx);
        Self {
            current: initial,
            table,
        }
    }

    pub fn current(&self) -> S {
        self.current
    }

    pub fn is_in(&self, state: S) -> bool {
        self.current == state
    }

    pub fn table(&self) -> &'static TransitionTable<S> {
        self.table
    }

    /// Run the current state's per-frame step, feeding back any event it raises
    pub fn update<H: States<Id = S>>(&mut self, host: &mut H, ctx: &mut TickContext) {
        if let Some(event) = host.step(self.current, ctx) {
            self.handle_event(event, host, ctx);
        }
    }

    /// Fire the first matching transition. Returns false (and drops the
    /// event) when nothing in the current row matches.
    pub fn handle_event<H: States<Id = S>>(
        &mut self,
        event: Event,
        host: &mut H,
        ctx: &mut TickContext,
    ) -> bool {
        let Some(next) = self.table.next_state(self.current, &event) else {
            log::trace!("unhandled event {} in {:?}", event, self.current);
            return false;
        };

        host.exit(self.current, &event, ctx);
        host.enter(next, &event, ctx);
        log::debug!("{:?} ---- {} ----> {:?}", self.current, event, next);
        self.current = next;
        true
    }

    pub fn draw<H: States<Id = S>>(&self, host: &H, camera: &Camera, out: &mut DrawList) {
        host.draw(self.current, camera, out);
    }
}

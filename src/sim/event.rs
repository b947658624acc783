//! State machine events and the triggers that match them
//!
//! An [`Event`] is an immutable `(kind, payload)` pair. Synthetic kinds are
//! raised by a state's own step logic; `Input` wraps a raw input event that
//! triggers inspect by key or button only.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Keyboard keys the game reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    W,
    A,
    S,
    D,
    Escape,
    Space,
    Other,
}

/// Mouse buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Raw input delivered by the platform layer
///
/// Mouse coordinates are window coordinates with the origin at the top-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
    MouseMotion { x: f32, y: f32 },
    MouseDown(MouseButton),
    MouseUp(MouseButton),
    Quit,
}

/// Event kinds understood by the actor state machines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Delivered to the initial state when a machine starts
    Start,
    /// Wraps an [`InputEvent`]
    Input,
    Run,
    Stop,
    Timeout,
    SwingFinish,
    CloseRange,
    LongRange,
    HitBySword,
    DeathBlow,
    Fire,
    ShootFinish,
    ReloadNeeded,
    ReloadFinish,
    StartJump,
    StartShot,
    StartDash,
    FinishJump,
    FinishShot,
    FinishDash,
    Death,
    /// A Death state ran out its clock
    Expire,
}

/// A state machine event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    pub input: Option<InputEvent>,
}

impl Event {
    pub const START: Event = Event::signal(EventKind::Start);

    /// A payload-free synthetic event
    pub const fn signal(kind: EventKind) -> Self {
        Self { kind, input: None }
    }

    /// Wrap a raw input event
    pub const fn input(raw: InputEvent) -> Self {
        Self {
            kind: EventKind::Input,
            input: Some(raw),
        }
    }
}

impl From<EventKind> for Event {
    fn from(kind: EventKind) -> Self {
        Event::signal(kind)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.input {
            Some(raw) => write!(f, "({:?}, {:?})", self.kind, raw),
            None => write!(f, "({:?})", self.kind),
        }
    }
}

/// Input shapes a trigger can require
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputPattern {
    KeyDown(Key),
    KeyUp(Key),
    MouseDown(MouseButton),
    MouseUp(MouseButton),
}

impl InputPattern {
    pub fn matches(&self, raw: &InputEvent) -> bool {
        match (self, raw) {
            (InputPattern::KeyDown(k), InputEvent::KeyDown(e)) => k == e,
            (InputPattern::KeyUp(k), InputEvent::KeyUp(e)) => k == e,
            (InputPattern::MouseDown(b), InputEvent::MouseDown(e)) => b == e,
            (InputPattern::MouseUp(b), InputEvent::MouseUp(e)) => b == e,
            _ => false,
        }
    }
}

/// Data predicate tested against an incoming event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trigger {
    /// Any event of this kind
    On(EventKind),
    /// An `Input` event whose payload fits the pattern
    Input(InputPattern),
}

impl Trigger {
    /// Left mouse button pressed
    pub const ATTACK_DOWN: Trigger = Trigger::Input(InputPattern::MouseDown(MouseButton::Left));

    pub fn matches(&self, event: &Event) -> bool {
        match self {
            Trigger::On(kind) => event.kind == *kind,
            Trigger::Input(pattern) => {
                event.kind == EventKind::Input
                    && event.input.as_ref().is_some_and(|raw| pattern.matches(raw))
            }
        }
    }
}

impl From<EventKind> for Trigger {
    fn from(kind: EventKind) -> Self {
        Trigger::On(kind)
    }
}

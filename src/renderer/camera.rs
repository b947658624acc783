//! Mouse-led follow camera
//!
//! World and screen space are both y-up with the origin at the bottom-left.
//! The camera centers on the player and leans toward the cursor with an
//! ease-in curve, so small mouse moves barely shift the view.

use glam::Vec2;

use crate::consts::{CANVAS_HEIGHT, CANVAS_WIDTH};

/// Largest lean toward the mouse, in pixels per axis
pub const MAX_LOOK_OFFSET: f32 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    viewport: Vec2,
    max_offset: f32,
    /// World position of the screen's bottom-left corner
    origin: Vec2,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec2::new(CANVAS_WIDTH, CANVAS_HEIGHT))
    }
}

impl Camera {
    pub fn new(viewport: Vec2) -> Self {
        Self {
            viewport,
            max_offset: MAX_LOOK_OFFSET,
            origin: -viewport * 0.5,
        }
    }

    /// Re-center on `target`, leaning toward the mouse (screen coordinates)
    pub fn update(&mut self, target: Vec2, mouse_screen: Vec2) {
        let half = self.viewport * 0.5;
        let ratio = Vec2::new(
            if half.x != 0.0 { (mouse_screen.x - half.x) / half.x } else { 0.0 },
            if half.y != 0.0 { (mouse_screen.y - half.y) / half.y } else { 0.0 },
        );
        // Signed square: slow near the center, fast at the edges
        let eased = ratio * ratio.abs();
        let offset = (eased * self.max_offset).clamp(Vec2::splat(-self.max_offset), Vec2::splat(self.max_offset));

        self.origin = target + offset - half;
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    /// World point at the middle of the screen
    pub fn look_at(&self) -> Vec2 {
        self.origin + self.viewport * 0.5
    }

    pub fn to_screen(&self, world: Vec2) -> Vec2 {
        world - self.origin
    }

    pub fn to_world(&self, screen: Vec2) -> Vec2 {
        screen + self.origin
    }
}

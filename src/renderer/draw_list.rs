//! Backend-agnostic draw commands
//!
//! Everything is already in screen space (y-up, bottom-left origin) when it
//! lands in a [`DrawList`]; a backend only has to blit in order.

use glam::Vec2;

use super::sprites::SpriteKey;

/// Hitbox outline color
pub const HITBOX_COLOR: [f32; 4] = [1.0, 0.0, 0.0, 1.0];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    pub key: SpriteKey,
    /// Fractional frame index; backends truncate and wrap
    pub frame: f32,
    pub center: Vec2,
    pub size: Vec2,
    /// Radians, counter-clockwise
    pub rotation: f32,
    /// Mirror horizontally
    pub flip: bool,
    pub alpha: f32,
}

impl Sprite {
    pub fn new(key: SpriteKey, center: Vec2, size: Vec2) -> Self {
        Self {
            key,
            frame: 0.0,
            center,
            size,
            rotation: 0.0,
            flip: false,
            alpha: 1.0,
        }
    }

    pub fn frame(mut self, frame: f32) -> Self {
        self.frame = frame;
        self
    }

    pub fn rotated(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn flipped(mut self, flip: bool) -> Self {
        self.flip = flip;
        self
    }

    pub fn alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawCmd {
    Sprite(Sprite),
    /// Rectangle outline (debug hitboxes)
    Rect { min: Vec2, max: Vec2, color: [f32; 4] },
    /// Screen-space gauge; `fill` in `[0, 1]`
    HpBar { center: Vec2, size: Vec2, fill: f32 },
}

#[derive(Debug, Clone, Default)]
pub struct DrawList {
    commands: Vec<DrawCmd>,
    show_hitboxes: bool,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hitboxes(show_hitboxes: bool) -> Self {
        Self {
            commands: Vec::new(),
            show_hitboxes,
        }
    }

    pub fn sprite(&mut self, sprite: Sprite) {
        self.commands.push(DrawCmd::Sprite(sprite));
    }

    /// Outline a world box already converted to screen space.
    /// Ignored unless hitbox display is on.
    pub fn hitbox(&mut self, min: Vec2, max: Vec2) {
        if self.show_hitboxes && max.x > min.x && max.y > min.y {
            self.commands.push(DrawCmd::Rect {
                min,
                max,
                color: HITBOX_COLOR,
            });
        }
    }

    pub fn hp_bar(&mut self, center: Vec2, size: Vec2, fill: f32) {
        self.commands.push(DrawCmd::HpBar {
            center,
            size,
            fill: fill.clamp(0.0, 1.0),
        });
    }

    pub fn commands(&self) -> &[DrawCmd] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn sprites(&self) -> impl Iterator<Item = &Sprite> {
        self.commands.iter().filter_map(|c| match c {
            DrawCmd::Sprite(s) => Some(s),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hitboxes_hidden_by_default() {
        let mut list = DrawList::new();
        list.hitbox(Vec2::ZERO, Vec2::ONE);
        assert!(list.is_empty());

        let mut list = DrawList::with_hitboxes(true);
        list.hitbox(Vec2::ZERO, Vec2::ONE);
        // Degenerate boxes are never outlined
        list.hitbox(Vec2::ZERO, Vec2::ZERO);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_hp_bar_fill_clamped() {
        let mut list = DrawList::new();
        list.hp_bar(Vec2::ZERO, Vec2::ONE, 1.5);
        assert!(matches!(list.commands()[0], DrawCmd::HpBar { fill, .. } if fill == 1.0));
    }
}

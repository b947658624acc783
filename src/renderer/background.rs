//! Infinitely tiled ground texture

use glam::Vec2;

use super::camera::Camera;
use super::draw_list::{DrawList, Sprite};
use super::sprites::SpriteKey;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Background {
    tile: Vec2,
}

impl Default for Background {
    fn default() -> Self {
        Self {
            tile: SpriteKey::Background.frame_size(),
        }
    }
}

impl Background {
    pub fn new(tile: Vec2) -> Self {
        assert!(tile.x > 0.0 && tile.y > 0.0, "background tile must have area");
        Self { tile }
    }

    /// Inclusive tile index range covering the viewport, with one tile of slack
    pub fn tile_range(&self, camera: &Camera) -> (glam::IVec2, glam::IVec2) {
        let origin = camera.origin();
        let start = (origin / self.tile).floor().as_ivec2();
        let end = ((origin + camera.viewport()) / self.tile).floor().as_ivec2() + glam::IVec2::ONE;
        (start, end)
    }

    pub fn draw(&self, camera: &Camera, out: &mut DrawList) {
        let (start, end) = self.tile_range(camera);
        for x in start.x..=end.x {
            for y in start.y..=end.y {
                let world_min = Vec2::new(x as f32, y as f32) * self.tile;
                let center = camera.to_screen(world_min + self.tile * 0.5);
                out.sprite(Sprite::new(SpriteKey::Background, center, self.tile));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiles_cover_viewport() {
        let bg = Background::new(Vec2::new(1920.0, 1080.0));
        let mut cam = Camera::default();
        cam.update(Vec2::new(2500.0, 0.0), Vec2::new(960.0, 540.0));

        let mut list = DrawList::new();
        bg.draw(&cam, &mut list);

        let vp = cam.viewport();
        // Every screen corner lies inside some tile
        for corner in [Vec2::ZERO, Vec2::new(vp.x, 0.0), Vec2::new(0.0, vp.y), vp] {
            assert!(list.sprites().any(|s| {
                let half = s.size * 0.5;
                corner.cmpge(s.center - half).all() && corner.cmple(s.center + half).all()
            }));
        }
    }
}

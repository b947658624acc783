//! Sprite sheet metadata
//!
//! Every sheet is a single horizontal strip of equally sized frames. The
//! atlas records which sheets are actually available; lookups for anything
//! else return `None` and the draw is skipped.

use std::collections::HashMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::draw_list::{DrawCmd, DrawList};

/// Which way a character faces, relative to the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    /// Toward the viewer
    F,
    /// Away from the viewer
    B,
    /// Right, toward the viewer
    RF,
    /// Right, away from the viewer
    RB,
}

/// Every sprite sheet the game draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpriteKey {
    PlayerIdle(Facing),
    PlayerWalk(Facing),
    Sword,
    SwordAura,
    SwordWave,
    EnemyWalkF,
    EnemyWalkB,
    EnemyHit,
    EnemyDeath,
    GunShoot,
    GunReload,
    EnemyBullet,
    Shadow,
    BossWalk,
    BossDeath,
    BossHpBar,
    BossHpFill,
    Dummy,
    Background,
}

/// Static layout of one sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteSheet {
    pub path: &'static str,
    pub frame_w: u32,
    pub frame_h: u32,
    pub frames: u32,
}

const fn sheet(path: &'static str, frame_w: u32, frame_h: u32, frames: u32) -> SpriteSheet {
    SpriteSheet {
        path,
        frame_w,
        frame_h,
        frames,
    }
}

impl SpriteKey {
    pub const ALL_FACINGS: [Facing; 4] = [Facing::F, Facing::B, Facing::RF, Facing::RB];

    /// Layout of the sheet behind this key
    pub const fn sheet(self) -> SpriteSheet {
        match self {
            SpriteKey::PlayerIdle(Facing::F) => sheet("player/idle_f.png", 16, 23, 4),
            SpriteKey::PlayerIdle(Facing::B) => sheet("player/idle_b.png", 12, 23, 4),
            SpriteKey::PlayerIdle(Facing::RF) => sheet("player/idle_rf.png", 18, 23, 4),
            SpriteKey::PlayerIdle(Facing::RB) => sheet("player/idle_rb.png", 15, 23, 4),
            SpriteKey::PlayerWalk(Facing::F) => sheet("player/walk_f.png", 14, 30, 3),
            SpriteKey::PlayerWalk(Facing::B) => sheet("player/walk_b.png", 14, 23, 3),
            SpriteKey::PlayerWalk(Facing::RF) => sheet("player/walk_rf.png", 17, 25, 3),
            SpriteKey::PlayerWalk(Facing::RB) => sheet("player/walk_rb.png", 17, 26, 3),
            SpriteKey::Sword => sheet("weapon/sword.png", 75, 25, 1),
            SpriteKey::SwordAura => sheet("weapon/sword_aura.png", 1000, 1000, 1),
            SpriteKey::SwordWave => sheet("weapon/sword_wave.png", 64, 64, 1),
            SpriteKey::EnemyWalkF => sheet("enemy/walk_f.png", 16, 24, 6),
            SpriteKey::EnemyWalkB => sheet("enemy/walk_b.png", 15, 24, 7),
            SpriteKey::EnemyHit => sheet("enemy/hit.png", 15, 23, 1),
            SpriteKey::EnemyDeath => sheet("enemy/death.png", 23, 23, 4),
            SpriteKey::GunShoot => sheet("weapon/gun_shoot.png", 18, 9, 4),
            SpriteKey::GunReload => sheet("weapon/gun_reload.png", 18, 17, 5),
            SpriteKey::EnemyBullet => sheet("weapon/bullet.png", 32, 32, 1),
            SpriteKey::Shadow => sheet("shadow/shadow.png", 32, 16, 1),
            SpriteKey::BossWalk => sheet("boss/walk.png", 50, 60, 6),
            SpriteKey::BossDeath => sheet("boss/death.png", 46, 60, 3),
            SpriteKey::BossHpBar => sheet("ui/boss_hp_bar.png", 1000, 100, 1),
            SpriteKey::BossHpFill => sheet("ui/boss_hp_fill.png", 1000, 100, 1),
            SpriteKey::Dummy => sheet("dummy/idle.png", 64, 64, 10),
            SpriteKey::Background => sheet("background.png", 1920, 1080, 1),
        }
    }

    pub const fn frames(self) -> u32 {
        self.sheet().frames
    }

    /// Frame size in pixels
    pub fn frame_size(self) -> Vec2 {
        let s = self.sheet();
        Vec2::new(s.frame_w as f32, s.frame_h as f32)
    }

    /// Every key, for building a complete atlas
    pub fn all() -> Vec<SpriteKey> {
        let mut keys = Vec::new();
        for facing in Self::ALL_FACINGS {
            keys.push(SpriteKey::PlayerIdle(facing));
            keys.push(SpriteKey::PlayerWalk(facing));
        }
        keys.extend([
            SpriteKey::Sword,
            SpriteKey::SwordAura,
            SpriteKey::SwordWave,
            SpriteKey::EnemyWalkF,
            SpriteKey::EnemyWalkB,
            SpriteKey::EnemyHit,
            SpriteKey::EnemyDeath,
            SpriteKey::GunShoot,
            SpriteKey::GunReload,
            SpriteKey::EnemyBullet,
            SpriteKey::Shadow,
            SpriteKey::BossWalk,
            SpriteKey::BossDeath,
            SpriteKey::BossHpBar,
            SpriteKey::BossHpFill,
            SpriteKey::Dummy,
            SpriteKey::Background,
        ]);
        keys
    }
}

/// Source rectangle of one frame inside its sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// A sprite command with its sheet resolved, ready for a backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteQuad {
    pub path: &'static str,
    pub src: FrameRect,
    pub center: Vec2,
    pub size: Vec2,
    pub rotation: f32,
    pub flip: bool,
    pub alpha: f32,
}

/// The set of sheets the backend managed to load
#[derive(Debug, Clone, Default)]
pub struct SpriteAtlas {
    sheets: HashMap<SpriteKey, SpriteSheet>,
}

impl SpriteAtlas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atlas with every known sheet present
    pub fn complete() -> Self {
        let mut atlas = Self::new();
        for key in SpriteKey::all() {
            atlas.insert(key);
        }
        atlas
    }

    pub fn insert(&mut self, key: SpriteKey) {
        self.sheets.insert(key, key.sheet());
    }

    pub fn remove(&mut self, key: SpriteKey) {
        self.sheets.remove(&key);
    }

    pub fn get(&self, key: SpriteKey) -> Option<&SpriteSheet> {
        self.sheets.get(&key)
    }

    /// Source rectangle for a (possibly fractional) frame index, wrapped to the sheet
    pub fn frame_rect(&self, key: SpriteKey, frame: f32) -> Option<FrameRect> {
        let sheet = self.get(key)?;
        let idx = (frame.max(0.0) as u32) % sheet.frames.max(1);
        Some(FrameRect {
            x: idx * sheet.frame_w,
            y: 0,
            w: sheet.frame_w,
            h: sheet.frame_h,
        })
    }

    /// Resolve every sprite command in `list`. Sprites whose sheet is not
    /// loaded are skipped with a warning.
    pub fn resolve(&self, list: &DrawList) -> Vec<SpriteQuad> {
        let mut quads = Vec::new();
        for cmd in list.commands() {
            let DrawCmd::Sprite(sprite) = cmd else { continue };
            let (Some(sheet), Some(src)) = (self.get(sprite.key), self.frame_rect(sprite.key, sprite.frame)) else {
                log::warn!("missing sprite sheet for {:?}, skipping draw", sprite.key);
                continue;
            };
            quads.push(SpriteQuad {
                path: sheet.path,
                src,
                center: sprite.center,
                size: sprite.size,
                rotation: sprite.rotation,
                flip: sprite.flip,
                alpha: sprite.alpha,
            });
        }
        quads
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::draw_list::Sprite;

    #[test]
    fn test_frame_rect_wraps() {
        let atlas = SpriteAtlas::complete();
        let rect = atlas.frame_rect(SpriteKey::BossWalk, 7.9).unwrap();
        // 7 % 6 == 1
        assert_eq!(rect, FrameRect { x: 50, y: 0, w: 50, h: 60 });
    }

    #[test]
    fn test_missing_sheet_is_skipped() {
        let mut atlas = SpriteAtlas::complete();
        atlas.remove(SpriteKey::Sword);

        let mut list = DrawList::new();
        list.sprite(Sprite::new(SpriteKey::Sword, Vec2::ZERO, Vec2::ONE));
        list.sprite(Sprite::new(SpriteKey::EnemyBullet, Vec2::ZERO, Vec2::ONE));

        let quads = atlas.resolve(&list);
        assert_eq!(quads.len(), 1);
        assert_eq!(quads[0].path, SpriteKey::EnemyBullet.sheet().path);
    }

    #[test]
    fn test_all_keys_are_unique() {
        let keys = SpriteKey::all();
        let atlas = SpriteAtlas::complete();
        assert_eq!(atlas.sheets.len(), keys.len());
    }
}

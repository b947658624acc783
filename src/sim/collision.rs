//! Collision groups and axis-aligned overlap tests
//!
//! Each named group pairs a list of "left" participants with a list of
//! "right" participants. Only left × right pairs inside the same group are
//! tested, so a frame never runs an all-pairs check over the whole world.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::EntityId;

/// Axis-aligned bounding box in world pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    /// Zero-area box; never overlaps anything
    pub const EMPTY: Aabb = Aabb {
        min: Vec2::ZERO,
        max: Vec2::ZERO,
    };

    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// True for zero-area (or inverted) boxes
    pub fn is_empty(&self) -> bool {
        self.max.x <= self.min.x || self.max.y <= self.min.y
    }

    /// Overlap test, edges touching count as overlap.
    /// A degenerate box overlaps nothing.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        !(self.min.x > other.max.x
            || self.max.x < other.min.x
            || self.max.y < other.min.y
            || self.min.y > other.max.y)
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }
}

/// Named collision partitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollisionGroup {
    /// Player's sword vs enemies, boss and training dummy
    SwordEnemy,
    /// Sword wave projectiles vs enemies, boss and training dummy
    SwordBulletEnemy,
    /// Player body vs enemy bullets
    PlayerEnemyBullet,
    /// Player's sword vs enemy bullets (parry)
    SwordEnemyBullet,
    /// Player body vs boss body
    PlayerBoss,
}

impl CollisionGroup {
    pub fn name(self) -> &'static str {
        match self {
            CollisionGroup::SwordEnemy => "sword:enemy",
            CollisionGroup::SwordBulletEnemy => "sword_bullet:enemy",
            CollisionGroup::PlayerEnemyBullet => "player:enemy_bullet",
            CollisionGroup::SwordEnemyBullet => "sword:enemy_bullet",
            CollisionGroup::PlayerBoss => "player:boss",
        }
    }
}

impl fmt::Display for CollisionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Pairing {
    group: CollisionGroup,
    left: Vec<EntityId>,
    right: Vec<EntityId>,
}

/// A pair whose boxes overlap this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlap {
    pub group: CollisionGroup,
    pub left: EntityId,
    pub right: EntityId,
}

/// Registry of collision groups, kept in registration order
#[derive(Debug, Clone, Default)]
pub struct CollisionRegistry {
    pairings: Vec<Pairing>,
}

impl CollisionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `left` and/or `right` to `group`, creating the group on first use.
    /// Passing `None` leaves that side untouched.
    pub fn register(&mut self, group: CollisionGroup, left: Option<EntityId>, right: Option<EntityId>) {
        let idx = match self.pairings.iter().position(|p| p.group == group) {
            Some(idx) => idx,
            None => {
                self.pairings.push(Pairing {
                    group,
                    left: Vec::new(),
                    right: Vec::new(),
                });
                self.pairings.len() - 1
            }
        };
        let pairing = &mut self.pairings[idx];
        if let Some(id) = left
            && !pairing.left.contains(&id)
        {
            pairing.left.push(id);
        }
        if let Some(id) = right
            && !pairing.right.contains(&id)
        {
            pairing.right.push(id);
        }
    }

    /// Drop `id` from every group
    pub fn unregister(&mut self, id: EntityId) {
        for pairing in &mut self.pairings {
            pairing.left.retain(|e| *e != id);
            pairing.right.retain(|e| *e != id);
        }
    }

    pub fn clear(&mut self) {
        self.pairings.clear();
    }

    /// Left and right participants of `group`
    pub fn members(&self, group: CollisionGroup) -> Option<(&[EntityId], &[EntityId])> {
        self.pairings
            .iter()
            .find(|p| p.group == group)
            .map(|p| (p.left.as_slice(), p.right.as_slice()))
    }

    pub fn groups(&self) -> impl Iterator<Item = CollisionGroup> + '_ {
        self.pairings.iter().map(|p| p.group)
    }

    /// All overlapping left × right pairs, group by group in registration order.
    /// `bounds` returns `None` for ids that no longer exist.
    pub fn overlaps<F>(&self, bounds: F) -> Vec<Overlap>
    where
        F: Fn(EntityId) -> Option<Aabb>,
    {
        let mut hits = Vec::new();
        for pairing in &self.pairings {
            for &left in &pairing.left {
                let Some(a) = bounds(left) else { continue };
                if a.is_empty() {
                    continue;
                }
                for &right in &pairing.right {
                    if left == right {
                        continue;
                    }
                    let Some(b) = bounds(right) else { continue };
                    if a.overlaps(&b) {
                        hits.push(Overlap {
                            group: pairing.group,
                            left,
                            right,
                        });
                    }
                }
            }
        }
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box(x: f32, y: f32) -> Aabb {
        Aabb::from_center(Vec2::new(x, y), Vec2::splat(1.0))
    }

    #[test]
    fn test_overlap_and_touching_edges() {
        assert!(unit_box(0.0, 0.0).overlaps(&unit_box(1.5, 0.0)));
        assert!(unit_box(0.0, 0.0).overlaps(&unit_box(2.0, 0.0)));
        assert!(!unit_box(0.0, 0.0).overlaps(&unit_box(2.1, 0.0)));
        assert!(!unit_box(0.0, 0.0).overlaps(&unit_box(0.0, -2.5)));
    }

    #[test]
    fn test_degenerate_box_never_overlaps() {
        let big = Aabb::from_center(Vec2::ZERO, Vec2::splat(1000.0));
        assert!(!Aabb::EMPTY.overlaps(&big));
        assert!(!big.overlaps(&Aabb::EMPTY));
        // Zero width but tall
        let sliver = Aabb::new(Vec2::new(5.0, -50.0), Vec2::new(5.0, 50.0));
        assert!(!sliver.overlaps(&big));
    }

    #[test]
    fn test_register_accumulates_sides() {
        let mut reg = CollisionRegistry::new();
        reg.register(CollisionGroup::SwordEnemy, Some(EntityId(1)), None);
        reg.register(CollisionGroup::SwordEnemy, None, Some(EntityId(2)));
        reg.register(CollisionGroup::SwordEnemy, None, Some(EntityId(3)));
        reg.register(CollisionGroup::SwordEnemy, None, Some(EntityId(3)));

        let (left, right) = reg.members(CollisionGroup::SwordEnemy).unwrap();
        assert_eq!(left, &[EntityId(1)]);
        assert_eq!(right, &[EntityId(2), EntityId(3)]);

        reg.unregister(EntityId(2));
        let (_, right) = reg.members(CollisionGroup::SwordEnemy).unwrap();
        assert_eq!(right, &[EntityId(3)]);
    }

    #[test]
    fn test_overlaps_only_within_group() {
        let mut reg = CollisionRegistry::new();
        reg.register(CollisionGroup::PlayerEnemyBullet, Some(EntityId(1)), Some(EntityId(2)));
        reg.register(CollisionGroup::SwordBulletEnemy, Some(EntityId(3)), Some(EntityId(4)));

        // Everything sits on top of everything else
        let hits = reg.overlaps(|_| Some(unit_box(0.0, 0.0)));
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].group, CollisionGroup::PlayerEnemyBullet);
        assert_eq!((hits[0].left, hits[0].right), (EntityId(1), EntityId(2)));
        assert_eq!((hits[1].left, hits[1].right), (EntityId(3), EntityId(4)));
    }

    #[test]
    fn test_degenerate_participant_is_skipped() {
        let mut reg = CollisionRegistry::new();
        reg.register(CollisionGroup::SwordEnemy, Some(EntityId(1)), Some(EntityId(2)));
        let hits = reg.overlaps(|id| {
            if id == EntityId(1) {
                Some(Aabb::EMPTY)
            } else {
                Some(Aabb::from_center(Vec2::ZERO, Vec2::splat(10.0)))
            }
        });
        assert!(hits.is_empty());
    }
}

//! World registry
//!
//! Owns every entity, the collision registry and the seeded RNG. Entities
//! are stored by id (stable update order) and listed per draw layer in
//! insertion order. Effects requested during a pass are queued as
//! [`Command`]s and applied once the pass is over.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;
use rand_pcg::Pcg32;

use super::actors::boss::BossConfig;
use super::actors::enemy::{EnemyConfig, ring_position};
use super::actors::{Actor, Boss, Dummy, Enemy, EnemyBullet, Entity, Player, Sword, SwordBullet};
use super::collision::{CollisionGroup, CollisionRegistry, Overlap};
use super::event::InputEvent;
use super::state::{ActorKind, Command, EntityId, PlayerView, RngState, Spawn, TickContext};
use crate::audio::Cue;
use crate::renderer::{Camera, DrawList};

/// Draw layers, back to front
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    Characters,
    Weapons,
    Projectiles,
}

impl Layer {
    pub const COUNT: usize = 3;

    pub fn for_kind(kind: ActorKind) -> Layer {
        match kind {
            ActorKind::Player | ActorKind::Enemy | ActorKind::Boss | ActorKind::Dummy => {
                Layer::Characters
            }
            ActorKind::Sword => Layer::Weapons,
            ActorKind::EnemyBullet | ActorKind::SwordBullet => Layer::Projectiles,
        }
    }
}

/// Upper bound on command-application rounds per pass
const MAX_COMMAND_ROUNDS: usize = 8;

/// Group resolution order. A parry lands before the same bullet can hit the
/// player; a dead boss is settled by the sword before its body is checked.
const GROUP_ORDER: [CollisionGroup; 5] = [
    CollisionGroup::SwordEnemyBullet,
    CollisionGroup::PlayerEnemyBullet,
    CollisionGroup::SwordEnemy,
    CollisionGroup::SwordBulletEnemy,
    CollisionGroup::PlayerBoss,
];

fn declare_groups(reg: &mut CollisionRegistry) {
    for group in GROUP_ORDER {
        reg.register(group, None, None);
    }
}

pub struct World {
    entities: BTreeMap<EntityId, Entity>,
    layers: [Vec<EntityId>; Layer::COUNT],
    collisions: CollisionRegistry,
    rng: Pcg32,
    commands: Vec<Command>,
    cues: Vec<Cue>,
    next_id: u32,
    player: Option<EntityId>,
    sword: Option<EntityId>,
    view: PlayerView,
}

impl World {
    pub fn new(seed: u64) -> Self {
        let mut collisions = CollisionRegistry::new();
        declare_groups(&mut collisions);
        Self {
            entities: BTreeMap::new(),
            layers: Default::default(),
            collisions,
            rng: RngState::new(seed).to_rng(),
            commands: Vec::new(),
            cues: Vec::new(),
            next_id: 1,
            player: None,
            sword: None,
            view: PlayerView::default(),
        }
    }

    fn alloc_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Run `f` with a context over the world's RNG and command queue
    fn with_ctx<R>(&mut self, dt: f32, f: impl FnOnce(&mut TickContext) -> R) -> R {
        let mut ctx = TickContext::new(dt, self.view, &mut self.rng, &mut self.commands);
        f(&mut ctx)
    }

    fn insert(&mut self, entity: Entity) -> EntityId {
        let id = entity.actor().id();
        let kind = entity.kind();
        self.register_groups(id, kind);
        self.layers[Layer::for_kind(kind) as usize].push(id);
        self.entities.insert(id, entity);
        id
    }

    fn register_groups(&mut self, id: EntityId, kind: ActorKind) {
        use CollisionGroup::*;
        let reg = &mut self.collisions;
        match kind {
            ActorKind::Sword => {
                reg.register(SwordEnemy, Some(id), None);
                reg.register(SwordEnemyBullet, Some(id), None);
            }
            ActorKind::Player => {
                reg.register(PlayerEnemyBullet, Some(id), None);
                reg.register(PlayerBoss, Some(id), None);
            }
            ActorKind::Enemy | ActorKind::Dummy => {
                reg.register(SwordEnemy, None, Some(id));
                reg.register(SwordBulletEnemy, None, Some(id));
            }
            ActorKind::Boss => {
                reg.register(SwordEnemy, None, Some(id));
                reg.register(SwordBulletEnemy, None, Some(id));
                reg.register(PlayerBoss, None, Some(id));
            }
            ActorKind::EnemyBullet => {
                reg.register(PlayerEnemyBullet, None, Some(id));
                reg.register(SwordEnemyBullet, None, Some(id));
            }
            ActorKind::SwordBullet => {
                reg.register(SwordBulletEnemy, Some(id), None);
            }
        }
    }

    /// Spawn the player and the sword it carries
    pub fn spawn_player(&mut self, pos: Vec2, hp: i32, invulnerability: f32) -> EntityId {
        let id = self.alloc_id();
        let sword_id = self.alloc_id();
        self.view.pos = pos;
        let player = self.with_ctx(0.0, |ctx| Player::new(id, pos, hp, invulnerability, ctx));
        self.insert(Entity::Player(player));
        let sword = self.with_ctx(0.0, |ctx| Sword::new(sword_id, id, ctx));
        self.insert(Entity::Sword(sword));
        self.player = Some(id);
        self.sword = Some(sword_id);
        log::debug!("spawned player {id:?} with sword {sword_id:?} at {pos}");
        id
    }

    pub fn spawn_enemy(&mut self, pos: Vec2, config: EnemyConfig) -> EntityId {
        let id = self.alloc_id();
        let enemy = self.with_ctx(0.0, |ctx| Enemy::new(id, pos, config, ctx));
        self.insert(Entity::Enemy(enemy))
    }

    /// Spawn `count` enemies at random points on a ring around `center`
    pub fn spawn_enemy_ring(&mut self, center: Vec2, radius: f32, count: u32, config: EnemyConfig) {
        for _ in 0..count {
            let pos = self.with_ctx(0.0, |ctx| ring_position(center, radius, ctx));
            self.spawn_enemy(pos, config);
        }
    }

    pub fn spawn_boss(&mut self, pos: Vec2, config: BossConfig) -> EntityId {
        let id = self.alloc_id();
        let boss = self.with_ctx(0.0, |ctx| Boss::new(id, pos, config, ctx));
        log::info!("boss {id:?} spawned at {pos}");
        self.insert(Entity::Boss(boss))
    }

    pub fn spawn_dummy(&mut self, pos: Vec2) -> EntityId {
        let id = self.alloc_id();
        self.insert(Entity::Dummy(Dummy::new(id, pos)))
    }

    pub fn spawn_enemy_bullet(&mut self, pos: Vec2, angle: f32) -> EntityId {
        let id = self.alloc_id();
        self.insert(Entity::EnemyBullet(EnemyBullet::new(id, pos, angle)))
    }

    pub fn spawn_sword_bullet(&mut self, pos: Vec2, angle: f32) -> EntityId {
        let id = self.alloc_id();
        self.insert(Entity::SwordBullet(SwordBullet::new(id, pos, angle)))
    }

    /// Remove an entity right away; unknown ids are ignored
    pub fn despawn(&mut self, id: EntityId) {
        let Some(entity) = self.entities.remove(&id) else {
            return;
        };
        self.layers[Layer::for_kind(entity.kind()) as usize].retain(|e| *e != id);
        self.collisions.unregister(id);
        if self.player == Some(id) {
            self.player = None;
        }
        if self.sword == Some(id) {
            self.sword = None;
        }
    }

    /// Apply queued commands. Spawning can queue more, so this repeats a
    /// bounded number of times.
    fn apply_commands(&mut self) {
        for _ in 0..MAX_COMMAND_ROUNDS {
            if self.commands.is_empty() {
                return;
            }
            for command in std::mem::take(&mut self.commands) {
                match command {
                    Command::Spawn(Spawn::EnemyBullet { pos, angle }) => {
                        self.spawn_enemy_bullet(pos, angle);
                    }
                    Command::Spawn(Spawn::SwordBullet { pos, angle }) => {
                        self.spawn_sword_bullet(pos, angle);
                    }
                    Command::Despawn(id) => self.despawn(id),
                    Command::Cue(cue) => self.cues.push(cue),
                }
            }
        }
        log::warn!("dropping {} commands still queued", self.commands.len());
        self.commands.clear();
    }

    fn refresh_view(&mut self) {
        if let Some(player) = self.player() {
            self.view.pos = player.pos();
        }
    }

    /// Route raw input to the player, then to its sword
    pub fn handle_input(&mut self, raw: &InputEvent) {
        for id in [self.player, self.sword].into_iter().flatten() {
            if let Some(entity) = self.entities.get_mut(&id) {
                let mut ctx = TickContext::new(0.0, self.view, &mut self.rng, &mut self.commands);
                entity.actor_mut().handle_input(raw, &mut ctx);
            }
        }
        self.apply_commands();
    }

    /// Update every entity: the player first, then everything else by id
    pub fn update(&mut self, dt: f32) {
        if let Some(id) = self.player
            && let Some(entity) = self.entities.get_mut(&id)
        {
            let mut ctx = TickContext::new(dt, self.view, &mut self.rng, &mut self.commands);
            entity.actor_mut().update(&mut ctx);
        }
        self.refresh_view();

        let ids: Vec<EntityId> = self.entities.keys().copied().collect();
        for id in ids {
            if Some(id) == self.player {
                continue;
            }
            if let Some(entity) = self.entities.get_mut(&id) {
                let mut ctx = TickContext::new(dt, self.view, &mut self.rng, &mut self.commands);
                entity.actor_mut().update(&mut ctx);
            }
        }
        self.apply_commands();
    }

    /// Dispatch every overlapping pair to both participants. A participant
    /// despawned earlier in the pass takes no further part in it.
    pub fn resolve_collisions(&mut self) {
        let overlaps = self
            .collisions
            .overlaps(|id| self.entities.get(&id).map(|e| e.actor().bounding_box()));

        let mut gone = BTreeSet::new();
        for Overlap { group, left, right } in overlaps {
            if gone.contains(&left) || gone.contains(&right) {
                continue;
            }
            let (Some(l), Some(r)) = (self.entities.get(&left), self.entities.get(&right)) else {
                continue;
            };
            let (left_contact, right_contact) = (l.actor().contact(), r.actor().contact());

            let mark = self.commands.len();
            if let Some(entity) = self.entities.get_mut(&left) {
                let mut ctx = TickContext::new(0.0, self.view, &mut self.rng, &mut self.commands);
                entity.actor_mut().handle_collision(group, &right_contact, &mut ctx);
            }
            if let Some(entity) = self.entities.get_mut(&right) {
                let mut ctx = TickContext::new(0.0, self.view, &mut self.rng, &mut self.commands);
                entity.actor_mut().handle_collision(group, &left_contact, &mut ctx);
            }
            gone.extend(self.commands[mark..].iter().filter_map(|c| match c {
                Command::Despawn(id) => Some(*id),
                _ => None,
            }));
        }
        self.apply_commands();
    }

    /// Draw layer by layer, in insertion order within a layer
    pub fn draw(&self, camera: &Camera, out: &mut DrawList) {
        for layer in &self.layers {
            for id in layer {
                if let Some(entity) = self.entities.get(id) {
                    entity.actor().draw(camera, out);
                }
            }
        }
    }

    pub fn set_mouse_world(&mut self, pos: Vec2) {
        self.view.mouse_world = pos;
    }

    pub fn view(&self) -> PlayerView {
        self.view
    }

    pub fn queue_cue(&mut self, cue: Cue) {
        self.cues.push(cue);
    }

    pub fn drain_cues(&mut self) -> Vec<Cue> {
        std::mem::take(&mut self.cues)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn player(&self) -> Option<&Player> {
        self.player.and_then(|id| self.entities.get(&id)).and_then(Entity::as_player)
    }

    pub fn sword(&self) -> Option<&Sword> {
        self.sword.and_then(|id| self.entities.get(&id)).and_then(Entity::as_sword)
    }

    pub fn count(&self, kind: ActorKind) -> usize {
        self.entities.values().filter(|e| e.kind() == kind).count()
    }

    pub fn enemy_count(&self) -> usize {
        self.count(ActorKind::Enemy)
    }

    pub fn boss_count(&self) -> usize {
        self.count(ActorKind::Boss)
    }

    /// True once any training dummy has been struck
    pub fn dummy_struck(&self) -> bool {
        self.entities
            .values()
            .filter_map(Entity::as_dummy)
            .any(Dummy::struck)
    }

    /// Closest enemy, boss or dummy still standing
    pub fn nearest_target(&self, from: Vec2) -> Option<Vec2> {
        self.entities
            .values()
            .filter(|e| match e {
                Entity::Enemy(enemy) => !enemy.is_down(),
                Entity::Boss(boss) => !boss.is_down(),
                Entity::Dummy(_) => true,
                _ => false,
            })
            .map(|e| e.actor().pos())
            .min_by(|a, b| a.distance_squared(from).total_cmp(&b.distance_squared(from)))
    }

    pub fn despawn_kind(&mut self, kind: ActorKind) {
        let ids: Vec<EntityId> = self
            .entities
            .values()
            .filter(|e| e.kind() == kind)
            .map(|e| e.actor().id())
            .collect();
        for id in ids {
            self.despawn(id);
        }
    }

    pub fn clear_projectiles(&mut self) {
        self.despawn_kind(ActorKind::EnemyBullet);
        self.despawn_kind(ActorKind::SwordBullet);
    }

    /// Remove everything; ids keep counting up
    pub fn clear(&mut self) {
        self.entities.clear();
        self.layers = Default::default();
        self.collisions.clear();
        declare_groups(&mut self.collisions);
        self.commands.clear();
        self.player = None;
        self.sword = None;
    }

    pub fn collisions(&self) -> &CollisionRegistry {
        &self.collisions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::actors::{BossState, EnemyState, SwordState};
    use crate::sim::event::MouseButton;

    fn world_with_player() -> World {
        let mut world = World::new(7);
        world.spawn_player(Vec2::new(960.0, 540.0), 5, 1.0);
        world
    }

    #[test]
    fn test_player_spawn_registers_sword() {
        let world = world_with_player();
        assert_eq!(world.len(), 2);
        assert!(world.player().is_some());
        assert_eq!(world.sword().map(Sword::state), Some(SwordState::Idle));
        let (left, right) = world.collisions().members(CollisionGroup::SwordEnemy).unwrap();
        assert_eq!(left.len(), 1);
        assert!(right.is_empty());
    }

    #[test]
    fn test_click_swings_and_throws_wave() {
        let mut world = world_with_player();
        world.set_mouse_world(Vec2::new(1200.0, 540.0));
        world.handle_input(&InputEvent::MouseDown(MouseButton::Left));
        assert_eq!(world.sword().map(Sword::state), Some(SwordState::Swing));
        assert_eq!(world.count(ActorKind::SwordBullet), 1);
        assert!(!world.drain_cues().is_empty());
    }

    #[test]
    fn test_swing_knocks_back_enemy() {
        let mut world = world_with_player();
        let enemy = world.spawn_enemy(Vec2::new(1010.0, 540.0), EnemyConfig::default());
        world.set_mouse_world(Vec2::new(1200.0, 540.0));
        world.handle_input(&InputEvent::MouseDown(MouseButton::Left));
        world.update(1.0 / 60.0);
        world.resolve_collisions();

        let Some(Entity::Enemy(e)) = world.get(enemy) else {
            panic!("enemy missing");
        };
        assert_eq!(e.state(), EnemyState::Hit);
        assert_eq!(e.hp(), 2);
        assert!(e.knockback().x > 0.9);
    }

    #[test]
    fn test_enemy_bullet_hits_player_once() {
        let mut world = world_with_player();
        world.spawn_enemy_bullet(Vec2::new(960.0, 540.0), 0.0);
        world.spawn_enemy_bullet(Vec2::new(962.0, 540.0), 0.0);
        world.resolve_collisions();

        assert_eq!(world.count(ActorKind::EnemyBullet), 0);
        // Second bullet lands during invulnerability
        assert_eq!(world.player().map(Player::hp), Some(4));
    }

    #[test]
    fn test_fallen_boss_deals_no_contact_damage() {
        let mut world = World::new(5);
        let spot = Vec2::new(960.0, 540.0);
        let config = BossConfig {
            hp: 1,
            ..BossConfig::default()
        };
        let boss = world.spawn_boss(spot, config);
        world.spawn_sword_bullet(spot, 0.0);
        world.resolve_collisions();
        let state = world.get(boss).and_then(Entity::as_boss).map(Boss::state);
        assert_eq!(state, Some(BossState::Death));

        // Player lands on the corpse while it plays out its death
        world.spawn_player(spot, 5, 1.0);
        world.resolve_collisions();
        assert_eq!(world.player().map(Player::hp), Some(5));
    }

    #[test]
    fn test_fallen_enemy_no_longer_absorbs_waves() {
        let mut world = world_with_player();
        let spot = Vec2::new(2000.0, 540.0);
        let config = EnemyConfig {
            hp: 1,
            ..EnemyConfig::default()
        };
        let enemy = world.spawn_enemy(spot, config);
        world.spawn_sword_bullet(spot, 0.0);
        world.resolve_collisions();
        let state = world.get(enemy).and_then(Entity::as_enemy).map(Enemy::state);
        assert_eq!(state, Some(EnemyState::Death));
        assert_eq!(world.count(ActorKind::SwordBullet), 0);

        world.spawn_sword_bullet(spot, 0.0);
        world.resolve_collisions();
        assert_eq!(world.count(ActorKind::SwordBullet), 1);
    }

    #[test]
    fn test_parry_beats_player_hit() {
        let mut world = world_with_player();
        world.set_mouse_world(Vec2::new(1200.0, 540.0));
        world.handle_input(&InputEvent::MouseDown(MouseButton::Left));
        assert_eq!(world.sword().map(Sword::state), Some(SwordState::Swing));

        // Touches the player and the swinging blade at once
        world.spawn_enemy_bullet(Vec2::new(975.0, 540.0), std::f32::consts::PI);
        world.resolve_collisions();
        assert_eq!(world.count(ActorKind::EnemyBullet), 0);
        assert_eq!(world.player().map(Player::hp), Some(5));
    }

    #[test]
    fn test_group_order_is_fixed() {
        let world = World::new(2);
        let order: Vec<_> = world.collisions().groups().collect();
        assert_eq!(order, GROUP_ORDER);
    }

    #[test]
    fn test_idle_sword_never_collides() {
        let mut world = world_with_player();
        let dummy = world.spawn_dummy(Vec2::new(990.0, 540.0));
        world.update(1.0 / 60.0);
        world.resolve_collisions();
        assert!(!world.dummy_struck());
        assert!(world.get(dummy).is_some());
    }

    #[test]
    fn test_despawn_unregisters() {
        let mut world = world_with_player();
        let id = world.spawn_enemy(Vec2::ZERO, EnemyConfig::default());
        world.despawn(id);
        let (_, right) = world.collisions().members(CollisionGroup::SwordEnemy).unwrap();
        assert!(!right.contains(&id));
        assert_eq!(world.enemy_count(), 0);
    }

    #[test]
    fn test_ring_spawn_is_seeded() {
        let positions = |seed| {
            let mut world = World::new(seed);
            world.spawn_enemy_ring(Vec2::ZERO, 900.0, 5, EnemyConfig::default());
            world.entities().map(|e| e.actor().pos()).collect::<Vec<_>>()
        };
        assert_eq!(positions(11), positions(11));
        for p in positions(11) {
            assert!((p.length() - 900.0).abs() < 1e-2);
        }
    }

    #[test]
    fn test_draw_order_follows_layers() {
        let mut world = World::new(1);
        world.spawn_enemy_bullet(Vec2::ZERO, 0.0);
        world.spawn_player(Vec2::ZERO, 5, 1.0);
        let mut out = DrawList::new();
        world.draw(&Camera::default(), &mut out);
        let keys: Vec<_> = out.sprites().map(|s| s.key).collect();
        let bullet_at = keys.iter().position(|k| *k == crate::renderer::SpriteKey::EnemyBullet);
        assert_eq!(bullet_at, Some(keys.len() - 1));
    }
}

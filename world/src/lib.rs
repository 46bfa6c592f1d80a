#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative arena state for the wave director.
//!
//! The world owns the spawn-point pool and every live enemy. It is the only
//! place enemy identifiers are allocated, which makes it the single source of
//! the `EnemyBorn` and `EnemyDied` events the director counts.

use std::time::Duration;

use tracing::{debug, warn};
use wave_director_core::{
    Command, ContainerId, EnemyArchetype, EnemyId, Event, SpawnError, SpawnPointId,
};

/// Location capable of producing enemies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpawnPoint {
    id: SpawnPointId,
    label: String,
}

impl SpawnPoint {
    /// Creates a spawn point with a human-readable label.
    #[must_use]
    pub fn new(id: SpawnPointId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
        }
    }

    /// Identifier of the spawn point.
    #[must_use]
    pub const fn id(&self) -> SpawnPointId {
        self.id
    }

    /// Label used in logs and adapters.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Represents the authoritative arena state.
///
/// Enemy identifiers are allocated in increasing order and never reused, which
/// keeps `enemies` sorted by id. Once `u32::MAX` has been handed out every
/// further spawn is rejected with [`SpawnError::IdentifiersExhausted`].
#[derive(Debug)]
pub struct World {
    spawn_points: Vec<SpawnPoint>,
    enemies: Vec<Enemy>,
    next_enemy_id: Option<u32>,
    tick_index: u64,
}

impl World {
    /// Creates an empty arena that owns the provided spawn points.
    #[must_use]
    pub fn new(mut spawn_points: Vec<SpawnPoint>) -> Self {
        spawn_points.sort_by_key(SpawnPoint::id);
        spawn_points.dedup_by_key(|point| point.id);
        Self {
            spawn_points,
            enemies: Vec::new(),
            next_enemy_id: Some(0),
            tick_index: 0,
        }
    }

    fn has_spawn_point(&self, id: SpawnPointId) -> bool {
        self.spawn_points
            .binary_search_by_key(&id, SpawnPoint::id)
            .is_ok()
    }

    fn allocate_enemy_id(&mut self) -> Option<EnemyId> {
        let id = self.next_enemy_id?;
        self.next_enemy_id = id.checked_add(1);
        Some(EnemyId::new(id))
    }

    fn enemy_index(&self, enemy: EnemyId) -> Option<usize> {
        self.enemies
            .binary_search_by_key(&enemy, |candidate| candidate.id)
            .ok()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Commands addressed to systems rather than the arena are ignored.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });

            for enemy in &mut world.enemies {
                enemy.age = enemy.age.saturating_add(dt);
            }
        }
        Command::SpawnEnemy {
            spawn_point,
            archetype,
            container,
        } => {
            if !world.has_spawn_point(spawn_point) {
                warn!(spawn_point = spawn_point.get(), "spawn rejected: unknown spawn point");
                out_events.push(Event::SpawnRejected {
                    spawn_point,
                    reason: SpawnError::UnknownSpawnPoint,
                });
                return;
            }

            let Some(enemy) = world.allocate_enemy_id() else {
                warn!(spawn_point = spawn_point.get(), "spawn rejected: enemy ids exhausted");
                out_events.push(Event::SpawnRejected {
                    spawn_point,
                    reason: SpawnError::IdentifiersExhausted,
                });
                return;
            };
            debug!(
                enemy = enemy.get(),
                spawn_point = spawn_point.get(),
                archetype = archetype.name(),
                "enemy born"
            );
            world.enemies.push(Enemy {
                id: enemy,
                spawn_point,
                archetype: archetype.clone(),
                container,
                age: Duration::ZERO,
            });
            out_events.push(Event::EnemyBorn {
                enemy,
                spawn_point,
                archetype,
                container,
            });
        }
        Command::KillEnemy { enemy } => {
            let Some(index) = world.enemy_index(enemy) else {
                return;
            };
            let _ = world.enemies.remove(index);
            debug!(enemy = enemy.get(), "enemy died");
            out_events.push(Event::EnemyDied { enemy });
        }
        Command::StartDirector
        | Command::StopDirector
        | Command::StartWave
        | Command::ProduceEnemies { .. } => {}
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::{SpawnPoint, World};
    use wave_director_core::{ContainerId, EnemyArchetype, EnemyId, SpawnPointId};

    /// Spawn points owned by the world, ordered by identifier.
    #[must_use]
    pub fn spawn_points(world: &World) -> &[SpawnPoint] {
        &world.spawn_points
    }

    /// Identifiers of every spawn point owned by the world.
    #[must_use]
    pub fn spawn_point_ids(world: &World) -> Vec<SpawnPointId> {
        world.spawn_points.iter().map(SpawnPoint::id).collect()
    }

    /// Number of enemies currently in play.
    #[must_use]
    pub fn live_enemies(world: &World) -> usize {
        world.enemies.len()
    }

    /// Number of ticks applied so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Captures a read-only view of the enemies in play.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        let snapshots = world
            .enemies
            .iter()
            .map(|enemy| EnemySnapshot {
                id: enemy.id,
                spawn_point: enemy.spawn_point,
                archetype: enemy.archetype.clone(),
                container: enemy.container,
                age: enemy.age,
            })
            .collect();
        EnemyView { snapshots }
    }

    /// Enemies that have been in play for at least `lifetime`, oldest first.
    #[must_use]
    pub fn enemies_older_than(world: &World, lifetime: Duration) -> Vec<EnemyId> {
        world
            .enemies
            .iter()
            .filter(|enemy| enemy.age >= lifetime)
            .map(|enemy| enemy.id)
            .collect()
    }

    /// Enemies parented under the provided container.
    #[must_use]
    pub fn enemies_in_container(world: &World, container: ContainerId) -> Vec<EnemyId> {
        world
            .enemies
            .iter()
            .filter(|enemy| enemy.container == container)
            .map(|enemy| enemy.id)
            .collect()
    }

    /// Read-only snapshot describing all enemies in play.
    #[derive(Clone, Debug)]
    pub struct EnemyView {
        snapshots: Vec<EnemySnapshot>,
    }

    impl EnemyView {
        /// Iterator over the captured snapshots ordered by identifier.
        pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
            self.snapshots.iter()
        }

        /// Consumes the view, yielding the underlying snapshots.
        pub fn into_vec(self) -> Vec<EnemySnapshot> {
            self.snapshots
        }
    }

    /// Immutable representation of a single enemy used for queries.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct EnemySnapshot {
        /// Identifier allocated by the world.
        pub id: EnemyId,
        /// Spawn point that produced the enemy.
        pub spawn_point: SpawnPointId,
        /// Kind of enemy.
        pub archetype: EnemyArchetype,
        /// Container the enemy is parented under.
        pub container: ContainerId,
        /// Time spent in play.
        pub age: Duration,
    }
}

#[derive(Clone, Debug)]
struct Enemy {
    id: EnemyId,
    spawn_point: SpawnPointId,
    archetype: EnemyArchetype,
    container: ContainerId,
    age: Duration,
}

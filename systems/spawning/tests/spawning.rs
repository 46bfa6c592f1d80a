use std::time::Duration;

use wave_director_core::{Command, ContainerId, EnemyArchetype, Event, SpawnPointId};
use wave_director_system_spawning::Spawning;
use wave_director_world::{self as world, query, SpawnPoint, World};

fn arena() -> World {
    World::new(vec![
        SpawnPoint::new(SpawnPointId::new(0), "north gate"),
        SpawnPoint::new(SpawnPointId::new(1), "south gate"),
    ])
}

fn produce(point: u32, count: u32, delay_ms: u64) -> Command {
    Command::ProduceEnemies {
        spawn_point: SpawnPointId::new(point),
        archetype: EnemyArchetype::new("crawler"),
        count,
        delay: Duration::from_millis(delay_ms),
        container: ContainerId::new(1),
    }
}

fn tick(world: &mut World, spawning: &mut Spawning, dt_ms: u64) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::Tick {
            dt: Duration::from_millis(dt_ms),
        },
        &mut events,
    );
    let mut spawns = Vec::new();
    spawning.handle(&events, &[], &mut spawns);
    let mut born = Vec::new();
    for spawn in spawns {
        world::apply(world, spawn, &mut born);
    }
    born
}

fn births(events: &[Event]) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, Event::EnemyBorn { .. }))
        .count()
}

#[test]
fn produces_one_enemy_per_delay() {
    let mut world = arena();
    let mut spawning = Spawning::new();
    let mut spawns = Vec::new();
    spawning.handle(&[], &[produce(0, 3, 500)], &mut spawns);
    assert_eq!(spawns.len(), 1, "first enemy is emitted immediately");
    let mut events = Vec::new();
    for spawn in spawns {
        world::apply(&mut world, spawn, &mut events);
    }
    assert_eq!(births(&events), 1);

    assert_eq!(births(&tick(&mut world, &mut spawning, 250)), 0);
    assert_eq!(births(&tick(&mut world, &mut spawning, 250)), 1);
    assert_eq!(births(&tick(&mut world, &mut spawning, 250)), 0);
    assert_eq!(births(&tick(&mut world, &mut spawning, 250)), 1);
    assert_eq!(spawning.in_flight(), 0, "sequence finished after three enemies");
    assert_eq!(births(&tick(&mut world, &mut spawning, 1_000)), 0);
    assert_eq!(query::live_enemies(&world), 3);
}

#[test]
fn concurrent_sequences_complete_independently() {
    let mut world = arena();
    let mut spawning = Spawning::new();
    let mut spawns = Vec::new();
    spawning.handle(
        &[],
        &[produce(0, 2, 100), produce(1, 4, 300)],
        &mut spawns,
    );
    assert_eq!(spawns.len(), 2);
    assert_eq!(spawning.pending_enemies(), 4);

    let mut events = Vec::new();
    for spawn in spawns {
        world::apply(&mut world, spawn, &mut events);
    }

    assert_eq!(births(&tick(&mut world, &mut spawning, 100)), 1);
    assert_eq!(spawning.in_flight(), 1);
    assert_eq!(births(&tick(&mut world, &mut spawning, 1_000)), 3);
    assert_eq!(spawning.in_flight(), 0);
    assert_eq!(query::live_enemies(&world), 6);
}

#[test]
fn elapsed_time_in_the_request_batch_is_not_charged_to_new_sequences() {
    let mut spawning = Spawning::new();
    let mut spawns = Vec::new();
    spawning.handle(
        &[Event::TimeAdvanced {
            dt: Duration::from_secs(2),
        }],
        &[produce(0, 5, 500)],
        &mut spawns,
    );
    assert_eq!(spawns.len(), 1);
    assert_eq!(spawning.pending_enemies(), 4);
}

#[test]
fn unknown_spawn_point_is_rejected_by_the_world() {
    let mut world = arena();
    let mut spawning = Spawning::new();
    let mut spawns = Vec::new();
    spawning.handle(&[], &[produce(7, 1, 100)], &mut spawns);

    let mut events = Vec::new();
    for spawn in spawns {
        world::apply(&mut world, spawn, &mut events);
    }
    assert!(matches!(
        events.as_slice(),
        [Event::SpawnRejected { spawn_point, .. }] if *spawn_point == SpawnPointId::new(7)
    ));
    assert_eq!(query::live_enemies(&world), 0);
}

#[test]
fn empty_batches_are_ignored() {
    let mut spawning = Spawning::new();
    let mut spawns = Vec::new();
    spawning.handle(&[], &[produce(0, 0, 100)], &mut spawns);
    assert!(spawns.is_empty());
    assert_eq!(spawning.in_flight(), 0);
}

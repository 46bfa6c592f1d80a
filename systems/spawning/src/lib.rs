#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Spawn-point production system that turns batch requests into timed spawn commands.
//!
//! Each `ProduceEnemies` request becomes a [`SpawnSequence`] holding the number of
//! enemies still owed and the time left before the next one. Sequences are resumed
//! on every `TimeAdvanced` event until they run dry; there is no cancellation.

use std::time::Duration;

use tracing::debug;
use wave_director_core::{Command, ContainerId, EnemyArchetype, Event, SpawnPointId};

/// Pure system that advances in-flight spawn sequences.
#[derive(Debug, Default)]
pub struct Spawning {
    sequences: Vec<SpawnSequence>,
}

impl Spawning {
    /// Creates a spawning system with no sequences in flight.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sequences that still owe enemies.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.sequences.len()
    }

    /// Total number of enemies still owed across all sequences.
    #[must_use]
    pub fn pending_enemies(&self) -> u64 {
        self.sequences
            .iter()
            .map(|sequence| u64::from(sequence.remaining))
            .sum()
    }

    /// Consumes clock events and production requests to emit spawn commands.
    ///
    /// Elapsed time observed in `events` is spent on the sequences already in
    /// flight. Sequences started by `commands` emit their first enemy
    /// immediately and begin their delay from this call.
    pub fn handle(&mut self, events: &[Event], commands: &[Command], out: &mut Vec<Command>) {
        let mut elapsed = Duration::ZERO;
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                elapsed = elapsed.saturating_add(*dt);
            }
        }

        if !elapsed.is_zero() {
            for sequence in &mut self.sequences {
                sequence.advance(elapsed, out);
            }
        }

        for command in commands {
            if let Command::ProduceEnemies {
                spawn_point,
                archetype,
                count,
                delay,
                container,
            } = command
            {
                if *count == 0 {
                    continue;
                }
                debug!(
                    spawn_point = spawn_point.get(),
                    count = *count,
                    delay_ms = delay.as_millis() as u64,
                    "spawn sequence started"
                );
                let mut sequence = SpawnSequence::new(
                    *spawn_point,
                    archetype.clone(),
                    *container,
                    *count,
                    *delay,
                );
                sequence.advance(Duration::ZERO, out);
                self.sequences.push(sequence);
            }
        }

        self.sequences.retain(|sequence| {
            let done = sequence.is_finished();
            if done {
                debug!(spawn_point = sequence.spawn_point.get(), "spawn sequence finished");
            }
            !done
        });
    }
}

/// Resumable unit of work producing a fixed number of enemies at a fixed cadence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpawnSequence {
    spawn_point: SpawnPointId,
    archetype: EnemyArchetype,
    container: ContainerId,
    remaining: u32,
    delay: Duration,
    until_next: Duration,
}

impl SpawnSequence {
    /// Creates a sequence whose first enemy is due immediately.
    #[must_use]
    pub fn new(
        spawn_point: SpawnPointId,
        archetype: EnemyArchetype,
        container: ContainerId,
        count: u32,
        delay: Duration,
    ) -> Self {
        Self {
            spawn_point,
            archetype,
            container,
            remaining: count,
            delay,
            until_next: Duration::ZERO,
        }
    }

    /// Number of enemies the sequence still owes.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Time left before the next enemy is emitted.
    #[must_use]
    pub const fn until_next(&self) -> Duration {
        self.until_next
    }

    /// Reports whether every enemy has been emitted.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.remaining == 0
    }

    /// Spends `elapsed` time, emitting one spawn command per delay boundary crossed.
    pub fn advance(&mut self, elapsed: Duration, out: &mut Vec<Command>) {
        let mut budget = elapsed;
        while self.remaining > 0 {
            if budget < self.until_next {
                self.until_next -= budget;
                return;
            }

            budget -= self.until_next;
            out.push(Command::SpawnEnemy {
                spawn_point: self.spawn_point,
                archetype: self.archetype.clone(),
                container: self.container,
            });
            self.remaining -= 1;
            self.until_next = self.delay;
        }
        self.until_next = Duration::ZERO;
    }
}

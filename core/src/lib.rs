#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the wave director workspace.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. The wave director additionally publishes
//! [`Signal`] values to its registered observers whenever the wave lifecycle
//! moves forward.

use std::{collections::HashSet, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Population checks run at most once per this interval unless configured otherwise.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Duration the "wave starting" warning stays on screen unless configured otherwise.
pub const DEFAULT_WARNING_DURATION: Duration = Duration::from_secs(3);

/// Respite between a cleared wave and the next countdown expiry unless configured otherwise.
pub const DEFAULT_INTER_WAVE_DELAY: Duration = Duration::from_secs(5);

/// Commands that express all permissible mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Sets the director's running flag.
    StartDirector,
    /// Clears the director's running flag, freezing it in place.
    StopDirector,
    /// Asks the director to start the current wave without waiting for the countdown.
    StartWave,
    /// Asks a spawn point to produce a batch of enemies over time.
    ProduceEnemies {
        /// Spawn point responsible for the batch.
        spawn_point: SpawnPointId,
        /// Kind of enemy to produce.
        archetype: EnemyArchetype,
        /// Number of enemies in the batch.
        count: u32,
        /// Delay separating consecutive spawns.
        delay: Duration,
        /// Container every spawned enemy is parented under.
        container: ContainerId,
    },
    /// Requests that a spawn point emit a single enemy right now.
    SpawnEnemy {
        /// Spawn point emitting the enemy.
        spawn_point: SpawnPointId,
        /// Kind of enemy to emit.
        archetype: EnemyArchetype,
        /// Container the enemy is parented under.
        container: ContainerId,
    },
    /// Removes a live enemy from play.
    KillEnemy {
        /// Enemy to remove.
        enemy: EnemyId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a spawn point produced a new enemy.
    EnemyBorn {
        /// Identifier assigned to the new enemy.
        enemy: EnemyId,
        /// Spawn point that produced the enemy.
        spawn_point: SpawnPointId,
        /// Kind of enemy produced.
        archetype: EnemyArchetype,
        /// Container the enemy was parented under.
        container: ContainerId,
    },
    /// Confirms that an enemy left play. Emitted exactly once per enemy.
    EnemyDied {
        /// Identifier of the enemy that died.
        enemy: EnemyId,
    },
    /// Reports that a spawn request could not be honoured.
    SpawnRejected {
        /// Spawn point named in the request.
        spawn_point: SpawnPointId,
        /// Specific reason the spawn failed.
        reason: SpawnError,
    },
}

/// Lifecycle notifications published by the wave director to its observers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    /// The director entered a new phase.
    PhaseChanged {
        /// Phase that became active.
        phase: WavePhase,
    },
    /// A wave is about to spawn; UI should show the warning banner.
    WaveStarting {
        /// Wave that is starting.
        wave: WaveIndex,
        /// Display message authored for the wave.
        message: String,
        /// How long the warning should remain visible.
        warning: Duration,
    },
    /// The ranking clock should start measuring.
    BeginWaveTiming,
    /// The first wave began; play the selected track.
    StartWaveMusic {
        /// Track drawn from the configured music pool.
        track: Track,
    },
    /// Every enemy of a wave has been born and killed.
    WaveCleared {
        /// Wave that was cleared.
        wave: WaveIndex,
        /// Display message authored for the wave.
        message: String,
    },
    /// The ranking clock should stop measuring.
    StopWaveTiming,
    /// The final wave was cleared.
    AllWavesCleared,
    /// Wave music should fade out.
    WaveMusicEnd,
    /// The boss encounter track should start.
    StartBossTrack {
        /// Track configured for the boss encounter.
        track: Track,
    },
    /// The boss encounter takes over from the director.
    BossActivated {
        /// Name of the boss encounter being activated.
        boss: String,
    },
}

/// Phases of the wave director state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WavePhase {
    /// Counting down towards the next wave.
    Countdown,
    /// Selecting spawn points and issuing production requests.
    Spawning,
    /// Waiting for the current wave's population to reach zero.
    Waiting,
    /// All waves cleared; the boss encounter owns the game from here on.
    Boss,
}

/// Reasons a spawn request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnError {
    /// The spawn point is not part of the world's pool.
    UnknownSpawnPoint,
    /// Every enemy identifier has already been handed out.
    IdentifiersExhausted,
}

/// Unique identifier assigned to a live enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a spawn point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpawnPointId(u32);

impl SpawnPointId {
    /// Creates a new spawn point identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of the container spawned enemies are parented under.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContainerId(u32);

impl ContainerId {
    /// Creates a new container identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Zero-based position of a wave inside the [`WaveSet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WaveIndex(usize);

impl WaveIndex {
    /// Creates a new wave index.
    #[must_use]
    pub const fn new(value: usize) -> Self {
        Self(value)
    }

    /// Retrieves the underlying zero-based index.
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }

    /// Index of the wave that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

/// Reference to an enemy prefab understood by the host.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnemyArchetype(String);

impl EnemyArchetype {
    /// Creates an archetype reference from its name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Name of the referenced archetype.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

/// Reference to an audio clip understood by the host.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Track(String);

impl Track {
    /// Creates a track reference from its name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Name of the referenced clip.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

/// Authored description of one wave.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WaveDefinition {
    message: String,
    archetype: EnemyArchetype,
    enemies_per_spawn_point: u32,
    spawn_rate: Duration,
}

impl WaveDefinition {
    /// Creates a wave description.
    ///
    /// `spawn_rate` is the delay separating consecutive spawns at a single spawn point.
    #[must_use]
    pub fn new(
        message: impl Into<String>,
        archetype: EnemyArchetype,
        enemies_per_spawn_point: u32,
        spawn_rate: Duration,
    ) -> Self {
        Self {
            message: message.into(),
            archetype,
            enemies_per_spawn_point,
            spawn_rate,
        }
    }

    /// Message shown when the wave starts.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Kind of enemy the wave produces.
    #[must_use]
    pub fn archetype(&self) -> &EnemyArchetype {
        &self.archetype
    }

    /// Number of enemies each selected spawn point produces.
    #[must_use]
    pub const fn enemies_per_spawn_point(&self) -> u32 {
        self.enemies_per_spawn_point
    }

    /// Delay separating consecutive spawns at a single spawn point.
    #[must_use]
    pub const fn spawn_rate(&self) -> Duration {
        self.spawn_rate
    }
}

/// Ordered, immutable sequence of waves.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WaveSet {
    waves: Vec<WaveDefinition>,
}

impl WaveSet {
    /// Creates a wave set from the provided definitions, preserving their order.
    #[must_use]
    pub fn new(waves: Vec<WaveDefinition>) -> Self {
        Self { waves }
    }

    /// Number of waves in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.waves.len()
    }

    /// Reports whether the set holds no waves.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waves.is_empty()
    }

    /// Retrieves the wave stored at `index`.
    pub fn get(&self, index: WaveIndex) -> Result<&WaveDefinition, WaveIndexError> {
        self.waves
            .get(index.get())
            .ok_or(WaveIndexError::OutOfRange {
                index: index.get(),
                len: self.waves.len(),
            })
    }

    /// Reports whether a wave follows `index`.
    #[must_use]
    pub fn has_successor(&self, index: WaveIndex) -> bool {
        index.get().saturating_add(1) < self.waves.len()
    }

    /// Iterator over the waves in authored order.
    pub fn iter(&self) -> impl Iterator<Item = &WaveDefinition> {
        self.waves.iter()
    }
}

/// Boss encounter the director hands over to once every wave is cleared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BossEncounter {
    name: String,
    track: Track,
}

impl BossEncounter {
    /// Describes a boss encounter and the track that accompanies it.
    #[must_use]
    pub fn new(name: impl Into<String>, track: Track) -> Self {
        Self {
            name: name.into(),
            track,
        }
    }

    /// Name of the encounter.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Track started alongside the encounter.
    #[must_use]
    pub fn track(&self) -> &Track {
        &self.track
    }
}

/// Configuration handed to the wave director before it starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectorConfig {
    waves: WaveSet,
    spawn_points: Vec<SpawnPointId>,
    inter_wave_delay: Duration,
    warning_duration: Duration,
    poll_interval: Duration,
    music_tracks: Vec<Track>,
    boss: BossEncounter,
    container: ContainerId,
    start_running: bool,
}

impl DirectorConfig {
    /// Creates a configuration with default timings, no music and a stopped director.
    #[must_use]
    pub fn new(waves: WaveSet, spawn_points: Vec<SpawnPointId>, boss: BossEncounter) -> Self {
        Self {
            waves,
            spawn_points,
            inter_wave_delay: DEFAULT_INTER_WAVE_DELAY,
            warning_duration: DEFAULT_WARNING_DURATION,
            poll_interval: DEFAULT_POLL_INTERVAL,
            music_tracks: Vec::new(),
            boss,
            container: ContainerId::default(),
            start_running: false,
        }
    }

    /// Overrides the delay between a cleared wave and the next wave.
    #[must_use]
    pub fn with_inter_wave_delay(mut self, delay: Duration) -> Self {
        self.inter_wave_delay = delay;
        self
    }

    /// Overrides how long the "wave starting" warning is displayed.
    #[must_use]
    pub fn with_warning_duration(mut self, duration: Duration) -> Self {
        self.warning_duration = duration;
        self
    }

    /// Overrides how often the population check runs while waiting.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the pool the first-wave music track is drawn from.
    #[must_use]
    pub fn with_music_tracks(mut self, tracks: Vec<Track>) -> Self {
        self.music_tracks = tracks;
        self
    }

    /// Sets the container spawned enemies are parented under.
    #[must_use]
    pub fn with_container(mut self, container: ContainerId) -> Self {
        self.container = container;
        self
    }

    /// Controls whether the director runs immediately after construction.
    #[must_use]
    pub fn with_start_running(mut self, running: bool) -> Self {
        self.start_running = running;
        self
    }

    /// Ordered waves the director progresses through.
    #[must_use]
    pub fn waves(&self) -> &WaveSet {
        &self.waves
    }

    /// Spawn points the director selects from.
    #[must_use]
    pub fn spawn_points(&self) -> &[SpawnPointId] {
        &self.spawn_points
    }

    /// Delay between a cleared wave and the next wave.
    #[must_use]
    pub const fn inter_wave_delay(&self) -> Duration {
        self.inter_wave_delay
    }

    /// Duration of the "wave starting" warning.
    #[must_use]
    pub const fn warning_duration(&self) -> Duration {
        self.warning_duration
    }

    /// Minimum spacing between population checks.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Pool of first-wave music tracks.
    #[must_use]
    pub fn music_tracks(&self) -> &[Track] {
        &self.music_tracks
    }

    /// Boss encounter activated after the final wave.
    #[must_use]
    pub fn boss(&self) -> &BossEncounter {
        &self.boss
    }

    /// Container spawned enemies are parented under.
    #[must_use]
    pub const fn container(&self) -> ContainerId {
        self.container
    }

    /// Whether the director starts with its running flag set.
    #[must_use]
    pub const fn start_running(&self) -> bool {
        self.start_running
    }

    /// Checks the configuration for values the director cannot operate with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.waves.is_empty() {
            return Err(ConfigError::EmptyWaveSet);
        }
        if self.spawn_points.is_empty() {
            return Err(ConfigError::EmptySpawnPointPool);
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }

        let mut seen = HashSet::with_capacity(self.spawn_points.len());
        for point in &self.spawn_points {
            if !seen.insert(*point) {
                return Err(ConfigError::DuplicateSpawnPoint(*point));
            }
        }

        for (index, wave) in self.waves.iter().enumerate() {
            if wave.enemies_per_spawn_point() == 0 {
                return Err(ConfigError::ZeroEnemyCount { wave: index });
            }
            if wave.spawn_rate().is_zero() {
                return Err(ConfigError::ZeroSpawnRate { wave: index });
            }
        }

        Ok(())
    }
}

/// Reasons a [`DirectorConfig`] is rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// No waves were configured.
    #[error("wave set is empty")]
    EmptyWaveSet,
    /// No spawn points were configured.
    #[error("spawn point pool is empty")]
    EmptySpawnPointPool,
    /// The same spawn point appears more than once in the pool.
    #[error("spawn point {} appears more than once in the pool", .0.get())]
    DuplicateSpawnPoint(SpawnPointId),
    /// A wave asks each spawn point for zero enemies.
    #[error("wave {wave} spawns zero enemies per spawn point")]
    ZeroEnemyCount {
        /// Zero-based index of the offending wave.
        wave: usize,
    },
    /// A wave has no delay between consecutive spawns.
    #[error("wave {wave} has a non-positive spawn rate")]
    ZeroSpawnRate {
        /// Zero-based index of the offending wave.
        wave: usize,
    },
    /// The population check interval is zero.
    #[error("population poll interval must be positive")]
    ZeroPollInterval,
}

/// Reasons a wave lookup fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum WaveIndexError {
    /// The index lies beyond the end of the wave set.
    #[error("wave index {index} is out of range for a wave set of {len}")]
    OutOfRange {
        /// Index that was requested.
        index: usize,
        /// Number of waves in the set.
        len: usize,
    },
}

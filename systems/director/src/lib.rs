#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave director: the state machine that drives enemy waves.
//!
//! The director moves through `Countdown -> Spawning -> Waiting` once per
//! configured wave and finally hands over to the boss encounter. It is
//! advanced exclusively by [`WaveDirector::tick`]; enemy births and deaths are
//! fed in through [`WaveDirector::enemy_born`] and [`WaveDirector::enemy_died`]
//! (or batched through [`WaveDirector::handle`]). Production requests for spawn
//! points are written to the caller's command buffer and lifecycle signals are
//! delivered synchronously to subscribed observers.

mod observer;
mod registry;
mod selection;

use std::time::Duration;

use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, error, info, warn};
use wave_director_core::{
    Command, ConfigError, DirectorConfig, EnemyId, Event, Signal, SpawnPointId, WaveDefinition,
    WaveIndex, WaveIndexError, WavePhase,
};

pub use observer::{DirectorObserver, SignalLog, SubscriptionId};
pub use registry::ActiveEnemyRegistry;
pub use selection::{select_spawn_points, spawn_point_count};

use observer::Observers;

/// State machine governing wave progression, spawning and clearance detection.
#[derive(Debug)]
pub struct WaveDirector {
    config: DirectorConfig,
    phase: WavePhase,
    running: bool,
    cursor: WaveIndex,
    countdown: Duration,
    poll_timer: Duration,
    registry: ActiveEnemyRegistry,
    cleared: Vec<bool>,
    expected_births: u64,
    births_this_wave: u64,
    rng: ChaCha8Rng,
    observers: Observers,
}

impl WaveDirector {
    /// Validates `config` and creates a director positioned on the first wave.
    ///
    /// `rng_seed` drives spawn-point selection and music selection.
    pub fn new(config: DirectorConfig, rng_seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;

        let wave_count = config.waves().len();
        Ok(Self {
            phase: WavePhase::Countdown,
            running: config.start_running(),
            cursor: WaveIndex::new(0),
            countdown: config.inter_wave_delay(),
            poll_timer: config.poll_interval(),
            registry: ActiveEnemyRegistry::new(),
            cleared: vec![false; wave_count],
            expected_births: 0,
            births_this_wave: 0,
            rng: ChaCha8Rng::seed_from_u64(rng_seed),
            observers: Observers::default(),
            config,
        })
    }

    /// Registers an observer that receives every subsequent signal.
    pub fn subscribe(&mut self, observer: impl DirectorObserver + 'static) -> SubscriptionId {
        self.observers.subscribe(Box::new(observer))
    }

    /// Removes a previously registered observer. Returns `false` for unknown handles.
    pub fn unsubscribe(&mut self, subscription: SubscriptionId) -> bool {
        self.observers.unsubscribe(subscription)
    }

    /// Number of registered observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Sets the running flag. Has no effect once the boss phase is reached.
    pub fn start(&mut self) {
        if self.phase == WavePhase::Boss {
            debug!("start ignored: director already handed over to the boss");
            return;
        }
        if !self.running {
            info!(wave = self.cursor.get(), phase = ?self.phase, "director started");
        }
        self.running = true;
    }

    /// Clears the running flag, freezing the state machine where it stands.
    pub fn stop(&mut self) {
        if self.running {
            info!(wave = self.cursor.get(), phase = ?self.phase, "director stopped");
        }
        self.running = false;
    }

    /// Records the birth of an enemy. Duplicate births are ignored.
    pub fn enemy_born(&mut self, enemy: EnemyId) {
        if self.registry.insert(enemy) {
            self.births_this_wave = self.births_this_wave.saturating_add(1);
        }
    }

    /// Records the death of an enemy. Unknown or repeated deaths are ignored.
    pub fn enemy_died(&mut self, enemy: EnemyId) {
        let _ = self.registry.remove(enemy);
    }

    /// Records a spawn the world refused, so the current wave stops waiting
    /// for a birth that will never happen.
    ///
    /// Only rejections arriving while waiting on a wave are counted.
    pub fn spawn_rejected(&mut self, spawn_point: SpawnPointId) {
        if self.phase != WavePhase::Waiting {
            debug!(
                spawn_point = spawn_point.get(),
                phase = ?self.phase,
                "stale spawn rejection ignored"
            );
            return;
        }
        self.expected_births = self.expected_births.saturating_sub(1);
        warn!(
            wave = self.cursor.get(),
            spawn_point = spawn_point.get(),
            pending = self.pending_births(),
            "spawn rejected; wave expects one fewer enemy"
        );
    }

    /// Starts the current wave immediately instead of waiting for the countdown.
    ///
    /// Only honoured while counting down; returns whether the wave started.
    pub fn request_start_wave(&mut self, out: &mut Vec<Command>) -> bool {
        if self.phase != WavePhase::Countdown {
            debug!(phase = ?self.phase, "manual wave start ignored");
            return false;
        }
        self.begin_wave(out);
        true
    }

    /// Advances the state machine by one logical frame.
    pub fn tick(&mut self, dt: Duration, out: &mut Vec<Command>) {
        if !self.running {
            return;
        }

        match self.phase {
            WavePhase::Countdown => {
                self.countdown = self.countdown.saturating_sub(dt);
                if self.countdown.is_zero() {
                    self.begin_wave(out);
                }
            }
            WavePhase::Waiting => self.poll_population(dt),
            WavePhase::Spawning => {}
            WavePhase::Boss => self.running = false,
        }
    }

    /// Routes a batch of commands and world events to the director.
    ///
    /// Control commands are applied first, then events in order. Each
    /// `TimeAdvanced` event ticks the director once.
    pub fn handle(&mut self, events: &[Event], commands: &[Command], out: &mut Vec<Command>) {
        for command in commands {
            match command {
                Command::StartDirector => self.start(),
                Command::StopDirector => self.stop(),
                Command::StartWave => {
                    let _ = self.request_start_wave(out);
                }
                _ => {}
            }
        }

        for event in events {
            match event {
                Event::EnemyBorn { enemy, .. } => self.enemy_born(*enemy),
                Event::EnemyDied { enemy } => self.enemy_died(*enemy),
                Event::TimeAdvanced { dt } => self.tick(*dt, out),
                Event::SpawnRejected { spawn_point, .. } => self.spawn_rejected(*spawn_point),
            }
        }
    }

    /// Phase the state machine currently occupies.
    #[must_use]
    pub const fn phase(&self) -> WavePhase {
        self.phase
    }

    /// Whether the director advances on ticks.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Time left before the current wave spawns.
    #[must_use]
    pub const fn countdown(&self) -> Duration {
        self.countdown
    }

    /// Index of the current wave.
    #[must_use]
    pub const fn current_wave(&self) -> WaveIndex {
        self.cursor
    }

    /// Definition of the current wave.
    pub fn current_definition(&self) -> Result<&WaveDefinition, WaveIndexError> {
        self.config.waves().get(self.cursor)
    }

    /// Whether the wave at `index` has been cleared.
    pub fn wave_cleared(&self, index: WaveIndex) -> Result<bool, WaveIndexError> {
        self.cleared
            .get(index.get())
            .copied()
            .ok_or(WaveIndexError::OutOfRange {
                index: index.get(),
                len: self.cleared.len(),
            })
    }

    /// Live enemy registry.
    #[must_use]
    pub const fn registry(&self) -> &ActiveEnemyRegistry {
        &self.registry
    }

    /// Number of enemies currently alive.
    #[must_use]
    pub fn live_enemies(&self) -> usize {
        self.registry.len()
    }

    /// Enemies requested for the current wave that have not been born yet.
    #[must_use]
    pub const fn pending_births(&self) -> u64 {
        self.expected_births.saturating_sub(self.births_this_wave)
    }

    /// Configuration the director was built with.
    #[must_use]
    pub const fn config(&self) -> &DirectorConfig {
        &self.config
    }

    fn begin_wave(&mut self, out: &mut Vec<Command>) {
        let wave = match self.config.waves().get(self.cursor) {
            Ok(wave) => wave.clone(),
            Err(err) => {
                error!(%err, "current wave missing; halting director");
                self.running = false;
                return;
            }
        };

        self.countdown = Duration::ZERO;
        self.enter(WavePhase::Spawning);
        info!(wave = self.cursor.get(), message = wave.message(), "wave starting");
        self.emit(Signal::WaveStarting {
            wave: self.cursor,
            message: wave.message().to_owned(),
            warning: self.config.warning_duration(),
        });
        self.emit(Signal::BeginWaveTiming);

        if self.cursor.get() == 0 {
            if let Some(track) = self.config.music_tracks().choose(&mut self.rng).cloned() {
                self.emit(Signal::StartWaveMusic { track });
            }
        }

        let points = select_spawn_points(&mut self.rng, self.config.spawn_points());
        let per_point = wave.enemies_per_spawn_point();
        self.expected_births = u64::from(per_point).saturating_mul(points.len() as u64);
        self.births_this_wave = 0;
        debug!(
            wave = self.cursor.get(),
            spawn_points = points.len(),
            expected = self.expected_births,
            "production requested"
        );
        for spawn_point in points {
            out.push(Command::ProduceEnemies {
                spawn_point,
                archetype: wave.archetype().clone(),
                count: per_point,
                delay: wave.spawn_rate(),
                container: self.config.container(),
            });
        }

        self.poll_timer = self.config.poll_interval();
        self.enter(WavePhase::Waiting);
    }

    fn poll_population(&mut self, dt: Duration) {
        self.poll_timer = self.poll_timer.saturating_sub(dt);
        if !self.poll_timer.is_zero() {
            return;
        }
        self.poll_timer = self.config.poll_interval();

        if !self.registry.is_empty() || self.pending_births() > 0 {
            return;
        }
        self.clear_wave();
    }

    fn clear_wave(&mut self) {
        self.emit(Signal::StopWaveTiming);

        let index = self.cursor;
        if let Some(flag) = self.cleared.get_mut(index.get()) {
            *flag = true;
        }
        let message = self
            .config
            .waves()
            .get(index)
            .map(|wave| wave.message().to_owned())
            .unwrap_or_default();
        info!(wave = index.get(), message = %message, "wave cleared");
        self.emit(Signal::WaveCleared {
            wave: index,
            message,
        });

        if self.config.waves().has_successor(index) {
            self.cursor = index.next();
            self.countdown = self.config.inter_wave_delay();
            self.enter(WavePhase::Countdown);
        } else {
            self.enter_boss();
        }
    }

    fn enter_boss(&mut self) {
        self.enter(WavePhase::Boss);
        let boss = self.config.boss().clone();
        info!(boss = boss.name(), "all waves cleared; activating boss");
        self.emit(Signal::AllWavesCleared);
        self.emit(Signal::WaveMusicEnd);
        self.emit(Signal::StartBossTrack {
            track: boss.track().clone(),
        });
        self.emit(Signal::BossActivated {
            boss: boss.name().to_owned(),
        });
        self.running = false;
    }

    fn enter(&mut self, phase: WavePhase) {
        debug!(from = ?self.phase, to = ?phase, "phase changed");
        self.phase = phase;
        self.emit(Signal::PhaseChanged { phase });
    }

    fn emit(&mut self, signal: Signal) {
        self.observers.notify(&signal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wave_director_core::{BossEncounter, EnemyArchetype, SpawnPointId, Track, WaveSet};

    fn director(waves: usize, delay_ms: u64) -> WaveDirector {
        let waves = (0..waves)
            .map(|index| {
                WaveDefinition::new(
                    format!("Wave {}", index + 1),
                    EnemyArchetype::new("grunt"),
                    1,
                    Duration::from_millis(100),
                )
            })
            .collect();
        let config = DirectorConfig::new(
            WaveSet::new(waves),
            vec![SpawnPointId::new(0)],
            BossEncounter::new("warden", Track::new("boss")),
        )
        .with_inter_wave_delay(Duration::from_millis(delay_ms))
        .with_start_running(true);
        WaveDirector::new(config, 1).expect("valid config")
    }

    #[test]
    fn poll_waits_for_interval_before_clearing() {
        let mut director = director(2, 0);
        let mut out = Vec::new();
        director.tick(Duration::from_millis(10), &mut out);
        assert_eq!(director.phase(), WavePhase::Waiting);
        director.enemy_born(EnemyId::new(0));
        director.enemy_died(EnemyId::new(0));

        director.tick(Duration::from_millis(600), &mut out);
        assert_eq!(director.phase(), WavePhase::Waiting);
        director.tick(Duration::from_millis(400), &mut out);
        assert_eq!(director.phase(), WavePhase::Countdown);
        assert_eq!(director.current_wave(), WaveIndex::new(1));
        assert_eq!(director.wave_cleared(WaveIndex::new(0)), Ok(true));
    }

    #[test]
    fn wave_waits_for_unborn_enemies() {
        let mut director = director(1, 0);
        let mut out = Vec::new();
        director.tick(Duration::from_millis(10), &mut out);
        assert_eq!(director.pending_births(), 1);

        director.tick(Duration::from_secs(5), &mut out);
        assert_eq!(director.phase(), WavePhase::Waiting, "enemy never born yet");

        director.enemy_born(EnemyId::new(3));
        director.enemy_died(EnemyId::new(3));
        director.tick(Duration::from_secs(1), &mut out);
        assert_eq!(director.phase(), WavePhase::Boss);
        assert!(!director.is_running());
    }

    #[test]
    fn wave_cleared_rejects_out_of_range_index() {
        let director = director(2, 0);
        assert_eq!(
            director.wave_cleared(WaveIndex::new(2)),
            Err(WaveIndexError::OutOfRange { index: 2, len: 2 })
        );
    }

    #[test]
    fn start_is_ignored_after_boss() {
        let mut director = director(1, 0);
        let mut out = Vec::new();
        director.tick(Duration::ZERO, &mut out);
        director.enemy_born(EnemyId::new(0));
        director.enemy_died(EnemyId::new(0));
        director.tick(Duration::from_secs(1), &mut out);
        assert_eq!(director.phase(), WavePhase::Boss);

        director.start();
        assert!(!director.is_running());
    }
}

//! Headless driver loop pumping the world and systems at a fixed tick.

use std::{fmt, time::Duration};

use anyhow::{bail, Result};
use serde::Serialize;
use tracing::{debug, info, warn};
use wave_director_core::{Command, ConfigError, Event, Signal, WaveIndex, WavePhase};
use wave_director_system_director::{SignalLog, WaveDirector};
use wave_director_system_ranking::{RankingClock, RankingSummary};
use wave_director_system_spawning::Spawning;
use wave_director_world::{self as world, query, World};

use crate::scenario::Scenario;

/// Parameters controlling the driver loop around the director.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SimulationSettings {
    /// Simulated time advanced per tick.
    pub(crate) tick: Duration,
    /// Hard cap on the number of ticks simulated.
    pub(crate) max_ticks: u64,
    /// Age at which the stand-in player kills an enemy.
    pub(crate) enemy_lifetime: Duration,
    /// Simulated time before the player mounts and the director starts.
    pub(crate) mount_after: Duration,
    /// Simulated time at which the player dies and the director stops.
    pub(crate) player_death_after: Option<Duration>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(50),
            max_ticks: 100_000,
            enemy_lifetime: Duration::from_secs(3),
            mount_after: Duration::ZERO,
            player_death_after: None,
        }
    }
}

impl SimulationSettings {
    /// Rejects settings that would stall the driver loop.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.tick.is_zero() {
            bail!("simulation tick length must be greater than zero");
        }
        if self.max_ticks == 0 {
            bail!("simulation tick limit must be greater than zero");
        }
        Ok(())
    }
}

/// Reason the driver loop stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Outcome {
    /// Every wave was cleared and the boss took over.
    BossReached,
    /// The player died and the director was stopped.
    PlayerDied,
    /// The tick limit ran out first.
    TickLimit,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::BossReached => "boss reached",
            Self::PlayerDied => "player died",
            Self::TickLimit => "tick limit reached",
        };
        f.write_str(label)
    }
}

/// Director signal stamped with the simulated time it was published at.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub(crate) struct TimedSignal {
    /// Simulated time since the run started.
    pub(crate) at: Duration,
    /// Signal published by the director.
    pub(crate) signal: Signal,
}

/// Everything a finished run reports.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub(crate) struct RunReport {
    pub(crate) outcome: Outcome,
    pub(crate) seed: u64,
    pub(crate) ticks: u64,
    pub(crate) elapsed: Duration,
    pub(crate) final_phase: WavePhase,
    pub(crate) waves_cleared: usize,
    pub(crate) waves_total: usize,
    pub(crate) births: u64,
    pub(crate) deaths: u64,
    pub(crate) rejected_spawns: u64,
    pub(crate) live_enemies: usize,
    pub(crate) ranking: Option<RankingSummary>,
    pub(crate) signals: Vec<TimedSignal>,
}

/// World, spawning, director and ranking clock wired together.
#[derive(Debug)]
pub(crate) struct Simulation {
    world: World,
    spawning: Spawning,
    director: WaveDirector,
    ranking: RankingClock,
    log: SignalLog,
    settings: SimulationSettings,
    seed: u64,
    elapsed: Duration,
    ticks: u64,
    mounted: bool,
    player_dead: bool,
    births: u64,
    deaths: u64,
    rejected_spawns: u64,
    timeline: Vec<TimedSignal>,
}

impl Simulation {
    /// Builds the world and systems described by `scenario`.
    pub(crate) fn new(scenario: Scenario) -> Result<Self, ConfigError> {
        let mut director = WaveDirector::new(scenario.director, scenario.seed)?;
        let log = SignalLog::new();
        let _ = director.subscribe(log.clone());

        Ok(Self {
            world: World::new(scenario.spawn_points),
            spawning: Spawning::new(),
            director,
            ranking: RankingClock::new(),
            log,
            settings: scenario.simulation,
            seed: scenario.seed,
            elapsed: Duration::ZERO,
            ticks: 0,
            mounted: false,
            player_dead: false,
            births: 0,
            deaths: 0,
            rejected_spawns: 0,
            timeline: Vec::new(),
        })
    }

    /// Runs ticks until the boss takes over, the player dies or the tick limit is hit.
    pub(crate) fn run(mut self) -> RunReport {
        let outcome = loop {
            if self.director.phase() == WavePhase::Boss {
                break Outcome::BossReached;
            }
            if self.player_dead {
                break Outcome::PlayerDied;
            }
            if self.ticks >= self.settings.max_ticks {
                break Outcome::TickLimit;
            }
            self.step();
        };
        info!(
            %outcome,
            ticks = self.ticks,
            elapsed_ms = self.elapsed.as_millis() as u64,
            "simulation finished"
        );
        self.into_report(outcome)
    }

    fn step(&mut self) {
        let mut commands = Vec::new();
        if !self.mounted && self.elapsed >= self.settings.mount_after {
            self.mounted = true;
            info!(at_ms = self.elapsed.as_millis() as u64, "player mounted");
            commands.push(Command::StartDirector);
        }
        if let Some(death) = self.settings.player_death_after {
            if !self.player_dead && self.elapsed >= death {
                self.player_dead = true;
                warn!(at_ms = self.elapsed.as_millis() as u64, "player died");
                commands.push(Command::StopDirector);
            }
        }
        for enemy in query::enemies_older_than(&self.world, self.settings.enemy_lifetime) {
            commands.push(Command::KillEnemy { enemy });
        }
        if !self.player_dead {
            commands.push(Command::Tick {
                dt: self.settings.tick,
            });
        }

        for command in commands {
            let mut events = Vec::new();
            world::apply(&mut self.world, command.clone(), &mut events);
            self.pump(events, command);
        }

        self.ticks += 1;
        self.elapsed = self.elapsed.saturating_add(self.settings.tick);
    }

    /// Feeds world events through the systems until no further spawns are produced.
    fn pump(&mut self, mut events: Vec<Event>, command: Command) {
        let mut commands = vec![command];

        loop {
            self.tally(&events);

            let mut requests = Vec::new();
            self.director.handle(&events, &commands, &mut requests);
            let signals = self.log.drain();
            self.ranking.handle(&events, &signals);
            self.record(signals);

            let mut spawns = Vec::new();
            self.spawning.handle(&events, &requests, &mut spawns);
            if spawns.is_empty() {
                break;
            }

            events.clear();
            commands.clear();
            for spawn in spawns {
                world::apply(&mut self.world, spawn, &mut events);
            }
        }
    }

    fn tally(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::EnemyBorn { .. } => self.births += 1,
                Event::EnemyDied { .. } => self.deaths += 1,
                Event::SpawnRejected { .. } => self.rejected_spawns += 1,
                Event::TimeAdvanced { .. } => {}
            }
        }
    }

    fn record(&mut self, signals: Vec<Signal>) {
        for signal in signals {
            debug!(at_ms = self.elapsed.as_millis() as u64, ?signal, "director signal");
            self.timeline.push(TimedSignal {
                at: self.elapsed,
                signal,
            });
        }
    }

    fn into_report(self, outcome: Outcome) -> RunReport {
        let waves_total = self.director.config().waves().len();
        let waves_cleared = (0..waves_total)
            .filter(|index| matches!(self.director.wave_cleared(WaveIndex::new(*index)), Ok(true)))
            .count();

        RunReport {
            outcome,
            seed: self.seed,
            ticks: self.ticks,
            elapsed: self.elapsed,
            final_phase: self.director.phase(),
            waves_cleared,
            waves_total,
            births: self.births,
            deaths: self.deaths,
            rejected_spawns: self.rejected_spawns,
            live_enemies: query::live_enemies(&self.world),
            ranking: self.ranking.summary().cloned(),
            signals: self.timeline,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundled() -> Scenario {
        Scenario::bundled().expect("bundled scenario should parse")
    }

    fn count(report: &RunReport, predicate: impl Fn(&Signal) -> bool) -> usize {
        report
            .signals
            .iter()
            .filter(|timed| predicate(&timed.signal))
            .count()
    }

    #[test]
    fn bundled_scenario_reaches_the_boss() {
        let report = Simulation::new(bundled()).expect("valid scenario").run();

        assert_eq!(report.outcome, Outcome::BossReached);
        assert_eq!(report.final_phase, WavePhase::Boss);
        assert_eq!(report.waves_cleared, report.waves_total);
        assert_eq!(report.births, report.deaths);
        assert_eq!(report.live_enemies, 0);
        assert_eq!(report.rejected_spawns, 0);
        assert_eq!(
            count(&report, |signal| matches!(signal, Signal::AllWavesCleared)),
            1
        );
        assert_eq!(
            count(&report, |signal| matches!(signal, Signal::StartWaveMusic { .. })),
            1
        );

        let ranking = report.ranking.expect("ranking recorded once all waves clear");
        assert_eq!(ranking.waves, report.waves_total);
        assert!(ranking.total < report.elapsed);
    }

    #[test]
    fn runs_are_reproducible_from_the_seed() {
        let first = Simulation::new(bundled()).expect("valid scenario").run();
        let second = Simulation::new(bundled()).expect("valid scenario").run();
        assert_eq!(first, second);
    }

    #[test]
    fn nothing_happens_before_the_player_mounts() {
        let mut scenario = bundled();
        scenario.simulation.mount_after = Duration::from_secs(10);
        let report = Simulation::new(scenario).expect("valid scenario").run();

        let first = report.signals.first().expect("director published signals");
        assert!(first.at >= Duration::from_secs(10), "first signal at {:?}", first.at);
        assert_eq!(report.outcome, Outcome::BossReached);
    }

    #[test]
    fn player_death_stops_the_run() {
        let mut scenario = bundled();
        scenario.simulation.player_death_after = Some(Duration::from_secs(8));
        let report = Simulation::new(scenario).expect("valid scenario").run();

        assert_eq!(report.outcome, Outcome::PlayerDied);
        assert_ne!(report.final_phase, WavePhase::Boss);
        assert!(report.ranking.is_none());
        assert!(report
            .signals
            .iter()
            .all(|timed| timed.at <= Duration::from_secs(8)));
    }

    #[test]
    fn tick_limit_ends_a_stalled_run() {
        let mut scenario = bundled();
        scenario.simulation.max_ticks = 10;
        let report = Simulation::new(scenario).expect("valid scenario").run();

        assert_eq!(report.outcome, Outcome::TickLimit);
        assert_eq!(report.ticks, 10);
        assert_eq!(report.elapsed, scenario_tick() * 10);
    }

    fn scenario_tick() -> Duration {
        bundled().simulation.tick
    }

    #[test]
    fn zero_tick_is_invalid() {
        let settings = SimulationSettings {
            tick: Duration::ZERO,
            ..SimulationSettings::default()
        };
        assert!(settings.validate().is_err());
    }
}

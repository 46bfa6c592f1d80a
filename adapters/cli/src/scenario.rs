//! TOML scenario files describing a wave set and the simulation driving it.

use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use wave_director_core::{
    BossEncounter, ContainerId, DirectorConfig, EnemyArchetype, SpawnPointId, Track,
    WaveDefinition, WaveSet, DEFAULT_INTER_WAVE_DELAY, DEFAULT_POLL_INTERVAL,
    DEFAULT_WARNING_DURATION,
};
use wave_director_world::SpawnPoint;

use crate::simulation::SimulationSettings;

const SUPPORTED_SCENARIO_VERSION: u32 = 1;

/// Scenario compiled into the binary, used when no path is supplied.
const BUNDLED_SCENARIO: &str = include_str!("../scenarios/default.toml");

/// Fully resolved scenario ready to drive a simulation.
#[derive(Clone, Debug)]
pub(crate) struct Scenario {
    /// Seed for the director's random source.
    pub(crate) seed: u64,
    /// Spawn points placed in the world.
    pub(crate) spawn_points: Vec<SpawnPoint>,
    /// Validated director configuration.
    pub(crate) director: DirectorConfig,
    /// Driver loop parameters.
    pub(crate) simulation: SimulationSettings,
}

impl Scenario {
    /// Reads and parses the scenario stored at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario at {}", path.display()))?;
        parse_scenario(&contents)
            .with_context(|| format!("invalid scenario file {}", path.display()))
    }

    /// Parses the scenario shipped with the binary.
    pub(crate) fn bundled() -> Result<Self> {
        parse_scenario(BUNDLED_SCENARIO).context("bundled scenario is invalid")
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScenarioFile {
    version: u32,
    #[serde(default)]
    seed: u64,
    #[serde(default)]
    director: DirectorSection,
    boss: BossSection,
    spawn_points: Vec<SpawnPointEntry>,
    waves: Vec<WaveEntry>,
    #[serde(default)]
    simulation: SimulationSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct DirectorSection {
    inter_wave_delay: Option<f64>,
    warning: Option<f64>,
    poll_interval: Option<f64>,
    #[serde(default)]
    container: u32,
    #[serde(default)]
    music: Vec<String>,
    #[serde(default)]
    start_running: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BossSection {
    name: String,
    track: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SpawnPointEntry {
    id: u32,
    #[serde(default)]
    label: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WaveEntry {
    message: String,
    archetype: String,
    enemies_per_spawn_point: u32,
    spawn_rate: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SimulationSection {
    tick_ms: Option<u64>,
    max_ticks: Option<u64>,
    enemy_lifetime: Option<f64>,
    mount_after: Option<f64>,
    player_death_after: Option<f64>,
}

fn parse_scenario(contents: &str) -> Result<Scenario> {
    let file: ScenarioFile =
        toml::from_str(contents).context("failed to parse scenario toml contents")?;
    if file.version != SUPPORTED_SCENARIO_VERSION {
        bail!(
            "unsupported scenario version {}; expected {}",
            file.version,
            SUPPORTED_SCENARIO_VERSION
        );
    }

    let mut waves = Vec::with_capacity(file.waves.len());
    for (index, wave) in file.waves.into_iter().enumerate() {
        let spawn_rate = seconds(wave.spawn_rate, &format!("waves[{index}].spawn_rate"))?;
        waves.push(WaveDefinition::new(
            wave.message,
            EnemyArchetype::new(wave.archetype),
            wave.enemies_per_spawn_point,
            spawn_rate,
        ));
    }

    let director_section = file.director;
    let director = DirectorConfig::new(
        WaveSet::new(waves),
        file.spawn_points
            .iter()
            .map(|entry| SpawnPointId::new(entry.id))
            .collect(),
        BossEncounter::new(file.boss.name, Track::new(file.boss.track)),
    )
    .with_inter_wave_delay(optional_seconds(
        director_section.inter_wave_delay,
        "director.inter_wave_delay",
        DEFAULT_INTER_WAVE_DELAY,
    )?)
    .with_warning_duration(optional_seconds(
        director_section.warning,
        "director.warning",
        DEFAULT_WARNING_DURATION,
    )?)
    .with_poll_interval(optional_seconds(
        director_section.poll_interval,
        "director.poll_interval",
        DEFAULT_POLL_INTERVAL,
    )?)
    .with_music_tracks(director_section.music.into_iter().map(Track::new).collect())
    .with_container(ContainerId::new(director_section.container))
    .with_start_running(director_section.start_running);
    director
        .validate()
        .context("scenario describes an invalid director configuration")?;

    let spawn_points = file
        .spawn_points
        .into_iter()
        .map(|entry| {
            let label = if entry.label.is_empty() {
                format!("spawn point {}", entry.id)
            } else {
                entry.label
            };
            SpawnPoint::new(SpawnPointId::new(entry.id), label)
        })
        .collect();

    let simulation = parse_simulation(file.simulation)?;

    Ok(Scenario {
        seed: file.seed,
        spawn_points,
        director,
        simulation,
    })
}

fn parse_simulation(section: SimulationSection) -> Result<SimulationSettings> {
    let defaults = SimulationSettings::default();
    let settings = SimulationSettings {
        tick: section
            .tick_ms
            .map_or(defaults.tick, Duration::from_millis),
        max_ticks: section.max_ticks.unwrap_or(defaults.max_ticks),
        enemy_lifetime: optional_seconds(
            section.enemy_lifetime,
            "simulation.enemy_lifetime",
            defaults.enemy_lifetime,
        )?,
        mount_after: optional_seconds(
            section.mount_after,
            "simulation.mount_after",
            defaults.mount_after,
        )?,
        player_death_after: section
            .player_death_after
            .map(|value| seconds(value, "simulation.player_death_after"))
            .transpose()?,
    };
    settings.validate()?;
    Ok(settings)
}

/// Converts a seconds value into a duration, rejecting negative or non-finite input.
pub(crate) fn seconds(value: f64, field: &str) -> Result<Duration> {
    Duration::try_from_secs_f64(value).with_context(|| {
        format!("`{field}` must be a finite, non-negative number of seconds (got {value})")
    })
}

fn optional_seconds(value: Option<f64>, field: &str, fallback: Duration) -> Result<Duration> {
    value.map_or(Ok(fallback), |value| seconds(value, field))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        version = 1

        [boss]
        name = "Warden"
        track = "warden"

        [[spawn_points]]
        id = 4

        [[waves]]
        message = "Here they come"
        archetype = "crawler"
        enemies_per_spawn_point = 2
        spawn_rate = 0.25
    "#;

    #[test]
    fn bundled_scenario_parses() {
        let scenario = Scenario::bundled().expect("bundled scenario should parse");
        assert_eq!(scenario.spawn_points.len(), 4);
        assert_eq!(scenario.director.waves().len(), 3);
        assert_eq!(scenario.director.music_tracks().len(), 3);
        assert!(!scenario.director.start_running());
    }

    #[test]
    fn omitted_sections_fall_back_to_defaults() {
        let scenario = parse_scenario(MINIMAL).expect("minimal scenario should parse");
        assert_eq!(scenario.seed, 0);
        assert_eq!(
            scenario.director.inter_wave_delay(),
            DEFAULT_INTER_WAVE_DELAY
        );
        assert_eq!(scenario.director.poll_interval(), DEFAULT_POLL_INTERVAL);
        assert!(scenario.director.music_tracks().is_empty());
        assert_eq!(scenario.spawn_points[0].label(), "spawn point 4");
        assert_eq!(scenario.simulation, SimulationSettings::default());

        let wave = scenario.director.waves().iter().next().expect("one wave");
        assert_eq!(wave.spawn_rate(), Duration::from_millis(250));
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let contents = MINIMAL.replace("version = 1", "version = 2");
        let error = parse_scenario(&contents).expect_err("version 2 must be rejected");
        assert!(error.to_string().contains("unsupported scenario version"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let contents = format!("{MINIMAL}\n[extras]\nsparkles = true\n");
        assert!(parse_scenario(&contents).is_err());
    }

    #[test]
    fn negative_durations_are_rejected() {
        let contents = MINIMAL.replace("spawn_rate = 0.25", "spawn_rate = -1.0");
        let error = parse_scenario(&contents).expect_err("negative spawn rate");
        assert!(format!("{error:#}").contains("waves[0].spawn_rate"));
    }

    #[test]
    fn director_validation_errors_surface() {
        let contents = MINIMAL.replace("enemies_per_spawn_point = 2", "enemies_per_spawn_point = 0");
        let error = parse_scenario(&contents).expect_err("zero enemies per point");
        assert!(format!("{error:#}").contains("invalid director configuration"));
    }

    #[test]
    fn duplicate_spawn_points_are_rejected() {
        let contents = format!("{MINIMAL}\n[[spawn_points]]\nid = 4\n");
        assert!(parse_scenario(&contents).is_err());
    }

    #[test]
    fn zero_tick_length_is_rejected() {
        let contents = format!("{MINIMAL}\n[simulation]\ntick_ms = 0\n");
        assert!(parse_scenario(&contents).is_err());
    }
}

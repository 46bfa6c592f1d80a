#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a wave director scenario headlessly.

mod logging;
mod scenario;
mod simulation;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use scenario::{seconds, Scenario};
use simulation::{RunReport, Simulation};

/// Runs a wave director scenario at a fixed tick and reports what happened.
#[derive(Debug, Parser)]
#[command(name = "wave-director", version)]
struct CliArgs {
    /// Scenario file to load; the bundled scenario is used when omitted.
    #[arg(long, value_name = "PATH")]
    scenario: Option<PathBuf>,
    /// Overrides the scenario's random seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Overrides the tick length in milliseconds.
    #[arg(long, value_name = "MS")]
    tick_ms: Option<u64>,
    /// Overrides the maximum number of ticks to simulate.
    #[arg(long)]
    max_ticks: Option<u64>,
    /// Overrides how long an enemy survives before the player kills it.
    #[arg(long, value_name = "SECONDS")]
    enemy_lifetime: Option<f64>,
    /// Overrides when the player mounts and the director starts.
    #[arg(long, value_name = "SECONDS")]
    mount_after: Option<f64>,
    /// Kills the player at the given time, stopping the director.
    #[arg(long, value_name = "SECONDS")]
    player_death_after: Option<f64>,
    /// Prints the run report as JSON instead of a text summary.
    #[arg(long)]
    json: bool,
    /// Log filter used when `RUST_LOG` is not set.
    #[arg(long, default_value = "info")]
    log_filter: String,
}

impl CliArgs {
    fn apply_overrides(&self, scenario: &mut Scenario) -> Result<()> {
        if let Some(seed) = self.seed {
            scenario.seed = seed;
        }
        let settings = &mut scenario.simulation;
        if let Some(tick_ms) = self.tick_ms {
            settings.tick = Duration::from_millis(tick_ms);
        }
        if let Some(max_ticks) = self.max_ticks {
            settings.max_ticks = max_ticks;
        }
        if let Some(lifetime) = self.enemy_lifetime {
            settings.enemy_lifetime = seconds(lifetime, "--enemy-lifetime")?;
        }
        if let Some(mount) = self.mount_after {
            settings.mount_after = seconds(mount, "--mount-after")?;
        }
        if let Some(death) = self.player_death_after {
            settings.player_death_after = Some(seconds(death, "--player-death-after")?);
        }
        settings.validate()
    }
}

/// Entry point for the wave director command-line interface.
fn main() -> Result<()> {
    let args = CliArgs::parse();
    logging::init(&args.log_filter)?;

    let mut scenario = match &args.scenario {
        Some(path) => Scenario::load(path)?,
        None => Scenario::bundled()?,
    };
    args.apply_overrides(&mut scenario)?;
    info!(
        seed = scenario.seed,
        waves = scenario.director.waves().len(),
        spawn_points = scenario.spawn_points.len(),
        tick_ms = scenario.simulation.tick.as_millis() as u64,
        "scenario loaded"
    );

    let report = Simulation::new(scenario)
        .context("scenario rejected by the wave director")?
        .run();

    if args.json {
        let json =
            serde_json::to_string_pretty(&report).context("failed to serialize run report")?;
        println!("{json}");
    } else {
        print_summary(&report);
    }
    Ok(())
}

fn print_summary(report: &RunReport) {
    println!("outcome:        {}", report.outcome);
    println!("seed:           {}", report.seed);
    println!(
        "simulated:      {:.2}s over {} ticks",
        report.elapsed.as_secs_f64(),
        report.ticks
    );
    println!("final phase:    {:?}", report.final_phase);
    println!(
        "waves cleared:  {}/{}",
        report.waves_cleared, report.waves_total
    );
    println!(
        "enemies:        {} born, {} died, {} alive, {} rejected",
        report.births, report.deaths, report.live_enemies, report.rejected_spawns
    );
    println!("signals:        {}", report.signals.len());
    for timed in &report.signals {
        println!("  {:>8.2}s  {:?}", timed.at.as_secs_f64(), timed.signal);
    }
    match &report.ranking {
        Some(ranking) => {
            println!("ranking time:   {:.2}s", ranking.total.as_secs_f64());
            for (index, split) in ranking.splits.iter().enumerate() {
                println!("  wave {:>2}:  {:.2}s", index + 1, split.as_secs_f64());
            }
        }
        None => println!("ranking time:   not recorded"),
    }
}

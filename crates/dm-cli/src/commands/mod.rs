pub mod attr;
pub mod check;
pub mod look;
pub mod quests;
pub mod tree;

use dm_core::{EngineConfig, World};
use dm_dsl::{LoadConfig, LoadReport, load_world};

use crate::WorldArgs;

/// Parse a `NAME=VALUE` quest step.
pub fn parse_quest_step(s: &str) -> Result<(String, i64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got \"{s}\""))?;
    let value = value
        .trim()
        .parse::<i64>()
        .map_err(|_| format!("quest value \"{value}\" is not an integer"))?;
    Ok((name.trim().to_string(), value))
}

fn load_config(args: &WorldArgs) -> LoadConfig {
    LoadConfig::default()
        .with_max_depth(args.max_depth)
        .with_engine(
            EngineConfig::default()
                .with_max_iterations(args.max_iterations)
                .with_start_hour(args.hour),
        )
}

/// Load the world directory, print diagnostics, and apply any quest steps.
/// Fails if any source unit was rejected.
fn load(args: &WorldArgs) -> Result<World, String> {
    let report = load_report(args)?;
    if report.has_errors() {
        return Err("world failed to load".into());
    }

    let mut world = report.world;
    for (quest, value) in &args.quests {
        world
            .add_quest_state(quest, *value)
            .map_err(|e| e.to_string())?;
    }
    Ok(world)
}

fn load_report(args: &WorldArgs) -> Result<LoadReport, String> {
    let report = load_world(&args.dir, &load_config(args)).map_err(|e| e.to_string())?;
    print_diagnostics(&report);
    Ok(report)
}

/// Print diagnostics to stderr using ariadne.
fn print_diagnostics(report: &LoadReport) {
    if report.diagnostics.is_empty() {
        return;
    }

    eprint!("{}", report.render());

    let errors = report.error_count();
    let warnings = report.warning_count();

    if errors > 0 {
        eprintln!(
            "  {} error{}, {} warning{}",
            errors,
            if errors == 1 { "" } else { "s" },
            warnings,
            if warnings == 1 { "" } else { "s" },
        );
    } else {
        eprintln!(
            "  {} warning{}",
            warnings,
            if warnings == 1 { "" } else { "s" },
        );
    }
}

use clap::Parser;
use ghost_ai::constants::{POWER_DURATION_MS, TICK_MS};
use ghost_ai::grid::GridQuery;
use ghost_ai::levels::Level;
use ghost_ai::session::{Session, SessionOptions};
use ghost_ai::structured_log::{emit_log, now_ms};
use ghost_ai::types::{GhostState, Snapshot, Tile};
use serde::Serialize;
use serde_json::json;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Built-in level id (1-3).
    #[arg(long)]
    level: Option<u32>,
    /// Level text file; overrides --level.
    #[arg(long)]
    map: Option<PathBuf>,
    #[arg(long)]
    ticks: Option<u64>,
    #[arg(long)]
    dt_ms: Option<u64>,
    #[arg(long)]
    seed: Option<u64>,
    /// Tick at which the player is granted power.
    #[arg(long)]
    power_at: Option<u64>,
    /// Power duration in milliseconds.
    #[arg(long)]
    power_ms: Option<u64>,
    #[arg(long)]
    run_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug)]
struct Scenario {
    name: String,
    level: Level,
    ticks: u64,
    dt_ms: u64,
    seed: u64,
    power_at: Option<u64>,
    power_ms: u64,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    seed: u64,
    ticks: u64,
    #[serde(rename = "dtMs")]
    dt_ms: u64,
    ghosts: usize,
    hits: u32,
    #[serde(rename = "chaseTicks")]
    chase_ticks: u64,
    #[serde(rename = "stunnedTicks")]
    stunned_ticks: u64,
    #[serde(rename = "maxChasers")]
    max_chasers: usize,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioRunResult {
    #[serde(flatten)]
    result: ScenarioResultLine,
    #[serde(rename = "anomalyRecords")]
    anomaly_records: Vec<AnomalyRecord>,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "totalHits")]
    total_hits: u32,
    scenarios: Vec<ScenarioResultLine>,
}

fn main() {
    let cli = Cli::parse();
    let run_started_at_ms = now_ms();
    let seed = cli.seed.unwrap_or(run_started_at_ms);
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(seed, run_started_at_ms));

    let scenarios = match resolve_scenarios(&cli, seed) {
        Ok(scenarios) => scenarios,
        Err(message) => {
            emit_log(
                "error",
                "scenario_load_failed",
                &run_id,
                None,
                Some(seed),
                None,
                json!({ "error": message }),
            );
            std::process::exit(2);
        }
    };

    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();
    let mut total_anomalies = 0usize;

    for scenario in scenarios {
        emit_log(
            "info",
            "scenario_started",
            &run_id,
            Some(&scenario.name),
            Some(scenario.seed),
            None,
            json!({
                "ticks": scenario.ticks,
                "dtMs": scenario.dt_ms,
                "ghosts": scenario.level.ghost_spawns.len(),
                "powerAt": scenario.power_at,
                "powerMs": scenario.power_ms,
            }),
        );
        let scenario_run = run_scenario(&scenario);

        for anomaly in &scenario_run.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                &run_id,
                Some(&scenario.name),
                Some(scenario.seed),
                Some(anomaly.tick),
                json!({
                    "message": anomaly.message,
                }),
            );
        }

        if !scenario_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += scenario_run.anomaly_records.len();

        emit_log(
            "info",
            "scenario_finished",
            &run_id,
            Some(&scenario.name),
            Some(scenario.seed),
            Some(scenario.ticks),
            json!({
                "hits": scenario_run.result.hits,
                "chaseTicks": scenario_run.result.chase_ticks,
                "anomalyCount": scenario_run.anomaly_records.len(),
            }),
        );

        match serde_json::to_string(&scenario_run.result) {
            Ok(line) => println!("{line}"),
            Err(error) => emit_log(
                "error",
                "result_serialize_failed",
                &run_id,
                Some(&scenario.name),
                Some(scenario.seed),
                None,
                json!({ "error": error.to_string() }),
            ),
        }
        scenario_results.push(scenario_run.result);
    }

    let summary = build_run_summary(
        run_id.clone(),
        run_started_at_ms,
        now_ms(),
        scenario_results,
        total_anomalies,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &run_id,
                None,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "run_finished",
        &run_id,
        None,
        None,
        None,
        json!({
            "scenarioCount": summary.scenario_count,
            "anomalyCount": summary.anomaly_count,
            "totalHits": summary.total_hits,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn run_scenario(scenario: &Scenario) -> ScenarioRunResult {
    let mut session = Session::new(
        scenario.level.clone(),
        SessionOptions {
            dt_ms: scenario.dt_ms,
            seed: scenario.seed,
            power_duration_ms: scenario.power_ms,
            ..SessionOptions::default()
        },
    );

    let mut chase_ticks = 0u64;
    let mut stunned_ticks = 0u64;
    let mut max_chasers = 0usize;
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();

    for tick in 0..scenario.ticks {
        if scenario.power_at == Some(tick) {
            session.grant_power();
        }
        let snapshot = session.step();
        for message in collect_snapshot_anomalies(&snapshot, &scenario.level) {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                message,
            );
        }

        let chasers = snapshot
            .ghosts
            .iter()
            .filter(|ghost| ghost.state == GhostState::Chase)
            .count();
        if chasers > 0 {
            chase_ticks += 1;
        }
        if snapshot
            .ghosts
            .iter()
            .any(|ghost| ghost.state == GhostState::Stunned)
        {
            stunned_ticks += 1;
        }
        max_chasers = max_chasers.max(chasers);
    }

    ScenarioRunResult {
        result: ScenarioResultLine {
            scenario: scenario.name.clone(),
            seed: scenario.seed,
            ticks: scenario.ticks,
            dt_ms: scenario.dt_ms,
            ghosts: scenario.level.ghost_spawns.len(),
            hits: session.hits(),
            chase_ticks,
            stunned_ticks,
            max_chasers,
            anomalies,
        },
        anomaly_records,
    }
}

fn collect_snapshot_anomalies(snapshot: &Snapshot, level: &Level) -> Vec<String> {
    let mut anomalies = Vec::new();
    if snapshot.ghosts.len() != level.ghost_spawns.len() {
        anomalies.push(format!(
            "ghost count changed: {} != {}",
            snapshot.ghosts.len(),
            level.ghost_spawns.len()
        ));
    }
    for (index, ghost) in snapshot.ghosts.iter().enumerate() {
        if !level.grid.walkable(Tile::new(ghost.x, ghost.y)) {
            anomalies.push(format!(
                "ghost {index} on blocked tile ({}, {})",
                ghost.x, ghost.y
            ));
        }
    }
    if snapshot.events.player_hit && snapshot.player.powered {
        anomalies.push("player hit while powered".to_string());
    }
    anomalies
}

fn resolve_scenarios(cli: &Cli, seed: u64) -> Result<Vec<Scenario>, String> {
    let ticks = cli.ticks.unwrap_or(2_400).clamp(1, 1_000_000);
    let dt_ms = cli.dt_ms.unwrap_or(TICK_MS).clamp(1, 1_000);
    let power_ms = cli.power_ms.unwrap_or(POWER_DURATION_MS);

    if let Some(path) = cli.map.as_ref() {
        let level = load_map(path)?;
        return Ok(vec![Scenario {
            name: format!("map-{}", path.to_string_lossy()),
            level,
            ticks,
            dt_ms,
            seed,
            power_at: cli.power_at,
            power_ms,
        }]);
    }

    if let Some(id) = cli.level {
        let level = Level::builtin(id).map_err(|error| error.to_string())?;
        return Ok(vec![Scenario {
            name: format!("level-{id}"),
            level,
            ticks,
            dt_ms,
            seed,
            power_at: cli.power_at,
            power_ms,
        }]);
    }

    (1..=3u32)
        .map(|id| {
            let level = Level::builtin(id).map_err(|error| error.to_string())?;
            Ok(Scenario {
                name: format!("level-{id}"),
                level,
                ticks,
                dt_ms,
                seed: seed.wrapping_add(u64::from(id) - 1),
                power_at: cli.power_at.or(Some(ticks / 2)),
                power_ms,
            })
        })
        .collect()
}

fn load_map(path: &Path) -> Result<Level, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|error| format!("{}: {error}", path.to_string_lossy()))?;
    Level::parse(&text).map_err(|error| format!("{}: {error}", path.to_string_lossy()))
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_run_id(seed: u64, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    run_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    scenarios: Vec<ScenarioResultLine>,
    anomaly_count: usize,
) -> RunSummary {
    RunSummary {
        run_id,
        started_at_ms,
        finished_at_ms,
        scenario_count: scenarios.len(),
        anomaly_count,
        total_hits: scenarios.iter().map(|scenario| scenario.hits).sum(),
        scenarios,
    }
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn make_scenario_result(hits: u32) -> ScenarioResultLine {
        ScenarioResultLine {
            scenario: "test".to_string(),
            seed: 42,
            ticks: 100,
            dt_ms: 50,
            ghosts: 3,
            hits,
            chase_ticks: 0,
            stunned_ticks: 0,
            max_chasers: 0,
            anomalies: Vec::new(),
        }
    }

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("simulate").chain(args.iter().copied()))
    }

    #[test]
    fn default_run_id_contains_seed_and_timestamp() {
        assert_eq!(default_run_id(42, 123456789), "sim-42-123456789");
    }

    #[test]
    fn build_run_summary_totals_hits() {
        let summary = build_run_summary(
            "sim-42-1".to_string(),
            1,
            2,
            vec![make_scenario_result(2), make_scenario_result(3)],
            1,
        );
        assert_eq!(summary.total_hits, 5);
        assert_eq!(summary.scenario_count, 2);
    }

    #[test]
    fn write_summary_returns_error_when_parent_does_not_exist() {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let target = std::env::temp_dir()
            .join(format!("ghost-ai-missing-{now}"))
            .join("summary.json");
        let summary = build_run_summary("sim-1-1".to_string(), 1, 2, Vec::new(), 0);
        assert!(write_summary(&target, &summary).is_err());
    }

    #[test]
    fn push_anomaly_keeps_records_and_deduplicates_summary_messages() {
        let mut anomalies = Vec::new();
        let mut records = Vec::new();
        let mut seen = HashSet::new();
        push_anomaly(&mut anomalies, &mut records, &mut seen, 10, "same".to_string());
        push_anomaly(&mut anomalies, &mut records, &mut seen, 11, "same".to_string());
        assert_eq!(anomalies.len(), 1);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].tick, 11);
    }

    #[test]
    fn default_run_covers_every_builtin_level() {
        let scenarios = resolve_scenarios(&cli(&["--ticks", "40"]), 7).expect("builtins load");
        let names: Vec<&str> = scenarios.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["level-1", "level-2", "level-3"]);
        assert!(scenarios.iter().all(|s| s.power_at == Some(20)));
        assert!(resolve_scenarios(&cli(&["--level", "9"]), 7).is_err());
    }

    #[test]
    fn builtin_scenarios_run_without_anomalies() {
        let scenarios =
            resolve_scenarios(&cli(&["--ticks", "600", "--power-at", "100"]), 3).expect("load");
        for scenario in &scenarios {
            let run = run_scenario(scenario);
            assert!(
                run.result.anomalies.is_empty(),
                "{}: {:?}",
                scenario.name,
                run.result.anomalies
            );
            assert_eq!(run.result.ghosts, 3);
        }
    }

    #[test]
    fn missing_map_file_is_reported() {
        let error = load_map(Path::new("/definitely/not/here.txt")).expect_err("missing file");
        assert!(error.contains("not/here.txt"));
    }
}

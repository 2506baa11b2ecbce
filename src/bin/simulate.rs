use clap::Parser;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use territory_rust_server::constants::{MAP_SIZE, MIN_POLYGON_POINTS, TRAIL_MAX};
use territory_rust_server::engine::{score_for, GameEngine, GameEngineOptions};
use territory_rust_server::rng::Rng;
use territory_rust_server::types::{Direction, EliminationCause, Snapshot};

/// Headless territory match between rectangle-tracing bots.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Run one custom scenario instead of the built-in pair.
    #[arg(long)]
    single: bool,
    #[arg(long)]
    bots: Option<usize>,
    #[arg(long)]
    ticks: Option<u64>,
    #[arg(long)]
    seed: Option<u32>,
    #[arg(long)]
    run_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug)]
struct Scenario {
    name: String,
    bots: usize,
    ticks: u64,
    seed: u32,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScenarioReport {
    scenario: String,
    seed: u32,
    bots: usize,
    ticks: u64,
    captures: usize,
    trail_collisions: usize,
    self_collisions: usize,
    respawns: usize,
    best_score: f64,
    final_scores: BTreeMap<String, f64>,
    /// Distinct violations mapped to the tick they were first seen.
    anomalies: BTreeMap<String, u64>,
    anomaly_count: usize,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunSummary {
    run_id: String,
    elapsed_ms: u64,
    anomaly_count: usize,
    total_captures: usize,
    total_eliminations: usize,
    scenarios: Vec<ScenarioReport>,
}

/// Invariant violations seen during one scenario.
#[derive(Debug, Default)]
struct AnomalyLedger {
    first_seen: BTreeMap<String, u64>,
    count: usize,
}

impl AnomalyLedger {
    /// Returns true the first time a message shows up.
    fn record(&mut self, tick: u64, message: String) -> bool {
        self.count += 1;
        if self.first_seen.contains_key(&message) {
            return false;
        }
        self.first_seen.insert(message, tick);
        true
    }
}

/// JSON lines on stderr, one per event.
struct RunLog {
    run_id: String,
}

impl RunLog {
    fn event(&self, level: &str, event: &str, scenario: Option<&Scenario>, details: Value) {
        let mut line = json!({
            "timestampMs": now_ms(),
            "level": level,
            "event": event,
            "runId": self.run_id,
            "details": details,
        });
        if let Some(scenario) = scenario {
            line["scenario"] = json!(scenario.name);
            line["seed"] = json!(scenario.seed);
        }
        eprintln!("{line}");
    }
}

/// Traces axis-aligned rectangles, picking a new size after every lap.
#[derive(Clone, Debug)]
struct LoopBot {
    id: String,
    legs: [Direction; 4],
    leg: usize,
    leg_ticks: u32,
    remaining: u32,
}

impl LoopBot {
    fn new(id: String, rng: &mut Rng) -> Self {
        let legs = if rng.int(0, 1) == 0 {
            [
                Direction::Right,
                Direction::Down,
                Direction::Left,
                Direction::Up,
            ]
        } else {
            [
                Direction::Down,
                Direction::Right,
                Direction::Up,
                Direction::Left,
            ]
        };
        let leg_ticks = random_leg_ticks(rng);
        Self {
            id,
            legs,
            leg: 0,
            leg_ticks,
            remaining: leg_ticks,
        }
    }

    /// Direction to send this tick, or `None` when the heading is unchanged.
    fn next_direction(&mut self, rng: &mut Rng) -> Option<Direction> {
        if self.remaining == 0 {
            self.leg = (self.leg + 1) % self.legs.len();
            if self.leg == 0 {
                self.leg_ticks = random_leg_ticks(rng);
            }
            self.remaining = self.leg_ticks;
            self.remaining -= 1;
            return Some(self.legs[self.leg]);
        }
        let first = self.remaining == self.leg_ticks;
        self.remaining -= 1;
        first.then_some(self.legs[self.leg])
    }
}

/// Four legs of up to 36 ticks stay under the trail cap, so laps can close.
fn random_leg_ticks(rng: &mut Rng) -> u32 {
    rng.int(12, 36) as u32
}

fn main() {
    let cli = Cli::parse();
    let started = Instant::now();
    let scenarios = resolve_scenarios(&cli);
    let log = RunLog {
        run_id: cli
            .run_id
            .clone()
            .unwrap_or_else(|| format!("sim-{}", scenarios[0].seed)),
    };

    let mut reports = Vec::new();
    for scenario in &scenarios {
        log.event(
            "info",
            "scenario_started",
            Some(scenario),
            json!({ "bots": scenario.bots, "ticks": scenario.ticks }),
        );
        let report = run_scenario(scenario);
        for (message, tick) in &report.anomalies {
            log.event(
                "warn",
                "anomaly_detected",
                Some(scenario),
                json!({ "tick": tick, "message": message }),
            );
        }
        log.event(
            "info",
            "scenario_finished",
            Some(scenario),
            json!({
                "captures": report.captures,
                "respawns": report.respawns,
                "bestScore": report.best_score,
                "anomalyCount": report.anomaly_count,
            }),
        );
        match serde_json::to_string(&report) {
            Ok(line) => println!("{line}"),
            Err(error) => log.event(
                "error",
                "report_encode_failed",
                Some(scenario),
                json!({ "error": error.to_string() }),
            ),
        }
        reports.push(report);
    }

    let summary = summarize(log.run_id.clone(), started.elapsed().as_millis() as u64, reports);
    if let Some(path) = cli.summary_out.as_deref() {
        if let Err(error) = write_summary(path, &summary) {
            log.event(
                "error",
                "summary_write_failed",
                None,
                json!({ "path": path.to_string_lossy(), "error": error.to_string() }),
            );
            std::process::exit(2);
        }
    }

    log.event(
        "info",
        "run_finished",
        None,
        json!({
            "scenarioCount": summary.scenarios.len(),
            "anomalyCount": summary.anomaly_count,
            "totalCaptures": summary.total_captures,
            "totalEliminations": summary.total_eliminations,
            "elapsedMs": summary.elapsed_ms,
        }),
    );

    if summary.anomaly_count > 0 {
        std::process::exit(1);
    }
}

fn run_scenario(scenario: &Scenario) -> ScenarioReport {
    let mut engine = GameEngine::new(scenario.seed, GameEngineOptions::default());
    let mut rng = Rng::new(scenario.seed.wrapping_mul(31).wrapping_add(7));
    let mut bots = Vec::new();
    let mut next_bot = 1usize;
    for _ in 0..scenario.bots {
        bots.push(spawn_bot(&mut engine, &mut rng, &mut next_bot));
    }

    let mut captures = 0usize;
    let mut trail_collisions = 0usize;
    let mut self_collisions = 0usize;
    let mut respawns = 0usize;
    let mut best_score = 0.0f64;
    let mut ledger = AnomalyLedger::default();

    for _ in 0..scenario.ticks {
        for bot in &mut bots {
            if let Some(direction) = bot.next_direction(&mut rng) {
                engine.receive_move(&bot.id, direction);
            }
        }

        let outcome = engine.step();
        captures += outcome.captures.len();
        for elimination in &outcome.eliminations {
            match elimination.cause {
                EliminationCause::TrailCollision { .. } => trail_collisions += 1,
                EliminationCause::SelfCollision => self_collisions += 1,
            }
        }

        let snapshot = engine.build_snapshot();
        for message in snapshot_anomalies(&snapshot) {
            ledger.record(snapshot.tick, message);
        }
        for player in snapshot.players.values() {
            best_score = best_score.max(player.score);
        }

        let before = bots.len();
        bots.retain(|bot| engine.has_player(&bot.id));
        for _ in bots.len()..before {
            bots.push(spawn_bot(&mut engine, &mut rng, &mut next_bot));
            respawns += 1;
        }
    }

    ScenarioReport {
        scenario: scenario.name.clone(),
        seed: scenario.seed,
        bots: scenario.bots,
        ticks: scenario.ticks,
        captures,
        trail_collisions,
        self_collisions,
        respawns,
        best_score,
        final_scores: engine
            .players()
            .map(|player| (player.id.clone(), player.score))
            .collect(),
        anomalies: ledger.first_seen,
        anomaly_count: ledger.count,
    }
}

fn spawn_bot(engine: &mut GameEngine, rng: &mut Rng, next_bot: &mut usize) -> LoopBot {
    loop {
        let id = format!("bot_{}", *next_bot);
        *next_bot += 1;
        if engine.add_player(&id).is_some() {
            return LoopBot::new(id, rng);
        }
    }
}

fn snapshot_anomalies(snapshot: &Snapshot) -> Vec<String> {
    let mut anomalies = Vec::new();
    for player in snapshot.players.values() {
        let position = player.position;
        if !(0.0..=MAP_SIZE).contains(&position.x) || !(0.0..=MAP_SIZE).contains(&position.y) {
            anomalies.push(format!("position out of bounds: {}", player.id));
        }
        if player.trail.len() > TRAIL_MAX {
            anomalies.push(format!("trail over cap: {}", player.id));
        }
        if player
            .territories
            .iter()
            .any(|polygon| polygon.len() < MIN_POLYGON_POINTS)
        {
            anomalies.push(format!("degenerate territory stored: {}", player.id));
        }
        if player.score != score_for(&player.territories) {
            anomalies.push(format!("score drift: {}", player.id));
        }
        if !player.alive {
            anomalies.push(format!("dead player in snapshot: {}", player.id));
        }
    }
    anomalies
}

fn resolve_scenarios(cli: &Cli) -> Vec<Scenario> {
    let seed = cli.seed.unwrap_or_else(|| now_ms() as u32);

    if cli.single || cli.bots.is_some() || cli.ticks.is_some() {
        let bots = cli.bots.unwrap_or(4).clamp(1, 200);
        return vec![Scenario {
            name: format!("custom-bots{bots}"),
            bots,
            ticks: cli.ticks.unwrap_or(3_600).clamp(1, 216_000),
            seed,
        }];
    }

    vec![
        Scenario {
            name: "solo-laps".to_string(),
            bots: 1,
            ticks: 3_600,
            seed,
        },
        Scenario {
            name: "crowd-bots16".to_string(),
            bots: 16,
            ticks: 3_600,
            seed: seed.wrapping_add(1),
        },
    ]
}

fn summarize(run_id: String, elapsed_ms: u64, scenarios: Vec<ScenarioReport>) -> RunSummary {
    RunSummary {
        run_id,
        elapsed_ms,
        anomaly_count: scenarios.iter().map(|s| s.anomaly_count).sum(),
        total_captures: scenarios.iter().map(|s| s.captures).sum(),
        total_eliminations: scenarios
            .iter()
            .map(|s| s.trail_collisions + s.self_collisions)
            .sum(),
        scenarios,
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario(bots: usize, ticks: u64, seed: u32) -> Scenario {
        Scenario {
            name: "test".to_string(),
            bots,
            ticks,
            seed,
        }
    }

    #[test]
    fn loop_bot_cycles_through_its_legs() {
        let mut rng = Rng::new(5);
        let mut bot = LoopBot::new("bot_1".to_string(), &mut rng);
        let leg_ticks = bot.leg_ticks as usize;
        let mut issued = Vec::new();
        for _ in 0..leg_ticks * 4 {
            if let Some(direction) = bot.next_direction(&mut rng) {
                issued.push(direction);
            }
        }
        assert_eq!(issued, bot.legs.to_vec());
    }

    #[test]
    fn solo_bot_claims_territory_without_anomalies() {
        let report = run_scenario(&scenario(1, 2_000, 17));
        assert!(report.anomalies.is_empty(), "{:?}", report.anomalies);
        assert!(report.captures > 0);
        assert!(report.best_score > 0.0);
    }

    #[test]
    fn crowd_keeps_population_and_invariants() {
        let report = run_scenario(&scenario(12, 1_500, 99));
        assert!(report.anomalies.is_empty(), "{:?}", report.anomalies);
        assert_eq!(report.final_scores.len(), 12);
        assert_eq!(
            report.respawns,
            report.trail_collisions + report.self_collisions
        );
    }

    #[test]
    fn summary_totals_every_scenario() {
        let a = run_scenario(&scenario(2, 300, 1));
        let b = run_scenario(&scenario(3, 300, 2));
        let expected_captures = a.captures + b.captures;
        let summary = summarize("sim-1".to_string(), 5, vec![a, b]);
        assert_eq!(summary.scenarios.len(), 2);
        assert_eq!(summary.total_captures, expected_captures);
        assert_eq!(summary.anomaly_count, 0);
    }

    #[test]
    fn write_summary_fails_when_parent_is_missing() {
        let target = std::env::temp_dir()
            .join(format!("territory-missing-{}", now_ms()))
            .join("summary.json");
        let summary = summarize("sim-1".to_string(), 0, Vec::new());
        assert!(write_summary(&target, &summary).is_err());
    }

    #[test]
    fn ledger_counts_repeats_but_keeps_first_tick() {
        let mut ledger = AnomalyLedger::default();
        assert!(ledger.record(10, "score drift: bot_1".to_string()));
        assert!(!ledger.record(11, "score drift: bot_1".to_string()));

        assert_eq!(ledger.count, 2);
        assert_eq!(ledger.first_seen.len(), 1);
        assert_eq!(ledger.first_seen["score drift: bot_1"], 10);
    }
}

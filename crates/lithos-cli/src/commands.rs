//! CLI command implementations.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::Deserialize;

use lithos_bench::metrics::BenchmarkMetrics;
use lithos_bench::runner::BenchmarkRunner;
use lithos_bench::scenarios::{Scenario, ScenarioKind};
use lithos_io::validator::validate_run_params;
use lithos_io::{DirectoryStore, FieldSnapshot, MeshSnapshot, RestartRequest, RunParams, Snapshot, SwarmSnapshot};
use lithos_material::{Capability, Material, MaterialLibrary};
use lithos_solver::ModelConfig;
use lithos_telemetry::{EventBus, JsonLinesSink, TracingSink};
use lithos_types::units::SECONDS_PER_YEAR;

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Contents of a run file. Every table is optional; missing ones fall back
/// to the scenario's own settings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RunFile {
    scenario: Option<String>,
    model: Option<ModelConfig>,
    run: Option<RunParams>,
    /// Extra templates, overriding presets of the same name.
    materials: Vec<Material>,
}

pub struct RunArgs<'a> {
    pub config: Option<&'a str>,
    pub scenario: &'a str,
    pub steps: Option<u64>,
    pub output: &'a str,
    pub restart: Option<i64>,
    pub events: Option<&'a str>,
}

fn scenario_kind(name: &str) -> Result<ScenarioKind, Box<dyn std::error::Error>> {
    ScenarioKind::from_name(name).ok_or_else(|| {
        let available: Vec<&str> = ScenarioKind::all().iter().map(|k| k.name()).collect();
        format!("Unknown scenario: '{name}'. Available: {}", available.join(", ")).into()
    })
}

/// Run a scenario with checkpoints on disk.
pub fn run(args: RunArgs<'_>) -> CliResult {
    println!("Lithos Run");
    println!("──────────");

    let file: RunFile = match args.config {
        Some(path) => {
            println!("Config:     {path}");
            toml::from_str(&std::fs::read_to_string(path)?)?
        }
        None => RunFile::default(),
    };

    let mut library = MaterialLibrary::with_defaults();
    for material in file.materials {
        library.register(material);
    }

    let name = file.scenario.as_deref().unwrap_or(args.scenario);
    let mut scenario = Scenario::from_kind(scenario_kind(name)?);
    if let Some(model) = file.model {
        scenario.config = model;
    }
    if let Some(run) = file.run {
        scenario.run = run;
    }
    if let Some(n) = args.steps {
        scenario = scenario.with_steps(n);
    }
    if let Some(step) = args.restart {
        scenario.run.restart = Some(RestartRequest::at(step));
    }
    if !scenario.run.checkpoints_requested() {
        scenario.run = scenario.run.checkpoint_every_steps(1);
    }

    println!("Scenario:   {}", scenario.kind.name());
    println!("Output:     {}", args.output);
    println!();

    let mut bus = EventBus::with_sink(Box::new(TracingSink::new()));
    if let Some(path) = args.events {
        bus.add_sink(Box::new(JsonLinesSink::new(BufWriter::new(File::create(path)?))));
    }

    let mut model = scenario
        .build(&library)?
        .with_store(Box::new(DirectoryStore::new(args.output)))
        .with_events(bus);
    tracing::info!(scenario = scenario.kind.name(), output = args.output, "model built");
    println!("Particles:  {}", model.particle_count());
    println!("Elements:   {}", model.mesh.element_count());

    let summary = model.run_for(&scenario.run)?;

    println!();
    if let Some(id) = summary.restarted_from {
        println!("Restarted:  checkpoint {id}");
    }
    println!("Steps:      {}", summary.steps);
    println!("Model time: {:.4} Myr", summary.time / SECONDS_PER_YEAR / 1e6);
    if let Some(dt) = summary.last_dt {
        println!("Last dt:    {:.4} kyr", dt / SECONDS_PER_YEAR / 1e3);
    }
    println!("Checkpoints: {}", summary.checkpoints.len());
    println!("Wall time:  {:.3}s", summary.wall_time_seconds);
    Ok(())
}

/// Run benchmark suite.
pub fn benchmark(scenario_name: &str, steps: Option<u64>, output_path: Option<&str>) -> CliResult {
    println!("Lithos Benchmark Suite");
    println!("══════════════════════");
    println!();

    let scenarios: Vec<ScenarioKind> = if scenario_name == "all" {
        ScenarioKind::all().to_vec()
    } else {
        vec![scenario_kind(scenario_name)?]
    };

    let library = MaterialLibrary::with_defaults();
    let mut all_metrics = Vec::new();

    for &kind in &scenarios {
        let mut scenario = Scenario::from_kind(kind);
        if let Some(n) = steps {
            scenario = scenario.with_steps(n);
        }

        println!(
            "Running: {} ({}x{} elements, {} layers)",
            kind.name(),
            scenario.resolution[0],
            scenario.resolution[1],
            scenario.layers.len(),
        );

        let metrics =
            BenchmarkRunner::run_with(&scenario, &library).map_err(|e| format!("Benchmark failed: {e}"))?;

        println!("  Steps:         {}", metrics.timesteps);
        println!("  Wall time:     {:.3}s", metrics.total_wall_time);
        println!("  Avg step:      {:.3}ms", metrics.avg_step_time * 1000.0);
        println!("  Yielding:      {:.1}%", metrics.yielding_fraction * 100.0);
        println!("  Mean log10 η:  {:.2}", metrics.mean_log10_viscosity);
        println!();

        all_metrics.push(metrics);
    }

    if let Some(path) = output_path {
        std::fs::write(path, BenchmarkMetrics::to_csv(&all_metrics))?;
        println!("Results written to: {path}");
    } else {
        println!("CSV Output:");
        println!("{}", BenchmarkMetrics::to_csv(&all_metrics));
    }

    Ok(())
}

fn range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

/// Inspect a checkpoint payload. The kind is taken from the file name.
pub fn inspect(path: &str) -> CliResult {
    println!("Lithos Checkpoint Inspector");
    println!("───────────────────────────");
    println!();

    let data = std::fs::read(path)?;
    let stem = Path::new(path).file_name().and_then(|s| s.to_str()).unwrap_or_default();

    if stem.starts_with("swarm-") {
        let snapshot = SwarmSnapshot::from_bytes(&data)?;
        println!("Kind:         swarm");
        println!("Step:         {}", snapshot.step);
        println!("Model time:   {:.6e}s", snapshot.time);
        println!("Particles:    {}", snapshot.particle_count());
        if !snapshot.positions.is_empty() {
            let (min_y, max_y) = range(snapshot.positions.iter().map(|p| p[1]));
            println!("Y range:      [{min_y:.4}, {max_y:.4}]");
        }
    } else if stem.starts_with("mesh") {
        let snapshot = MeshSnapshot::from_bytes(&data)?;
        println!("Kind:         mesh");
        println!("Model time:   {:.6e}s", snapshot.time);
        println!("Nodes:        {}", snapshot.mesh.node_count());
        println!("Elements:     {}", snapshot.mesh.element_count());
    } else {
        let snapshot = FieldSnapshot::from_bytes(&data)?;
        println!("Kind:         field '{}'", snapshot.name);
        println!("Model time:   {:.6e}s", snapshot.time);
        println!("Entries:      {} x {}", snapshot.len(), snapshot.components);
        if !snapshot.values.is_empty() {
            let (lo, hi) = range(snapshot.values.iter().copied());
            println!("Value range:  [{lo:.6e}, {hi:.6e}]");
        }
    }

    Ok(())
}

/// Validate a run file or a set of run parameters.
pub fn validate(path: &str) -> CliResult {
    println!("Lithos Validator");
    println!("────────────────");
    println!();

    if path.ends_with(".toml") {
        println!("Validating run file: {path}");
        let file: RunFile = toml::from_str(&std::fs::read_to_string(path)?)?;
        if let Some(name) = &file.scenario {
            scenario_kind(name)?;
        }
        let mut failures = Vec::new();
        if let Some(model) = &file.model {
            if let Err(e) = model.validate() {
                failures.push(e.to_string());
            }
        }
        if let Some(run) = &file.run {
            if let Err(e) = validate_run_params(run) {
                failures.push(e.to_string());
            }
        }
        for material in &file.materials {
            if let Err(e) = material.validate() {
                failures.push(e.to_string());
            }
        }
        if failures.is_empty() {
            println!("✅ Run file is valid.");
        } else {
            for f in &failures {
                println!("❌ {f}");
            }
        }
    } else if path.ends_with(".json") {
        println!("Validating run parameters: {path}");
        let params: RunParams = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        match validate_run_params(&params) {
            Ok(()) => println!("✅ Run parameters are valid."),
            Err(e) => println!("❌ Validation failed: {e}"),
        }
    } else {
        println!("Unsupported file format. Use .toml (run file) or .json (run parameters).");
    }

    Ok(())
}

/// List the built-in material presets.
pub fn materials() -> CliResult {
    println!("Lithos Material Presets");
    println!("───────────────────────");
    println!();

    let library = MaterialLibrary::with_defaults();
    let shown = [
        (Capability::Viscosity, "viscous"),
        (Capability::Plasticity, "plastic"),
        (Capability::Elasticity, "elastic"),
        (Capability::Melt, "melt"),
        (Capability::RadiogenicHeating, "heating"),
    ];
    for name in library.names() {
        if let Some(material) = library.get(name) {
            let tags: Vec<&str> = shown.iter().filter(|(c, _)| material.has(*c)).map(|(_, t)| *t).collect();
            println!("  {name:<20} {}", tags.join(", "));
        }
    }
    Ok(())
}

//! Headless Plan Preview
//!
//! Runs one reach against the simulated scene without prompting and prints
//! every dispatched trajectory as JSON.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;

use reach_grasp::control::{NoMarkers, RunController, TickOutcome};
use reach_grasp::core::types::JointTrajectory;
use reach_grasp::core::{ControllerConfig, Shutdown};
use reach_grasp::motion::ControllerGroup;
use reach_grasp::scene::SceneSnapshot;
use reach_grasp::sim::{SceneFile, SimBackend};

/// Headless Plan Preview - one simulated reach, trajectories as JSON
#[derive(Parser, Debug)]
#[command(name = "plan_preview")]
#[command(about = "Plan and simulate one reach, then print the dispatched trajectories")]
struct Args {
    /// Object to reach
    #[arg(long, default_value = "coke_can")]
    target: String,

    /// Simulated scene description (TOML)
    #[arg(long, default_value = "data/scene.toml")]
    scene: PathBuf,

    /// Planner seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Maximum ticks before giving up on finding a plan
    #[arg(long, default_value_t = 20)]
    max_ticks: u32,
}

#[derive(Serialize)]
struct Dispatch<'a> {
    group: ControllerGroup,
    trajectory: &'a JointTrajectory,
}

#[derive(Serialize)]
struct PreviewResult<'a> {
    target: String,
    seed: u64,
    ticks: u32,
    completed: bool,
    dispatched: Vec<Dispatch<'a>>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter("reach_grasp=warn")
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);

    let scene = match SceneFile::load(&args.scene) {
        Ok(scene) => scene,
        Err(e) => {
            eprintln!("Failed to load scene '{}': {}", args.scene.display(), e);
            return ExitCode::FAILURE;
        }
    };
    let backend = match SimBackend::from_scene(&scene, seed) {
        Ok(backend) => backend,
        Err(e) => {
            eprintln!("Invalid scene: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let snapshot = SceneSnapshot::new(backend.entity_names());
    let config = ControllerConfig {
        target: args.target.clone(),
        ..ControllerConfig::default()
    };
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        return ExitCode::FAILURE;
    }
    let mut controller = RunController::new(
        config,
        backend.provider,
        backend.arm,
        backend.planner,
        backend.executor,
        Shutdown::new(),
    )
    .with_markers(Box::new(NoMarkers));

    controller.on_scene_update(snapshot);
    if let Err(e) = controller.start() {
        eprintln!("Could not reach the init posture: {}", e);
        return ExitCode::FAILURE;
    }

    let mut ticks = 0;
    let mut completed = false;
    while ticks < args.max_ticks {
        ticks += 1;
        match controller.run() {
            Ok(TickOutcome::Completed) => {
                completed = true;
                break;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("Reach failed: {}", e);
                break;
            }
        }
    }

    let result = PreviewResult {
        target: args.target,
        seed,
        ticks,
        completed,
        dispatched: controller
            .executor()
            .dispatched()
            .iter()
            .map(|(group, trajectory)| Dispatch {
                group: *group,
                trajectory,
            })
            .collect(),
    };

    match serde_json::to_string_pretty(&result) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to serialize result: {}", e);
            return ExitCode::FAILURE;
        }
    }

    if completed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

//! Reach Grasp - Entry Point
//!
//! Loads the controller configuration and the simulated scene, asks for
//! confirmation, then runs the event pump: scene updates, manual posture
//! commands and periodic run ticks, all on one thread.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing_subscriber::EnvFilter;

use reach_grasp::control::{RunController, TickOutcome};
use reach_grasp::core::error::{ReachError, Result};
use reach_grasp::core::{ControllerConfig, Shutdown};
use reach_grasp::sim::{spawn_scene_feed, SceneFile, SimBackend};

/// Reach-and-grasp controller running against the simulated scene
#[derive(Parser, Debug)]
#[command(name = "reach_grasp")]
#[command(about = "Plan and execute a reach-and-grasp towards a named scene object")]
struct Args {
    /// Object to reach (overrides the config file)
    #[arg(long)]
    target: Option<String>,

    /// Controller configuration (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Simulated scene description (TOML)
    #[arg(long, default_value = "data/scene.toml")]
    scene: PathBuf,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    yes: bool,

    /// Planner seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
}

/// Commands typed on stdin while the controller runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ManualCommand {
    Home,
    Init,
    Quit,
}

impl ManualCommand {
    fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "home" | "h" => Some(ManualCommand::Home),
            "init" | "i" => Some(ManualCommand::Init),
            "quit" | "q" => Some(ManualCommand::Quit),
            _ => None,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("reach_grasp=info")),
        )
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(ReachError::Cancelled) => {
            tracing::info!("shut down before the target was reached");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => ControllerConfig::load(path)?,
        None => ControllerConfig::default(),
    };
    if let Some(target) = args.target {
        config.target = target;
    }
    config.validate()?;

    let scene = SceneFile::load(&args.scene)?;
    let seed = args.seed.unwrap_or_else(rand::random);
    tracing::info!(object = %config.target, seed, "reach grasp starting");

    if !args.yes && !confirm(&config.target)? {
        tracing::info!("aborted at prompt");
        return Ok(());
    }

    let rt = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    let result = rt.block_on(pump(config, scene, seed));
    // A pending stdin read must not hold the process open
    rt.shutdown_timeout(Duration::from_millis(100));
    result
}

fn confirm(target: &str) -> Result<bool> {
    println!();
    println!("The arm will move towards [{}].", target);
    print!("Press enter to continue or n to exit: ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();
    Ok(!(input == "n" || input == "N"))
}

async fn pump(config: ControllerConfig, scene: SceneFile, seed: u64) -> Result<()> {
    let shutdown = Shutdown::new();
    let backend = SimBackend::from_scene(&scene, seed)?;

    let (scene_tx, mut scene_rx) = mpsc::channel(8);
    let feed = spawn_scene_feed(
        backend.entity_names(),
        Duration::from_millis(200),
        scene_tx,
        shutdown.clone(),
    );

    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received");
            ctrl_c.request();
        }
    });

    let (command_tx, mut command_rx) = mpsc::channel(4);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match ManualCommand::parse(&line) {
                Some(command) => {
                    if command_tx.send(command).await.is_err() {
                        break;
                    }
                }
                None if line.trim().is_empty() => {}
                None => println!("Commands: home / init / quit"),
            }
        }
    });

    let tick_period = Duration::from_secs_f64(1.0 / config.tick_hz);
    let wait_log_period = Duration::from_secs_f64(config.wait_log_interval_secs);

    let SimBackend {
        provider,
        arm,
        planner,
        executor,
    } = backend;
    let mut controller =
        RunController::new(config, provider, arm, planner, executor, shutdown.clone());
    let mut stop = shutdown.clone();

    // Nothing moves until the simulation is publishing scene state
    let mut wait_log = tokio::time::interval(wait_log_period);
    while !controller.has_scene() {
        tokio::select! {
            _ = stop.requested() => return Err(ReachError::Cancelled),
            snapshot = scene_rx.recv() => match snapshot {
                Some(snapshot) => controller.on_scene_update(snapshot),
                None => return Err(ReachError::Scene("scene feed closed".into())),
            },
            _ = wait_log.tick() => tracing::info!("waiting for scene state"),
        }
    }
    controller.start()?;

    let mut ticker = tokio::time::interval(tick_period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let result = loop {
        tokio::select! {
            _ = stop.requested() => break Err(ReachError::Cancelled),
            Some(snapshot) = scene_rx.recv() => controller.on_scene_update(snapshot),
            Some(command) = command_rx.recv() => {
                let moved = match command {
                    ManualCommand::Home => controller.go_to_home(),
                    ManualCommand::Init => controller.go_to_init(),
                    ManualCommand::Quit => break Err(ReachError::Cancelled),
                };
                if let Err(e) = moved {
                    break Err(e);
                }
            }
            _ = ticker.tick() => match controller.run() {
                Ok(TickOutcome::Completed) => break Ok(()),
                Ok(_) => {}
                Err(e) => break Err(e),
            },
        }
    };

    shutdown.request();
    if let Err(e) = feed.await {
        tracing::warn!(error = %e, "scene feed task failed");
    }
    tracing::info!(
        state = ?controller.state(),
        session = %controller.session().id(),
        "controller stopped"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_manual_commands() {
        assert_eq!(ManualCommand::parse("home\n"), Some(ManualCommand::Home));
        assert_eq!(ManualCommand::parse(" q "), Some(ManualCommand::Quit));
        assert_eq!(ManualCommand::parse("init"), Some(ManualCommand::Init));
        assert_eq!(ManualCommand::parse("dance"), None);
    }
}

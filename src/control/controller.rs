//! Run controller - the reach-and-grasp state machine
//!
//! One `run()` call is one tick:
//! snapshot -> aggregate geometry -> resolve target -> plan -> convert -> execute
//!
//! Ticks without a scene, or after the session has finished, are no-ops.
//! A tick whose plan comes back invalid ends without changing state, so the
//! next tick replans against fresh scene data. Everything fatal is returned
//! as an error for the caller to act on.

use crate::control::markers::{LogMarkers, MarkerSink};
use crate::control::posture::{Posture, PostureManager};
use crate::control::session::{RunSession, RunState};
use crate::core::config::ControllerConfig;
use crate::core::error::{ReachError, Result};
use crate::core::shutdown::Shutdown;
use crate::kinematics::ManipulatorModel;
use crate::motion::audit::save_path;
use crate::motion::executor::{dispatch_sequential, TrajectoryExecutor};
use crate::motion::planner::{MotionPlanner, PlanOutcome, PlanRequest};
use crate::motion::trajectory::{gripper_close_trajectory, PathToTrajectory};
use crate::scene::geometry::{GeometryIndex, GeometryProvider};
use crate::scene::snapshot::{SceneCache, SceneSnapshot};
use crate::scene::target::TargetResolver;

/// Why a tick did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleReason {
    /// No (non-empty) scene snapshot has been received yet
    NoScene,
    /// The target has already been reached this session
    AlreadySolved,
    /// A fatal error ended the session earlier
    Aborted,
}

/// Non-fatal result of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Idle(IdleReason),
    /// The planner found no valid path; retried next tick
    NoPlan,
    /// Trajectories executed and the arm returned to init; the caller
    /// should shut the process down
    Completed,
}

pub struct RunController<G, M, P, E> {
    config: ControllerConfig,
    provider: G,
    model: M,
    planner: P,
    executor: E,
    markers: Box<dyn MarkerSink>,
    scene: SceneCache,
    session: RunSession,
    shutdown: Shutdown,
}

impl<G, M, P, E> RunController<G, M, P, E>
where
    G: GeometryProvider,
    M: ManipulatorModel,
    P: MotionPlanner,
    E: TrajectoryExecutor,
{
    pub fn new(
        config: ControllerConfig,
        provider: G,
        model: M,
        planner: P,
        executor: E,
        shutdown: Shutdown,
    ) -> Self {
        let session = RunSession::new(config.target.clone());
        Self {
            config,
            provider,
            model,
            planner,
            executor,
            markers: Box::new(LogMarkers),
            scene: SceneCache::new(),
            session,
            shutdown,
        }
    }

    pub fn with_markers(mut self, markers: Box<dyn MarkerSink>) -> Self {
        self.markers = markers;
        self
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn session(&self) -> &RunSession {
        &self.session
    }

    pub fn state(&self) -> RunState {
        self.session.state()
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn planner(&self) -> &P {
        &self.planner
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Scene-state feed callback: replace the cached snapshot wholesale
    pub fn on_scene_update(&mut self, snapshot: SceneSnapshot) {
        self.scene.replace(snapshot);
    }

    pub fn has_scene(&self) -> bool {
        self.scene.has_received()
    }

    /// Wait for the execution servers, then move to the init posture
    pub fn start(&mut self) -> Result<()> {
        self.executor.wait_for_server()?;
        tracing::info!(manipulator = self.model.name(), "all servers up");
        self.go_to_init()
    }

    pub fn go_to_home(&mut self) -> Result<()> {
        self.go_to(Posture::Home)
    }

    pub fn go_to_init(&mut self) -> Result<()> {
        self.go_to(Posture::Init)
    }

    fn go_to(&mut self, posture: Posture) -> Result<()> {
        let manager = PostureManager::new(
            &self.config.posture,
            &self.config.gripper,
            self.config.timing.effort_ceiling,
        );
        manager.go_to(&self.model, &mut self.executor, posture, self.session.is_solved())
    }

    /// Advance the session by one tick
    pub fn run(&mut self) -> Result<TickOutcome> {
        if self.shutdown.is_requested() {
            tracing::debug!("shutdown requested; tick skipped");
            return Err(ReachError::Cancelled);
        }

        match self.session.state() {
            RunState::Done => {
                tracing::trace!(object = self.session.target(), "target already reached");
                return Ok(TickOutcome::Idle(IdleReason::AlreadySolved));
            }
            RunState::Aborted => {
                tracing::trace!(session = %self.session.id(), "session aborted earlier");
                return Ok(TickOutcome::Idle(IdleReason::Aborted));
            }
            _ => {}
        }

        // Hold this tick's snapshot; later feed updates do not affect it
        let scene = match self.scene.current() {
            Some(scene) if !scene.is_empty() => scene,
            _ => {
                tracing::debug!("no scene snapshot yet");
                return Ok(TickOutcome::Idle(IdleReason::NoScene));
            }
        };

        self.session.transition(RunState::Planning);
        self.markers.clear();

        let geometries = GeometryIndex::new(&self.provider).aggregate(&scene, &self.model);
        let goal = match TargetResolver::resolve(&geometries, self.session.target()) {
            Ok(goal) => goal,
            Err(e) => {
                tracing::error!(
                    object = self.session.target(),
                    geometries = geometries.len(),
                    "{}",
                    e
                );
                self.session.record_geometries(geometries);
                self.session.transition(RunState::Aborted);
                return Err(e);
            }
        };
        self.session.record_geometries(geometries);

        let frame = self.model.base_frame();
        self.markers.mark_goal(&frame, goal);

        let start = self.model.solve_fk();
        let request = PlanRequest {
            start,
            goal,
            target: self.session.target(),
            manipulator: self.model.name(),
            obstacles: self.session.last_geometries(),
        };

        let outcome = self.planner.plan(&request);
        if let PlanOutcome::NotFound(reason) = &outcome {
            tracing::warn!(%reason, "no path found");
        }
        let Some(path) = outcome.valid_path() else {
            tracing::warn!("no usable path; retrying next tick");
            self.session.transition(RunState::Idle);
            return Ok(TickOutcome::NoPlan);
        };

        if let Some(dir) = &self.config.path_log_dir {
            if let Err(e) = save_path(dir, self.session.target(), self.session.id(), &path) {
                tracing::warn!(error = %e, "could not save planned path");
            }
        }
        self.markers.mark_path(&frame, &path);

        tracing::info!(waypoints = path.len(), "obtaining joint angles");
        let converter = PathToTrajectory::new(&self.config.timing);
        let arm = match converter.convert(&path, &self.model, &self.shutdown) {
            Ok(arm) => arm,
            Err(e) => {
                if e.is_fatal() {
                    tracing::error!("{}", e);
                    self.session.transition(RunState::Aborted);
                } else {
                    self.session.transition(RunState::Idle);
                }
                return Err(e);
            }
        };
        let gripper = gripper_close_trajectory(&self.model, &self.config.gripper);

        self.session.transition(RunState::Executing);
        if let Err(e) = dispatch_sequential(&mut self.executor, &arm, &gripper) {
            tracing::error!("{}", e);
            self.session.transition(RunState::Aborted);
            return Err(e);
        }

        self.session.transition(RunState::Done);
        tracing::info!(
            object = self.session.target(),
            session = %self.session.id(),
            "target reached"
        );

        self.go_to_init()?;
        Ok(TickOutcome::Completed)
    }
}

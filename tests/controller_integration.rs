//! Run controller integration tests
//!
//! Drives the state machine through scripted collaborators: a map-backed
//! geometry provider, a counting arm model, a scripted planner and a
//! recording executor.

use std::cell::Cell;
use std::collections::VecDeque;

use ahash::AHashMap;

use reach_grasp::control::{IdleReason, NoMarkers, RunController, RunState, TickOutcome};
use reach_grasp::core::error::{ReachError, Result};
use reach_grasp::core::types::{CollisionGeometry, JointTrajectory, Path, Pose, Quaternion, Vec3};
use reach_grasp::core::{ControllerConfig, Shutdown};
use reach_grasp::kinematics::ManipulatorModel;
use reach_grasp::motion::{
    ControllerGroup, ExecutionOutcome, MotionPlanner, PlanOutcome, PlanRequest, TrajectoryExecutor,
};
use reach_grasp::scene::{
    GeometryIndex, GeometryProvider, GeometryResponse, SceneSnapshot, TargetResolver,
};

// ============================================================================
// Collaborators
// ============================================================================

#[derive(Default)]
struct MapProvider {
    entities: AHashMap<String, Vec<CollisionGeometry>>,
}

impl MapProvider {
    fn with(mut self, entity: &str, boxes: Vec<CollisionGeometry>) -> Self {
        self.entities.insert(entity.to_string(), boxes);
        self
    }

    /// Table, can and the three arm links of `TestArm`
    fn kitchen() -> Self {
        let mut provider = MapProvider::default()
            .with(
                "table",
                vec![CollisionGeometry::from_bounds(
                    "table_top",
                    Vec3::ZERO,
                    Vec3::new(1.0, 1.0, 0.4),
                )],
            )
            .with(
                "coke_can",
                vec![CollisionGeometry::from_bounds(
                    "coke_can_collision",
                    Vec3::new(0.5, 0.0, 0.4),
                    Vec3::new(0.6, 0.1, 0.52),
                )],
            );
        for i in 1..=3 {
            let z = i as f64 * 0.2;
            let link = format!("arm_link_{}", i);
            let geometry = CollisionGeometry::from_bounds(
                &link,
                Vec3::new(-0.05, -0.05, z - 0.2),
                Vec3::new(0.05, 0.05, z),
            )
            .with_pose(Pose::from_position(Vec3::new(0.0, 0.0, z - 0.1)));
            provider = provider.with(&link, vec![geometry]);
        }
        provider
    }
}

impl GeometryProvider for MapProvider {
    fn query(&self, entity_name: &str) -> Result<GeometryResponse> {
        let Some(boxes) = self.entities.get(entity_name) else {
            return Ok(GeometryResponse::failure("model does not exist"));
        };
        let mut response = GeometryResponse {
            success: true,
            ..GeometryResponse::default()
        };
        for geometry in boxes {
            response.push(geometry);
        }
        Ok(response)
    }
}

/// Three-joint arm without fingers; IK maps a position straight to angles
struct TestArm {
    ik_calls: Cell<usize>,
    fail_on_call: Option<usize>,
    joints: Vec<String>,
    init: Vec<f64>,
}

impl TestArm {
    fn new() -> Self {
        Self {
            ik_calls: Cell::new(0),
            fail_on_call: None,
            joints: vec!["arm_joint_1".into(), "arm_joint_2".into(), "arm_joint_3".into()],
            init: vec![0.0, 0.3, 1.2],
        }
    }

    fn failing_on_call(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }
}

impl ManipulatorModel for TestArm {
    fn name(&self) -> &str {
        "arm"
    }

    fn joint_names(&self) -> &[String] {
        &self.joints
    }

    fn finger_names(&self) -> &[String] {
        &[]
    }

    fn home_pose(&self) -> &[f64] {
        &[0.0, 0.0, 0.0]
    }

    fn init_pose(&self) -> &[f64] {
        &self.init
    }

    fn solve_fk(&self) -> Pose {
        Pose::from_position(Vec3::new(0.2, 0.0, 0.8))
    }

    fn solve_ik(
        &self,
        position: Vec3,
        _orientation: Quaternion,
        _seed: &[f64],
    ) -> Option<Vec<f64>> {
        let call = self.ik_calls.get();
        self.ik_calls.set(call + 1);
        if self.fail_on_call == Some(call) {
            return None;
        }
        Some(position.to_array().to_vec())
    }
}

/// Answers from a script; once the script runs out, a straight
/// `waypoints`-point line from start to goal
struct ScriptedPlanner {
    script: VecDeque<PlanOutcome>,
    waypoints: usize,
    goals: Vec<Vec3>,
    obstacle_counts: Vec<usize>,
}

impl ScriptedPlanner {
    fn straight(waypoints: usize) -> Self {
        Self {
            script: VecDeque::new(),
            waypoints,
            goals: Vec::new(),
            obstacle_counts: Vec::new(),
        }
    }

    fn then(mut self, outcome: PlanOutcome) -> Self {
        self.script.push_back(outcome);
        self
    }

    fn calls(&self) -> usize {
        self.goals.len()
    }
}

impl MotionPlanner for ScriptedPlanner {
    fn plan(&mut self, request: &PlanRequest<'_>) -> PlanOutcome {
        self.goals.push(request.goal);
        self.obstacle_counts.push(request.obstacles.len());
        if let Some(outcome) = self.script.pop_front() {
            return outcome;
        }
        let n = self.waypoints.max(2);
        let from = request.start.position;
        let waypoints = (0..n)
            .map(|i| {
                let t = i as f64 / (n - 1) as f64;
                Pose::new(from.lerp(request.goal, t), request.start.orientation)
            })
            .collect();
        PlanOutcome::Found(Path::new(waypoints))
    }
}

#[derive(Default)]
struct RecordingExecutor {
    sent: Vec<(ControllerGroup, JointTrajectory)>,
    fail_group: Option<ControllerGroup>,
}

impl TrajectoryExecutor for RecordingExecutor {
    fn execute(
        &mut self,
        group: ControllerGroup,
        trajectory: &JointTrajectory,
    ) -> ExecutionOutcome {
        self.sent.push((group, trajectory.clone()));
        if self.fail_group == Some(group) {
            return ExecutionOutcome::Failed("aborted by controller".into());
        }
        ExecutionOutcome::Succeeded
    }
}

type TestController = RunController<MapProvider, TestArm, ScriptedPlanner, RecordingExecutor>;

fn controller(provider: MapProvider, arm: TestArm, planner: ScriptedPlanner) -> TestController {
    RunController::new(
        ControllerConfig::default(),
        provider,
        arm,
        planner,
        RecordingExecutor::default(),
        Shutdown::new(),
    )
    .with_markers(Box::new(NoMarkers))
}

fn kitchen_snapshot() -> SceneSnapshot {
    ["table", "coke_can", "arm"].into_iter().collect()
}

fn can_centre() -> Vec3 {
    Vec3::new(0.55, 0.05, 0.46)
}

// ============================================================================
// Scenario A: target resolves to the centre of its geometry
// ============================================================================

#[test]
fn test_scenario_a_target_resolves_to_can_centre() {
    let provider = MapProvider::kitchen();
    let arm = TestArm::new();
    let snapshot: SceneSnapshot = ["table", "coke_can", "arm_link_1"].into_iter().collect();

    let geometries = GeometryIndex::new(&provider).aggregate(&snapshot, &arm);
    // table, can, then the three links; the snapshot's own link entry is skipped
    let names: Vec<&str> = geometries.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["table_top", "coke_can_collision", "arm_link_1", "arm_link_2", "arm_link_3"]
    );

    let goal = TargetResolver::resolve(&geometries, "coke_can").unwrap();
    assert!(goal.abs_diff_eq(can_centre(), 1e-12));
}

#[test]
fn test_scenario_a_planner_receives_can_centre() {
    let mut ctrl = controller(MapProvider::kitchen(), TestArm::new(), ScriptedPlanner::straight(4));
    ctrl.on_scene_update(kitchen_snapshot());

    assert_eq!(ctrl.run().unwrap(), TickOutcome::Completed);
    assert_eq!(ctrl.planner().goals.len(), 1);
    assert!(ctrl.planner().goals[0].abs_diff_eq(can_centre(), 1e-12));
    assert_eq!(ctrl.planner().obstacle_counts, vec![5]);
    assert_eq!(ctrl.session().last_geometries().len(), 5);
}

// ============================================================================
// Scenario B: nothing in the scene answers
// ============================================================================

#[test]
fn test_scenario_b_missing_geometry_is_fatal() {
    let mut ctrl = controller(MapProvider::default(), TestArm::new(), ScriptedPlanner::straight(4));
    ctrl.on_scene_update(kitchen_snapshot());

    let err = ctrl.run().unwrap_err();
    assert!(matches!(err, ReachError::TargetNotFound(ref t) if t == "coke_can"));
    assert!(err.is_fatal());
    assert_eq!(ctrl.state(), RunState::Aborted);
    assert_eq!(ctrl.planner().calls(), 0);
    assert!(ctrl.executor().sent.is_empty());

    // The session stays finished
    assert_eq!(ctrl.run().unwrap(), TickOutcome::Idle(IdleReason::Aborted));
    assert_eq!(ctrl.planner().calls(), 0);
}

#[test]
fn test_scenario_b_only_links_remain() {
    let provider = MapProvider::kitchen();
    let mut only_links = MapProvider::default();
    for i in 1..=3 {
        let link = format!("arm_link_{}", i);
        only_links.entities.insert(link.clone(), provider.entities[&link].clone());
    }

    let geometries =
        GeometryIndex::new(&only_links).aggregate(&kitchen_snapshot(), &TestArm::new());
    assert_eq!(geometries.len(), 3);
    assert!(geometries.iter().all(|g| g.name.starts_with("arm_link_")));
    assert!(TargetResolver::resolve(&geometries, "coke_can").is_err());
}

// ============================================================================
// Scenario C: an invalid plan is retried on the next tick
// ============================================================================

#[test]
fn test_scenario_c_invalid_plan_then_success() {
    let planner = ScriptedPlanner::straight(4)
        .then(PlanOutcome::Found(Path::new(vec![Pose::default()])))
        .then(PlanOutcome::NotFound("start in collision".into()));
    let mut ctrl = controller(MapProvider::kitchen(), TestArm::new(), planner);
    ctrl.on_scene_update(kitchen_snapshot());

    assert_eq!(ctrl.run().unwrap(), TickOutcome::NoPlan);
    assert_eq!(ctrl.state(), RunState::Idle);
    assert!(ctrl.executor().sent.is_empty());

    assert_eq!(ctrl.run().unwrap(), TickOutcome::NoPlan);
    assert_eq!(ctrl.state(), RunState::Idle);
    assert!(ctrl.executor().sent.is_empty());

    assert_eq!(ctrl.run().unwrap(), TickOutcome::Completed);
    assert_eq!(ctrl.planner().calls(), 3);

    let (group, arm) = &ctrl.executor().sent[0];
    assert_eq!(*group, ControllerGroup::Arm);
    assert_eq!(arm.points.len(), 3);
    let last = arm.final_positions().unwrap();
    assert!(Vec3::from_slice(last).abs_diff_eq(can_centre(), 1e-12));
}

// ============================================================================
// Scenario D: IK failure discards the whole trajectory
// ============================================================================

#[test]
fn test_scenario_d_ik_failure_dispatches_nothing() {
    // Six waypoints: the start plus five to solve; the third solve fails
    let mut ctrl = controller(
        MapProvider::kitchen(),
        TestArm::new().failing_on_call(2),
        ScriptedPlanner::straight(6),
    );
    ctrl.on_scene_update(kitchen_snapshot());

    let err = ctrl.run().unwrap_err();
    assert!(matches!(err, ReachError::IkFailure { waypoint: 2, of: 5 }));
    assert_eq!(ctrl.model().ik_calls.get(), 3);
    assert!(ctrl.executor().sent.is_empty());
    assert_eq!(ctrl.state(), RunState::Aborted);
}

// ============================================================================
// Execution and idempotence
// ============================================================================

#[test]
fn test_successful_run_dispatches_reach_then_init() {
    let mut ctrl = controller(MapProvider::kitchen(), TestArm::new(), ScriptedPlanner::straight(4));
    ctrl.on_scene_update(kitchen_snapshot());
    assert_eq!(ctrl.run().unwrap(), TickOutcome::Completed);

    let sent = &ctrl.executor().sent;
    let groups: Vec<ControllerGroup> = sent.iter().map(|(g, _)| *g).collect();
    assert_eq!(
        groups,
        vec![
            ControllerGroup::Arm,
            ControllerGroup::Gripper,
            ControllerGroup::Arm,
            ControllerGroup::Gripper,
        ]
    );

    // Reach: one point per retained waypoint at 5, 7, 9 s
    let times: Vec<f64> = sent[0]
        .1
        .points
        .iter()
        .map(|p| p.time_from_start.as_secs_f64())
        .collect();
    assert_eq!(times, vec![5.0, 7.0, 9.0]);
    assert!(sent[0].1.points.iter().all(|p| p.effort == vec![1000.0; 3]));

    // Back at init with the hand left closed
    assert_eq!(sent[2].1.final_positions().unwrap(), &[0.0, 0.3, 1.2]);
    assert!(ctrl.session().is_solved());
}

#[test]
fn test_solved_session_makes_no_further_calls() {
    let mut ctrl = controller(MapProvider::kitchen(), TestArm::new(), ScriptedPlanner::straight(4));
    ctrl.on_scene_update(kitchen_snapshot());
    ctrl.run().unwrap();

    let planned = ctrl.planner().calls();
    let dispatched = ctrl.executor().sent.len();
    let solved = ctrl.model().ik_calls.get();

    for _ in 0..5 {
        ctrl.on_scene_update(kitchen_snapshot());
        assert_eq!(ctrl.run().unwrap(), TickOutcome::Idle(IdleReason::AlreadySolved));
    }
    assert_eq!(ctrl.planner().calls(), planned);
    assert_eq!(ctrl.executor().sent.len(), dispatched);
    assert_eq!(ctrl.model().ik_calls.get(), solved);
}

#[test]
fn test_arm_failure_skips_gripper() {
    let mut ctrl = RunController::new(
        ControllerConfig::default(),
        MapProvider::kitchen(),
        TestArm::new(),
        ScriptedPlanner::straight(4),
        RecordingExecutor {
            sent: Vec::new(),
            fail_group: Some(ControllerGroup::Arm),
        },
        Shutdown::new(),
    )
    .with_markers(Box::new(NoMarkers));
    ctrl.on_scene_update(kitchen_snapshot());

    let err = ctrl.run().unwrap_err();
    assert!(matches!(err, ReachError::Execution { group: ControllerGroup::Arm, .. }));
    assert_eq!(ctrl.executor().sent.len(), 1);
    assert_eq!(ctrl.state(), RunState::Aborted);
}

#[test]
fn test_manual_home_after_done() {
    let mut ctrl = controller(MapProvider::kitchen(), TestArm::new(), ScriptedPlanner::straight(3));
    ctrl.on_scene_update(kitchen_snapshot());
    ctrl.run().unwrap();

    ctrl.go_to_home().unwrap();
    let (group, arm) = &ctrl.executor().sent[ctrl.executor().sent.len() - 2];
    assert_eq!(*group, ControllerGroup::Arm);
    assert_eq!(arm.final_positions().unwrap(), &[0.0, 0.0, 0.0]);
    assert_eq!(arm.points[0].time_from_start.as_secs_f64(), 5.0);
}

#[test]
fn test_path_audit_written_when_configured() {
    let dir = tempfile::tempdir().unwrap();
    let config = ControllerConfig {
        path_log_dir: Some(dir.path().to_path_buf()),
        ..ControllerConfig::default()
    };
    let mut ctrl = RunController::new(
        config,
        MapProvider::kitchen(),
        TestArm::new(),
        ScriptedPlanner::straight(4),
        RecordingExecutor::default(),
        Shutdown::new(),
    )
    .with_markers(Box::new(NoMarkers));
    ctrl.on_scene_update(kitchen_snapshot());
    ctrl.run().unwrap();

    let expected = dir.path().join(format!("coke_can_{}.json", ctrl.session().id()));
    let record = reach_grasp::motion::audit::load_path(&expected).unwrap();
    assert_eq!(record.target, "coke_can");
    assert_eq!(record.session, ctrl.session().id());
    assert_eq!(record.waypoints.len(), 4);
}

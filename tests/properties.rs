//! Property-based tests for geometry aggregation, target lookup and
//! trajectory conversion.

use proptest::prelude::*;

use reach_grasp::core::config::TrajectoryTiming;
use reach_grasp::core::error::Result;
use reach_grasp::core::types::{CollisionGeometry, Path, Pose, Quaternion, Vec3};
use reach_grasp::core::Shutdown;
use reach_grasp::kinematics::ManipulatorModel;
use reach_grasp::motion::PathToTrajectory;
use reach_grasp::scene::{
    GeometryIndex, GeometryProvider, GeometryResponse, SceneSnapshot, TargetResolver,
};

// =============================================================================
// Fixtures
// =============================================================================

/// Answers every query with the same raw response
struct RawProvider(GeometryResponse);

impl GeometryProvider for RawProvider {
    fn query(&self, _entity_name: &str) -> Result<GeometryResponse> {
        Ok(self.0.clone())
    }
}

/// Two-joint arm whose IK always succeeds
struct PlainArm {
    joints: Vec<String>,
    fingers: Vec<String>,
}

impl PlainArm {
    fn new() -> Self {
        Self {
            joints: vec!["plain_joint_1".into(), "plain_joint_2".into()],
            fingers: Vec::new(),
        }
    }
}

impl ManipulatorModel for PlainArm {
    fn name(&self) -> &str {
        "plain"
    }

    fn joint_names(&self) -> &[String] {
        &self.joints
    }

    fn finger_names(&self) -> &[String] {
        &self.fingers
    }

    fn home_pose(&self) -> &[f64] {
        &[0.0, 0.0]
    }

    fn init_pose(&self) -> &[f64] {
        &[0.1, 0.2]
    }

    fn solve_fk(&self) -> Pose {
        Pose::default()
    }

    fn solve_ik(&self, position: Vec3, _orientation: Quaternion, seed: &[f64]) -> Option<Vec<f64>> {
        Some(vec![seed[0] + position.x, seed[1] + position.y])
    }
}

// =============================================================================
// Strategies
// =============================================================================

fn arb_vec3() -> impl Strategy<Value = Vec3> {
    prop::array::uniform3(-100.0..100.0f64).prop_map(Vec3::from_array)
}

/// Raw response entries with arbitrary corners, centres and dimensions
fn arb_response() -> impl Strategy<Value = GeometryResponse> {
    let entry = (arb_vec3(), arb_vec3(), arb_vec3(), arb_vec3());
    prop::collection::vec(entry, 0..12).prop_map(|entries| {
        let mut response = GeometryResponse {
            success: true,
            ..GeometryResponse::default()
        };
        for (i, (min, max, centre, dimensions)) in entries.into_iter().enumerate() {
            response.names.push(format!("box_{}", i));
            response.min_bounds.push(min);
            response.max_bounds.push(max);
            response.centre.push(centre);
            response.dimensions.push(dimensions);
        }
        response
    })
}

fn arb_path(min_len: usize, max_len: usize) -> impl Strategy<Value = Path> {
    prop::collection::vec(arb_vec3(), min_len..=max_len)
        .prop_map(|points| Path::new(points.into_iter().map(Pose::from_position).collect()))
}

fn arb_timing() -> impl Strategy<Value = TrajectoryTiming> {
    (0.0..20.0f64, 1.0..10.0f64).prop_map(|(base_offset_secs, step_secs)| TrajectoryTiming {
        base_offset_secs,
        step_secs,
        ..TrajectoryTiming::default()
    })
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn aggregated_boxes_are_consistent(response in arb_response()) {
        let snapshot: SceneSnapshot = ["crate", "shelf"].into_iter().collect();
        let provider = RawProvider(response);
        let geometries = GeometryIndex::new(&provider).aggregate(&snapshot, &PlainArm::new());

        for geometry in &geometries {
            prop_assert!(geometry.min.cmple(geometry.max).all());
            prop_assert!((geometry.max - geometry.min).abs_diff_eq(geometry.dimensions, 1e-6));
        }
    }

    #[test]
    fn resolver_returns_first_match(
        names in prop::collection::vec(
            prop::sample::select(vec!["table", "can", "can_lid", "arm_link_1", "beer"]),
            0..10,
        ),
        target in prop::sample::select(vec!["can", "beer", "table", "bottle"]),
    ) {
        let geometries: Vec<CollisionGeometry> = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let corner = Vec3::splat(i as f64);
                CollisionGeometry::from_bounds(*name, corner, corner + Vec3::ONE)
            })
            .collect();

        let expected = names.iter().position(|n| n.contains(target));
        let found = TargetResolver::find(&geometries, target);
        prop_assert_eq!(found, expected);
        // Same input, same answer
        prop_assert_eq!(TargetResolver::find(&geometries, target), found);

        match TargetResolver::resolve(&geometries, target) {
            Ok(goal) => {
                let i = expected.unwrap() as f64;
                prop_assert_eq!(goal, Vec3::splat(i + 0.5));
            }
            Err(_) => prop_assert!(expected.is_none()),
        }
    }

    #[test]
    fn trajectory_drops_start_waypoint(path in arb_path(1, 30), timing in arb_timing()) {
        let arm = PlainArm::new();
        let trajectory = PathToTrajectory::new(&timing)
            .convert(&path, &arm, &Shutdown::new())
            .unwrap();

        prop_assert_eq!(trajectory.points.len(), path.len() - 1);
        prop_assert!(trajectory.is_well_formed());
    }

    #[test]
    fn trajectory_time_strictly_increases(path in arb_path(2, 30), timing in arb_timing()) {
        let arm = PlainArm::new();
        let trajectory = PathToTrajectory::new(&timing)
            .convert(&path, &arm, &Shutdown::new())
            .unwrap();

        prop_assert!(trajectory.has_increasing_time());
        let first = trajectory.points[0].time_from_start.as_secs_f64();
        prop_assert!((first - timing.base_offset_secs).abs() < 1e-6);
    }
}

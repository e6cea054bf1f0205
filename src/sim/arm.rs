//! Simulated serial manipulator
//!
//! A chain of revolute joints described by per-joint axis and offset.
//! Inverse kinematics is position-only damped least squares: the waypoint
//! orientation is accepted but not tracked.

use std::sync::{Arc, Mutex};

use glam::{DMat3, DQuat, DVec3};

use crate::core::types::{CollisionGeometry, Pose, Quaternion, Vec3};
use crate::kinematics::ManipulatorModel;
use crate::sim::scene_file::ArmSpec;

/// Joint positions shared between the arm model and the executor
pub type JointState = Arc<Mutex<Vec<f64>>>;

const IK_MAX_ITERATIONS: usize = 300;
const IK_TOLERANCE: f64 = 1e-4;
const IK_DAMPING: f64 = 0.05;
/// Largest joint change per iteration (radians)
const IK_MAX_STEP: f64 = 0.2;

const FINGER_SPREAD: f64 = 0.03;

#[derive(Debug, Clone)]
struct Joint {
    axis: DVec3,
    offset: DVec3,
}

/// World-frame joint origins and link rotations for one configuration
struct Chain {
    /// Joint origins followed by the end effector position
    points: Vec<DVec3>,
    /// World rotation axis of each joint
    axes: Vec<DVec3>,
    /// Link frame rotation after each joint
    rotations: Vec<DQuat>,
}

impl Chain {
    fn end_effector(&self) -> DVec3 {
        self.points[self.points.len() - 1]
    }

    fn tool_rotation(&self) -> DQuat {
        self.rotations.last().copied().unwrap_or(DQuat::IDENTITY)
    }
}

#[derive(Debug, Clone)]
pub struct SimArm {
    name: String,
    base: DVec3,
    joints: Vec<Joint>,
    tool_offset: DVec3,
    link_radius: f64,
    joint_names: Vec<String>,
    finger_names: Vec<String>,
    home: Vec<f64>,
    init: Vec<f64>,
    state: JointState,
}

impl SimArm {
    /// Build the arm resting at its home posture
    pub fn from_spec(spec: &ArmSpec) -> Self {
        let joints: Vec<Joint> = spec
            .joints
            .iter()
            .map(|j| Joint {
                axis: DVec3::from_array(j.axis).normalize_or_zero(),
                offset: DVec3::from_array(j.offset),
            })
            .collect();

        Self {
            name: spec.name.clone(),
            base: DVec3::from_array(spec.base),
            joint_names: (1..=joints.len()).map(|i| format!("{}_joint_{}", spec.name, i)).collect(),
            finger_names: (1..=spec.finger_count)
                .map(|i| format!("{}_joint_finger_{}", spec.name, i))
                .collect(),
            joints,
            tool_offset: DVec3::from_array(spec.tool_offset),
            link_radius: spec.link_radius,
            home: spec.home.clone(),
            init: spec.init.clone(),
            state: Arc::new(Mutex::new(spec.home.clone())),
        }
    }

    /// Handle on the live joint state, for the executor
    pub fn joint_state(&self) -> JointState {
        Arc::clone(&self.state)
    }

    pub fn current_joints(&self) -> Vec<f64> {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn chain(&self, q: &[f64]) -> Chain {
        let mut position = self.base;
        let mut rotation = DQuat::IDENTITY;
        let mut points = Vec::with_capacity(self.joints.len() + 1);
        let mut axes = Vec::with_capacity(self.joints.len());
        let mut rotations = Vec::with_capacity(self.joints.len());

        for (joint, angle) in self.joints.iter().zip(q.iter().copied()) {
            position += rotation * joint.offset;
            points.push(position);
            axes.push(rotation * joint.axis);
            rotation = rotation * DQuat::from_axis_angle(joint.axis, angle);
            rotations.push(rotation);
        }

        points.push(position + rotation * self.tool_offset);
        Chain {
            points,
            axes,
            rotations,
        }
    }

    /// End effector pose for joint positions `q`
    pub fn forward(&self, q: &[f64]) -> Pose {
        let chain = self.chain(q);
        Pose::new(chain.end_effector(), chain.tool_rotation())
    }

    /// Collision box of `link` (`<name>_link_<i>` or `<name>_link_finger_<i>`)
    /// at the current joint state
    pub fn link_geometry(&self, link: &str) -> Option<CollisionGeometry> {
        let suffix = link.strip_prefix(&self.name)?.strip_prefix("_link_")?;
        let chain = self.chain(&self.current_joints());

        if let Some(finger) = suffix.strip_prefix("finger_") {
            let index: usize = finger.parse().ok()?;
            if index == 0 || index > self.finger_names.len() {
                return None;
            }
            let angle =
                std::f64::consts::TAU * (index - 1) as f64 / self.finger_names.len() as f64;
            let rotation = chain.tool_rotation();
            let offset = rotation * DVec3::new(angle.cos(), angle.sin(), 0.0) * FINGER_SPREAD;
            let centre = chain.end_effector() + offset;
            let half = DVec3::splat(self.link_radius * 0.5);
            let geometry = CollisionGeometry::from_bounds(link, centre - half, centre + half);
            return Some(geometry.with_pose(Pose::new(centre, rotation)));
        }

        let index: usize = suffix.parse().ok()?;
        if index == 0 || index > self.joints.len() {
            return None;
        }
        let (from, to) = (chain.points[index - 1], chain.points[index]);
        let radius = DVec3::splat(self.link_radius);
        let geometry =
            CollisionGeometry::from_bounds(link, from.min(to) - radius, from.max(to) + radius);
        let pose = Pose::new((from + to) * 0.5, chain.rotations[index - 1]);
        Some(geometry.with_pose(pose))
    }

    fn solve_position(&self, target: DVec3, seed: &[f64]) -> Option<Vec<f64>> {
        if seed.len() != self.joints.len() || !target.is_finite() {
            return None;
        }
        let mut q = seed.to_vec();

        for _ in 0..IK_MAX_ITERATIONS {
            let chain = self.chain(&q);
            let error = target - chain.end_effector();
            if error.length() < IK_TOLERANCE {
                return Some(q);
            }

            // Analytic Jacobian columns for revolute joints
            let columns: Vec<DVec3> = chain
                .axes
                .iter()
                .zip(&chain.points)
                .map(|(axis, origin)| axis.cross(chain.end_effector() - *origin))
                .collect();

            let mut jjt = DMat3::from_diagonal(DVec3::splat(IK_DAMPING * IK_DAMPING));
            for c in &columns {
                jjt += DMat3::from_cols(*c * c.x, *c * c.y, *c * c.z);
            }
            let dx = jjt.inverse() * error;

            for (qi, c) in q.iter_mut().zip(&columns) {
                *qi += c.dot(dx).clamp(-IK_MAX_STEP, IK_MAX_STEP);
            }
        }

        let residual = (target - self.chain(&q).end_effector()).length();
        tracing::debug!(residual, "IK did not converge");
        None
    }
}

impl ManipulatorModel for SimArm {
    fn name(&self) -> &str {
        &self.name
    }

    fn joint_names(&self) -> &[String] {
        &self.joint_names
    }

    fn finger_names(&self) -> &[String] {
        &self.finger_names
    }

    fn home_pose(&self) -> &[f64] {
        &self.home
    }

    fn init_pose(&self) -> &[f64] {
        &self.init
    }

    fn solve_fk(&self) -> Pose {
        self.forward(&self.current_joints())
    }

    fn solve_ik(&self, position: Vec3, _orientation: Quaternion, seed: &[f64]) -> Option<Vec<f64>> {
        self.solve_position(position, seed)
    }
}

//! Core type definitions used throughout the codebase

use std::time::Duration;

use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};

/// 3D vector in the world frame (metres)
pub type Vec3 = DVec3;

/// Unit quaternion orientation
pub type Quaternion = DQuat;

/// Tolerance used when checking derived geometry fields
pub const GEOMETRY_EPSILON: f64 = 1e-9;

/// Position and orientation in the world frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quaternion,
}

impl Pose {
    pub fn new(position: Vec3, orientation: Quaternion) -> Self {
        Self { position, orientation }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self::new(position, Quaternion::IDENTITY)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::from_position(Vec3::ZERO)
    }
}

/// A single 6-DoF pose along a planned geometric path
pub type Waypoint = Pose;

/// Axis-aligned collision box of one named sub-geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionGeometry {
    pub name: String,
    pub min: Vec3,
    pub max: Vec3,
    pub centre: Vec3,
    pub dimensions: Vec3,
    /// World pose, only reported for the manipulator's own links
    pub pose: Option<Pose>,
}

impl CollisionGeometry {
    /// Build a box from its corners, deriving centre and dimensions
    ///
    /// Corners are reordered component-wise so `min <= max` always holds.
    pub fn from_bounds(name: impl Into<String>, a: Vec3, b: Vec3) -> Self {
        let min = a.min(b);
        let max = a.max(b);
        Self {
            name: name.into(),
            min,
            max,
            centre: (min + max) * 0.5,
            dimensions: max - min,
            pose: None,
        }
    }

    pub fn with_pose(mut self, pose: Pose) -> Self {
        self.pose = Some(pose);
        self
    }

    /// Check `min <= max` and `dimensions == max - min` within `tolerance`
    pub fn is_consistent(&self, tolerance: f64) -> bool {
        let ordered = self.min.cmple(self.max).all();
        let dims_match = (self.max - self.min).abs_diff_eq(self.dimensions, tolerance);
        ordered && dims_match
    }

    /// Copy of this box grown by `margin` on every side
    pub fn inflated(&self, margin: f64) -> Self {
        let grow = Vec3::splat(margin.max(0.0));
        let mut grown = Self::from_bounds(self.name.clone(), self.min - grow, self.max + grow);
        grown.pose = self.pose;
        grown
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Slab test for the segment `from -> to` against this box
    pub fn intersects_segment(&self, from: Vec3, to: Vec3) -> bool {
        let dir = to - from;
        let mut t_min = 0.0_f64;
        let mut t_max = 1.0_f64;

        for axis in 0..3 {
            let origin = from[axis];
            let d = dir[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);
            if d.abs() < GEOMETRY_EPSILON {
                if origin < lo || origin > hi {
                    return false;
                }
                continue;
            }
            let inv = 1.0 / d;
            let mut t0 = (lo - origin) * inv;
            let mut t1 = (hi - origin) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return false;
            }
        }
        true
    }
}

/// Ordered sequence of waypoints produced by one planning call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pub waypoints: Vec<Waypoint>,
}

impl Path {
    pub fn new(waypoints: Vec<Waypoint>) -> Self {
        Self { waypoints }
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// A usable path has a start plus at least one commanded waypoint,
    /// all with finite coordinates
    pub fn check(&self) -> bool {
        self.waypoints.len() >= 2
            && self
                .waypoints
                .iter()
                .all(|w| w.position.is_finite() && w.orientation.is_finite())
    }
}

/// One commanded point of a joint-space trajectory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub positions: Vec<f64>,
    pub effort: Vec<f64>,
    pub velocities: Vec<f64>,
    pub accelerations: Vec<f64>,
    pub time_from_start: Duration,
}

impl TrajectoryPoint {
    /// Position-commanded point: uniform effort, zero velocity and acceleration
    pub fn hold(positions: Vec<f64>, effort: f64, time_from_start: Duration) -> Self {
        let n = positions.len();
        Self {
            positions,
            effort: vec![effort; n],
            velocities: vec![0.0; n],
            accelerations: vec![0.0; n],
            time_from_start,
        }
    }
}

/// Joint-space trajectory addressed to one controller group
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JointTrajectory {
    pub joint_names: Vec<String>,
    pub points: Vec<TrajectoryPoint>,
}

impl JointTrajectory {
    pub fn new(joint_names: Vec<String>) -> Self {
        Self {
            joint_names,
            points: Vec::new(),
        }
    }

    /// Every array of every point has one entry per named joint
    pub fn is_well_formed(&self) -> bool {
        let n = self.joint_names.len();
        self.points.iter().all(|p| {
            p.positions.len() == n
                && p.effort.len() == n
                && p.velocities.len() == n
                && p.accelerations.len() == n
        })
    }

    pub fn has_increasing_time(&self) -> bool {
        self.points
            .windows(2)
            .all(|pair| pair[0].time_from_start < pair[1].time_from_start)
    }

    /// Positions of the last point, i.e. where the group comes to rest
    pub fn final_positions(&self) -> Option<&[f64]> {
        self.points.last().map(|p| p.positions.as_slice())
    }
}

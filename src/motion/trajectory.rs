//! Path to joint-space trajectory conversion
//!
//! The first waypoint is the start pose and is never commanded. Every
//! later waypoint is solved with IK seeded by the previous solution (the
//! init posture for the first one), so the conversion is a strict fold over
//! the path. One failed solve discards the whole trajectory.

use std::time::Duration;

use crate::core::config::{GripperConfig, TrajectoryTiming};
use crate::core::error::{ReachError, Result};
use crate::core::shutdown::Shutdown;
use crate::core::types::{JointTrajectory, Path, TrajectoryPoint};
use crate::kinematics::ManipulatorModel;

pub struct PathToTrajectory<'a> {
    timing: &'a TrajectoryTiming,
}

impl<'a> PathToTrajectory<'a> {
    pub fn new(timing: &'a TrajectoryTiming) -> Self {
        Self { timing }
    }

    /// Timestamp of the `index`-th commanded point
    pub fn time_from_start(&self, index: usize) -> Duration {
        Duration::from_secs_f64(self.timing.base_offset_secs + index as f64 * self.timing.step_secs)
    }

    /// Solve every retained waypoint and stamp the resulting points
    ///
    /// Checks `shutdown` before each solve and returns `Cancelled` if it
    /// has been requested.
    pub fn convert<M: ManipulatorModel + ?Sized>(
        &self,
        path: &Path,
        model: &M,
        shutdown: &Shutdown,
    ) -> Result<JointTrajectory> {
        let retained = &path.waypoints[path.waypoints.len().min(1)..];
        let mut trajectory = JointTrajectory::new(model.joint_names().to_vec());
        trajectory.points.reserve(retained.len());

        for (i, waypoint) in retained.iter().enumerate() {
            if shutdown.is_requested() {
                return Err(ReachError::Cancelled);
            }

            let seed = match trajectory.points.last() {
                Some(previous) => previous.positions.as_slice(),
                None => model.init_pose(),
            };

            let angles = model
                .solve_ik(waypoint.position, waypoint.orientation, seed)
                .ok_or(ReachError::IkFailure {
                    waypoint: i,
                    of: retained.len(),
                })?;

            if angles.len() != model.joint_count() {
                tracing::error!(
                    waypoint = i,
                    got = angles.len(),
                    expected = model.joint_count(),
                    "IK returned the wrong number of joints"
                );
                return Err(ReachError::IkFailure {
                    waypoint: i,
                    of: retained.len(),
                });
            }

            tracing::trace!(waypoint = i, ?angles, "IK solved");
            trajectory.points.push(TrajectoryPoint::hold(
                angles,
                self.timing.effort_ceiling,
                self.time_from_start(i),
            ));
        }

        Ok(trajectory)
    }
}

/// Single-point command closing every finger to `gripper.closed`
pub fn gripper_close_trajectory<M: ManipulatorModel + ?Sized>(
    model: &M,
    gripper: &GripperConfig,
) -> JointTrajectory {
    gripper_trajectory(model, gripper.closed, gripper.effort, gripper.close_time_secs)
}

/// Single-point gripper command at a fixed aperture
pub fn gripper_trajectory<M: ManipulatorModel + ?Sized>(
    model: &M,
    aperture: f64,
    effort: f64,
    time_secs: f64,
) -> JointTrajectory {
    let fingers = model.finger_names().to_vec();
    let positions = vec![aperture; fingers.len()];
    let mut trajectory = JointTrajectory::new(fingers);
    trajectory.points.push(TrajectoryPoint::hold(
        positions,
        effort,
        Duration::from_secs_f64(time_secs),
    ));
    trajectory
}

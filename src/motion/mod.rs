//! Planning, path-to-trajectory conversion and trajectory execution

pub mod audit;
pub mod executor;
pub mod planner;
pub mod trajectory;

pub use executor::{dispatch_sequential, ControllerGroup, ExecutionOutcome, TrajectoryExecutor};
pub use planner::{MotionPlanner, PlanOutcome, PlanRequest};
pub use trajectory::{gripper_close_trajectory, gripper_trajectory, PathToTrajectory};

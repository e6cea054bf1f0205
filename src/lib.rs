//! Reach Grasp - reach-and-grasp orchestration for a robotic manipulator
//!
//! Each tick reads the latest scene snapshot, aggregates collision geometry
//! for every entity and arm link, locates the target, plans a path, converts
//! it to a timed joint trajectory and executes arm then gripper.

pub mod control;
pub mod core;
pub mod kinematics;
pub mod motion;
pub mod scene;
pub mod sim;

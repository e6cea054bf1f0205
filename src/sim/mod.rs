//! In-process simulation backend
//!
//! Stands in for the physics simulator and the arm's trajectory controllers:
//! a TOML scene of static boxes plus one serial arm. The provider, the model
//! and the executor share the arm's joint state, so executed trajectories
//! move the links that later geometry queries report.

pub mod arm;
pub mod executor;
pub mod feed;
pub mod planner;
pub mod provider;
pub mod scene_file;

pub use arm::{JointState, SimArm};
pub use executor::SimExecutor;
pub use feed::spawn_scene_feed;
pub use planner::{PlannerConfig, SimPlanner};
pub use provider::{EntityQuery, GeometrySource, SimGeometryProvider, StaticModel};
pub use scene_file::SceneFile;

use crate::core::error::Result;

/// Every collaborator the run controller needs, built from one scene
pub struct SimBackend {
    pub provider: SimGeometryProvider,
    pub arm: SimArm,
    pub planner: SimPlanner,
    pub executor: SimExecutor,
}

impl SimBackend {
    pub fn from_scene(scene: &SceneFile, seed: u64) -> Result<Self> {
        scene.validate()?;

        let arm = SimArm::from_spec(&scene.manipulator);
        let mut provider = SimGeometryProvider::new();
        for model in &scene.models {
            provider.insert(model.name.clone(), Box::new(StaticModel::from_spec(model)));
        }
        provider.insert(scene.manipulator.name.clone(), Box::new(arm.clone()));

        tracing::info!(
            models = scene.models.len(),
            manipulator = %scene.manipulator.name,
            joints = scene.manipulator.joints.len(),
            "simulated scene loaded"
        );

        Ok(Self {
            executor: SimExecutor::new(scene.manipulator.name.clone(), arm.joint_state()),
            planner: SimPlanner::new(PlannerConfig::default(), seed),
            provider,
            arm,
        })
    }

    /// Names the scene feed publishes: every model, then the manipulator
    pub fn entity_names(&self) -> Vec<String> {
        self.provider.entity_names().to_vec()
    }
}

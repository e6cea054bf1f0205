//! TOML description of a simulated scene
//!
//! A scene is a list of static models with named collision boxes and a
//! single serial manipulator. See `data/scene.toml` for an example.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{ReachError, Result};

/// One named axis-aligned box, corners in world coordinates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoxSpec {
    pub name: String,
    pub min: [f64; 3],
    pub max: [f64; 3],
}

/// A static scene model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSpec {
    pub name: String,
    #[serde(default)]
    pub collisions: Vec<BoxSpec>,
}

/// One revolute joint of the simulated arm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JointSpec {
    /// Rotation axis in the parent link frame
    pub axis: [f64; 3],
    /// Translation from the previous joint, in the parent link frame
    pub offset: [f64; 3],
}

/// The simulated manipulator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArmSpec {
    pub name: String,
    #[serde(default)]
    pub base: [f64; 3],
    pub joints: Vec<JointSpec>,
    /// End effector offset from the last joint
    #[serde(default)]
    pub tool_offset: [f64; 3],
    /// Half-thickness of each link's collision box
    #[serde(default = "default_link_radius")]
    pub link_radius: f64,
    #[serde(default = "default_finger_count")]
    pub finger_count: usize,
    pub home: Vec<f64>,
    pub init: Vec<f64>,
}

fn default_link_radius() -> f64 {
    0.04
}

fn default_finger_count() -> usize {
    3
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneFile {
    #[serde(default)]
    pub models: Vec<ModelSpec>,
    pub manipulator: ArmSpec,
}

impl SceneFile {
    pub fn from_toml(text: &str) -> Result<Self> {
        let scene: SceneFile = toml::from_str(text)?;
        scene.validate()?;
        Ok(scene)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<()> {
        let arm = &self.manipulator;
        if arm.joints.is_empty() {
            return Err(ReachError::Scene(format!("manipulator [{}] has no joints", arm.name)));
        }
        for (label, pose) in [("home", &arm.home), ("init", &arm.init)] {
            if pose.len() != arm.joints.len() {
                return Err(ReachError::Scene(format!(
                    "{} pose has {} values for {} joints",
                    label,
                    pose.len(),
                    arm.joints.len()
                )));
            }
        }
        if arm.joints.iter().any(|j| j.axis == [0.0; 3]) {
            return Err(ReachError::Scene("joint axis must be non-zero".into()));
        }

        for model in &self.models {
            if model.name.contains(&arm.name) {
                return Err(ReachError::Scene(format!(
                    "model [{}] shadows the manipulator name",
                    model.name
                )));
            }
        }
        Ok(())
    }
}

//! Collision geometry aggregation
//!
//! Queries the geometry provider once per scene entity and once per
//! manipulator link, flattening the answers into one ordered list of
//! named boxes. The order matters: target resolution takes the first match.

use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::core::types::{CollisionGeometry, Pose, Vec3, GEOMETRY_EPSILON};
use crate::kinematics::ManipulatorModel;
use crate::scene::snapshot::SceneSnapshot;

/// Answer to a geometry query
///
/// The vectors are parallel: entry `j` of each describes the same
/// sub-geometry. `pose` may be shorter than `names` (or empty) for
/// entities that do not report poses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeometryResponse {
    pub names: Vec<String>,
    pub min_bounds: Vec<Vec3>,
    pub max_bounds: Vec<Vec3>,
    pub centre: Vec<Vec3>,
    pub dimensions: Vec<Vec3>,
    #[serde(default)]
    pub pose: Vec<Pose>,
    pub message: String,
    pub success: bool,
}

impl GeometryResponse {
    /// Failed response carrying only a diagnostic
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: false,
            ..Self::default()
        }
    }

    /// Append one sub-geometry, keeping the arrays parallel
    pub fn push(&mut self, geometry: &CollisionGeometry) {
        self.names.push(geometry.name.clone());
        self.min_bounds.push(geometry.min);
        self.max_bounds.push(geometry.max);
        self.centre.push(geometry.centre);
        self.dimensions.push(geometry.dimensions);
        if let Some(pose) = geometry.pose {
            self.pose.push(pose);
        }
    }

    /// Number of complete entries across the parallel arrays
    pub fn entry_count(&self) -> usize {
        self.names
            .len()
            .min(self.min_bounds.len())
            .min(self.max_bounds.len())
            .min(self.centre.len())
            .min(self.dimensions.len())
    }
}

/// Source of per-entity collision geometry
///
/// A transport-level failure is an `Err`; a provider that was reached but
/// knows nothing about the entity answers `success = false`. Aggregation
/// treats both as "no geometry for this name".
pub trait GeometryProvider {
    fn query(&self, entity_name: &str) -> Result<GeometryResponse>;
}

impl<P: GeometryProvider + ?Sized> GeometryProvider for &P {
    fn query(&self, entity_name: &str) -> Result<GeometryResponse> {
        (**self).query(entity_name)
    }
}

/// Canonical query names for the manipulator's arm and finger links
///
/// Arm links are `<name>_link_1..=<joints>`, fingers are
/// `<name>_link_finger_1..=<fingers>`.
pub fn link_query_names<M: ManipulatorModel + ?Sized>(model: &M) -> Vec<String> {
    let name = model.name();
    let joints = model.joint_count();
    let fingers = model.finger_names().len();

    (0..joints + fingers)
        .map(|i| {
            if i < joints {
                format!("{}_link_{}", name, i + 1)
            } else {
                format!("{}_link_finger_{}", name, i + 1 - joints)
            }
        })
        .collect()
}

/// Builds the flat obstacle/target list for one run tick
pub struct GeometryIndex<'a, P: GeometryProvider + ?Sized> {
    provider: &'a P,
}

impl<'a, P: GeometryProvider + ?Sized> GeometryIndex<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self { provider }
    }

    /// Aggregate scene-object boxes (in snapshot order) followed by
    /// manipulator link boxes (in link order)
    pub fn aggregate<M: ManipulatorModel + ?Sized>(
        &self,
        scene: &SceneSnapshot,
        model: &M,
    ) -> Vec<CollisionGeometry> {
        let manipulator = model.name();
        let mut geometries = Vec::new();

        for entity in scene.iter() {
            if entity.contains(manipulator) {
                continue;
            }
            self.collect(entity, false, &mut geometries);
        }

        let scene_count = geometries.len();
        for link in link_query_names(model) {
            self.collect(&link, true, &mut geometries);
        }

        tracing::debug!(
            scene_boxes = scene_count,
            link_boxes = geometries.len() - scene_count,
            "aggregated collision geometry"
        );
        geometries
    }

    fn collect(&self, entity: &str, with_pose: bool, out: &mut Vec<CollisionGeometry>) {
        let response = match self.provider.query(entity) {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(entity, error = %e, "geometry query failed");
                return;
            }
        };

        if !response.success {
            tracing::debug!(entity, message = %response.message, "no geometry for entity");
            return;
        }

        let count = response.entry_count();
        if count < response.names.len() {
            tracing::warn!(
                entity,
                names = response.names.len(),
                complete = count,
                "geometry response arrays are not parallel; truncating"
            );
        }

        for j in 0..count {
            let mut geometry = CollisionGeometry {
                name: response.names[j].clone(),
                min: response.min_bounds[j],
                max: response.max_bounds[j],
                centre: response.centre[j],
                dimensions: response.dimensions[j],
                pose: None,
            };

            if !geometry.is_consistent(GEOMETRY_EPSILON * 1e3) {
                tracing::warn!(
                    name = %geometry.name,
                    "inconsistent bounds; rebuilding from corners"
                );
                geometry =
                    CollisionGeometry::from_bounds(geometry.name, geometry.min, geometry.max);
            }

            if with_pose {
                geometry.pose = response.pose.get(j).copied();
            }
            out.push(geometry);
        }
    }
}

//! Target resolution over aggregated geometry
//!
//! Matching is by substring so provider-assigned suffixes such as
//! `coke_can_collision` still resolve to `coke_can`. The first match in
//! aggregation order wins.

use crate::core::error::{ReachError, Result};
use crate::core::types::{CollisionGeometry, Vec3};

pub struct TargetResolver;

impl TargetResolver {
    /// Index of the first geometry whose name contains `target`
    pub fn find(geometries: &[CollisionGeometry], target: &str) -> Option<usize> {
        geometries.iter().position(|g| g.name.contains(target))
    }

    /// Goal point for `target`: the centre of its first matching box
    pub fn resolve(geometries: &[CollisionGeometry], target: &str) -> Result<Vec3> {
        let idx = Self::find(geometries, target)
            .ok_or_else(|| ReachError::TargetNotFound(target.to_string()))?;
        let geometry = &geometries[idx];
        tracing::debug!(object = target, matched = %geometry.name, "resolved target geometry");
        Ok(geometry.centre)
    }
}

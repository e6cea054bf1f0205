//! Simulated geometry provider
//!
//! Requests are parsed into a typed query before any lookup: a name
//! containing `_link` asks for one link of its parent entity, anything else
//! asks for every collision box of the named model. Each entity kind answers
//! through its own `GeometrySource` implementation.

use ahash::AHashMap;

use crate::core::error::Result;
use crate::core::types::{CollisionGeometry, Vec3};
use crate::scene::geometry::{GeometryProvider, GeometryResponse};
use crate::sim::arm::SimArm;
use crate::sim::scene_file::ModelSpec;

/// A geometry request after name parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityQuery<'a> {
    /// Every collision box of a model
    Model(&'a str),
    /// A single link, addressed by its full name, of `parent`
    Link { parent: &'a str, link: &'a str },
}

impl<'a> EntityQuery<'a> {
    pub fn parse(request: &'a str) -> Self {
        match request.find("_link") {
            Some(pos) => EntityQuery::Link {
                parent: &request[..pos],
                link: request,
            },
            None => EntityQuery::Model(request),
        }
    }

    pub fn entity(&self) -> &'a str {
        match self {
            EntityQuery::Model(name) => name,
            EntityQuery::Link { parent, .. } => parent,
        }
    }
}

/// Typed sub-geometry capability of one scene entity
pub trait GeometrySource {
    /// Every collision box, named `<entity>_<collision>`
    fn collision_boxes(&self) -> Vec<CollisionGeometry>;

    /// The box of one link, carrying its pose
    fn link_box(&self, link: &str) -> Option<CollisionGeometry>;
}

/// A model whose boxes never move
#[derive(Debug, Clone)]
pub struct StaticModel {
    boxes: Vec<CollisionGeometry>,
}

impl StaticModel {
    pub fn from_spec(spec: &ModelSpec) -> Self {
        let boxes = spec
            .collisions
            .iter()
            .map(|b| {
                CollisionGeometry::from_bounds(
                    format!("{}_{}", spec.name, b.name),
                    Vec3::from_array(b.min),
                    Vec3::from_array(b.max),
                )
            })
            .collect();
        Self { boxes }
    }
}

impl GeometrySource for StaticModel {
    fn collision_boxes(&self) -> Vec<CollisionGeometry> {
        self.boxes.clone()
    }

    fn link_box(&self, link: &str) -> Option<CollisionGeometry> {
        self.boxes.iter().find(|b| b.name == link).cloned()
    }
}

impl GeometrySource for SimArm {
    fn collision_boxes(&self) -> Vec<CollisionGeometry> {
        crate::scene::geometry::link_query_names(self)
            .iter()
            .filter_map(|link| self.link_geometry(link))
            .collect()
    }

    fn link_box(&self, link: &str) -> Option<CollisionGeometry> {
        self.link_geometry(link)
    }
}

#[derive(Default)]
pub struct SimGeometryProvider {
    sources: AHashMap<String, Box<dyn GeometrySource>>,
    order: Vec<String>,
}

impl SimGeometryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, source: Box<dyn GeometrySource>) {
        let name = name.into();
        if self.sources.insert(name.clone(), source).is_none() {
            self.order.push(name);
        }
    }

    /// Entity names in insertion order, as the scene feed publishes them
    pub fn entity_names(&self) -> &[String] {
        &self.order
    }
}

impl GeometryProvider for SimGeometryProvider {
    fn query(&self, entity_name: &str) -> Result<GeometryResponse> {
        let query = EntityQuery::parse(entity_name);

        let Some(source) = self.sources.get(query.entity()) else {
            tracing::debug!(entity = query.entity(), "unable to find model");
            return Ok(GeometryResponse::failure("Error, model does not exist!"));
        };

        let geometries = match query {
            EntityQuery::Model(_) => source.collision_boxes(),
            EntityQuery::Link { link, .. } => source.link_box(link).into_iter().collect(),
        };

        let mut response = GeometryResponse {
            message: "Model found".into(),
            success: true,
            ..GeometryResponse::default()
        };
        for geometry in &geometries {
            response.push(geometry);
        }
        Ok(response)
    }
}

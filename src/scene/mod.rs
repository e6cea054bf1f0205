//! Scene state: entity snapshot, collision geometry and target lookup

pub mod geometry;
pub mod snapshot;
pub mod target;

pub use geometry::{link_query_names, GeometryIndex, GeometryProvider, GeometryResponse};
pub use snapshot::{SceneCache, SceneSnapshot};
pub use target::TargetResolver;

//! Engine data structures: models, textures and instances.
//!
//! - `model` contains mesh and material definitions, GPU resources for meshes
//! - `texture` contains the GPU texture wrapper and creation utilities
//! - `instance` holds per-instance transformation data for instanced draws

pub mod instance;
pub mod model;
pub mod texture;

//! astroscene
//!
//! A cross-platform (native and WASM) 3D space-scene demo built on wgpu.
//! A probe for a usable graphics adapter gates everything; after bootstrap
//! the scene holds a spinning cube, a blue accent polyline, a field of
//! fifteen thousand random specks, a handful of textured planets and five
//! point lights carrying procedural lens flares, all under an HDR panorama
//! that loads in the background.
//!
//! High-level modules
//! - `app`: window lifecycle, event bridge and the frame loop
//! - `camera`: camera, projection and the view/projection uniform
//! - `context`: central GPU context owning device/queue/pipelines
//! - `controls`: fly and orbit navigation with damping
//! - `data_structures`: meshes, instances and textures
//! - `environment`: async HDR panorama loading and installation
//! - `lighting`: the shared point-light uniform
//! - `pipelines`: render pipeline definitions (scene, line, sky, flare)
//! - `resources`: platform-spanning asset loading
//! - `scene`: scene population and per-frame animation
//! - `stats`: frame-rate readout

pub mod app;
pub mod camera;
pub mod context;
pub mod controls;
pub mod data_structures;
pub mod environment;
pub mod lighting;
pub mod pipelines;
pub mod resources;
pub mod scene;
pub mod stats;

pub use app::run;

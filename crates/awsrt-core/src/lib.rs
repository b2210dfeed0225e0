//! Core of the AWSRT backend: manifests, the toy spread model, belief maps,
//! the SQLite frame store, PNG rendering, and the run engine tying them
//! together.

pub mod api;
pub mod engine;
pub mod error;
pub mod ids;
pub mod manifest;
pub mod raster;
pub mod render;
pub mod sim;
pub mod store;

pub use engine::RunEngine;
pub use error::{CoreError, CoreResult};
pub use manifest::{
    EnvironmentManifest, FireManifest, GridSpec, IgnitionCell, IgnitionKind, IgnitionSpec,
    RunConfig,
};
pub use raster::Raster;
pub use render::{Colormap, FieldImageParams, RenderQuality};

//! Persistence: manifest JSON files and the SQLite frame store.

mod frames;
mod manifests;

pub use frames::{FrameStore, NextFrame};
pub use manifests::ManifestStore;

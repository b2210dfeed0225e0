use awsrt_config::StorageSection;
use awsrt_core::store::ManifestStore;
use serde_json::{json, Value};

/// Demo manifests written by `awsrt seed-demo`, keyed by file stem.
pub fn demo_manifests() -> Vec<(&'static str, Value)> {
    vec![
        (
            "env_e0_flat",
            json!({
                "name": "E0-flat",
                "grid": {"H": 60, "W": 80, "cell_m": 250},
                "wind": {"speed": 4, "dir_deg": 210},
                "seed": 0,
                "env_id": "env_e0_flat"
            }),
        ),
        (
            "fire_single_center",
            json!({
                "name": "single-center",
                "ignitions": {"k": 1, "placement": "center"},
                "model": {"family": "baseline"},
                "seed": 0,
                "fire_id": "fire_single_center"
            }),
        ),
        (
            "sensors_fleet8",
            json!({
                "name": "fleet-8",
                "fleet": {"N": 8, "groups": ["ground"]},
                "seed": 0,
                "sensors_id": "sensors_fleet8"
            }),
        ),
    ]
}

pub fn run(storage: &StorageSection) -> Result<(), Box<dyn std::error::Error>> {
    let store = ManifestStore::new(storage.manifests_dir())?;
    for (stem, value) in demo_manifests() {
        let path = store.write_raw(stem, &value)?;
        println!("wrote {}", path.display());
    }
    Ok(())
}

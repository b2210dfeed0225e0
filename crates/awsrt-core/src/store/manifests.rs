//! Environment and fire manifests as pretty JSON files in one directory.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::api::{EnvRow, FireRow, ManifestEntry, ManifestListing, NewEnvironment, NewFire};
use crate::error::{CoreError, CoreResult};
use crate::ids::{content_id, is_safe_id};
use crate::manifest::{EnvironmentManifest, FireManifest};
use crate::sim::SpreadModel;

pub struct ManifestStore {
    dir: PathBuf,
}

impl ManifestStore {
    /// Open `dir`, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> CoreResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save_environment(&self, req: NewEnvironment) -> CoreResult<EnvironmentManifest> {
        req.grid.validate()?;
        let env_id = content_id("env", &serde_json::to_value(&req)?);
        let manifest = EnvironmentManifest {
            env_id,
            grid: req.grid,
            seed: req.seed,
            terrain_elev_path: req.terrain_elev_path,
            feasibility_mask_path: req.feasibility_mask_path,
        };
        self.write_json(&manifest.env_id, &manifest)?;
        info!(
            env_id = %manifest.env_id,
            h = manifest.grid.height,
            w = manifest.grid.width,
            "Created environment"
        );
        Ok(manifest)
    }

    /// Load an environment, rechecking its grid so an edited file cannot
    /// ask for an unbounded raster.
    pub fn load_environment(&self, env_id: &str) -> CoreResult<EnvironmentManifest> {
        let env: EnvironmentManifest = self.read_json("Environment", env_id)?;
        env.grid.validate()?;
        Ok(env)
    }

    /// Persist a fire after checking its environment, ignitions and model.
    pub fn save_fire(&self, req: NewFire) -> CoreResult<FireManifest> {
        let env = self.load_environment(&req.env_id)?;
        req.ignitions.validate(&env.grid)?;
        SpreadModel::from_name(&req.model)?;

        let fire_id = content_id("fire", &serde_json::to_value(&req)?);
        let manifest = FireManifest {
            fire_id,
            env_id: req.env_id,
            ignitions: req.ignitions,
            model: req.model,
            seed: req.seed,
        };
        self.write_json(&manifest.fire_id, &manifest)?;
        info!(
            fire_id = %manifest.fire_id,
            env_id = %manifest.env_id,
            n_ignitions = manifest.ignitions.locations.len(),
            "Created fire"
        );
        Ok(manifest)
    }

    pub fn load_fire(&self, fire_id: &str) -> CoreResult<FireManifest> {
        self.read_json("Fire", fire_id)
    }

    pub fn list_environments(&self) -> CoreResult<Vec<EnvRow>> {
        let mut rows: Vec<EnvRow> = self
            .parse_all::<EnvironmentManifest>()?
            .into_iter()
            .map(|env| EnvRow {
                env_id: env.env_id,
                height: env.grid.height,
                width: env.grid.width,
                cell_size: env.grid.cell_size,
                crs_code: env.grid.crs_code,
            })
            .collect();
        rows.sort_by(|a, b| a.env_id.cmp(&b.env_id));
        Ok(rows)
    }

    pub fn list_fires(&self) -> CoreResult<Vec<FireRow>> {
        let mut rows: Vec<FireRow> = self
            .parse_all::<FireManifest>()?
            .into_iter()
            .map(|fire| FireRow {
                n_ignitions: fire.ignitions.locations.len(),
                fire_id: fire.fire_id,
                env_id: fire.env_id,
                model: fire.model,
            })
            .collect();
        rows.sort_by(|a, b| a.fire_id.cmp(&b.fire_id));
        Ok(rows)
    }

    /// Every JSON file in the directory with whatever name and id it carries.
    pub fn list_manifests(&self) -> CoreResult<ManifestListing> {
        let mut manifests = Vec::new();
        for path in self.json_files()? {
            let file = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name.to_string(),
                None => continue,
            };
            let value = fs::read_to_string(&path)
                .ok()
                .and_then(|raw| serde_json::from_str::<serde_json::Value>(&raw).ok());
            let field = |key: &str| {
                value
                    .as_ref()
                    .and_then(|v| v.get(key))
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
            };
            let id = field("env_id")
                .or_else(|| field("fire_id"))
                .or_else(|| field("sensors_id"));
            manifests.push(ManifestEntry {
                file,
                name: field("name"),
                id,
            });
        }
        manifests.sort_by(|a, b| a.file.cmp(&b.file));
        Ok(ManifestListing { manifests })
    }

    /// Write an arbitrary JSON document as `<file_stem>.json`.
    pub fn write_raw(&self, file_stem: &str, value: &serde_json::Value) -> CoreResult<PathBuf> {
        self.write_json(file_stem, value)
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    fn write_json<T: Serialize>(&self, id: &str, value: &T) -> CoreResult<PathBuf> {
        if !is_safe_id(id) {
            return Err(CoreError::validation(format!(
                "'{}' is not a valid manifest id",
                id
            )));
        }
        let path = self.path_for(id);
        let tmp = self.dir.join(format!(".{}.json.tmp", id));
        fs::write(&tmp, serde_json::to_string_pretty(value)?)?;
        fs::rename(&tmp, &path)?;
        debug!(path = %path.display(), "Wrote manifest");
        Ok(path)
    }

    fn read_json<T: DeserializeOwned>(&self, kind: &'static str, id: &str) -> CoreResult<T> {
        if !is_safe_id(id) {
            return Err(CoreError::not_found(kind, id));
        }
        let raw = match fs::read_to_string(self.path_for(id)) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(CoreError::not_found(kind, id))
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&raw).map_err(|e| {
            CoreError::validation(format!(
                "manifest {} is not a valid {}: {}",
                id,
                kind.to_lowercase(),
                e
            ))
        })
    }

    fn json_files(&self) -> CoreResult<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let visible = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| !n.starts_with('.'));
            if visible && path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn parse_all<T: DeserializeOwned>(&self) -> CoreResult<Vec<T>> {
        let mut out = Vec::new();
        for path in self.json_files()? {
            let parsed = fs::read_to_string(&path)
                .map_err(CoreError::from)
                .and_then(|raw| serde_json::from_str::<T>(&raw).map_err(CoreError::from));
            match parsed {
                Ok(value) => out.push(value),
                Err(e) => debug!(path = %path.display(), error = %e, "Skipping manifest"),
            }
        }
        Ok(out)
    }
}

//! Run lifecycle over the manifest and frame stores.
//!
//! A run is created from an environment and a fire, then advanced one step at
//! a time until `t_latest == horizon_steps - 1`. Frames are rendered on read.

use std::fs;

use awsrt_config::StorageSection;
use chrono::Utc;
use tracing::{debug, info};

use crate::api::{
    BeliefPreviewRequest, EnvRow, FireRow, InitRunRequest, InitRunResponse, LatestResponse,
    ManifestListing, NewEnvironment, NewEnvironmentResponse, NewFire, NewFireResponse, RunMeta,
    StepResponse,
};
use crate::error::{CoreError, CoreResult};
use crate::ids;
use crate::manifest::RunConfig;
use crate::raster::Raster;
use crate::render::{self, FieldImageParams};
use crate::sim::{init_belief, init_belief_with_priors, state_from_ignitions, step_rng, SpreadModel};
use crate::store::{FrameStore, ManifestStore, NextFrame};

pub struct RunEngine {
    manifests: ManifestStore,
    frames: FrameStore,
}

impl RunEngine {
    pub fn new(manifests: ManifestStore, frames: FrameStore) -> Self {
        Self { manifests, frames }
    }

    /// Open both stores under `storage.data_dir`.
    pub fn open(storage: &StorageSection) -> CoreResult<Self> {
        fs::create_dir_all(&storage.data_dir)?;
        let manifests = ManifestStore::new(storage.manifests_dir())?;
        let frames = FrameStore::open(&storage.frames_db())?;
        info!(data_dir = %storage.data_dir.display(), "Run engine ready");
        Ok(Self::new(manifests, frames))
    }

    // --- Manifests ---

    pub fn create_environment(&self, req: NewEnvironment) -> CoreResult<NewEnvironmentResponse> {
        let env = self.manifests.save_environment(req)?;
        Ok(NewEnvironmentResponse { env_id: env.env_id })
    }

    pub fn create_fire(&self, req: NewFire) -> CoreResult<NewFireResponse> {
        let fire = self.manifests.save_fire(req)?;
        Ok(NewFireResponse {
            fire_id: fire.fire_id,
        })
    }

    pub fn list_environments(&self) -> CoreResult<Vec<EnvRow>> {
        self.manifests.list_environments()
    }

    pub fn list_fires(&self) -> CoreResult<Vec<FireRow>> {
        self.manifests.list_fires()
    }

    pub fn list_manifests(&self) -> CoreResult<ManifestListing> {
        self.manifests.list_manifests()
    }

    // --- Runs ---

    pub fn init_run(&self, req: &InitRunRequest) -> CoreResult<InitRunResponse> {
        req.validate()?;
        let env = self.manifests.load_environment(&req.env_id)?;
        let fire = self.manifests.load_fire(&req.fire_id)?;
        if fire.env_id != env.env_id {
            return Err(CoreError::validation(format!(
                "fire {} belongs to environment {}, not {}",
                fire.fire_id, fire.env_id, env.env_id
            )));
        }
        let model = SpreadModel::from_name(&fire.model)?;

        let state0 = state_from_ignitions(&env.grid, &fire.ignitions);
        let belief0 = init_belief_with_priors(&env, &fire)?;
        let config = RunConfig {
            run_id: ids::run_id(),
            env_id: env.env_id,
            fire_id: fire.fire_id,
            run_name: req.run_name.clone(),
            dt_seconds: req.dt_seconds,
            horizon_steps: req.horizon_steps,
            spread_prob: req.spread_prob,
            model: model.name().to_string(),
            env_seed: env.seed,
            fire_seed: fire.seed,
            height: env.grid.height,
            width: env.grid.width,
            created_at: Utc::now(),
        };
        self.frames.create_run(&config, &state0, &belief0)?;
        info!(
            run_id = %config.run_id,
            env_id = %config.env_id,
            fire_id = %config.fire_id,
            horizon = config.horizon_steps,
            burning = state0.count_on(),
            "Initialized run"
        );

        Ok(InitRunResponse {
            run_id: config.run_id,
            t: 0,
            dt_seconds: config.dt_seconds,
            horizon_steps: config.horizon_steps,
        })
    }

    /// Advance a run by one step.
    ///
    /// A finished run is left untouched and reports its last index with
    /// `done = true`.
    pub fn step(&self, run_id: &str) -> CoreResult<StepResponse> {
        let mut horizon = 0;
        let t = self
            .frames
            .append_next(run_id, |config, t_cur, state, belief| {
                horizon = config.horizon_steps;
                if t_cur + 1 >= config.horizon_steps {
                    return Ok(None);
                }
                let model = SpreadModel::from_name(&config.model)?;
                let mut rng = step_rng(&config.run_id, config.env_seed, config.fire_seed, t_cur);
                let next_state = model.step(state, config.spread_prob, &mut rng);
                debug!(
                    run_id = %config.run_id,
                    t = t_cur + 1,
                    burning = next_state.count_on(),
                    "Spread step"
                );
                Ok(Some(NextFrame {
                    state: next_state,
                    belief: belief.clone(),
                }))
            })?;

        Ok(StepResponse {
            run_id: run_id.to_string(),
            t,
            done: t + 1 >= horizon,
        })
    }

    /// Step up to `n` times, stopping early once the run is done.
    pub fn advance(&self, run_id: &str, n: u32) -> CoreResult<StepResponse> {
        if n < 1 {
            return Err(CoreError::validation("n must be at least 1"));
        }
        let mut last = self.step(run_id)?;
        for _ in 1..n {
            if last.done {
                break;
            }
            last = self.step(run_id)?;
        }
        Ok(last)
    }

    pub fn latest(&self, run_id: &str) -> CoreResult<LatestResponse> {
        let frames = self.frames.frame_count(run_id)?;
        Ok(LatestResponse {
            run_id: run_id.to_string(),
            t_latest: frames.saturating_sub(1),
        })
    }

    pub fn meta(&self, run_id: &str) -> CoreResult<RunMeta> {
        let config = self.frames.run_config(run_id)?;
        let frames = self.frames.frame_count(run_id)?;
        Ok(RunMeta {
            run_id: config.run_id,
            height: config.height,
            width: config.width,
            frames,
        })
    }

    pub fn run_config(&self, run_id: &str) -> CoreResult<RunConfig> {
        self.frames.run_config(run_id)
    }

    pub fn list_runs(&self) -> CoreResult<Vec<String>> {
        self.frames.list_runs()
    }

    // --- Rendering ---

    pub fn state_png(&self, run_id: &str, t: i64) -> CoreResult<Vec<u8>> {
        let t = frame_index(run_id, t)?;
        render::state_to_png(&self.frames.state_at(run_id, t)?)
    }

    pub fn belief_png(&self, run_id: &str, t: i64, params: &FieldImageParams) -> CoreResult<Vec<u8>> {
        let t = frame_index(run_id, t)?;
        let belief = self.frames.belief_at(run_id, t)?;
        render::belief_to_png(&belief, params)
    }

    /// Colourbar for a run's belief images.
    pub fn legend_png(&self, run_id: &str, params: &FieldImageParams) -> CoreResult<Vec<u8>> {
        self.frames.run_config(run_id)?;
        render::legend_belief_png(params)
    }

    /// Initial belief of an environment without creating a run.
    pub fn preview_belief(&self, req: &BeliefPreviewRequest) -> CoreResult<Vec<u8>> {
        let env = self.manifests.load_environment(&req.env_id)?;
        let belief: Raster<f32> = init_belief(&env.grid, req.prior, req.prior_strength)?;
        render::belief_to_png(&belief, &req.image)
    }
}

fn frame_index(run_id: &str, t: i64) -> CoreResult<u32> {
    u32::try_from(t).map_err(|_| CoreError::not_found("Frame", format!("{}@t={}", run_id, t)))
}

//! Typed HTTP client for the AWSRT API.

use std::time::Duration;

use async_trait::async_trait;
use awsrt_config::ClientSection;
use awsrt_core::api::{
    BeliefPreviewRequest, EnvRow, FireRow, HealthResponse, InitRunRequest, InitRunResponse,
    LatestResponse, ManifestListing, NewEnvironment, NewEnvironmentResponse, NewFire,
    NewFireResponse, RunMeta, StepResponse,
};
use awsrt_core::{FieldImageParams, RenderQuality};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::ClientError;
use crate::playback::RunApi;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let parsed =
            Url::parse(&base_url).map_err(|e| ClientError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if parsed.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(format!("{}: not a base URL", base_url)));
        }
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &ClientSection) -> Result<Self, ClientError> {
        Self::new(&config.api_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Append `segments` to the base URL. Each segment is percent-encoded, so
    /// an id holding `/` or `?` stays a single path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(format!("{}: not a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn endpoint_with_query(
        &self,
        segments: &[&str],
        pairs: &[(&str, String)],
    ) -> Result<Url, ClientError> {
        let mut url = self.endpoint(segments)?;
        url.query_pairs_mut()
            .extend_pairs(pairs.iter().map(|(k, v)| (*k, v.as_str())));
        Ok(url)
    }

    async fn check(resp: Response) -> Result<Response, ClientError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(ClientError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
        let bytes = Self::check(resp).await?.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ClientError> {
        debug!(url = %url, "GET");
        let resp = self.client.get(url).send().await?;
        Self::decode(resp).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, ClientError> {
        debug!(url = %url, "POST");
        let resp = self.client.post(url).json(body).send().await?;
        Self::decode(resp).await
    }

    async fn post_empty<T: DeserializeOwned>(&self, url: Url) -> Result<T, ClientError> {
        debug!(url = %url, "POST");
        let resp = self.client.post(url).send().await?;
        Self::decode(resp).await
    }

    /// Fetch raw bytes from an absolute URL, typically one built by the
    /// `*_png_url` helpers.
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, ClientError> {
        let resp = self.client.get(url).send().await?;
        Ok(Self::check(resp).await?.bytes().await?.to_vec())
    }

    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        self.get_json(self.endpoint(&["health"])?).await
    }

    // --- Manifests ---

    pub async fn create_environment(
        &self,
        req: &NewEnvironment,
    ) -> Result<NewEnvironmentResponse, ClientError> {
        self.post_json(self.endpoint(&["manifests", "environment"])?, req)
            .await
    }

    pub async fn list_environments(&self) -> Result<Vec<EnvRow>, ClientError> {
        self.get_json(self.endpoint(&["manifests", "environments"])?)
            .await
    }

    pub async fn create_fire(&self, req: &NewFire) -> Result<NewFireResponse, ClientError> {
        self.post_json(self.endpoint(&["manifests", "fire"])?, req)
            .await
    }

    pub async fn list_fires(&self) -> Result<Vec<FireRow>, ClientError> {
        self.get_json(self.endpoint(&["manifests", "fires"])?).await
    }

    pub async fn list_manifests(&self) -> Result<ManifestListing, ClientError> {
        self.get_json(self.endpoint(&["manifests", "list"])?).await
    }

    // --- Runs ---

    pub async fn init_run(&self, req: &InitRunRequest) -> Result<InitRunResponse, ClientError> {
        self.post_json(self.endpoint(&["runs", "init"])?, req).await
    }

    pub async fn step(&self, run_id: &str) -> Result<StepResponse, ClientError> {
        self.post_empty(self.endpoint(&["runs", run_id, "step"])?)
            .await
    }

    pub async fn advance(&self, run_id: &str, n: u32) -> Result<StepResponse, ClientError> {
        let url = self.endpoint_with_query(&["runs", run_id, "advance"], &[("n", n.to_string())])?;
        self.post_empty(url).await
    }

    pub async fn latest(&self, run_id: &str) -> Result<LatestResponse, ClientError> {
        self.get_json(self.endpoint(&["runs", run_id, "latest"])?)
            .await
    }

    pub async fn meta(&self, run_id: &str) -> Result<RunMeta, ClientError> {
        self.get_json(self.endpoint(&["runs", run_id, "meta"])?)
            .await
    }

    pub async fn list_runs(&self) -> Result<Vec<String>, ClientError> {
        self.get_json(self.endpoint(&["runs", "list"])?).await
    }

    // --- Frames ---
    //
    // Frame URLs carry `r=<t>` so image caches key on the step index.

    pub fn state_png_url(&self, run_id: &str, t: u32) -> Result<String, ClientError> {
        let t = t.to_string();
        let url = self.endpoint_with_query(
            &["runs", run_id, "t", t.as_str(), "state.png"],
            &[("r", t.clone())],
        )?;
        Ok(url.into())
    }

    pub fn belief_png_url(
        &self,
        run_id: &str,
        t: u32,
        params: &FieldImageParams,
    ) -> Result<String, ClientError> {
        let t = t.to_string();
        let mut pairs = image_pairs(params);
        pairs.push(("r", t.clone()));
        let url =
            self.endpoint_with_query(&["runs", run_id, "t", t.as_str(), "belief.png"], &pairs)?;
        Ok(url.into())
    }

    pub fn legend_png_url(
        &self,
        run_id: &str,
        params: &FieldImageParams,
    ) -> Result<String, ClientError> {
        let url = self.endpoint_with_query(
            &["runs", run_id, "legend", "belief.png"],
            &image_pairs(params),
        )?;
        Ok(url.into())
    }

    pub async fn state_png(&self, run_id: &str, t: u32) -> Result<Vec<u8>, ClientError> {
        self.get_bytes(&self.state_png_url(run_id, t)?).await
    }

    pub async fn belief_png(
        &self,
        run_id: &str,
        t: u32,
        params: &FieldImageParams,
    ) -> Result<Vec<u8>, ClientError> {
        self.get_bytes(&self.belief_png_url(run_id, t, params)?)
            .await
    }

    pub async fn legend_png(
        &self,
        run_id: &str,
        params: &FieldImageParams,
    ) -> Result<Vec<u8>, ClientError> {
        self.get_bytes(&self.legend_png_url(run_id, params)?).await
    }

    pub async fn preview_belief(&self, req: &BeliefPreviewRequest) -> Result<Vec<u8>, ClientError> {
        let resp = self
            .client
            .post(self.endpoint(&["preview", "belief.png"])?)
            .json(req)
            .send()
            .await?;
        Ok(Self::check(resp).await?.bytes().await?.to_vec())
    }
}

fn image_pairs(params: &FieldImageParams) -> Vec<(&'static str, String)> {
    let quality = match params.quality {
        RenderQuality::Fast => "fast",
        RenderQuality::Pub => "pub",
    };
    vec![
        ("vmin", params.vmin.to_string()),
        ("vmax", params.vmax.to_string()),
        ("cmap", params.cmap.clone()),
        ("quality", quality.to_string()),
    ]
}

#[async_trait]
impl RunApi for ApiClient {
    async fn step(&self, run_id: &str) -> Result<StepResponse, ClientError> {
        ApiClient::step(self, run_id).await
    }

    async fn latest(&self, run_id: &str) -> Result<LatestResponse, ClientError> {
        ApiClient::latest(self, run_id).await
    }
}

//! Server API Integration Tests
//!
//! Spins up a real Axum server on an ephemeral port and tests with reqwest over HTTP.
//! Exercises the full middleware stack (CORS, tracing, timeout, body limit, concurrency limit).

use awsrt_config::{HumanBytes, ServerSection, StorageSection};
use awsrt_core::RunEngine;
use awsrt_server::{build_router, AppState};
use serde_json::{json, Value};
use tempfile::TempDir;

/// Start an Axum server on an ephemeral port and return the base URL.
async fn start_server(tmp: &TempDir, config: ServerSection) -> String {
    let engine = RunEngine::open(&StorageSection {
        data_dir: tmp.path().to_path_buf(),
    })
    .unwrap();
    let app = build_router(AppState::new(engine), &config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://127.0.0.1:{}", port)
}

async fn seed(client: &reqwest::Client, base: &str, horizon: u32) -> String {
    let env: Value = client
        .post(format!("{}/manifests/environment", base))
        .json(&json!({"grid": {"H": 20, "W": 30, "cell_size": 250, "crs_code": "EPSG:32612"}, "seed": 4}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let fire: Value = client
        .post(format!("{}/manifests/fire", base))
        .json(&json!({
            "env_id": env["env_id"],
            "ignitions": {"type": "point", "locations": [{"row": 10, "col": 15}], "t0": 0},
            "model": "E2_base",
            "seed": 9
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let run: Value = client
        .post(format!("{}/runs/init", base))
        .json(&json!({
            "env_id": env["env_id"],
            "fire_id": fire["fire_id"],
            "run_name": "integration",
            "dt_seconds": 600,
            "horizon_steps": horizon,
            "spread_prob": 0.6
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(run["t"], 0);
    assert_eq!(run["dt_seconds"], 600);
    run["run_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_endpoint() {
    let tmp = TempDir::new().unwrap();
    let base = start_server(&tmp, ServerSection::default()).await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{}/health", base)).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_full_run_lifecycle() {
    let tmp = TempDir::new().unwrap();
    let base = start_server(&tmp, ServerSection::default()).await;
    let client = reqwest::Client::new();
    let run_id = seed(&client, &base, 4).await;

    let mut last_t = 0;
    loop {
        let step: Value = client
            .post(format!("{}/runs/{}/step", base, run_id))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let t = step["t"].as_u64().unwrap();
        assert_eq!(t, last_t + 1);
        last_t = t;
        if step["done"] == true {
            break;
        }
    }
    assert_eq!(last_t, 3);

    let latest: Value = client
        .get(format!("{}/runs/{}/latest", base, run_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(latest["t_latest"], 3);

    for t in 0..=3 {
        let resp = client
            .get(format!("{}/runs/{}/t/{}/belief.png?r={}", base, run_id, t, t))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["content-type"], "image/png");
        let bytes = resp.bytes().await.unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }
}

#[tokio::test]
async fn test_concurrent_steps_are_serialized() {
    let tmp = TempDir::new().unwrap();
    let base = start_server(&tmp, ServerSection::default()).await;
    let client = reqwest::Client::new();
    let run_id = seed(&client, &base, 50).await;

    let mut tasks = Vec::new();
    for _ in 0..10 {
        let client = client.clone();
        let url = format!("{}/runs/{}/step", base, run_id);
        tasks.push(tokio::spawn(async move {
            let step: Value = client.post(url).send().await.unwrap().json().await.unwrap();
            step["t"].as_u64().unwrap()
        }));
    }
    let mut seen = Vec::new();
    for task in tasks {
        seen.push(task.await.unwrap());
    }
    seen.sort_unstable();
    assert_eq!(seen, (1..=10).collect::<Vec<u64>>());
}

#[tokio::test]
async fn test_body_limit_enforced() {
    let tmp = TempDir::new().unwrap();
    let config = ServerSection {
        body_limit: HumanBytes(256),
        ..ServerSection::default()
    };
    let base = start_server(&tmp, config).await;
    let client = reqwest::Client::new();

    let locations: Vec<Value> = (0..100).map(|i| json!({"row": i, "col": i})).collect();
    let resp = client
        .post(format!("{}/manifests/fire", base))
        .json(&json!({"env_id": "env-x", "ignitions": {"locations": locations}}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 413);
}

#[tokio::test]
async fn test_malformed_json_rejected() {
    let tmp = TempDir::new().unwrap();
    let base = start_server(&tmp, ServerSection::default()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/runs/init", base))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_client_error());

    let resp = client
        .post(format!("{}/runs/init", base))
        .json(&json!({"env_id": "env-a"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 422);
}

#[tokio::test]
async fn test_init_with_missing_manifests_is_404() {
    let tmp = TempDir::new().unwrap();
    let base = start_server(&tmp, ServerSection::default()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/runs/init", base))
        .json(&json!({"env_id": "env-none", "fire_id": "fire-none"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let json: Value = resp.json().await.unwrap();
    assert!(json["detail"].as_str().unwrap().contains("env-none"));
}

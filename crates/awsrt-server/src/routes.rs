//! Route definitions for the AWSRT REST API.

use awsrt_config::ServerSection;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the Axum router with all API routes and the middleware stack
/// configured by `config`.
pub fn build_router(state: AppState, config: &ServerSection) -> Router {
    let timeout = TimeoutLayer::new(config.request_timeout.as_duration());

    let manifests = Router::new()
        .route("/environment", post(handlers::create_environment))
        .route("/environments", get(handlers::list_environments))
        .route("/fire", post(handlers::create_fire))
        .route("/fires", get(handlers::list_fires))
        .route("/list", get(handlers::list_manifests));

    // Step and advance are added after the timeout layer: a step commits its
    // frame even if the response is abandoned, so it must not report 408.
    let runs = Router::new()
        .route("/init", post(handlers::init_run))
        .route("/list", get(handlers::list_runs))
        .route("/:run_id/latest", get(handlers::latest))
        .route("/:run_id/meta", get(handlers::meta))
        .route("/:run_id/t/:t/state.png", get(handlers::state_png))
        .route("/:run_id/t/:t/belief.png", get(handlers::belief_png))
        .route("/:run_id/legend/belief.png", get(handlers::legend_belief_png))
        .layer(timeout.clone())
        .route("/:run_id/step", post(handlers::step))
        .route("/:run_id/advance", post(handlers::advance));

    let body_limit = usize::try_from(config.body_limit.as_bytes()).unwrap_or(usize::MAX);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/health/", get(handlers::health))
        .nest("/manifests", manifests)
        .route("/preview/belief.png", post(handlers::preview_belief_png))
        .layer(timeout)
        .nest("/runs", runs)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(ConcurrencyLimitLayer::new(config.concurrency_limit))
        .layer(cors_layer(&config.cors_origins))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim_end_matches('/')) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use awsrt_config::{HumanDuration, StorageSection};
    use awsrt_core::RunEngine;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn make_state(tmp: &TempDir) -> AppState {
        let engine = RunEngine::open(&StorageSection {
            data_dir: tmp.path().to_path_buf(),
        })
        .unwrap();
        AppState::new(engine)
    }

    fn make_app(tmp: &TempDir) -> Router {
        build_router(make_state(tmp), &ServerSection::default())
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let (status, body) = send(app, req).await;
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, body) = send(app, req).await;
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    async fn seed_run(app: &Router, horizon: u32) -> String {
        let (_, env) = post_json(
            app,
            "/manifests/environment",
            json!({"grid": {"H": 10, "W": 12, "cell_size": 250}}),
        )
        .await;
        let env_id = env["env_id"].as_str().unwrap().to_string();
        let (_, fire) = post_json(
            app,
            "/manifests/fire",
            json!({"env_id": env_id, "ignitions": {"type": "point", "locations": [{"row": 5, "col": 6}]}}),
        )
        .await;
        let (status, run) = post_json(
            app,
            "/runs/init",
            json!({"env_id": env_id, "fire_id": fire["fire_id"], "horizon_steps": horizon}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        run["run_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let tmp = TempDir::new().unwrap();
        let app = make_app(&tmp);
        for uri in ["/health", "/health/"] {
            let (status, json) = get_json(&app, uri).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(json["status"], "ok");
            assert!(json["version"].is_string());
        }
    }

    #[tokio::test]
    async fn test_environment_validation() {
        let tmp = TempDir::new().unwrap();
        let app = make_app(&tmp);
        let (status, json) = post_json(
            &app,
            "/manifests/environment",
            json!({"grid": {"H": 0, "W": 4, "cell_size": 250}}),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json["detail"].as_str().unwrap().contains("positive"));
    }

    #[tokio::test]
    async fn test_fire_on_unknown_env_is_404() {
        let tmp = TempDir::new().unwrap();
        let app = make_app(&tmp);
        let (status, json) = post_json(
            &app,
            "/manifests/fire",
            json!({"env_id": "env-nope", "ignitions": {"locations": [{"row": 0, "col": 0}]}}),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "Not Found");
    }

    #[tokio::test]
    async fn test_out_of_bounds_ignition_is_422() {
        let tmp = TempDir::new().unwrap();
        let app = make_app(&tmp);
        let (_, env) = post_json(
            &app,
            "/manifests/environment",
            json!({"grid": {"H": 4, "W": 4, "cell_size": 30}}),
        )
        .await;
        let (status, _) = post_json(
            &app,
            "/manifests/fire",
            json!({"env_id": env["env_id"], "ignitions": {"locations": [{"row": 4, "col": 0}]}}),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_step_until_done() {
        let tmp = TempDir::new().unwrap();
        let app = make_app(&tmp);
        let run_id = seed_run(&app, 2).await;

        let (status, step) = post_json(&app, &format!("/runs/{}/step", run_id), Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(step["t"], 1);
        assert_eq!(step["done"], true);

        let (_, again) = post_json(&app, &format!("/runs/{}/step", run_id), Value::Null).await;
        assert_eq!(again["t"], 1);
        assert_eq!(again["done"], true);

        let (_, latest) = get_json(&app, &format!("/runs/{}/latest", run_id)).await;
        assert_eq!(latest["t_latest"], 1);

        let (_, meta) = get_json(&app, &format!("/runs/{}/meta", run_id)).await;
        assert_eq!((meta["H"].clone(), meta["W"].clone(), meta["T"].clone()), (json!(10), json!(12), json!(2)));
    }

    #[tokio::test]
    async fn test_advance_rejects_zero() {
        let tmp = TempDir::new().unwrap();
        let app = make_app(&tmp);
        let run_id = seed_run(&app, 5).await;

        let (status, _) =
            post_json(&app, &format!("/runs/{}/advance?n=0", run_id), Value::Null).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, json) =
            post_json(&app, &format!("/runs/{}/advance?n=3", run_id), Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["t"], 3);
        assert_eq!(json["done"], false);
    }

    #[tokio::test]
    async fn test_stepping_is_not_cut_off_by_request_timeout() {
        let tmp = TempDir::new().unwrap();
        let state = make_state(&tmp);
        let app = build_router(state.clone(), &ServerSection::default());
        let run_id = seed_run(&app, 200).await;

        let hasty = build_router(
            state,
            &ServerSection {
                request_timeout: HumanDuration(Duration::from_nanos(1)),
                ..Default::default()
            },
        );
        let (status, json) =
            post_json(&hasty, &format!("/runs/{}/advance?n=199", run_id), Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["t"], 199);
        assert_eq!(json["done"], true);
        let (status, json) = post_json(&hasty, &format!("/runs/{}/step", run_id), Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["t"], 199);

        let (status, json) = get_json(&app, &format!("/runs/{}/latest", run_id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["t_latest"], 199);
    }

    #[tokio::test]
    async fn test_oversized_grid_is_422() {
        let tmp = TempDir::new().unwrap();
        let app = make_app(&tmp);
        let (status, json) = post_json(
            &app,
            "/manifests/environment",
            json!({"grid": {"H": 4000000000u64, "W": 4000000000u64, "cell_size": 1}}),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json["detail"].as_str().unwrap().contains("limited"));

        let (status, envs) = get_json(&app, "/manifests/environments").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(envs, json!([]));
    }

    #[tokio::test]
    async fn test_unknown_run_is_404() {
        let tmp = TempDir::new().unwrap();
        let app = make_app(&tmp);
        let (status, json) = get_json(&app, "/runs/run-missing/latest").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(json["detail"].as_str().unwrap().contains("run-missing"));
    }

    #[tokio::test]
    async fn test_png_endpoints() {
        let tmp = TempDir::new().unwrap();
        let app = make_app(&tmp);
        let run_id = seed_run(&app, 3).await;

        for uri in [
            format!("/runs/{}/t/0/state.png", run_id),
            format!("/runs/{}/t/0/belief.png?cmap=magma&vmin=0&vmax=1&quality=pub", run_id),
            format!("/runs/{}/legend/belief.png", run_id),
        ] {
            let req = Request::builder().uri(&uri).body(Body::empty()).unwrap();
            let resp = app.clone().oneshot(req).await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK, "{uri}");
            assert_eq!(resp.headers()[header::CONTENT_TYPE], "image/png");
        }

        let (status, _) = get_json(&app, &format!("/runs/{}/t/1/state.png", run_id)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = get_json(&app, &format!("/runs/{}/t/-1/state.png", run_id)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) =
            get_json(&app, &format!("/runs/{}/t/0/belief.png?cmap=jet", run_id)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let (status, _) =
            get_json(&app, &format!("/runs/{}/t/0/belief.png?vmin=1&vmax=0", run_id)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_preview_png() {
        let tmp = TempDir::new().unwrap();
        let app = make_app(&tmp);
        let (_, env) = post_json(
            &app,
            "/manifests/environment",
            json!({"grid": {"H": 3, "W": 3, "cell_size": 10}}),
        )
        .await;
        let req = Request::builder()
            .method("POST")
            .uri("/preview/belief.png")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({"env_id": env["env_id"], "prior": "uniform", "cmap": "hot"}).to_string(),
            ))
            .unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[1..4], b"PNG");

        let (status, _) = post_json(
            &app,
            "/preview/belief.png",
            json!({"env_id": env["env_id"], "prior_strength": -2.0}),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_listings() {
        let tmp = TempDir::new().unwrap();
        let app = make_app(&tmp);
        let run_id = seed_run(&app, 3).await;

        let (_, envs) = get_json(&app, "/manifests/environments").await;
        assert_eq!(envs.as_array().unwrap().len(), 1);
        assert_eq!(envs[0]["H"], 10);

        let (_, fires) = get_json(&app, "/manifests/fires").await;
        assert_eq!(fires[0]["n_ignitions"], 1);
        assert_eq!(fires[0]["model"], "E2_base");

        let (_, listing) = get_json(&app, "/manifests/list").await;
        assert_eq!(listing["manifests"].as_array().unwrap().len(), 2);

        let (_, runs) = get_json(&app, "/runs/list").await;
        assert_eq!(runs, json!([run_id]));
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_frontend() {
        let tmp = TempDir::new().unwrap();
        let app = make_app(&tmp);
        let req = Request::builder()
            .method("OPTIONS")
            .uri("/runs/list")
            .header(header::ORIGIN, "http://localhost:3000")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(
            resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:3000"
        );
    }
}

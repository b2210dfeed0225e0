use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use awsrt_client::{ApiClient, LatestPoller, PlayOutcome, Player, ReplayCursor, Scrubber, TimeUnit};
use awsrt_core::api::InitRunRequest;
use awsrt_core::FieldImageParams;
use serde_json::json;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

use super::print_json;

pub struct InitArgs {
    pub env_id: String,
    pub fire_id: String,
    pub run_name: String,
    pub dt_amount: u64,
    pub dt_unit: TimeUnit,
    pub horizon_steps: u32,
    pub spread_prob: f64,
}

pub async fn init(client: &ApiClient, args: InitArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut req = InitRunRequest::new(args.env_id, args.fire_id);
    req.run_name = args.run_name;
    req.dt_seconds = args.dt_unit.to_seconds(args.dt_amount);
    req.horizon_steps = args.horizon_steps;
    req.spread_prob = args.spread_prob;
    print_json(&client.init_run(&req).await?)
}

pub async fn step(client: &ApiClient, run_id: &str) -> Result<(), Box<dyn std::error::Error>> {
    print_json(&client.step(run_id).await?)
}

pub async fn advance(
    client: &ApiClient,
    run_id: &str,
    n: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    print_json(&client.advance(run_id, n).await?)
}

pub async fn latest(client: &ApiClient, run_id: &str) -> Result<(), Box<dyn std::error::Error>> {
    print_json(&client.latest(run_id).await?)
}

pub async fn meta(client: &ApiClient, run_id: &str) -> Result<(), Box<dyn std::error::Error>> {
    print_json(&client.meta(run_id).await?)
}

pub async fn list(client: &ApiClient) -> Result<(), Box<dyn std::error::Error>> {
    print_json(&client.list_runs().await?)
}

/// Step a run on a timer until it is done, a step fails, or Ctrl-C.
pub async fn play(
    client: Arc<ApiClient>,
    run_id: &str,
    play_every: Duration,
    poll_every: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let poller = LatestPoller::spawn(client.clone(), run_id, poll_every);
    let latest = poller.subscribe();
    let player = Player::new(client, run_id, play_every);

    let (stop_tx, stop_rx) = watch::channel(false);
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received SIGINT, stopping playback...");
            let _ = stop_tx.send(true);
        }
    });

    let mut scrub = Scrubber::new();
    let outcome = player
        .run(stop_rx, |step| {
            if let Some(t_latest) = *latest.borrow() {
                scrub.set_max(t_latest);
            }
            scrub.observe_step(step);
            let line = json!({
                "run_id": step.run_id,
                "t": step.t,
                "done": step.done,
                "t_latest": scrub.max(),
            });
            println!("{}", line);
        })
        .await;
    ctrl_c.abort();

    match outcome {
        PlayOutcome::Done { t } => print_json(&json!({"outcome": "done", "t": t})),
        PlayOutcome::Stopped { t } => print_json(&json!({"outcome": "stopped", "t": t})),
        PlayOutcome::Failed { error } => Err(format!("Playback stopped: {}", error).into()),
    }
}

/// Walk stored frames of a run without stepping it, printing frame URLs and
/// optionally downloading each frame.
pub async fn replay(
    client: &ApiClient,
    run_id: &str,
    every: Duration,
    from_start: bool,
    params: &FieldImageParams,
    out: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let meta = client.meta(run_id).await?;
    if meta.frames == 0 {
        return Err(format!("Run {} has no frames", run_id).into());
    }
    let mut cursor = if from_start {
        ReplayCursor::from_start(meta.frames)
    } else {
        ReplayCursor::at_latest(meta.frames)
    };

    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut t = Some(cursor.t());
    while let Some(frame) = t {
        ticker.tick().await;
        println!(
            "{}",
            json!({
                "t": frame,
                "state": client.state_png_url(run_id, frame)?,
                "belief": client.belief_png_url(run_id, frame, params)?,
            })
        );
        if let Some(dir) = out {
            download_frame(client, run_id, frame, params, dir).await?;
        }
        t = cursor.advance();
    }
    Ok(())
}

/// Download state, belief and legend PNGs for step `t` into `dir`.
pub async fn frames(
    client: &ApiClient,
    run_id: &str,
    t: u32,
    params: &FieldImageParams,
    dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    download_frame(client, run_id, t, params, dir).await?;
    let legend = client.legend_png(run_id, params).await?;
    let legend_path = dir.join(format!("{}_legend.png", run_id));
    tokio::fs::write(&legend_path, legend).await?;
    println!("wrote {}", legend_path.display());
    Ok(())
}

async fn download_frame(
    client: &ApiClient,
    run_id: &str,
    t: u32,
    params: &FieldImageParams,
    dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    tokio::fs::create_dir_all(dir).await?;
    let state = client.state_png(run_id, t).await?;
    let belief = client.belief_png(run_id, t, params).await?;
    for (kind, bytes) in [("state", state), ("belief", belief)] {
        let path = dir.join(format!("{}_t{:04}_{}.png", run_id, t, kind));
        tokio::fs::write(&path, bytes).await?;
        println!("wrote {}", path.display());
    }
    Ok(())
}

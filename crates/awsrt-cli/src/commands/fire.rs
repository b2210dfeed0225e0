use awsrt_client::{clamp_or_center, ApiClient};
use awsrt_core::api::NewFire;
use awsrt_core::{IgnitionCell, IgnitionKind, IgnitionSpec};

use super::print_json;

pub struct CreateArgs {
    pub env_id: String,
    /// `(row, col)` pairs as typed; clamped against the grid before submission.
    pub ignitions: Vec<(i64, i64)>,
    pub t0: i64,
    pub model: String,
    pub seed: i64,
}

/// Parse `ROW,COL`.
pub fn parse_cell(s: &str) -> Result<(i64, i64), String> {
    let (row, col) = s
        .split_once(',')
        .ok_or_else(|| format!("expected ROW,COL, got '{}'", s))?;
    let row = row
        .trim()
        .parse()
        .map_err(|e| format!("bad row '{}': {}", row, e))?;
    let col = col
        .trim()
        .parse()
        .map_err(|e| format!("bad column '{}': {}", col, e))?;
    Ok((row, col))
}

pub async fn create(client: &ApiClient, args: CreateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let envs = client.list_environments().await?;
    let env = envs
        .iter()
        .find(|e| e.env_id == args.env_id)
        .ok_or_else(|| format!("Environment {} not found", args.env_id))?;

    let raw = if args.ignitions.is_empty() {
        vec![(-1, -1)]
    } else {
        args.ignitions
    };
    let locations = raw
        .into_iter()
        .map(|(row, col)| {
            let cell = IgnitionCell {
                row: i64::from(clamp_or_center(row, env.height)),
                col: i64::from(clamp_or_center(col, env.width)),
            };
            if (cell.row, cell.col) != (row, col) {
                tracing::warn!(row, col, to_row = cell.row, to_col = cell.col, "Clamped ignition");
            }
            cell
        })
        .collect();

    let req = NewFire {
        env_id: args.env_id,
        ignitions: IgnitionSpec {
            kind: IgnitionKind::Point,
            locations,
            t0: args.t0,
        },
        model: args.model,
        seed: args.seed,
    };
    print_json(&client.create_fire(&req).await?)
}

pub async fn list(client: &ApiClient) -> Result<(), Box<dyn std::error::Error>> {
    print_json(&client.list_fires().await?)
}

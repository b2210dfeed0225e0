use std::path::PathBuf;
use std::sync::Arc;

use awsrt_client::{ApiClient, TimeUnit};
use awsrt_config::AwsrtConfig;
use awsrt_core::manifest::{DEFAULT_CRS, DEFAULT_MODEL};
use awsrt_core::{FieldImageParams, RenderQuality};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "awsrt", version, about = "Wildfire simulation runs, frames, and playback")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the REST API server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Show effective configuration
    Config,
    /// Write the demo manifests into the data directory
    SeedDemo,
    /// Manage environments
    #[command(subcommand)]
    Env(EnvCommand),
    /// Manage fires
    #[command(subcommand)]
    Fire(FireCommand),
    /// Create, step, and play runs
    #[command(subcommand)]
    Run(RunCommand),
    /// Render the initial belief of an environment to a PNG
    Preview {
        env_id: String,
        /// Prior strength (non-negative)
        #[arg(long, default_value_t = 1.0)]
        prior_strength: f64,
        #[command(flatten)]
        image: ImageArgs,
        /// Output file
        #[arg(short, long, default_value = "preview.png")]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum EnvCommand {
    /// Create an environment
    Create {
        /// Grid height in cells
        #[arg(long = "height", short = 'H', default_value_t = 60)]
        height: u32,
        /// Grid width in cells
        #[arg(long = "width", short = 'W', default_value_t = 80)]
        width: u32,
        /// Cell edge length in metres
        #[arg(long, default_value_t = 250.0)]
        cell_size: f64,
        #[arg(long, default_value = DEFAULT_CRS)]
        crs: String,
        #[arg(long, default_value_t = 0)]
        seed: i64,
    },
    /// List environments
    List,
    /// List every manifest file, including legacy demo files
    Manifests,
}

#[derive(Subcommand)]
enum FireCommand {
    /// Create a point-ignition fire; out-of-grid cells move to the grid centre
    Create {
        env_id: String,
        /// Ignition cell as ROW,COL (repeatable; defaults to the centre)
        #[arg(short, long = "ignition", value_parser = commands::fire::parse_cell, allow_hyphen_values = true)]
        ignitions: Vec<(i64, i64)>,
        #[arg(long, default_value_t = 0)]
        t0: i64,
        #[arg(long, default_value = DEFAULT_MODEL)]
        model: String,
        #[arg(long, default_value_t = 0)]
        seed: i64,
    },
    /// List fires
    List,
}

#[derive(Clone, Copy, ValueEnum)]
enum UnitArg {
    Sec,
    Min,
    Hour,
    Day,
}

impl From<UnitArg> for TimeUnit {
    fn from(unit: UnitArg) -> Self {
        match unit {
            UnitArg::Sec => TimeUnit::Sec,
            UnitArg::Min => TimeUnit::Min,
            UnitArg::Hour => TimeUnit::Hour,
            UnitArg::Day => TimeUnit::Day,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum QualityArg {
    Fast,
    Pub,
}

#[derive(Args)]
struct ImageArgs {
    /// Colormap name
    #[arg(long, default_value = "viridis")]
    cmap: String,
    #[arg(long, default_value_t = 0.0)]
    vmin: f64,
    #[arg(long, default_value_t = 1.0)]
    vmax: f64,
    #[arg(long, value_enum, default_value = "fast")]
    quality: QualityArg,
}

impl From<ImageArgs> for FieldImageParams {
    fn from(args: ImageArgs) -> Self {
        FieldImageParams {
            cmap: args.cmap,
            vmin: args.vmin,
            vmax: args.vmax,
            quality: match args.quality {
                QualityArg::Fast => RenderQuality::Fast,
                QualityArg::Pub => RenderQuality::Pub,
            },
        }
    }
}

#[derive(Subcommand)]
enum RunCommand {
    /// Initialise a run from an environment and a fire
    Init {
        env_id: String,
        fire_id: String,
        #[arg(long, default_value = "run")]
        name: String,
        /// Step duration, in `--unit`s
        #[arg(long, default_value_t = 1)]
        dt: u64,
        #[arg(long, value_enum, default_value = "hour")]
        unit: UnitArg,
        #[arg(long, default_value_t = 24)]
        horizon: u32,
        /// Per-neighbour spread probability
        #[arg(long, default_value_t = 0.3)]
        spread: f64,
    },
    /// Advance a run by one step
    Step { run_id: String },
    /// Advance a run by up to N steps
    Advance {
        run_id: String,
        #[arg(short, default_value_t = 1)]
        n: u32,
    },
    /// Show the latest computed step
    Latest { run_id: String },
    /// Show grid size and frame count
    Meta { run_id: String },
    /// List runs
    List,
    /// Step a run on a timer until done (Ctrl-C to stop)
    Play { run_id: String },
    /// Walk stored frames without stepping
    Replay {
        run_id: String,
        /// Start at t=0 instead of the latest frame
        #[arg(long)]
        from_start: bool,
        #[command(flatten)]
        image: ImageArgs,
        /// Download each frame into this directory
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Download state, belief, and legend PNGs for one step
    Frames {
        run_id: String,
        t: u32,
        #[command(flatten)]
        image: ImageArgs,
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AwsrtConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { host, port } => commands::serve::run(&config, host, port).await?,
        Commands::Config => commands::config::run(&config)?,
        Commands::SeedDemo => commands::seed_demo::run(&config.storage)?,
        Commands::Env(cmd) => {
            let client = ApiClient::from_config(&config.client)?;
            match cmd {
                EnvCommand::Create {
                    height,
                    width,
                    cell_size,
                    crs,
                    seed,
                } => {
                    let args = commands::env::CreateArgs {
                        height,
                        width,
                        cell_size,
                        crs_code: crs,
                        seed,
                    };
                    commands::env::create(&client, args).await?
                }
                EnvCommand::List => commands::env::list(&client).await?,
                EnvCommand::Manifests => commands::env::list_all(&client).await?,
            }
        }
        Commands::Fire(cmd) => {
            let client = ApiClient::from_config(&config.client)?;
            match cmd {
                FireCommand::Create {
                    env_id,
                    ignitions,
                    t0,
                    model,
                    seed,
                } => {
                    let args = commands::fire::CreateArgs {
                        env_id,
                        ignitions,
                        t0,
                        model,
                        seed,
                    };
                    commands::fire::create(&client, args).await?
                }
                FireCommand::List => commands::fire::list(&client).await?,
            }
        }
        Commands::Run(cmd) => {
            let client = ApiClient::from_config(&config.client)?;
            match cmd {
                RunCommand::Init {
                    env_id,
                    fire_id,
                    name,
                    dt,
                    unit,
                    horizon,
                    spread,
                } => {
                    let args = commands::run::InitArgs {
                        env_id,
                        fire_id,
                        run_name: name,
                        dt_amount: dt,
                        dt_unit: unit.into(),
                        horizon_steps: horizon,
                        spread_prob: spread,
                    };
                    commands::run::init(&client, args).await?
                }
                RunCommand::Step { run_id } => commands::run::step(&client, &run_id).await?,
                RunCommand::Advance { run_id, n } => {
                    commands::run::advance(&client, &run_id, n).await?
                }
                RunCommand::Latest { run_id } => commands::run::latest(&client, &run_id).await?,
                RunCommand::Meta { run_id } => commands::run::meta(&client, &run_id).await?,
                RunCommand::List => commands::run::list(&client).await?,
                RunCommand::Play { run_id } => {
                    commands::run::play(
                        Arc::new(client),
                        &run_id,
                        config.client.play_interval.as_duration(),
                        config.client.poll_interval.as_duration(),
                    )
                    .await?
                }
                RunCommand::Replay {
                    run_id,
                    from_start,
                    image,
                    out,
                } => {
                    commands::run::replay(
                        &client,
                        &run_id,
                        config.client.play_interval.as_duration(),
                        from_start,
                        &image.into(),
                        out.as_deref(),
                    )
                    .await?
                }
                RunCommand::Frames {
                    run_id,
                    t,
                    image,
                    out,
                } => commands::run::frames(&client, &run_id, t, &image.into(), &out).await?,
            }
        }
        Commands::Preview {
            env_id,
            prior_strength,
            image,
            out,
        } => {
            let client = ApiClient::from_config(&config.client)?;
            commands::preview::run(&client, env_id, prior_strength, image.into(), &out).await?
        }
    }

    Ok(())
}

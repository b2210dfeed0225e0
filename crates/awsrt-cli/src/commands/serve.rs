use awsrt_config::AwsrtConfig;
use awsrt_core::RunEngine;

pub async fn run(
    config: &AwsrtConfig,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut server = config.server.clone();
    if let Some(host) = host {
        server.host = host;
    }
    if let Some(port) = port {
        server.port = port;
    }

    let storage = config.storage.clone();
    let engine = tokio::task::spawn_blocking(move || RunEngine::open(&storage)).await??;

    eprintln!(
        "Starting AWSRT API server on http://{}:{}",
        server.host, server.port
    );
    eprintln!("Endpoints: /health, /manifests/*, /runs/*, /preview/belief.png");

    awsrt_server::serve(engine, &server).await
}

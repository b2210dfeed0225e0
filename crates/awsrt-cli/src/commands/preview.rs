use std::path::Path;

use awsrt_client::ApiClient;
use awsrt_core::api::BeliefPreviewRequest;
use awsrt_core::FieldImageParams;

pub async fn run(
    client: &ApiClient,
    env_id: String,
    prior_strength: f64,
    image: FieldImageParams,
    out: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut req = BeliefPreviewRequest::uniform(env_id);
    req.prior_strength = prior_strength;
    req.image = image;
    let png = client.preview_belief(&req).await?;
    tokio::fs::write(out, &png).await?;
    println!("wrote {} ({} bytes)", out.display(), png.len());
    Ok(())
}

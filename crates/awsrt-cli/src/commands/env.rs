use awsrt_client::ApiClient;
use awsrt_core::api::NewEnvironment;
use awsrt_core::GridSpec;

use super::print_json;

pub struct CreateArgs {
    pub height: u32,
    pub width: u32,
    pub cell_size: f64,
    pub crs_code: String,
    pub seed: i64,
}

pub async fn create(client: &ApiClient, args: CreateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut grid = GridSpec::new(args.height, args.width, args.cell_size);
    grid.crs_code = args.crs_code;
    let req = NewEnvironment {
        grid,
        seed: args.seed,
        terrain_elev_path: None,
        feasibility_mask_path: None,
    };
    print_json(&client.create_environment(&req).await?)
}

pub async fn list(client: &ApiClient) -> Result<(), Box<dyn std::error::Error>> {
    print_json(&client.list_environments().await?)
}

/// Every file in the manifests directory, including ones that are not
/// environments or fires.
pub async fn list_all(client: &ApiClient) -> Result<(), Box<dyn std::error::Error>> {
    print_json(&client.list_manifests().await?)
}

use awsrt_config::AwsrtConfig;

pub fn run(config: &AwsrtConfig) -> Result<(), Box<dyn std::error::Error>> {
    // Print as YAML for readability
    println!("{}", config.to_yaml()?);
    Ok(())
}

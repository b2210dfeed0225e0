pub mod config;
pub mod env;
pub mod fire;
pub mod preview;
pub mod run;
pub mod seed_demo;
pub mod serve;

use serde::Serialize;

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

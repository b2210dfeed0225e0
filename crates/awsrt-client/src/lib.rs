//! Typed client for the AWSRT API, with the playback loop, latest-step
//! poller, and scrub bounds a front-end builds on.

mod client;
mod error;
pub mod forms;
pub mod playback;

pub use client::ApiClient;
pub use error::ClientError;
pub use forms::{clamp_or_center, TimeUnit};
pub use playback::{LatestPoller, PlayOutcome, Player, ReplayCursor, RunApi, Scrubber};

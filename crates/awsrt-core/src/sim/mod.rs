//! Simulation pieces: initial state, belief priors, spread, and step RNG.

mod belief;
mod ignition;
mod rng;
mod spread;

pub use belief::{init_belief, init_belief_with_priors, Prior, UNINFORMED};
pub use ignition::state_from_ignitions;
pub use rng::step_rng;
pub use spread::{step_von_neumann, SpreadModel};

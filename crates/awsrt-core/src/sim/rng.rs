use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Generator for the transition from step `t` to `t + 1` of a run.
///
/// Seeded from BLAKE3 over the run id, both manifest seeds, and `t`, so a
/// replay of the same run reproduces every frame in any process.
pub fn step_rng(run_id: &str, env_seed: i64, fire_seed: i64, t: u32) -> ChaCha8Rng {
    let mut hasher = blake3::Hasher::new();
    hasher.update(run_id.as_bytes());
    hasher.update(&env_seed.to_le_bytes());
    hasher.update(&fire_seed.to_le_bytes());
    hasher.update(&t.to_le_bytes());
    ChaCha8Rng::from_seed(*hasher.finalize().as_bytes())
}

//! Payload fixtures

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// Deterministic bytes whose value depends on their offset
pub fn patterned(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// Reproducible pseudo-random bytes
pub fn random_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = vec![0u8; len];
    rng.fill_bytes(&mut data);
    data
}

/// Object sizes around multiples of `chunk`
pub fn boundary_sizes(chunk: usize) -> Vec<usize> {
    let mut sizes = vec![1, chunk - 1, chunk, chunk + 1, 2 * chunk, 3 * chunk + 7];
    sizes.retain(|&size| size > 0);
    sizes.dedup();
    sizes
}

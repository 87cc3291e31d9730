//! Deterministic RNG hierarchy.
//!
//! A master seed generates deterministic sub-seeds for each `(scope, payload)`
//! pair. Sub-seeds are derived via BLAKE3 hashing, so the same input always
//! draws the same numbers regardless of call order or thread scheduling.

use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RngHierarchy {
    master_seed: u64,
}

impl RngHierarchy {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Derive a deterministic sub-seed for `(scope, payload)`.
    pub fn sub_seed(&self, scope: &str, payload: &[u8]) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(scope.as_bytes());
        hasher.update(payload);
        let hash = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }

    /// Create a seeded StdRng from a sub-seed.
    pub fn rng_for(&self, scope: &str, payload: &[u8]) -> StdRng {
        StdRng::seed_from_u64(self.sub_seed(scope, payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn sub_seeds_are_deterministic() {
        let hierarchy = RngHierarchy::new(42);
        assert_eq!(
            hierarchy.sub_seed("random_walk", b"window-a"),
            hierarchy.sub_seed("random_walk", b"window-a")
        );
    }

    #[test]
    fn different_payloads_different_seeds() {
        let hierarchy = RngHierarchy::new(42);
        assert_ne!(
            hierarchy.sub_seed("random_walk", b"window-a"),
            hierarchy.sub_seed("random_walk", b"window-b")
        );
    }

    #[test]
    fn different_scopes_different_seeds() {
        let hierarchy = RngHierarchy::new(42);
        assert_ne!(
            hierarchy.sub_seed("random_walk", b"x"),
            hierarchy.sub_seed("other", b"x")
        );
    }

    #[test]
    fn different_master_seeds_different_output() {
        assert_ne!(
            RngHierarchy::new(42).sub_seed("random_walk", b"x"),
            RngHierarchy::new(43).sub_seed("random_walk", b"x")
        );
    }

    #[test]
    fn rng_streams_repeat() {
        let hierarchy = RngHierarchy::new(7);
        let a: f64 = hierarchy.rng_for("s", b"p").gen();
        let b: f64 = hierarchy.rng_for("s", b"p").gen();
        assert_eq!(a, b);
    }
}

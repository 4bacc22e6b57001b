use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const JITTER_LOWER_BOUND: f64 = -3.0;
pub const JITTER_UPPER_BOUND: f64 = 3.0;

/// Source of the random offset added to every reported percentage.
///
/// The offset only deters singling out respondents in small cohorts; it
/// gives no formal privacy guarantee.
pub trait NoiseSource {
    /// An offset in `[JITTER_LOWER_BOUND, JITTER_UPPER_BOUND)`.
    fn offset(&mut self) -> f64;
}

/// Uniformly distributed jitter.
#[derive(Debug, Clone)]
pub struct UniformNoise {
    rng: StdRng,
}

impl UniformNoise {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl NoiseSource for UniformNoise {
    fn offset(&mut self) -> f64 {
        self.rng.gen_range(JITTER_LOWER_BOUND..JITTER_UPPER_BOUND)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroNoise;

impl NoiseSource for ZeroNoise {
    fn offset(&mut self) -> f64 {
        0.0
    }
}

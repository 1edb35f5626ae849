//! Deterministic random number generation.
//!
//! RULE: Nothing in the simulation may call any platform RNG.
//! All randomness flows through a `RandomSource` handed to each
//! component when it is constructed.
//!
//! Each component gets its own RNG stream, seeded deterministically
//! from (master_seed XOR slot_index). This means:
//!   - Adding a new component never changes existing components' streams.
//!   - Each component's stream is fully reproducible in isolation.

use rand::{Rng, RngCore, SeedableRng};
use rand_distr::StandardNormal;
use rand_pcg::Pcg64Mcg;

/// The draws every component is allowed to make.
pub trait RandomSource {
    /// Roll a float in [0.0, 1.0).
    fn uniform(&mut self) -> f64;

    /// Roll an integer in [min, max_exclusive).
    fn int_range(&mut self, min: i64, max_exclusive: i64) -> i64;

    /// Draw from a normal distribution.
    fn gaussian(&mut self, mean: f64, sd: f64) -> f64;

    /// Bernoulli trial: returns true with probability p.
    fn chance(&mut self, p: f64) -> bool {
        self.uniform() < p
    }

    /// Pick an index in [0, len). `len` must be non-zero.
    fn index(&mut self, len: usize) -> usize {
        self.int_range(0, len as i64) as usize
    }
}

/// A named, deterministic RNG for a single component.
pub struct SubsystemRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl SubsystemRng {
    /// Create a component RNG from the master seed and a stable
    /// slot index. The index must never change once assigned.
    pub fn new(master_seed: u64, slot_index: u64) -> Self {
        let derived_seed = master_seed ^ (slot_index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Draw a raw u64 (full range).
    pub fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }
}

impl RandomSource for SubsystemRng {
    fn uniform(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    fn int_range(&mut self, min: i64, max_exclusive: i64) -> i64 {
        assert!(min < max_exclusive, "min must be less than max");
        self.inner.gen_range(min..max_exclusive)
    }

    fn gaussian(&mut self, mean: f64, sd: f64) -> f64 {
        let z: f64 = self.inner.sample(StandardNormal);
        mean + sd * z
    }
}

/// All component RNGs for a single run, indexed by stable slot.
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn for_slot(&self, slot: SubsystemSlot) -> SubsystemRng {
        SubsystemRng::new(self.master_seed, slot as u64).with_name(slot.name())
    }
}

/// Stable slot assignments.
/// NEVER reorder or remove entries. Only append.
/// Reordering changes every component's seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum SubsystemSlot {
    Generator = 0,
    Market = 1,
    Demographics = 2,
    Construction = 3,
    Economy = 4,
}

impl SubsystemSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Generator => "generator",
            Self::Market => "market",
            Self::Demographics => "demographics",
            Self::Construction => "construction",
            Self::Economy => "economy",
        }
    }
}

/// Replays fixed sequences of draws, cycling when exhausted.
///
/// Uniform draws come from `uniforms`; `int_range` maps the next uniform
/// onto the range; `gaussian` scales the next standard-normal value from
/// `normals`. Empty sequences yield 0.0.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRng {
    uniforms: Vec<f64>,
    normals: Vec<f64>,
    u_pos: usize,
    n_pos: usize,
}

impl ScriptedRng {
    pub fn new(uniforms: Vec<f64>, normals: Vec<f64>) -> Self {
        Self { uniforms, normals, u_pos: 0, n_pos: 0 }
    }

    /// Every uniform draw returns `u`, every normal draw returns the mean.
    pub fn constant(u: f64) -> Self {
        Self::new(vec![u], vec![0.0])
    }

    fn next_from(values: &[f64], pos: &mut usize) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        let v = values[*pos % values.len()];
        *pos += 1;
        v
    }
}

impl RandomSource for ScriptedRng {
    fn uniform(&mut self) -> f64 {
        Self::next_from(&self.uniforms, &mut self.u_pos).clamp(0.0, 1.0 - f64::EPSILON)
    }

    fn int_range(&mut self, min: i64, max_exclusive: i64) -> i64 {
        assert!(min < max_exclusive, "min must be less than max");
        let span = (max_exclusive - min) as f64;
        let offset = (self.uniform() * span).floor() as i64;
        (min + offset).min(max_exclusive - 1)
    }

    fn gaussian(&mut self, mean: f64, sd: f64) -> f64 {
        mean + sd * Self::next_from(&self.normals, &mut self.n_pos)
    }
}

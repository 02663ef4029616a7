//! # Traits
//!
//! $$
//! \text{Trait contracts: }\mathcal{P}:\text{parameters}\to\text{sample paths}
//! $$
//!
use rayon::prelude::*;

/// Synthetic path generator.
///
/// Seeded processes return the same path on every call to [`ProcessExt::sample`];
/// `sample_par` therefore only makes sense for unseeded ones.
pub trait ProcessExt: Send + Sync {
  type Output: Send;

  fn sample(&self) -> Self::Output;

  fn sample_par(&self, m: usize) -> Vec<Self::Output> {
    (0..m).into_par_iter().map(|_| self.sample()).collect()
  }
}

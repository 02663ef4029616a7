//! # Stochastic Process Simulation Modules
//!
//! Synthetic data generators with known parameters, used to exercise the
//! estimators.
//!
//! | Module             | Description                                                        |
//! |--------------------|--------------------------------------------------------------------|
//! | [`autoregressive`] | GARCH(1,1) returns with standardized Student-t innovations.        |
//! | [`correlation`]    | DCC(1,1) standardized residuals with a prescribed target correlation. |
//!
//! All processes take an optional seed; with `Some(seed)` every call to
//! `sample()` reproduces the same path.

pub mod autoregressive;
pub mod correlation;

use rand::rngs::StdRng;
use rand::SeedableRng;

pub(crate) fn rng_from_seed(seed: Option<u64>) -> StdRng {
  match seed {
    Some(s) => StdRng::seed_from_u64(s),
    None => StdRng::from_entropy(),
  }
}

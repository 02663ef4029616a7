use ndarray::Array1;
use rand::Rng;
use rand_distr::StudentT;

use crate::stochastic::rng_from_seed;
use crate::traits::ProcessExt;

/// GARCH(1,1) with constant mean and standardized Student-t innovations.
///
/// \[
///   r_t = \mu + \varepsilon_t,\quad
///   \varepsilon_t = \sigma_t e_t,\quad
///   \sigma_t^2 = \omega + \alpha\,\varepsilon_{t-1}^2 + \beta\,\sigma_{t-1}^2,
///   \quad e_t \sim t_\nu \sqrt{(\nu-2)/\nu}.
/// \]
///
/// # Parameters
/// - `mu`:    Constant mean.
/// - `omega`: Variance intercept, `> 0`.
/// - `alpha`: Weight of the lagged squared shock.
/// - `beta`:  Weight of the lagged variance.
/// - `nu`:    Degrees of freedom, `> 2` so the innovation variance is one.
/// - `n`:     Length of the series.
/// - `seed`:  Optional RNG seed.
///
/// The variance starts at its unconditional level `omega / (1 - alpha - beta)`.
#[derive(Clone, Debug)]
pub struct GARCH {
  pub mu: f64,
  pub omega: f64,
  pub alpha: f64,
  pub beta: f64,
  pub nu: f64,
  pub n: usize,
  pub seed: Option<u64>,
  innovations: StudentT<f64>,
}

/// Simulated returns with the conditional volatility that generated them.
#[derive(Clone, Debug)]
pub struct GarchPath {
  pub returns: Array1<f64>,
  pub sigma: Array1<f64>,
}

impl GARCH {
  pub fn new(
    mu: f64,
    omega: f64,
    alpha: f64,
    beta: f64,
    nu: f64,
    n: usize,
    seed: Option<u64>,
  ) -> Self {
    assert!(omega > 0.0, "omega must be positive");
    assert!(alpha >= 0.0 && beta >= 0.0, "alpha and beta must be non-negative");
    assert!(alpha + beta < 1.0, "alpha + beta must be below 1");
    assert!(nu > 2.0, "nu must exceed 2");
    let innovations = match StudentT::new(nu) {
      Ok(dist) => dist,
      Err(e) => panic!("invalid degrees of freedom {nu}: {e}"),
    };

    Self {
      mu,
      omega,
      alpha,
      beta,
      nu,
      n,
      seed,
      innovations,
    }
  }
}

impl ProcessExt for GARCH {
  type Output = GarchPath;

  fn sample(&self) -> Self::Output {
    let mut rng = rng_from_seed(self.seed);
    let scale = ((self.nu - 2.0) / self.nu).sqrt();

    let mut returns = Array1::<f64>::zeros(self.n);
    let mut sigma = Array1::<f64>::zeros(self.n);
    let mut sigma2 = self.omega / (1.0 - self.alpha - self.beta);
    let mut eps_prev = 0.0;

    for t in 0..self.n {
      if t > 0 {
        sigma2 = self.omega + self.alpha * eps_prev * eps_prev + self.beta * sigma2;
      }
      let e: f64 = rng.sample(&self.innovations) * scale;
      let eps = sigma2.sqrt() * e;
      sigma[t] = sigma2.sqrt();
      returns[t] = self.mu + eps;
      eps_prev = eps;
    }

    GarchPath { returns, sigma }
  }
}

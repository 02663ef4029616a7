use ndarray::Array1;
use ndarray::Array2;
use rand::Rng;
use rand_distr::StandardNormal;

use crate::dcc::recursion::normalize;
use crate::dcc::recursion::update_q;
use crate::dcc::recursion::DccParams;
use crate::linalg::cholesky_lower;
use crate::stochastic::rng_from_seed;
use crate::traits::ProcessExt;

/// DCC(1,1) standardized residuals.
///
/// \[
///   Q_t = (1-a-b)\,\bar Q + a\,z_{t-1}z_{t-1}^\top + b\,Q_{t-1},\quad
///   R_t = \operatorname{diag}(Q_t)^{-1/2} Q_t \operatorname{diag}(Q_t)^{-1/2},\quad
///   z_t = \operatorname{chol}(R_t)\,e_t .
/// \]
///
/// # Parameters
/// - `a`, `b`: Correlation dynamics, `a, b >= 0`, `a + b < 1`.
/// - `qbar`:   Target (unconditional) covariance, symmetric positive definite.
/// - `n`:      Number of time steps.
/// - `seed`:   Optional RNG seed.
#[derive(Clone, Debug)]
pub struct DccProcess {
  pub a: f64,
  pub b: f64,
  pub qbar: Array2<f64>,
  pub n: usize,
  pub seed: Option<u64>,
}

impl DccProcess {
  pub fn new(a: f64, b: f64, qbar: Array2<f64>, n: usize, seed: Option<u64>) -> Self {
    assert!(
      DccParams::new(a, b).is_admissible(),
      "DCC constraints violated: a>=0, b>=0, a+b<1"
    );
    assert!(qbar.is_square(), "qbar must be square");
    assert!(
      cholesky_lower(&qbar).is_some(),
      "qbar must be positive definite"
    );

    Self { a, b, qbar, n, seed }
  }
}

impl ProcessExt for DccProcess {
  type Output = Array2<f64>;

  fn sample(&self) -> Self::Output {
    let mut rng = rng_from_seed(self.seed);
    let params = DccParams::new(self.a, self.b);
    let dim = self.qbar.nrows();

    let mut z = Array2::<f64>::zeros((self.n, dim));
    let mut q = self.qbar.clone();
    for t in 0..self.n {
      if t > 0 {
        q = update_q(&self.qbar, &q, z.row(t - 1), params);
      }
      let r = normalize(&q);
      // a convex mix of a PD matrix and PSD outer products stays PD
      let l = cholesky_lower(&r).unwrap_or_else(|| Array2::eye(dim));
      let e = Array1::from_shape_fn(dim, |_| rng.sample::<f64, _>(StandardNormal));
      z.row_mut(t).assign(&l.dot(&e));
    }

    z
  }
}

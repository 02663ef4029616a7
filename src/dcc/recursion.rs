//! # DCC Recursion
//!
//! $$
//! Q_t=(1-a-b)\bar Q+a\,z_{t-1}z_{t-1}^\top+b\,Q_{t-1},\qquad
//! R_t=D_t^{-1}Q_tD_t^{-1},\ D_t=\operatorname{diag}(Q_t)^{1/2}
//! $$
//!
use ndarray::Array2;
use ndarray::Array3;
use ndarray::ArrayView1;
use ndarray::ArrayView2;
use ndarray::Axis;

use crate::error::DccError;
use crate::error::Result;
use crate::linalg::population_covariance;

/// Correlation dynamics parameters `(a, b)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DccParams {
  /// Weight of the lagged residual outer product.
  pub a: f64,
  /// Weight of the lagged conditional covariance.
  pub b: f64,
}

impl DccParams {
  pub fn new(a: f64, b: f64) -> Self {
    Self { a, b }
  }

  /// `a + b`, the mean-reversion health indicator.
  pub fn persistence(&self) -> f64 {
    self.a + self.b
  }

  /// `a >= 0, b >= 0, a + b < 1`, all finite.
  pub fn is_admissible(&self) -> bool {
    self.a.is_finite()
      && self.b.is_finite()
      && self.a >= 0.0
      && self.b >= 0.0
      && self.persistence() < 1.0
  }

  pub fn validate(&self) -> Result<()> {
    if self.is_admissible() {
      Ok(())
    } else {
      Err(DccError::ConstraintViolation {
        a: self.a,
        b: self.b,
      })
    }
  }
}

/// One step of the covariance recursion.
pub fn update_q(
  qbar: &Array2<f64>,
  q_prev: &Array2<f64>,
  z_prev: ArrayView1<f64>,
  params: DccParams,
) -> Array2<f64> {
  let n = z_prev.len();
  let outer = Array2::from_shape_fn((n, n), |(i, j)| z_prev[i] * z_prev[j]);
  qbar * (1.0 - params.a - params.b) + outer * params.a + q_prev * params.b
}

/// Rescale `q` to unit diagonal, then symmetrize and pin the diagonal to 1.
pub fn normalize(q: &Array2<f64>) -> Array2<f64> {
  let d = q.diag().mapv(f64::sqrt);
  let n = d.len();
  let r = Array2::from_shape_fn((n, n), |(i, j)| q[[i, j]] / (d[i] * d[j]));

  let mut sym = (&r + &r.t()) * 0.5;
  sym.diag_mut().fill(1.0);
  sym
}

/// Residual matrix paired with its unconditional covariance.
///
/// `Qbar` is computed once in [`DccRecursion::new`] and only read afterwards;
/// every path restarts from it.
#[derive(Clone, Debug)]
pub struct DccRecursion<'a> {
  z: ArrayView2<'a, f64>,
  qbar: Array2<f64>,
}

impl<'a> DccRecursion<'a> {
  /// `z` is `T x N` standardized residuals, `T >= 2`, `N >= 1`, all finite.
  pub fn new(z: ArrayView2<'a, f64>) -> Result<Self> {
    if z.nrows() < 2 || z.ncols() == 0 {
      return Err(DccError::InvalidInput(format!(
        "residual matrix must be at least 2 x 1, got {} x {}",
        z.nrows(),
        z.ncols()
      )));
    }
    if z.iter().any(|v| !v.is_finite()) {
      return Err(DccError::InvalidInput(
        "residual matrix contains non-finite values".into(),
      ));
    }

    let qbar = population_covariance(z);
    Ok(Self { z, qbar })
  }

  pub fn qbar(&self) -> &Array2<f64> {
    &self.qbar
  }

  pub fn z(&self) -> ArrayView2<'a, f64> {
    self.z
  }

  pub fn n_obs(&self) -> usize {
    self.z.nrows()
  }

  pub fn n_assets(&self) -> usize {
    self.z.ncols()
  }

  /// Lazily evaluated `R_1, ..., R_T`.
  pub fn path(&self, params: DccParams) -> Result<CorrelationPath<'_>> {
    params.validate()?;
    Ok(CorrelationPath {
      qbar: &self.qbar,
      z: self.z.view(),
      params,
      q: None,
      t: 0,
    })
  }

  /// Full `T x N x N` correlation tensor.
  pub fn correlations(&self, params: DccParams) -> Result<Array3<f64>> {
    let n = self.n_assets();
    let mut out = Array3::zeros((self.n_obs(), n, n));
    for (t, r) in self.path(params)?.enumerate() {
      out.index_axis_mut(Axis(0), t).assign(&r);
    }
    Ok(out)
  }
}

/// Iterator over the correlation matrices of one recursion pass.
pub struct CorrelationPath<'r> {
  qbar: &'r Array2<f64>,
  z: ArrayView2<'r, f64>,
  params: DccParams,
  q: Option<Array2<f64>>,
  t: usize,
}

impl Iterator for CorrelationPath<'_> {
  type Item = Array2<f64>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.t >= self.z.nrows() {
      return None;
    }

    let q = match self.q.take() {
      None => self.qbar.clone(),
      Some(prev) => update_q(self.qbar, &prev, self.z.row(self.t - 1), self.params),
    };
    let r = normalize(&q);
    self.q = Some(q);
    self.t += 1;
    Some(r)
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    let left = self.z.nrows() - self.t;
    (left, Some(left))
  }
}

impl ExactSizeIterator for CorrelationPath<'_> {}

/// Correlation tensor for `(a, b)` over `z`.
///
/// The parameter check runs before `Qbar` is formed, so an inadmissible pair
/// never costs a recursion pass.
pub fn dcc_recursion(z: ArrayView2<f64>, a: f64, b: f64) -> Result<Array3<f64>> {
  let params = DccParams::new(a, b);
  params.validate()?;
  DccRecursion::new(z)?.correlations(params)
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use ndarray::array;
  use ndarray::Array2;
  use rand::rngs::StdRng;
  use rand::Rng;
  use rand::SeedableRng;
  use rand_distr::StandardNormal;

  use super::*;

  fn noise(t: usize, n: usize, seed: u64) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array2::from_shape_fn((t, n), |_| rng.sample::<f64, _>(StandardNormal))
  }

  #[test]
  fn correlations_have_unit_diagonal_and_are_symmetric() {
    let z = noise(300, 4, 7);
    for &(a, b) in &[(0.0, 0.0), (0.05, 0.9), (0.2, 0.79), (0.0, 0.99), (0.5, 0.0)] {
      let r = dcc_recursion(z.view(), a, b).unwrap();
      assert_eq!(r.shape(), &[300, 4, 4]);
      for rt in r.outer_iter() {
        for i in 0..4 {
          assert_eq!(rt[[i, i]], 1.0);
          for j in 0..4 {
            assert_abs_diff_eq!(rt[[i, j]], rt[[j, i]], epsilon = 1e-8);
          }
        }
      }
    }
  }

  #[test]
  fn inadmissible_parameters_are_rejected() {
    let z = noise(50, 2, 1);
    for &(a, b) in &[(-0.01, 0.5), (0.1, -0.2), (0.5, 0.5), (0.3, 0.8), (f64::NAN, 0.1)] {
      let err = dcc_recursion(z.view(), a, b).unwrap_err();
      assert!(matches!(err, DccError::ConstraintViolation { .. }));
    }
  }

  #[test]
  fn constraint_check_precedes_input_validation() {
    let z = Array2::<f64>::zeros((1, 2));
    let err = dcc_recursion(z.view(), 0.6, 0.6).unwrap_err();
    assert!(matches!(err, DccError::ConstraintViolation { .. }));
  }

  #[test]
  fn repeated_calls_are_bit_identical() {
    let z = noise(200, 3, 11);
    let r1 = dcc_recursion(z.view(), 0.03, 0.95).unwrap();
    let r2 = dcc_recursion(z.view(), 0.03, 0.95).unwrap();
    assert!(r1.iter().zip(r2.iter()).all(|(x, y)| x.to_bits() == y.to_bits()));
  }

  #[test]
  fn zero_dynamics_reproduce_normalized_qbar() {
    let z = noise(120, 3, 3);
    let rec = DccRecursion::new(z.view()).unwrap();
    let target = normalize(rec.qbar());
    let r = rec.correlations(DccParams::new(0.0, 0.0)).unwrap();
    for rt in r.outer_iter() {
      for (x, y) in rt.iter().zip(target.iter()) {
        assert_abs_diff_eq!(*x, *y, epsilon = 1e-12);
      }
    }
  }

  #[test]
  fn first_step_starts_from_qbar() {
    let z = noise(40, 2, 5);
    let rec = DccRecursion::new(z.view()).unwrap();
    let first = rec.path(DccParams::new(0.1, 0.8)).unwrap().next().unwrap();
    let expected = normalize(rec.qbar());
    assert_abs_diff_eq!(first[[0, 1]], expected[[0, 1]], epsilon = 0.0);
  }

  #[test]
  fn update_q_matches_hand_computation() {
    let qbar = array![[1.0, 0.5], [0.5, 1.0]];
    let q_prev = array![[2.0, 0.0], [0.0, 2.0]];
    let z_prev = array![1.0, -2.0];
    let q = update_q(&qbar, &q_prev, z_prev.view(), DccParams::new(0.1, 0.6));
    // 0.3 * qbar + 0.1 * zz' + 0.6 * q_prev
    assert_abs_diff_eq!(q[[0, 0]], 0.3 + 0.1 + 1.2, epsilon = 1e-12);
    assert_abs_diff_eq!(q[[1, 1]], 0.3 + 0.4 + 1.2, epsilon = 1e-12);
    assert_abs_diff_eq!(q[[0, 1]], 0.15 - 0.2, epsilon = 1e-12);
    assert_abs_diff_eq!(q[[1, 0]], q[[0, 1]], epsilon = 0.0);
  }

  #[test]
  fn normalize_pins_diagonal() {
    let q = array![[4.0, 1.0], [1.0, 9.0]];
    let r = normalize(&q);
    assert_eq!(r[[0, 0]], 1.0);
    assert_eq!(r[[1, 1]], 1.0);
    assert_abs_diff_eq!(r[[0, 1]], 1.0 / 6.0, epsilon = 1e-15);
  }

  #[test]
  fn path_is_exact_size() {
    let z = noise(25, 2, 9);
    let rec = DccRecursion::new(z.view()).unwrap();
    let path = rec.path(DccParams::new(0.02, 0.9)).unwrap();
    assert_eq!(path.len(), 25);
    assert_eq!(path.count(), 25);
  }

  #[test]
  fn rejects_non_finite_residuals() {
    let mut z = noise(10, 2, 2);
    z[[3, 1]] = f64::INFINITY;
    assert!(matches!(
      DccRecursion::new(z.view()),
      Err(DccError::InvalidInput(_))
    ));
  }
}

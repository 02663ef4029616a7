//! # Linalg
//!
//! $$
//! \bar Q=\frac1T\sum_{t=1}^T (z_t-\bar z)(z_t-\bar z)^\top,\qquad
//! \log|R|=\sum_i \log|u_{ii}|
//! $$
//!
//! Small dense helpers shared by the recursion, the likelihood and the
//! simulators. Storage is `ndarray`; factorizations go through `nalgebra`.
use nalgebra::DMatrix;
use nalgebra::DVector;
use nalgebra::LU;
use nalgebra::Dyn;
use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView1;
use ndarray::ArrayView2;
use ndarray::Axis;

/// Population covariance (divisor `T`) of the columns of `x` (`T x N`).
pub fn population_covariance(x: ArrayView2<f64>) -> Array2<f64> {
  let t = x.nrows();
  let n = x.ncols();
  if t == 0 {
    return Array2::zeros((n, n));
  }

  let mean = x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(n));
  let centered = &x - &mean;
  centered.t().dot(&centered) / t as f64
}

pub fn to_dmatrix(m: &Array2<f64>) -> DMatrix<f64> {
  DMatrix::from_fn(m.nrows(), m.ncols(), |i, j| m[[i, j]])
}

pub fn from_dmatrix(m: &DMatrix<f64>) -> Array2<f64> {
  Array2::from_shape_fn((m.nrows(), m.ncols()), |(i, j)| m[(i, j)])
}

/// LU factorization of a square matrix with `slogdet`-style accessors.
pub struct Factorized {
  lu: LU<f64, Dyn, Dyn>,
  sign: f64,
  log_abs_det: f64,
}

impl Factorized {
  pub fn new(m: &Array2<f64>) -> Self {
    let lu = to_dmatrix(m).lu();
    let u = lu.u();

    let mut sign = lu.p().determinant::<f64>();
    let mut log_abs_det = 0.0;
    for i in 0..u.nrows() {
      let d = u[(i, i)];
      if d == 0.0 || d.is_nan() {
        return Self {
          lu,
          sign: 0.0,
          log_abs_det: f64::NEG_INFINITY,
        };
      }
      sign *= d.signum();
      log_abs_det += d.abs().ln();
    }

    Self {
      lu,
      sign,
      log_abs_det,
    }
  }

  /// Sign of the determinant: `1`, `-1`, or `0` for a singular matrix.
  pub fn sign(&self) -> f64 {
    self.sign
  }

  pub fn log_abs_det(&self) -> f64 {
    self.log_abs_det
  }

  /// `x` with `M x = b`, `None` when the system is singular.
  pub fn solve(&self, b: ArrayView1<f64>) -> Option<Array1<f64>> {
    let rhs = DVector::from_iterator(b.len(), b.iter().copied());
    self
      .lu
      .solve(&rhs)
      .map(|x| Array1::from_iter(x.iter().copied()))
  }

  /// Quadratic form `b' M^{-1} b`.
  pub fn quad_form(&self, b: ArrayView1<f64>) -> Option<f64> {
    self.solve(b).map(|x| b.dot(&x))
  }
}

/// Lower Cholesky factor, `None` if `m` is not positive definite.
pub fn cholesky_lower(m: &Array2<f64>) -> Option<Array2<f64>> {
  to_dmatrix(m).cholesky().map(|c| from_dmatrix(&c.l()))
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use ndarray::array;

  use super::*;

  #[test]
  fn population_covariance_uses_t_divisor() {
    let x = array![[1.0, 2.0], [3.0, 6.0], [5.0, 10.0]];
    let cov = population_covariance(x.view());
    // var(1,3,5) with divisor 3
    assert_abs_diff_eq!(cov[[0, 0]], 8.0 / 3.0, epsilon = 1e-12);
    assert_abs_diff_eq!(cov[[1, 1]], 32.0 / 3.0, epsilon = 1e-12);
    assert_abs_diff_eq!(cov[[0, 1]], 16.0 / 3.0, epsilon = 1e-12);
    assert_abs_diff_eq!(cov[[0, 1]], cov[[1, 0]], epsilon = 0.0);
  }

  #[test]
  fn slogdet_matches_closed_form() {
    let m = array![[1.0, 0.3], [0.3, 1.0]];
    let f = Factorized::new(&m);
    assert_eq!(f.sign(), 1.0);
    assert_abs_diff_eq!(f.log_abs_det(), (1.0f64 - 0.09).ln(), epsilon = 1e-12);
  }

  #[test]
  fn slogdet_detects_negative_determinant() {
    let m = array![[1.0, 2.0], [2.0, 1.0]];
    let f = Factorized::new(&m);
    assert_eq!(f.sign(), -1.0);
    assert_abs_diff_eq!(f.log_abs_det(), 3.0f64.ln(), epsilon = 1e-12);
  }

  #[test]
  fn singular_matrix_has_zero_sign() {
    let m = array![[1.0, 1.0], [1.0, 1.0]];
    let f = Factorized::new(&m);
    assert_eq!(f.sign(), 0.0);
    assert!(f.log_abs_det().is_infinite());
  }

  #[test]
  fn quad_form_matches_inverse() {
    let m = array![[2.0, 0.0], [0.0, 4.0]];
    let f = Factorized::new(&m);
    let b = array![2.0, 2.0];
    assert_abs_diff_eq!(f.quad_form(b.view()).unwrap(), 2.0 + 1.0, epsilon = 1e-12);
  }

  #[test]
  fn cholesky_rejects_indefinite() {
    assert!(cholesky_lower(&array![[1.0, 2.0], [2.0, 1.0]]).is_none());
    let l = cholesky_lower(&array![[4.0, 2.0], [2.0, 2.0]]).unwrap();
    assert_abs_diff_eq!(l[[0, 0]], 2.0, epsilon = 1e-12);
    assert_abs_diff_eq!(l[[1, 0]], 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(l[[0, 1]], 0.0, epsilon = 1e-12);
  }
}

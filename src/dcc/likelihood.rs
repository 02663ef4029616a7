//! # DCC Likelihood
//!
//! $$
//! -\ell_C(a,b)=\frac12\sum_{t=1}^T\left(\log|R_t|+z_t^\top R_t^{-1}z_t\right)
//! $$
//!
//! Infeasible or degenerate evaluations are reported as [`Objective::Infeasible`]
//! and collapse to a finite sentinel when handed to a solver.
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use argmin::core::CostFunction;
use ndarray::ArrayView2;

use super::recursion::DccParams;
use super::recursion::DccRecursion;
use crate::error::DccError;
use crate::error::Result;
use crate::linalg::Factorized;

/// Sentinel returned for inadmissible or degenerate `(a, b)`.
pub const DEFAULT_PENALTY: f64 = 1e12;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Infeasibility {
  /// Outside `a >= 0, b >= 0, a + b < 1` (or a solver-side box).
  Constraint,
  /// `R_t` has non-positive determinant sign or a non-finite log-determinant.
  Degenerate { t: usize },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Objective {
  Finite(f64),
  Infeasible(Infeasibility),
}

impl Objective {
  /// Plain number for the optimizer.
  pub fn value(self, penalty: f64) -> f64 {
    match self {
      Objective::Finite(v) => v,
      Objective::Infeasible(_) => penalty,
    }
  }

  pub fn is_finite_score(&self) -> bool {
    matches!(self, Objective::Finite(_))
  }
}

/// Classify `(a, b)` against the residuals held by `recursion`.
pub fn evaluate(recursion: &DccRecursion<'_>, params: DccParams) -> Objective {
  let path = match recursion.path(params) {
    Ok(path) => path,
    Err(_) => return Objective::Infeasible(Infeasibility::Constraint),
  };

  let z = recursion.z();
  let mut total = 0.0;
  for (t, r) in path.enumerate() {
    let factor = Factorized::new(&r);
    let log_det = factor.log_abs_det();
    if factor.sign() <= 0.0 || !log_det.is_finite() {
      return Objective::Infeasible(Infeasibility::Degenerate { t });
    }

    let quad = match factor.quad_form(z.row(t)) {
      Some(q) if q.is_finite() => q,
      _ => return Objective::Infeasible(Infeasibility::Degenerate { t }),
    };
    total += 0.5 * (log_det + quad);
  }

  if total.is_finite() {
    Objective::Finite(total)
  } else {
    Objective::Infeasible(Infeasibility::Degenerate {
      t: recursion.n_obs() - 1,
    })
  }
}

/// Negative log-likelihood of `(a, b)` for `z`, or `penalty` when infeasible.
///
/// Never fails: malformed residuals also map to `penalty`.
pub fn dcc_neg_log_likelihood(params: DccParams, z: ArrayView2<f64>, penalty: f64) -> f64 {
  if !params.is_admissible() {
    return penalty;
  }
  match DccRecursion::new(z) {
    Ok(recursion) => evaluate(&recursion, params).value(penalty),
    Err(_) => penalty,
  }
}

/// Evaluation counters shared by the solver-facing objectives.
#[derive(Debug, Default)]
pub struct EvalCounters {
  evaluations: AtomicU64,
  penalized: AtomicU64,
  non_finite: AtomicU64,
}

impl EvalCounters {
  pub(crate) fn record(&self, value: f64, penalized: bool) {
    self.evaluations.fetch_add(1, Ordering::Relaxed);
    if penalized {
      self.penalized.fetch_add(1, Ordering::Relaxed);
    }
    if !value.is_finite() {
      self.non_finite.fetch_add(1, Ordering::Relaxed);
    }
  }

  pub fn evaluations(&self) -> u64 {
    self.evaluations.load(Ordering::Relaxed)
  }

  pub fn penalized(&self) -> u64 {
    self.penalized.load(Ordering::Relaxed)
  }

  /// Values that would have reached the solver as NaN or infinity.
  pub fn non_finite(&self) -> u64 {
    self.non_finite.load(Ordering::Relaxed)
  }
}

/// Solver-facing likelihood over a fixed residual matrix.
#[derive(Debug)]
pub struct DccObjective<'a> {
  recursion: DccRecursion<'a>,
  penalty: f64,
  counters: EvalCounters,
}

impl<'a> DccObjective<'a> {
  pub fn new(z: ArrayView2<'a, f64>, penalty: f64) -> Result<Self> {
    if !penalty.is_finite() {
      return Err(DccError::InvalidInput(format!(
        "penalty must be finite, got {penalty}"
      )));
    }
    Ok(Self {
      recursion: DccRecursion::new(z)?,
      penalty,
      counters: EvalCounters::default(),
    })
  }

  pub fn recursion(&self) -> &DccRecursion<'a> {
    &self.recursion
  }

  pub fn penalty(&self) -> f64 {
    self.penalty
  }

  pub fn counters(&self) -> &EvalCounters {
    &self.counters
  }

  pub fn evaluate(&self, params: DccParams) -> Objective {
    evaluate(&self.recursion, params)
  }

  /// Counted evaluation, penalty substituted for infeasible points.
  pub fn cost_at(&self, params: DccParams) -> f64 {
    let objective = self.evaluate(params);
    let value = objective.value(self.penalty);
    self.counters.record(value, !objective.is_finite_score());
    value
  }

  /// Record a probe rejected before reaching the likelihood.
  pub(crate) fn reject(&self) -> f64 {
    self.counters.record(self.penalty, true);
    self.penalty
  }
}

impl CostFunction for DccObjective<'_> {
  type Param = Vec<f64>;
  type Output = f64;

  fn cost(&self, x: &Self::Param) -> std::result::Result<Self::Output, argmin::core::Error> {
    match x.as_slice() {
      [a, b] => Ok(self.cost_at(DccParams::new(*a, *b))),
      _ => Err(
        DccError::InvalidInput(format!("expected 2 parameters, got {}", x.len())).into(),
      ),
    }
  }
}

//! # DCC Estimator
//!
//! $$
//! (\hat a,\hat b)=\arg\min_{a,b}\ -\ell_C(a,b)\quad\text{s.t.}\quad
//! 0\le a,b\le 1-\varepsilon,\ a+b\le 1-\varepsilon
//! $$
//!
//! Local Nelder–Mead search in unconstrained coordinates `(u, v)` with
//! `a + b = (1 - eps) * logistic(u)` and `a / (a + b) = logistic(v)`, so both
//! box bounds and the stationarity inequality hold at every probe and the
//! simplex can slide along the `a = 0` and `b = 0` edges. Any probe that
//! still lands outside the region (rounding at the edges) is answered with
//! the likelihood sentinel. Only a local optimum is returned; the outcome
//! depends on the initial guess and tolerances.
use argmin::core::CostFunction;
use argmin::core::Executor;
use argmin::core::State;
use argmin::core::TerminationReason;
use argmin::core::TerminationStatus;
use argmin::solver::neldermead::NelderMead;
use ndarray::Array3;
use ndarray::ArrayView2;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::likelihood::DccObjective;
use super::likelihood::Infeasibility;
use super::likelihood::Objective;
use super::likelihood::DEFAULT_PENALTY;
use super::recursion::DccParams;
use crate::error::DccError;
use crate::error::Result;
use crate::transforms::logistic;
use crate::transforms::logit;

#[derive(Clone, Debug)]
pub struct EstimatorOptions {
  /// Upper bound on Nelder–Mead iterations.
  pub max_iters: u64,
  /// Standard deviation of the simplex cost values at which the search stops.
  pub tolerance: f64,
  /// Stationarity margin: `a + b <= 1 - epsilon`.
  pub epsilon: f64,
  /// Sentinel objective for infeasible probes.
  pub penalty: f64,
  /// Edge length of the initial simplex in the unconstrained coordinates.
  pub simplex_step: f64,
}

impl Default for EstimatorOptions {
  fn default() -> Self {
    Self {
      max_iters: 2000,
      tolerance: 1e-9,
      epsilon: 1e-6,
      penalty: DEFAULT_PENALTY,
      simplex_step: 0.5,
    }
  }
}

impl EstimatorOptions {
  fn validate(&self) -> Result<()> {
    if self.max_iters == 0 {
      return Err(DccError::InvalidInput("max_iters must be positive".into()));
    }
    if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
      return Err(DccError::InvalidInput(format!(
        "tolerance must be positive and finite, got {}",
        self.tolerance
      )));
    }
    if !(self.epsilon > 0.0 && self.epsilon < 0.5) {
      return Err(DccError::InvalidInput(format!(
        "epsilon must lie in (0, 0.5), got {}",
        self.epsilon
      )));
    }
    if !(self.simplex_step > 0.0 && self.simplex_step <= 5.0) {
      return Err(DccError::InvalidInput(format!(
        "simplex_step must lie in (0, 5], got {}",
        self.simplex_step
      )));
    }
    Ok(())
  }
}

/// `0 <= a, b <= 1 - eps`, `a + b <= 1 - eps`.
#[derive(Clone, Copy, Debug)]
pub struct FeasibleRegion {
  pub epsilon: f64,
}

impl FeasibleRegion {
  pub fn upper(&self) -> f64 {
    1.0 - self.epsilon
  }

  pub fn contains(&self, params: DccParams) -> bool {
    let hi = self.upper();
    params.a.is_finite()
      && params.b.is_finite()
      && (0.0..=hi).contains(&params.a)
      && (0.0..=hi).contains(&params.b)
      && params.persistence() <= hi
  }

  /// `(u, v) -> (a, b)`; lands in the region for every finite input.
  pub fn to_params(&self, x: &[f64]) -> DccParams {
    let p = self.upper() * logistic(x[0]);
    let a = p * logistic(x[1]);
    DccParams::new(a, p - a)
  }

  /// Inverse of [`FeasibleRegion::to_params`]. Points on or outside the
  /// boundary are clamped just inside it first.
  pub fn to_unconstrained(&self, params: DccParams) -> [f64; 2] {
    let hi = self.upper();
    let a = params.a.clamp(0.0, hi);
    let b = params.b.clamp(0.0, hi);
    let p = a + b;
    let level = (p / hi).clamp(EDGE, 1.0 - EDGE);
    let share = if p > 0.0 { a / p } else { 0.5 };
    [logit(level), logit(share.clamp(EDGE, 1.0 - EDGE))]
  }
}

const EDGE: f64 = 1e-6;

/// Non-degenerate simplex in `(u, v)` with its first vertex at `x0`.
fn initial_simplex(x0: DccParams, region: FeasibleRegion, step: f64) -> Vec<Vec<f64>> {
  let [u, v] = region.to_unconstrained(x0);
  vec![vec![u, v], vec![u + step, v], vec![u, v + step]]
}

/// Objective restricted to the solver's feasible region.
struct ConstrainedObjective<'o, 'a> {
  objective: &'o DccObjective<'a>,
  region: FeasibleRegion,
}

impl ConstrainedObjective<'_, '_> {
  fn cost_at(&self, params: DccParams) -> f64 {
    if self.region.contains(params) {
      self.objective.cost_at(params)
    } else {
      self.objective.reject()
    }
  }
}

impl CostFunction for ConstrainedObjective<'_, '_> {
  type Param = Vec<f64>;
  type Output = f64;

  /// `x = [u, v]`, mapped through [`FeasibleRegion::to_params`].
  fn cost(&self, x: &Self::Param) -> std::result::Result<Self::Output, argmin::core::Error> {
    match x.as_slice() {
      [u, v] if u.is_finite() && v.is_finite() => {
        Ok(self.cost_at(self.region.to_params(&[*u, *v])))
      }
      [_, _] => Ok(self.objective.reject()),
      _ => Err(
        DccError::InvalidInput(format!("expected 2 parameters, got {}", x.len())).into(),
      ),
    }
  }
}

#[derive(Clone, Debug)]
pub struct FitDiagnostics {
  pub success: bool,
  pub message: String,
  pub iterations: u64,
  pub evaluations: u64,
  /// Probes answered with the sentinel penalty.
  pub penalized_evaluations: u64,
  /// Probes whose objective would have been NaN or infinite.
  pub non_finite_evaluations: u64,
}

#[derive(Clone, Debug)]
pub struct FitResult {
  pub params: DccParams,
  /// `T x N x N` correlations at the optimum.
  pub correlations: Array3<f64>,
  pub neg_log_likelihood: f64,
  pub diagnostics: FitDiagnostics,
}

impl FitResult {
  pub fn a(&self) -> f64 {
    self.params.a
  }

  pub fn b(&self) -> f64 {
    self.params.b
  }

  pub fn persistence(&self) -> f64 {
    self.params.persistence()
  }
}

#[derive(Clone, Debug, Default)]
pub struct DccEstimator {
  pub options: EstimatorOptions,
}

impl DccEstimator {
  pub fn new(options: EstimatorOptions) -> Self {
    Self { options }
  }

  pub fn region(&self) -> FeasibleRegion {
    FeasibleRegion {
      epsilon: self.options.epsilon,
    }
  }

  pub fn fit(&self, z: ArrayView2<f64>, initial: DccParams) -> Result<FitResult> {
    self.options.validate()?;
    if !(initial.a.is_finite() && initial.b.is_finite()) {
      return Err(DccError::InvalidInput(format!(
        "initial guess must be finite, got a={}, b={}",
        initial.a, initial.b
      )));
    }

    let objective = DccObjective::new(z, self.options.penalty)?;
    let region = self.region();
    if !region.contains(initial) {
      warn!(
        a0 = initial.a,
        b0 = initial.b,
        "initial guess outside the feasible region, pulling it inside"
      );
    }

    let simplex = initial_simplex(initial, region, self.options.simplex_step);
    debug!(?simplex, "initial simplex");
    info!(
      n_obs = z.nrows(),
      n_assets = z.ncols(),
      a0 = initial.a,
      b0 = initial.b,
      "starting DCC likelihood search"
    );

    let solver = NelderMead::new(simplex)
      .with_sd_tolerance(self.options.tolerance)
      .map_err(|e| DccError::FitFailure {
        message: e.to_string(),
      })?;
    let problem = ConstrainedObjective {
      objective: &objective,
      region,
    };
    let max_iters = self.options.max_iters;
    let res = Executor::new(problem, solver)
      .configure(|state| state.max_iters(max_iters))
      .run()
      .map_err(|e| DccError::FitFailure {
        message: e.to_string(),
      })?;

    let state = res.state();
    let (success, message) = match state.get_termination_status() {
      TerminationStatus::Terminated(TerminationReason::SolverConverged) => {
        (true, "Optimization terminated successfully".to_string())
      }
      TerminationStatus::Terminated(reason) => (false, format!("{reason:?}")),
      TerminationStatus::NotTerminated => (false, "Solver did not terminate".to_string()),
    };

    let counters = objective.counters();
    let diagnostics = FitDiagnostics {
      success,
      message,
      iterations: state.get_iter(),
      evaluations: counters.evaluations(),
      penalized_evaluations: counters.penalized(),
      non_finite_evaluations: counters.non_finite(),
    };
    debug!(?diagnostics, "solver finished");

    if !diagnostics.success {
      warn!(reason = %diagnostics.message, "DCC search did not converge");
      return Err(DccError::FitFailure {
        message: diagnostics.message,
      });
    }

    let best = match state.get_best_param() {
      Some(x) if x.len() == 2 => region.to_params(x),
      _ => {
        return Err(DccError::FitFailure {
          message: "solver returned no parameters".into(),
        })
      }
    };

    let neg_log_likelihood = match objective.evaluate(best) {
      Objective::Finite(v) if region.contains(best) => v,
      Objective::Finite(_) | Objective::Infeasible(Infeasibility::Constraint) => {
        return Err(DccError::FitFailure {
          message: format!(
            "optimum a={}, b={} lies outside the admissible region",
            best.a, best.b
          ),
        })
      }
      Objective::Infeasible(Infeasibility::Degenerate { t }) => {
        return Err(DccError::NumericInstability {
          t,
          reason: format!(
            "correlation matrix not positive definite at optimum a={}, b={}",
            best.a, best.b
          ),
        })
      }
    };

    let correlations = objective.recursion().correlations(best)?;
    info!(
      a = best.a,
      b = best.b,
      persistence = best.persistence(),
      neg_log_likelihood,
      iterations = diagnostics.iterations,
      "DCC MLE converged"
    );

    Ok(FitResult {
      params: best,
      correlations,
      neg_log_likelihood,
      diagnostics,
    })
  }
}

/// Fit `(a, b)` from residuals `z` starting at `(a0, b0)`.
pub fn fit_dcc_mle(
  z: ArrayView2<f64>,
  a0: f64,
  b0: f64,
  options: EstimatorOptions,
) -> Result<FitResult> {
  DccEstimator::new(options).fit(z, DccParams::new(a0, b0))
}

//! # GARCH(1,1)-t
//!
//! $$
//! \sigma_t^2=\omega+\alpha\,\varepsilon_{t-1}^2+\beta\,\sigma_{t-1}^2,\qquad
//! \ell_t=\log\frac{\Gamma(\frac{\nu+1}{2})}{\Gamma(\frac\nu2)\sqrt{\pi(\nu-2)\sigma_t^2}}
//!   -\frac{\nu+1}{2}\log\!\Big(1+\frac{\varepsilon_t^2}{(\nu-2)\sigma_t^2}\Big)
//! $$
//!
use std::f64::consts::PI;

use argmin::core::CostFunction;
use argmin::core::Executor;
use argmin::core::State;
use argmin::core::TerminationReason;
use argmin::core::TerminationStatus;
use argmin::solver::neldermead::NelderMead;
use impl_new_derive::ImplNew;
use ndarray::Array1;
use ndarray::ArrayView1;
use statrs::function::gamma::ln_gamma;
use tracing::debug;
use tracing::warn;

use crate::error::DccError;
use crate::error::Result;
use crate::transforms::logistic;
use crate::transforms::logit;

const BACKCAST_DECAY: f64 = 0.94;
const BACKCAST_WINDOW: usize = 75;
const NU_FLOOR: f64 = 2.05;
const PERSISTENCE_CAP: f64 = 0.9999;
const COST_CEILING: f64 = 1e12;

/// Constant mean, variance recursion and tail parameters.
#[derive(ImplNew, Clone, Copy, Debug, PartialEq)]
pub struct GarchParams {
  pub mu: f64,
  pub omega: f64,
  pub alpha: f64,
  pub beta: f64,
  pub nu: f64,
}

impl GarchParams {
  pub fn persistence(&self) -> f64 {
    self.alpha + self.beta
  }

  /// Map an unconstrained vector onto admissible parameters.
  ///
  /// `x = [mu, ln omega, logit(p / cap), logit(alpha / p), ln(nu - 2.05)]`.
  fn from_unconstrained(x: &[f64]) -> Self {
    let p = PERSISTENCE_CAP * logistic(x[2]);
    let share = logistic(x[3]);
    Self {
      mu: x[0],
      omega: x[1].exp(),
      alpha: p * share,
      beta: p * (1.0 - share),
      nu: NU_FLOOR + x[4].exp(),
    }
  }

  fn to_unconstrained(&self) -> Vec<f64> {
    let p = self.persistence();
    vec![
      self.mu,
      self.omega.ln(),
      logit(p / PERSISTENCE_CAP),
      logit(self.alpha / p),
      (self.nu - NU_FLOOR).ln(),
    ]
  }
}

/// Exponentially weighted mean of the first squared residuals.
pub fn backcast(resid: ArrayView1<f64>) -> f64 {
  let tau = resid.len().min(BACKCAST_WINDOW);
  let (num, den) = resid
    .iter()
    .take(tau)
    .enumerate()
    .fold((0.0, 0.0), |(num, den), (i, e)| {
      let w = BACKCAST_DECAY.powi(i as i32);
      (num + w * e * e, den + w)
    });
  if den > 0.0 {
    num / den
  } else {
    0.0
  }
}

/// `sigma_t^2` for residuals `resid`, started at `sigma2_0`.
pub fn conditional_variance(
  resid: ArrayView1<f64>,
  omega: f64,
  alpha: f64,
  beta: f64,
  sigma2_0: f64,
) -> Array1<f64> {
  let mut sigma2 = Array1::<f64>::zeros(resid.len());
  let mut prev_var = sigma2_0;
  let mut prev_eps2 = sigma2_0;
  for (t, e) in resid.iter().enumerate() {
    let v = omega + alpha * prev_eps2 + beta * prev_var;
    sigma2[t] = v;
    prev_var = v;
    prev_eps2 = e * e;
  }
  sigma2
}

/// Log-likelihood of `returns` under standardized Student-t innovations.
pub fn garch_t_log_likelihood(returns: ArrayView1<f64>, params: &GarchParams) -> f64 {
  let resid = returns.mapv(|r| r - params.mu);
  let sigma2 = conditional_variance(
    resid.view(),
    params.omega,
    params.alpha,
    params.beta,
    backcast(resid.view()),
  );

  let nu = params.nu;
  let c = ln_gamma(0.5 * (nu + 1.0)) - ln_gamma(0.5 * nu) - 0.5 * (PI * (nu - 2.0)).ln();
  resid
    .iter()
    .zip(sigma2.iter())
    .map(|(e, s2)| c - 0.5 * s2.ln() - 0.5 * (nu + 1.0) * (1.0 + e * e / (s2 * (nu - 2.0))).ln())
    .sum()
}

#[derive(Clone, Debug)]
pub struct GarchOptions {
  pub max_iters: u64,
  /// Standard deviation of the simplex cost values at which the search stops.
  pub sd_tolerance: f64,
}

impl Default for GarchOptions {
  fn default() -> Self {
    Self {
      max_iters: 10_000,
      sd_tolerance: 1e-8,
    }
  }
}

/// Fitted filter for one asset.
#[derive(Clone, Debug)]
pub struct GarchFit {
  pub params: GarchParams,
  /// Conditional volatility `sigma_t`.
  pub sigma: Array1<f64>,
  /// `(r_t - mu) / sigma_t`.
  pub std_resid: Array1<f64>,
  pub log_likelihood: f64,
  pub iterations: u64,
}

struct GarchProblem<'a> {
  returns: ArrayView1<'a, f64>,
}

impl CostFunction for GarchProblem<'_> {
  type Param = Vec<f64>;
  type Output = f64;

  fn cost(&self, x: &Self::Param) -> std::result::Result<Self::Output, argmin::core::Error> {
    if x.len() != 5 {
      return Err(DccError::InvalidInput(format!("expected 5 parameters, got {}", x.len())).into());
    }
    let params = GarchParams::from_unconstrained(x);
    let nll = -garch_t_log_likelihood(self.returns, &params);
    Ok(if nll.is_finite() { nll } else { COST_CEILING })
  }
}

#[derive(Clone, Debug, Default)]
pub struct GarchFilter {
  pub options: GarchOptions,
}

impl GarchFilter {
  pub fn new(options: GarchOptions) -> Self {
    Self { options }
  }

  /// Moment-based starting point: `alpha = 0.1`, `beta = 0.85`, `nu = 8`.
  fn starting_values(returns: ArrayView1<f64>) -> GarchParams {
    let mu = returns.mean().unwrap_or(0.0);
    let var = returns.mapv(|r| (r - mu).powi(2)).mean().unwrap_or(1.0);
    GarchParams::new(mu, (var * 0.05).max(1e-8), 0.1, 0.85, 8.0)
  }

  fn simplex(x0: Vec<f64>, returns: ArrayView1<f64>) -> Vec<Vec<f64>> {
    let scale = returns.std(0.0).max(1e-4);
    let steps = [0.1 * scale, 0.5, 0.5, 0.5, 0.5];
    let mut vertices = vec![x0.clone()];
    for (i, step) in steps.iter().enumerate() {
      let mut v = x0.clone();
      v[i] += step;
      vertices.push(v);
    }
    vertices
  }

  pub fn fit(&self, asset: &str, returns: ArrayView1<f64>) -> Result<GarchFit> {
    let convergence = |message: String| DccError::Convergence {
      asset: asset.to_string(),
      message,
    };

    if returns.len() < 10 {
      return Err(DccError::InvalidInput(format!(
        "{asset}: need at least 10 returns, got {}",
        returns.len()
      )));
    }
    if returns.iter().any(|r| !r.is_finite()) {
      return Err(DccError::InvalidInput(format!(
        "{asset}: returns contain non-finite values"
      )));
    }

    let x0 = Self::starting_values(returns).to_unconstrained();
    let solver = NelderMead::new(Self::simplex(x0, returns))
      .with_sd_tolerance(self.options.sd_tolerance)
      .map_err(|e| convergence(e.to_string()))?;
    let max_iters = self.options.max_iters;
    let res = Executor::new(GarchProblem { returns }, solver)
      .configure(|state| state.max_iters(max_iters))
      .run()
      .map_err(|e| convergence(e.to_string()))?;

    let state = res.state();
    let iterations = state.get_iter();
    match state.get_termination_status() {
      TerminationStatus::Terminated(TerminationReason::SolverConverged) => {}
      TerminationStatus::Terminated(reason) => {
        warn!(asset, ?reason, iterations, "GARCH fit did not converge");
        return Err(convergence(format!("{reason:?}")));
      }
      TerminationStatus::NotTerminated => {
        return Err(convergence("solver did not terminate".into()));
      }
    }

    let params = match state.get_best_param() {
      Some(x) => GarchParams::from_unconstrained(x),
      None => return Err(convergence("solver returned no parameters".into())),
    };
    let log_likelihood = garch_t_log_likelihood(returns, &params);
    if !log_likelihood.is_finite() {
      return Err(convergence("non-finite log-likelihood at the optimum".into()));
    }

    let resid = returns.mapv(|r| r - params.mu);
    let sigma = conditional_variance(
      resid.view(),
      params.omega,
      params.alpha,
      params.beta,
      backcast(resid.view()),
    )
    .mapv(f64::sqrt);
    let std_resid = &resid / &sigma;

    debug!(
      asset,
      mu = params.mu,
      omega = params.omega,
      alpha = params.alpha,
      beta = params.beta,
      nu = params.nu,
      log_likelihood,
      iterations,
      "GARCH-t fit"
    );

    Ok(GarchFit {
      params,
      sigma,
      std_resid,
      log_likelihood,
      iterations,
    })
  }
}

/// Fit one asset with default options.
pub fn fit_garch_t(asset: &str, returns: ArrayView1<f64>) -> Result<GarchFit> {
  GarchFilter::default().fit(asset, returns)
}

//! # DCC
//!
//! $$
//! z_t\mid\mathcal F_{t-1}\sim(0,R_t),\qquad
//! Q_t=(1-a-b)\bar Q+a\,z_{t-1}z_{t-1}^\top+b\,Q_{t-1}
//! $$
//!
//! Second stage of the two-stage DCC-GARCH estimator. Volatility and
//! correlation parameters are fitted separately; the residuals fed in here
//! come from [`crate::volatility`].
//!
//! | Module | Description |
//! |---|---|
//! | [`recursion`] | `Q_t`/`R_t` recursion over standardized residuals |
//! | [`likelihood`] | correlation-only negative log-likelihood with sentinel on infeasibility |
//! | [`estimator`] | constrained Nelder–Mead search over `(a, b)` |
//! | [`pair`] | one pairwise correlation path out of the fitted tensor |
pub mod estimator;
pub mod likelihood;
pub mod pair;
pub mod recursion;

pub use estimator::fit_dcc_mle;
pub use estimator::DccEstimator;
pub use estimator::EstimatorOptions;
pub use estimator::FitDiagnostics;
pub use estimator::FitResult;
pub use likelihood::dcc_neg_log_likelihood;
pub use likelihood::DccObjective;
pub use likelihood::Objective;
pub use pair::extract_pair;
pub use recursion::dcc_recursion;
pub use recursion::DccParams;
pub use recursion::DccRecursion;

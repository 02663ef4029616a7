//! # Autoregressive
//!
//! $$
//! X_t = f(X_{t-1}, X_{t-2}, \ldots, \varepsilon_t, \varepsilon_{t-1}, \ldots)
//! $$
//!
pub mod garch;

#[cfg(test)]
mod tests {
  use super::garch::GARCH;
  use crate::traits::ProcessExt;

  #[test]
  fn garch_rejects_non_stationary_parameters() {
    let result = std::panic::catch_unwind(|| GARCH::new(0.0, 0.05, 0.7, 0.4, 6.0, 128, None));
    assert!(result.is_err());
  }

  #[test]
  fn garch_rejects_infinite_variance_innovations() {
    let result = std::panic::catch_unwind(|| GARCH::new(0.0, 0.05, 0.1, 0.8, 2.0, 128, None));
    assert!(result.is_err());
  }

  #[test]
  fn garch_valid_parameters_produce_finite_sample() {
    let model = GARCH::new(0.05, 0.05, 0.08, 0.9, 6.0, 256, Some(1));
    let path = model.sample();
    assert_eq!(path.returns.len(), 256);
    assert_eq!(path.sigma.len(), 256);
    assert!(path.returns.iter().all(|x| x.is_finite()));
    assert!(path.sigma.iter().all(|s| *s > 0.0));
  }

  #[test]
  fn seeded_garch_is_reproducible() {
    let model = GARCH::new(0.0, 0.05, 0.08, 0.9, 6.0, 64, Some(9));
    assert_eq!(model.sample().returns, model.sample().returns);
  }

  #[test]
  fn unseeded_garch_batches_in_parallel() {
    let model = GARCH::new(0.0, 0.05, 0.08, 0.9, 6.0, 32, None);
    let paths = model.sample_par(4);
    assert_eq!(paths.len(), 4);
    assert!(paths.iter().all(|p| p.returns.len() == 32));
  }
}

//! # Error
//!
//! $$
//! \text{fit}:(z,a_0,b_0)\to\text{FitResult}\ \cup\ \text{DccError}
//! $$
//!
use thiserror::Error;

/// Error taxonomy of the estimation core.
#[derive(Error, Debug)]
pub enum DccError {
  /// `(a, b)` outside the stationarity region `a >= 0, b >= 0, a + b < 1`.
  #[error("DCC constraints violated: a={a}, b={b} (need a>=0, b>=0, a+b<1)")]
  ConstraintViolation { a: f64, b: f64 },

  /// Correlation matrix at step `t` failed the sign / log-determinant check.
  #[error("numerically degenerate correlation matrix at t={t}: {reason}")]
  NumericInstability { t: usize, reason: String },

  /// Univariate volatility fit for `asset` did not converge.
  #[error("volatility fit for {asset} did not converge: {message}")]
  Convergence { asset: String, message: String },

  /// The correlation parameter search reported non-success.
  #[error("DCC MLE failed: {message}")]
  FitFailure { message: String },

  /// Requested asset identifier is not among the fitted assets.
  #[error("asset not found: {0}")]
  KeyNotFound(String),

  #[error("invalid input: {0}")]
  InvalidInput(String),

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("parse error on line {line}: {message}")]
  Parse { line: usize, message: String },
}

pub type Result<T> = std::result::Result<T, DccError>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn constraint_violation_message_names_parameters() {
    let err = DccError::ConstraintViolation { a: 0.6, b: 0.5 };
    let msg = err.to_string();
    assert!(msg.contains("a=0.6"));
    assert!(msg.contains("b=0.5"));
  }

  #[test]
  fn fit_failure_propagates_solver_message() {
    let err = DccError::FitFailure {
      message: "Maximum number of iterations reached".into(),
    };
    assert_eq!(
      err.to_string(),
      "DCC MLE failed: Maximum number of iterations reached"
    );
  }

  #[test]
  fn io_errors_convert() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.csv");
    let err: DccError = io.into();
    assert!(matches!(err, DccError::Io(_)));
  }
}

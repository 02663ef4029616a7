//! # Config
//!
//! Run configuration for the two-stage pipeline. [`DccConfig::default`] is the
//! reference run; the binary overrides individual fields from the command line.
use chrono::NaiveDate;

use crate::dcc::recursion::DccParams;
use crate::dcc::EstimatorOptions;
use crate::error::DccError;
use crate::error::Result;
use crate::volatility::GarchOptions;

#[derive(Clone, Debug)]
pub struct DccConfig {
  pub tickers: Vec<String>,
  /// First date kept (inclusive).
  pub start: NaiveDate,
  /// Last date kept (exclusive).
  pub end: NaiveDate,
  /// Multiplier on log-returns, `100.0` for percent.
  pub scale: f64,
  pub initial: DccParams,
  pub garch: GarchOptions,
  pub estimator: EstimatorOptions,
  /// Fit the per-asset filters on the rayon pool.
  pub parallel: bool,
  /// Pair to extract; the first two tickers when `None`.
  pub pair: Option<(String, String)>,
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}

impl Default for DccConfig {
  fn default() -> Self {
    Self {
      tickers: vec!["AAPL".to_string(), "NVDA".to_string()],
      start: ymd(2020, 1, 1),
      end: ymd(2024, 6, 1),
      scale: 100.0,
      initial: DccParams::new(0.02, 0.97),
      garch: GarchOptions::default(),
      estimator: EstimatorOptions::default(),
      parallel: true,
      pair: None,
    }
  }
}

impl DccConfig {
  pub fn with_tickers<S: Into<String>>(mut self, tickers: impl IntoIterator<Item = S>) -> Self {
    self.tickers = tickers.into_iter().map(Into::into).collect();
    self
  }

  pub fn with_window(mut self, start: NaiveDate, end: NaiveDate) -> Self {
    self.start = start;
    self.end = end;
    self
  }

  pub fn with_scale(mut self, scale: f64) -> Self {
    self.scale = scale;
    self
  }

  pub fn with_initial(mut self, a0: f64, b0: f64) -> Self {
    self.initial = DccParams::new(a0, b0);
    self
  }

  pub fn with_garch(mut self, garch: GarchOptions) -> Self {
    self.garch = garch;
    self
  }

  pub fn with_estimator(mut self, estimator: EstimatorOptions) -> Self {
    self.estimator = estimator;
    self
  }

  pub fn with_parallel(mut self, parallel: bool) -> Self {
    self.parallel = parallel;
    self
  }

  pub fn with_pair(mut self, x: impl Into<String>, y: impl Into<String>) -> Self {
    self.pair = Some((x.into(), y.into()));
    self
  }

  /// Requested pair, defaulting to the first two tickers.
  pub fn pair(&self) -> Result<(String, String)> {
    match (&self.pair, self.tickers.as_slice()) {
      (Some(pair), _) => Ok(pair.clone()),
      (None, [x, y, ..]) => Ok((x.clone(), y.clone())),
      (None, _) => Err(DccError::InvalidInput(
        "need at least two tickers to pick a default pair".into(),
      )),
    }
  }

  pub fn validate(&self) -> Result<()> {
    if self.tickers.is_empty() {
      return Err(DccError::InvalidInput("no tickers configured".into()));
    }
    if self.start >= self.end {
      return Err(DccError::InvalidInput(format!(
        "empty date window {}..{}",
        self.start, self.end
      )));
    }
    if !(self.scale.is_finite() && self.scale > 0.0) {
      return Err(DccError::InvalidInput(format!(
        "scale must be positive, got {}",
        self.scale
      )));
    }
    self.pair().map(|_| ())
  }
}

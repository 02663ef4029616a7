//! # Pipeline
//!
//! Prices to scaled returns, per-asset GARCH-t filters, DCC likelihood search
//! and the requested pair correlation.
use anyhow::Context;
use chrono::NaiveDate;
use ndarray::Array1;
use ndarray::Array2;
use tracing::info;
use tracing::info_span;

use crate::config::DccConfig;
use crate::data::PricePanel;
use crate::data::ReturnPanel;
use crate::dcc::extract_pair;
use crate::dcc::DccEstimator;
use crate::dcc::FitResult;
use crate::volatility::GarchFilter;
use crate::volatility::VolatilityPanel;

/// Everything a reporting layer needs, keyed by the return dates.
#[derive(Clone, Debug)]
pub struct DccReport {
  pub index: Vec<NaiveDate>,
  pub tickers: Vec<String>,
  /// `T x N` scaled log-returns.
  pub returns: Array2<f64>,
  /// `T x N` conditional volatilities.
  pub sigmas: Array2<f64>,
  pub fit: FitResult,
  pub pair: (String, String),
  pub pair_correlation: Array1<f64>,
}

impl DccReport {
  pub fn summary(&self) -> String {
    format!(
      "DCC MLE params: a={:.6}, b={:.6}, a+b={:.6}",
      self.fit.a(),
      self.fit.b(),
      self.fit.persistence()
    )
  }
}

pub fn run(config: &DccConfig, prices: &PricePanel) -> anyhow::Result<DccReport> {
  config.validate()?;
  let pair = config.pair()?;

  let prices = prices
    .select(config.tickers.as_slice())
    .context("selecting configured tickers")?
    .window(config.start, config.end);
  let returns = ReturnPanel::from_prices(&prices, config.scale)
    .with_context(|| format!("computing returns for {}..{}", config.start, config.end))?;
  info!(
    n_obs = returns.len(),
    first = %returns.dates()[0],
    last = %returns.dates()[returns.len() - 1],
    "return panel ready"
  );

  let volatility = {
    let _span = info_span!("volatility").entered();
    VolatilityPanel::fit(
      returns.tickers(),
      returns.returns().view(),
      &GarchFilter::new(config.garch.clone()),
      config.parallel,
    )?
  };
  let z = volatility
    .residuals()
    .context("volatility stage did not produce residuals for every asset")?;
  let sigmas = volatility.sigmas()?;

  let fit = {
    let _span = info_span!("dcc").entered();
    DccEstimator::new(config.estimator.clone()).fit(z.view(), config.initial)?
  };

  let pair_correlation = extract_pair(
    &fit.correlations,
    returns.tickers(),
    (pair.0.as_str(), pair.1.as_str()),
  )?;

  let report = DccReport {
    index: returns.dates().to_vec(),
    tickers: returns.tickers().to_vec(),
    returns: returns.returns().clone(),
    sigmas,
    fit,
    pair,
    pair_correlation,
  };
  info!("{}", report.summary());
  Ok(report)
}

#[cfg(test)]
mod tests {
  use chrono::Duration;
  use ndarray::array;
  use tracing_test::traced_test;

  use super::*;
  use crate::stochastic::autoregressive::garch::GARCH;
  use crate::stochastic::correlation::dcc::DccProcess;
  use crate::traits::ProcessExt;

  /// Prices with GARCH volatility per asset and DCC-correlated shocks.
  fn synthetic_prices(n: usize) -> PricePanel {
    let z = DccProcess::new(0.04, 0.93, array![[1.0, 0.5], [0.5, 1.0]], n, Some(77)).sample();
    let s1 = GARCH::new(0.0, 0.05, 0.08, 0.9, 8.0, n, Some(1)).sample().sigma;
    let s2 = GARCH::new(0.0, 0.1, 0.1, 0.85, 8.0, n, Some(2)).sample().sigma;
    let mut prices = Array2::<f64>::zeros((n + 1, 2));
    prices.row_mut(0).fill(100.0);
    for t in 0..n {
      let r = array![s1[t] * z[[t, 0]], s2[t] * z[[t, 1]]];
      let next = &prices.row(t) * &r.mapv(|x| (0.01 * x).exp());
      prices.row_mut(t + 1).assign(&next);
    }
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let dates = (0..=n as i64).map(|i| start + Duration::days(i)).collect();
    PricePanel::new(dates, vec!["AAPL".into(), "NVDA".into()], prices).unwrap()
  }

  #[test]
  #[traced_test]
  fn end_to_end_run_produces_a_report() {
    let prices = synthetic_prices(1200);
    let config = DccConfig::default().with_window(
      NaiveDate::from_ymd_opt(2019, 1, 1).unwrap(),
      NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
    );
    let report = run(&config, &prices).unwrap();

    assert_eq!(report.index.len(), 1200);
    assert_eq!(report.returns.shape(), &[1200, 2]);
    assert_eq!(report.sigmas.shape(), &[1200, 2]);
    assert_eq!(report.pair_correlation.len(), 1200);
    assert!(report.fit.persistence() < 1.0);
    assert!(report.fit.diagnostics.success);
    assert!(report.summary().starts_with("DCC MLE params: a="));
    assert!(report
      .pair_correlation
      .iter()
      .all(|r| (-1.0..=1.0).contains(r)));
    assert!(report.pair_correlation.mean().unwrap() > 0.3);
    assert!(logs_contain("return panel ready"));
  }

  #[test]
  fn unknown_ticker_fails_the_run() {
    let prices = synthetic_prices(50);
    let config = DccConfig::default().with_tickers(["AAPL", "TSLA"]);
    let err = run(&config, &prices).unwrap_err();
    assert!(format!("{err:#}").contains("TSLA"));
  }

  #[test]
  fn empty_window_fails_the_run() {
    let prices = synthetic_prices(50);
    let config = DccConfig::default().with_window(
      NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
      NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
    );
    assert!(run(&config, &prices).is_err());
  }
}

use std::collections::BTreeMap;

use ndarray::Array2;
use ndarray::ArrayView2;
use ndarray::Axis;
use rayon::prelude::*;
use tracing::info;
use tracing::warn;

use super::garch_t::GarchFilter;
use super::garch_t::GarchFit;
use crate::error::DccError;
use crate::error::Result;

/// Per-asset volatility fits, built once and read-only afterwards.
///
/// A failed asset is recorded in [`VolatilityPanel::failures`] and never stops
/// the other fits.
#[derive(Debug)]
pub struct VolatilityPanel {
  tickers: Vec<String>,
  fits: BTreeMap<String, GarchFit>,
  failures: BTreeMap<String, DccError>,
}

impl VolatilityPanel {
  /// `returns` is `T x N` with columns in `tickers` order.
  pub fn fit(
    tickers: &[String],
    returns: ArrayView2<f64>,
    filter: &GarchFilter,
    parallel: bool,
  ) -> Result<Self> {
    if tickers.len() != returns.ncols() {
      return Err(DccError::InvalidInput(format!(
        "{} tickers for {} return columns",
        tickers.len(),
        returns.ncols()
      )));
    }

    let fit_one = |(ticker, column): (&String, ndarray::ArrayView1<f64>)| {
      (ticker.clone(), filter.fit(ticker, column))
    };
    let outcomes: Vec<(String, Result<GarchFit>)> = if parallel {
      tickers
        .par_iter()
        .zip(returns.axis_iter(Axis(1)).into_par_iter())
        .map(fit_one)
        .collect()
    } else {
      tickers
        .iter()
        .zip(returns.axis_iter(Axis(1)))
        .map(fit_one)
        .collect()
    };

    let mut fits = BTreeMap::new();
    let mut failures = BTreeMap::new();
    for (ticker, outcome) in outcomes {
      match outcome {
        Ok(fit) => {
          fits.insert(ticker, fit);
        }
        Err(err) => {
          warn!(ticker = %ticker, error = %err, "volatility fit failed");
          failures.insert(ticker, err);
        }
      }
    }
    info!(
      fitted = fits.len(),
      failed = failures.len(),
      "volatility stage finished"
    );

    Ok(Self {
      tickers: tickers.to_vec(),
      fits,
      failures,
    })
  }

  pub fn tickers(&self) -> &[String] {
    &self.tickers
  }

  pub fn fits(&self) -> &BTreeMap<String, GarchFit> {
    &self.fits
  }

  pub fn failures(&self) -> &BTreeMap<String, DccError> {
    &self.failures
  }

  pub fn is_complete(&self) -> bool {
    self.failures.is_empty()
  }

  pub fn get(&self, ticker: &str) -> Result<&GarchFit> {
    self
      .fits
      .get(ticker)
      .ok_or_else(|| DccError::KeyNotFound(ticker.to_string()))
  }

  fn stack(&self, column: impl Fn(&GarchFit) -> ndarray::ArrayView1<f64>) -> Result<Array2<f64>> {
    if let Some((_, err)) = self
      .tickers
      .iter()
      .find_map(|t| self.failures.get_key_value(t))
    {
      return Err(match err {
        DccError::Convergence { asset, message } => DccError::Convergence {
          asset: asset.clone(),
          message: message.clone(),
        },
        other => DccError::InvalidInput(other.to_string()),
      });
    }

    let columns = self
      .tickers
      .iter()
      .map(|t| self.get(t).map(&column))
      .collect::<Result<Vec<_>>>()?;
    ndarray::stack(Axis(1), &columns).map_err(|e| DccError::InvalidInput(e.to_string()))
  }

  /// `T x N` standardized residuals in ticker order.
  pub fn residuals(&self) -> Result<Array2<f64>> {
    self.stack(|f| f.std_resid.view())
  }

  /// `T x N` conditional volatilities in ticker order.
  pub fn sigmas(&self) -> Result<Array2<f64>> {
    self.stack(|f| f.sigma.view())
  }
}

#[cfg(test)]
mod tests {
  use ndarray::Array1;

  use super::*;
  use crate::stochastic::autoregressive::garch::GARCH;
  use crate::traits::ProcessExt;
  use crate::volatility::GarchOptions;

  fn panel_returns(t: usize) -> Array2<f64> {
    let a = GARCH::new(0.0, 0.05, 0.08, 0.9, 7.0, t, Some(1)).sample().returns;
    let b = GARCH::new(0.02, 0.1, 0.1, 0.85, 6.0, t, Some(2)).sample().returns;
    ndarray::stack(Axis(1), &[a.view(), b.view()]).unwrap()
  }

  fn tickers() -> Vec<String> {
    vec!["AAPL".to_string(), "NVDA".to_string()]
  }

  #[test]
  fn parallel_and_serial_fits_agree() {
    let r = panel_returns(800);
    let filter = GarchFilter::default();
    let par = VolatilityPanel::fit(&tickers(), r.view(), &filter, true).unwrap();
    let ser = VolatilityPanel::fit(&tickers(), r.view(), &filter, false).unwrap();
    assert!(par.is_complete());
    assert_eq!(par.residuals().unwrap(), ser.residuals().unwrap());
    assert_eq!(par.sigmas().unwrap().shape(), &[800, 2]);
  }

  #[test]
  fn one_failed_asset_does_not_abort_the_others() {
    let mut r = panel_returns(400);
    r.column_mut(1).assign(&Array1::from_elem(400, f64::NAN));
    let panel =
      VolatilityPanel::fit(&tickers(), r.view(), &GarchFilter::default(), true).unwrap();

    assert!(panel.get("AAPL").is_ok());
    assert!(panel.failures().contains_key("NVDA"));
    assert!(panel.residuals().is_err());
  }

  #[test]
  fn residuals_surface_the_first_convergence_error() {
    let r = panel_returns(300);
    let filter = GarchFilter::new(GarchOptions {
      max_iters: 1,
      sd_tolerance: 1e-12,
    });
    let panel = VolatilityPanel::fit(&tickers(), r.view(), &filter, false).unwrap();
    match panel.residuals() {
      Err(DccError::Convergence { asset, .. }) => assert_eq!(asset, "AAPL"),
      other => panic!("expected convergence error, got {other:?}"),
    }
  }

  #[test]
  fn unknown_ticker_is_key_not_found() {
    let r = panel_returns(300);
    let panel =
      VolatilityPanel::fit(&tickers(), r.view(), &GarchFilter::default(), false).unwrap();
    assert!(matches!(panel.get("TSLA"), Err(DccError::KeyNotFound(_))));
  }

  #[test]
  fn column_count_must_match_tickers() {
    let r = panel_returns(50);
    let err = VolatilityPanel::fit(&tickers()[..1], r.view(), &GarchFilter::default(), false)
      .unwrap_err();
    assert!(matches!(err, DccError::InvalidInput(_)));
  }
}

//! # Pair Extractor
//!
//! $$
//! \rho^{(X,Y)}_t=R_t[i_X,i_Y],\qquad t=1,\dots,T
//! $$
//!
use ndarray::s;
use ndarray::Array1;
use ndarray::Array3;

use crate::error::DccError;
use crate::error::Result;

/// Position of `id` in `assets`.
pub fn asset_position<S: AsRef<str>>(assets: &[S], id: &str) -> Result<usize> {
  assets
    .iter()
    .position(|a| a.as_ref() == id)
    .ok_or_else(|| DccError::KeyNotFound(id.to_string()))
}

/// Correlation path of `pair` from a `T x N x N` tensor whose asset axes follow `assets`.
pub fn extract_pair<S: AsRef<str>>(
  correlations: &Array3<f64>,
  assets: &[S],
  pair: (&str, &str),
) -> Result<Array1<f64>> {
  let (_, n1, n2) = correlations.dim();
  if n1 != assets.len() || n2 != assets.len() {
    return Err(DccError::InvalidInput(format!(
      "tensor is {n1} x {n2} per step but {} assets were given",
      assets.len()
    )));
  }

  let i = asset_position(assets, pair.0)?;
  let j = asset_position(assets, pair.1)?;
  Ok(correlations.slice(s![.., i, j]).to_owned())
}

#[cfg(test)]
mod tests {
  use ndarray::Array3;

  use super::*;
  use crate::dcc::recursion::dcc_recursion;
  use crate::stochastic::correlation::dcc::DccProcess;
  use crate::traits::ProcessExt;

  fn tickers() -> Vec<String> {
    vec!["AAPL".into(), "NVDA".into(), "MSFT".into()]
  }

  fn tensor() -> Array3<f64> {
    let qbar = ndarray::array![[1.0, 0.5, 0.2], [0.5, 1.0, 0.3], [0.2, 0.3, 1.0]];
    let z = DccProcess::new(0.05, 0.9, qbar, 250, Some(17)).sample();
    dcc_recursion(z.view(), 0.05, 0.9).unwrap()
  }

  #[test]
  fn extraction_is_symmetric() {
    let r = tensor();
    let xy = extract_pair(&r, &tickers(), ("AAPL", "MSFT")).unwrap();
    let yx = extract_pair(&r, &tickers(), ("MSFT", "AAPL")).unwrap();
    assert_eq!(xy.len(), 250);
    assert_eq!(xy, yx);
  }

  #[test]
  fn extraction_reads_the_requested_entry() {
    let r = tensor();
    let path = extract_pair(&r, &tickers(), ("NVDA", "MSFT")).unwrap();
    for t in [0, 10, 249] {
      assert_eq!(path[t], r[[t, 1, 2]]);
    }
  }

  #[test]
  fn self_pair_is_identically_one() {
    let r = tensor();
    let path = extract_pair(&r, &tickers(), ("NVDA", "NVDA")).unwrap();
    assert!(path.iter().all(|&v| v == 1.0));
  }

  #[test]
  fn unknown_asset_is_key_not_found() {
    let r = tensor();
    match extract_pair(&r, &tickers(), ("AAPL", "TSLA")) {
      Err(DccError::KeyNotFound(id)) => assert_eq!(id, "TSLA"),
      other => panic!("expected KeyNotFound, got {other:?}"),
    }
  }

  #[test]
  fn mismatched_asset_list_is_rejected() {
    let r = tensor();
    let short = vec!["AAPL", "NVDA"];
    assert!(matches!(
      extract_pair(&r, &short, ("AAPL", "NVDA")),
      Err(DccError::InvalidInput(_))
    ));
  }
}

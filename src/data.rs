//! # Data
//!
//! $$
//! r_{t,i}=s\cdot\ln\frac{p_{t,i}}{p_{t-1,i}}
//! $$
//!
//! Price panels read from a plain `date,<ticker>...` CSV and the scaled
//! log-returns handed to the volatility stage. Rows with a missing or
//! non-positive price are dropped so every column shares one dense index.
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use ndarray::Array2;
use ndarray::Axis;
use tracing::debug;
use tracing::info;

use crate::error::DccError;
use crate::error::Result;

/// Close prices, `T x N`, strictly increasing dates.
#[derive(Clone, Debug)]
pub struct PricePanel {
  dates: Vec<NaiveDate>,
  tickers: Vec<String>,
  prices: Array2<f64>,
}

impl PricePanel {
  pub fn new(dates: Vec<NaiveDate>, tickers: Vec<String>, prices: Array2<f64>) -> Result<Self> {
    if prices.dim() != (dates.len(), tickers.len()) {
      return Err(DccError::InvalidInput(format!(
        "price matrix is {:?}, expected ({}, {})",
        prices.dim(),
        dates.len(),
        tickers.len()
      )));
    }
    if dates.windows(2).any(|w| w[0] >= w[1]) {
      return Err(DccError::InvalidInput(
        "dates must be strictly increasing".into(),
      ));
    }
    Ok(Self {
      dates,
      tickers,
      prices,
    })
  }

  pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
    let file = File::open(path.as_ref())?;
    Self::from_csv_reader(file)
  }

  /// Header `date,<ticker>...`; quoted fields and thousands separators are accepted.
  pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
    let mut rdr = csv::ReaderBuilder::new()
      .has_headers(true)
      .flexible(true)
      .trim(csv::Trim::All)
      .from_reader(reader);

    let headers = rdr.headers().map_err(csv_error)?.clone();
    let mut columns = headers.iter();
    match columns.next() {
      Some(first) if first.eq_ignore_ascii_case("date") => {}
      _ => {
        return Err(DccError::Parse {
          line: 1,
          message: "first column must be `date`".into(),
        })
      }
    }
    let tickers: Vec<String> = columns.map(str::to_string).collect();
    if tickers.is_empty() {
      return Err(DccError::Parse {
        line: 1,
        message: "no ticker columns".into(),
      });
    }

    let mut dates = Vec::new();
    let mut values = Vec::new();
    let mut dropped = 0usize;
    for record in rdr.records() {
      let record = record.map_err(csv_error)?;
      let line_no = record.position().map_or(0, |p| p.line() as usize);

      let date = record.get(0).unwrap_or_default();
      let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|e| DccError::Parse {
        line: line_no,
        message: format!("bad date {date:?}: {e}"),
      })?;

      let row: Vec<Option<f64>> = record
        .iter()
        .skip(1)
        .map(|f| {
          f.replace(',', "")
            .parse::<f64>()
            .ok()
            .filter(|p| p.is_finite() && *p > 0.0)
        })
        .collect();
      if row.len() != tickers.len() {
        return Err(DccError::Parse {
          line: line_no,
          message: format!("expected {} prices, got {}", tickers.len(), row.len()),
        });
      }

      match row.into_iter().collect::<Option<Vec<f64>>>() {
        Some(row) => {
          dates.push(date);
          values.extend(row);
        }
        None => dropped += 1,
      }
    }

    if dropped > 0 {
      debug!(dropped, "dropped incomplete price rows");
    }
    let prices = Array2::from_shape_vec((dates.len(), tickers.len()), values)
      .map_err(|e| DccError::InvalidInput(e.to_string()))?;
    let panel = Self::new(dates, tickers, prices)?;
    info!(
      rows = panel.len(),
      tickers = ?panel.tickers,
      "loaded price panel"
    );
    Ok(panel)
  }

  pub fn dates(&self) -> &[NaiveDate] {
    &self.dates
  }

  pub fn tickers(&self) -> &[String] {
    &self.tickers
  }

  pub fn prices(&self) -> &Array2<f64> {
    &self.prices
  }

  pub fn len(&self) -> usize {
    self.dates.len()
  }

  pub fn is_empty(&self) -> bool {
    self.dates.is_empty()
  }

  /// Columns in the order of `tickers`.
  pub fn select<S: AsRef<str>>(&self, tickers: &[S]) -> Result<Self> {
    let idx = tickers
      .iter()
      .map(|t| {
        self
          .tickers
          .iter()
          .position(|x| x == t.as_ref())
          .ok_or_else(|| DccError::KeyNotFound(t.as_ref().to_string()))
      })
      .collect::<Result<Vec<_>>>()?;

    Ok(Self {
      dates: self.dates.clone(),
      tickers: tickers.iter().map(|t| t.as_ref().to_string()).collect(),
      prices: self.prices.select(Axis(1), &idx),
    })
  }

  /// Rows with `start <= date < end`.
  pub fn window(&self, start: NaiveDate, end: NaiveDate) -> Self {
    let idx: Vec<usize> = self
      .dates
      .iter()
      .enumerate()
      .filter(|(_, d)| **d >= start && **d < end)
      .map(|(i, _)| i)
      .collect();

    Self {
      dates: idx.iter().map(|&i| self.dates[i]).collect(),
      tickers: self.tickers.clone(),
      prices: self.prices.select(Axis(0), &idx),
    }
  }
}

fn csv_error(err: csv::Error) -> DccError {
  let line = err.position().map_or(0, |p| p.line() as usize);
  match err.into_kind() {
    csv::ErrorKind::Io(e) => DccError::Io(e),
    kind => DccError::Parse {
      line,
      message: format!("{kind:?}"),
    },
  }
}

/// Scaled log-returns, `T x N`, indexed by the later date of each pair.
#[derive(Clone, Debug)]
pub struct ReturnPanel {
  dates: Vec<NaiveDate>,
  tickers: Vec<String>,
  returns: Array2<f64>,
}

impl ReturnPanel {
  pub fn new(dates: Vec<NaiveDate>, tickers: Vec<String>, returns: Array2<f64>) -> Result<Self> {
    if returns.dim() != (dates.len(), tickers.len()) {
      return Err(DccError::InvalidInput(format!(
        "return matrix is {:?}, expected ({}, {})",
        returns.dim(),
        dates.len(),
        tickers.len()
      )));
    }
    if dates.len() < 2 {
      return Err(DccError::InvalidInput(format!(
        "need at least 2 returns, got {}",
        dates.len()
      )));
    }
    if returns.iter().any(|r| !r.is_finite()) {
      return Err(DccError::InvalidInput("returns contain non-finite values".into()));
    }
    Ok(Self {
      dates,
      tickers,
      returns,
    })
  }

  pub fn from_prices(prices: &PricePanel, scale: f64) -> Result<Self> {
    let p = prices.prices();
    if p.nrows() < 3 {
      return Err(DccError::InvalidInput(format!(
        "need at least 3 prices, got {}",
        p.nrows()
      )));
    }
    let n = p.nrows();
    let logp = p.mapv(f64::ln);
    let returns = (&logp.slice(ndarray::s![1..n, ..]) - &logp.slice(ndarray::s![0..n - 1, ..])) * scale;

    Self::new(
      prices.dates()[1..].to_vec(),
      prices.tickers().to_vec(),
      returns,
    )
  }

  pub fn dates(&self) -> &[NaiveDate] {
    &self.dates
  }

  pub fn tickers(&self) -> &[String] {
    &self.tickers
  }

  pub fn returns(&self) -> &Array2<f64> {
    &self.returns
  }

  pub fn len(&self) -> usize {
    self.dates.len()
  }

  pub fn is_empty(&self) -> bool {
    self.dates.is_empty()
  }
}

//! # Visualization
//!
//! $$
//! \{r_{t,i},\ \hat\sigma_{t,i},\ \rho_{t}^{(x,y)}\} \mapsto \text{one HTML dashboard}
//! $$
//!
use std::path::Path;

use plotly::common::AxisSide;
use plotly::common::DashType;
use plotly::common::Line;
use plotly::common::Mode;
use plotly::layout::Axis;
use plotly::layout::Legend;
use plotly::layout::Margin;
use plotly::Layout;
use plotly::Plot;
use plotly::Scatter;

use crate::error::Result;
use crate::pipeline::DccReport;

/// Returns and conditional volatility on the left axis, the pair
/// correlation on a right axis pinned to `[-1, 1]`.
pub struct DccDashboard<'a> {
  report: &'a DccReport,
  title: String,
  line_width: f64,
  show_returns: bool,
  height: usize,
}

impl<'a> DccDashboard<'a> {
  pub fn new(report: &'a DccReport) -> Self {
    Self {
      report,
      title: format!(
        "DCC-GARCH: {} / {} ({})",
        report.pair.0,
        report.pair.1,
        report.summary()
      ),
      line_width: 1.0,
      show_returns: true,
      height: 720,
    }
  }

  pub fn title(mut self, title: &str) -> Self {
    self.title = title.into();
    self
  }

  pub fn line_width(mut self, w: f64) -> Self {
    self.line_width = w;
    self
  }

  pub fn show_returns(mut self, show: bool) -> Self {
    self.show_returns = show;
    self
  }

  pub fn height(mut self, height: usize) -> Self {
    self.height = height;
    self
  }

  pub fn plot(&self) -> Plot {
    let x: Vec<String> = self.report.index.iter().map(|d| d.to_string()).collect();
    let mut plot = Plot::new();

    for (i, ticker) in self.report.tickers.iter().enumerate() {
      if self.show_returns {
        let trace = Scatter::new(x.clone(), self.report.returns.column(i).to_vec())
          .mode(Mode::Lines)
          .line(Line::new().width(self.line_width * 0.5).dash(DashType::Dot))
          .name(format!("{ticker} return").as_str())
          .opacity(0.5);
        plot.add_trace(trace);
      }
      let trace = Scatter::new(x.clone(), self.report.sigmas.column(i).to_vec())
        .mode(Mode::Lines)
        .line(Line::new().width(self.line_width))
        .name(format!("{ticker} volatility").as_str());
      plot.add_trace(trace);
    }

    let (p, q) = &self.report.pair;
    let corr = Scatter::new(x, self.report.pair_correlation.to_vec())
      .mode(Mode::Lines)
      .line(Line::new().width(self.line_width * 1.5))
      .name(format!("corr({p}, {q})").as_str())
      .y_axis("y2");
    plot.add_trace(corr);

    plot.set_layout(
      Layout::new()
        .title(self.title.as_str())
        .height(self.height)
        .margin(Margin::new().left(56).right(64).top(84).bottom(44))
        .legend(Legend::new().x(0.01).y(0.99))
        .x_axis(Axis::new().title("date"))
        .y_axis(Axis::new().title("return / volatility (scaled)"))
        .y_axis2(
          Axis::new()
            .title("correlation")
            .overlaying("y")
            .side(AxisSide::Right)
            .range(vec![-1.0, 1.0]),
        ),
    );

    plot
  }

  /// Standalone HTML page.
  pub fn write_html(&self, path: impl AsRef<Path>) -> Result<()> {
    std::fs::write(path, self.plot().to_html())?;
    Ok(())
  }

  pub fn show(&self) {
    self.plot().show();
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use ndarray::array;
  use ndarray::Array3;

  use super::*;
  use crate::dcc::recursion::DccParams;
  use crate::dcc::FitDiagnostics;
  use crate::dcc::FitResult;

  fn report() -> DccReport {
    let index = (1..=3)
      .map(|d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap())
      .collect();
    DccReport {
      index,
      tickers: vec!["AAPL".into(), "NVDA".into()],
      returns: array![[0.1, -0.2], [0.3, 0.1], [-0.5, 0.4]],
      sigmas: array![[1.0, 2.0], [1.1, 2.1], [1.2, 2.2]],
      fit: FitResult {
        params: DccParams::new(0.03, 0.95),
        correlations: Array3::zeros((3, 2, 2)),
        neg_log_likelihood: 1.0,
        diagnostics: FitDiagnostics {
          success: true,
          message: "Optimization terminated successfully".into(),
          iterations: 10,
          evaluations: 20,
          penalized_evaluations: 0,
          non_finite_evaluations: 0,
        },
      },
      pair: ("AAPL".into(), "NVDA".into()),
      pair_correlation: array![0.4, 0.5, 0.45],
    }
  }

  #[test]
  fn dashboard_has_one_trace_per_series() {
    let r = report();
    let json = DccDashboard::new(&r).plot().to_json();
    assert!(json.contains("AAPL volatility"));
    assert!(json.contains("NVDA return"));
    assert!(json.contains("corr(AAPL, NVDA)"));
    assert!(json.contains("\"y2\""));

    let json = DccDashboard::new(&r).show_returns(false).plot().to_json();
    assert!(!json.contains("NVDA return"));
  }

  #[test]
  fn dashboard_writes_html() {
    let r = report();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dcc.html");
    DccDashboard::new(&r).title("test").write_html(&path).unwrap();
    let html = std::fs::read_to_string(&path).unwrap();
    assert!(html.contains("correlation"));
  }

  #[test]
  fn missing_output_directory_is_an_io_error() {
    let r = report();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no-such-dir").join("dcc.html");
    assert!(matches!(
      DccDashboard::new(&r).write_html(&path),
      Err(crate::error::DccError::Io(_))
    ));
    assert!(!path.exists());
  }
}

use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use dcc_rs::config::DccConfig;
use dcc_rs::data::PricePanel;
use dcc_rs::pipeline;
use dcc_rs::visualization::DccDashboard;

/// Two-stage DCC-GARCH on a CSV of close prices (`date,<ticker>...`).
#[derive(Parser, Debug)]
#[command(name = "dcc-rs", version, about)]
struct Cli {
  /// Price file with a `date` column followed by one column per ticker.
  prices: PathBuf,

  /// Comma-separated tickers; the first two form the reported pair.
  #[arg(long, value_delimiter = ',', default_values_t = ["AAPL".to_string(), "NVDA".to_string()])]
  tickers: Vec<String>,

  #[arg(long, default_value = "2020-01-01")]
  start: NaiveDate,

  /// Exclusive end of the window.
  #[arg(long, default_value = "2024-06-01")]
  end: NaiveDate,

  /// Return multiplier (100 = percent).
  #[arg(long, default_value_t = 100.0)]
  scale: f64,

  #[arg(long, default_value_t = 0.02)]
  a0: f64,

  #[arg(long, default_value_t = 0.97)]
  b0: f64,

  /// Iteration cap for the correlation search.
  #[arg(long)]
  max_iters: Option<u64>,

  /// Fit the volatility filters one asset at a time.
  #[arg(long)]
  serial: bool,

  /// Write the dashboard to this HTML file.
  #[arg(long)]
  html: Option<PathBuf>,

  /// Log verbosity level (trace, debug, info, warn, error).
  #[arg(long, default_value = "info")]
  log_level: tracing::Level,
}

impl Cli {
  fn config(&self) -> DccConfig {
    let mut config = DccConfig::default()
      .with_tickers(self.tickers.iter().cloned())
      .with_window(self.start, self.end)
      .with_scale(self.scale)
      .with_initial(self.a0, self.b0)
      .with_parallel(!self.serial);
    if let Some(max_iters) = self.max_iters {
      config.estimator.max_iters = max_iters;
    }
    config
  }
}

fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();

  tracing_subscriber::fmt()
    .with_max_level(cli.log_level)
    .with_target(false)
    .init();

  let prices = PricePanel::from_path(&cli.prices)
    .with_context(|| format!("reading {}", cli.prices.display()))?;
  let report = pipeline::run(&cli.config(), &prices)?;

  println!("{}", report.summary());
  println!(
    "optimizer: success={}, message={}, iterations={}, evaluations={}",
    report.fit.diagnostics.success,
    report.fit.diagnostics.message,
    report.fit.diagnostics.iterations,
    report.fit.diagnostics.evaluations
  );
  let (x, y) = &report.pair;
  if let Some(last) = report.pair_correlation.last() {
    println!("last corr({x}, {y}) = {last:.4}");
  }

  if let Some(path) = &cli.html {
    DccDashboard::new(&report)
      .write_html(path)
      .with_context(|| format!("writing {}", path.display()))?;
    println!("dashboard written to {}", path.display());
  }

  Ok(())
}

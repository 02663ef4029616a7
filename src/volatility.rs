//! # Volatility
//!
//! $$
//! z_{t,i}=\frac{r_{t,i}-\hat\mu_i}{\hat\sigma_{t,i}}
//! $$
//!
//! First stage of the two-stage estimation: one GARCH(1,1)-t fit per asset,
//! no parameters shared across assets.
//!
//! | Module      | Description                                              |
//! |-------------|----------------------------------------------------------|
//! | [`garch_t`] | Univariate filter, likelihood and Nelder–Mead fit.       |
//! | [`panel`]   | Independent per-asset fits joined into an immutable map. |

pub mod garch_t;
pub mod panel;

pub use garch_t::fit_garch_t;
pub use garch_t::GarchFilter;
pub use garch_t::GarchFit;
pub use garch_t::GarchOptions;
pub use garch_t::GarchParams;
pub use panel::VolatilityPanel;

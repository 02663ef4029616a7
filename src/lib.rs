//! # dcc-rs
//!
//! $$
//! r_t=\mu+D_t z_t,\qquad \operatorname{Cov}_{t-1}(z_t)=R_t
//! $$
//!
//! Two-stage DCC-GARCH estimation: GARCH(1,1)-t filters per asset, then the
//! DCC(1,1) correlation dynamics by maximum likelihood over the standardized
//! residuals.
//!
//! | Module            | Description                                              |
//! |-------------------|----------------------------------------------------------|
//! | [`volatility`]    | Per-asset GARCH(1,1)-t filters and the residual panel.   |
//! | [`dcc`]           | Correlation recursion, likelihood, estimator, pair path. |
//! | [`linalg`]        | Covariance, log-determinant and Cholesky helpers.        |
//! | [`stochastic`]    | Seedable GARCH and DCC simulators.                       |
//! | [`data`]          | Price CSV loading and scaled log-returns.                |
//! | [`config`]        | Run configuration.                                       |
//! | [`pipeline`]      | End-to-end run producing a [`pipeline::DccReport`].      |
//! | [`transforms`]    | Logistic maps for constrained searches.                  |
//! | [`visualization`] | Plotly dashboard.                                        |

pub mod config;
pub mod data;
pub mod dcc;
pub mod error;
pub mod linalg;
pub mod pipeline;
pub mod stochastic;
pub mod traits;
pub mod transforms;
pub mod visualization;
pub mod volatility;

pub use error::DccError;
pub use error::Result;

//! # Correlation
//!
//! $$
//! z_t = L_t e_t,\quad L_tL_t^\top = R_t,\quad e_t\sim\mathcal N(0,I_N)
//! $$
//!
pub mod dcc;

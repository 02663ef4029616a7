//! # Transforms
//!
//! $$
//! \sigma(x)=\frac{1}{1+e^{-x}},\qquad \operatorname{logit}(p)=\ln\frac{p}{1-p}
//! $$
//!
//! Maps between unconstrained search coordinates and bounded parameters.

/// Logistic map `R -> (0, 1)`, evaluated without overflow for large `|x|`.
pub fn logistic(x: f64) -> f64 {
  if x >= 0.0 {
    1.0 / (1.0 + (-x).exp())
  } else {
    let e = x.exp();
    e / (1.0 + e)
  }
}

/// Inverse of [`logistic`] on `(0, 1)`.
pub fn logit(p: f64) -> f64 {
  p.ln() - (-p).ln_1p()
}

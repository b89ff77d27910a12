//! Information criteria for comparing fitted models

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Criterion used to rank candidate model orders (lower is better)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InformationCriterion {
    /// Akaike information criterion
    Aic,
    /// Small-sample corrected AIC
    #[default]
    Aicc,
    /// Bayesian information criterion
    Bic,
}

impl InformationCriterion {
    /// Evaluate the criterion for a log-likelihood over `n_obs` observations
    /// with `n_params` estimated parameters.
    ///
    /// AICc is infinite when `n_obs <= n_params + 1`.
    pub fn evaluate(&self, log_likelihood: f64, n_obs: usize, n_params: usize) -> f64 {
        let n = n_obs as f64;
        let k = n_params as f64;
        let aic = -2.0 * log_likelihood + 2.0 * k;

        match self {
            InformationCriterion::Aic => aic,
            InformationCriterion::Aicc => {
                if n_obs <= n_params + 1 {
                    f64::INFINITY
                } else {
                    aic + 2.0 * k * (k + 1.0) / (n - k - 1.0)
                }
            }
            InformationCriterion::Bic => -2.0 * log_likelihood + k * n.ln(),
        }
    }
}

impl std::fmt::Display for InformationCriterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InformationCriterion::Aic => write!(f, "AIC"),
            InformationCriterion::Aicc => write!(f, "AICc"),
            InformationCriterion::Bic => write!(f, "BIC"),
        }
    }
}

/// Concentrated Gaussian log-likelihood for a residual sum of squares
pub fn gaussian_log_likelihood(sse: f64, n_obs: usize) -> f64 {
    if n_obs == 0 || sse <= 0.0 {
        return f64::NEG_INFINITY;
    }
    let n = n_obs as f64;
    let sigma2 = sse / n;
    -0.5 * n * ((2.0 * PI * sigma2).ln() + 1.0)
}

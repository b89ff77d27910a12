//! KPSS level-stationarity test and differencing order selection

use crate::differencing::difference;
use crate::stats::{autocovariance, mean};
use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Critical value of the KPSS level statistic at the 5% level
pub const KPSS_CRITICAL_5PCT: f64 = 0.463;

/// Outcome of a KPSS test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KpssResult {
    /// Test statistic
    pub statistic: f64,
    /// Bartlett window truncation lag
    pub lags: usize,
    /// True when the null of level stationarity is not rejected
    pub is_stationary: bool,
}

/// KPSS test for level stationarity.
///
/// `lags` defaults to `floor(4 * (n / 100)^(1/4))`. A series with no
/// variation is reported as stationary.
pub fn kpss_test(series: &[f64], lags: Option<usize>) -> Result<KpssResult> {
    let n = series.len();
    if n < 4 {
        return Err(MathError::InsufficientData(format!(
            "KPSS test needs at least 4 values, have {}",
            n
        )));
    }

    let lags = lags
        .unwrap_or_else(|| (4.0 * (n as f64 / 100.0).powf(0.25)).floor() as usize)
        .clamp(1, n / 2);

    let m = mean(series).unwrap_or(0.0);

    let mut partial = 0.0;
    let numerator = series
        .iter()
        .map(|&x| {
            partial += x - m;
            partial * partial
        })
        .sum::<f64>()
        / (n * n) as f64;

    let mut long_run = autocovariance(series, m, 0);
    for j in 1..=lags {
        let weight = 1.0 - j as f64 / (lags + 1) as f64;
        long_run += 2.0 * weight * autocovariance(series, m, j);
    }

    if long_run <= f64::EPSILON {
        return Ok(KpssResult {
            statistic: 0.0,
            lags,
            is_stationary: true,
        });
    }

    let statistic = numerator / long_run;
    if !statistic.is_finite() {
        return Err(MathError::CalculationError(format!(
            "KPSS statistic is not finite ({})",
            statistic
        )));
    }

    Ok(KpssResult {
        statistic,
        lags,
        is_stationary: statistic < KPSS_CRITICAL_5PCT,
    })
}

/// Number of first differences needed before KPSS stops rejecting stationarity.
///
/// Never exceeds `max_d`; stops early when the series becomes too short to test.
pub fn ndiffs(series: &[f64], max_d: usize) -> Result<usize> {
    let mut current = series.to_vec();
    let mut d = 0;

    while d < max_d {
        if kpss_test(&current, None)?.is_stationary {
            break;
        }
        if current.len() <= 5 {
            break;
        }
        current = difference(&current, 1)?;
        d += 1;
    }

    Ok(d)
}

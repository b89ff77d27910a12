//! Seasonal ARIMA models with fixed orders
//!
//! Coefficients are estimated by conditional sum of squares on the
//! differenced series. Pre-sample values and residuals are taken as zero, so
//! every order fitted to the same data is scored on the same observations.
//! The search is confined to stationary, invertible coefficients no larger
//! than [`COEFFICIENT_BOUND`] in magnitude.

use crate::data::TimeSeries;
use crate::error::{ForecastError, Result};
use crate::models::{normal_quantile, ForecastModel, ForecastResult, TrainedForecastModel};
use serde::{Deserialize, Serialize};
use series_math::criteria::{gaussian_log_likelihood, InformationCriterion};
use series_math::differencing::Differencer;
use series_math::optimize::{minimize, NelderMeadOptions, PENALTY};
use series_math::polynomial::{
    difference_operator, expand_ar, expand_ma, is_invertible, is_stationary, multiply, psi_weights,
};
use series_math::stats::{mean, sum_of_squares, variance};
use std::fmt;

/// Largest magnitude accepted for any single ARMA coefficient
pub const COEFFICIENT_BOUND: f64 = 0.99;

/// Orders of a seasonal ARIMA `(p,d,q)(P,D,Q)[m]` model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArimaOrder {
    /// AR order
    pub p: usize,
    /// Differencing order
    pub d: usize,
    /// MA order
    pub q: usize,
    /// Seasonal AR order
    pub seasonal_p: usize,
    /// Seasonal differencing order
    pub seasonal_d: usize,
    /// Seasonal MA order
    pub seasonal_q: usize,
    /// Seasonal period
    pub period: usize,
}

impl ArimaOrder {
    /// Non-seasonal `(p,d,q)` order
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self {
            p,
            d,
            q,
            seasonal_p: 0,
            seasonal_d: 0,
            seasonal_q: 0,
            period: 1,
        }
    }

    /// Add a seasonal `(P,D,Q)[m]` part
    pub fn with_seasonal(
        mut self,
        seasonal_p: usize,
        seasonal_d: usize,
        seasonal_q: usize,
        period: usize,
    ) -> Self {
        self.seasonal_p = seasonal_p;
        self.seasonal_d = seasonal_d;
        self.seasonal_q = seasonal_q;
        self.period = period;
        self
    }

    /// Number of ARMA coefficients, `p + q + P + Q`
    pub fn arma_terms(&self) -> usize {
        self.p + self.q + self.seasonal_p + self.seasonal_q
    }

    fn has_seasonal_part(&self) -> bool {
        self.seasonal_p + self.seasonal_d + self.seasonal_q > 0
    }
}

impl fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)?;
        if self.has_seasonal_part() {
            write!(
                f,
                "({},{},{})[{}]",
                self.seasonal_p, self.seasonal_d, self.seasonal_q, self.period
            )?;
        }
        Ok(())
    }
}

/// ARIMA model (AutoRegressive Integrated Moving Average)
#[derive(Debug, Clone)]
pub struct ArimaModel {
    /// Name of the model
    name: String,
    /// Model orders
    order: ArimaOrder,
    /// Estimate a constant mean of the differenced series
    include_mean: bool,
    /// Optimizer settings
    optimizer: NelderMeadOptions,
}

/// Trained ARIMA model
#[derive(Debug, Clone)]
pub struct TrainedArimaModel {
    /// Name of the model
    name: String,
    /// Model orders
    order: ArimaOrder,
    /// Non-seasonal AR coefficients
    ar_coefficients: Vec<f64>,
    /// Non-seasonal MA coefficients
    ma_coefficients: Vec<f64>,
    /// Seasonal AR coefficients
    seasonal_ar_coefficients: Vec<f64>,
    /// Seasonal MA coefficients
    seasonal_ma_coefficients: Vec<f64>,
    /// Mean of the differenced series, zero when not estimated
    mean: f64,
    include_mean: bool,
    /// Expanded AR lag coefficients
    full_ar: Vec<f64>,
    /// Expanded MA lag coefficients
    full_ma: Vec<f64>,
    /// Undoes the differencing for forecasts
    differencer: Differencer,
    /// Demeaned differenced training series
    centered: Vec<f64>,
    /// One-step residuals on the differenced scale
    residuals: Vec<f64>,
    /// Innovation variance estimate
    sigma2: f64,
    /// Conditional log-likelihood
    log_likelihood: f64,
}

/// Residuals of the seasonal ARMA recursion with zero pre-sample values
fn css_residuals(centered: &[f64], full_ar: &[f64], full_ma: &[f64]) -> Vec<f64> {
    let mut residuals = Vec::with_capacity(centered.len());
    for t in 0..centered.len() {
        let mut e = centered[t];
        for (i, phi) in full_ar.iter().enumerate().take(t) {
            e -= phi * centered[t - 1 - i];
        }
        for (j, theta) in full_ma.iter().enumerate().take(t) {
            e -= theta * residuals[t - 1 - j];
        }
        residuals.push(e);
    }
    residuals
}

/// Coefficient blocks unpacked from an optimizer parameter vector
struct Coefficients {
    ar: Vec<f64>,
    ma: Vec<f64>,
    seasonal_ar: Vec<f64>,
    seasonal_ma: Vec<f64>,
    mean_offset: f64,
}

impl Coefficients {
    /// Every coefficient within [`COEFFICIENT_BOUND`], both AR factors
    /// stationary and both MA factors invertible.
    ///
    /// The product polynomials inherit their root locations from the factors.
    fn admissible(&self) -> bool {
        let blocks = [&self.ar, &self.ma, &self.seasonal_ar, &self.seasonal_ma];
        blocks
            .iter()
            .flat_map(|b| b.iter())
            .all(|c| c.abs() < COEFFICIENT_BOUND)
            && is_stationary(&self.ar)
            && is_stationary(&self.seasonal_ar)
            && is_invertible(&self.ma)
            && is_invertible(&self.seasonal_ma)
    }
}

impl ArimaModel {
    /// Create a new ARIMA model.
    ///
    /// A mean term is estimated when fewer than two differences are applied.
    pub fn new(order: ArimaOrder) -> Result<Self> {
        if order.period == 0 {
            return Err(ForecastError::InvalidParameter(
                "Seasonal period must be positive".to_string(),
            ));
        }
        if order.has_seasonal_part() && order.period < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "Seasonal terms need a period of at least 2, got {}",
                order.period
            )));
        }

        Ok(Self {
            name: order.to_string(),
            order,
            include_mean: order.d + order.seasonal_d < 2,
            optimizer: NelderMeadOptions::default(),
        })
    }

    /// Override whether a mean term is estimated
    pub fn with_mean(mut self, include_mean: bool) -> Self {
        self.include_mean = include_mean;
        self
    }

    /// Model orders
    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    /// Number of estimated parameters, including the innovation variance
    pub fn parameter_count(&self) -> usize {
        self.order.arma_terms() + usize::from(self.include_mean) + 1
    }

    fn unpack(&self, params: &[f64]) -> Coefficients {
        let ArimaOrder {
            p,
            q,
            seasonal_p,
            seasonal_q,
            ..
        } = self.order;
        let mut rest = params.iter().copied();
        let mut take = |k: usize| -> Vec<f64> { rest.by_ref().take(k).collect() };
        let ar = take(p);
        let ma = take(q);
        let seasonal_ar = take(seasonal_p);
        let seasonal_ma = take(seasonal_q);
        let mean_offset = params.get(self.order.arma_terms()).copied().unwrap_or(0.0);

        Coefficients {
            ar,
            ma,
            seasonal_ar,
            seasonal_ma,
            mean_offset,
        }
    }

    /// Fit on raw yearly values
    pub fn fit_values(&self, values: &[f64]) -> Result<TrainedArimaModel> {
        let order = self.order;
        let lost = order.seasonal_d * order.period + order.d;
        let needed = lost + self.parameter_count() + 2;
        if values.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: values.len(),
            });
        }

        let (differencer, differenced) =
            Differencer::apply(values, order.period, order.seasonal_d, order.d)?;
        let n = differenced.len();

        let w_mean = mean(&differenced).unwrap_or(0.0);
        let w_var = variance(&differenced).filter(|v| *v > 0.0).unwrap_or(1.0);
        let w_sd = w_var.sqrt();
        let scale = n as f64 * w_var;

        let resolve_mean = |offset: f64| {
            if self.include_mean {
                w_mean + w_sd * offset
            } else {
                0.0
            }
        };

        let sse_for = |c: &Coefficients| -> (f64, Vec<f64>, Vec<f64>, Vec<f64>) {
            let mu = resolve_mean(c.mean_offset);
            let centered: Vec<f64> = differenced.iter().map(|w| w - mu).collect();
            let full_ar = expand_ar(&c.ar, &c.seasonal_ar, order.period);
            let full_ma = expand_ma(&c.ma, &c.seasonal_ma, order.period);
            let residuals = css_residuals(&centered, &full_ar, &full_ma);
            let sse = sum_of_squares(&residuals);
            (sse, full_ar, full_ma, residuals)
        };

        let start = vec![0.0; order.arma_terms() + usize::from(self.include_mean)];
        let minimum = minimize(
            |params| {
                let c = self.unpack(params);
                if c.admissible() {
                    sse_for(&c).0 / scale
                } else {
                    PENALTY
                }
            },
            &start,
            &self.optimizer,
        )
        .map_err(|e| ForecastError::ModelFitError(format!("{}: {}", self.name, e)))?;

        let coefficients = self.unpack(&minimum.point);
        if !coefficients.admissible() {
            return Err(ForecastError::ModelFitError(format!(
                "{}: no stationary and invertible coefficients found",
                self.name
            )));
        }
        let (sse, full_ar, full_ma, residuals) = sse_for(&coefficients);
        if !sse.is_finite() {
            return Err(ForecastError::ModelFitError(format!(
                "{}: residuals diverged",
                self.name
            )));
        }

        let mu = resolve_mean(coefficients.mean_offset);
        // An exact fit would otherwise give an infinite likelihood
        let sse = sse.max(1e-12);
        let sigma2 = sse / n as f64;
        let log_likelihood = gaussian_log_likelihood(sse, n);

        Ok(TrainedArimaModel {
            name: self.name.clone(),
            order,
            ar_coefficients: coefficients.ar,
            ma_coefficients: coefficients.ma,
            seasonal_ar_coefficients: coefficients.seasonal_ar,
            seasonal_ma_coefficients: coefficients.seasonal_ma,
            mean: mu,
            include_mean: self.include_mean,
            full_ar,
            full_ma,
            differencer,
            centered: differenced.iter().map(|w| w - mu).collect(),
            residuals,
            sigma2,
            log_likelihood,
        })
    }
}

impl ForecastModel for ArimaModel {
    type Trained = TrainedArimaModel;

    fn fit(&self, data: &TimeSeries) -> Result<TrainedArimaModel> {
        self.fit_values(&data.values())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedArimaModel {
    /// Model orders
    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    /// Non-seasonal AR coefficients
    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar_coefficients
    }

    /// Non-seasonal MA coefficients
    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma_coefficients
    }

    /// Seasonal AR coefficients
    pub fn seasonal_ar_coefficients(&self) -> &[f64] {
        &self.seasonal_ar_coefficients
    }

    /// Seasonal MA coefficients
    pub fn seasonal_ma_coefficients(&self) -> &[f64] {
        &self.seasonal_ma_coefficients
    }

    /// Estimated mean of the differenced series
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Innovation variance
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    /// One-step residuals on the differenced scale
    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    /// Conditional log-likelihood
    pub fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    /// Observations the likelihood is computed over
    pub fn n_obs(&self) -> usize {
        self.centered.len()
    }

    /// Estimated parameters, including the innovation variance
    pub fn parameter_count(&self) -> usize {
        self.order.arma_terms() + usize::from(self.include_mean) + 1
    }

    /// Value of `criterion` for this fit
    pub fn criterion_value(&self, criterion: InformationCriterion) -> f64 {
        criterion.evaluate(self.log_likelihood, self.n_obs(), self.parameter_count())
    }

    fn differenced_forecasts(&self, horizon: usize) -> Vec<f64> {
        let n = self.centered.len();
        let mut history = self.centered.clone();
        let mut shocks = self.residuals.clone();

        for t in n..n + horizon {
            let mut value = 0.0;
            for (i, phi) in self.full_ar.iter().enumerate() {
                if let Some(x) = t.checked_sub(i + 1).map(|k| history[k]) {
                    value += phi * x;
                }
            }
            for (j, theta) in self.full_ma.iter().enumerate() {
                if let Some(e) = t.checked_sub(j + 1).map(|k| shocks[k]) {
                    value += theta * e;
                }
            }
            history.push(value);
            shocks.push(0.0);
        }

        history[n..].iter().map(|x| x + self.mean).collect()
    }

    /// Forecast standard errors on the original scale
    fn standard_errors(&self, horizon: usize) -> Vec<f64> {
        let mut ar_poly = vec![1.0];
        ar_poly.extend(self.full_ar.iter().map(|c| -c));
        let integrated = multiply(&ar_poly, &difference_operator(&self.differencer.lags()));
        let integrated_ar: Vec<f64> = integrated[1..].iter().map(|c| -c).collect();

        let psi = psi_weights(&integrated_ar, &self.full_ma, horizon);
        let mut cumulative = 0.0;
        psi.iter()
            .map(|w| {
                cumulative += w * w;
                (self.sigma2 * cumulative).sqrt()
            })
            .collect()
    }
}

impl TrainedForecastModel for TrainedArimaModel {
    fn forecast(&self, horizon: usize) -> Result<ForecastResult> {
        if horizon == 0 {
            return Ok(ForecastResult::empty());
        }
        let values = self.differencer.integrate(&self.differenced_forecasts(horizon));
        ForecastResult::new(values, horizon)
    }

    fn forecast_with_intervals(&self, horizon: usize, level: f64) -> Result<ForecastResult> {
        let z = normal_quantile(level)?;
        let point = self.forecast(horizon)?;
        if point.is_empty() {
            return Ok(point);
        }

        let intervals = point
            .values()
            .iter()
            .zip(self.standard_errors(horizon))
            .map(|(v, se)| (v - z * se, v + z * se))
            .collect();

        ForecastResult::new_with_intervals(point.values().to_vec(), horizon, intervals)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> String {
        if self.include_mean {
            format!("{} with mean {:.3}", self.order, self.mean)
        } else {
            self.order.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    /// AR(1) with coefficient 0.6 around a level of 50
    fn ar1_values(n: usize) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(7);
        let noise = Normal::new(0.0, 1.0).unwrap();
        let mut prev = 0.0;
        (0..n)
            .map(|_| {
                let x = 0.6 * prev + noise.sample(&mut rng);
                prev = x;
                50.0 + x
            })
            .collect()
    }

    #[test]
    fn test_order_display() {
        let order = ArimaOrder::new(1, 1, 0).with_seasonal(0, 1, 1, 12);
        assert_eq!(order.to_string(), "ARIMA(1,1,0)(0,1,1)[12]");
        assert_eq!(ArimaOrder::new(2, 0, 1).to_string(), "ARIMA(2,0,1)");
    }

    #[test]
    fn test_recovers_ar_coefficient() {
        let model = ArimaModel::new(ArimaOrder::new(1, 0, 0)).unwrap();
        let fitted = model.fit_values(&ar1_values(400)).unwrap();
        assert_relative_eq!(fitted.ar_coefficients()[0], 0.6, epsilon = 0.15);
        assert_relative_eq!(fitted.mean(), 50.0, epsilon = 1.0);
    }

    #[test]
    fn test_unit_root_coefficient_stays_bounded() {
        // A random walk fitted without differencing pushes phi towards 1
        let mut rng = StdRng::seed_from_u64(11);
        let noise = Normal::new(0.0, 1.0).unwrap();
        let mut level = 100.0;
        let values: Vec<f64> = (0..200)
            .map(|_| {
                level += noise.sample(&mut rng);
                level
            })
            .collect();

        let model = ArimaModel::new(ArimaOrder::new(1, 0, 0)).unwrap();
        let fitted = model.fit_values(&values).unwrap();
        let phi = fitted.ar_coefficients()[0];
        assert!(phi.abs() < COEFFICIENT_BOUND, "phi = {}", phi);
        assert!(phi > 0.5);
    }

    #[test]
    fn test_random_walk_forecast_is_flat() {
        let values: Vec<f64> = (0..30).map(|t| 10.0 + (t % 3) as f64).collect();
        let model = ArimaModel::new(ArimaOrder::new(0, 1, 0)).unwrap().with_mean(false);
        let fitted = model.fit_values(&values).unwrap();
        let forecast = fitted.forecast(3).unwrap();
        let last = *values.last().unwrap();
        for v in forecast.values() {
            assert_relative_eq!(*v, last);
        }
    }

    #[test]
    fn test_seasonal_difference_repeats_cycle() {
        // A pure period-4 cycle is reproduced by (0,0,0)(0,1,0)[4]
        let values: Vec<f64> = (0..24).map(|t| [5.0, 8.0, 6.0, 3.0][t % 4]).collect();
        let model = ArimaModel::new(ArimaOrder::new(0, 0, 0).with_seasonal(0, 1, 0, 4))
            .unwrap()
            .with_mean(false);
        let fitted = model.fit_values(&values).unwrap();
        assert_eq!(fitted.forecast(4).unwrap().values(), &[5.0, 8.0, 6.0, 3.0]);
    }

    #[test]
    fn test_too_short_series() {
        let model = ArimaModel::new(ArimaOrder::new(1, 1, 1).with_seasonal(1, 1, 1, 12)).unwrap();
        let result = model.fit_values(&[1.0; 14]);
        assert!(matches!(result, Err(ForecastError::InsufficientData { .. })));
    }

    #[test]
    fn test_interval_width_grows() {
        let model = ArimaModel::new(ArimaOrder::new(1, 1, 0)).unwrap();
        let values: Vec<f64> = ar1_values(60)
            .iter()
            .enumerate()
            .map(|(t, v)| v + t as f64)
            .collect();
        let fitted = model.fit_values(&values).unwrap();
        let forecast = fitted.forecast_with_intervals(5, 0.95).unwrap();
        let widths: Vec<f64> = forecast
            .intervals()
            .unwrap()
            .iter()
            .map(|(lo, hi)| hi - lo)
            .collect();
        assert!(widths.windows(2).all(|w| w[1] >= w[0]));
        assert!(fitted.criterion_value(InformationCriterion::Aicc).is_finite());
    }
}

//! Automatic seasonal ARIMA order selection
//!
//! The seasonal differencing order is fixed by configuration. The ordinary
//! differencing order comes from repeated KPSS tests on the seasonally
//! differenced series. AR and MA orders are then searched to minimize an
//! information criterion, either stepwise from a few starting orders or over
//! the full bounded grid.

use crate::config::ArimaSearchConfig;
use crate::data::TimeSeries;
use crate::error::{ForecastError, Result};
use crate::models::arima::{ArimaModel, ArimaOrder, TrainedArimaModel};
use crate::models::{ForecastModel, ForecastResult, TrainedForecastModel};
use rayon::prelude::*;
use serde::Serialize;
use series_math::differencing::Differencer;
use series_math::stationarity::ndiffs;
use std::collections::HashSet;

/// Upper bound on stepwise moves
const MAX_STEPWISE_MOVES: usize = 100;

/// `(p, q, P, Q)` part of an order
type OrderKey = (usize, usize, usize, usize);

/// Starting orders of the stepwise search
const STEPWISE_STARTS: [OrderKey; 4] =
    [(2, 2, 1, 1), (0, 0, 0, 0), (1, 0, 1, 0), (0, 1, 0, 1)];

/// Criterion value of one evaluated order
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CandidateScore {
    /// Order fitted
    pub order: ArimaOrder,
    /// Criterion value, lower is better
    pub criterion: f64,
}

/// Seasonal ARIMA with automatic order search
#[derive(Debug, Clone)]
pub struct AutoArima {
    /// Name of the model
    name: String,
    /// Seasonal period
    period: usize,
    /// Seasonal differencing order
    seasonal_d: usize,
    /// Search bounds and strategy
    search: ArimaSearchConfig,
}

/// Fitted model at the selected order
#[derive(Debug, Clone)]
pub struct TrainedAutoArima {
    /// Name of the model
    name: String,
    /// Selected model
    model: TrainedArimaModel,
    /// Every order that fitted, in evaluation order
    candidates: Vec<CandidateScore>,
    search: ArimaSearchConfig,
}

impl AutoArima {
    /// Create a searcher for the given seasonal period and differencing
    pub fn new(period: usize, seasonal_d: usize, search: ArimaSearchConfig) -> Result<Self> {
        if period < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "Seasonal period must be at least 2, got {}",
                period
            )));
        }

        Ok(Self {
            name: "ARIMA".to_string(),
            period,
            seasonal_d,
            search,
        })
    }

    /// Search settings
    pub fn search(&self) -> &ArimaSearchConfig {
        &self.search
    }

    /// Minimum series length for a search to start
    pub fn min_observations(&self) -> usize {
        self.seasonal_d * self.period + 10
    }

    fn within_bounds(&self, (p, q, sp, sq): OrderKey) -> bool {
        p <= self.search.max_p
            && q <= self.search.max_q
            && sp <= self.search.max_seasonal_p
            && sq <= self.search.max_seasonal_q
            && p + q + sp + sq <= self.search.max_order
    }

    fn order_for(&self, d: usize, (p, q, sp, sq): OrderKey) -> ArimaOrder {
        ArimaOrder::new(p, d, q).with_seasonal(sp, self.seasonal_d, sq, self.period)
    }

    /// Fit one order; failures exclude the order from the search
    fn evaluate(&self, values: &[f64], order: ArimaOrder) -> Option<(TrainedArimaModel, f64)> {
        let fitted = ArimaModel::new(order).and_then(|m| m.fit_values(values));
        match fitted {
            Ok(model) => {
                let score = model.criterion_value(self.search.criterion);
                tracing::debug!(%order, criterion = score, "evaluated candidate");
                score.is_finite().then_some((model, score))
            }
            Err(e) => {
                tracing::debug!(%order, error = %e, "candidate failed to fit");
                None
            }
        }
    }

    /// Fit a batch of orders, keeping the batch order in the output
    fn evaluate_batch(
        &self,
        values: &[f64],
        orders: &[ArimaOrder],
    ) -> Vec<Option<(TrainedArimaModel, f64)>> {
        if self.search.parallel_candidates {
            orders
                .par_iter()
                .map(|&order| self.evaluate(values, order))
                .collect()
        } else {
            orders
                .iter()
                .map(|&order| self.evaluate(values, order))
                .collect()
        }
    }

    /// Best of a batch; the earliest entry wins ties
    fn best_of(
        batch: Vec<Option<(TrainedArimaModel, f64)>>,
        candidates: &mut Vec<CandidateScore>,
    ) -> Option<(TrainedArimaModel, f64)> {
        let mut best: Option<(TrainedArimaModel, f64)> = None;
        for (model, score) in batch.into_iter().flatten() {
            candidates.push(CandidateScore {
                order: model.order(),
                criterion: score,
            });
            if best.as_ref().map_or(true, |(_, b)| score < *b) {
                best = Some((model, score));
            }
        }
        best
    }

    fn exhaustive(
        &self,
        values: &[f64],
        d: usize,
        candidates: &mut Vec<CandidateScore>,
    ) -> Option<(TrainedArimaModel, f64)> {
        let s = &self.search;
        let mut orders = Vec::new();
        for p in 0..=s.max_p {
            for q in 0..=s.max_q {
                for sp in 0..=s.max_seasonal_p {
                    for sq in 0..=s.max_seasonal_q {
                        if self.within_bounds((p, q, sp, sq)) {
                            orders.push(self.order_for(d, (p, q, sp, sq)));
                        }
                    }
                }
            }
        }

        Self::best_of(self.evaluate_batch(values, &orders), candidates)
    }

    fn stepwise(
        &self,
        values: &[f64],
        d: usize,
        candidates: &mut Vec<CandidateScore>,
    ) -> Option<(TrainedArimaModel, f64)> {
        let mut visited = HashSet::new();
        let starts: Vec<_> = STEPWISE_STARTS
            .iter()
            .copied()
            .filter(|&key| self.within_bounds(key) && visited.insert(key))
            .map(|key| self.order_for(d, key))
            .collect();

        let mut best = Self::best_of(self.evaluate_batch(values, &starts), candidates)?;

        for _ in 0..MAX_STEPWISE_MOVES {
            let current = best.0.order();
            let key = (current.p, current.q, current.seasonal_p, current.seasonal_q);
            let neighbours: Vec<_> = neighbourhood(key)
                .into_iter()
                .filter(|&k| self.within_bounds(k) && visited.insert(k))
                .map(|k| self.order_for(d, k))
                .collect();

            if neighbours.is_empty() {
                break;
            }

            match Self::best_of(self.evaluate_batch(values, &neighbours), candidates) {
                Some(next) if next.1 < best.1 => best = next,
                _ => break,
            }
        }

        Some(best)
    }
}

/// Orders one step away: each of `p, q, P, Q` by one, and `(p, q)` or `(P, Q)` together
fn neighbourhood((p, q, sp, sq): OrderKey) -> Vec<OrderKey> {
    let shifts: [(isize, isize, isize, isize); 12] = [
        (-1, 0, 0, 0),
        (1, 0, 0, 0),
        (0, -1, 0, 0),
        (0, 1, 0, 0),
        (0, 0, -1, 0),
        (0, 0, 1, 0),
        (0, 0, 0, -1),
        (0, 0, 0, 1),
        (-1, -1, 0, 0),
        (1, 1, 0, 0),
        (0, 0, -1, -1),
        (0, 0, 1, 1),
    ];

    let step = |v: usize, by: isize| v.checked_add_signed(by);
    shifts
        .iter()
        .filter_map(|&(dp, dq, dsp, dsq)| {
            Some((step(p, dp)?, step(q, dq)?, step(sp, dsp)?, step(sq, dsq)?))
        })
        .collect()
}

impl ForecastModel for AutoArima {
    type Trained = TrainedAutoArima;

    fn fit(&self, data: &TimeSeries) -> Result<TrainedAutoArima> {
        let values = data.values();
        let needed = self.min_observations();
        if values.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: values.len(),
            });
        }

        let (_, seasonally_differenced) =
            Differencer::apply(&values, self.period, self.seasonal_d, 0)?;
        let d = ndiffs(&seasonally_differenced, self.search.max_d)?;
        tracing::debug!(d, seasonal_d = self.seasonal_d, "differencing orders");

        let mut candidates = Vec::new();
        let best = if self.search.stepwise {
            self.stepwise(&values, d, &mut candidates)
        } else {
            self.exhaustive(&values, d, &mut candidates)
        };

        let (model, score) = best.ok_or_else(|| {
            ForecastError::ModelFitError(format!(
                "No ARIMA order could be fitted to {} observations",
                values.len()
            ))
        })?;

        tracing::info!(
            order = %model.order(),
            criterion = %self.search.criterion,
            score,
            evaluated = candidates.len(),
            "selected ARIMA order"
        );

        Ok(TrainedAutoArima {
            name: self.name.clone(),
            model,
            candidates,
            search: self.search.clone(),
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedAutoArima {
    /// Selected order
    pub fn order(&self) -> ArimaOrder {
        self.model.order()
    }

    /// Model fitted at the selected order
    pub fn model(&self) -> &TrainedArimaModel {
        &self.model
    }

    /// Every order that fitted, in evaluation order
    pub fn candidates(&self) -> &[CandidateScore] {
        &self.candidates
    }

    /// Criterion value of the selected order
    pub fn criterion_value(&self) -> f64 {
        self.model.criterion_value(self.search.criterion)
    }
}

impl TrainedForecastModel for TrainedAutoArima {
    fn forecast(&self, horizon: usize) -> Result<ForecastResult> {
        self.model.forecast(horizon)
    }

    fn forecast_with_intervals(&self, horizon: usize, level: f64) -> Result<ForecastResult> {
        self.model.forecast_with_intervals(horizon, level)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> String {
        format!(
            "{} ({}={:.2})",
            self.model.describe(),
            self.search.criterion,
            self.criterion_value()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    fn seasonal_series(n: usize, period: usize, seed: u64) -> TimeSeries {
        let mut rng = StdRng::seed_from_u64(seed);
        let noise = Normal::new(0.0, 2.0).unwrap();
        TimeSeries::from_pairs(
            "synthetic",
            (0..n).map(|t| {
                let season = 10.0 * (2.0 * std::f64::consts::PI * t as f64 / period as f64).sin();
                let value = 200.0 + 0.8 * t as f64 + season + noise.sample(&mut rng);
                (1950 + t as i32, value)
            }),
        )
        .unwrap()
    }

    fn small_search() -> ArimaSearchConfig {
        ArimaSearchConfig {
            max_p: 2,
            max_q: 2,
            max_seasonal_p: 1,
            max_seasonal_q: 1,
            max_order: 3,
            ..ArimaSearchConfig::default()
        }
    }

    #[test]
    fn test_neighbourhood_stays_non_negative() {
        let around_origin = neighbourhood((0, 0, 0, 0));
        assert_eq!(around_origin.len(), 6);
        assert!(around_origin.contains(&(1, 1, 0, 0)));
        assert_eq!(neighbourhood((1, 1, 1, 1)).len(), 12);
    }

    #[test]
    fn test_rejects_short_series() {
        let model = AutoArima::new(4, 1, small_search()).unwrap();
        let result = model.fit(&seasonal_series(13, 4, 1));
        assert!(matches!(
            result,
            Err(ForecastError::InsufficientData { needed: 14, got: 13 })
        ));
    }

    #[test]
    fn test_selected_order_respects_bounds() {
        let model = AutoArima::new(4, 1, small_search()).unwrap();
        let fitted = model.fit(&seasonal_series(60, 4, 3)).unwrap();
        let order = fitted.order();
        assert!(order.p <= 2 && order.q <= 2);
        assert!(order.seasonal_p <= 1 && order.seasonal_q <= 1);
        assert!(order.arma_terms() <= 3);
        assert_eq!(order.seasonal_d, 1);
        assert_eq!(order.period, 4);

        let best = fitted
            .candidates()
            .iter()
            .map(|c| c.criterion)
            .fold(f64::INFINITY, f64::min);
        assert!(fitted.criterion_value() <= best);
        assert_eq!(fitted.forecast(8).unwrap().values().len(), 8);
    }

    #[test]
    fn test_exhaustive_is_no_worse_than_stepwise() {
        let series = seasonal_series(60, 4, 5);
        let stepwise = AutoArima::new(4, 1, small_search()).unwrap().fit(&series).unwrap();
        let exhaustive = AutoArima::new(
            4,
            1,
            ArimaSearchConfig {
                stepwise: false,
                ..small_search()
            },
        )
        .unwrap()
        .fit(&series)
        .unwrap();

        assert!(exhaustive.criterion_value() <= stepwise.criterion_value());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let series = seasonal_series(48, 4, 11);
        let sequential = AutoArima::new(4, 1, small_search()).unwrap().fit(&series).unwrap();
        let parallel = AutoArima::new(
            4,
            1,
            ArimaSearchConfig {
                parallel_candidates: true,
                ..small_search()
            },
        )
        .unwrap()
        .fit(&series)
        .unwrap();

        assert_eq!(sequential.order(), parallel.order());
        assert_eq!(
            sequential.forecast(4).unwrap().values(),
            parallel.forecast(4).unwrap().values()
        );
    }
}

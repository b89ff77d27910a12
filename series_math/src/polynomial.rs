//! Lag polynomial algebra for seasonal ARMA models
//!
//! Polynomials are stored as coefficient vectors indexed by lag, with the
//! lag-0 coefficient first.

/// Product of two lag polynomials
pub fn multiply(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }

    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        if x == 0.0 {
            continue;
        }
        for (j, &y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// Lag polynomial `1 + sign * (c1 B^step + c2 B^(2 step) + ...)`
fn spread(coefficients: &[f64], step: usize, sign: f64) -> Vec<f64> {
    let mut poly = vec![0.0; coefficients.len() * step + 1];
    poly[0] = 1.0;
    for (i, &c) in coefficients.iter().enumerate() {
        poly[(i + 1) * step] = sign * c;
    }
    poly
}

/// Expand `phi(B) * Phi(B^period)` into the AR coefficients of one polynomial.
///
/// Coefficients use the regression convention `y_t = sum phi_i y_{t-i} + ...`,
/// so the returned vector holds `phi_full[i - 1]` for lag `i`.
pub fn expand_ar(nonseasonal: &[f64], seasonal: &[f64], period: usize) -> Vec<f64> {
    let poly = multiply(
        &spread(nonseasonal, 1, -1.0),
        &spread(seasonal, period.max(1), -1.0),
    );
    poly[1..].iter().map(|c| -c).collect()
}

/// Expand `theta(B) * Theta(B^period)` into the MA coefficients of one polynomial
pub fn expand_ma(nonseasonal: &[f64], seasonal: &[f64], period: usize) -> Vec<f64> {
    let poly = multiply(
        &spread(nonseasonal, 1, 1.0),
        &spread(seasonal, period.max(1), 1.0),
    );
    poly[1..].to_vec()
}

/// Lag polynomial of `(1 - B^lag)` applied once per entry of `lags`
pub fn difference_operator(lags: &[usize]) -> Vec<f64> {
    lags.iter().fold(vec![1.0], |acc, &lag| {
        let mut factor = vec![0.0; lag + 1];
        factor[0] = 1.0;
        factor[lag] = -1.0;
        multiply(&acc, &factor)
    })
}

/// MA(infinity) weights `psi_0 .. psi_{count-1}` of an ARMA process.
///
/// `ar` and `ma` use the regression convention of [`expand_ar`] / [`expand_ma`].
pub fn psi_weights(ar: &[f64], ma: &[f64], count: usize) -> Vec<f64> {
    let mut psi = Vec::with_capacity(count);
    for j in 0..count {
        if j == 0 {
            psi.push(1.0);
            continue;
        }
        let mut value = ma.get(j - 1).copied().unwrap_or(0.0);
        for i in 1..=ar.len().min(j) {
            value += ar[i - 1] * psi[j - i];
        }
        psi.push(value);
    }
    psi
}

/// Whether `1 - ar_1 B - ... - ar_p B^p` has every root outside the unit circle.
///
/// Runs the Levinson recursion backwards: the process is stationary exactly
/// when every partial autocorrelation lies strictly inside `(-1, 1)`.
pub fn is_stationary(ar: &[f64]) -> bool {
    let mut a = ar.to_vec();
    while let Some(&r) = a.last() {
        if !r.is_finite() || r.abs() >= 1.0 {
            return false;
        }
        let k = a.len();
        let denom = 1.0 - r * r;
        a = (0..k - 1).map(|j| (a[j] + r * a[k - 2 - j]) / denom).collect();
    }
    true
}

/// Whether `1 + ma_1 B + ... + ma_q B^q` has every root outside the unit circle
pub fn is_invertible(ma: &[f64]) -> bool {
    let negated: Vec<f64> = ma.iter().map(|c| -c).collect();
    is_stationary(&negated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_multiply() {
        // (1 - B)(1 + B) = 1 - B^2
        assert_eq!(multiply(&[1.0, -1.0], &[1.0, 1.0]), vec![1.0, 0.0, -1.0]);
    }

    #[test]
    fn test_expand_ar_cross_term() {
        // (1 - 0.5B)(1 - 0.4B^4): lag 1 -> 0.5, lag 4 -> 0.4, lag 5 -> -0.2
        let full = expand_ar(&[0.5], &[0.4], 4);
        assert_eq!(full.len(), 5);
        assert_relative_eq!(full[0], 0.5);
        assert_relative_eq!(full[3], 0.4);
        assert_relative_eq!(full[4], -0.2);
    }

    #[test]
    fn test_expand_ma_cross_term() {
        let full = expand_ma(&[0.3], &[0.5], 2);
        assert_eq!(full, vec![0.3, 0.5, 0.15]);
    }

    #[test]
    fn test_empty_orders_expand_to_nothing() {
        assert!(expand_ar(&[], &[], 12).is_empty());
        assert!(expand_ma(&[], &[], 12).is_empty());
    }

    #[test]
    fn test_difference_operator() {
        // (1 - B)(1 - B^2) = 1 - B - B^2 + B^3
        assert_eq!(difference_operator(&[2, 1]), vec![1.0, -1.0, -1.0, 1.0]);
    }

    #[test]
    fn test_psi_weights_random_walk() {
        // (1 - B) y = e  => psi_j = 1 for every j
        let psi = psi_weights(&[1.0], &[], 5);
        assert_eq!(psi, vec![1.0; 5]);
    }

    #[test]
    fn test_psi_weights_ar1() {
        let psi = psi_weights(&[0.5], &[], 4);
        assert_relative_eq!(psi[3], 0.125);
    }

    #[test]
    fn test_stationarity_of_ar2() {
        assert!(is_stationary(&[]));
        assert!(is_stationary(&[0.5, 0.3]));
        // phi_1 + phi_2 > 1
        assert!(!is_stationary(&[0.8, 0.3]));
        // unit root
        assert!(!is_stationary(&[1.0]));
        assert!(!is_stationary(&[0.2, -1.0]));
    }

    #[test]
    fn test_invertibility_sign_convention() {
        assert!(is_invertible(&[0.4]));
        assert!(!is_invertible(&[-1.2]));
        // 1 + 0.5B + 0.6B^2: complex roots of modulus ~1.29
        assert!(is_invertible(&[0.5, 0.6]));
        // 1 + 0.5B - 0.6B^2: one root near -0.94
        assert!(!is_invertible(&[0.5, -0.6]));
    }
}

// Column statistics used by the analyzers and indicators.
// NaN marks an undefined observation; reductions skip it, rolling windows
// containing it yield NaN.

pub fn mean(values: &[f64]) -> f64 {
    let defined: Vec<f64> = defined(values);
    if defined.is_empty() {
        return f64::NAN;
    }
    defined.iter().sum::<f64>() / defined.len() as f64
}

/// Sample variance (n - 1 denominator). NaN with fewer than two observations.
pub fn sample_var(values: &[f64]) -> f64 {
    let defined = defined(values);
    let n = defined.len();
    if n < 2 {
        return f64::NAN;
    }
    let avg = defined.iter().sum::<f64>() / n as f64;
    defined.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / (n - 1) as f64
}

pub fn sample_std(values: &[f64]) -> f64 {
    sample_var(values).sqrt()
}

/// Sample covariance over the pairs where both sides are defined.
pub fn covariance(xs: &[f64], ys: &[f64]) -> f64 {
    let (xs, ys) = complete_pairs(xs, ys);
    let n = xs.len();
    if n < 2 {
        return f64::NAN;
    }
    let mx = xs.iter().sum::<f64>() / n as f64;
    let my = ys.iter().sum::<f64>() / n as f64;
    xs.iter()
        .zip(&ys)
        .map(|(x, y)| (x - mx) * (y - my))
        .sum::<f64>()
        / (n - 1) as f64
}

/// Pearson correlation over the pairs where both sides are defined.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let (xs, ys) = complete_pairs(xs, ys);
    let n = xs.len();
    if n < 2 {
        return f64::NAN;
    }
    let mx = xs.iter().sum::<f64>() / n as f64;
    let my = ys.iter().sum::<f64>() / n as f64;
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (x, y) in xs.iter().zip(&ys) {
        sxy += (x - mx) * (y - my);
        sxx += (x - mx).powi(2);
        syy += (y - my).powi(2);
    }
    sxy / (sxx * syy).sqrt()
}

/// Quantile with linear interpolation between closest ranks, `q` in [0, 1].
pub fn quantile(values: &[f64], q: f64) -> f64 {
    let mut sorted = defined(values);
    if sorted.is_empty() {
        return f64::NAN;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (pos - lower as f64)
}

/// Period-over-period percent change; the first element is NaN.
pub fn pct_change(values: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    if values.is_empty() {
        return out;
    }
    out.push(f64::NAN);
    for pair in values.windows(2) {
        out.push((pair[1] - pair[0]) / pair[0]);
    }
    out
}

pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    rolling(values, window, |w| w.iter().sum::<f64>() / w.len() as f64)
}

pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    rolling(values, window, sample_std)
}

fn rolling<F>(values: &[f64], window: usize, f: F) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    if window == 0 || values.len() < window {
        return vec![f64::NAN; values.len()];
    }
    let mut out = vec![f64::NAN; window - 1];
    for w in values.windows(window) {
        if w.iter().any(|v| v.is_nan()) {
            out.push(f64::NAN);
        } else {
            out.push(f(w));
        }
    }
    out
}

/// Non-adjusted exponentially weighted mean with `alpha = 2 / (span + 1)`.
///
/// The recursion starts at the first defined value:
/// `ewm[0] = x[0]`, `ewm[t] = alpha * x[t] + (1 - alpha) * ewm[t - 1]`.
/// Outputs are NaN until `min_periods` defined observations have been seen.
/// A NaN after the start carries the previous mean forward, and its step still
/// decays the weight of that mean for the next defined value.
pub fn ewm_mean(values: &[f64], span: usize, min_periods: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let decay = 1.0 - alpha;
    let mut out = Vec::with_capacity(values.len());
    let mut current: Option<f64> = None;
    let mut old_weight = 1.0;
    let mut seen = 0usize;

    for &value in values {
        let observed = !value.is_nan();
        if let Some(prev) = current {
            old_weight *= decay;
            if observed {
                current = Some((old_weight * prev + alpha * value) / (old_weight + alpha));
                old_weight = 1.0;
            }
        } else if observed {
            current = Some(value);
        }
        if observed {
            seen += 1;
        }
        match current {
            Some(ewm) if seen >= min_periods.max(1) => out.push(ewm),
            _ => out.push(f64::NAN),
        }
    }
    out
}

fn defined(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| !v.is_nan()).collect()
}

fn complete_pairs(xs: &[f64], ys: &[f64]) -> (Vec<f64>, Vec<f64>) {
    xs.iter()
        .zip(ys)
        .filter(|(x, y)| !x.is_nan() && !y.is_nan())
        .map(|(x, y)| (*x, *y))
        .unzip()
}

#[cfg(test)]
pub(crate) fn assert_f64_vec_eq(a: &[f64], b: &[f64]) {
    assert_eq!(a.len(), b.len(), "Vectors differ in length");
    for (i, (val_a, val_b)) in a.iter().zip(b.iter()).enumerate() {
        if val_a.is_nan() && val_b.is_nan() {
            // Both are NaN, consider them equal
        } else {
            assert!((val_a - val_b).abs() < 1e-9, "Mismatch at index {}: {} != {}", i, val_a, val_b);
        }
    }
}

use crate::evaluator::{Bindings, Evaluator};
use serde::{Deserialize, Serialize};

/// Name of the single variable bound while sampling
pub const SAMPLE_VARIABLE: &str = "x";

/// One sample of an expression.
///
/// `y` is NaN when the expression could not be evaluated at `x`; such
/// samples stay in the series so it keeps its requested length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub x: f64,
    pub y: f64,
}

impl SeriesPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_plottable(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Ordered samples of an expression over a domain, ready for line rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub points: Vec<SeriesPoint>,
}

impl Series {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn xs(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.x).collect()
    }

    pub fn ys(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.y).collect()
    }

    /// Number of samples recorded as NaN
    pub fn unplottable_count(&self) -> usize {
        self.points.iter().filter(|p| !p.is_plottable()).count()
    }

    /// Smallest and largest finite x, if any
    pub fn x_bounds(&self) -> Option<(f64, f64)> {
        bounds(self.points.iter().map(|p| p.x))
    }

    /// Smallest and largest finite y, if any
    pub fn y_bounds(&self) -> Option<(f64, f64)> {
        bounds(self.points.iter().map(|p| p.y))
    }

    /// Splits the series into runs of consecutive plottable points.
    ///
    /// A NaN sample ends the current run, so the line is drawn with a gap
    /// there instead of bridging across the unplottable region.
    pub fn segments(&self) -> Vec<Vec<(f64, f64)>> {
        let mut segments = Vec::new();
        let mut current = Vec::new();

        for point in &self.points {
            if point.is_plottable() {
                current.push((point.x, point.y));
            } else if !current.is_empty() {
                segments.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }

        segments
    }
}

fn bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Computes the sample positions over `[xmin, xmax]`.
///
/// With fewer than two samples there is no step to compute: the single
/// position is `xmin`. Positions are weighted averages of the endpoints, so
/// both endpoints are hit exactly and `xmax - xmin` is never formed (it may
/// overflow for finite bounds).
pub fn sample_positions(xmin: f64, xmax: f64, sample_count: usize) -> Vec<f64> {
    if sample_count <= 1 {
        return vec![xmin];
    }

    let last = (sample_count - 1) as f64;
    let (lo, hi) = (xmin.min(xmax), xmin.max(xmax));
    (0..sample_count)
        .map(|i| {
            let t = i as f64 / last;
            (xmin * (1.0 - t) + xmax * t).max(lo).min(hi)
        })
        .collect()
}

/// Samples `expression` uniformly over `[xmin, xmax]`.
///
/// Every sample binds `x` and asks the evaluator for a value. Failures and
/// non-finite results are recorded as NaN for that sample only; the returned
/// series always holds `max(sample_count, 1)` points in order of position.
///
/// # Examples
/// ```
/// use funcplot::evaluator::MathEvaluator;
/// use funcplot::sampler::build_series;
///
/// let series = build_series(&MathEvaluator, "x^2", 0.0, 2.0, 3);
/// assert_eq!(series.ys(), vec![0.0, 1.0, 4.0]);
/// ```
pub fn build_series<E>(
    evaluator: &E,
    expression: &str,
    xmin: f64,
    xmax: f64,
    sample_count: usize,
) -> Series
where
    E: Evaluator + ?Sized,
{
    let mut bindings = Bindings::new();
    let points = sample_positions(xmin, xmax, sample_count)
        .into_iter()
        .map(|x| {
            bindings.insert(SAMPLE_VARIABLE.to_string(), x);
            let y = match evaluator.evaluate(expression, &bindings) {
                Ok(value) if value.is_finite() => value,
                _ => f64::NAN,
            };
            SeriesPoint::new(x, y)
        })
        .collect();

    Series { points }
}

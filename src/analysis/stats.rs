use std::fmt;
use std::time::Duration;

/// Append-only latency sample set, in milliseconds.
#[derive(Debug, Default)]
pub struct Statistics {
    samples: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatisticalSummary {
    pub count: usize,
    pub min: f64,
    pub mean: f64,
    pub max: f64,
    pub median: f64,
}

impl fmt::Display for StatisticalSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "min : {}, avg : {}, max : {}, median : {}",
            self.min, self.mean, self.max, self.median
        )
    }
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
        }
    }

    pub fn record(&mut self, elapsed: Duration) {
        self.samples.push(elapsed.as_nanos() as f64 / 1e6);
    }

    pub fn push(&mut self, value: f64) {
        self.samples.push(value);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn min(&self) -> Option<f64> {
        self.samples.iter().copied().reduce(f64::min)
    }

    pub fn max(&self) -> Option<f64> {
        self.samples.iter().copied().reduce(f64::max)
    }

    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<f64>() / self.samples.len() as f64)
    }

    /// Estimate at `pos = p/100 * (n + 1)`: below rank 1 yields the minimum,
    /// at or past rank n the maximum, otherwise linear interpolation between
    /// the two neighbouring order statistics.
    pub fn percentile(&self, p: f64) -> Option<f64> {
        if self.samples.is_empty() || !(0.0..=100.0).contains(&p) {
            return None;
        }
        let mut sorted = self.samples.clone();
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let pos = p / 100.0 * (n as f64 + 1.0);
        if pos < 1.0 {
            return Some(sorted[0]);
        }
        if pos >= n as f64 {
            return Some(sorted[n - 1]);
        }
        let rank = pos.floor() as usize;
        let frac = pos - pos.floor();
        let (lower, upper) = (sorted[rank - 1], sorted[rank]);
        Some(lower + frac * (upper - lower))
    }

    pub fn summary(&self) -> Option<StatisticalSummary> {
        Some(StatisticalSummary {
            count: self.samples.len(),
            min: self.min()?,
            mean: self.mean()?,
            max: self.max()?,
            median: self.percentile(50.0)?,
        })
    }
}

//! Latency series with gap detection for discontinuous sampling.

use serde::Serialize;

use super::SeriesError;

/// Closed interval `[start, end]` in the series' index space across which the
/// renderer must not draw a connecting line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Gap {
    pub start: usize,
    pub end: usize,
}

impl Gap {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Parallel timestamp/value sequences for one target.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LatencySeries {
    timestamps: Vec<i64>,
    values: Vec<Option<f64>>,
}

impl LatencySeries {
    /// Build a series, rejecting mismatched lengths and unsorted timestamps.
    pub fn new(timestamps: Vec<i64>, values: Vec<Option<f64>>) -> Result<Self, SeriesError> {
        if timestamps.len() != values.len() {
            return Err(SeriesError::LengthMismatch {
                timestamps: timestamps.len(),
                values: values.len(),
            });
        }
        if let Some(pos) = timestamps.windows(2).position(|w| w[1] < w[0]) {
            return Err(SeriesError::Unsorted { position: pos + 1 });
        }
        Ok(Self { timestamps, values })
    }

    pub fn timestamps(&self) -> &[i64] {
        &self.timestamps
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Runs of null values, each as the closed interval of its positions.
    pub fn null_runs(&self) -> Vec<Gap> {
        let mut runs = Vec::new();
        let mut run_start: Option<usize> = None;

        for (i, value) in self.values.iter().enumerate() {
            match (value, run_start) {
                (None, None) => run_start = Some(i),
                (Some(_), Some(start)) => {
                    runs.push(Gap::new(start, i - 1));
                    run_start = None;
                }
                _ => {}
            }
        }
        if let Some(start) = run_start {
            runs.push(Gap::new(start, self.values.len() - 1));
        }
        runs
    }

    /// Gaps between consecutive non-null samples further apart than
    /// `expected_step` seconds.
    pub fn step_gaps(&self, expected_step: i64) -> Vec<Gap> {
        (1..self.len())
            .filter(|&i| self.values[i - 1].is_some() && self.values[i].is_some())
            .filter(|&i| self.timestamps[i].saturating_sub(self.timestamps[i - 1]) > expected_step)
            .map(|i| Gap::new(i - 1, i))
            .collect()
    }

    /// All visual gaps: sampling outages merged with null runs, sorted by
    /// start position.
    pub fn gaps(&self, expected_step: i64) -> Vec<Gap> {
        merge_gaps(self.step_gaps(expected_step), self.null_runs())
    }

    /// Smallest, largest, and mean of the non-null values.
    pub fn stats(&self) -> Option<(f64, f64, f64)> {
        let present: Vec<f64> = self.values.iter().flatten().copied().collect();
        if present.is_empty() {
            return None;
        }
        let min = present.iter().copied().fold(f64::INFINITY, f64::min);
        let max = present.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = present.iter().sum::<f64>() / present.len() as f64;
        Some((min, max, mean))
    }
}

/// Merge two gap lists into one sorted, de-duplicated list.
pub fn merge_gaps(computed: Vec<Gap>, existing: Vec<Gap>) -> Vec<Gap> {
    let mut merged = computed;
    merged.extend(existing);
    merged.sort();
    merged.dedup();
    merged
}

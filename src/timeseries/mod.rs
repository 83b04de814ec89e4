/// Time-series aggregation for the target detail view.
///
/// Pure, synchronous transforms from raw samples supplied by the API into
/// render-ready shapes:
///
/// - [`incident_buckets`]: incident timestamps → 24 hourly tri-state buckets
/// - [`LatencySeries::gaps`]: latency samples → sorted visual-gap intervals
///
/// All time arithmetic is integer seconds.
mod incidents;
mod latency;

use thiserror::Error;

pub use incidents::{BUCKET_COUNT, Bucket, IncidentRow, incident_buckets, summarize};
pub use latency::{Gap, LatencySeries, merge_gaps};

/// A latency payload that cannot form a series.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeriesError {
    #[error("{timestamps} timestamps but {values} values")]
    LengthMismatch { timestamps: usize, values: usize },

    #[error("timestamps not ascending at position {position}")]
    Unsorted { position: usize },
}

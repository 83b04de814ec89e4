//! Hourly incident buckets for the trailing 24 hours.

use std::fmt;

use serde::Serialize;

/// Number of hourly buckets in an incident row.
pub const BUCKET_COUNT: usize = 24;

const SECONDS_PER_HOUR: i64 = 3600;

/// Health of a target during one hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    /// The target did not exist yet during this hour.
    Unknown,
    /// No incident was recorded during this hour.
    Healthy,
    /// At least one incident was recorded during this hour.
    Incident,
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Healthy => write!(f, "healthy"),
            Self::Incident => write!(f, "incident"),
        }
    }
}

/// Index 0 is the most recent hour, index 23 is 24 hours ago.
pub type IncidentRow = [Bucket; BUCKET_COUNT];

/// Bucket incident timestamps into the trailing 24 hours.
///
/// `timestamps` are incident times in epoch seconds, in any order. `now` is
/// the reference time and `target_age` the number of seconds since the
/// target was added.
///
/// Hours older than the target are forced to [`Bucket::Unknown`] after the
/// incidents are marked, so existence overrides health. Hour offsets always
/// floor; incidents in the future or older than 24 hours are ignored.
pub fn incident_buckets(timestamps: &[i64], now: i64, target_age: i64) -> IncidentRow {
    let mut marked = [false; BUCKET_COUNT];

    for &timestamp in timestamps {
        let offset = now.saturating_sub(timestamp).div_euclid(SECONDS_PER_HOUR);
        if (0..BUCKET_COUNT as i64).contains(&offset) {
            marked[offset as usize] = true;
        }
    }

    let age_hours = target_age.div_euclid(SECONDS_PER_HOUR);

    let mut row = [Bucket::Healthy; BUCKET_COUNT];
    for (offset, bucket) in row.iter_mut().enumerate() {
        *bucket = if offset as i64 > age_hours {
            Bucket::Unknown
        } else if marked[offset] {
            Bucket::Incident
        } else {
            Bucket::Healthy
        };
    }
    row
}

/// Count buckets of each kind: `(unknown, healthy, incident)`.
pub fn summarize(row: &IncidentRow) -> (usize, usize, usize) {
    row.iter().fold((0, 0, 0), |(u, h, i), bucket| match bucket {
        Bucket::Unknown => (u + 1, h, i),
        Bucket::Healthy => (u, h + 1, i),
        Bucket::Incident => (u, h, i + 1),
    })
}

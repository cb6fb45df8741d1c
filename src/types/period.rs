//! Time ranges and the partitioner that splits them into bounded sub-requests.

use crate::error::DdlError;
use crate::types::granularity::Granularity;
use crate::types::into_utc_trait::IntoUtcDateTime;
use chrono::{DateTime, Months, Utc};
use std::fmt;

/// A closed time range `[start, end]` in UTC with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Period {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Period {
    /// Creates a period, rejecting an inverted range.
    ///
    /// # Errors
    ///
    /// Returns [`DdlError::InvalidRange`] when `start` is after `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, DdlError> {
        if start > end {
            return Err(DdlError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Resolves two loosely typed instants (strings, naive or zoned datetimes) into a period.
    ///
    /// # Errors
    ///
    /// Returns [`DdlError::DateParsing`] if either end cannot be interpreted, and
    /// [`DdlError::InvalidRange`] when the resolved start is after the resolved end.
    pub fn resolve(start: impl IntoUtcDateTime, end: impl IntoUtcDateTime) -> Result<Self, DdlError> {
        let start = start.into_utc().ok_or(DdlError::DateParsing("start"))?;
        let end = end.into_utc().ok_or(DdlError::DateParsing("end"))?;
        Self::new(start, end)
    }

    /// Splits this period at the given granularity. See [`date_series`].
    pub fn split(&self, granularity: Granularity) -> Vec<Period> {
        date_series(self.start, self.end, granularity)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} .. {}", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

/// Splits `[start, end]` into contiguous, ordered sub-periods.
///
/// Boundaries are `start + n * step` for every `n` that stays within the range, followed by
/// `end` itself. Steps are counted from `start` with the day clamped to the end of shorter
/// months, so a range starting on the 31st does not skip February. A trailing zero-length
/// pair (range length an exact multiple of the step) is dropped when other pairs remain, so an
/// empty range (`start == end`) yields the single pair `[start, start]` at every granularity.
/// [`Granularity::Unsplit`] always returns exactly `[start, end]`.
///
/// `start > end` yields an empty list; callers validate the range through [`Period::new`].
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use ddl::{date_series, Granularity};
///
/// let start = Utc.with_ymd_and_hms(2018, 1, 1, 0, 0, 0).unwrap();
/// let end = Utc.with_ymd_and_hms(2018, 3, 1, 0, 0, 0).unwrap();
/// let slices = date_series(start, end, Granularity::Monthly);
/// assert_eq!(slices.len(), 2);
/// assert_eq!(slices[0].start, start);
/// assert_eq!(slices[1].end, end);
/// ```
pub fn date_series(start: DateTime<Utc>, end: DateTime<Utc>, granularity: Granularity) -> Vec<Period> {
    let Some(months) = granularity.months_per_step() else {
        return vec![Period { start, end }];
    };
    if start > end {
        return Vec::new();
    }

    let mut boundaries = Vec::new();
    for step in 0u32.. {
        match months
            .checked_mul(step)
            .and_then(|offset| start.checked_add_months(Months::new(offset)))
        {
            Some(boundary) if boundary <= end => boundaries.push(boundary),
            _ => break,
        }
    }
    boundaries.push(end);

    let mut series: Vec<Period> = boundaries
        .windows(2)
        .map(|pair| Period {
            start: pair[0],
            end: pair[1],
        })
        .collect();

    if series.len() > 1 && series.last().is_some_and(|last| last.start == last.end) {
        series.pop();
    }
    series
}

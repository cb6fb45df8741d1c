//! Defines the step size used to split long measurement requests into bounded sub-requests.

use std::fmt;

/// Granularity at which a requested time range is split before it is sent to the service.
///
/// The distribution layer caps the number of values in a single response. Some high-frequency
/// stations produce more values in one year than that cap allows, so the default is
/// [`Granularity::Monthly`]. Widen to [`Granularity::Yearly`] only for series known to be sparse.
///
/// # Examples
///
/// ```
/// use ddl::Granularity;
///
/// assert_eq!(Granularity::default(), Granularity::Monthly);
/// assert_eq!(Granularity::Yearly.to_string(), "yearly");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Granularity {
    /// One sub-request per calendar month, counted from the start of the range.
    #[default]
    Monthly,
    /// One sub-request per year, counted from the start of the range.
    Yearly,
    /// A single request covering the whole range.
    Unsplit,
}

impl Granularity {
    /// Number of months in one step, `None` when the range is not split.
    pub(crate) fn months_per_step(&self) -> Option<u32> {
        match self {
            Granularity::Monthly => Some(1),
            Granularity::Yearly => Some(12),
            Granularity::Unsplit => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Granularity::Monthly => "monthly",
            Granularity::Yearly => "yearly",
            Granularity::Unsplit => "unsplit",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

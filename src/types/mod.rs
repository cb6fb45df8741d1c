pub mod granularity;
pub mod into_utc_trait;
pub mod location;
pub mod period;

mod catalog;
mod config;
mod ddl;
mod error;
mod measurements;
mod request;
mod transport;
mod types;

#[cfg(test)]
mod test_support;

pub use catalog::{CatalogFilter, LOCATION_CODE_COLUMN};
pub use config::{DdlConfig, Endpoint, EndpointKind, DEFAULT_BASE_URL, MISSING_VALUE, NO_DATA_MESSAGE};
pub use ddl::Ddl;
pub use error::DdlError;

pub use measurements::flatten::{flatten_observations, FlatRow, NUMERIC_VALUE_COLUMN};
pub use measurements::frame::{
    clean_measurements, measurement_frame, SOURCE_TIME_COLUMN, TIME_COLUMN, TIME_ZONE,
};
pub use measurements::retrieve::{COUNT_COLUMN, COUNT_DAY_COLUMN, COUNT_MONTH_COLUMN, COUNT_YEAR_COLUMN};

pub use request::{
    availability_request, catalog_request, count_request, latest_observations_request,
    observations_request, CountPeriod,
};

pub use transport::error::TransportError;
pub use transport::{classify, HttpTransport, ServiceResponse, Transport};

pub use types::granularity::Granularity;
pub use types::into_utc_trait::IntoUtcDateTime;
pub use types::location::{CodePair, IntoLocation, Location};
pub use types::period::{date_series, Period};

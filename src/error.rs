use crate::transport::error::TransportError;
use chrono::{DateTime, Utc};
use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DdlError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Invalid range: start {start} is after end {end}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Expected a single location record, got a table with {rows} rows")]
    InvalidLocationShape { rows: usize },

    #[error("Location is missing required field '{0}'")]
    MissingField(String),

    #[error("Could not interpret the {0} of the requested range as a date")]
    DateParsing(&'static str),

    #[error("Field '{field}' has no matching '{field}{missing}'")]
    UnpairedCode {
        field: String,
        missing: &'static str,
    },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("DataFrame error: {0}")]
    DataFrame(#[from] PolarsError),
}

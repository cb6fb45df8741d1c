//! The client entry point: one [`Ddl`] value bundles configuration and transport.

use crate::catalog::{retrieve_locations, CatalogFilter};
use crate::config::DdlConfig;
use crate::error::DdlError;
use crate::measurements::retrieve::{
    check_available, retrieve_counts, retrieve_latest, retrieve_measurements,
};
use crate::request::CountPeriod;
use crate::transport::{HttpTransport, Transport};
use crate::types::granularity::Granularity;
use crate::types::into_utc_trait::IntoUtcDateTime;
use crate::types::location::IntoLocation;
use crate::types::period::Period;
use bon::bon;
use polars::prelude::DataFrame;

/// Client for the Rijkswaterstaat water-data service.
///
/// All calls block until the service has answered. The client holds no mutable state, so a
/// single instance can serve independent retrievals from several threads when its transport
/// allows it.
///
/// # Examples
///
/// ```no_run
/// use ddl::{Ddl, DdlError};
///
/// # fn main() -> Result<(), DdlError> {
/// let client = Ddl::new()?;
/// let locations = client.locations().call()?;
/// println!("{} station/quantity combinations", locations.height());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Ddl<T: Transport = HttpTransport> {
    config: DdlConfig,
    transport: T,
}

impl Ddl<HttpTransport> {
    /// Creates a client for the public service with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DdlError::Transport`] if the HTTP client cannot be initialized.
    pub fn new() -> Result<Self, DdlError> {
        Self::with_config(DdlConfig::default())
    }

    /// Creates a client with a custom configuration, e.g. another base URL.
    ///
    /// # Errors
    ///
    /// Returns [`DdlError::Transport`] if the HTTP client cannot be initialized.
    pub fn with_config(config: DdlConfig) -> Result<Self, DdlError> {
        let transport = HttpTransport::new(config.clone())?;
        Ok(Self { config, transport })
    }
}

#[bon]
impl<T: Transport> Ddl<T> {
    /// Creates a client that sends its requests through `transport`.
    pub fn with_transport(config: DdlConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &DdlConfig {
        &self.config
    }

    /// Fetches the location catalog as a table with one row per station and measured
    /// quantity.
    ///
    /// The first column is `Code`, the station code. Every `<name>.Code` column is accompanied
    /// by `<name>.Omschrijving`. A single row of this table can be passed as the `location` of
    /// [`Ddl::measurements`].
    ///
    /// # Arguments
    ///
    /// * `.filter(CatalogFilter)`: Optional. Metadata categories to include. Defaults to
    ///   [`CatalogFilter::default`].
    ///
    /// # Errors
    ///
    /// Returns [`DdlError::Transport`] when the request fails and
    /// [`DdlError::MalformedResponse`] when the reply lacks one of its three lists.
    #[builder]
    pub fn locations(&self, filter: Option<CatalogFilter>) -> Result<DataFrame, DdlError> {
        retrieve_locations(&self.transport, &filter.unwrap_or_default())
    }

    /// Retrieves all observations of one location between `start` and `end`.
    ///
    /// The range is requested in slices (monthly by default, since the service caps the size
    /// of a reply). Slices without data are skipped; any other failure aborts the whole
    /// retrieval. The result is cleaned unless `.clean(false)` is given: the raw `Tijdstip`
    /// column is dropped, duplicate rows are removed and rows are sorted by the time key `t`.
    /// When no slice has data the result is an empty frame.
    ///
    /// # Arguments
    ///
    /// * `.location(L)`: **Required.** A [`crate::Location`], a catalog record, or a
    ///   single-row catalog `DataFrame`.
    /// * `.start(S)` / `.end(E)`: **Required.** Bounds of the range: RFC 3339 or
    ///   `YYYY-MM-DD` strings, naive (read as UTC) or zoned chrono values.
    /// * `.freq(Granularity)`: Optional. Slice size. Defaults to [`Granularity::Monthly`].
    /// * `.clean(bool)`: Optional. Defaults to `true`.
    ///
    /// # Errors
    ///
    /// * [`DdlError::DateParsing`] or [`DdlError::InvalidRange`] for a bad range,
    /// * [`DdlError::InvalidLocationShape`], [`DdlError::MissingField`] or
    ///   [`DdlError::UnpairedCode`] for an unusable location,
    ///
    /// all before any request is sent. [`DdlError::Transport`] for a hard failure of any slice.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ddl::{Ddl, DdlError, Granularity};
    /// use polars::prelude::*;
    ///
    /// # fn main() -> Result<(), DdlError> {
    /// let client = Ddl::new()?;
    /// let catalog = client.locations().call()?;
    /// let den_helder = catalog
    ///     .lazy()
    ///     .filter(col("Code").eq(lit("DENHDR")))
    ///     .filter(col("Grootheid.Code").eq(lit("WATHTE")))
    ///     .collect()?;
    ///
    /// let levels = client
    ///     .measurements()
    ///     .location(&den_helder)
    ///     .start("1953-01-01")
    ///     .end("1953-04-01")
    ///     .freq(Granularity::Monthly)
    ///     .call()?;
    /// println!("{}", levels.head(Some(5)));
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub fn measurements<L, S, E>(
        &self,
        location: L,
        start: S,
        end: E,
        freq: Option<Granularity>,
        clean: Option<bool>,
    ) -> Result<DataFrame, DdlError>
    where
        L: IntoLocation,
        S: IntoUtcDateTime,
        E: IntoUtcDateTime,
    {
        let period = Period::resolve(start, end)?;
        let location = location.into_location()?;
        retrieve_measurements(
            &self.transport,
            &self.config,
            &location,
            &period,
            freq.unwrap_or_default(),
            clean.unwrap_or(true),
        )
    }

    /// The most recent observation of a location.
    ///
    /// # Errors
    ///
    /// Returns the location errors of [`Ddl::measurements`] and [`DdlError::Transport`]
    /// when the request fails.
    #[builder]
    pub fn latest_observation<L: IntoLocation>(&self, location: L) -> Result<DataFrame, DdlError> {
        let location = location.into_location()?;
        retrieve_latest(&self.transport, &self.config, &location)
    }

    /// Whether the service has any observation of a location between `start` and `end`.
    #[builder]
    pub fn measurements_available<L, S, E>(
        &self,
        location: L,
        start: S,
        end: E,
    ) -> Result<bool, DdlError>
    where
        L: IntoLocation,
        S: IntoUtcDateTime,
        E: IntoUtcDateTime,
    {
        let period = Period::resolve(start, end)?;
        let location = location.into_location()?;
        check_available(&self.transport, &location, &period)
    }

    /// Number of observations of a location per year, month or day.
    ///
    /// # Arguments
    ///
    /// * `.period(CountPeriod)`: Optional. Bucket size. Defaults to [`CountPeriod::Year`].
    /// * `.freq(Granularity)`: Optional. Slice size of the requests. Defaults to
    ///   [`Granularity::Yearly`]; counts are small, so wide slices are fine.
    #[builder]
    pub fn measurement_counts<L, S, E>(
        &self,
        location: L,
        start: S,
        end: E,
        period: Option<CountPeriod>,
        freq: Option<Granularity>,
    ) -> Result<DataFrame, DdlError>
    where
        L: IntoLocation,
        S: IntoUtcDateTime,
        E: IntoUtcDateTime,
    {
        let range = Period::resolve(start, end)?;
        let location = location.into_location()?;
        retrieve_counts(
            &self.transport,
            &location,
            &range,
            period.unwrap_or_default(),
            freq.unwrap_or(Granularity::Yearly),
        )
    }
}

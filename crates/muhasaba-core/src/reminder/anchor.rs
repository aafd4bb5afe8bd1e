//! Anchor time acquisition.
//!
//! One-shot per session: coordinates from a [`Locator`], then today's Fajr
//! time from a [`PrayerTimeService`]. Failures are reported, never retried
//! automatically.

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveTime, Timelike};
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use url::Url;

use crate::error::AnchorError;

/// Daily reference time at minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnchorTime(NaiveTime);

impl AnchorTime {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    /// Parses a leading `HH:MM`; anything after it (e.g. `" (EET)"`) is
    /// ignored.
    pub fn parse(raw: &str) -> Result<Self, AnchorError> {
        let bad = || AnchorError::LookupFailed(format!("unrecognised time '{raw}'"));
        let raw = raw.trim();
        let (hour, rest) = raw.split_once(':').ok_or_else(bad)?;
        let minute: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        if minute.len() != 2 || hour.is_empty() || hour.len() > 2 {
            return Err(bad());
        }
        let hour = hour.parse().map_err(|_| bad())?;
        let minute = minute.parse().map_err(|_| bad())?;
        Self::new(hour, minute).ok_or_else(bad)
    }

    pub fn time(self) -> NaiveTime {
        self.0
    }

    /// Time of day `minutes` earlier, wrapping past midnight.
    pub fn minus_minutes(self, minutes: u32) -> NaiveTime {
        let (time, _) = self
            .0
            .overflowing_sub_signed(Duration::minutes(i64::from(minutes)));
        time
    }
}

impl fmt::Display for AnchorTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0.hour(), self.0.minute())
    }
}

impl FromStr for AnchorTime {
    type Err = AnchorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for AnchorTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AnchorTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Source of device coordinates.
pub trait Locator {
    fn locate(&self) -> Result<Coordinates, AnchorError>;
}

/// Coordinates known ahead of time (configuration, command line).
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticLocator(Option<Coordinates>);

impl StaticLocator {
    pub fn new(coordinates: Option<Coordinates>) -> Self {
        Self(coordinates)
    }

    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Self {
        Self(latitude.zip(longitude).map(|(latitude, longitude)| Coordinates {
            latitude,
            longitude,
        }))
    }
}

impl Locator for StaticLocator {
    fn locate(&self) -> Result<Coordinates, AnchorError> {
        self.0.ok_or(AnchorError::CapabilityUnavailable)
    }
}

/// Looks up the day's Fajr time for a location.
pub trait PrayerTimeService {
    fn fajr_time(
        &self,
        at: Coordinates,
        date: NaiveDate,
    ) -> impl Future<Output = Result<AnchorTime, AnchorError>> + Send;
}

/// Client for the Aladhan timings API.
pub struct AladhanClient {
    http: Client,
    base_url: String,
    method: u32,
}

#[derive(Deserialize)]
struct TimingsResponse {
    data: TimingsData,
}

#[derive(Deserialize)]
struct TimingsData {
    timings: Timings,
}

#[derive(Deserialize)]
struct Timings {
    #[serde(rename = "Fajr")]
    fajr: String,
}

impl AladhanClient {
    pub fn new(base_url: impl Into<String>, method: u32) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            method,
        }
    }

    fn timings_url(&self, at: Coordinates, date: NaiveDate) -> Result<Url, AnchorError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| AnchorError::LookupFailed(e.to_string()))?;
        let day = date.format("%d-%m-%Y").to_string();
        url.path_segments_mut()
            .map_err(|_| AnchorError::LookupFailed(format!("invalid base url {}", self.base_url)))?
            .pop_if_empty()
            .extend(["v1", "timings", day.as_str()]);
        url.query_pairs_mut()
            .append_pair("latitude", &at.latitude.to_string())
            .append_pair("longitude", &at.longitude.to_string())
            .append_pair("method", &self.method.to_string());
        Ok(url)
    }
}

impl PrayerTimeService for AladhanClient {
    async fn fajr_time(&self, at: Coordinates, date: NaiveDate) -> Result<AnchorTime, AnchorError> {
        let url = self.timings_url(at, date)?;
        tracing::debug!(%url, "fetching prayer timings");
        let body: TimingsResponse = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        AnchorTime::parse(&body.data.timings.fajr)
    }
}

/// Coordinates, then lookup. The first failure wins.
pub async fn acquire<L, P>(locator: &L, service: &P, today: NaiveDate) -> Result<AnchorTime, AnchorError>
where
    L: Locator,
    P: PrayerTimeService,
{
    let coordinates = locator.locate()?;
    service.fajr_time(coordinates, today).await
}

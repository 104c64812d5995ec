//! # METAR Fetching and Normalisation
//!
//! Pulls recent observations for every active airport from the aviationweather.gov
//! data API and reduces them to one [`StationCondition`] per station.
//!
//! ## Data Source
//! - **URL**: `https://aviationweather.gov/api/data/metar?ids=...&format=json&hours=N`
//! - **Format**: JSON array, newest observation first per station
//!
//! ## Normalisation rules
//! - The newest observation for a station wins; older ones are ignored
//! - Observations without a flight category are skipped (the LED keeps its value)
//! - Lightning is reported when the raw text mentions `LTG` or `TS` after the station
//!   identifier, unless it is `TSNO` (thunderstorm sensor out of service)
//! - Visibility strings such as `10+` are read as their numeric part
//!
//! Every request is bounded by the configured timeout; a timeout is reported like
//! any other fetch failure.

use crate::{FlightCategory, StationCondition, WeatherSnapshot};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

const METAR_URL: &str = "https://aviationweather.gov/api/data/metar";

/// hPa → inches of mercury
const HPA_TO_INHG: f32 = 0.029_53;

#[derive(Error, Debug)]
pub enum MetarError {
    /// HTTP request failed (network, timeout, server or protocol error)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON shape
    #[error("bad METAR response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("no airports to fetch")]
    NoStations,
}

/// One entry of the METAR API's JSON response. Only the fields we use.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetarReport {
    pub icao_id: String,
    #[serde(default)]
    pub obs_time: Option<i64>,
    #[serde(default)]
    pub flt_cat: Option<String>,
    #[serde(default)]
    pub wdir: Option<Value>,
    #[serde(default)]
    pub wspd: Option<f64>,
    #[serde(default)]
    pub wgst: Option<f64>,
    #[serde(default)]
    pub visib: Option<Value>,
    #[serde(default)]
    pub temp: Option<f64>,
    #[serde(default)]
    pub dewp: Option<f64>,
    /// Altimeter setting in hPa
    #[serde(default)]
    pub altim: Option<f64>,
    #[serde(default)]
    pub wx_string: Option<String>,
    #[serde(default)]
    pub raw_ob: Option<String>,
}

/// Build the request URL for the given station codes.
pub fn metar_url(codes: &[&str], hours: u32) -> String {
    format!(
        "{}?ids={}&format=json&hours={}",
        METAR_URL,
        codes.join(","),
        hours
    )
}

/// Fetch and normalise observations for `codes`.
pub async fn fetch(
    codes: &[&str],
    hours: u32,
    timeout: Duration,
) -> Result<WeatherSnapshot, MetarError> {
    if codes.is_empty() {
        return Err(MetarError::NoStations);
    }

    let url = metar_url(codes, hours);
    info!("Fetching METARs: {}", url);

    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("metar-map/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let body = client
        .get(&url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let snapshot = parse_response(&body)?;
    info!("Received conditions for {} of {} stations", snapshot.len(), codes.len());
    Ok(snapshot)
}

/// Parse a JSON response body into a snapshot.
pub fn parse_response(body: &str) -> Result<WeatherSnapshot, MetarError> {
    let reports: Vec<MetarReport> = serde_json::from_str(body)?;
    Ok(normalise(reports))
}

/// Keep the newest usable report per station.
pub fn normalise(reports: Vec<MetarReport>) -> WeatherSnapshot {
    let mut snapshot = WeatherSnapshot::new();
    for report in reports {
        let Some(condition) = to_condition(&report) else {
            warn!("Missing flight category for {}, skipping", report.icao_id);
            continue;
        };

        match snapshot.get(&condition.code) {
            Some(existing) if existing.observed_at >= condition.observed_at => {}
            _ => {
                debug!("{}", condition.summary());
                snapshot.insert(condition.code.clone(), condition);
            }
        }
    }
    snapshot
}

/// Convert one report; `None` if it carries no flight category.
pub fn to_condition(report: &MetarReport) -> Option<StationCondition> {
    let category = report.flt_cat.as_deref().filter(|c| !c.trim().is_empty())?;

    let mut condition = StationCondition::new(
        report.icao_id.trim().to_ascii_uppercase(),
        FlightCategory::parse(category),
    );
    condition.wind_speed_kt = knots(report.wspd);
    condition.wind_gust_kt = knots(report.wgst);
    condition.gust = report.wgst.is_some_and(|g| g > 0.0);
    condition.lightning = report.raw_ob.as_deref().is_some_and(has_lightning);
    condition.observed_at = report
        .obs_time
        .and_then(|t| DateTime::<Utc>::from_timestamp(t, 0))
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    condition.wind_dir = report.wdir.as_ref().and_then(value_text);
    condition.visibility_sm = report.visib.as_ref().and_then(leading_number);
    condition.temp_c = report.temp.map(|t| t.round() as i32);
    condition.dewpoint_c = report.dewp.map(|t| t.round() as i32);
    condition.altim_hg = report
        .altim
        .map(|hpa| (hpa as f32 * HPA_TO_INHG * 100.0).round() / 100.0);
    condition.wx = report.wx_string.clone();
    condition.raw_text = report.raw_ob.clone();
    Some(condition)
}

/// Thunderstorm or lightning in the raw METAR text.
///
/// The first four characters (the station identifier) are skipped so a station
/// such as `KTSO` never counts.
///
/// ```
/// use metar_map_lib::metar::has_lightning;
///
/// assert!(has_lightning("KBWI 121854Z 27012KT 10SM -TSRA"));
/// assert!(has_lightning("KDCA 121854Z 18005KT 10SM LTG DSNT W"));
/// assert!(!has_lightning("KBWI 121854Z 27012KT 10SM CLR TSNO"));
/// assert!(!has_lightning("KTSO 121854Z 00000KT 10SM CLR"));
/// ```
pub fn has_lightning(raw: &str) -> bool {
    let body = raw.get(4..).unwrap_or("");
    (body.contains("LTG") || body.contains("TS")) && !body.contains("TSNO")
}

fn knots(speed: Option<f64>) -> u32 {
    speed.map(|s| s.max(0.0).round() as u32).unwrap_or(0)
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn leading_number(value: &Value) -> Option<f32> {
    match value {
        Value::Number(n) => n.as_f64().map(|v| v as f32),
        Value::String(s) => s.trim_end_matches('+').trim().parse().ok(),
        _ => None,
    }
}

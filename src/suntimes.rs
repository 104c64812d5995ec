//! # Twilight Times Cache
//!
//! Per-station civil twilight, sunrise and sunset times live in `suntimes.csv`:
//!
//! ```text
//! code,twilight_start,sunrise,sunset,twilight_end
//! KBWI,09:32:10,10:01:44,00:27:31,00:57:05
//! ```
//!
//! All times are UTC `HH:MM:SS`. The file is refreshed from api.sunrise-sunset.org
//! (once a day is plenty) and read on every run. Rows that fail to parse are logged
//! and left out, which puts that station at full brightness.

use crate::twilight::{TwilightWindow, TIME_FORMAT};
use crate::Airport;
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

const SUNTIMES_URL: &str = "https://api.sunrise-sunset.org/json";
const HEADER: &str = "code,twilight_start,sunrise,sunset,twilight_end";

/// Time format of the sunrise-sunset API's default responses, e.g. `7:27:02 AM`
const API_TIME_FORMAT: &str = "%I:%M:%S %p";

#[derive(Error, Debug)]
pub enum SunTimesError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("suntimes IO: {0}")]
    Io(#[from] io::Error),

    #[error("sunrise-sunset API returned status {status} for {code}")]
    Api { code: String, status: String },

    #[error("unreadable time {value:?} for {code}")]
    BadTime { code: String, value: String },
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    results: ApiResults,
    status: String,
}

#[derive(Debug, Deserialize)]
struct ApiResults {
    sunrise: String,
    sunset: String,
    civil_twilight_begin: String,
    civil_twilight_end: String,
}

/// Read the twilight cache. A missing file yields an empty map.
pub fn load<P: AsRef<Path>>(
    path: P,
) -> Result<HashMap<String, TwilightWindow>, SunTimesError> {
    match fs::read_to_string(&path) {
        Ok(contents) => Ok(parse(&contents)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!(
                "No twilight file at {}, all stations at full brightness",
                path.as_ref().display()
            );
            Ok(HashMap::new())
        }
        Err(e) => Err(e.into()),
    }
}

/// Parse twilight CSV text, dropping rows that don't hold four valid times.
///
/// The header row is optional.
pub fn parse(contents: &str) -> HashMap<String, TwilightWindow> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(contents.as_bytes());

    let mut windows = HashMap::new();
    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                warn!("suntimes: {}, skipping", e);
                continue;
            }
        };
        let line = record.position().map_or(0, |p| p.line());
        let fields: Vec<&str> = record.iter().collect();
        let &[code, start, rise, set, end] = fields.as_slice() else {
            warn!("suntimes line {}: expected 5 fields, skipping", line);
            continue;
        };
        if code.eq_ignore_ascii_case("code") {
            continue;
        }
        match TwilightWindow::parse(start, rise, set, end) {
            Ok(window) => {
                windows.insert(code.to_ascii_uppercase(), window);
            }
            Err(e) => warn!("suntimes line {} ({}): {}, skipping", line, code, e),
        }
    }
    debug!("Loaded twilight windows for {} stations", windows.len());
    windows
}

/// Render windows as twilight CSV, in the given code order.
pub fn to_csv(rows: &[(String, TwilightWindow)]) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');
    for (code, w) in rows {
        out.push_str(&format!(
            "{},{},{},{},{}\n",
            code,
            w.twilight_start.format(TIME_FORMAT),
            w.sunrise.format(TIME_FORMAT),
            w.sunset.format(TIME_FORMAT),
            w.twilight_end.format(TIME_FORMAT)
        ));
    }
    out
}

/// Fetch today's windows for every active airport and rewrite the cache file.
pub async fn refresh<P: AsRef<Path>>(
    airports: &[Airport],
    date: NaiveDate,
    path: P,
    timeout: Duration,
) -> Result<HashMap<String, TwilightWindow>, SunTimesError> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    let mut rows = Vec::new();

    for airport in airports.iter().filter(|a| !a.is_placeholder()) {
        let url = format!(
            "{}?lat={}&lng={}&date={}",
            SUNTIMES_URL,
            airport.lat,
            airport.lon,
            date.format("%Y-%m-%d")
        );
        let response: ApiResponse = client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        rows.push((airport.code.clone(), to_window(&airport.code, response)?));
    }

    fs::write(&path, to_csv(&rows))?;
    info!(
        "Wrote twilight times for {} stations to {}",
        rows.len(),
        path.as_ref().display()
    );
    Ok(rows.into_iter().collect())
}

fn to_window(code: &str, response: ApiResponse) -> Result<TwilightWindow, SunTimesError> {
    if response.status != "OK" {
        return Err(SunTimesError::Api {
            code: code.to_string(),
            status: response.status,
        });
    }
    let r = &response.results;
    let time = |value: &str| {
        NaiveTime::parse_from_str(value.trim(), API_TIME_FORMAT).map_err(|_| {
            SunTimesError::BadTime {
                code: code.to_string(),
                value: value.to_string(),
            }
        })
    };
    Ok(TwilightWindow::new(
        time(&r.civil_twilight_begin)?,
        time(&r.sunrise)?,
        time(&r.sunset)?,
        time(&r.civil_twilight_end)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    const CSV: &str = "code,twilight_start,sunrise,sunset,twilight_end\n\
                       KBWI,09:32:10,10:01:44,00:27:31,00:57:05\n\
                       KDCA,bad,10:02:00,00:28:00,00:57:00\n\
                       KIAD,09:35:00,10:04:00\n";

    #[test]
    fn test_parse_skips_malformed_rows() {
        let windows = parse(CSV);
        assert_eq!(windows.len(), 1);
        assert_eq!(
            windows["KBWI"].sunset,
            NaiveTime::from_hms_opt(0, 27, 31).unwrap()
        );
    }

    #[test]
    fn test_parse_quoted_fields_without_header() {
        let windows = parse("\"kbwi\",\"09:32:10\",10:01:44,00:27:31,00:57:05\n");
        assert_eq!(windows["KBWI"], parse(CSV)["KBWI"]);
    }

    #[test]
    fn test_csv_roundtrip_preserves_times() {
        let windows = parse(CSV);
        let rows = vec![("KBWI".to_string(), windows["KBWI"])];
        assert_eq!(parse(&to_csv(&rows)), windows);
    }

    #[test]
    fn test_missing_file_is_empty() {
        assert!(load("/nonexistent/suntimes.csv").unwrap().is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), CSV).unwrap();
        assert!(load(file.path()).unwrap().contains_key("KBWI"));
    }

    #[test]
    fn test_api_response_conversion() {
        let response: ApiResponse = serde_json::from_str(
            r#"{"results":{"sunrise":"10:01:44 AM","sunset":"12:27:31 AM",
                "solar_noon":"5:14:37 PM","day_length":"14:25:47",
                "civil_twilight_begin":"9:32:10 AM","civil_twilight_end":"12:57:05 AM"},
               "status":"OK"}"#,
        )
        .unwrap();
        let window = to_window("KBWI", response).unwrap();
        assert_eq!(window, parse(CSV)["KBWI"]);
    }

    #[test]
    fn test_api_error_status() {
        let response = ApiResponse {
            results: ApiResults {
                sunrise: String::new(),
                sunset: String::new(),
                civil_twilight_begin: String::new(),
                civil_twilight_end: String::new(),
            },
            status: "INVALID_REQUEST".to_string(),
        };
        assert!(matches!(
            to_window("KBWI", response),
            Err(SunTimesError::Api { .. })
        ));
    }
}

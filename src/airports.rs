//! Airport list and display subset loading.
//!
//! `airports.csv` has a header row naming at least `code`, `lat` and `lon`; each
//! following row is one LED in strip order. Rows whose code is `NULL` are
//! placeholders: they occupy an LED but never light it, and may leave lat/lon blank.

use crate::Airport;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum AirportError {
    #[error("airport file IO: {0}")]
    Io(#[from] io::Error),

    #[error("airport file is not valid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("airport file has no header row")]
    Empty,

    #[error("airport file header is missing the {0:?} column")]
    MissingColumn(&'static str),

    #[error("line {line}: {reason}")]
    BadRow { line: usize, reason: String },
}

/// Load the airport list from a CSV file.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<Airport>, AirportError> {
    let contents = fs::read_to_string(path)?;
    parse(&contents)
}

/// Parse airport CSV text.
///
/// Fields may be quoted, so names such as `"Baltimore, MD"` don't shift the
/// columns after them. Short rows are padded with blanks.
///
/// ```
/// use metar_map_lib::airports::parse;
///
/// let airports = parse("code,lat,lon\nKBWI,39.17,-76.67\nNULL,,\n").unwrap();
/// assert_eq!(airports.len(), 2);
/// assert!(airports[1].is_placeholder());
/// ```
pub fn parse(contents: &str) -> Result<Vec<Airport>, AirportError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(contents.as_bytes());

    let headers = reader.headers()?.clone();
    if headers.iter().all(str::is_empty) {
        return Err(AirportError::Empty);
    }
    let column = |name: &'static str| {
        headers
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
            .ok_or(AirportError::MissingColumn(name))
    };
    let (code_at, lat_at, lon_at) = (column("code")?, column("lat")?, column("lon")?);

    let mut airports = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line() as usize);
        let field = |at: usize| record.get(at).unwrap_or("");

        let code = field(code_at).to_ascii_uppercase();
        if code.is_empty() {
            return Err(AirportError::BadRow {
                line,
                reason: "empty airport code".to_string(),
            });
        }

        let airport = if code == crate::PLACEHOLDER_CODE {
            Airport::placeholder()
        } else {
            let coordinate = |at: usize, name: &str| {
                field(at).parse::<f64>().map_err(|_| AirportError::BadRow {
                    line,
                    reason: format!("bad {} {:?} for {}", name, field(at), code),
                })
            };
            let (lat, lon) = (coordinate(lat_at, "lat")?, coordinate(lon_at, "lon")?);
            Airport::new(code.clone(), lat, lon)
        };
        airports.push(airport);
    }

    info!(
        "Loaded {} LED slots ({} placeholders)",
        airports.len(),
        airports.iter().filter(|a| a.is_placeholder()).count()
    );
    Ok(airports)
}

/// Load the optional display subset, one code per line.
///
/// A missing file means no filter.
pub fn load_display_filter<P: AsRef<Path>>(
    path: P,
) -> Result<Option<HashSet<String>>, AirportError> {
    match fs::read_to_string(path) {
        Ok(contents) => {
            let codes: HashSet<String> = contents
                .lines()
                .map(|line| line.trim().to_ascii_uppercase())
                .filter(|line| !line.is_empty())
                .collect();
            info!("Using subset of {} airports for LED display", codes.len());
            Ok(Some(codes))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("No display subset, colouring all airports");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Codes worth asking the weather service about, in strip order.
pub fn active_codes(airports: &[Airport]) -> Vec<&str> {
    airports
        .iter()
        .filter(|a| !a.is_placeholder())
        .map(|a| a.code.as_str())
        .collect()
}

//! # METAR Map Core Library
//!
//! This library turns live aviation weather into colours on an addressable LED
//! strip, one LED per airport. It is meant to run on a Raspberry Pi driving a
//! WS2812 strip glued behind a sectional chart.
//!
//! ## Design Philosophy
//!
//! ### Pure rendering core
//! - **Classification** ([`classifier`]) and **brightness** ([`twilight`]) are pure
//!   functions of a station's condition, the animation phase and the clock
//! - **Frames** ([`frame`]) mark every slot as either a colour or "unchanged", so a
//!   station with no data keeps whatever the strip already shows
//! - **The loop** ([`animation`]) is the only place holding state: the phase flag and
//!   the remaining tick count
//!
//! ### Collaborators at the edges
//! Fetching METARs, twilight times and the overlay reference point happens once per
//! run, before the loop starts. The loop receives one immutable [`WeatherSnapshot`].
//!
//! ### Data Flow
//! 1. **Load**: config → airport list → subset filter
//! 2. **Fetch**: METAR snapshot, twilight windows, reference point (bounded by timeout)
//! 3. **Animate**: classify every slot → flush → ring sweep → sleep → toggle phase
//!
//! ## Core Types
//! - [`FlightCategory`]: VFR / MVFR / IFR / LIFR, or unknown
//! - [`StationCondition`]: one station's normalised observation
//! - [`Airport`]: one LED slot from the airport list

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub mod airports;
pub mod animation;
pub mod classifier;
pub mod config;
pub mod frame;
pub mod iss;
pub mod legend;
pub mod metar;
pub mod overlay;
pub mod renderer;
pub mod strip;
pub mod suntimes;
pub mod twilight;
pub mod ws2812;

/// Colour of a single LED, in true RGB order.
///
/// Channel re-ordering for the physical strip (GRB on WS2812) is the
/// driver's job, never the renderer's.
pub type Rgb = smart_leds::RGB8;

/// Visibility/ceiling flight category of a station, ordered by severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlightCategory {
    Vfr,
    Mvfr,
    Ifr,
    Lifr,
    /// Reported, but not one of the four categories we know how to colour.
    Unknown,
}

impl FlightCategory {
    /// Parse the category string used by the aviation weather feed.
    ///
    /// Anything unrecognised maps to [`FlightCategory::Unknown`] rather than
    /// an error, so it renders as the clear colour.
    ///
    /// ```
    /// use metar_map_lib::FlightCategory;
    ///
    /// assert_eq!(FlightCategory::parse("MVFR"), FlightCategory::Mvfr);
    /// assert_eq!(FlightCategory::parse(" lifr "), FlightCategory::Lifr);
    /// assert_eq!(FlightCategory::parse("VLIFR"), FlightCategory::Unknown);
    /// ```
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "VFR" => FlightCategory::Vfr,
            "MVFR" => FlightCategory::Mvfr,
            "IFR" => FlightCategory::Ifr,
            "LIFR" => FlightCategory::Lifr,
            _ => FlightCategory::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FlightCategory::Vfr => "VFR",
            FlightCategory::Mvfr => "MVFR",
            FlightCategory::Ifr => "IFR",
            FlightCategory::Lifr => "LIFR",
            FlightCategory::Unknown => "UNKNOWN",
        }
    }
}

/// A normalised surface observation for one airport.
///
/// Only `flight_category`, the wind fields and `lightning` influence colour.
/// The remaining fields are carried for logging.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StationCondition {
    /// ICAO station identifier, e.g. `KBWI`
    pub code: String,
    pub flight_category: FlightCategory,
    /// Sustained wind in knots
    pub wind_speed_kt: u32,
    /// Gust speed in knots, 0 when no gust was reported
    pub wind_gust_kt: u32,
    /// True if the observation carried a gust group
    pub gust: bool,
    /// Thunderstorm or lightning reported in the raw text
    pub lightning: bool,
    pub observed_at: DateTime<Utc>,
    /// Wind direction in degrees, or `VRB`
    pub wind_dir: Option<String>,
    pub visibility_sm: Option<f32>,
    pub temp_c: Option<i32>,
    pub dewpoint_c: Option<i32>,
    pub altim_hg: Option<f32>,
    /// Present weather string, e.g. `-TSRA BR`
    pub wx: Option<String>,
    pub raw_text: Option<String>,
}

impl StationCondition {
    /// A calm observation with no optional fields, handy as a starting point.
    ///
    /// ```
    /// use metar_map_lib::{FlightCategory, StationCondition};
    ///
    /// let calm = StationCondition::new("KBWI", FlightCategory::Vfr);
    /// assert_eq!(calm.wind_speed_kt, 0);
    /// assert!(!calm.lightning);
    /// ```
    pub fn new(code: impl Into<String>, flight_category: FlightCategory) -> Self {
        Self {
            code: code.into(),
            flight_category,
            wind_speed_kt: 0,
            wind_gust_kt: 0,
            gust: false,
            lightning: false,
            observed_at: DateTime::<Utc>::UNIX_EPOCH,
            wind_dir: None,
            visibility_sm: None,
            temp_c: None,
            dewpoint_c: None,
            altim_hg: None,
            wx: None,
            raw_text: None,
        }
    }

    /// One-line summary in the classic `KBWI:VFR:270@12G20:10SM:...` shape.
    pub fn summary(&self) -> String {
        let gust = if self.gust {
            format!("G{}", self.wind_gust_kt)
        } else {
            String::new()
        };
        format!(
            "{}:{}:{}@{}{}:{}SM:{}:{}/{}:{}:{}",
            self.code,
            self.flight_category.as_str(),
            self.wind_dir.as_deref().unwrap_or(""),
            self.wind_speed_kt,
            gust,
            self.visibility_sm.map(|v| v.round() as i32).unwrap_or(0),
            self.wx.as_deref().unwrap_or(""),
            self.temp_c.unwrap_or(0),
            self.dewpoint_c.unwrap_or(0),
            self.altim_hg.unwrap_or(0.0),
            self.lightning
        )
    }
}

/// All observations for one run, keyed by station code.
pub type WeatherSnapshot = HashMap<String, StationCondition>;

/// Code reserved for LED slots that have no airport behind them.
pub const PLACEHOLDER_CODE: &str = "NULL";

/// One LED slot from the airport list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Airport {
    pub code: String,
    pub lat: f64,
    pub lon: f64,
}

impl Airport {
    pub fn new(code: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            code: code.into(),
            lat,
            lon,
        }
    }

    /// Placeholder slot occupying an LED index without a station.
    pub fn placeholder() -> Self {
        Self::new(PLACEHOLDER_CODE, 0.0, 0.0)
    }

    pub fn is_placeholder(&self) -> bool {
        self.code == PLACEHOLDER_CODE
    }
}

/// Build an [`Rgb`] from a config `[r, g, b]` triple.
pub fn rgb(channels: [u8; 3]) -> Rgb {
    Rgb::new(channels[0], channels[1], channels[2])
}

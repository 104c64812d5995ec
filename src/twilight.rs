//! # Twilight Brightness Interpolation
//!
//! Each station dims on its own schedule. Four boundaries per station (civil twilight
//! start, sunrise, sunset, civil twilight end, all UTC) split the day into:
//!
//! ```text
//!   dark  |  ramp up  |     full (1.0)     |  ramp down  |  dark
//! --------t1----------t2-------------------t3-----------t4--------
//! ```
//!
//! In continuous mode the ramps interpolate linearly between `dark` and `dim`; in
//! discrete mode they hold `dim` flat. A station with no usable window stays at full
//! brightness so a data error never blacks out the map.

use crate::config::BrightnessConfig;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use thiserror::Error;

/// Time-of-day format used by the twilight CSV
pub const TIME_FORMAT: &str = "%H:%M:%S";

#[derive(Error, Debug, PartialEq)]
pub enum TwilightError {
    #[error("bad twilight time {0:?}")]
    BadTime(String),
}

/// Four per-station day-cycle boundaries as times of day (UTC).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TwilightWindow {
    pub twilight_start: NaiveTime,
    pub sunrise: NaiveTime,
    pub sunset: NaiveTime,
    pub twilight_end: NaiveTime,
}

/// A [`TwilightWindow`] pinned to a date, boundaries non-decreasing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnchoredWindow {
    pub t1: DateTime<Utc>,
    pub t2: DateTime<Utc>,
    pub t3: DateTime<Utc>,
    pub t4: DateTime<Utc>,
}

impl TwilightWindow {
    pub fn new(
        twilight_start: NaiveTime,
        sunrise: NaiveTime,
        sunset: NaiveTime,
        twilight_end: NaiveTime,
    ) -> Self {
        Self {
            twilight_start,
            sunrise,
            sunset,
            twilight_end,
        }
    }

    /// Parse four `HH:MM:SS` strings.
    ///
    /// ```
    /// use metar_map_lib::twilight::TwilightWindow;
    ///
    /// let window = TwilightWindow::parse("10:41:12", "11:08:40", "23:32:02", "23:59:30").unwrap();
    /// assert_eq!(window.sunrise.to_string(), "11:08:40");
    /// assert!(TwilightWindow::parse("10:41", "x", "", "25:00:00").is_err());
    /// ```
    pub fn parse(
        twilight_start: &str,
        sunrise: &str,
        sunset: &str,
        twilight_end: &str,
    ) -> Result<Self, TwilightError> {
        Ok(Self::new(
            parse_time(twilight_start)?,
            parse_time(sunrise)?,
            parse_time(sunset)?,
            parse_time(twilight_end)?,
        ))
    }

    /// Pin the window to `date`, pushing any boundary that falls before its
    /// predecessor onto the next day.
    pub fn anchored(&self, date: NaiveDate) -> AnchoredWindow {
        let at = |time: NaiveTime| date.and_time(time).and_utc();
        let t1 = at(self.twilight_start);
        let t2 = not_before(at(self.sunrise), t1);
        let t3 = not_before(at(self.sunset), t2);
        let t4 = not_before(at(self.twilight_end), t3);
        AnchoredWindow { t1, t2, t3, t4 }
    }
}

impl AnchoredWindow {
    fn shifted(&self, by: Duration) -> Self {
        Self {
            t1: self.t1 + by,
            t2: self.t2 + by,
            t3: self.t3 + by,
            t4: self.t4 + by,
        }
    }
}

fn parse_time(raw: &str) -> Result<NaiveTime, TwilightError> {
    NaiveTime::parse_from_str(raw.trim(), TIME_FORMAT)
        .map_err(|_| TwilightError::BadTime(raw.to_string()))
}

fn not_before(t: DateTime<Utc>, previous: DateTime<Utc>) -> DateTime<Utc> {
    if t < previous {
        t + Duration::days(1)
    } else {
        t
    }
}

/// Brightness scalar for a station at `now`, in `[dark, 1.0]`.
///
/// Missing windows yield full brightness.
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use metar_map_lib::config::BrightnessConfig;
/// use metar_map_lib::twilight::{brightness, TwilightWindow};
///
/// let window = TwilightWindow::parse("06:00:00", "07:00:00", "19:00:00", "20:00:00").unwrap();
/// let config = BrightnessConfig::default();
/// let now = Utc.with_ymd_and_hms(2025, 3, 1, 6, 30, 0).unwrap();
/// assert!((brightness(Some(&window), now, &config) - 0.12).abs() < 1e-9);
/// assert_eq!(brightness(None, now, &config), 1.0);
/// ```
pub fn brightness(
    window: Option<&TwilightWindow>,
    now: DateTime<Utc>,
    config: &BrightnessConfig,
) -> f64 {
    let Some(window) = window else {
        return 1.0;
    };

    let mut anchored = window.anchored(now.date_naive());
    if now < anchored.t1 {
        // Evening twilight west of Greenwich runs past 00:00 UTC
        let yesterday = anchored.shifted(-Duration::days(1));
        if now < yesterday.t4 {
            anchored = yesterday;
        }
    }

    brightness_in(&anchored, now, config)
}

/// Brightness against an already anchored window.
pub fn brightness_in(
    window: &AnchoredWindow,
    now: DateTime<Utc>,
    config: &BrightnessConfig,
) -> f64 {
    let AnchoredWindow { t1, t2, t3, t4 } = *window;
    let (dark, dim) = (config.dark, config.dim);

    if now < t1 || now >= t4 {
        dark
    } else if now < t2 {
        if config.continuous {
            dark + (dim - dark) * fraction(t1, t2, now)
        } else {
            dim
        }
    } else if now < t3 {
        1.0
    } else if config.continuous {
        dim - (dim - dark) * fraction(t3, t4, now)
    } else {
        dim
    }
}

/// Position of `now` within `[from, to)` as 0.0..1.0. Only called when the
/// interval is non-empty.
fn fraction(from: DateTime<Utc>, to: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let span = (to - from).num_milliseconds() as f64;
    let elapsed = (now - from).num_milliseconds() as f64;
    elapsed / span
}

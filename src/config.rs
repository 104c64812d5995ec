//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the metar-config.toml file.
//! Every tunable the renderer reads lives here: strip size, animation cadence, wind
//! thresholds, twilight brightness floors, legend placement, overlay sweep and colours.
//!
//! The loaded [`Config`] is an immutable value passed by reference into every
//! component; nothing reads configuration from global state.

use crate::{rgb, FlightCategory, Rgb};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE: &str = "metar-config.toml";

/// Errors raised by [`Config::validate`] and [`Config::save`].
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("config serialization failed: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("config IO: {0}")]
    Io(#[from] std::io::Error),
}

/// Application configuration loaded from metar-config.toml
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub strip: StripConfig,
    pub animation: AnimationConfig,
    pub brightness: BrightnessConfig,
    pub legend: LegendConfig,
    pub overlay: OverlayConfig,
    pub colors: ColorConfig,
    pub data: DataConfig,
}

/// Physical LED strip configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StripConfig {
    /// Number of LEDs on the strip (airports, placeholders and legend)
    pub led_count: usize,
    /// SPI device the WS2812 data line hangs off
    pub spi_device: String,
}

/// Wind and lightning animation configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Blink/fade stations according to wind conditions
    pub wind: bool,
    /// Flash stations reporting lightning
    pub lightning: bool,
    /// Use the category's fade colour instead of switching the LED off
    pub fade_instead_of_blink: bool,
    /// Sustained wind (knots) at which a station starts to blink/fade
    pub wind_blink_threshold: u32,
    /// Show very windy stations in the high-wind colour
    pub high_winds: bool,
    /// Wind or gust (knots) shown in the high-wind colour
    pub high_winds_threshold: u32,
    /// Animate every gusting station regardless of gust speed
    pub always_blink_for_gusts: bool,
    /// Seconds between animation ticks
    pub tick_interval_secs: f64,
    /// Total animation time for one run, in seconds
    pub total_seconds: f64,
}

/// Per-station twilight brightness configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BrightnessConfig {
    /// Scale each LED by its station's local twilight/sunrise/sunset times
    pub dynamic_suntime: bool,
    /// Ramp linearly through twilight instead of holding the dim level
    pub continuous: bool,
    /// Brightness at sunrise/sunset (0.0 - 1.0)
    pub dim: f64,
    /// Brightness at night (0.0 - 1.0)
    pub dark: f64,
}

/// Legend block configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LegendConfig {
    /// Show the seven legend LEDs after the last airport
    pub show: bool,
    /// LEDs to skip between the last airport and the first legend LED
    pub offset: usize,
}

/// Ring sweep overlay configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub enabled: bool,
    /// Fetch the live ISS position instead of using the fixed reference point
    pub track_iss: bool,
    /// Fixed sweep centre longitude (x)
    pub reference_lon: f64,
    /// Fixed sweep centre latitude (y)
    pub reference_lat: f64,
    /// Pause after each ring, in milliseconds
    pub ring_pause_ms: u64,
    pub highlight: [u8; 3],
}

/// Colours in true RGB order
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ColorConfig {
    pub vfr: [u8; 3],
    pub vfr_fade: [u8; 3],
    pub mvfr: [u8; 3],
    pub mvfr_fade: [u8; 3],
    pub ifr: [u8; 3],
    pub ifr_fade: [u8; 3],
    pub lifr: [u8; 3],
    pub lifr_fade: [u8; 3],
    pub clear: [u8; 3],
    pub lightning: [u8; 3],
    pub high_winds: [u8; 3],
}

/// Input files and fetch settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DataConfig {
    /// CSV with `code,lat,lon` columns, one row per LED slot
    pub airports_file: String,
    /// Optional list of codes, one per line, that participate in colouring
    pub display_airports_file: String,
    /// CSV cache of per-station twilight times
    pub suntimes_file: String,
    /// How far back to ask the METAR service for observations
    pub metar_hours: u32,
    /// Upper bound for every network request
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            strip: StripConfig::default(),
            animation: AnimationConfig::default(),
            brightness: BrightnessConfig::default(),
            legend: LegendConfig::default(),
            overlay: OverlayConfig::default(),
            colors: ColorConfig::default(),
            data: DataConfig::default(),
        }
    }
}

impl Default for StripConfig {
    fn default() -> Self {
        StripConfig {
            led_count: 150,
            spi_device: "/dev/spidev0.0".to_string(),
        }
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        AnimationConfig {
            wind: true,
            lightning: true,
            fade_instead_of_blink: true,
            wind_blink_threshold: 15,
            high_winds: true,
            high_winds_threshold: 25,
            always_blink_for_gusts: true,
            tick_interval_secs: 1.0,
            total_seconds: 300.0, // matches a 5 minute cron refresh
        }
    }
}

impl Default for BrightnessConfig {
    fn default() -> Self {
        BrightnessConfig {
            dynamic_suntime: true,
            continuous: true,
            dim: 0.2,
            dark: 0.04,
        }
    }
}

impl Default for LegendConfig {
    fn default() -> Self {
        LegendConfig {
            show: false,
            offset: 0,
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        OverlayConfig {
            enabled: true,
            track_iss: false,
            reference_lon: -80.3944,
            reference_lat: 36.66505,
            ring_pause_ms: 500,
            highlight: [255, 255, 255],
        }
    }
}

impl Default for ColorConfig {
    fn default() -> Self {
        ColorConfig {
            vfr: [0, 255, 0],
            vfr_fade: [0, 125, 0],
            mvfr: [0, 0, 255],
            mvfr_fade: [0, 0, 125],
            ifr: [255, 0, 0],
            ifr_fade: [125, 0, 0],
            lifr: [125, 0, 125],
            lifr_fade: [75, 0, 75],
            clear: [0, 0, 0],
            lightning: [255, 255, 255],
            high_winds: [255, 255, 0],
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            airports_file: "airports.csv".to_string(),
            display_airports_file: "displayairports".to_string(),
            suntimes_file: "suntimes.csv".to_string(),
            metar_hours: 5,
            request_timeout_secs: 30,
        }
    }
}

impl ColorConfig {
    /// Steady colour for a flight category; unknown categories are clear.
    pub fn base(&self, category: FlightCategory) -> Rgb {
        rgb(match category {
            FlightCategory::Vfr => self.vfr,
            FlightCategory::Mvfr => self.mvfr,
            FlightCategory::Ifr => self.ifr,
            FlightCategory::Lifr => self.lifr,
            FlightCategory::Unknown => self.clear,
        })
    }

    /// Faded colour for a flight category; unknown categories are clear.
    pub fn fade(&self, category: FlightCategory) -> Rgb {
        rgb(match category {
            FlightCategory::Vfr => self.vfr_fade,
            FlightCategory::Mvfr => self.mvfr_fade,
            FlightCategory::Ifr => self.ifr_fade,
            FlightCategory::Lifr => self.lifr_fade,
            FlightCategory::Unknown => self.clear,
        })
    }
}

impl AnimationConfig {
    /// True when any per-tick animation is on and the loop must run more than once
    pub fn is_animated(&self) -> bool {
        self.wind || self.lightning
    }

    /// High-wind threshold in knots, if the high-wind colour is in use
    pub fn high_winds_threshold(&self) -> Option<u32> {
        self.high_winds.then_some(self.high_winds_threshold)
    }
}

impl Config {
    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!(
                        "Loaded configuration from {} ({} LEDs)",
                        path.display(),
                        config.strip.led_count
                    );
                    config
                }
                Err(e) => {
                    warn!("Invalid config file format: {}", e);
                    warn!("Using default configuration");
                    Self::default()
                }
            },
            Err(_) => {
                info!(
                    "No config file found at {}, using default configuration",
                    path.display()
                );
                Self::default()
            }
        }
    }

    /// Check the cross-field constraints serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let b = &self.brightness;
        if !(0.0..=1.0).contains(&b.dark) || !(0.0..=1.0).contains(&b.dim) {
            return Err(ConfigError::Invalid(format!(
                "brightness levels must be within 0.0-1.0 (dark={}, dim={})",
                b.dark, b.dim
            )));
        }
        if b.dark >= b.dim {
            return Err(ConfigError::Invalid(format!(
                "dark brightness {} must be below dim brightness {}",
                b.dark, b.dim
            )));
        }
        let interval = self.animation.tick_interval_secs;
        if !interval.is_finite() || interval <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "tick interval must be a positive number of seconds, got {}",
                interval
            )));
        }
        let total = self.animation.total_seconds;
        if !total.is_finite() || total < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "total animation time must be a finite, non-negative number, got {}",
                total
            )));
        }
        if self.strip.led_count == 0 {
            return Err(ConfigError::Invalid("led_count must be at least 1".into()));
        }
        Ok(())
    }

    /// Save current configuration to the given path
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(&path, contents)?;
        info!("Configuration saved to {}", path.as_ref().display());
        Ok(())
    }
}

//! # Ring Sweep Overlay
//!
//! Periodically highlights stations lying within a widening band around a reference
//! point (the ISS ground track in the classic build). Ten half-open rings, each one
//! degree wide and overlapping the previous by half a degree, sweep outward; every
//! station outside the current ring shows its colour from the committed frame.
//!
//! Distances are flat-plane Euclidean in degrees with longitude as x and latitude as
//! y. That is an approximation, not a great-circle distance, and is fine for a
//! state-sized map.

use crate::strip::{LedStrip, StripError};
use crate::{Airport, Rgb};
use std::time::Duration;

/// Concentric ring intervals `[inner, outer)`, innermost first
pub const RINGS: [(f64, f64); 10] = [
    (0.0, 1.0),
    (0.5, 1.5),
    (1.0, 2.0),
    (1.5, 2.5),
    (2.0, 3.0),
    (2.5, 3.5),
    (3.0, 4.0),
    (3.5, 4.5),
    (4.0, 5.0),
    (4.5, 5.5),
];

/// Sweep centre; x is longitude, y is latitude
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReferencePoint {
    pub lon: f64,
    pub lat: f64,
}

/// A station's LED index and map position
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StationPosition {
    pub index: usize,
    pub lon: f64,
    pub lat: f64,
}

impl ReferencePoint {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    pub fn distance_to(&self, lon: f64, lat: f64) -> f64 {
        ((lon - self.lon).powi(2) + (lat - self.lat).powi(2)).sqrt()
    }
}

/// Map positions of every non-placeholder airport, keyed by LED index.
pub fn station_positions(airports: &[Airport]) -> Vec<StationPosition> {
    airports
        .iter()
        .enumerate()
        .filter(|(_, airport)| !airport.is_placeholder())
        .map(|(index, airport)| StationPosition {
            index,
            lon: airport.lon,
            lat: airport.lat,
        })
        .collect()
}

/// Pixels for one ring: highlight inside `[inner, outer)`, snapshot elsewhere.
pub fn ring_pass(
    reference: ReferencePoint,
    stations: &[StationPosition],
    snapshot: &[Rgb],
    ring: (f64, f64),
    highlight: Rgb,
) -> Vec<Rgb> {
    let (inner, outer) = ring;
    let mut pixels = snapshot.to_vec();
    for station in stations {
        let distance = reference.distance_to(station.lon, station.lat);
        if (inner..outer).contains(&distance) {
            if let Some(pixel) = pixels.get_mut(station.index) {
                *pixel = highlight;
            }
        }
    }
    pixels
}

/// Blocking pause between ring passes and animation ticks.
pub trait Delay {
    fn delay(&mut self, duration: Duration);
}

/// [`Delay`] backed by `std::thread::sleep`
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadDelay;

impl Delay for ThreadDelay {
    fn delay(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Drives a full sweep against the strip.
#[derive(Debug, Clone)]
pub struct Compositor {
    stations: Vec<StationPosition>,
    highlight: Rgb,
    ring_pause: Duration,
}

impl Compositor {
    pub fn new(stations: Vec<StationPosition>, highlight: Rgb, ring_pause: Duration) -> Self {
        Self {
            stations,
            highlight,
            ring_pause,
        }
    }

    /// Sweep all rings outward, flushing and pausing after each, then put the
    /// snapshot back so the strip ends exactly where it started.
    ///
    /// A failed ring flush stops the sweep, but the snapshot is still written back
    /// into the buffer so no highlight outlives the tick.
    pub fn sweep<S, D>(
        &self,
        strip: &mut S,
        delay: &mut D,
        reference: ReferencePoint,
        snapshot: &[Rgb],
    ) -> Result<(), StripError>
    where
        S: LedStrip + ?Sized,
        D: Delay + ?Sized,
    {
        for ring in RINGS {
            let pixels = ring_pass(reference, &self.stations, snapshot, ring, self.highlight);
            write_all(strip, &pixels);
            if let Err(e) = strip.flush() {
                write_all(strip, snapshot);
                return Err(e);
            }
            delay.delay(self.ring_pause);
        }

        write_all(strip, snapshot);
        strip.flush()
    }
}

fn write_all<S: LedStrip + ?Sized>(strip: &mut S, pixels: &[Rgb]) {
    for (index, color) in pixels.iter().enumerate() {
        strip.set_pixel(index, *color);
    }
}

//! # LED Strip Drivers
//!
//! The renderer talks to hardware through [`LedStrip`]: a pixel buffer plus a single
//! `flush` that pushes the whole buffer out at once. Nothing reaches the LEDs until
//! `flush`, so a half-built frame is never visible.
//!
//! Drivers:
//! - [`MemoryStrip`]: keeps every flushed frame, used by tests
//! - [`ConsoleStrip`]: prints an ASCII rendering on each flush (`--stdout`)
//! - `ws2812::Ws2812Strip`: SPI-driven WS2812 strip (feature `hardware`)

use crate::renderer::draw_ascii;
use crate::{Airport, Rgb};
use thiserror::Error;

/// Errors raised while pushing pixels to the strip.
#[derive(Error, Debug)]
pub enum StripError {
    /// Opening or configuring the device failed
    #[error("LED device setup failed: {0}")]
    Setup(String),

    /// Writing a frame to the device failed
    #[error("LED flush failed: {0}")]
    Flush(String),
}

/// A pixel-addressable LED strip with an explicit flush.
pub trait LedStrip {
    /// Number of LEDs
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Set one pixel in the buffer. Out-of-range indices are ignored.
    fn set_pixel(&mut self, index: usize, color: Rgb);

    /// Current buffer value of one pixel
    fn pixel(&self, index: usize) -> Option<Rgb> {
        self.pixels().get(index).copied()
    }

    /// The whole buffer, in LED order
    fn pixels(&self) -> &[Rgb];

    /// Push the buffer to the LEDs.
    fn flush(&mut self) -> Result<(), StripError>;
}

/// In-memory strip that records every flushed frame.
#[derive(Debug, Clone, Default)]
pub struct MemoryStrip {
    pixels: Vec<Rgb>,
    flushed: Vec<Vec<Rgb>>,
}

impl MemoryStrip {
    pub fn new(len: usize) -> Self {
        Self {
            pixels: vec![Rgb::default(); len],
            flushed: Vec::new(),
        }
    }

    /// Every frame passed to `flush`, oldest first
    pub fn flushed(&self) -> &[Vec<Rgb>] {
        &self.flushed
    }

    pub fn flush_count(&self) -> usize {
        self.flushed.len()
    }
}

impl LedStrip for MemoryStrip {
    fn len(&self) -> usize {
        self.pixels.len()
    }

    fn set_pixel(&mut self, index: usize, color: Rgb) {
        if let Some(pixel) = self.pixels.get_mut(index) {
            *pixel = color;
        }
    }

    fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    fn flush(&mut self) -> Result<(), StripError> {
        self.flushed.push(self.pixels.clone());
        Ok(())
    }
}

/// Development strip: renders the airport slots as ASCII on every flush.
pub struct ConsoleStrip {
    pixels: Vec<Rgb>,
    airports: Vec<Airport>,
    /// Print only every n-th flush, ring sweeps flush ten times per tick
    every: usize,
    flushes: usize,
}

impl ConsoleStrip {
    pub fn new(len: usize, airports: Vec<Airport>) -> Self {
        Self {
            pixels: vec![Rgb::default(); len],
            airports,
            every: 1,
            flushes: 0,
        }
    }

    /// Only print every `every`-th flush
    pub fn every(mut self, every: usize) -> Self {
        self.every = every.max(1);
        self
    }
}

impl LedStrip for ConsoleStrip {
    fn len(&self) -> usize {
        self.pixels.len()
    }

    fn set_pixel(&mut self, index: usize, color: Rgb) {
        if let Some(pixel) = self.pixels.get_mut(index) {
            *pixel = color;
        }
    }

    fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    fn flush(&mut self) -> Result<(), StripError> {
        if self.flushes % self.every == 0 {
            draw_ascii(&self.pixels, &self.airports);
        }
        self.flushes += 1;
        Ok(())
    }
}

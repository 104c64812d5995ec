// src/ws2812.rs
//! WS2812 ("NeoPixel") strip over the Pi's hardware SPI.
//!
//! The data line is clocked at 2.4 MHz so every WS2812 bit becomes three SPI bits:
//! `1` → `110`, `0` → `100`. Each pixel goes out in GRB order, followed by a low
//! reset period that latches the frame.

use crate::Rgb;

/// SPI clock that makes three SPI bits one 1.25 µs WS2812 bit
pub const SPI_HZ: u32 = 2_400_000;

/// Trailing zero bytes, ~300 µs low at 2.4 MHz (newer WS2812B need > 280 µs)
const RESET_BYTES: usize = 90;

/// Encode one data byte as three SPI bytes, MSB first.
fn encode_byte(byte: u8) -> [u8; 3] {
    let mut bits: u32 = 0;
    for i in (0..8).rev() {
        let pattern = if byte & (1 << i) != 0 { 0b110 } else { 0b100 };
        bits = (bits << 3) | pattern;
    }
    [(bits >> 16) as u8, (bits >> 8) as u8, bits as u8]
}

/// SPI payload for a whole strip, reset period included.
pub fn encode(pixels: &[Rgb]) -> Vec<u8> {
    let mut out = Vec::with_capacity(pixels.len() * 9 + RESET_BYTES);
    for pixel in pixels {
        for channel in [pixel.g, pixel.r, pixel.b] {
            out.extend_from_slice(&encode_byte(channel));
        }
    }
    out.resize(out.len() + RESET_BYTES, 0);
    out
}

#[cfg(all(target_os = "linux", feature = "hardware"))]
pub use hardware::Ws2812Strip;

#[cfg(all(target_os = "linux", feature = "hardware"))]
mod hardware {
    use super::{encode, SPI_HZ};
    use crate::strip::{LedStrip, StripError};
    use crate::Rgb;
    use embedded_hal::spi::SpiBus;
    use linux_embedded_hal::spidev::{SpiModeFlags, SpidevOptions};
    use linux_embedded_hal::SpidevBus;
    use tracing::info;

    pub struct Ws2812Strip {
        bus: SpidevBus,
        pixels: Vec<Rgb>,
    }

    impl Ws2812Strip {
        /// Open and configure the SPI device, e.g. `/dev/spidev0.0`.
        pub fn open(device: &str, len: usize) -> Result<Self, StripError> {
            let mut bus =
                SpidevBus::open(device).map_err(|e| StripError::Setup(format!("{device}: {e:?}")))?;

            let opts = SpidevOptions::new()
                .bits_per_word(8)
                .max_speed_hz(SPI_HZ)
                .mode(SpiModeFlags::SPI_MODE_0)
                .build();
            bus.configure(&opts)
                .map_err(|e| StripError::Setup(format!("{device}: {e:?}")))?;

            info!("WS2812 strip of {} LEDs on {} at {} Hz", len, device, SPI_HZ);
            Ok(Self {
                bus,
                pixels: vec![Rgb::default(); len],
            })
        }
    }

    impl LedStrip for Ws2812Strip {
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
            let payload = encode(&self.pixels);
            SpiBus::write(&mut self.bus, &payload)
                .and_then(|_| SpiBus::flush(&mut self.bus))
                .map_err(|e| StripError::Flush(format!("{e:?}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_byte_patterns() {
        // 0x00 → 100 100 100 100 100 100 100 100
        assert_eq!(encode_byte(0x00), [0b1001_0010, 0b0100_1001, 0b0010_0100]);
        // 0xFF → 110 110 110 110 110 110 110 110
        assert_eq!(encode_byte(0xFF), [0b1101_1011, 0b0110_1101, 0b1011_0110]);
        // 0x80 → 110 then seven 100s
        assert_eq!(encode_byte(0x80), [0b1101_0010, 0b0100_1001, 0b0010_0100]);
    }

    #[test]
    fn test_encode_is_grb_with_reset_tail() {
        let payload = encode(&[Rgb::new(0x00, 0xFF, 0x00)]);
        assert_eq!(payload.len(), 9 + RESET_BYTES);
        assert_eq!(&payload[0..3], &encode_byte(0xFF));
        assert_eq!(&payload[3..6], &encode_byte(0x00));
        assert!(payload[9..].iter().all(|&b| b == 0));
    }
}

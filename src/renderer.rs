//! # Terminal Rendering
//!
//! Development-mode output for running without a strip attached. Each LED becomes one
//! line: index, airport code, a true-colour swatch and the hex value. Slots past the
//! airport list (legend, spare LEDs) are only shown when lit.

use crate::{Airport, Rgb};

/// Render the strip as text, one LED per line.
pub fn render_ascii(pixels: &[Rgb], airports: &[Airport]) -> String {
    let mut out = String::with_capacity(pixels.len() * 48);
    for (index, pixel) in pixels.iter().enumerate() {
        let label = match airports.get(index) {
            Some(airport) if airport.is_placeholder() => "----",
            Some(airport) => airport.code.as_str(),
            None if *pixel == Rgb::default() => continue,
            None => "aux",
        };
        out.push_str(&format!(
            "{:>4} {:<5} {} {}\n",
            index,
            label,
            swatch(*pixel),
            hex(*pixel)
        ));
    }
    out
}

/// Print the strip to stdout
pub fn draw_ascii(pixels: &[Rgb], airports: &[Airport]) {
    // Clear screen and home the cursor so frames replace each other
    print!("\x1b[2J\x1b[H{}", render_ascii(pixels, airports));
}

fn swatch(color: Rgb) -> String {
    format!("\x1b[48;2;{};{};{}m    \x1b[0m", color.r, color.g, color.b)
}

fn hex(color: Rgb) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r, color.g, color.b)
}

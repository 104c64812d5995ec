//! Legend LEDs placed after the last airport.
//!
//! Seven slots in fixed order: VFR, MVFR, IFR, LIFR, lightning, windy, high winds.
//! The last three animate with the phase and only appear when their animation is on.

use crate::animation::AnimationPhase;
use crate::config::Config;
use crate::frame::Frame;
use crate::{rgb, Rgb};

/// Number of LEDs the legend block occupies
pub const LEGEND_LEN: usize = 7;

/// Legend colours; `None` leaves that LED untouched.
pub fn legend(phase: &AnimationPhase, config: &Config) -> [Option<Rgb>; LEGEND_LEN] {
    let colors = &config.colors;
    let animation = &config.animation;
    let vfr = rgb(colors.vfr);
    let animated = |on: Rgb| if phase.is_blink() { on } else { vfr };

    let windy = if animation.fade_instead_of_blink {
        rgb(colors.vfr_fade)
    } else {
        rgb(colors.clear)
    };

    [
        Some(vfr),
        Some(rgb(colors.mvfr)),
        Some(rgb(colors.ifr)),
        Some(rgb(colors.lifr)),
        animation.lightning.then(|| animated(rgb(colors.lightning))),
        animation.wind.then(|| animated(windy)),
        animation
            .high_winds_threshold()
            .filter(|_| animation.wind)
            .map(|_| animated(rgb(colors.high_winds))),
    ]
}

/// Write the legend into `frame` starting `config.legend.offset` LEDs after `start`.
pub fn render_legend(frame: &mut Frame, start: usize, phase: &AnimationPhase, config: &Config) {
    let first = start + config.legend.offset;
    for (k, color) in legend(phase, config).into_iter().enumerate() {
        if let Some(color) = color {
            frame.set(first + k, color);
        }
    }
}

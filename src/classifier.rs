//! Station condition → LED colour.
//!
//! Precedence, highest first: lightning (flash half of the cycle), high winds,
//! windy (both on the blink half), then the plain category colour.

use crate::animation::AnimationPhase;
use crate::config::Config;
use crate::{rgb, FlightCategory, Rgb, StationCondition};

/// What a station is showing this tick. Only used for logging and tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Indication {
    Lightning,
    HighWinds,
    Windy,
    Steady,
}

/// Pick the indication for a station under the current phase.
pub fn indication(
    condition: &StationCondition,
    phase: &AnimationPhase,
    config: &Config,
) -> Indication {
    let animation = &config.animation;

    if animation.lightning && condition.lightning && phase.is_flash() {
        return Indication::Lightning;
    }

    if !(animation.wind && phase.is_blink()) {
        return Indication::Steady;
    }

    if let Some(threshold) = animation.high_winds_threshold() {
        if condition.wind_speed_kt >= threshold || condition.wind_gust_kt >= threshold {
            return Indication::HighWinds;
        }
    }

    let gusting = condition.gust
        && (animation.always_blink_for_gusts
            || condition.wind_gust_kt > animation.wind_blink_threshold);
    if condition.wind_speed_kt >= animation.wind_blink_threshold || gusting {
        return Indication::Windy;
    }

    Indication::Steady
}

/// Colour for a station before any brightness scaling.
pub fn classify(condition: &StationCondition, phase: &AnimationPhase, config: &Config) -> Rgb {
    let colors = &config.colors;
    let category = condition.flight_category;

    match indication(condition, phase, config) {
        Indication::Lightning => rgb(colors.lightning),
        // Unknown categories have nothing to blink
        _ if category == FlightCategory::Unknown => rgb(colors.clear),
        Indication::HighWinds => rgb(colors.high_winds),
        Indication::Windy if config.animation.fade_instead_of_blink => colors.fade(category),
        Indication::Windy => rgb(colors.clear),
        Indication::Steady => colors.base(category),
    }
}

/// Multiply every channel by `brightness`, truncating toward zero.
///
/// ```
/// use metar_map_lib::{classifier::scale, Rgb};
///
/// assert_eq!(scale(Rgb::new(255, 125, 9), 0.5), Rgb::new(127, 62, 4));
/// ```
pub fn scale(color: Rgb, brightness: f64) -> Rgb {
    let channel = |c: u8| (f64::from(c) * brightness) as u8;
    Rgb::new(channel(color.r), channel(color.g), channel(color.b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn blink() -> AnimationPhase {
        AnimationPhase::new(true, 1)
    }

    fn flash() -> AnimationPhase {
        AnimationPhase::new(false, 1)
    }

    fn station(category: FlightCategory, wind: u32) -> StationCondition {
        let mut condition = StationCondition::new("KTEST", category);
        condition.wind_speed_kt = wind;
        condition
    }

    #[test]
    fn test_windy_vfr_fades_on_blink_phase() {
        let config = Config::default();
        let condition = station(FlightCategory::Vfr, 20);
        assert_eq!(classify(&condition, &blink(), &config), rgb(config.colors.vfr_fade));
        assert_eq!(classify(&condition, &flash(), &config), rgb(config.colors.vfr));
    }

    #[test]
    fn test_windy_blinks_off_without_fade() {
        let mut config = Config::default();
        config.animation.fade_instead_of_blink = false;
        let condition = station(FlightCategory::Mvfr, 18);
        assert_eq!(classify(&condition, &blink(), &config), rgb(config.colors.clear));
    }

    #[test]
    fn test_high_winds_beats_windy() {
        let config = Config::default();
        let condition = station(FlightCategory::Ifr, 30);
        assert_eq!(classify(&condition, &blink(), &config), rgb(config.colors.high_winds));

        let mut gusty = station(FlightCategory::Ifr, 10);
        gusty.gust = true;
        gusty.wind_gust_kt = 25;
        assert_eq!(classify(&gusty, &blink(), &config), rgb(config.colors.high_winds));
    }

    #[test]
    fn test_high_winds_disabled_falls_back_to_windy() {
        let mut config = Config::default();
        config.animation.high_winds = false;
        let condition = station(FlightCategory::Lifr, 40);
        assert_eq!(classify(&condition, &blink(), &config), rgb(config.colors.lifr_fade));
    }

    #[test]
    fn test_lightning_overrides_everything_on_flash_phase() {
        let config = Config::default();
        for category in [
            FlightCategory::Vfr,
            FlightCategory::Mvfr,
            FlightCategory::Ifr,
            FlightCategory::Lifr,
            FlightCategory::Unknown,
        ] {
            for wind in [0, 20, 40] {
                let mut condition = station(category, wind);
                condition.lightning = true;
                assert_eq!(
                    classify(&condition, &flash(), &config),
                    rgb(config.colors.lightning),
                    "{category:?} at {wind}kt"
                );
            }
        }
    }

    #[test]
    fn test_lightning_is_phase_gated() {
        let config = Config::default();
        let mut condition = station(FlightCategory::Mvfr, 0);
        condition.lightning = true;
        assert_eq!(classify(&condition, &blink(), &config), rgb(config.colors.mvfr));
    }

    #[test]
    fn test_lightning_animation_disabled() {
        let mut config = Config::default();
        config.animation.lightning = false;
        let mut condition = station(FlightCategory::Vfr, 0);
        condition.lightning = true;
        assert_eq!(classify(&condition, &flash(), &config), rgb(config.colors.vfr));
    }

    #[test]
    fn test_gusts_always_animate_when_configured() {
        let mut config = Config::default();
        let mut condition = station(FlightCategory::Vfr, 5);
        condition.gust = true;
        condition.wind_gust_kt = 12;
        assert_eq!(indication(&condition, &blink(), &config), Indication::Windy);

        config.animation.always_blink_for_gusts = false;
        assert_eq!(indication(&condition, &blink(), &config), Indication::Steady);

        condition.wind_gust_kt = 16;
        assert_eq!(indication(&condition, &blink(), &config), Indication::Windy);
    }

    #[test]
    fn test_wind_animation_disabled_is_steady() {
        let mut config = Config::default();
        config.animation.wind = false;
        let condition = station(FlightCategory::Vfr, 50);
        assert_eq!(classify(&condition, &blink(), &config), rgb(config.colors.vfr));
    }

    #[test]
    fn test_unknown_category_is_clear() {
        let config = Config::default();
        let calm = station(FlightCategory::Unknown, 0);
        let windy = station(FlightCategory::Unknown, 40);
        assert_eq!(classify(&calm, &flash(), &config), rgb(config.colors.clear));
        assert_eq!(classify(&windy, &blink(), &config), rgb(config.colors.clear));
    }

    #[test]
    fn test_classify_is_deterministic() {
        let config = Config::default();
        let condition = station(FlightCategory::Ifr, 22);
        let first = classify(&condition, &blink(), &config);
        let _ = classify(&station(FlightCategory::Vfr, 0), &flash(), &config);
        assert_eq!(classify(&condition, &blink(), &config), first);
    }

    #[test]
    fn test_scale_truncates() {
        assert_eq!(scale(Rgb::new(255, 255, 255), 0.12), Rgb::new(30, 30, 30));
        assert_eq!(scale(Rgb::new(0, 125, 1), 1.0), Rgb::new(0, 125, 1));
        assert_eq!(scale(Rgb::new(10, 20, 30), 0.0), Rgb::new(0, 0, 0));
    }
}

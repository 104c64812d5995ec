//! # Animation Loop
//!
//! The controller owns the strip, the phase and the tick counter for a whole run.
//! Each tick it:
//!
//! 1. classifies every airport slot into a full [`Frame`] (placeholders, filtered-out
//!    stations and stations without data stay unchanged)
//! 2. adds the legend block when enabled
//! 3. applies the frame and flushes once, then snapshots the strip
//! 4. sweeps the ring overlay against the snapshot
//! 5. sleeps one tick interval, toggles the phase and counts down
//!
//! Everything is single threaded and blocking; the delays are the only suspension
//! points. A failed flush ends that tick early and the next tick redraws everything.

use crate::classifier::{classify, indication, scale, Indication};
use crate::config::{AnimationConfig, Config};
use crate::frame::Frame;
use crate::legend::render_legend;
use crate::overlay::{station_positions, Compositor, Delay, ReferencePoint, ThreadDelay};
use crate::strip::{LedStrip, StripError};
use crate::twilight::{brightness, TwilightWindow};
use crate::{rgb, Airport, WeatherSnapshot};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::{debug, error, info};

/// Alternating animation flag plus the ticks left in this run.
///
/// `alternate == false` is the flash half of the cycle (lightning), `true` the
/// blink half (wind).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnimationPhase {
    pub alternate: bool,
    pub remaining: u32,
}

impl AnimationPhase {
    pub fn new(alternate: bool, remaining: u32) -> Self {
        Self {
            alternate,
            remaining,
        }
    }

    /// Wind blink/fade half of the cycle
    pub fn is_blink(&self) -> bool {
        self.alternate
    }

    /// Lightning half of the cycle
    pub fn is_flash(&self) -> bool {
        !self.alternate
    }

    pub fn is_finished(&self) -> bool {
        self.remaining == 0
    }

    /// Toggle the flag and count one tick down
    pub fn advance(&mut self) {
        self.alternate = !self.alternate;
        self.remaining = self.remaining.saturating_sub(1);
    }
}

/// Ticks in one run: the whole animation time when anything animates, otherwise a
/// single static render.
///
/// ```
/// use metar_map_lib::animation::tick_count;
/// use metar_map_lib::config::AnimationConfig;
///
/// let mut config = AnimationConfig::default();
/// config.total_seconds = 300.0;
/// config.tick_interval_secs = 1.0;
/// assert_eq!(tick_count(&config), 300);
///
/// config.wind = false;
/// config.lightning = false;
/// assert_eq!(tick_count(&config), 1);
/// ```
pub fn tick_count(config: &AnimationConfig) -> u32 {
    if !config.is_animated() {
        return 1;
    }
    let ticks = (config.total_seconds / config.tick_interval_secs).ceil();
    // Always draw at least once
    (ticks as u32).max(1)
}

/// Source of "now" for twilight brightness.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Everything the collaborators produced for one run.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    /// LED slots in strip order, placeholders included
    pub airports: Vec<Airport>,
    /// When present, only these codes are coloured
    pub display_filter: Option<HashSet<String>>,
    pub weather: WeatherSnapshot,
    pub twilight: HashMap<String, TwilightWindow>,
    /// Sweep centre; no sweep without one
    pub reference: Option<ReferencePoint>,
}

impl Scene {
    fn participates(&self, airport: &Airport) -> bool {
        !airport.is_placeholder()
            && self
                .display_filter
                .as_ref()
                .map_or(true, |filter| filter.contains(&airport.code))
    }
}

/// Outcome of a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u32,
    pub failed_flushes: u32,
}

pub struct AnimationController<S, D = ThreadDelay, C = SystemClock> {
    config: Config,
    scene: Scene,
    strip: S,
    delay: D,
    clock: C,
    compositor: Compositor,
    phase: AnimationPhase,
}

impl<S: LedStrip> AnimationController<S> {
    pub fn new(config: Config, scene: Scene, strip: S) -> Self {
        Self::with_timing(config, scene, strip, ThreadDelay, SystemClock)
    }
}

impl<S: LedStrip, D: Delay, C: Clock> AnimationController<S, D, C> {
    /// Build a controller with explicit delay and clock sources.
    pub fn with_timing(config: Config, scene: Scene, strip: S, delay: D, clock: C) -> Self {
        let compositor = Compositor::new(
            station_positions(&scene.airports),
            rgb(config.overlay.highlight),
            Duration::from_millis(config.overlay.ring_pause_ms),
        );
        let phase = AnimationPhase::new(false, tick_count(&config.animation));
        Self {
            config,
            scene,
            strip,
            delay,
            clock,
            compositor,
            phase,
        }
    }

    pub fn phase(&self) -> AnimationPhase {
        self.phase
    }

    pub fn strip(&self) -> &S {
        &self.strip
    }

    pub fn into_strip(self) -> S {
        self.strip
    }

    /// Build the full frame for the current phase.
    pub fn render_frame(&self, now: DateTime<Utc>) -> Frame {
        let mut frame = Frame::new(self.strip.len());

        for (index, airport) in self.scene.airports.iter().enumerate() {
            if !self.scene.participates(airport) {
                continue;
            }
            let Some(condition) = self.scene.weather.get(&airport.code) else {
                debug!("No observation for {}, leaving LED {} as is", airport.code, index);
                continue;
            };

            let mut color = classify(condition, &self.phase, &self.config);
            let level = if self.config.brightness.dynamic_suntime {
                let window = self.scene.twilight.get(&airport.code);
                if window.is_none() {
                    debug!("No twilight window for {}, full brightness", airport.code);
                }
                let level = brightness(window, now, &self.config.brightness);
                color = scale(color, level);
                level
            } else {
                1.0
            };

            debug!(
                "Setting LED {} for {} to {}{} {:?} (brightness {:.3})",
                index,
                airport.code,
                describe(indication(condition, &self.phase, &self.config)),
                condition.flight_category.as_str(),
                (color.r, color.g, color.b),
                level
            );
            frame.set(index, color);
        }

        if self.config.legend.show {
            render_legend(&mut frame, self.scene.airports.len(), &self.phase, &self.config);
        }

        frame
    }

    /// Run one tick without sleeping or advancing the phase.
    pub fn tick(&mut self) -> Result<(), StripError> {
        let frame = self.render_frame(self.clock.now());
        frame.apply_to(&mut self.strip);
        self.strip.flush()?;

        let snapshot = self.strip.pixels().to_vec();
        if self.config.overlay.enabled {
            if let Some(reference) = self.scene.reference {
                self.compositor
                    .sweep(&mut self.strip, &mut self.delay, reference, &snapshot)?;
            }
        }
        Ok(())
    }

    /// Animate until the tick counter reaches zero.
    pub fn run(&mut self) -> RunSummary {
        let interval = Duration::from_secs_f64(self.config.animation.tick_interval_secs);
        let mut summary = RunSummary::default();

        info!(
            "Animating {} ticks (wind: {}, lightning: {})",
            self.phase.remaining, self.config.animation.wind, self.config.animation.lightning
        );

        while !self.phase.is_finished() {
            if let Err(e) = self.tick() {
                error!("Tick {} failed: {}", summary.ticks + 1, e);
                summary.failed_flushes += 1;
            }
            summary.ticks += 1;

            self.delay.delay(interval);
            self.phase.advance();
        }

        info!("Done after {} ticks", summary.ticks);
        summary
    }
}

fn describe(indication: Indication) -> &'static str {
    match indication {
        Indication::Lightning => "lightning ",
        Indication::HighWinds => "very windy ",
        Indication::Windy => "windy ",
        Indication::Steady => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Slot;
    use crate::strip::MemoryStrip;
    use crate::{FlightCategory, StationCondition};
    use chrono::TimeZone;

    #[derive(Default)]
    struct NoDelay(u32);

    impl Delay for NoDelay {
        fn delay(&mut self, _duration: Duration) {
            self.0 += 1;
        }
    }

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn noon() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap())
    }

    fn scene() -> Scene {
        let mut weather = WeatherSnapshot::new();
        weather.insert(
            "KBWI".to_string(),
            StationCondition::new("KBWI", FlightCategory::Vfr),
        );
        weather.insert(
            "KDCA".to_string(),
            StationCondition::new("KDCA", FlightCategory::Ifr),
        );
        Scene {
            airports: vec![
                Airport::new("KBWI", 39.17, -76.67),
                Airport::placeholder(),
                Airport::new("KDCA", 38.85, -77.04),
                Airport::new("KIAD", 38.95, -77.46),
            ],
            weather,
            ..Scene::default()
        }
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.strip.led_count = 6;
        config.overlay.enabled = false;
        config
    }

    #[test]
    fn test_phase_advance() {
        let mut phase = AnimationPhase::new(false, 2);
        assert!(phase.is_flash());
        phase.advance();
        assert!(phase.is_blink());
        assert_eq!(phase.remaining, 1);
        phase.advance();
        assert!(phase.is_finished());
        phase.advance();
        assert_eq!(phase.remaining, 0);
    }

    #[test]
    fn test_tick_count_rounds_up() {
        let mut config = AnimationConfig::default();
        config.total_seconds = 10.0;
        config.tick_interval_secs = 3.0;
        assert_eq!(tick_count(&config), 4);
        config.total_seconds = 0.0;
        assert_eq!(tick_count(&config), 1);
    }

    #[test]
    fn test_render_frame_marks_missing_and_placeholder_unchanged() {
        let config = config();
        let colors = config.colors.clone();
        let controller = AnimationController::with_timing(
            config,
            scene(),
            MemoryStrip::new(6),
            NoDelay::default(),
            noon(),
        );
        let frame = controller.render_frame(noon().0);

        // no twilight windows, so full brightness
        assert_eq!(frame.get(0), Some(Slot::Color(rgb(colors.vfr))));
        assert_eq!(frame.get(1), Some(Slot::Unchanged));
        assert_eq!(frame.get(2), Some(Slot::Color(rgb(colors.ifr))));
        assert_eq!(frame.get(3), Some(Slot::Unchanged));
        assert_eq!(frame.get(4), Some(Slot::Unchanged));
    }

    #[test]
    fn test_display_filter_limits_colouring() {
        let mut scene = scene();
        scene.display_filter = Some(HashSet::from(["KDCA".to_string()]));
        let controller = AnimationController::with_timing(
            config(),
            scene,
            MemoryStrip::new(6),
            NoDelay::default(),
            noon(),
        );
        let frame = controller.render_frame(noon().0);
        assert_eq!(frame.get(0), Some(Slot::Unchanged));
        assert!(matches!(frame.get(2), Some(Slot::Color(_))));
    }

    #[test]
    fn test_twilight_scaling_applied() {
        let mut scene = scene();
        scene.twilight.insert(
            "KBWI".to_string(),
            TwilightWindow::parse("06:00:00", "07:00:00", "19:00:00", "20:00:00").unwrap(),
        );
        let controller = AnimationController::with_timing(
            config(),
            scene,
            MemoryStrip::new(6),
            NoDelay::default(),
            noon(),
        );
        let night = Utc.with_ymd_and_hms(2025, 6, 1, 23, 0, 0).unwrap();
        let frame = controller.render_frame(night);
        // 255 * 0.04 = 10.2
        assert_eq!(frame.get(0), Some(Slot::Color(crate::Rgb::new(0, 10, 0))));
    }

    #[test]
    fn test_run_counts_ticks_and_keeps_missing_pixels() {
        let mut config = config();
        config.animation.total_seconds = 5.0;
        let mut strip = MemoryStrip::new(6);
        strip.set_pixel(3, crate::Rgb::new(7, 7, 7));

        let mut controller =
            AnimationController::with_timing(config, scene(), strip, NoDelay::default(), noon());
        let summary = controller.run();

        assert_eq!(summary, RunSummary { ticks: 5, failed_flushes: 0 });
        assert!(controller.phase().is_finished());
        let strip = controller.into_strip();
        assert_eq!(strip.flush_count(), 5);
        assert_eq!(strip.pixel(3), Some(crate::Rgb::new(7, 7, 7)));
    }

    #[test]
    fn test_static_run_is_single_tick() {
        let mut config = config();
        config.animation.wind = false;
        config.animation.lightning = false;
        let mut controller = AnimationController::with_timing(
            config,
            scene(),
            MemoryStrip::new(6),
            NoDelay::default(),
            noon(),
        );
        assert_eq!(controller.run().ticks, 1);
    }
}

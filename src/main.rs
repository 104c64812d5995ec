//! # METAR Map Application Entry Point
//!
//! This binary crate wires the collaborators to the animation loop: it loads the
//! configuration and airport list, fetches weather, twilight times and the overlay
//! reference point, then animates the strip for one run (five minutes by default,
//! meant to be restarted by cron or a systemd timer).
//!
//! It supports both production mode (WS2812 strip over SPI) and development mode
//! (`--stdout`, ASCII output).

// Test modules
#[cfg(test)]
mod tests;

use anyhow::Context;
use chrono::Utc;
use std::env;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use metar_map_lib::animation::{AnimationController, Scene};
use metar_map_lib::config::{Config, CONFIG_FILE};
use metar_map_lib::legend::LEGEND_LEN;
use metar_map_lib::overlay::RINGS;
use metar_map_lib::strip::ConsoleStrip;
use metar_map_lib::{airports, iss, metar, suntimes};

/// Command line flags
struct Args {
    /// Render to the terminal instead of the LED strip
    stdout: bool,
    verbose: bool,
    /// Fetch fresh twilight times before animating
    refresh_suntimes: bool,
    config: String,
}

impl Args {
    fn parse() -> anyhow::Result<Self> {
        let mut args = Args {
            stdout: false,
            verbose: false,
            refresh_suntimes: false,
            config: CONFIG_FILE.to_string(),
        };
        let mut raw = env::args().skip(1);
        while let Some(arg) = raw.next() {
            match arg.as_str() {
                "--stdout" => args.stdout = true,
                "--verbose" | "-v" => args.verbose = true,
                "--refresh-suntimes" => args.refresh_suntimes = true,
                "--config" => {
                    args.config = raw.next().context("--config needs a path")?;
                }
                other => anyhow::bail!("unknown argument {other:?}"),
            }
        }
        Ok(args)
    }
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    let args = Args::parse()?;

    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Running metar-map at {}", Utc::now().format("%d/%m/%Y %H:%M"));

    let config = Config::load_from_path(&args.config);
    config.validate().context("configuration rejected")?;
    let data = &config.data;
    let timeout = Duration::from_secs(data.request_timeout_secs);

    let airports = airports::load(&data.airports_file)
        .with_context(|| format!("reading {}", data.airports_file))?;
    let display_filter = airports::load_display_filter(&data.display_airports_file)
        .with_context(|| format!("reading {}", data.display_airports_file))?;

    let legend_leds = if config.legend.show {
        config.legend.offset + LEGEND_LEN
    } else {
        0
    };
    let needed = airports.len() + legend_leds;
    if needed > config.strip.led_count {
        warn!(
            "{} LEDs configured but {} needed, the tail will not be shown",
            config.strip.led_count, needed
        );
    }

    // Create Tokio runtime for the network collaborators
    let rt = tokio::runtime::Runtime::new()?;
    let (weather, twilight, reference) = rt.block_on(async {
        let codes = airports::active_codes(&airports);
        let weather = metar::fetch(&codes, data.metar_hours, timeout)
            .await
            .context("METAR fetch failed")?;

        let twilight = if args.refresh_suntimes {
            suntimes::refresh(&airports, Utc::now().date_naive(), &data.suntimes_file, timeout)
                .await
                .context("twilight refresh failed")?
        } else {
            suntimes::load(&data.suntimes_file).context("reading twilight times")?
        };

        let reference = iss::reference_point(&config.overlay, timeout).await;
        anyhow::Ok((weather, twilight, reference))
    })?;

    info!(
        "Wind animation: {}, lightning animation: {}, dynamic twilight: {}",
        config.animation.wind, config.animation.lightning, config.brightness.dynamic_suntime
    );

    let scene = Scene {
        airports,
        display_filter,
        weather,
        twilight,
        reference,
    };

    // Development mode: ASCII output for testing
    if args.stdout {
        // Only print the committed frame, not the ring passes and restore after it
        let every = if scene.reference.is_some() { RINGS.len() + 2 } else { 1 };
        let strip = ConsoleStrip::new(config.strip.led_count, scene.airports.clone()).every(every);
        AnimationController::new(config, scene, strip).run();
        return Ok(());
    }

    #[cfg(all(target_os = "linux", feature = "hardware"))]
    {
        use metar_map_lib::ws2812::Ws2812Strip;

        let strip = Ws2812Strip::open(&config.strip.spi_device, config.strip.led_count)
            .context("LED strip initialisation failed")?;
        let summary = AnimationController::new(config, scene, strip).run();
        if summary.failed_flushes > 0 {
            warn!(
                "{} of {} ticks failed to reach the strip",
                summary.failed_flushes, summary.ticks
            );
        }
        return Ok(());
    }

    #[cfg(not(all(target_os = "linux", feature = "hardware")))]
    {
        let _ = scene;
        anyhow::bail!(
            "LED strip support not enabled; rebuild with --features hardware or use --stdout"
        )
    }
}

//! Overlay reference point: either fixed in config or the live ISS position.

use crate::config::OverlayConfig;
use crate::overlay::ReferencePoint;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

const ISS_URL: &str = "http://api.open-notify.org/iss-now.json";

#[derive(Error, Debug)]
pub enum IssError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("bad ISS position {0:?}")]
    BadPosition(String),
}

#[derive(Debug, Deserialize)]
struct IssNow {
    iss_position: IssPosition,
}

// open-notify sends the coordinates as strings
#[derive(Debug, Deserialize)]
struct IssPosition {
    latitude: String,
    longitude: String,
}

/// Current ISS ground position.
pub async fn fetch(timeout: Duration) -> Result<ReferencePoint, IssError> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    let now: IssNow = client
        .get(ISS_URL)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    to_point(&now.iss_position)
}

fn to_point(position: &IssPosition) -> Result<ReferencePoint, IssError> {
    let coordinate = |raw: &str| {
        raw.trim()
            .parse::<f64>()
            .map_err(|_| IssError::BadPosition(raw.to_string()))
    };
    Ok(ReferencePoint::new(
        coordinate(&position.longitude)?,
        coordinate(&position.latitude)?,
    ))
}

/// Sweep centre for this run, `None` when the overlay is off.
///
/// A failed ISS lookup falls back to the fixed point; the sweep is decoration and
/// never worth failing a run over.
pub async fn reference_point(config: &OverlayConfig, timeout: Duration) -> Option<ReferencePoint> {
    if !config.enabled {
        return None;
    }
    let fixed = ReferencePoint::new(config.reference_lon, config.reference_lat);
    if !config.track_iss {
        return Some(fixed);
    }
    match fetch(timeout).await {
        Ok(point) => {
            info!("ISS at lon {:.3}, lat {:.3}", point.lon, point.lat);
            Some(point)
        }
        Err(e) => {
            warn!("ISS position unavailable ({}), using fixed reference point", e);
            Some(fixed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_open_notify_payload() {
        let now: IssNow = serde_json::from_str(
            r#"{"message":"success","timestamp":1718200000,
                "iss_position":{"latitude":"36.6650","longitude":"-80.3944"}}"#,
        )
        .unwrap();
        let point = to_point(&now.iss_position).unwrap();
        assert_eq!(point, ReferencePoint::new(-80.3944, 36.665));
    }

    #[test]
    fn test_bad_coordinate() {
        let position = IssPosition {
            latitude: "north".to_string(),
            longitude: "0".to_string(),
        };
        assert!(matches!(to_point(&position), Err(IssError::BadPosition(_))));
    }

    #[tokio::test]
    async fn test_fixed_point_without_network() {
        let config = OverlayConfig::default();
        let point = reference_point(&config, Duration::from_secs(1)).await;
        assert_eq!(
            point,
            Some(ReferencePoint::new(config.reference_lon, config.reference_lat))
        );
    }

    #[tokio::test]
    async fn test_disabled_overlay_has_no_point() {
        let config = OverlayConfig {
            enabled: false,
            ..OverlayConfig::default()
        };
        assert_eq!(reference_point(&config, Duration::from_secs(1)).await, None);
    }
}

use matchmaker_client::{Coordinate, DEFAULT_BASE_URL};
use std::path::PathBuf;
use tracing::warn;

/// Runtime configuration, resolved once at startup and passed to commands.
/// Nothing reads the environment after this point.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_url: String,
    pub data_dir: PathBuf,
    /// User coordinate for distance annotation; the terminal client takes it
    /// from configuration instead of a geolocation capability.
    pub coordinate: Option<Coordinate>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let api_url =
            std::env::var("MATCHMAKER_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let data_dir = std::env::var("MATCHMAKER_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_data_dir());

        Self {
            api_url,
            data_dir,
            coordinate: coordinate_from_env(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    match std::env::var("HOME") {
        Ok(home) if !home.is_empty() => PathBuf::from(home).join(".matchmaker"),
        _ => PathBuf::from(".matchmaker"),
    }
}

fn coordinate_from_env() -> Option<Coordinate> {
    let lat = std::env::var("MATCHMAKER_LAT").ok();
    let lon = std::env::var("MATCHMAKER_LON").ok();
    match (lat, lon) {
        (Some(lat), Some(lon)) => match (lat.trim().parse(), lon.trim().parse()) {
            (Ok(lat), Ok(lon)) => Some(Coordinate { lat, lon }),
            _ => {
                warn!("MATCHMAKER_LAT/MATCHMAKER_LON are not valid numbers; ignoring");
                None
            }
        },
        (None, None) => None,
        _ => {
            warn!("only one of MATCHMAKER_LAT/MATCHMAKER_LON is set; ignoring");
            None
        }
    }
}

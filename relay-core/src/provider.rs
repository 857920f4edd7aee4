use crate::{
    Config, Coordinates, CurrentWeather,
    error::{RelayError, Result},
    provider::{nominatim::NominatimGeocoder, open_meteo::OpenMeteoForecaster},
};
use async_trait::async_trait;
use reqwest::Client;
use std::{fmt::Debug, sync::Arc};

pub mod nominatim;
pub mod open_meteo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    Nominatim,
    OpenMeteo,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Nominatim => "Nominatim",
            ProviderId::OpenMeteo => "Open-Meteo",
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolves a Brazilian city/state pair to coordinates.
#[async_trait]
pub trait GeocodeResolver: Send + Sync + Debug {
    /// `Ok(None)` means "not found"; `Err` is reserved for transport or decoding faults.
    async fn locate(&self, city: &str, state: &str) -> Result<Option<Coordinates>>;
}

/// Fetches the current weather at a point.
#[async_trait]
pub trait ForecastFetcher: Send + Sync + Debug {
    async fn current_weather(&self, coordinates: &Coordinates) -> Result<CurrentWeather>;
}

/// Shared outbound client; the configured timeout applies to every call.
pub fn http_client(config: &Config) -> Result<Client> {
    Client::builder()
        .timeout(config.request_timeout())
        .build()
        .map_err(RelayError::Client)
}

pub fn geocoder_from_config(config: &Config, http: Client) -> Arc<dyn GeocodeResolver> {
    Arc::new(NominatimGeocoder::new(
        config.geocoder.base_url.clone(),
        config.geocoder.user_agent.clone(),
        http,
    ))
}

pub fn forecaster_from_config(config: &Config, http: Client) -> Arc<dyn ForecastFetcher> {
    Arc::new(OpenMeteoForecaster::new(config.forecast.base_url.clone(), http))
}

/// Joins a configured base URL and an endpoint path without doubling slashes.
fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

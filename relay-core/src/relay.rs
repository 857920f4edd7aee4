//! The geocode-then-forecast pipeline behind `GET /weather`.

use std::sync::Arc;

use crate::{
    Config,
    error::{RelayError, Result},
    model::{Coordinates, CurrentWeather, WeatherQuery},
    provider::{
        ForecastFetcher, GeocodeResolver, forecaster_from_config, geocoder_from_config,
        http_client,
    },
};

#[derive(Debug, Clone)]
pub struct WeatherRelay {
    geocoder: Arc<dyn GeocodeResolver>,
    forecaster: Arc<dyn ForecastFetcher>,
}

impl WeatherRelay {
    pub fn new(geocoder: Arc<dyn GeocodeResolver>, forecaster: Arc<dyn ForecastFetcher>) -> Self {
        Self { geocoder, forecaster }
    }

    /// Build the relay against the configured providers, sharing one HTTP client.
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = http_client(config)?;
        Ok(Self::new(
            geocoder_from_config(config, http.clone()),
            forecaster_from_config(config, http),
        ))
    }

    /// Geocodes `city`/`state` when both are given; otherwise falls back to the
    /// default coordinates, even if one of the two was supplied.
    pub async fn resolve_coordinates(&self, query: &WeatherQuery) -> Result<Coordinates> {
        let Some((city, state)) = query.place() else {
            if query.city.is_some() || query.state.is_some() {
                tracing::debug!(?query, "Incomplete city/state pair, using default coordinates");
            }
            return Ok(Coordinates::default());
        };

        self.geocoder.locate(city, state).await?.ok_or_else(|| RelayError::PlaceNotFound {
            city: city.to_string(),
            state: state.to_string(),
        })
    }

    pub async fn current_weather(&self, query: &WeatherQuery) -> Result<CurrentWeather> {
        let coordinates = self.resolve_coordinates(query).await?;
        tracing::debug!(lat = %coordinates.latitude, lon = %coordinates.longitude, "Fetching current weather");
        self.forecaster.current_weather(&coordinates).await
    }
}

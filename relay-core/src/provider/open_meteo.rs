use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::{
    error::{RelayError, Result},
    model::{Coordinates, CurrentWeather},
};

use super::{ForecastFetcher, ProviderId, endpoint, truncate_body};

const PROVIDER: ProviderId = ProviderId::OpenMeteo;

/// Open-Meteo `/v1/forecast` client, current conditions only.
#[derive(Debug, Clone)]
pub struct OpenMeteoForecaster {
    base_url: String,
    http: Client,
}

impl OpenMeteoForecaster {
    pub fn new(base_url: String, http: Client) -> Self {
        Self { base_url, http }
    }
}

#[async_trait]
impl ForecastFetcher for OpenMeteoForecaster {
    async fn current_weather(&self, coordinates: &Coordinates) -> Result<CurrentWeather> {
        let res = self
            .http
            .get(endpoint(&self.base_url, "v1/forecast"))
            .query(&[
                ("latitude", coordinates.latitude.as_str()),
                ("longitude", coordinates.longitude.as_str()),
                ("current_weather", "true"),
            ])
            .send()
            .await
            .map_err(|source| RelayError::Transport { provider: PROVIDER, source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| RelayError::Transport { provider: PROVIDER, source })?;

        if status != StatusCode::OK {
            return Err(RelayError::UpstreamStatus {
                provider: PROVIDER,
                status,
                body: truncate_body(&body),
            });
        }

        let parsed: serde_json::Value = serde_json::from_str(&body)
            .map_err(|source| RelayError::Decode { provider: PROVIDER, source })?;

        let serde_json::Value::Object(mut fields) = parsed else {
            return Err(RelayError::UnexpectedShape { provider: PROVIDER, expected: "object" });
        };

        // An explicit `null` is forwarded as-is; only an absent key is an error.
        fields
            .remove("current_weather")
            .map(CurrentWeather)
            .ok_or(RelayError::MissingField { provider: PROVIDER, field: "current_weather" })
    }
}

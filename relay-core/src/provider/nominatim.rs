use async_trait::async_trait;
use reqwest::{Client, StatusCode, header::USER_AGENT};
use serde::Deserialize;

use crate::{
    error::{RelayError, Result},
    model::Coordinates,
};

use super::{GeocodeResolver, ProviderId, endpoint};

/// Searches are always scoped to this country.
pub const COUNTRY: &str = "Brazil";

const PROVIDER: ProviderId = ProviderId::Nominatim;

/// OpenStreetMap Nominatim `/search` client.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    base_url: String,
    user_agent: String,
    http: Client,
}

impl NominatimGeocoder {
    pub fn new(base_url: String, user_agent: String, http: Client) -> Self {
        Self { base_url, user_agent, http }
    }
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

#[async_trait]
impl GeocodeResolver for NominatimGeocoder {
    async fn locate(&self, city: &str, state: &str) -> Result<Option<Coordinates>> {
        let res = self
            .http
            .get(endpoint(&self.base_url, "search"))
            .header(USER_AGENT, &self.user_agent)
            .query(&[("city", city), ("state", state), ("country", COUNTRY), ("format", "json")])
            .send()
            .await
            .map_err(|source| RelayError::Transport { provider: PROVIDER, source })?;

        let status = res.status();
        if status != StatusCode::OK {
            tracing::debug!(%status, city, state, "Nominatim search did not succeed");
            return Ok(None);
        }

        let body = res
            .text()
            .await
            .map_err(|source| RelayError::Transport { provider: PROVIDER, source })?;

        // Only the first match matters; later entries are never inspected.
        let places: Vec<serde_json::Value> = serde_json::from_str(&body)
            .map_err(|source| RelayError::Decode { provider: PROVIDER, source })?;

        let Some(first) = places.into_iter().next() else {
            tracing::debug!(city, state, "Nominatim returned no matches");
            return Ok(None);
        };

        let place: NominatimPlace = serde_json::from_value(first)
            .map_err(|source| RelayError::Decode { provider: PROVIDER, source })?;

        if place.lat.is_empty() || place.lon.is_empty() {
            tracing::debug!(city, state, "Nominatim match has blank coordinates");
            return Ok(None);
        }

        tracing::debug!(city, state, lat = %place.lat, lon = %place.lon, "Geocoded place");
        Ok(Some(Coordinates::new(place.lat, place.lon)))
    }
}

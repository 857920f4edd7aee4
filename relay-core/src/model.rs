use serde::{Deserialize, Serialize};

pub const DEFAULT_LATITUDE: &str = "-23.55";
pub const DEFAULT_LONGITUDE: &str = "-46.63";

/// Inbound `/weather` query. Any other query parameter is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WeatherQuery {
    pub city: Option<String>,
    pub state: Option<String>,
}

impl WeatherQuery {
    pub fn new(city: Option<String>, state: Option<String>) -> Self {
        Self { city, state }
    }

    /// Builds the query from raw `key=value` pairs. A repeated key keeps its
    /// first value.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "city" => &mut query.city,
                "state" => &mut query.state,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into());
            }
        }
        query
    }

    /// Returns the place to geocode only when both halves are present and non-empty.
    pub fn place(&self) -> Option<(&str, &str)> {
        let city = self.city.as_deref().filter(|c| !c.is_empty())?;
        let state = self.state.as_deref().filter(|s| !s.is_empty())?;
        Some((city, state))
    }
}

/// Latitude/longitude kept as the provider gave them; never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: String,
    pub longitude: String,
}

impl Coordinates {
    pub fn new(latitude: impl Into<String>, longitude: impl Into<String>) -> Self {
        Self { latitude: latitude.into(), longitude: longitude.into() }
    }
}

impl Default for Coordinates {
    /// São Paulo.
    fn default() -> Self {
        Self::new(DEFAULT_LATITUDE, DEFAULT_LONGITUDE)
    }
}

/// The forecast provider's `current_weather` object, forwarded untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrentWeather(pub serde_json::Value);

impl CurrentWeather {
    pub fn into_inner(self) -> serde_json::Value {
        self.0
    }
}

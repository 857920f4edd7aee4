//! Error taxonomy for the relay pipeline.

use reqwest::StatusCode;
use thiserror::Error;

use crate::provider::ProviderId;

pub type Result<T, E = RelayError> = std::result::Result<T, E>;

/// Client-facing message when the geocoder finds nothing.
pub const PLACE_NOT_FOUND_MESSAGE: &str = "Cidade ou estado não encontrados";
/// Client-facing message for every upstream failure.
pub const FETCH_ERROR_MESSAGE: &str = "Erro ao buscar dados";

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("No geocoding match for city '{city}', state '{state}'")]
    PlaceNotFound { city: String, state: String },

    #[error("{provider} request failed with status {status}: {body}")]
    UpstreamStatus { provider: ProviderId, status: StatusCode, body: String },

    #[error("Failed to send request to {provider}")]
    Transport {
        provider: ProviderId,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to parse {provider} JSON")]
    Decode {
        provider: ProviderId,
        #[source]
        source: serde_json::Error,
    },

    #[error("{provider} response is not a JSON {expected}")]
    UnexpectedShape { provider: ProviderId, expected: &'static str },

    #[error("{provider} response is missing `{field}`")]
    MissingField { provider: ProviderId, field: &'static str },

    #[error("Failed to build HTTP client")]
    Client(#[source] reqwest::Error),
}

impl RelayError {
    /// True when the caller asked for something that doesn't exist, as opposed
    /// to an upstream or network failure.
    pub fn is_client_error(&self) -> bool {
        matches!(self, RelayError::PlaceNotFound { .. })
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            RelayError::PlaceNotFound { .. } => PLACE_NOT_FOUND_MESSAGE,
            _ => FETCH_ERROR_MESSAGE,
        }
    }
}

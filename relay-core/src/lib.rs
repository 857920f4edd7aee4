//! Core library for the weather relay.
//!
//! This crate defines:
//! - Configuration handling
//! - The geocoding and forecast collaborators behind async traits
//! - The relay pipeline and its error taxonomy
//!
//! It is used by `relay-server`, but has no dependency on any web framework.

pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod relay;

pub use config::Config;
pub use error::RelayError;
pub use model::{Coordinates, CurrentWeather, WeatherQuery};
pub use provider::{ForecastFetcher, GeocodeResolver, ProviderId};
pub use relay::WeatherRelay;

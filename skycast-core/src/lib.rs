//! Core library for the `skycast` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - API tier probing and concurrent acquisition from the provider
//! - Normalization of the provider's responses into one unified model
//!
//! It is used by `skycast-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod describe;
pub mod error;
pub mod fetch;
pub mod icon;
pub mod lang;
pub mod merge;
pub mod model;
pub mod precip;
pub mod probe;
pub mod provider;
pub mod raw;

pub use config::{Config, Location};
pub use error::{ErrorKind, WeatherError};
pub use icon::{IconId, IconResolver};
pub use model::{Alert, AlertSeverity, Astronomy, DataPoint, UnifiedWeather, WeatherRequest};
pub use precip::PrecipType;
pub use provider::{ApiTier, WeatherProvider, openweather::OpenWeatherProvider};

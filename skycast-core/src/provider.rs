use crate::{
    Config, UnifiedWeather, WeatherRequest,
    error::{Result, WeatherError},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::{convert::TryFrom, fmt::Debug, time::Duration};

pub mod openweather;

/// API generation a credential has access to, highest capability first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiTier {
    OneCall30,
    OneCall25,
    Weather25,
}

impl ApiTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiTier::OneCall30 => "onecall3.0",
            ApiTier::OneCall25 => "onecall2.5",
            ApiTier::Weather25 => "weather2.5",
        }
    }

    /// Version segment of the endpoint path.
    pub fn version(&self) -> &'static str {
        match self {
            ApiTier::OneCall30 => "3.0",
            ApiTier::OneCall25 | ApiTier::Weather25 => "2.5",
        }
    }

    /// Whether the tier serves the all-in-one endpoint the pipeline needs.
    pub fn has_one_call(&self) -> bool {
        matches!(self, ApiTier::OneCall30 | ApiTier::OneCall25)
    }

    /// Probe and selection order.
    pub const fn all() -> &'static [ApiTier] {
        &[ApiTier::OneCall30, ApiTier::OneCall25, ApiTier::Weather25]
    }
}

impl std::fmt::Display for ApiTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ApiTier {
    type Error = WeatherError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "onecall3.0" => Ok(ApiTier::OneCall30),
            "onecall2.5" => Ok(ApiTier::OneCall25),
            "weather2.5" => Ok(ApiTier::Weather25),
            _ => Err(WeatherError::configuration(format!(
                "Unknown API tier '{value}'. Supported tiers: onecall3.0, onecall2.5, weather2.5."
            ))),
        }
    }
}

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn get_weather(&self, request: &WeatherRequest) -> Result<UnifiedWeather>;
}

/// Construct the provider described by `config`.
///
/// A tier persisted alongside the key seeds the tier cache, so no probe is
/// issued for a credential that was already probed.
pub fn provider_from_config(config: &Config) -> Result<OpenWeatherProvider> {
    let api_key = config.api_key().ok_or_else(|| {
        WeatherError::configuration(
            "No API key configured.\n\
                 Hint: run `skycast configure` and enter your API key.",
        )
    })?;

    let mut provider = OpenWeatherProvider::new(api_key)?
        .with_timeout(Duration::from_secs(config.timeout_secs()));

    if let Some(base_url) = config.base_url.as_deref() {
        provider = provider.with_base_url(base_url);
    }

    if let Some(tier) = config.api_tier()? {
        provider.remember_tier(tier);
    }

    Ok(provider)
}

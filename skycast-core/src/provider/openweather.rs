use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::{
    error::{Result, WeatherError},
    fetch::{Fetcher, RequestSpec},
    icon::IconResolver,
    lang::provider_language,
    merge::{self, Normalizer},
    model::{UnifiedWeather, WeatherRequest},
    probe::{self, TierCache},
};

use super::{ApiTier, WeatherProvider};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data";

/// Fixed reference location for tier probes.
const PROBE_LATITUDE: f64 = 33.749;
const PROBE_LONGITUDE: f64 = -84.388;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// URL builder for the provider's endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoints {
    base_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl Endpoints {
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// All-in-one endpoint: current, minutely, hourly, daily and alerts.
    pub fn one_call(
        &self,
        tier: ApiTier,
        api_key: &str,
        latitude: f64,
        longitude: f64,
        lang: &str,
    ) -> RequestSpec {
        let url = format!("{}/{}/onecall", self.base_url, tier.version());
        with_common_query(RequestSpec::get(url), api_key, latitude, longitude, lang)
    }

    /// Tri-hourly forecast endpoint. Available on every tier.
    pub fn forecast(&self, api_key: &str, latitude: f64, longitude: f64, lang: &str) -> RequestSpec {
        let url = format!("{}/2.5/forecast", self.base_url);
        with_common_query(RequestSpec::get(url), api_key, latitude, longitude, lang)
    }

    /// Legacy current-conditions endpoint, the only one the lowest tier serves.
    pub fn current(&self, api_key: &str, latitude: f64, longitude: f64, lang: &str) -> RequestSpec {
        let url = format!("{}/2.5/weather", self.base_url);
        with_common_query(RequestSpec::get(url), api_key, latitude, longitude, lang)
    }

    /// The cheapest request that tells whether `tier` accepts `api_key`.
    pub fn probe(&self, tier: ApiTier, api_key: &str) -> RequestSpec {
        if tier.has_one_call() {
            self.one_call(tier, api_key, PROBE_LATITUDE, PROBE_LONGITUDE, "en")
        } else {
            self.current(api_key, PROBE_LATITUDE, PROBE_LONGITUDE, "en")
        }
    }
}

fn with_common_query(
    req: RequestSpec,
    api_key: &str,
    latitude: f64,
    longitude: f64,
    lang: &str,
) -> RequestSpec {
    req.query("appid", api_key)
        .query("lat", latitude)
        .query("lon", longitude)
        .query("lang", lang)
        .query("units", "imperial")
}

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    fetcher: Fetcher,
    endpoints: Endpoints,
    timeout: Duration,
    icons: Arc<IconResolver>,
    tiers: Arc<TierCache>,
}

impl OpenWeatherProvider {
    pub fn new<S: Into<String>>(api_key: S) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(WeatherError::configuration("API key must not be empty"));
        }

        Ok(Self {
            api_key,
            fetcher: Fetcher::new(DEFAULT_TIMEOUT)?,
            endpoints: Endpoints::default(),
            timeout: DEFAULT_TIMEOUT,
            icons: Arc::new(IconResolver::new()),
            tiers: Arc::new(TierCache::new()),
        })
    }

    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.endpoints = Endpoints::new(base_url);
        self
    }

    /// Bound on the whole fetch join, probes included. Each request gets the
    /// same bound, so no single request gives up before the join does.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.fetcher = self.fetcher.with_request_timeout(timeout);
        self.timeout = timeout;
        self
    }

    /// Share a tier cache between providers.
    pub fn with_tier_cache(mut self, tiers: Arc<TierCache>) -> Self {
        self.tiers = tiers;
        self
    }

    /// Share one set of icon tables between providers.
    pub fn with_icons(mut self, icons: Arc<IconResolver>) -> Self {
        self.icons = icons;
        self
    }

    /// Replace the credential, forgetting the tier probed for the old one.
    pub fn set_api_key<S: Into<String>>(&mut self, api_key: S) -> Result<()> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(WeatherError::configuration("API key must not be empty"));
        }

        if api_key != self.api_key {
            self.tiers.invalidate(&self.api_key);
            self.api_key = api_key;
        }

        Ok(())
    }

    /// Record a tier known from an earlier probe of the current credential.
    pub fn remember_tier(&self, tier: ApiTier) {
        self.tiers.insert(&self.api_key, tier);
    }

    pub fn cached_tier(&self) -> Option<ApiTier> {
        self.tiers.get(&self.api_key)
    }

    /// The credential's tier, probing only on a cache miss.
    pub async fn api_tier(&self) -> Result<ApiTier> {
        if let Some(tier) = self.cached_tier() {
            return Ok(tier);
        }

        self.probe_tier().await
    }

    /// Probe unconditionally and cache the result.
    pub async fn probe_tier(&self) -> Result<ApiTier> {
        let tier =
            probe::probe_tiers(&self.fetcher, &self.endpoints, &self.api_key, self.timeout).await?;
        self.remember_tier(tier);
        Ok(tier)
    }

    /// Acquire weather through an explicitly chosen tier.
    ///
    /// The tier must be the one the prober selected for this credential.
    pub async fn get_weather_with_tier(
        &self,
        request: &WeatherRequest,
        tier: ApiTier,
    ) -> Result<UnifiedWeather> {
        match self.cached_tier() {
            Some(selected) if selected == tier => self.acquire(request, tier).await,
            Some(selected) => Err(WeatherError::configuration(format!(
                "tier '{tier}' requested, but this API key was probed as '{selected}'"
            ))),
            None => Err(WeatherError::configuration(format!(
                "tier '{tier}' requested before this API key was probed"
            ))),
        }
    }

    async fn acquire(&self, request: &WeatherRequest, tier: ApiTier) -> Result<UnifiedWeather> {
        validate(request)?;

        if !tier.has_one_call() {
            return Err(WeatherError::configuration(format!(
                "API tier '{tier}' has no all-in-one endpoint; a One Call subscription is required"
            )));
        }

        let lang = provider_language(&request.locale);
        let requests = [
            self.endpoints.one_call(
                tier,
                &self.api_key,
                request.latitude,
                request.longitude,
                &lang,
            ),
            self.endpoints
                .forecast(&self.api_key, request.latitude, request.longitude, &lang),
        ];

        tracing::debug!(
            tier = %tier,
            lat = request.latitude,
            lon = request.longitude,
            lang = %lang,
            "fetching weather"
        );

        let results = self
            .fetcher
            .fetch_all_within(&requests, self.timeout)
            .await?;

        let normalizer = Normalizer::new(&self.icons);
        merge::merge_responses(
            results,
            &normalizer,
            request.latitude,
            request.longitude,
            Utc::now(),
        )
    }
}

fn validate(request: &WeatherRequest) -> Result<()> {
    if !(-90.0..=90.0).contains(&request.latitude) {
        return Err(WeatherError::configuration(format!(
            "latitude {} is outside [-90, 90]",
            request.latitude
        )));
    }

    if !(-180.0..=180.0).contains(&request.longitude) {
        return Err(WeatherError::configuration(format!(
            "longitude {} is outside [-180, 180]",
            request.longitude
        )));
    }

    Ok(())
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn get_weather(&self, request: &WeatherRequest) -> Result<UnifiedWeather> {
        validate(request)?;

        let tier = self.api_tier().await?;
        self.acquire(request, tier).await
    }
}

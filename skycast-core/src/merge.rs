//! Fetch results and raw models in, one [`UnifiedWeather`] out.
//!
//! The merge is a pure transform: no I/O and no clock reads. The only time
//! input is the explicit `now` handed to [`Normalizer::normalize`].

use chrono::{DateTime, Utc};

use crate::describe;
use crate::error::{Result, WeatherError};
use crate::fetch::FetchResult;
use crate::icon::{IconId, IconResolver};
use crate::model::{
    Alert, Astronomy, DataPoint, ERROR_DESCRIPTION, ERROR_WEATHER_CODE, UnifiedWeather,
};
use crate::precip::{self, PrecipType, Precipitation};
use crate::raw::{
    self, RawAlert, RawCondition, RawDaily, RawForecast, RawInstant, RawOneCall, RawTriHourly,
};

/// Title fragments the provider uses for test and placeholder alerts.
const PLACEHOLDER_ALERT_MARKERS: &[&str] = &["amber alert", "test message"];

/// Unwrap every fetch result, or surface the failure of the lowest index.
pub fn collect_bodies(results: Vec<FetchResult>) -> Result<Vec<String>> {
    results.into_iter().collect()
}

/// Fail-fast merge of the all-in-one and forecast responses, in that order.
pub fn merge_responses(
    results: Vec<FetchResult>,
    normalizer: &Normalizer<'_>,
    latitude: f64,
    longitude: f64,
    now: DateTime<Utc>,
) -> Result<UnifiedWeather> {
    let bodies = collect_bodies(results)?;

    let [one_call_body, forecast_body] = <[String; 2]>::try_from(bodies).map_err(|bodies| {
        WeatherError::configuration(format!(
            "expected 2 responses to merge, got {}",
            bodies.len()
        ))
    })?;

    let one_call = raw::parse_one_call(&one_call_body)?;
    let forecast = raw::parse_forecast(&forecast_body)?;

    normalizer.normalize(&one_call, &forecast, latitude, longitude, now)
}

/// Icon, code and short description of a point, resolved from its conditions.
struct Conditions {
    code: i32,
    icon: IconId,
    description: String,
}

impl Conditions {
    fn error() -> Self {
        Self {
            code: ERROR_WEATHER_CODE,
            icon: IconId::Error,
            description: ERROR_DESCRIPTION.to_string(),
        }
    }

    fn is_error(&self) -> bool {
        self.code == ERROR_WEATHER_CODE && self.icon == IconId::Error
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Normalizer<'a> {
    icons: &'a IconResolver,
}

impl<'a> Normalizer<'a> {
    pub fn new(icons: &'a IconResolver) -> Self {
        Self { icons }
    }

    pub fn normalize(
        &self,
        one_call: &RawOneCall,
        forecast: &RawForecast,
        latitude: f64,
        longitude: f64,
        now: DateTime<Utc>,
    ) -> Result<UnifiedWeather> {
        let hourly_type = match one_call.hourly.first() {
            Some(first) => instant_precipitation(first)?.kind,
            None => PrecipType::Rain,
        };

        let current = match &one_call.current {
            Some(current) => self.current_point(current, one_call, hourly_type, now)?,
            None => missing_point(),
        };

        let mut hourly = one_call
            .hourly
            .iter()
            .map(|point| self.hourly_point(point))
            .collect::<Result<Vec<_>>>()?;

        let mut daily = one_call
            .daily
            .iter()
            .map(|point| self.daily_point(point))
            .collect::<Result<Vec<_>>>()?;

        let mut trihourly = forecast
            .list
            .iter()
            .map(|point| self.trihourly_point(point))
            .collect::<Result<Vec<_>>>()?;

        for series in [&mut hourly, &mut daily, &mut trihourly] {
            series.sort_by_key(|point| point.timestamp);
        }

        let alerts = one_call.alerts.iter().filter_map(keep_alert).collect();

        Ok(UnifiedWeather {
            timezone: one_call.timezone.clone(),
            timestamp: now.timestamp_millis(),
            latitude,
            longitude,
            current,
            daily,
            hourly,
            trihourly,
            alerts,
        })
    }

    fn conditions(&self, weather: &[RawCondition]) -> Conditions {
        let Some(first) = weather.first() else {
            return Conditions::error();
        };

        let descriptions: Vec<&str> = weather.iter().map(|w| w.description.as_str()).collect();

        Conditions {
            code: first.id.unwrap_or(ERROR_WEATHER_CODE),
            icon: self.icons.resolve(&first.icon, first.id),
            description: describe::compose(&descriptions),
        }
    }

    fn current_point(
        &self,
        raw: &RawInstant,
        one_call: &RawOneCall,
        hourly_type: PrecipType,
        now: DateTime<Utc>,
    ) -> Result<DataPoint> {
        let mut point = self.hourly_point(raw)?;

        if raw.weather.is_empty() {
            return Ok(point);
        }

        point.long_description =
            describe::compose_long(&point.description, &one_call.minutely, hourly_type, now);

        Ok(point)
    }

    fn hourly_point(&self, raw: &RawInstant) -> Result<DataPoint> {
        let conditions = self.conditions(&raw.weather);
        let precipitation = instant_precipitation(raw)?;

        Ok(DataPoint {
            timestamp: to_millis(raw.dt)?,
            temperature: raw.temp,
            min_temperature: None,
            max_temperature: None,
            feels_like: raw.feels_like,
            visibility: raw.visibility,
            humidity: raw.humidity,
            wind_speed: raw.wind_speed,
            wind_bearing: raw.wind_deg,
            pressure: raw.pressure,
            dew_point: raw.dew_point,
            uv_index: raw.uvi,
            pop: pop_percent(raw.pop),
            weather_code: conditions.code,
            icon: conditions.icon,
            long_description: conditions.description.clone(),
            description: conditions.description,
            precipitation_intensity: precipitation.intensity,
            precipitation_type: precipitation.kind,
            astronomy: None,
        })
    }

    fn daily_point(&self, raw: &RawDaily) -> Result<DataPoint> {
        let conditions = self.conditions(&raw.weather);
        let precipitation = precip::classify(
            checked_volume(raw.rain, "daily rain")?,
            checked_volume(raw.snow, "daily snow")?,
        );
        let pop = pop_percent(raw.pop);

        let long_description = if conditions.is_error() {
            conditions.description.clone()
        } else {
            describe::compose_daily(
                &conditions.description,
                raw.dew_point,
                raw.wind_speed,
                pop,
                precipitation.kind,
            )
        };

        Ok(DataPoint {
            timestamp: to_millis(raw.dt)?,
            temperature: raw.temp.day,
            min_temperature: Some(raw.temp.min),
            max_temperature: Some(raw.temp.max),
            feels_like: raw.feels_like.day,
            visibility: 0,
            humidity: raw.humidity,
            wind_speed: raw.wind_speed,
            wind_bearing: raw.wind_deg,
            pressure: raw.pressure,
            dew_point: raw.dew_point,
            uv_index: raw.uvi,
            pop,
            weather_code: conditions.code,
            icon: conditions.icon,
            description: conditions.description,
            long_description,
            precipitation_intensity: precipitation.intensity,
            precipitation_type: precipitation.kind,
            astronomy: Some(Astronomy {
                sunrise: to_millis(raw.sunrise)?,
                sunset: to_millis(raw.sunset)?,
                moonrise: to_millis(raw.moonrise)?,
                moonset: to_millis(raw.moonset)?,
                moon_phase: raw.moon_phase,
            }),
        })
    }

    fn trihourly_point(&self, raw: &RawTriHourly) -> Result<DataPoint> {
        let conditions = self.conditions(&raw.weather);
        let precipitation = precip::classify(
            checked_volume(raw.rain.as_ref().map(|v| v.volume), "3h rain")?,
            checked_volume(raw.snow.as_ref().map(|v| v.volume), "3h snow")?,
        );

        Ok(DataPoint {
            timestamp: to_millis(raw.dt)?,
            temperature: raw.main.temp,
            min_temperature: None,
            max_temperature: None,
            feels_like: raw.main.feels_like,
            visibility: 0,
            humidity: raw.main.humidity,
            wind_speed: 0.0,
            wind_bearing: 0,
            pressure: raw.main.pressure,
            dew_point: 0.0,
            uv_index: 0.0,
            pop: pop_percent(raw.pop),
            weather_code: conditions.code,
            icon: conditions.icon,
            long_description: conditions.description.clone(),
            description: conditions.description,
            precipitation_intensity: precipitation.intensity,
            precipitation_type: precipitation.kind,
            astronomy: None,
        })
    }
}

/// Stand-in for a point the provider did not send.
fn missing_point() -> DataPoint {
    let conditions = Conditions::error();

    DataPoint {
        timestamp: 0,
        temperature: 0.0,
        min_temperature: None,
        max_temperature: None,
        feels_like: 0.0,
        visibility: 0,
        humidity: 0,
        wind_speed: 0.0,
        wind_bearing: 0,
        pressure: 0,
        dew_point: 0.0,
        uv_index: 0.0,
        pop: 0,
        weather_code: conditions.code,
        icon: conditions.icon,
        long_description: conditions.description.clone(),
        description: conditions.description,
        precipitation_intensity: 0.0,
        precipitation_type: PrecipType::Rain,
        astronomy: None,
    }
}

fn instant_precipitation(raw: &RawInstant) -> Result<Precipitation> {
    Ok(precip::classify(
        checked_volume(raw.rain.as_ref().map(|v| v.volume), "1h rain")?,
        checked_volume(raw.snow.as_ref().map(|v| v.volume), "1h snow")?,
    ))
}

/// A missing volume counts as zero; a negative one is malformed data.
fn checked_volume(volume: Option<f64>, what: &str) -> Result<f64> {
    let volume = volume.unwrap_or(0.0);

    if volume >= 0.0 {
        Ok(volume)
    } else {
        Err(WeatherError::malformed(format!(
            "negative {what} volume: {volume}"
        )))
    }
}

/// Epoch seconds to epoch millis; a timestamp too large to convert is malformed data.
fn to_millis(epoch_seconds: i64) -> Result<i64> {
    epoch_seconds.checked_mul(1000).ok_or_else(|| {
        WeatherError::malformed(format!("timestamp out of range: {epoch_seconds}"))
    })
}

/// Fraction to whole percent, truncating.
fn pop_percent(fraction: f64) -> u8 {
    (fraction * 100.0).clamp(0.0, 100.0) as u8
}

fn keep_alert(raw: &RawAlert) -> Option<Alert> {
    let event = raw.event.to_lowercase();

    if PLACEHOLDER_ALERT_MARKERS
        .iter()
        .any(|marker| event.contains(marker))
    {
        tracing::debug!(event = %raw.event, "dropping placeholder alert");
        return None;
    }

    Some(Alert {
        sender_name: raw.sender_name.clone(),
        event: raw.event.clone(),
        start: raw.start,
        end: raw.end,
        description: raw.description.clone(),
    })
}

//! Provider-shaped response bodies.
//!
//! One struct per wire object, decoded by serde. Unknown fields are ignored
//! and missing ones fall back to their defaults. The two endpoints key
//! their accumulated precipitation volume differently ("1h" and "3h"); both
//! keys are kept as-is here and reconciled during normalization.

use serde::Deserialize;

use crate::error::{Result, WeatherError};

/// Body of the all-in-one endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawOneCall {
    pub lat: f64,
    pub lon: f64,
    pub timezone: String,
    pub current: Option<RawInstant>,
    pub hourly: Vec<RawInstant>,
    pub daily: Vec<RawDaily>,
    pub minutely: Vec<RawMinutely>,
    pub alerts: Vec<RawAlert>,
}

/// A current or hourly point.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawInstant {
    pub dt: i64,
    pub temp: f64,
    pub feels_like: f64,
    pub visibility: u32,
    pub humidity: u8,
    pub wind_speed: f64,
    pub wind_deg: u16,
    pub pressure: u32,
    pub dew_point: f64,
    pub uvi: f64,
    /// Fraction, 0.0-1.0.
    pub pop: f64,
    pub weather: Vec<RawCondition>,
    pub rain: Option<HourVolume>,
    pub snow: Option<HourVolume>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawDaily {
    pub dt: i64,
    pub sunrise: i64,
    pub sunset: i64,
    pub moonrise: i64,
    pub moonset: i64,
    pub moon_phase: f64,
    pub temp: RawDailyTemp,
    pub feels_like: RawDailyFeelsLike,
    pub humidity: u8,
    pub pressure: u32,
    pub dew_point: f64,
    pub wind_speed: f64,
    pub wind_deg: u16,
    pub uvi: f64,
    pub pop: f64,
    pub weather: Vec<RawCondition>,
    /// Daily volumes are bare numbers, not keyed objects.
    pub rain: Option<f64>,
    pub snow: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawDailyTemp {
    pub day: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawDailyFeelsLike {
    pub day: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawMinutely {
    pub dt: i64,
    pub precipitation: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawAlert {
    pub sender_name: String,
    pub event: String,
    pub start: i64,
    pub end: i64,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawCondition {
    pub id: Option<i32>,
    pub icon: String,
    pub description: String,
}

/// Volume accumulated over the past hour.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HourVolume {
    #[serde(rename = "1h")]
    pub volume: f64,
}

/// Body of the tri-hourly forecast endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawForecast {
    pub list: Vec<RawTriHourly>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawTriHourly {
    pub dt: i64,
    pub main: RawForecastMain,
    pub weather: Vec<RawCondition>,
    pub rain: Option<TriHourVolume>,
    pub snow: Option<TriHourVolume>,
    pub pop: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawForecastMain {
    pub temp: f64,
    pub feels_like: f64,
    pub pressure: u32,
    pub humidity: u8,
}

/// Volume accumulated over the three-hour bucket.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TriHourVolume {
    #[serde(rename = "3h")]
    pub volume: f64,
}

pub fn parse_one_call(body: &str) -> Result<RawOneCall> {
    serde_json::from_str(body)
        .map_err(|e| WeatherError::malformed(format!("all-in-one response: {e}")))
}

pub fn parse_forecast(body: &str) -> Result<RawForecast> {
    serde_json::from_str(body)
        .map_err(|e| WeatherError::malformed(format!("forecast response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn one_call_hour_volume_uses_1h_key() {
        let body = json!({
            "timezone": "America/New_York",
            "current": {
                "dt": 1_700_000_000,
                "temp": 61.5,
                "weather": [{"id": 500, "icon": "10d", "description": "light rain", "main": "Rain"}],
                "rain": {"1h": 1.2}
            }
        })
        .to_string();

        let parsed = parse_one_call(&body).unwrap();
        let current = parsed.current.unwrap();

        assert_eq!(parsed.timezone, "America/New_York");
        assert_eq!(current.rain, Some(HourVolume { volume: 1.2 }));
        assert_eq!(current.snow, None);
        assert_eq!(current.weather[0].id, Some(500));
    }

    #[test]
    fn forecast_volume_uses_3h_key() {
        let body = json!({
            "cod": "200",
            "list": [{"dt": 1, "main": {"temp": 50.0}, "snow": {"3h": 0.7}, "pop": 0.4}]
        })
        .to_string();

        let parsed = parse_forecast(&body).unwrap();

        assert_eq!(parsed.list.len(), 1);
        assert_eq!(parsed.list[0].snow, Some(TriHourVolume { volume: 0.7 }));
        assert_eq!(parsed.list[0].main.temp, 50.0);
    }

    #[test]
    fn hour_key_is_not_read_from_forecast_objects() {
        let body = json!({"list": [{"dt": 1, "rain": {"1h": 3.0}}]}).to_string();
        let parsed = parse_forecast(&body).unwrap();
        assert_eq!(parsed.list[0].rain, Some(TriHourVolume { volume: 0.0 }));
    }

    #[test]
    fn missing_fields_default() {
        let parsed = parse_one_call("{}").unwrap();
        assert_eq!(parsed, RawOneCall::default());

        let daily = parse_one_call(r#"{"daily": [{"dt": 5}]}"#).unwrap().daily;
        assert_eq!(daily[0].dt, 5);
        assert_eq!(daily[0].rain, None);
        assert!(daily[0].weather.is_empty());
    }

    #[test]
    fn daily_volumes_are_plain_numbers() {
        let body = r#"{"daily": [{"dt": 5, "rain": 4.5, "snow": 0.5, "temp": {"min": 40, "max": 55, "day": 50}}]}"#;
        let daily = &parse_one_call(body).unwrap().daily[0];
        assert_eq!(daily.rain, Some(4.5));
        assert_eq!(daily.snow, Some(0.5));
        assert_eq!(daily.temp.max, 55.0);
    }

    #[test]
    fn invalid_json_is_malformed() {
        let err = parse_one_call("<html>oops</html>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedData);
    }

    #[test]
    fn wrong_root_list_type_is_malformed() {
        let err = parse_forecast(r#"{"list": {"dt": 1}}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedData);
        assert!(err.to_string().contains("forecast response"));
    }
}

use serde::{Deserialize, Serialize};

use crate::icon::IconId;
use crate::precip::PrecipType;

/// Sentinel weather code for points whose condition list was empty or absent.
pub const ERROR_WEATHER_CODE: i32 = -1;

/// Description used for points without any weather condition.
pub const ERROR_DESCRIPTION: &str = "Error";

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherRequest {
    pub latitude: f64,
    pub longitude: f64,
    /// Caller locale, e.g. "en", "pt-BR", "zh_TW". Empty means English.
    pub locale: String,
}

impl WeatherRequest {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            locale: String::new(),
        }
    }

    pub fn with_locale<S: Into<String>>(mut self, locale: S) -> Self {
        self.locale = locale.into();
        self
    }
}

/// Provider-independent weather for one location, as handed to presentation code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedWeather {
    pub timezone: String,
    /// Retrieval time, epoch millis.
    pub timestamp: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub current: DataPoint,
    pub daily: Vec<DataPoint>,
    pub hourly: Vec<DataPoint>,
    pub trihourly: Vec<DataPoint>,
    pub alerts: Vec<Alert>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// Epoch millis.
    pub timestamp: i64,
    /// Fahrenheit. For daily points, the daytime temperature.
    pub temperature: f64,
    pub min_temperature: Option<f64>,
    pub max_temperature: Option<f64>,
    pub feels_like: f64,
    /// Meters.
    pub visibility: u32,
    /// Percent, 0-100.
    pub humidity: u8,
    /// mph.
    pub wind_speed: f64,
    /// Degrees from north.
    pub wind_bearing: u16,
    /// hPa.
    pub pressure: u32,
    pub dew_point: f64,
    pub uv_index: f64,
    /// Percent, 0-100.
    pub pop: u8,
    pub weather_code: i32,
    pub icon: IconId,
    pub description: String,
    pub long_description: String,
    /// mm over the point's time bucket.
    pub precipitation_intensity: f64,
    pub precipitation_type: PrecipType,
    pub astronomy: Option<Astronomy>,
}

/// Daily-only sun and moon data. Times are epoch millis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Astronomy {
    pub sunrise: i64,
    pub sunset: i64,
    pub moonrise: i64,
    pub moonset: i64,
    /// Fraction in [0, 1).
    pub moon_phase: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Advisory,
    Watch,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub sender_name: String,
    pub event: String,
    /// Epoch seconds, as sent by the provider.
    pub start: i64,
    pub end: i64,
    pub description: String,
}

impl Alert {
    /// Stable identity of an alert across refreshes.
    pub fn uri(&self) -> String {
        format!("{} {}", self.event, self.start)
    }

    pub fn severity(&self) -> AlertSeverity {
        let event = self.event.to_lowercase();

        if event.contains("warning") {
            AlertSeverity::Warning
        } else if event.contains("watch") {
            AlertSeverity::Watch
        } else {
            AlertSeverity::Advisory
        }
    }

    /// Description with the provider's hard wraps undone.
    ///
    /// Lines starting with `*` or `.` keep their break; every other newline
    /// joins the text with a space. Markup is removed, with `<br>` kept as a
    /// line break. The sender, when known, is appended on its own line.
    pub fn plain_description(&self) -> String {
        let mut out = String::with_capacity(self.description.len());
        let mut chars = self.description.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '\n' {
                match chars.peek() {
                    Some('*') | Some('.') => out.push('\n'),
                    _ => out.push(' '),
                }
            } else {
                out.push(c);
            }
        }

        let mut out = strip_markup(&out);

        if !self.sender_name.is_empty() {
            out.push_str("\nVia ");
            out.push_str(&self.sender_name);
        }

        out
    }
}

/// Remove `<...>` tags (at least one character, on one line), turning `<br>`
/// into a newline. A `<` that opens no tag is kept.
fn strip_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let tag_len = after.chars().next().filter(|c| *c != '\n').and_then(|first| {
            let body = &after[first.len_utf8()..];
            body.find(['>', '\n'])
                .filter(|&end| body[end..].starts_with('>'))
                .map(|end| first.len_utf8() + end)
        });

        match tag_len {
            Some(len) => {
                if &after[..len] == "br" {
                    out.push('\n');
                }
                rest = &after[len + 1..];
            }
            None => {
                out.push('<');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

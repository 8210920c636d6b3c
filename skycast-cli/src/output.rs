//! Plain-text rendering of a [`UnifiedWeather`].

use std::fmt::Write;

use chrono::{DateTime, Local, Utc};
use skycast_core::{DataPoint, UnifiedWeather};

const HOURS_SHOWN: usize = 12;

pub fn render(weather: &UnifiedWeather) -> String {
    let mut out = String::new();

    // writing into a String cannot fail
    let _ = write_report(&mut out, weather);

    out
}

fn write_report(out: &mut String, weather: &UnifiedWeather) -> std::fmt::Result {
    let current = &weather.current;

    writeln!(
        out,
        "{:.3}, {:.3} ({})",
        weather.latitude, weather.longitude, weather.timezone
    )?;
    writeln!(out)?;
    writeln!(out, "Now: {}", current.long_description)?;
    writeln!(
        out,
        "  {:.0}°F (feels like {:.0}°F), humidity {}%, wind {:.1} mph from {}°",
        current.temperature,
        current.feels_like,
        current.humidity,
        current.wind_speed,
        current.wind_bearing
    )?;

    if current.precipitation_intensity > 0.0 {
        writeln!(
            out,
            "  {} {:.1} mm/h",
            current.precipitation_type, current.precipitation_intensity
        )?;
    }

    if !weather.alerts.is_empty() {
        writeln!(out)?;
        writeln!(out, "Alerts:")?;
        for alert in &weather.alerts {
            writeln!(
                out,
                "  [{:?}] {} until {}",
                alert.severity(),
                alert.event,
                local_time(DateTime::from_timestamp(alert.end, 0), "%a %H:%M")
            )?;
        }
    }

    if !weather.hourly.is_empty() {
        writeln!(out)?;
        writeln!(out, "Next hours:")?;
        for point in weather.hourly.iter().take(HOURS_SHOWN) {
            write_hour(out, point)?;
        }
    }

    if !weather.daily.is_empty() {
        writeln!(out)?;
        writeln!(out, "Daily:")?;
        for point in &weather.daily {
            write_day(out, point)?;
        }
    }

    Ok(())
}

fn write_hour(out: &mut String, point: &DataPoint) -> std::fmt::Result {
    writeln!(
        out,
        "  {}  {:>4.0}°F  {:>3}%  {}",
        clock(point.timestamp, "%H:%M"),
        point.temperature,
        point.pop,
        point.description
    )
}

fn write_day(out: &mut String, point: &DataPoint) -> std::fmt::Result {
    writeln!(
        out,
        "  {}  {:>4.0}° / {:>4.0}°  {}",
        clock(point.timestamp, "%a %d"),
        point.max_temperature.unwrap_or(point.temperature),
        point.min_temperature.unwrap_or(point.temperature),
        point.long_description
    )
}

fn clock(timestamp_ms: i64, format: &str) -> String {
    local_time(DateTime::from_timestamp_millis(timestamp_ms), format)
}

fn local_time(at: Option<DateTime<Utc>>, format: &str) -> String {
    match at {
        Some(at) => at.with_timezone(&Local).format(format).to_string(),
        None => "--".to_string(),
    }
}

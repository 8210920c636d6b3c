//! Short and long natural-language descriptions.

use chrono::{DateTime, Utc};

use crate::precip::PrecipType;
use crate::raw::RawMinutely;

const SEPARATOR: &str = ", ";

/// Join distinct descriptions (compared case-insensitively) and capitalize
/// each word.
pub fn compose<S: AsRef<str>>(descriptions: &[S]) -> String {
    let mut seen: Vec<String> = Vec::with_capacity(descriptions.len());
    let mut parts: Vec<&str> = Vec::with_capacity(descriptions.len());

    for description in descriptions {
        let description = description.as_ref().trim();
        let folded = description.to_lowercase();

        if description.is_empty() || seen.contains(&folded) {
            continue;
        }

        seen.push(folded);
        parts.push(description);
    }

    capitalize_each_word(&parts.join(SEPARATOR))
}

/// Long description for the current conditions.
///
/// Appends a clause when the minutely series shows precipitation starting
/// or stopping within the window. `hourly_type` is the derived type of the
/// first hourly point and names the precipitation in the clause.
pub fn compose_long(
    short: &str,
    minutely: &[RawMinutely],
    hourly_type: PrecipType,
    now: DateTime<Utc>,
) -> String {
    let mut result = short.to_string();

    if let Some(clause) = precipitation_transition(minutely, hourly_type, now) {
        result.push_str(SEPARATOR);
        result.push_str(&clause);
    }

    capitalize_each_word(&result)
}

/// Long description for a daily point.
pub fn compose_daily(
    short: &str,
    dew_point: f64,
    wind_speed: f64,
    pop: u8,
    precip_type: PrecipType,
) -> String {
    let mut clauses = vec![short.to_string()];

    if dew_point >= 60.0 {
        clauses.push("humid".to_string());
    } else if dew_point <= 35.0 {
        clauses.push("dry".to_string());
    }

    if wind_speed > 25.3 {
        clauses.push("strong winds".to_string());
    } else if wind_speed > 8.05 {
        clauses.push("breezy".to_string());
    }

    if pop > 0 {
        clauses.push(format!("{pop}% chance of {}", precip_noun(precip_type)));
    }

    capitalize_each_word(&clauses.join(SEPARATOR))
}

fn precipitation_transition(
    minutely: &[RawMinutely],
    hourly_type: PrecipType,
    now: DateTime<Utc>,
) -> Option<String> {
    let first = minutely.first()?;
    let noun = precip_noun(hourly_type);

    if first.precipitation > 0.0 {
        let stop = minutely[1..].iter().find(|m| m.precipitation == 0.0)?;
        let mins = minutes_until(stop.dt, now)?;
        Some(format!("{noun} ends in {mins} minutes"))
    } else {
        let start = minutely[1..].iter().find(|m| m.precipitation > 0.0)?;
        let mins = minutes_until(start.dt, now)?;
        Some(format!("{noun} begins in {mins} minutes"))
    }
}

/// Minutes from `now` to `at` (epoch seconds), rounded half-up to the nearest
/// multiple of five. `None` when that is zero, in the past, or too large to
/// represent.
pub fn minutes_until(at: i64, now: DateTime<Utc>) -> Option<i64> {
    let minutes = at.checked_sub(now.timestamp())? as f64 / 60.0;
    let rounded = ((minutes / 5.0).round() as i64).checked_mul(5)?;

    (rounded > 0).then_some(rounded)
}

fn precip_noun(kind: PrecipType) -> &'static str {
    match kind {
        PrecipType::Rain => "rain",
        PrecipType::Snow => "snow",
        PrecipType::Mix => "rain and snow",
    }
}

fn capitalize_each_word(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;

    for c in text.chars() {
        if at_word_start && c.is_alphabetic() {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = c.is_whitespace();
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const NOW: i64 = 1_700_000_000;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(NOW, 0).unwrap()
    }

    fn series(samples: &[(i64, f64)]) -> Vec<RawMinutely> {
        samples
            .iter()
            .map(|&(offset, precipitation)| RawMinutely {
                dt: NOW + offset,
                precipitation,
            })
            .collect()
    }

    #[test]
    fn compose_dedupes_case_insensitively_and_capitalizes() {
        let out = compose(&["light rain", "mist", "Light Rain"]);
        assert_eq!(out, "Light Rain, Mist");
    }

    #[test]
    fn compose_of_nothing_is_empty() {
        assert_eq!(compose::<&str>(&[]), "");
    }

    #[test]
    fn minute_rounding_is_half_up_to_five() {
        assert_eq!(minutes_until(NOW + 37 * 60, now()), Some(35));
        assert_eq!(minutes_until(NOW + 37 * 60 + 30, now()), Some(40));
        assert_eq!(minutes_until(NOW + 12 * 60 + 30, now()), Some(15));
        assert_eq!(minutes_until(NOW + 150, now()), Some(5));
    }

    #[test]
    fn minute_rounding_drops_zero_and_past() {
        assert_eq!(minutes_until(NOW, now()), None);
        assert_eq!(minutes_until(NOW + 60, now()), None);
        assert_eq!(minutes_until(NOW + 149, now()), None);
        assert_eq!(minutes_until(NOW - 600, now()), None);
    }

    #[test]
    fn minute_rounding_survives_extreme_timestamps() {
        let long_ago = Utc.timestamp_opt(-1_000_000_000_000, 0).unwrap();
        assert_eq!(minutes_until(i64::MAX, long_ago), None);
        assert_eq!(minutes_until(i64::MIN, now()), None);

        let minutely = vec![
            RawMinutely {
                dt: NOW,
                precipitation: 0.0,
            },
            RawMinutely {
                dt: i64::MIN,
                precipitation: 0.4,
            },
        ];
        assert_eq!(
            compose_long("Clear Sky", &minutely, PrecipType::Rain, now()),
            "Clear Sky"
        );
    }

    #[test]
    fn long_description_reports_precipitation_ending() {
        let minutely = series(&[(0, 0.5), (600, 0.2), (1200, 0.0), (1800, 0.3)]);
        let out = compose_long("Light Rain", &minutely, PrecipType::Rain, now());
        assert_eq!(out, "Light Rain, Rain Ends In 20 Minutes");
    }

    #[test]
    fn long_description_reports_precipitation_starting() {
        let minutely = series(&[(0, 0.0), (60, 0.0), (2220, 0.1)]);
        let out = compose_long("Overcast Clouds", &minutely, PrecipType::Snow, now());
        assert_eq!(out, "Overcast Clouds, Snow Begins In 35 Minutes");
    }

    #[test]
    fn long_description_reports_only_first_transition() {
        let minutely = series(&[(0, 0.0), (900, 1.0), (1800, 0.0), (2700, 1.0)]);
        let out = compose_long("Clouds", &minutely, PrecipType::Mix, now());
        assert_eq!(out, "Clouds, Rain And Snow Begins In 15 Minutes");
    }

    #[test]
    fn long_description_skips_flat_series() {
        let dry = series(&[(0, 0.0), (600, 0.0)]);
        let wet = series(&[(0, 0.4), (600, 0.9)]);
        assert_eq!(compose_long("Clear Sky", &dry, PrecipType::Rain, now()), "Clear Sky");
        assert_eq!(compose_long("Rain", &wet, PrecipType::Rain, now()), "Rain");
        assert_eq!(compose_long("Rain", &[], PrecipType::Rain, now()), "Rain");
    }

    #[test]
    fn long_description_skips_imminent_transition() {
        let minutely = series(&[(0, 0.4), (60, 0.0)]);
        assert_eq!(compose_long("Rain", &minutely, PrecipType::Rain, now()), "Rain");
    }

    #[test]
    fn daily_description_folds_in_conditions() {
        let out = compose_daily("Moderate Rain", 62.0, 10.0, 80, PrecipType::Rain);
        assert_eq!(out, "Moderate Rain, Humid, Breezy, 80% Chance Of Rain");

        let out = compose_daily("Snow", 20.0, 30.0, 0, PrecipType::Snow);
        assert_eq!(out, "Snow, Dry, Strong Winds");

        let out = compose_daily("Clear Sky", 45.0, 3.0, 0, PrecipType::Rain);
        assert_eq!(out, "Clear Sky");
    }
}

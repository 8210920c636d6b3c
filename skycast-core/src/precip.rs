use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum PrecipType {
    #[default]
    Rain,
    Snow,
    Mix,
}

impl PrecipType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrecipType::Rain => "rain",
            PrecipType::Snow => "snow",
            PrecipType::Mix => "mix",
        }
    }
}

impl std::fmt::Display for PrecipType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Precipitation {
    /// mm over the bucket's time window.
    pub intensity: f64,
    pub kind: PrecipType,
}

/// Derive intensity and type from rain and snow volumes.
///
/// # Panics
///
/// Panics if either volume is NaN or negative. Callers validate provider
/// data before it reaches this point.
pub fn classify(rain: f64, snow: f64) -> Precipitation {
    assert!(
        rain >= 0.0 && snow >= 0.0,
        "precipitation volumes must be non-negative numbers (rain={rain}, snow={snow})"
    );

    let kind = match (rain > 0.0, snow > 0.0) {
        (true, true) => PrecipType::Mix,
        (false, true) => PrecipType::Snow,
        _ => PrecipType::Rain,
    };

    Precipitation {
        intensity: rain + snow,
        kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dry_defaults_to_rain() {
        let p = classify(0.0, 0.0);
        assert_eq!(p.kind, PrecipType::Rain);
        assert_eq!(p.intensity, 0.0);
    }

    #[test]
    fn only_rain_is_rain() {
        let p = classify(1.2, 0.0);
        assert_eq!(p.kind, PrecipType::Rain);
        assert_eq!(p.intensity, 1.2);
    }

    #[test]
    fn only_snow_is_snow() {
        let p = classify(0.0, 0.4);
        assert_eq!(p.kind, PrecipType::Snow);
        assert_eq!(p.intensity, 0.4);
    }

    #[test]
    fn both_is_mix_and_sums() {
        let p = classify(0.5, 0.25);
        assert_eq!(p.kind, PrecipType::Mix);
        assert_eq!(p.intensity, 0.75);
    }

    #[test]
    fn intensity_is_sum_across_a_grid() {
        let volumes = [0.0, 0.01, 0.3, 2.0, 15.5];
        for rain in volumes {
            for snow in volumes {
                let p = classify(rain, snow);
                assert_eq!(p.intensity, rain + snow);
                let expected = if rain > 0.0 && snow > 0.0 {
                    PrecipType::Mix
                } else if snow > 0.0 {
                    PrecipType::Snow
                } else {
                    PrecipType::Rain
                };
                assert_eq!(p.kind, expected, "rain={rain} snow={snow}");
            }
        }
    }

    #[test]
    #[should_panic(expected = "non-negative")]
    fn negative_volume_panics() {
        classify(-0.1, 0.0);
    }

    #[test]
    #[should_panic(expected = "non-negative")]
    fn nan_volume_panics() {
        classify(0.0, f64::NAN);
    }
}

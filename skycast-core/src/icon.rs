//! Provider weather code + icon token to presentation icon.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IconId {
    Sun,
    Moon,
    CloudSun,
    CloudMoon,
    CloudDrizzleSun,
    CloudDrizzleMoon,
    CloudRainSun,
    CloudRainMoon,
    CloudRainLightningSun,
    CloudRainLightningMoon,
    CloudSnowSun,
    CloudSnowMoon,
    CloudFogSun,
    CloudFogMoon,
    CloudHailSun,
    CloudHailMoon,
    Tornado,
    Error,
}

impl IconId {
    pub fn as_str(&self) -> &'static str {
        match self {
            IconId::Sun => "sun",
            IconId::Moon => "moon",
            IconId::CloudSun => "cloud_sun",
            IconId::CloudMoon => "cloud_moon",
            IconId::CloudDrizzleSun => "cloud_drizzle_sun",
            IconId::CloudDrizzleMoon => "cloud_drizzle_moon",
            IconId::CloudRainSun => "cloud_rain_sun",
            IconId::CloudRainMoon => "cloud_rain_moon",
            IconId::CloudRainLightningSun => "cloud_rain_lightning_sun",
            IconId::CloudRainLightningMoon => "cloud_rain_lightning_moon",
            IconId::CloudSnowSun => "cloud_snow_sun",
            IconId::CloudSnowMoon => "cloud_snow_moon",
            IconId::CloudFogSun => "cloud_fog_sun",
            IconId::CloudFogMoon => "cloud_fog_moon",
            IconId::CloudHailSun => "cloud_hail_sun",
            IconId::CloudHailMoon => "cloud_hail_moon",
            IconId::Tornado => "tornado",
            IconId::Error => "error",
        }
    }
}

impl std::fmt::Display for IconId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Codes the icon token alone cannot tell apart (hail, tornado).
const CODE_ICONS: &[(&str, IconId)] = &[
    ("611d", IconId::CloudHailSun),
    ("611n", IconId::CloudHailMoon),
    ("612d", IconId::CloudHailSun),
    ("612n", IconId::CloudHailMoon),
    ("613d", IconId::CloudHailSun),
    ("613n", IconId::CloudHailMoon),
    ("781d", IconId::Tornado),
    ("781n", IconId::Tornado),
];

const TOKEN_ICONS: &[(&str, IconId)] = &[
    ("01d", IconId::Sun),
    ("01n", IconId::Moon),
    ("02d", IconId::CloudSun),
    ("02n", IconId::CloudMoon),
    ("03d", IconId::CloudSun),
    ("03n", IconId::CloudMoon),
    ("04d", IconId::CloudSun),
    ("04n", IconId::CloudMoon),
    ("09d", IconId::CloudDrizzleSun),
    ("09n", IconId::CloudDrizzleMoon),
    ("10d", IconId::CloudRainSun),
    ("10n", IconId::CloudRainMoon),
    ("11d", IconId::CloudRainLightningSun),
    ("11n", IconId::CloudRainLightningMoon),
    ("13d", IconId::CloudSnowSun),
    ("13n", IconId::CloudSnowMoon),
    ("50d", IconId::CloudFogSun),
    ("50n", IconId::CloudFogMoon),
];

/// Lookup tables, built once and shared by reference.
#[derive(Debug, Clone)]
pub struct IconResolver {
    by_code: HashMap<&'static str, IconId>,
    by_token: HashMap<&'static str, IconId>,
}

impl Default for IconResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl IconResolver {
    pub fn new() -> Self {
        Self {
            by_code: CODE_ICONS.iter().copied().collect(),
            by_token: TOKEN_ICONS.iter().copied().collect(),
        }
    }

    /// Resolve `token` (e.g. "10d") and an optional provider `code` (e.g. 500).
    ///
    /// The code is tried first, keyed with the token's day/night marker;
    /// the token alone second; [`IconId::Error`] otherwise.
    pub fn resolve(&self, token: &str, code: Option<i32>) -> IconId {
        code.and_then(|code| {
            let day_night = token.chars().nth(2)?;
            self.by_code.get(format!("{code}{day_night}").as_str()).copied()
        })
        .or_else(|| self.by_token.get(token).copied())
        .unwrap_or(IconId::Error)
    }
}

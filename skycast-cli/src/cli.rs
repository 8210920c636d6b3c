use anyhow::{Context, anyhow, bail};
use clap::{Parser, Subcommand};
use inquire::validator::Validation;
use inquire::{Confirm, CustomType, CustomUserError, Password, PasswordDisplayMode, Text};
use skycast_core::{
    Config, ErrorKind, Location, OpenWeatherProvider, WeatherError, WeatherProvider,
    WeatherRequest, provider::provider_from_config,
};

use crate::output;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skycast", version, about = "Weather from the command line")]
pub struct Cli {
    /// Log pipeline activity to stderr (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key, language and an optional default location.
    Configure,

    /// Detect which API tier the configured key has access to.
    Probe,

    /// Show weather for a location.
    Show {
        /// Latitude in degrees; falls back to the configured location.
        #[arg(long, allow_hyphen_values = true, requires = "lon")]
        lat: Option<f64>,

        /// Longitude in degrees; falls back to the configured location.
        #[arg(long, allow_hyphen_values = true, requires = "lat")]
        lon: Option<f64>,

        /// Locale for descriptions, e.g. "en" or "pt-BR".
        #[arg(long)]
        lang: Option<String>,

        /// Print the unified model as JSON.
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Probe => probe().await,
            Command::Show {
                lat,
                lon,
                lang,
                json,
            } => show(lat.zip(lon), lang, json).await,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut cfg = Config::load()?;

    let api_key = Password::new("OpenWeatherMap API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message("Find it at https://home.openweathermap.org/api_keys")
        .prompt()?;

    let api_key = api_key.trim();
    if api_key.is_empty() {
        bail!("API key must not be empty");
    }
    cfg.set_api_key(api_key.to_string());

    let language = Text::new("Language:")
        .with_default(if cfg.language().is_empty() {
            "en"
        } else {
            cfg.language()
        })
        .with_help_message("e.g. en, de, pt-BR, zh-TW")
        .prompt()?;
    cfg.language = Some(language.trim().to_string());

    let wants_location = Confirm::new("Set a default location?")
        .with_default(cfg.location.is_none())
        .prompt()?;

    if wants_location {
        let latitude = CustomType::<f64>::new("Latitude:")
            .with_error_message("Please enter a number")
            .with_validator(range_validator(-90.0, 90.0))
            .prompt()?;
        let longitude = CustomType::<f64>::new("Longitude:")
            .with_error_message("Please enter a number")
            .with_validator(range_validator(-180.0, 180.0))
            .prompt()?;

        cfg.location = Some(Location {
            latitude,
            longitude,
        });
    }

    cfg.save()?;
    let path = Config::config_file_path()?;
    tracing::debug!(path = %path.display(), "configuration saved");
    println!("Configuration saved to {}", path.display());

    if cfg.api_tier()?.is_none() {
        println!("Run `skycast probe` to detect your API tier.");
    }

    Ok(())
}

async fn probe() -> anyhow::Result<()> {
    let mut cfg = Config::load()?;
    let provider = build_provider(&cfg)?;

    let tier = provider.probe_tier().await.map_err(explain)?;

    cfg.set_api_tier(tier);
    cfg.save()?;
    println!("API tier: {tier}");

    Ok(())
}

async fn show(
    coordinates: Option<(f64, f64)>,
    lang: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let mut cfg = Config::load()?;
    let provider = build_provider(&cfg)?;

    let (latitude, longitude) = match (coordinates, cfg.location) {
        (Some(coordinates), _) => coordinates,
        (None, Some(location)) => (location.latitude, location.longitude),
        (None, None) => {
            return Err(anyhow!(
                "No location given.\nHint: pass --lat and --lon, or set a default with `skycast configure`."
            ));
        }
    };

    let locale = lang.unwrap_or_else(|| cfg.language().to_string());
    tracing::debug!(latitude, longitude, locale = %locale, "requesting weather");
    let request = WeatherRequest::new(latitude, longitude).with_locale(locale);

    let weather = provider.get_weather(&request).await.map_err(explain)?;

    // persist a tier probed during this run
    if let Some(tier) = provider.cached_tier()
        && cfg.api_tier()? != Some(tier)
    {
        tracing::info!(tier = %tier, "persisting probed API tier");
        cfg.set_api_tier(tier);
        cfg.save()?;
    }

    if json {
        let out = serde_json::to_string_pretty(&weather).context("Failed to serialize weather")?;
        println!("{out}");
    } else {
        print!("{}", output::render(&weather));
    }

    Ok(())
}

fn range_validator(
    min: f64,
    max: f64,
) -> impl Fn(&f64) -> Result<Validation, CustomUserError> + Clone {
    move |value: &f64| Ok(check_range(*value, min, max))
}

fn check_range(value: f64, min: f64, max: f64) -> Validation {
    if (min..=max).contains(&value) {
        Validation::Valid
    } else {
        Validation::Invalid(format!("Please enter a number between {min} and {max}").into())
    }
}

fn build_provider(cfg: &Config) -> anyhow::Result<OpenWeatherProvider> {
    provider_from_config(cfg).map_err(explain)
}

/// Attach a user-facing hint to a pipeline error.
fn explain(err: WeatherError) -> anyhow::Error {
    let hint = match err.kind() {
        ErrorKind::Transport => "Check your network connection and try again.",
        ErrorKind::Protocol => "The provider refused the request; check your API key and plan.",
        ErrorKind::MalformedData => "The provider sent data skycast could not read.",
        ErrorKind::NoUsableTier => {
            "Your API key was not accepted by any API tier. New keys can take a few hours to activate."
        }
        ErrorKind::Configuration => "Run `skycast configure` to review your settings.",
    };

    anyhow!("{err}\nHint: {hint}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_accepts_negative_coordinates() {
        let cli = Cli::try_parse_from(["skycast", "show", "--lat", "-33.9", "--lon", "-70.6"])
            .unwrap();

        match cli.command {
            Command::Show { lat, lon, .. } => {
                assert_eq!(lat, Some(-33.9));
                assert_eq!(lon, Some(-70.6));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn show_requires_both_coordinates() {
        assert!(Cli::try_parse_from(["skycast", "show", "--lat", "10"]).is_err());
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::try_parse_from(["skycast", "probe", "-v"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn coordinates_outside_range_are_invalid() {
        assert!(matches!(check_range(45.0, -90.0, 90.0), Validation::Valid));
        assert!(matches!(check_range(-90.0, -90.0, 90.0), Validation::Valid));
        assert!(matches!(check_range(91.0, -90.0, 90.0), Validation::Invalid(_)));
        assert!(matches!(check_range(-180.5, -180.0, 180.0), Validation::Invalid(_)));
        assert!(matches!(check_range(f64::NAN, -90.0, 90.0), Validation::Invalid(_)));
    }

    #[test]
    fn latitude_validator_rejects_out_of_range() {
        let validate = range_validator(-90.0, 90.0);
        assert!(matches!(validate(&12.5), Ok(Validation::Valid)));
        assert!(matches!(validate(&120.0), Ok(Validation::Invalid(_))));
    }

    #[test]
    fn explain_adds_hint_per_kind() {
        let msg = explain(WeatherError::transport("connection refused")).to_string();
        assert!(msg.contains("connection refused"));
        assert!(msg.contains("Hint: Check your network"));
    }
}

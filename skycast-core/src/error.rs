//! Error taxonomy for the acquisition pipeline.
//!
//! Every failure the pipeline can surface is one of five kinds. The fetch
//! stage reports them as values; only the merge step turns them into the
//! operation's error.

use std::time::Duration;

use thiserror::Error;

use crate::provider::ApiTier;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeatherError {
    /// No response reached us (DNS, refused connection, timeout).
    #[error("Could not reach the weather provider: {message}")]
    Transport { message: String },

    /// A response arrived but rejected the request.
    #[error("Weather provider rejected the request with status {status}: {message}")]
    Protocol { status: u16, message: String },

    /// A response arrived but its body did not fit the expected schema.
    #[error("Weather provider returned malformed data: {message}")]
    MalformedData { message: String },

    /// Every probed tier answered, none accepted the credential.
    #[error("No usable API tier for this credential (probed: {probed})")]
    NoUsableTier { probed: String },

    /// The caller passed something the pipeline cannot act on.
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Discriminant of [`WeatherError`], for mapping errors to user-facing text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Transport,
    Protocol,
    MalformedData,
    NoUsableTier,
    Configuration,
}

impl WeatherError {
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn timeout(after: Duration) -> Self {
        Self::Transport {
            message: format!("timed out after {} ms", after.as_millis()),
        }
    }

    pub fn protocol<S: Into<String>>(status: u16, message: S) -> Self {
        Self::Protocol {
            status,
            message: message.into(),
        }
    }

    pub fn malformed<S: Into<String>>(message: S) -> Self {
        Self::MalformedData {
            message: message.into(),
        }
    }

    pub fn no_usable_tier(probed: &[ApiTier]) -> Self {
        let probed = probed
            .iter()
            .map(ApiTier::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        Self::NoUsableTier { probed }
    }

    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            WeatherError::Transport { .. } => ErrorKind::Transport,
            WeatherError::Protocol { .. } => ErrorKind::Protocol,
            WeatherError::MalformedData { .. } => ErrorKind::MalformedData,
            WeatherError::NoUsableTier { .. } => ErrorKind::NoUsableTier,
            WeatherError::Configuration { .. } => ErrorKind::Configuration,
        }
    }

    /// Transport failures are the only ones a caller may usefully retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }
}

impl From<serde_json::Error> for WeatherError {
    fn from(err: serde_json::Error) -> Self {
        WeatherError::malformed(err.to_string())
    }
}

pub type Result<T, E = WeatherError> = std::result::Result<T, E>;

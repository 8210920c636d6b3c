//! API tier detection for a credential.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::{ErrorKind, Result, WeatherError};
use crate::fetch::{FetchResult, Fetcher};
use crate::provider::ApiTier;
use crate::provider::openweather::Endpoints;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The request succeeded.
    Authorized,
    /// A response arrived but rejected the request.
    Unauthorized,
    /// No response at all.
    Unreachable,
}

impl From<&FetchResult> for ProbeOutcome {
    fn from(result: &FetchResult) -> Self {
        match result {
            Ok(_) => ProbeOutcome::Authorized,
            Err(err) if err.kind() == ErrorKind::Transport => ProbeOutcome::Unreachable,
            Err(_) => ProbeOutcome::Unauthorized,
        }
    }
}

/// Pick the first authorized tier in priority order.
///
/// All-unreachable is a transport error; any other outcome without an
/// authorized tier means the credential itself is the problem.
pub fn select_tier(outcomes: &[(ApiTier, ProbeOutcome)]) -> Result<ApiTier> {
    let outcome_of = |tier: ApiTier| {
        outcomes
            .iter()
            .find(|(probed, _)| *probed == tier)
            .map(|(_, outcome)| *outcome)
    };

    if let Some(tier) = ApiTier::all()
        .iter()
        .copied()
        .find(|tier| outcome_of(*tier) == Some(ProbeOutcome::Authorized))
    {
        return Ok(tier);
    }

    if outcomes
        .iter()
        .all(|(_, outcome)| *outcome == ProbeOutcome::Unreachable)
    {
        return Err(WeatherError::transport(
            "could not connect to the weather provider",
        ));
    }

    let probed: Vec<ApiTier> = outcomes.iter().map(|(tier, _)| *tier).collect();
    Err(WeatherError::no_usable_tier(&probed))
}

/// Probe every tier concurrently at a fixed reference location.
pub async fn probe_tiers(
    fetcher: &Fetcher,
    endpoints: &Endpoints,
    api_key: &str,
    timeout: Duration,
) -> Result<ApiTier> {
    let tiers = ApiTier::all();
    let requests: Vec<_> = tiers
        .iter()
        .map(|tier| endpoints.probe(*tier, api_key))
        .collect();

    let results = fetcher.fetch_all_within(&requests, timeout).await?;

    let outcomes: Vec<(ApiTier, ProbeOutcome)> = tiers
        .iter()
        .copied()
        .zip(results.iter().map(ProbeOutcome::from))
        .collect();

    for ((tier, outcome), result) in outcomes.iter().zip(&results) {
        if let Err(err) = result {
            tracing::warn!(tier = %tier, ?outcome, error = %err, "tier probe failed");
        }
    }

    let tier = select_tier(&outcomes)?;
    tracing::info!(tier = %tier, "selected API tier");
    Ok(tier)
}

/// Probed tiers, keyed by credential.
///
/// A tier never changes for a given key, so entries live until the key is
/// replaced.
#[derive(Debug, Default)]
pub struct TierCache {
    tiers: Mutex<HashMap<String, ApiTier>>,
}

impl TierCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, api_key: &str) -> Option<ApiTier> {
        self.tiers.lock().get(api_key).copied()
    }

    pub fn insert(&self, api_key: &str, tier: ApiTier) {
        self.tiers.lock().insert(api_key.to_string(), tier);
    }

    pub fn invalidate(&self, api_key: &str) {
        self.tiers.lock().remove(api_key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::ProbeOutcome::*;
    use crate::provider::ApiTier::*;

    #[test]
    fn highest_authorized_tier_wins() {
        let outcomes = [
            (OneCall30, Unauthorized),
            (OneCall25, Authorized),
            (Weather25, Authorized),
        ];
        assert_eq!(select_tier(&outcomes).unwrap(), OneCall25);
    }

    #[test]
    fn priority_ignores_input_order() {
        let outcomes = [
            (Weather25, Authorized),
            (OneCall25, Authorized),
            (OneCall30, Authorized),
        ];
        assert_eq!(select_tier(&outcomes).unwrap(), OneCall30);
    }

    #[test]
    fn authorized_tier_wins_despite_unreachable_ones() {
        let outcomes = [
            (OneCall30, Unreachable),
            (OneCall25, Unreachable),
            (Weather25, Authorized),
        ];
        assert_eq!(select_tier(&outcomes).unwrap(), Weather25);
    }

    #[test]
    fn all_unreachable_is_transport_error() {
        let outcomes = [
            (OneCall30, Unreachable),
            (OneCall25, Unreachable),
            (Weather25, Unreachable),
        ];
        let err = select_tier(&outcomes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[test]
    fn responded_but_rejected_is_no_usable_tier() {
        let outcomes = [
            (OneCall30, Unauthorized),
            (OneCall25, Unreachable),
            (Weather25, Unauthorized),
        ];
        let err = select_tier(&outcomes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoUsableTier);
    }

    #[test]
    fn outcome_classification_follows_error_kind() {
        let ok: FetchResult = Ok("{}".into());
        let rejected: FetchResult = Err(WeatherError::protocol(401, "Invalid API key"));
        let down: FetchResult = Err(WeatherError::transport("connection refused"));

        assert_eq!(ProbeOutcome::from(&ok), Authorized);
        assert_eq!(ProbeOutcome::from(&rejected), Unauthorized);
        assert_eq!(ProbeOutcome::from(&down), Unreachable);
    }

    #[test]
    fn cache_is_keyed_by_credential() {
        let cache = TierCache::new();
        cache.insert("A", OneCall30);
        cache.insert("B", OneCall25);

        assert_eq!(cache.get("A"), Some(OneCall30));
        assert_eq!(cache.get("B"), Some(OneCall25));

        cache.invalidate("A");
        assert_eq!(cache.get("A"), None);
        assert_eq!(cache.get("B"), Some(OneCall25));
    }
}

// ============================================================================
// Configuration
// ============================================================================
// Lue depuis l'environnement (et un fichier .env optionnel via dotenvy).
// Les valeurs par défaut correspondent au comportement attendu : signaux
// toutes les 60 s, statistiques toutes les 5 min.
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::debug;

use crate::poller::PollCadence;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);
const LEDGER_FILE_NAME: &str = "voted_signals.json";

/// Configuration complète du client
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// URL de base du service (sans /api)
    pub api_url: String,

    /// Fichier JSON du ledger de votes
    pub ledger_path: PathBuf,

    /// Cadences de polling
    pub cadence: PollCadence,

    /// Timeout appliqué à chaque requête HTTP
    pub http_timeout: Duration,
}

impl Config {
    /// Charge la configuration depuis l'environnement du processus
    pub fn from_env() -> Result<Self> {
        // .env absent : pas une erreur
        if let Ok(path) = dotenvy::dotenv() {
            debug!(?path, "Loaded .env file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Construit la configuration depuis une fonction de lookup
    ///
    /// CONCEPT : Injection de la source
    /// - from_env() passe std::env::var
    /// - les tests passent une HashMap, sans toucher à l'environnement global
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = PollCadence::default();

        let api_url = lookup("SIGNALBOARD_API_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let ledger_path = match lookup("SIGNALBOARD_LEDGER_PATH") {
            Some(path) if !path.trim().is_empty() => PathBuf::from(path.trim()),
            _ => default_ledger_path(),
        };

        let cadence = PollCadence {
            signals: seconds(&lookup, "SIGNALBOARD_SIGNALS_EVERY_SECS", defaults.signals)?,
            stats: seconds(&lookup, "SIGNALBOARD_STATS_EVERY_SECS", defaults.stats)?,
        };
        let http_timeout = seconds(&lookup, "SIGNALBOARD_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT)?;

        Ok(Self {
            api_url,
            ledger_path,
            cadence,
            http_timeout,
        })
    }
}

/// ~/.local/share/signalboard/voted_signals.json sur Linux
fn default_ledger_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("signalboard")
        .join(LEDGER_FILE_NAME)
}

/// Lit une durée en secondes strictement positive
fn seconds<F>(lookup: &F, key: &str, default: Duration) -> Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };

    let secs: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{key} doit être un nombre de secondes (reçu {raw:?})"))?;

    if secs == 0 {
        bail!("{key} doit être supérieur à zéro");
    }

    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.cadence.signals, Duration::from_secs(60));
        assert_eq!(config.cadence.stats, Duration::from_secs(300));
        assert_eq!(config.http_timeout, DEFAULT_HTTP_TIMEOUT);
        assert!(config.ledger_path.ends_with("signalboard/voted_signals.json"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("SIGNALBOARD_API_URL", "https://signals.example.com/"),
            ("SIGNALBOARD_LEDGER_PATH", "/tmp/votes.json"),
            ("SIGNALBOARD_SIGNALS_EVERY_SECS", "15"),
        ]))
        .unwrap();

        assert_eq!(config.api_url, "https://signals.example.com");
        assert_eq!(config.ledger_path, PathBuf::from("/tmp/votes.json"));
        assert_eq!(config.cadence.signals, Duration::from_secs(15));
        assert_eq!(config.cadence.stats, Duration::from_secs(300));
    }

    #[test]
    fn test_invalid_period_is_rejected() {
        assert!(Config::from_lookup(lookup_from(&[("SIGNALBOARD_STATS_EVERY_SECS", "0")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("SIGNALBOARD_HTTP_TIMEOUT_SECS", "dix")])).is_err());
    }
}

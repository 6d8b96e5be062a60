// ============================================================================
// API Client : service de signaux
// ============================================================================
// Implémentation HTTP de SignalApi
//
// CONCEPTS RUST :
// 1. async/await : les requêtes ne bloquent pas le worker
// 2. Result<T, ApiError> : l'appelant distingue refus serveur et panne réseau
// 3. Serde : désérialisation JSON automatique
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use crate::api::SignalApi;
use crate::error::ApiError;
use crate::models::{ErrorBody, Signal, StatsSummary, VoteReceipt, VoteType};

/// Client HTTP du service de signaux
///
/// CONCEPT : Un seul reqwest::Client pour toute la session
/// - le pool de connexions est réutilisé entre les polls
#[derive(Debug, Clone)]
pub struct HttpSignalApi {
    client: Client,
    base_url: Url,
}

impl HttpSignalApi {
    /// Crée un client pour `base_url` (ex: "http://127.0.0.1:5000")
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{base_url} ({e})")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }

        let client = Client::builder()
            .user_agent(concat!("signalboard/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self { client, base_url })
    }

    /// Construit {base}/seg1/seg2/... en encodant chaque segment
    ///
    /// CONCEPT : path_segments_mut
    /// - un id contenant "/" ou "?" reste un seul segment
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        debug!(url = %url, "Sending GET request");
        let response = self.client.get(url).send().await?;
        let response = ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl SignalApi for HttpSignalApi {
    #[instrument(skip(self))]
    async fn fetch_signals(&self) -> Result<Vec<Signal>, ApiError> {
        let url = self.endpoint(&["api", "signals"])?;
        let signals: Vec<Signal> = self.get_json(url).await?;
        info!(count = signals.len(), "Fetched open signals");
        Ok(signals)
    }

    #[instrument(skip(self))]
    async fn fetch_stats(&self) -> Result<StatsSummary, ApiError> {
        let url = self.endpoint(&["api", "stats"])?;
        let stats: StatsSummary = self.get_json(url).await?;
        info!(
            today = stats.today.total,
            week = stats.week.total,
            month = stats.month.total,
            "Fetched stats summary"
        );
        Ok(stats)
    }

    #[instrument(skip(self, vote), fields(vote = %vote))]
    async fn cast_vote(&self, signal_id: &str, vote: VoteType) -> Result<VoteReceipt, ApiError> {
        let url = self.endpoint(&["api", "vote", signal_id, vote.as_str()])?;
        debug!(url = %url, "Sending vote");

        let response = self.client.post(url).send().await?;
        let response = ensure_success(response).await?;
        let receipt: VoteReceipt = response.json().await?;

        info!(
            votes_win = receipt.votes_win,
            votes_lose = receipt.votes_lose,
            status = ?receipt.status,
            "Vote accepted"
        );
        Ok(receipt)
    }
}

/// Convertit une réponse non-2xx en ApiError::Rejected
///
/// Le corps d'erreur attendu est {"error": "..."} ; s'il est absent ou
/// illisible, le message reste None et l'appelant choisit un texte générique.
async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.error);

    warn!(status = %status, message = ?message, "Signal service rejected request");
    Err(ApiError::Rejected {
        status: status.as_u16(),
        message,
    })
}

// ============================================================================
// Tests unitaires
// ============================================================================

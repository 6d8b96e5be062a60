// ============================================================================
// Module : api
// ============================================================================
// Frontière avec le service de signaux : deux lectures, une écriture.
//
// CONCEPT RUST : Trait object
// - Le worker manipule un Arc<dyn SignalApi>
// - En production : HttpSignalApi (reqwest)
// - En test : une fausse implémentation scriptée
// ============================================================================

pub mod client; // Client HTTP (reqwest)

use async_trait::async_trait;

use crate::error::ApiError;
use crate::models::{Signal, StatsSummary, VoteReceipt, VoteType};

pub use client::HttpSignalApi;

/// Opérations offertes par le service de signaux
#[async_trait]
pub trait SignalApi: Send + Sync {
    /// GET /api/signals : signaux ouverts (liste vide = aucun signal)
    async fn fetch_signals(&self) -> Result<Vec<Signal>, ApiError>;

    /// GET /api/stats : résumé aujourd'hui / semaine / mois
    async fn fetch_stats(&self) -> Result<StatsSummary, ApiError>;

    /// POST /api/vote/{id}/{win|lose}
    async fn cast_vote(&self, signal_id: &str, vote: VoteType) -> Result<VoteReceipt, ApiError>;
}

// ============================================================================
// Votes : type de vote et réponse du serveur
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

/// Vote d'un utilisateur sur un signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    Win,
    Lose,
}

impl VoteType {
    /// Segment d'URL attendu par /api/vote/{id}/{type}
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteType::Win => "win",
            VoteType::Lose => "lose",
        }
    }
}

impl fmt::Display for VoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statut d'un signal après un vote
///
/// Le serveur historique renvoie "active" pour un signal ouvert,
/// d'où l'alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalStatus {
    #[serde(alias = "active")]
    Open,
    Closed,
}

/// Réponse d'un vote accepté
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteReceipt {
    #[serde(default)]
    pub message: String,
    pub votes_win: u32,
    pub votes_lose: u32,
    pub status: SignalStatus,
}

/// Corps d'une réponse d'erreur (non-2xx)
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: Option<String>,
}

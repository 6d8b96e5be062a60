// ============================================================================
// Erreurs typées
// ============================================================================
// anyhow reste utilisé pour la plomberie applicative (démarrage, terminal).
// Ici : les erreurs dont le contenu pilote un comportement (message montré
// à l'utilisateur après un vote refusé, ledger non persisté).
// ============================================================================

use thiserror::Error;

/// Message affiché quand le serveur refuse un vote sans explication
pub const VOTE_FALLBACK_MESSAGE: &str = "Impossible de voter";

/// Message affiché quand le vote n'a pas pu atteindre le serveur
pub const VOTE_CONNECTION_MESSAGE: &str = "Erreur de connexion lors du vote";

/// Erreurs du client HTTP
#[derive(Debug, Error)]
pub enum ApiError {
    /// Échec réseau, timeout ou corps JSON illisible
    #[error("requête HTTP échouée : {0}")]
    Http(#[from] reqwest::Error),

    /// Réponse non-2xx, avec le champ "error" du serveur s'il existe
    #[error("le serveur a répondu HTTP {status} : {}", .message.as_deref().unwrap_or("(sans message)"))]
    Rejected { status: u16, message: Option<String> },

    /// URL de base inutilisable pour construire la requête
    #[error("URL invalide : {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Texte à montrer à l'utilisateur après un vote échoué
    pub fn vote_failure_message(&self) -> String {
        match self {
            ApiError::Rejected { message: Some(message), .. } if !message.is_empty() => message.clone(),
            ApiError::Rejected { .. } => VOTE_FALLBACK_MESSAGE.to_string(),
            ApiError::Http(_) | ApiError::InvalidUrl(_) => VOTE_CONNECTION_MESSAGE.to_string(),
        }
    }
}

/// Erreurs de persistance du ledger de votes
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("écriture du ledger impossible : {0}")]
    Io(#[from] std::io::Error),

    #[error("sérialisation du ledger impossible : {0}")]
    Serialize(#[from] serde_json::Error),
}

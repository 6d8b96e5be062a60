// ============================================================================
// Structure : StatsSummary
// ============================================================================
// Statistiques agrégées renvoyées par /api/stats, sur trois fenêtres
// (aujourd'hui, semaine, mois). Le client ne recalcule rien.
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

/// Win rate tel que fourni par le serveur (nombre ou texte pré-formaté)
///
/// CONCEPT RUST : #[serde(untagged)]
/// - serde essaie chaque variant dans l'ordre
/// - serde_json::Number conserve la forme d'origine (50.0 reste "50.0")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WinRate {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for WinRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WinRate::Number(n) => write!(f, "{n}"),
            WinRate::Text(s) => f.write_str(s),
        }
    }
}

impl Default for WinRate {
    fn default() -> Self {
        WinRate::Number(serde_json::Number::from(0))
    }
}

/// Statistiques d'une fenêtre de temps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsWindow {
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    #[serde(default)]
    pub win_rate: WinRate,
}

/// Résumé complet : trois fenêtres identiques
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSummary {
    pub today: StatsWindow,
    pub week: StatsWindow,
    pub month: StatsWindow,
}

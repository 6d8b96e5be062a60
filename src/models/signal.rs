// ============================================================================
// Structure : Signal
// ============================================================================
// Une recommandation de trading telle que publiée par le service de signaux
//
// CONCEPTS RUST :
// 1. #[derive(Deserialize)] : le JSON de /api/signals est mappé directement
// 2. #[serde(default)] : champs optionnels côté serveur (tallies, détails)
// 3. Champs inconnus ("status", "voted_ips") ignorés par défaut par serde
// ============================================================================

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Sens du signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    /// Achat : tp > entry > sl
    Long,
    /// Vente : tp < entry < sl
    Short,
}

impl Direction {
    /// Label affiché ("LONG" / "SHORT")
    pub fn label(&self) -> &'static str {
        match self {
            Direction::Long => "LONG",
            Direction::Short => "SHORT",
        }
    }
}

/// Un signal ouvert, tel que renvoyé par le serveur
///
/// Les niveaux de prix ne sont pas validés côté client : le serveur
/// est supposé respecter l'ordre tp/entry/sl selon la direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Identifiant opaque, stable tant que le signal est ouvert
    pub id: String,

    /// Instant de création (horloge serveur)
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,

    /// Symbole de l'instrument (ex: "BTCUSDT")
    pub coin: String,

    pub direction: Direction,

    pub entry: f64,
    pub tp: f64,
    pub sl: f64,

    /// Ratio reward/risk
    pub rr: f64,

    /// Nom court du combo d'indicateurs
    pub combo_name: String,

    /// Description longue, affichée uniquement à la demande
    #[serde(default)]
    pub combo_details: String,

    /// Derniers compteurs vus (le serveur fait autorité)
    #[serde(default)]
    pub votes_win: u32,
    #[serde(default)]
    pub votes_lose: u32,
}

impl Signal {
    /// Symbole sans la devise de cotation ("BTCUSDT" -> "BTC")
    pub fn base_asset(&self) -> String {
        self.coin.replace("USDT", "")
    }

    /// Retourne une copie du signal avec les compteurs donnés
    ///
    /// CONCEPT RUST : Struct update syntax
    /// - On ne modifie jamais le signal en place : on construit un nouvel
    ///   enregistrement qui remplace l'ancien dans le snapshot
    pub fn with_tally(&self, votes_win: u32, votes_lose: u32) -> Signal {
        Signal {
            votes_win,
            votes_lose,
            ..self.clone()
        }
    }
}

/// Accepte un timestamp RFC 3339 ("2024-01-01T00:00:00Z", "+00:00")
/// ou un timestamp naïf, interprété comme UTC.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| serde::de::Error::custom(format!("timestamp invalide : {raw}")))
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

// ============================================================================
// Tests
// ============================================================================

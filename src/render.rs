// ============================================================================
// RenderEngine : snapshots -> modèles de vue
// ============================================================================
// Fonctions pures, sans réseau ni stockage : mêmes entrées => même vue.
// Le dessin ratatui (ui::dashboard) ne fait que recopier ces modèles.
//
// CONCEPTS RUST :
// 1. Enums comme états de vue (Loading / Empty / Unavailable / Table)
// 2. Génériques avec trait bound (V: VotedSet) : le rendu ignore d'où
//    vient l'ensemble des votes
// 3. FixedOffset passé en paramètre : l'heure locale n'est pas lue ici,
//    le rendu reste déterministe
// ============================================================================

use chrono::FixedOffset;

use crate::ledger::VotedSet;
use crate::models::{Direction, Signal, StatsSummary, StatsWindow};
use crate::store::{FetchStatus, SignalSnapshotStore};

/// Décimales des prix (entry, tp, sl)
pub const PRICE_DECIMALS: usize = 4;

/// Décimales du ratio R:R
pub const RR_DECIMALS: usize = 1;

/// Format d'affichage des timestamps (heure du spectateur)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const EMPTY_SIGNALS_MESSAGE: &str = "Aucun signal actif pour le moment. Revenez plus tard.";
pub const SIGNALS_UNAVAILABLE_MESSAGE: &str = "Impossible de joindre le serveur. Réessayez plus tard.";
pub const STATS_UNAVAILABLE_MESSAGE: &str = "Statistiques indisponibles";

/// Rôle de couleur d'un niveau de prix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Côté gain (vert)
    Profit,
    /// Côté perte (rouge)
    Loss,
}

/// Un bouton de vote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteButton {
    pub label: String,
    pub enabled: bool,
}

/// Une ligne du tableau des signaux
#[derive(Debug, Clone, PartialEq)]
pub struct SignalRow {
    pub signal_id: String,
    pub time: String,
    pub coin: String,
    pub direction: Direction,
    pub entry: String,
    pub tp: String,
    pub tp_tone: Tone,
    pub sl: String,
    pub sl_tone: Tone,
    pub rr: String,
    pub combo_name: String,
    pub win_button: VoteButton,
    pub lose_button: VoteButton,
    /// Marqueur "déjà voté"
    pub already_voted: bool,
}

/// Vue du tableau des signaux
#[derive(Debug, Clone, PartialEq)]
pub enum SignalsView {
    /// Premier chargement en cours
    Loading,
    /// Aucun signal ouvert (état distinct d'un tableau vide)
    Empty { message: &'static str },
    /// Dernier fetch en échec
    Unavailable { message: &'static str },
    Table(Vec<SignalRow>),
}

/// Carte d'une fenêtre statistique
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsCard {
    pub label: &'static str,
    pub total: String,
    pub wins: String,
    pub losses: String,
    pub win_rate: String,
}

/// Vue des statistiques
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatsView {
    Loading,
    Unavailable { message: &'static str },
    Cards([StatsCard; 3]),
}

// ============================================================================
// Signaux
// ============================================================================

/// Rend la liste de signaux en tenant compte des votes déjà émis
pub fn render_signals_view<V>(signals: &[Signal], voted: &V, offset: &FixedOffset) -> SignalsView
where
    V: VotedSet + ?Sized,
{
    if signals.is_empty() {
        return SignalsView::Empty {
            message: EMPTY_SIGNALS_MESSAGE,
        };
    }

    SignalsView::Table(
        signals
            .iter()
            .map(|signal| render_signal_row(signal, voted.has(&signal.id), offset))
            .collect(),
    )
}

/// Rend le panneau des signaux selon l'état du dernier fetch
pub fn render_signals_panel<V>(store: &SignalSnapshotStore, voted: &V, offset: &FixedOffset) -> SignalsView
where
    V: VotedSet + ?Sized,
{
    match store.signals_status() {
        FetchStatus::Loading => SignalsView::Loading,
        FetchStatus::Failed(_) => SignalsView::Unavailable {
            message: SIGNALS_UNAVAILABLE_MESSAGE,
        },
        FetchStatus::Ready => render_signals_view(store.signals(), voted, offset),
    }
}

/// Rend une ligne
///
/// Pour un LONG le TP est côté gain et le SL côté perte ; pour un SHORT
/// les couleurs sont inversées.
pub fn render_signal_row(signal: &Signal, has_voted: bool, offset: &FixedOffset) -> SignalRow {
    let (tp_tone, sl_tone) = match signal.direction {
        Direction::Long => (Tone::Profit, Tone::Loss),
        Direction::Short => (Tone::Loss, Tone::Profit),
    };

    SignalRow {
        signal_id: signal.id.clone(),
        time: signal
            .timestamp
            .with_timezone(offset)
            .format(TIMESTAMP_FORMAT)
            .to_string(),
        coin: signal.base_asset(),
        direction: signal.direction,
        entry: format_price(signal.entry),
        tp: format_price(signal.tp),
        tp_tone,
        sl: format_price(signal.sl),
        sl_tone,
        rr: format!("1:{:.*}", RR_DECIMALS, signal.rr),
        combo_name: signal.combo_name.clone(),
        win_button: VoteButton {
            label: format!("Win ({})", signal.votes_win),
            enabled: !has_voted,
        },
        lose_button: VoteButton {
            label: format!("Lose ({})", signal.votes_lose),
            enabled: !has_voted,
        },
        already_voted: has_voted,
    }
}

fn format_price(value: f64) -> String {
    format!("{:.*}", PRICE_DECIMALS, value)
}

// ============================================================================
// Statistiques
// ============================================================================

/// Projection champ à champ des trois fenêtres (aucun calcul)
pub fn render_stats_view(summary: &StatsSummary) -> StatsView {
    StatsView::Cards([
        stats_card("Aujourd'hui", &summary.today),
        stats_card("Cette semaine", &summary.week),
        stats_card("Ce mois", &summary.month),
    ])
}

/// Rend le panneau des stats : les dernières stats connues restent
/// affichées même si le dernier rafraîchissement a échoué
pub fn render_stats_panel(store: &SignalSnapshotStore) -> StatsView {
    match (store.stats(), store.stats_status()) {
        (Some(summary), _) => render_stats_view(summary),
        (None, FetchStatus::Failed(_)) => StatsView::Unavailable {
            message: STATS_UNAVAILABLE_MESSAGE,
        },
        (None, _) => StatsView::Loading,
    }
}

fn stats_card(label: &'static str, window: &StatsWindow) -> StatsCard {
    StatsCard {
        label,
        total: window.total.to_string(),
        wins: window.wins.to_string(),
        losses: window.losses.to_string(),
        win_rate: window.win_rate.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================

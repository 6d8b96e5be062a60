// ============================================================================
// SignalSnapshotStore : derniers snapshots reçus du serveur
// ============================================================================
// Un emplacement par type de donnée (signaux, statistiques), remplacé en
// entier à chaque fetch réussi. Les lecteurs voient soit l'ancien snapshot,
// soit le nouveau, jamais un état intermédiaire.
//
// CONCEPT RUST : Remplacement par assignation
// - replace_signals() prend ownership du nouveau Vec et l'assigne d'un coup
// - toute modification ciblée construit un nouveau Vec puis l'assigne
// - le borrow checker garantit qu'aucun lecteur ne tient une référence
//   pendant l'assignation
// ============================================================================

use tracing::{debug, warn};

use crate::models::{Signal, StatsSummary};

/// État du dernier fetch d'un type de donnée
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    /// Aucune réponse reçue pour l'instant
    Loading,
    /// Dernier fetch réussi
    Ready,
    /// Dernier fetch échoué (message destiné aux logs / à l'affichage)
    Failed(String),
}

/// Snapshots courants des signaux ouverts et des statistiques
#[derive(Debug)]
pub struct SignalSnapshotStore {
    signals: Vec<Signal>,
    signals_status: FetchStatus,
    stats: Option<StatsSummary>,
    stats_status: FetchStatus,
}

impl SignalSnapshotStore {
    pub fn new() -> Self {
        Self {
            signals: Vec::new(),
            signals_status: FetchStatus::Loading,
            stats: None,
            stats_status: FetchStatus::Loading,
        }
    }

    // ========================================================================
    // Signaux
    // ========================================================================

    /// Remplace la liste des signaux en une seule assignation
    pub fn replace_signals(&mut self, signals: Vec<Signal>) {
        debug!(count = signals.len(), "Signals snapshot replaced");
        self.signals = signals;
        self.signals_status = FetchStatus::Ready;
    }

    /// Marque le dernier fetch de signaux comme échoué
    ///
    /// La liste précédente est conservée (recherche de détails), seule la
    /// vue bascule sur l'état d'erreur.
    pub fn mark_signals_failed(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!(error = %message, "Signals refresh failed");
        self.signals_status = FetchStatus::Failed(message);
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn signals_status(&self) -> &FetchStatus {
        &self.signals_status
    }

    /// Cherche un signal dans le snapshot courant (pas d'historique)
    pub fn lookup_signal(&self, signal_id: &str) -> Option<&Signal> {
        self.signals.iter().find(|s| s.id == signal_id)
    }

    /// Position d'un signal dans le snapshot courant
    pub fn position(&self, signal_id: &str) -> Option<usize> {
        self.signals.iter().position(|s| s.id == signal_id)
    }

    /// Remplace un enregistrement par celui construit par `f`
    ///
    /// Retourne false si le signal n'est plus dans le snapshot.
    pub fn replace_signal<F>(&mut self, signal_id: &str, f: F) -> bool
    where
        F: FnOnce(&Signal) -> Signal,
    {
        let Some(index) = self.position(signal_id) else {
            return false;
        };

        let replacement = f(&self.signals[index]);
        let mut next = self.signals.clone();
        next[index] = replacement;
        self.signals = next;
        true
    }

    /// Retire un signal du snapshot courant
    pub fn remove_signal(&mut self, signal_id: &str) -> bool {
        if self.position(signal_id).is_none() {
            return false;
        }

        let next: Vec<Signal> = self
            .signals
            .iter()
            .filter(|s| s.id != signal_id)
            .cloned()
            .collect();
        self.signals = next;
        true
    }

    // ========================================================================
    // Statistiques
    // ========================================================================

    /// Remplace le résumé statistique
    pub fn replace_stats(&mut self, stats: StatsSummary) {
        self.stats = Some(stats);
        self.stats_status = FetchStatus::Ready;
    }

    /// Marque le dernier fetch de statistiques comme échoué
    ///
    /// Les dernières statistiques connues restent affichées.
    pub fn mark_stats_failed(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!(error = %message, "Stats refresh failed");
        self.stats_status = FetchStatus::Failed(message);
    }

    pub fn stats(&self) -> Option<&StatsSummary> {
        self.stats.as_ref()
    }

    pub fn stats_status(&self) -> &FetchStatus {
        &self.stats_status
    }
}

impl Default for SignalSnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

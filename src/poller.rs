// ============================================================================
// Poller : rafraîchissements périodiques
// ============================================================================
// Deux tâches répétitives indépendantes, démarrées une fois au lancement et
// jamais arrêtées (la fin du runtime du worker fait office de teardown) :
// - signaux : toutes les 60 s
// - statistiques : toutes les 300 s
//
// CONCEPT : Ticks non mis en file
// - chaque tick lance SA propre tâche de fetch (tokio::spawn)
// - si un fetch est encore en cours au tick suivant, les deux tournent
// - les résultats partent dans le channel dans l'ordre de COMPLÉTION :
//   la dernière réponse arrivée gagne
// ============================================================================

use std::future::Future;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::api::SignalApi;
use crate::worker::AppResult;

pub const SIGNALS_EVERY: Duration = Duration::from_secs(60);
pub const STATS_EVERY: Duration = Duration::from_secs(300);

/// Périodes des deux tâches de polling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollCadence {
    pub signals: Duration,
    pub stats: Duration,
}

impl Default for PollCadence {
    fn default() -> Self {
        Self {
            signals: SIGNALS_EVERY,
            stats: STATS_EVERY,
        }
    }
}

/// Planificateur des rafraîchissements
pub struct Poller {
    api: Arc<dyn SignalApi>,
    results: Sender<AppResult>,
    cadence: PollCadence,
}

impl Poller {
    pub fn new(api: Arc<dyn SignalApi>, results: Sender<AppResult>, cadence: PollCadence) -> Self {
        Self { api, results, cadence }
    }

    /// Démarre les deux tâches sur le runtime courant
    ///
    /// Le premier tick de chaque tâche est immédiat : c'est le chargement
    /// initial.
    pub fn start(self) -> [JoinHandle<()>; 2] {
        info!(
            signals_every = ?self.cadence.signals,
            stats_every = ?self.cadence.stats,
            "Starting poller"
        );

        let signals_task = {
            let api = self.api.clone();
            let results = self.results.clone();
            spawn_repeating("signals", self.cadence.signals, move || {
                let api = api.clone();
                let results = results.clone();
                async move { refresh_signals(api.as_ref(), &results).await }
            })
        };

        let stats_task = {
            let api = self.api;
            let results = self.results;
            spawn_repeating("stats", self.cadence.stats, move || {
                let api = api.clone();
                let results = results.clone();
                async move { refresh_stats(api.as_ref(), &results).await }
            })
        };

        [signals_task, stats_task]
    }
}

/// Lance `task` toutes les `period`, chaque exécution dans sa propre tâche
///
/// CONCEPT RUST : Fn() -> Future
/// - la closure fabrique une nouvelle future à chaque tick
/// - tokio::spawn la détache : le tick suivant n'attend pas la précédente
fn spawn_repeating<F, Fut>(name: &'static str, period: Duration, task: F) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            debug!(task = name, "Poll tick");
            tokio::spawn(task());
        }
    })
}

/// Un cycle fetch-and-replace des signaux
pub async fn refresh_signals(api: &dyn SignalApi, results: &Sender<AppResult>) {
    let result = match api.fetch_signals().await {
        Ok(signals) => AppResult::SignalsLoaded(signals),
        Err(e) => AppResult::SignalsFailed(e.to_string()),
    };
    // Receiver fermé = l'UI est partie, rien à faire
    let _ = results.send(result);
}

/// Un cycle fetch-and-replace des statistiques
pub async fn refresh_stats(api: &dyn SignalApi, results: &Sender<AppResult>) {
    let result = match api.fetch_stats().await {
        Ok(stats) => AppResult::StatsLoaded(stats),
        Err(e) => AppResult::StatsFailed(e.to_string()),
    };
    let _ = results.send(result);
}

// ============================================================================
// Tests
// ============================================================================

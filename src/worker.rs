// ============================================================================
// Background Worker
// ============================================================================
// Thread séparé qui possède le runtime tokio et toutes les suspensions :
// - le Poller (deux tâches répétitives)
// - les votes (écriture réseau)
// - les timers de suppression des signaux fermés
// - les rafraîchissements de stats hors cycle
//
// CONCEPT : Command pattern avec channels
// - l'UI envoie des AppCommand (tokio::mpsc, non bloquant côté UI)
// - chaque commande devient une tâche indépendante (pas de file par signal)
// - chaque tâche termine par un AppResult (std::mpsc) que l'UI applique
//   entièrement avant de traiter le suivant
// - tout l'état mutable reste sur le thread UI : pas de Mutex
// ============================================================================

use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info};

use crate::api::SignalApi;
use crate::error::ApiError;
use crate::models::{Signal, StatsSummary, VoteReceipt, VoteType};
use crate::poller::{refresh_stats, PollCadence, Poller};

/// Commandes envoyées au worker
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    /// Envoyer un vote au serveur
    CastVote { signal_id: String, vote: VoteType },

    /// Signaler `RemovalDue` après `delay`
    ScheduleRemoval { signal_id: String, delay: Duration },

    /// Rafraîchissement des stats hors cycle (s'ajoute au Poller)
    RefreshStats,
}

/// Résultats renvoyés par le worker au thread UI
#[derive(Debug)]
pub enum AppResult {
    SignalsLoaded(Vec<Signal>),
    SignalsFailed(String),
    StatsLoaded(StatsSummary),
    StatsFailed(String),

    /// Réponse (ou échec) d'un vote
    VoteCompleted {
        signal_id: String,
        vote: VoteType,
        outcome: Result<VoteReceipt, ApiError>,
    },

    /// Le délai d'affichage d'un signal fermé est écoulé
    RemovalDue { signal_id: String },
}

/// Lance le worker dans un thread OS dédié
///
/// CONCEPT RUST : Thread + async runtime
/// - le runtime est construit AVANT le spawn pour propager l'erreur avec ?
/// - le thread se termine quand l'UI lâche le sender de commandes ;
///   le runtime est alors détruit et ses tâches (polling, timers) annulées
pub fn spawn_background_worker(
    api: Arc<dyn SignalApi>,
    cadence: PollCadence,
    results: Sender<AppResult>,
) -> Result<UnboundedSender<AppCommand>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .thread_name("signalboard-worker")
        .build()
        .context("Échec de la création du runtime tokio")?;

    let (command_tx, command_rx) = mpsc::unbounded_channel();

    std::thread::Builder::new()
        .name("signalboard-worker".to_string())
        .spawn(move || {
            runtime.block_on(run_worker(api, cadence, command_rx, results));
            info!("Worker thread exiting");
        })
        .context("Échec du lancement du thread worker")?;

    Ok(command_tx)
}

/// Boucle du worker : démarre le Poller puis traite les commandes
pub async fn run_worker(
    api: Arc<dyn SignalApi>,
    cadence: PollCadence,
    mut commands: UnboundedReceiver<AppCommand>,
    results: Sender<AppResult>,
) {
    let _poll_tasks = Poller::new(api.clone(), results.clone(), cadence).start();

    while let Some(command) = commands.recv().await {
        debug!(?command, "Worker received command");
        dispatch(command, api.clone(), results.clone());
    }

    info!("Command channel closed, stopping worker");
}

/// Transforme une commande en tâche indépendante
fn dispatch(command: AppCommand, api: Arc<dyn SignalApi>, results: Sender<AppResult>) {
    match command {
        AppCommand::CastVote { signal_id, vote } => {
            tokio::spawn(async move {
                let outcome = api.cast_vote(&signal_id, vote).await;
                if let Err(e) = &outcome {
                    error!(signal_id = %signal_id, vote = %vote, error = %e, "Vote failed");
                }
                let _ = results.send(AppResult::VoteCompleted {
                    signal_id,
                    vote,
                    outcome,
                });
            });
        }

        AppCommand::ScheduleRemoval { signal_id, delay } => {
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                debug!(signal_id = %signal_id, "Removal timer fired");
                let _ = results.send(AppResult::RemovalDue { signal_id });
            });
        }

        AppCommand::RefreshStats => {
            tokio::spawn(async move {
                refresh_stats(api.as_ref(), &results).await;
            });
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

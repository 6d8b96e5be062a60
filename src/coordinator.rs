// ============================================================================
// VoteCoordinator : machine à états des votes
// ============================================================================
// États d'un signal vus depuis ce client :
//
//   Unvoted ──cast──▶ VoteInFlight ──ok(open)───▶ VotedOpen
//      ▲                  │        ──ok(closed)─▶ VotedClosing ──timer──▶ Removed
//      └────── échec ─────┘
//
// Le coordinateur :
// - refuse localement un vote sur un id connu du ledger ou déjà en vol
//   (le serveur reste l'arbitre final)
// - applique la réponse : ledger, compteurs autoritaires, statut
// - garde la ligne d'un signal fermé visible jusqu'au timer de suppression,
//   même si un poll arrive entre-temps avec ou sans ce signal
//
// CONCEPT RUST : État explicite
// - VoteState::can_become() rend chaque transition vérifiable
// - les transitions illégales sont ignorées et journalisées
// ============================================================================

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::ledger::{LocalVoteLedger, VotedSet};
use crate::models::{Signal, SignalStatus, VoteReceipt, VoteType};
use crate::store::SignalSnapshotStore;

/// Délai entre la réponse "closed" et la disparition de la ligne
pub const REMOVAL_DELAY: Duration = Duration::from_secs(2);

/// État d'un signal du point de vue de ce client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteState {
    Unvoted,
    VoteInFlight(VoteType),
    VotedOpen,
    VotedClosing,
    /// Terminal : la ligne n'est plus affichée
    Removed,
}

impl VoteState {
    /// Transitions autorisées
    pub fn can_become(self, next: VoteState) -> bool {
        use VoteState::*;
        matches!(
            (self, next),
            (Unvoted, VoteInFlight(_))
                | (VoteInFlight(_), Unvoted)
                | (VoteInFlight(_), VotedOpen)
                | (VoteInFlight(_), VotedClosing)
                | (VotedClosing, Removed)
        )
    }

    pub fn has_voted(self) -> bool {
        matches!(self, VoteState::VotedOpen | VoteState::VotedClosing | VoteState::Removed)
    }
}

/// Raison d'un refus local
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastRejection {
    AlreadyVoted,
    InFlight,
    Removed,
}

impl fmt::Display for CastRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            CastRejection::AlreadyVoted => "Vous avez déjà voté pour ce signal",
            CastRejection::InFlight => "Vote déjà en cours pour ce signal",
            CastRejection::Removed => "Ce signal est fermé",
        };
        f.write_str(text)
    }
}

/// Vote autorisé, à envoyer au serveur
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteRequest {
    pub signal_id: String,
    pub vote: VoteType,
}

/// Ce que l'UI doit faire après une réponse de vote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteOutcome {
    pub accepted: bool,
    /// Message serveur (succès) ou message d'erreur
    pub message: String,
    /// Some(délai) si le signal est fermé et doit disparaître
    pub remove_after: Option<Duration>,
}

/// Coordinateur des votes de la session
#[derive(Debug, Default)]
pub struct VoteCoordinator {
    /// États suivis pendant la session ; absent = dérivé du ledger
    states: HashMap<String, VoteState>,
    /// Derniers enregistrements des signaux en VotedClosing
    pinned: HashMap<String, Signal>,
}

impl VoteCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// État courant de `signal_id`
    pub fn state<V: VotedSet + ?Sized>(&self, signal_id: &str, ledger: &V) -> VoteState {
        match self.states.get(signal_id) {
            Some(state) => *state,
            None if ledger.has(signal_id) => VoteState::VotedOpen,
            None => VoteState::Unvoted,
        }
    }

    pub fn is_removed(&self, signal_id: &str) -> bool {
        self.states.get(signal_id) == Some(&VoteState::Removed)
    }

    /// Demande un vote : Unvoted -> VoteInFlight
    ///
    /// Un id présent dans le ledger ou déjà en vol ne produit jamais de
    /// seconde requête.
    pub fn cast_vote<V: VotedSet + ?Sized>(
        &mut self,
        ledger: &V,
        signal_id: &str,
        vote: VoteType,
    ) -> Result<VoteRequest, CastRejection> {
        let rejection = match self.state(signal_id, ledger) {
            VoteState::Unvoted => None,
            VoteState::VoteInFlight(_) => Some(CastRejection::InFlight),
            VoteState::Removed => Some(CastRejection::Removed),
            VoteState::VotedOpen | VoteState::VotedClosing => Some(CastRejection::AlreadyVoted),
        };
        if let Some(rejection) = rejection {
            debug!(signal_id, vote = %vote, ?rejection, "Vote refused locally");
            return Err(rejection);
        }

        self.transition(signal_id, VoteState::VoteInFlight(vote));
        info!(signal_id, vote = %vote, "Vote dispatched");
        Ok(VoteRequest {
            signal_id: signal_id.to_string(),
            vote,
        })
    }

    /// Abandonne un vote qui n'a jamais quitté le client (worker arrêté)
    pub fn cancel_in_flight(&mut self, signal_id: &str) {
        if matches!(self.states.get(signal_id), Some(VoteState::VoteInFlight(_))) {
            self.transition(signal_id, VoteState::Unvoted);
        }
    }

    /// Applique la réponse d'un vote
    ///
    /// - échec : retour à Unvoted, rien d'autre ne bouge (réessayable)
    /// - succès : ledger + compteurs serveur + VotedOpen / VotedClosing
    pub fn on_vote_response(
        &mut self,
        ledger: &mut LocalVoteLedger,
        store: &mut SignalSnapshotStore,
        signal_id: &str,
        vote: VoteType,
        response: Result<VoteReceipt, ApiError>,
    ) -> VoteOutcome {
        let receipt = match response {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!(signal_id, vote = %vote, error = %e, "Vote rejected");
                self.cancel_in_flight(signal_id);
                return VoteOutcome {
                    accepted: false,
                    message: e.vote_failure_message(),
                    remove_after: None,
                };
            }
        };

        // Ledger d'abord : même si l'écriture disque échoue, la session
        // considère le vote comme acquis
        if let Err(e) = ledger.add(signal_id) {
            warn!(signal_id, error = %e, "Vote ledger not persisted, vote kept for this session");
        }

        let found = store.replace_signal(signal_id, |signal| {
            signal.with_tally(receipt.votes_win, receipt.votes_lose)
        });
        if !found {
            debug!(signal_id, "Voted signal no longer in snapshot");
        }

        let closing = receipt.status == SignalStatus::Closed;
        let next = if closing {
            VoteState::VotedClosing
        } else {
            VoteState::VotedOpen
        };
        self.transition(signal_id, next);

        if closing {
            if let Some(signal) = store.lookup_signal(signal_id) {
                self.pinned.insert(signal_id.to_string(), signal.clone());
            }
        }

        info!(
            signal_id,
            vote = %vote,
            votes_win = receipt.votes_win,
            votes_lose = receipt.votes_lose,
            closing,
            "Vote reconciled"
        );

        VoteOutcome {
            accepted: true,
            message: receipt.message,
            remove_after: closing.then_some(REMOVAL_DELAY),
        }
    }

    /// Réconcilie un nouveau snapshot de signaux avec l'état local
    ///
    /// - les signaux Removed restent cachés
    /// - un signal VotedClosing garde l'enregistrement épinglé : le serveur
    ///   n'envoie plus les signaux fermés, un poll qui le contient encore est
    ///   antérieur au vote et ses compteurs sont périmés
    /// - absent du snapshot, il est réinséré : sa disparition dépend du
    ///   timer, pas du poll
    pub fn reconcile_snapshot(&self, incoming: Vec<Signal>) -> Vec<Signal> {
        let mut signals: Vec<Signal> = incoming
            .into_iter()
            .filter(|signal| !self.is_removed(&signal.id))
            .map(|signal| match self.pinned.get(&signal.id) {
                Some(pinned) => {
                    debug!(signal_id = %signal.id, "Stale closing signal in poll, keeping pinned record");
                    pinned.clone()
                }
                None => signal,
            })
            .collect();

        let mut pinned: Vec<&Signal> = self
            .pinned
            .values()
            .filter(|pinned| !signals.iter().any(|s| s.id == pinned.id))
            .collect();
        // HashMap sans ordre : tri par id pour un rendu déterministe
        pinned.sort_by(|a, b| a.id.cmp(&b.id));
        signals.extend(pinned.into_iter().cloned());

        signals
    }

    /// Le timer de suppression a expiré : VotedClosing -> Removed
    ///
    /// Retourne true si la ligne a été retirée ; l'appelant déclenche
    /// alors un rafraîchissement des statistiques.
    pub fn complete_removal(&mut self, store: &mut SignalSnapshotStore, signal_id: &str) -> bool {
        if self.states.get(signal_id) != Some(&VoteState::VotedClosing) {
            warn!(signal_id, "Removal timer fired for a signal that is not closing");
            return false;
        }

        self.transition(signal_id, VoteState::Removed);
        self.pinned.remove(signal_id);
        store.remove_signal(signal_id);
        info!(signal_id, "Closed signal removed from view");
        true
    }

    fn transition(&mut self, signal_id: &str, next: VoteState) {
        let current = self
            .states
            .get(signal_id)
            .copied()
            .unwrap_or(VoteState::Unvoted);

        if !current.can_become(next) {
            warn!(signal_id, ?current, ?next, "Illegal vote state transition ignored");
            return;
        }

        debug!(signal_id, ?current, ?next, "Vote state transition");
        if next == VoteState::Unvoted {
            self.states.remove(signal_id);
        } else {
            self.states.insert(signal_id.to_string(), next);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

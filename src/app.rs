// ============================================================================
// Structure : App
// ============================================================================
// État global du client, possédé par le thread UI
//
// CONCEPTS RUST :
// 1. Ownership : App possède le store, le ledger et le coordinateur
//    (pas d'Arc<Mutex<>>, un seul thread les modifie)
// 2. Mutabilité contrôlée : &mut self pour modifier l'état
// 3. Emprunts disjoints : les champs sont publics pour que le contrôleur
//    puisse emprunter store et ledger en même temps
// ============================================================================

use std::time::{Duration, Instant};

use chrono::FixedOffset;

use crate::coordinator::{VoteCoordinator, VoteState};
use crate::ledger::LocalVoteLedger;
use crate::models::Signal;
use crate::store::{FetchStatus, SignalSnapshotStore};

/// Durée d'affichage d'un message dans le footer
pub const NOTICE_TTL: Duration = Duration::from_secs(4);

// ============================================================================
// Enum : Screen
// ============================================================================

/// Écrans de l'application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// Vue principale : stats + table des signaux
    Dashboard,

    /// Overlay des détails du combo d'un signal
    /// CONCEPT : l'overlay référence un id, pas un index, pour survivre
    /// aux remplacements de snapshot
    ComboDetails { signal_id: String },
}

/// Gravité d'un message utilisateur
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// Message temporaire affiché dans le footer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
    pub shown_at: Instant,
}

/// État principal de l'application
pub struct App {
    /// Indique si l'application doit continuer à tourner
    pub running: bool,

    /// Derniers snapshots serveur (signaux + stats)
    pub store: SignalSnapshotStore,

    /// Ids déjà votés, persistés
    pub ledger: LocalVoteLedger,

    /// Machine à états des votes
    pub votes: VoteCoordinator,

    /// Index de la ligne sélectionnée dans la table
    pub selected_index: usize,

    /// Écran actuellement affiché
    pub current_screen: Screen,

    /// Two-step quit : première pression de 'q' = confirmation demandée
    pub confirm_quit: bool,

    pub notice: Option<Notice>,

    /// Fuseau d'affichage des horodatages
    pub utc_offset: FixedOffset,
}

impl App {
    pub fn new(ledger: LocalVoteLedger, utc_offset: FixedOffset) -> Self {
        Self {
            running: true,
            store: SignalSnapshotStore::new(),
            ledger,
            votes: VoteCoordinator::new(),
            selected_index: 0,
            current_screen: Screen::Dashboard,
            confirm_quit: false,
            notice: None,
            utc_offset,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    // ========================================================================
    // Quit two-step
    // ========================================================================

    pub fn request_quit(&mut self) {
        self.confirm_quit = true;
    }

    pub fn cancel_quit(&mut self) {
        self.confirm_quit = false;
    }

    pub fn is_awaiting_quit_confirmation(&self) -> bool {
        self.confirm_quit
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    pub fn navigate_up(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
        }
    }

    pub fn navigate_down(&mut self) {
        let len = self.visible_signals().len();
        if len > 0 && self.selected_index < len - 1 {
            self.selected_index += 1;
        }
    }

    /// Signaux effectivement affichés : aucun quand la table est remplacée
    /// par un état de chargement ou d'erreur
    pub fn visible_signals(&self) -> &[Signal] {
        match self.store.signals_status() {
            FetchStatus::Ready => self.store.signals(),
            FetchStatus::Loading | FetchStatus::Failed(_) => &[],
        }
    }

    /// Signal de la ligne sélectionnée, s'il est affiché
    pub fn selected_signal(&self) -> Option<&Signal> {
        self.visible_signals().get(self.selected_index)
    }

    pub fn selected_signal_id(&self) -> Option<String> {
        self.selected_signal().map(|s| s.id.clone())
    }

    /// Id sous la sélection, même si la table est masquée ; sert à garder
    /// la sélection à travers un remplacement de snapshot
    pub fn selection_anchor(&self) -> Option<String> {
        self.store.signals().get(self.selected_index).map(|s| s.id.clone())
    }

    /// Replace la sélection sur `previous_id` après un changement de liste,
    /// sinon borne l'index à la nouvelle longueur
    pub fn follow_selection(&mut self, previous_id: Option<&str>) {
        if let Some(position) = previous_id.and_then(|id| self.store.position(id)) {
            self.selected_index = position;
            return;
        }
        let len = self.store.signals().len();
        self.selected_index = self.selected_index.min(len.saturating_sub(1));
    }

    /// État de vote d'un signal, vu par le coordinateur et le ledger
    pub fn vote_state(&self, signal_id: &str) -> VoteState {
        self.votes.state(signal_id, &self.ledger)
    }

    // ========================================================================
    // Écrans
    // ========================================================================

    pub fn is_on_dashboard(&self) -> bool {
        self.current_screen == Screen::Dashboard
    }

    pub fn is_showing_details(&self) -> bool {
        matches!(self.current_screen, Screen::ComboDetails { .. })
    }

    pub fn show_details(&mut self, signal_id: String) {
        self.current_screen = Screen::ComboDetails { signal_id };
    }

    pub fn show_dashboard(&mut self) {
        self.current_screen = Screen::Dashboard;
    }

    // ========================================================================
    // Messages
    // ========================================================================

    pub fn notify(&mut self, kind: NoticeKind, text: impl Into<String>, now: Instant) {
        self.notice = Some(Notice {
            kind,
            text: text.into(),
            shown_at: now,
        });
    }

    /// Mise à jour périodique : expire le message courant
    pub fn tick(&mut self, now: Instant) {
        let expired = self
            .notice
            .as_ref()
            .is_some_and(|notice| now.duration_since(notice.shown_at) >= NOTICE_TTL);
        if expired {
            self.notice = None;
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

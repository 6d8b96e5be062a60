// ============================================================================
// ViewController
// ============================================================================
// Point d'entrée unique des actions utilisateur et des résultats du worker :
// - handle_event : un seul dispatcher clavier, la cible est toujours
//   résolue depuis l'id du signal sélectionné (jamais un index mémorisé)
// - apply_result : applique un AppResult jusqu'au bout avant le suivant
//
// Le contrôleur ne garde aucun état : il ne possède que l'émetteur de
// commandes vers le worker. Tout l'état vit dans App.
// ============================================================================

use std::time::Instant;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info};

use crate::app::{App, NoticeKind, Screen};
use crate::models::VoteType;
use crate::ui::events::{
    is_details_event, is_down_event, is_escape_event, is_quit_event, is_space_event, is_up_event,
    is_vote_lose_event, is_vote_win_event, Event,
};
use crate::worker::{AppCommand, AppResult};

const WORKER_GONE_MESSAGE: &str = "Service d'arrière-plan arrêté";
const VOTE_RECORDED_MESSAGE: &str = "Vote enregistré";

pub struct ViewController {
    commands: UnboundedSender<AppCommand>,
}

impl ViewController {
    pub fn new(commands: UnboundedSender<AppCommand>) -> Self {
        Self { commands }
    }

    // ========================================================================
    // Clavier
    // ========================================================================

    /// Traite un événement et met à jour l'état de l'application
    ///
    /// CONCEPT RUST : match avec guards
    /// - l'ordre des bras compte : le premier qui matche gagne
    /// - toute autre touche annule la confirmation de quit
    pub fn handle_event(&self, app: &mut App, event: &Event, now: Instant) {
        match event {
            Event::Tick => {}

            Event::Key(_) if is_quit_event(event) => {
                if app.is_awaiting_quit_confirmation() {
                    info!("User confirmed quit");
                    app.quit();
                } else {
                    info!("User requested quit (awaiting confirmation)");
                    app.request_quit();
                }
            }

            Event::Key(_) if app.is_showing_details() => {
                app.cancel_quit();
                if is_escape_event(event) || is_space_event(event) || is_details_event(event) {
                    self.close_overlay(app);
                }
            }

            Event::Key(_) if is_up_event(event) => {
                app.cancel_quit();
                app.navigate_up();
            }
            Event::Key(_) if is_down_event(event) => {
                app.cancel_quit();
                app.navigate_down();
            }
            Event::Key(_) if is_vote_win_event(event) => {
                app.cancel_quit();
                self.vote_selected(app, VoteType::Win, now);
            }
            Event::Key(_) if is_vote_lose_event(event) => {
                app.cancel_quit();
                self.vote_selected(app, VoteType::Lose, now);
            }
            Event::Key(_) if is_details_event(event) => {
                app.cancel_quit();
                self.open_details(app);
            }

            Event::Key(_) => app.cancel_quit(),
        }
    }

    /// Vote pour la ligne sélectionnée
    pub fn vote_selected(&self, app: &mut App, vote: VoteType, now: Instant) {
        let Some(signal_id) = app.selected_signal_id() else {
            debug!("Vote key pressed with no signal selected");
            return;
        };

        let request = match app.votes.cast_vote(&app.ledger, &signal_id, vote) {
            Ok(request) => request,
            Err(rejection) => {
                app.notify(NoticeKind::Info, rejection.to_string(), now);
                return;
            }
        };

        let command = AppCommand::CastVote {
            signal_id: request.signal_id,
            vote: request.vote,
        };
        if self.commands.send(command).is_err() {
            error!(signal_id = %signal_id, "Worker unavailable, vote not sent");
            app.votes.cancel_in_flight(&signal_id);
            app.notify(NoticeKind::Error, WORKER_GONE_MESSAGE, now);
        }
    }

    /// Ouvre l'overlay des détails du combo pour la ligne sélectionnée
    pub fn open_details(&self, app: &mut App) {
        let Some(signal) = app.selected_signal() else {
            return;
        };
        let signal_id = signal.id.clone();
        if app.store.lookup_signal(&signal_id).is_some() {
            debug!(signal_id = %signal_id, "Opening combo details");
            app.show_details(signal_id);
        }
    }

    pub fn close_overlay(&self, app: &mut App) {
        app.show_dashboard();
    }

    // ========================================================================
    // Résultats du worker
    // ========================================================================

    /// Applique un résultat du worker à l'état
    pub fn apply_result(&self, app: &mut App, result: AppResult, now: Instant) {
        match result {
            AppResult::SignalsLoaded(signals) => {
                let previous = app.selection_anchor();
                let signals = app.votes.reconcile_snapshot(signals);
                app.store.replace_signals(signals);
                app.follow_selection(previous.as_deref());
                self.close_overlay_if_gone(app);
            }

            AppResult::SignalsFailed(message) => {
                app.store.mark_signals_failed(message);
                // La table est masquée : plus de cible pour l'overlay
                self.close_overlay(app);
            }

            AppResult::StatsLoaded(stats) => {
                debug!("Stats snapshot applied");
                app.store.replace_stats(stats);
            }

            AppResult::StatsFailed(message) => app.store.mark_stats_failed(message),

            AppResult::VoteCompleted {
                signal_id,
                vote,
                outcome,
            } => {
                let outcome =
                    app.votes
                        .on_vote_response(&mut app.ledger, &mut app.store, &signal_id, vote, outcome);

                if outcome.accepted {
                    let text = if outcome.message.is_empty() {
                        VOTE_RECORDED_MESSAGE.to_string()
                    } else {
                        outcome.message
                    };
                    app.notify(NoticeKind::Info, text, now);
                } else {
                    app.notify(NoticeKind::Error, outcome.message, now);
                }

                if let Some(delay) = outcome.remove_after {
                    let command = AppCommand::ScheduleRemoval {
                        signal_id: signal_id.clone(),
                        delay,
                    };
                    if self.commands.send(command).is_err() {
                        error!(signal_id = %signal_id, "Worker unavailable, removal not scheduled");
                    }
                }
            }

            AppResult::RemovalDue { signal_id } => {
                let previous = app.selection_anchor();
                if !app.votes.complete_removal(&mut app.store, &signal_id) {
                    return;
                }
                app.follow_selection(previous.as_deref());
                self.close_overlay_if_gone(app);

                if self.commands.send(AppCommand::RefreshStats).is_err() {
                    error!("Worker unavailable, stats refresh not requested");
                }
            }
        }
    }

    fn close_overlay_if_gone(&self, app: &mut App) {
        if let Screen::ComboDetails { signal_id } = &app.current_screen {
            if app.store.lookup_signal(signal_id).is_none() {
                debug!(signal_id = %signal_id, "Signal left the snapshot, closing details");
                self.close_overlay(app);
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::VoteState;
    use crate::ledger::LocalVoteLedger;
    use crate::models::SignalStatus;
    use crate::test_helpers::{receipt, signal};
    use chrono::FixedOffset;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn key(c: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::empty()))
    }

    fn setup(name: &str, ids: &[&str]) -> (ViewController, UnboundedReceiver<AppCommand>, App) {
        let dir = std::env::temp_dir().join(format!("signalboard_ctrl_{}_{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let ledger = LocalVoteLedger::open(dir.join("votes.json"));
        let mut app = App::new(ledger, FixedOffset::east_opt(0).unwrap());
        app.store.replace_signals(ids.iter().map(|id| signal(id)).collect());

        let (tx, rx) = mpsc::unbounded_channel();
        (ViewController::new(tx), rx, app)
    }

    #[test]
    fn test_vote_key_dispatches_once() {
        let (controller, mut commands, mut app) = setup("dispatch", &["s1"]);
        let now = Instant::now();

        controller.handle_event(&mut app, &key('w'), now);
        controller.handle_event(&mut app, &key('w'), now);

        assert_eq!(
            commands.try_recv().unwrap(),
            AppCommand::CastVote {
                signal_id: "s1".into(),
                vote: VoteType::Win
            }
        );
        assert!(commands.try_recv().is_err());
        assert!(app.notice.is_some());
    }

    #[test]
    fn test_closed_vote_schedules_removal_then_refreshes_stats() {
        let (controller, mut commands, mut app) = setup("closing", &["s1", "s2"]);
        let now = Instant::now();
        app.selected_index = 1;

        controller.handle_event(&mut app, &key('x'), now);
        let _cast = commands.try_recv().unwrap();

        controller.apply_result(
            &mut app,
            AppResult::VoteCompleted {
                signal_id: "s2".into(),
                vote: VoteType::Lose,
                outcome: Ok(receipt(1, 4, SignalStatus::Closed)),
            },
            now,
        );
        assert!(matches!(
            commands.try_recv().unwrap(),
            AppCommand::ScheduleRemoval { ref signal_id, .. } if signal_id == "s2"
        ));
        assert!(app.store.lookup_signal("s2").is_some());

        controller.apply_result(&mut app, AppResult::RemovalDue { signal_id: "s2".into() }, now);
        assert!(app.store.lookup_signal("s2").is_none());
        assert_eq!(commands.try_recv().unwrap(), AppCommand::RefreshStats);
        assert_eq!(app.selected_index, 0);
    }

    #[test]
    fn test_failed_vote_shows_error_and_stays_unvoted() {
        let (controller, _commands, mut app) = setup("failure", &["s1"]);
        let now = Instant::now();
        controller.vote_selected(&mut app, VoteType::Win, now);

        controller.apply_result(
            &mut app,
            AppResult::VoteCompleted {
                signal_id: "s1".into(),
                vote: VoteType::Win,
                outcome: Err(crate::error::ApiError::Rejected {
                    status: 404,
                    message: None,
                }),
            },
            now,
        );

        let notice = app.notice.clone().unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(notice.text, crate::error::VOTE_FALLBACK_MESSAGE);
        assert_eq!(app.vote_state("s1"), VoteState::Unvoted);
    }

    #[test]
    fn test_details_overlay_opens_and_closes() {
        let (controller, _commands, mut app) = setup("details", &["s1"]);
        let now = Instant::now();

        controller.handle_event(&mut app, &key('i'), now);
        assert_eq!(app.current_screen, Screen::ComboDetails { signal_id: "s1".into() });

        controller.handle_event(&mut app, &key(' '), now);
        assert!(app.is_on_dashboard());
    }

    #[test]
    fn test_overlay_closes_when_signal_leaves_snapshot() {
        let (controller, _commands, mut app) = setup("overlay_gone", &["s1"]);
        let now = Instant::now();
        controller.open_details(&mut app);

        controller.apply_result(&mut app, AppResult::SignalsLoaded(vec![signal("s2")]), now);
        assert!(app.is_on_dashboard());
    }

    #[test]
    fn test_failed_refresh_keeps_previous_signals() {
        let (controller, _commands, mut app) = setup("refresh_failed", &["s1"]);
        controller.apply_result(&mut app, AppResult::SignalsFailed("timeout".into()), Instant::now());
        assert_eq!(app.store.signals().len(), 1);
    }

    #[test]
    fn test_keys_ignore_rows_hidden_by_failed_refresh() {
        let (controller, mut commands, mut app) = setup("hidden_rows", &["s1", "s2"]);
        let now = Instant::now();
        controller.apply_result(&mut app, AppResult::SignalsFailed("timeout".into()), now);

        controller.handle_event(&mut app, &key('w'), now);
        controller.handle_event(&mut app, &key('x'), now);
        controller.handle_event(&mut app, &key('j'), now);
        controller.handle_event(&mut app, &key('i'), now);

        assert!(commands.try_recv().is_err());
        assert_eq!(app.vote_state("s1"), VoteState::Unvoted);
        assert_eq!(app.selected_index, 0);
        assert!(app.is_on_dashboard());

        // Le rafraîchissement suivant rend la table et la sélection
        controller.apply_result(&mut app, AppResult::SignalsLoaded(vec![signal("s1"), signal("s2")]), now);
        controller.handle_event(&mut app, &key('w'), now);
        assert_eq!(
            commands.try_recv().unwrap(),
            AppCommand::CastVote {
                signal_id: "s1".into(),
                vote: VoteType::Win
            }
        );
    }

    #[test]
    fn test_closed_vote_for_vanished_signal_still_refreshes_stats() {
        let (controller, mut commands, mut app) = setup("vanished_closed", &["s1"]);
        let now = Instant::now();
        app.votes.cast_vote(&app.ledger, "s9", VoteType::Lose).unwrap();

        controller.apply_result(
            &mut app,
            AppResult::VoteCompleted {
                signal_id: "s9".into(),
                vote: VoteType::Lose,
                outcome: Ok(receipt(0, 5, SignalStatus::Closed)),
            },
            now,
        );
        assert!(matches!(
            commands.try_recv().unwrap(),
            AppCommand::ScheduleRemoval { ref signal_id, .. } if signal_id == "s9"
        ));

        controller.apply_result(&mut app, AppResult::RemovalDue { signal_id: "s9".into() }, now);
        assert_eq!(commands.try_recv().unwrap(), AppCommand::RefreshStats);
        assert_eq!(app.vote_state("s9"), VoteState::Removed);
        assert_eq!(app.store.signals().len(), 1);
    }

    #[test]
    fn test_worker_gone_reverts_vote() {
        let (controller, commands, mut app) = setup("worker_gone", &["s1"]);
        drop(commands);
        controller.vote_selected(&mut app, VoteType::Win, Instant::now());

        assert_eq!(app.vote_state("s1"), VoteState::Unvoted);
        assert_eq!(app.notice.as_ref().unwrap().kind, NoticeKind::Error);
    }

    #[test]
    fn test_two_step_quit() {
        let (controller, _commands, mut app) = setup("quit", &[]);
        let now = Instant::now();

        controller.handle_event(&mut app, &key('q'), now);
        assert!(app.is_running());
        controller.handle_event(&mut app, &key('z'), now);
        controller.handle_event(&mut app, &key('q'), now);
        assert!(app.is_running());
        controller.handle_event(&mut app, &key('q'), now);
        assert!(!app.is_running());
    }
}

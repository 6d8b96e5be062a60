// ============================================================================
// Scénarios de bout en bout
// ============================================================================
// Worker réel (Poller + commandes) sur le runtime de test, horloge en pause,
// API scriptée, contrôleur et App pilotés comme par la boucle principale.
// ============================================================================

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self as std_mpsc, Receiver};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::FixedOffset;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;

use signalboard::api::SignalApi;
use signalboard::app::{App, NoticeKind};
use signalboard::controller::ViewController;
use signalboard::coordinator::VoteState;
use signalboard::error::ApiError;
use signalboard::ledger::LocalVoteLedger;
use signalboard::models::{Signal, SignalStatus, StatsSummary, VoteReceipt, VoteType};
use signalboard::poller::PollCadence;
use signalboard::render::{render_signals_panel, SignalRow, SignalsView};
use signalboard::ui::Event;
use signalboard::worker::{run_worker, AppResult};

const SCENARIO_SIGNAL: &str = r#"{
    "id": "s1", "direction": "LONG", "entry": 100, "tp": 110, "sl": 95, "rr": 2.0,
    "votes_win": 3, "votes_lose": 1, "combo_name": "A", "combo_details": "...",
    "coin": "BTCUSDT", "timestamp": "2024-01-01T00:00:00Z"
}"#;

fn scenario_signal(id: &str) -> Signal {
    let mut signal: Signal = serde_json::from_str(SCENARIO_SIGNAL).unwrap();
    signal.id = id.to_string();
    signal
}

// ============================================================================
// API scriptée
// ============================================================================

#[derive(Default)]
struct ScriptedApi {
    signals: Mutex<Vec<Signal>>,
    vote_receipt: Mutex<Option<VoteReceipt>>,
    stats_calls: AtomicUsize,
    votes: Mutex<Vec<(String, VoteType)>>,
}

impl ScriptedApi {
    fn with_signals(ids: &[&str]) -> Arc<Self> {
        let api = Self::default();
        *api.signals.lock().unwrap() = ids.iter().map(|id| scenario_signal(id)).collect();
        Arc::new(api)
    }

    fn answer_votes_with(&self, votes_win: u32, votes_lose: u32, status: SignalStatus) {
        *self.vote_receipt.lock().unwrap() = Some(VoteReceipt {
            message: "ok".to_string(),
            votes_win,
            votes_lose,
            status,
        });
    }

    fn stats_calls(&self) -> usize {
        self.stats_calls.load(Ordering::SeqCst)
    }

    fn vote_count(&self) -> usize {
        self.votes.lock().unwrap().len()
    }
}

#[async_trait]
impl SignalApi for ScriptedApi {
    async fn fetch_signals(&self) -> Result<Vec<Signal>, ApiError> {
        Ok(self.signals.lock().unwrap().clone())
    }

    async fn fetch_stats(&self) -> Result<StatsSummary, ApiError> {
        self.stats_calls.fetch_add(1, Ordering::SeqCst);
        Ok(StatsSummary::default())
    }

    async fn cast_vote(&self, signal_id: &str, vote: VoteType) -> Result<VoteReceipt, ApiError> {
        self.votes.lock().unwrap().push((signal_id.to_string(), vote));
        match self.vote_receipt.lock().unwrap().clone() {
            Some(receipt) => Ok(receipt),
            None => Err(ApiError::Rejected {
                status: 403,
                message: Some("Vous avez déjà voté pour ce signal".to_string()),
            }),
        }
    }
}

// ============================================================================
// Harnais
// ============================================================================

struct Harness {
    api: Arc<ScriptedApi>,
    controller: ViewController,
    results: Receiver<AppResult>,
    app: App,
    ledger_dir: PathBuf,
}

impl Harness {
    /// Démarre le worker ; les cadences sont très longues pour que seul le
    /// chargement initial vienne du Poller
    async fn start(name: &str, api: Arc<ScriptedApi>) -> Self {
        let ledger_dir = std::env::temp_dir().join(format!("signalboard_it_{}_{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&ledger_dir);
        Self::start_with_ledger(api, ledger_dir).await
    }

    async fn start_with_ledger(api: Arc<ScriptedApi>, ledger_dir: PathBuf) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (result_tx, results) = std_mpsc::channel();
        let cadence = PollCadence {
            signals: Duration::from_secs(3600),
            stats: Duration::from_secs(3600),
        };
        tokio::spawn(run_worker(api.clone(), cadence, command_rx, result_tx));

        let ledger = LocalVoteLedger::open(ledger_dir.join("voted_signals.json"));
        let mut harness = Self {
            api,
            controller: ViewController::new(command_tx),
            results,
            app: App::new(ledger, FixedOffset::east_opt(0).unwrap()),
            ledger_dir,
        };
        harness.pump().await;
        harness
    }

    /// Laisse le worker avancer puis applique tous ses résultats
    ///
    /// Plusieurs tours : un résultat appliqué peut produire une commande
    /// (ScheduleRemoval, RefreshStats) dont le résultat arrive au tour suivant.
    async fn pump(&mut self) {
        for _ in 0..3 {
            for _ in 0..20 {
                tokio::task::yield_now().await;
            }
            while let Ok(result) = self.results.try_recv() {
                self.controller.apply_result(&mut self.app, result, Instant::now());
            }
        }
    }

    async fn advance(&mut self, duration: Duration) {
        tokio::time::sleep(duration).await;
        self.pump().await;
    }

    async fn press(&mut self, c: char) {
        let event = Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::empty()));
        self.controller.handle_event(&mut self.app, &event, Instant::now());
        self.pump().await;
    }

    fn select(&mut self, id: &str) {
        self.app.selected_index = self.app.store.position(id).unwrap();
    }

    fn row(&self, id: &str) -> Option<SignalRow> {
        match render_signals_panel(&self.app.store, &self.app.ledger, &self.app.utc_offset) {
            SignalsView::Table(rows) => rows.into_iter().find(|row| row.signal_id == id),
            _ => None,
        }
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.ledger_dir);
    }
}

// ============================================================================
// Scénarios
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_initial_row_with_empty_ledger() {
    let h = Harness::start("initial", ScriptedApi::with_signals(&["s1"])).await;

    let row = h.row("s1").expect("row for s1");
    assert_eq!(row.coin, "BTC");
    assert_eq!(row.win_button.label, "Win (3)");
    assert_eq!(row.lose_button.label, "Lose (1)");
    assert!(row.win_button.enabled && row.lose_button.enabled);
    assert!(!row.already_voted);
}

#[tokio::test(start_paused = true)]
async fn test_open_vote_updates_tally_and_disables_buttons() {
    let api = ScriptedApi::with_signals(&["s1"]);
    api.answer_votes_with(4, 1, SignalStatus::Open);
    let mut h = Harness::start("open_vote", api).await;

    h.press('w').await;

    assert!(h.app.ledger.has("s1"));
    let row = h.row("s1").expect("row still present");
    assert_eq!(row.win_button.label, "Win (4)");
    assert_eq!(row.lose_button.label, "Lose (1)");
    assert!(!row.win_button.enabled && !row.lose_button.enabled);
    assert!(row.already_voted);
    assert_eq!(h.app.notice.as_ref().unwrap().text, "ok");

    // Persisté : un nouveau ledger sur le même fichier le retrouve
    let reopened = LocalVoteLedger::open(h.ledger_dir.join("voted_signals.json"));
    assert!(reopened.has("s1"));
}

#[tokio::test(start_paused = true)]
async fn test_closed_vote_removes_row_after_delay_and_refreshes_stats() {
    let api = ScriptedApi::with_signals(&["s1", "s2"]);
    api.answer_votes_with(1, 4, SignalStatus::Closed);
    let mut h = Harness::start("closed_vote", api.clone()).await;
    assert_eq!(api.stats_calls(), 1);

    h.select("s2");
    h.press('x').await;
    assert_eq!(h.app.vote_state("s2"), VoteState::VotedClosing);

    h.advance(Duration::from_millis(1900)).await;
    assert!(h.row("s2").is_some(), "row must stay visible during the delay");
    assert_eq!(api.stats_calls(), 1);

    h.advance(Duration::from_millis(200)).await;
    assert!(h.row("s2").is_none());
    assert!(h.row("s1").is_some());
    assert_eq!(api.stats_calls(), 2, "one out-of-cycle stats refresh");
    assert_eq!(h.app.vote_state("s2"), VoteState::Removed);
}

#[tokio::test(start_paused = true)]
async fn test_poll_during_removal_window_does_not_change_timing() {
    let api = ScriptedApi::with_signals(&["s1", "s2"]);
    api.answer_votes_with(1, 4, SignalStatus::Closed);
    let mut h = Harness::start("poll_window", api.clone()).await;

    h.select("s2");
    h.press('x').await;

    // Poll émis avant le vote : s2 encore présent avec les anciens compteurs
    h.controller.apply_result(
        &mut h.app,
        AppResult::SignalsLoaded(vec![scenario_signal("s1"), scenario_signal("s2")]),
        Instant::now(),
    );
    let row = h.row("s2").expect("closing row kept");
    assert_eq!(row.win_button.label, "Win (1)");
    assert_eq!(row.lose_button.label, "Lose (4)");
    assert!(row.already_voted);

    // Le serveur n'envoie plus s2
    h.controller
        .apply_result(&mut h.app, AppResult::SignalsLoaded(vec![scenario_signal("s1")]), Instant::now());
    assert_eq!(h.row("s2").expect("closing row re-appended").lose_button.label, "Lose (4)");

    h.advance(Duration::from_millis(2100)).await;
    assert!(h.row("s2").is_none());

    // Poll périmé qui contient encore s2
    h.controller.apply_result(
        &mut h.app,
        AppResult::SignalsLoaded(vec![scenario_signal("s1"), scenario_signal("s2")]),
        Instant::now(),
    );
    assert!(h.row("s2").is_none());
}

#[tokio::test(start_paused = true)]
async fn test_ledger_known_id_never_reaches_server() {
    let ledger_dir = std::env::temp_dir().join(format!("signalboard_it_known_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&ledger_dir);
    LocalVoteLedger::open(ledger_dir.join("voted_signals.json"))
        .add("s1")
        .unwrap();

    let api = ScriptedApi::with_signals(&["s1"]);
    api.answer_votes_with(4, 1, SignalStatus::Open);
    let mut h = Harness::start_with_ledger(api.clone(), ledger_dir).await;

    h.press('w').await;
    h.press('x').await;

    assert_eq!(api.vote_count(), 0);
    let row = h.row("s1").unwrap();
    assert!(!row.win_button.enabled);
}

#[tokio::test(start_paused = true)]
async fn test_failed_vote_leaves_ledger_and_buttons_untouched() {
    let api = ScriptedApi::with_signals(&["s1"]);
    let mut h = Harness::start("failed_vote", api.clone()).await;

    h.press('w').await;

    assert_eq!(api.vote_count(), 1);
    assert!(!h.app.ledger.has("s1"));
    let notice = h.app.notice.clone().unwrap();
    assert_eq!(notice.kind, NoticeKind::Error);
    assert_eq!(notice.text, "Vous avez déjà voté pour ce signal");

    let row = h.row("s1").unwrap();
    assert!(row.win_button.enabled && row.lose_button.enabled);
    assert!(!row.already_voted);

    // Réessayable
    api.answer_votes_with(4, 1, SignalStatus::Open);
    h.press('w').await;
    assert_eq!(api.vote_count(), 2);
    assert!(h.app.ledger.has("s1"));
}

// ============================================================================
// SignalBoard - client terminal de vote sur signaux de trading
// ============================================================================
// Affiche les signaux ouverts et les statistiques du serveur, permet de
// voter win / lose une fois par signal.
//
// CONCEPTS RUST CLÉS :
// 1. Terminal raw mode : contrôle total du terminal
// 2. Event loop : résultats -> rendu -> clavier -> tick
// 3. Async à côté du sync : le runtime tokio vit dans le thread worker,
//    le thread UI reste synchrone et possède tout l'état
// ============================================================================

use std::io;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{Local, Offset};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, error, info, warn};

use signalboard::api::HttpSignalApi;
use signalboard::app::App;
use signalboard::config::Config;
use signalboard::controller::ViewController;
use signalboard::ledger::LocalVoteLedger;
use signalboard::ui::{render, EventHandler};
use signalboard::worker::{spawn_background_worker, AppResult};

// ============================================================================
// Initialisation du logging
// ============================================================================
// Les println! ne fonctionnent pas une fois le TUI lancé : tout part dans
// ./logs/signalboard.log, avec rotation quotidienne.
//
// RUST_LOG=signalboard=trace cargo run
// ============================================================================

fn init_logging() -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = std::path::PathBuf::from("./logs");
    std::fs::create_dir_all(&log_dir).context("Échec de la création du répertoire de logs")?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir.clone(), "signalboard.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "signalboard=debug,info".into()),
        )
        .init();

    info!(?log_dir, "Logging initialisé");
    Ok(())
}

// ============================================================================
// Point d'entrée
// ============================================================================

fn main() -> Result<()> {
    init_logging().unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {}", e);
        eprintln!("   Continuing without logging...");
    });

    info!(version = env!("CARGO_PKG_VERSION"), "SignalBoard starting up");

    let config = Config::from_env().context("Configuration invalide")?;
    info!(api_url = %config.api_url, ledger = ?config.ledger_path, "Configuration loaded");

    let ledger = LocalVoteLedger::open(config.ledger_path.clone());

    let api = HttpSignalApi::new(&config.api_url, config.http_timeout)
        .context("Échec de la création du client HTTP")?;

    // Worker : Poller + votes + timers. Le premier tick du Poller fait le
    // chargement initial.
    let (result_tx, result_rx) = mpsc::channel::<AppResult>();
    let command_tx = spawn_background_worker(Arc::new(api), config.cadence, result_tx)?;
    let controller = ViewController::new(command_tx);

    let mut app = App::new(ledger, Local::now().offset().fix());

    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;
    let events = EventHandler::new();

    info!("Starting event loop");
    let result = run(&mut terminal, &mut app, &controller, &events, result_rx);

    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    match &result {
        Ok(_) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }

    // Le controller (et donc l'émetteur de commandes) est détruit en fin de
    // main : le worker s'arrête avec lui
    result
}

// ============================================================================
// Event Loop Principal
// ============================================================================
// À chaque itération :
//   0. appliquer TOUS les résultats du worker, un par un, jusqu'au bout
//   1. dessiner
//   2. lire le clavier (≤ 250 ms)
//   3. tick (expiration des messages)
// ============================================================================

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    controller: &ViewController,
    events: &EventHandler,
    results: Receiver<AppResult>,
) -> Result<()> {
    let mut worker_alive = true;

    while app.is_running() {
        // 0. RÉSULTATS
        loop {
            match results.try_recv() {
                Ok(result) => controller.apply_result(app, result, Instant::now()),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if worker_alive {
                        error!("Worker thread disconnected!");
                        worker_alive = false;
                    }
                    break;
                }
            }
        }

        // 1. RENDER
        terminal.draw(|frame| render(frame, app))?;

        // 2. INPUT
        match events.next() {
            Ok(event) => controller.handle_event(app, &event, Instant::now()),
            Err(e) => warn!(error = %e, "Failed to read terminal event"),
        }

        // 3. UPDATE
        app.tick(Instant::now());
    }

    Ok(())
}

// ============================================================================
// Setup et restauration du terminal
// ============================================================================

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode().context("Échec de l'activation du raw mode")?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("Échec de l'initialisation du terminal")
}

/// Appelé dans main() même en cas d'erreur, pour ne pas laisser le
/// terminal cassé
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

//! Flashdeck - a terminal flashcard viewer that keeps working offline.
//!
//! Cards are loaded from `cards.json` on a configured origin. The first run
//! installs an offline cache of the deployment's assets; later runs are
//! served from it, even without a network connection.

mod app;
mod cli;
mod ui;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use flashdeck_core::config::parse_origin;
use flashdeck_core::worker::{
    CacheStorage, CacheWorker, HttpNetwork, Registration, RegistrationOutcome, CACHE_VERSION,
};
use flashdeck_core::{Config, Url};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::{App, AppState, WORKER_SCRIPT};
use cli::{CliArgs, Command, USAGE};
use ui::input::{handle_key, handle_mouse};
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds).
/// Short enough to keep the slide animation smooth.
const EVENT_POLL_TIMEOUT_MS: u64 = 50;

fn env_filter() -> EnvFilter {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Logging for one-shot commands
fn init_stderr_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter())
        .init();
}

/// Logging for the viewer goes to a daily log file so it cannot corrupt
/// the screen. The guard must live until exit to flush.
fn init_file_tracing(config: &Config) -> Option<WorkerGuard> {
    let dir = config.log_dir().ok()?;
    std::fs::create_dir_all(&dir).ok()?;

    let appender = tracing_appender::rolling::daily(dir, "flashdeck.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(env_filter())
        .init();
    Some(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = match CliArgs::parse(&args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("Error: {}\n\n{}", e, USAGE);
            std::process::exit(2);
        }
    };

    let mut config = Config::load().unwrap_or_else(|e| {
        eprintln!("Warning: ignoring unreadable config: {}", e);
        Config::default()
    });

    // An explicit --origin wins over the environment and is remembered
    let origin = match cli.origin {
        Some(ref raw) => {
            let origin = parse_origin(raw)?;
            config.origin = Some(origin.to_string());
            if let Err(e) = config.save() {
                eprintln!("Warning: could not save config: {}", e);
            }
            origin
        }
        None => config.origin()?,
    };

    match cli.command {
        Command::Help => {
            println!("{}", USAGE);
            return Ok(());
        }
        Command::Install => {
            init_stderr_tracing();
            return install_assets(&config, origin).await;
        }
        Command::ListCaches => {
            init_stderr_tracing();
            return list_caches(&config, &origin).await;
        }
        Command::ClearCaches => {
            init_stderr_tracing();
            return clear_caches(&config, &origin).await;
        }
        Command::View => {}
    }

    let _log_guard = init_file_tracing(&config);
    info!(origin = %origin, "Flashdeck starting");

    let mut app = App::new(&config, origin).await?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_and_run(&mut terminal, &mut app).await;

    app.shutdown().await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("Flashdeck shutting down");
    Ok(())
}

/// Show the loading screen, open the deck, register the cache worker once
/// the deck is on screen, then hand over to the event loop.
async fn start_and_run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    terminal.draw(|f| render(f, app))?;
    app.init().await;
    terminal.draw(|f| render(f, app))?;
    app.register_worker().await;
    run_app(terminal, app)
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll with a timeout so transitions keep moving without input
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    // Ctrl+C to quit
                    if key.code == KeyCode::Char('c')
                        && key.modifiers.contains(KeyModifiers::CONTROL)
                    {
                        return Ok(());
                    }
                    if handle_key(app, key) {
                        return Ok(());
                    }
                }
                Event::Mouse(mouse) => {
                    let size = terminal.size()?;
                    handle_mouse(app, mouse, Rect::new(0, 0, size.width, size.height));
                }
                _ => {}
            }
        }

        app.tick();

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}

fn open_storage(config: &Config, origin: &Url) -> Result<Arc<CacheStorage>> {
    Ok(Arc::new(CacheStorage::open(config.cache_dir(origin)?)?))
}

/// Install and activate the current cache generation, then report
async fn install_assets(config: &Config, origin: Url) -> Result<()> {
    let storage = open_storage(config, &origin)?;
    let network = Arc::new(HttpNetwork::new(origin.clone())?);
    let mut registration = Registration::new(origin.clone(), WORKER_SCRIPT, Arc::clone(&network));

    let worker = CacheWorker::new(origin.clone(), network, storage);
    worker.skip_waiting();

    eprintln!("Installing offline cache {} for {}...", CACHE_VERSION, origin);

    match registration.register(worker).await? {
        RegistrationOutcome::Activated {
            install,
            activation,
        } => {
            for path in &install.cached {
                println!("  cached   {}", path);
            }
            for (path, error) in &install.failed {
                println!("  failed   {} ({})", path, error);
            }
            for name in &activation.deleted {
                println!("  evicted  {}", name);
            }
            let total = install.cached.len() + install.failed.len();
            println!("{} of {} assets cached", install.cached.len(), total);
            if !install.is_complete() {
                warn!(failed = install.failed.len(), "Offline cache is incomplete");
            }
        }
        RegistrationOutcome::Waiting { install } => {
            println!("Installed {} assets; waiting to activate", install.cached.len());
        }
        RegistrationOutcome::Unchanged => {
            println!("{} is already active", CACHE_VERSION);
        }
    }
    Ok(())
}

async fn list_caches(config: &Config, origin: &Url) -> Result<()> {
    let storage = open_storage(config, origin)?;
    let summaries = storage.summaries().await;
    if summaries.is_empty() {
        println!("No caches for {}", origin);
        return Ok(());
    }

    for summary in summaries {
        let marker = if summary.name == CACHE_VERSION { "*" } else { " " };
        println!(
            "{} {:<24} {:>4} entries  updated {}",
            marker,
            summary.name,
            summary.entries,
            summary.last_updated.as_deref().unwrap_or("never")
        );
    }
    Ok(())
}

async fn clear_caches(config: &Config, origin: &Url) -> Result<()> {
    let storage = open_storage(config, origin)?;
    for name in storage.keys().await {
        storage.delete(&name).await?;
        println!("Deleted {}", name);
    }
    Ok(())
}

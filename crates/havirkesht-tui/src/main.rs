//! Havirkesht console - a terminal admin console for the Havirkesht
//! province, city and village registry.
//!
//! Besides the interactive console, a few flags run one-off commands:
//! `--status`, `--login` and `--logout`.

mod app;
mod ui;

use std::io::{self, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use havirkesht_core::messages::{user_message, Operation};
use havirkesht_core::Config;

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

const LOG_FILE_PREFIX: &str = "havirkesht.log";

/// Initialize logging to a daily rolling file in the cache directory.
///
/// The terminal belongs to the UI, so nothing is written to stderr. Use
/// `RUST_LOG` to control the level (e.g. `RUST_LOG=debug`). The returned
/// guard flushes the writer when dropped.
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let log_dir = config.log_dir().ok()?;
    if std::fs::create_dir_all(&log_dir).is_err() {
        return None;
    }

    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();

    Some(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: {:#}. Using defaults.", e);
            Config::default()
        }
    };

    let _log_guard = init_tracing(&config);

    // Check for CLI commands
    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("--status") => return print_status(config).await,
        Some("--login") => return login_prompt(config).await,
        Some("--logout") => return logout(config).await,
        Some("--help") | Some("-h") => {
            print_usage();
            return Ok(());
        }
        Some(other) => {
            print_usage();
            anyhow::bail!("Unknown argument: {}", other);
        }
        None => {}
    }

    info!(api = %config.api_base_url, "Havirkesht console starting");

    let mut app = app::build(config)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    app.startup().await;

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

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

    info!("Havirkesht console shutting down");
    Ok(())
}

fn print_usage() {
    eprintln!("Usage: havirkesht [--status | --login | --logout]");
    eprintln!();
    eprintln!("  --status   Check whether the API is reachable");
    eprintln!("  --login    Sign in from the command line and remember the session");
    eprintln!("  --logout   Sign out and forget the stored session");
}

/// Probe the API root and report the result.
async fn print_status(config: Config) -> Result<()> {
    let app = app::build(config)?;
    let api = app.console.api();
    let status = api.status().await;
    println!("{}: {}", api.base_url(), status.label());
    if let Some(username) = app.console.username() {
        println!("Signed in as {}", username);
    }
    Ok(())
}

/// Prompt for credentials and store a remembered session.
async fn login_prompt(mut config: Config) -> Result<()> {
    let username = prompt_username(config.last_username.as_deref())?;
    let password = match Config::env_password() {
        Some(password) => password,
        None => rpassword::prompt_password("Password: ").context("Failed to read password")?,
    };

    let mut app = app::build(config.clone())?;
    match app.console.login(&username, &password, true).await {
        Ok(_) => {
            config.last_username = Some(username.clone());
            config.remember_me = true;
            if let Err(e) = config.save() {
                warn!(error = %e, "Failed to save config");
            }
            println!("Signed in as {}", username);
            Ok(())
        }
        Err(e) => anyhow::bail!(user_message(Operation::Login, &e)),
    }
}

fn prompt_username(default: Option<&str>) -> Result<String> {
    match default {
        Some(name) => print!("Username [{}]: ", name),
        None => print!("Username: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    match (input.is_empty(), default) {
        (true, Some(name)) => Ok(name.to_string()),
        (true, None) => anyhow::bail!("Username is required"),
        (false, _) => Ok(input.to_string()),
    }
}

async fn logout(config: Config) -> Result<()> {
    let mut app = app::build(config)?;
    app.console.logout().await;
    println!("Signed out");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                // Handle input
                if handle_input(app, key).await? {
                    return Ok(());
                }
            }
        }

        // Check for completed background tasks
        app.check_background_tasks().await;

        // Check if we should quit
        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}

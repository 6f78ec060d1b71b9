// ============================================================================
// Pageviews - Graphique quotidien dans le terminal
// ============================================================================
// Histogramme visiteurs / pages vues d'un site WordPress, jour par jour,
// avec survol des barres et rafraîchissement automatique.
//
// ARCHITECTURE :
// 1. Thread UI : event loop (rendu, clavier/souris, ticks de 250 ms)
// 2. Worker thread : runtime tokio + client HTTP, reçoit des FetchCommand
// 3. Channels mpsc entre les deux ; les réponses portent un tag pour que
//    l'UI jette celles qui concernent une plage abandonnée
// ============================================================================

use std::io;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, error, info, warn};

use pageviews::api::{spawn_fetch_worker, FetchCommand, FetchOutcome, StatsClient};
use pageviews::app::App;
use pageviews::config::Config;
use pageviews::models::{DateRange, RangePreset};
use pageviews::ui::{dashboard, events::EventHandler, render, Event};

// ============================================================================
// Ligne de commande
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "pageviews")]
#[command(author, version, about)]
#[command(after_help = "EXAMPLES:
    pageviews --url https://example.com/wp-json/zero-pageviews/v1 --user admin
    pageviews --preset last-30-days
    pageviews --start 2024-01-01 --end 2024-01-31")]
struct Cli {
    /// Base de l'API REST du plugin
    #[arg(long, env = "PAGEVIEWS_API_URL")]
    url: Option<String>,

    /// Utilisateur WordPress
    #[arg(long, env = "PAGEVIEWS_USER")]
    user: Option<String>,

    /// Mot de passe d'application WordPress
    #[arg(long, env = "PAGEVIEWS_APP_PASSWORD", hide_env_values = true)]
    app_password: Option<String>,

    /// Premier jour affiché (yyyy-MM-dd)
    #[arg(long, value_name = "DATE")]
    start: Option<String>,

    /// Dernier jour affiché (yyyy-MM-dd)
    #[arg(long, value_name = "DATE")]
    end: Option<String>,

    /// Plage prédéfinie (today, last-7-days, this-month, ...)
    #[arg(long, conflicts_with_all = ["start", "end"])]
    preset: Option<RangePreset>,

    /// Fichier de configuration JSON
    #[arg(long, env = "PAGEVIEWS_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,
}

impl Cli {
    /// Les arguments (ou variables d'environnement) priment sur le fichier
    fn apply_to(&self, config: &mut Config) {
        if let Some(url) = &self.url {
            config.api_url = url.clone();
        }
        if let Some(user) = &self.user {
            config.username = Some(user.clone());
        }
        if let Some(password) = &self.app_password {
            config.app_password = Some(password.clone());
        }
    }

    /// Plage initiale : --start/--end, sinon --preset, sinon celui de la config
    fn initial_range(&self, config: &Config, today: NaiveDate) -> Result<(DateRange, RangePreset)> {
        if self.start.is_some() || self.end.is_some() {
            let range = DateRange::from_params(self.start.as_deref(), self.end.as_deref(), today)?;
            return Ok((range, RangePreset::Custom));
        }

        let preset = self.preset.unwrap_or(config.preset);
        match preset.resolve(today) {
            Some(range) => Ok((range, preset)),
            None => Ok((DateRange::month_to_date(today), RangePreset::MonthToDate)),
        }
    }
}

// ============================================================================
// Initialisation du logging
// ============================================================================
// Les println! ne fonctionnent pas une fois le TUI lancé : on log vers un
// fichier, avec rotation quotidienne.
// ============================================================================

/// Initialise le système de logging vers fichier
///
/// Les logs sont écrits dans :
/// - Linux : ~/.local/share/pageviews/logs/pageviews.log
/// - macOS : ~/Library/Application Support/pageviews/logs/pageviews.log
/// - Windows : C:\Users\<user>\AppData\Local\pageviews\logs\pageviews.log
///
/// # Utilisation
/// ```bash
/// tail -f ~/.local/share/pageviews/logs/pageviews.log
/// RUST_LOG=pageviews=trace pageviews
/// ```
fn init_logging() -> Result<PathBuf> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = dirs::data_local_dir()
        .map(|dir| dir.join("pageviews").join("logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"));

    std::fs::create_dir_all(&log_dir).context("Échec de la création du répertoire de logs")?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "pageviews.log");

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
                .unwrap_or_else(|_| "pageviews=debug,info".into()),
        )
        .try_init()
        .context("Échec de l'initialisation du logging")?;

    info!(?log_dir, "Logging initialisé");
    Ok(log_dir)
}

// ============================================================================
// Point d'entrée du programme
// ============================================================================

fn main() -> Result<()> {
    let cli = Cli::parse();

    // CONCEPT RUST : if let Err(..)
    // - init_logging() rend le répertoire des logs ; on ne s'intéresse ici
    //   qu'à l'échec, qui n'est pas fatal
    if let Err(e) = init_logging() {
        eprintln!("⚠️  Warning: Failed to initialize logging: {:#}", e);
        eprintln!("   Continuing without logging...");
    }

    info!("Pageviews starting up");

    // Configuration et plage : toute erreur est signalée avant le TUI
    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply_to(&mut config);

    let today = Local::now().date_naive();
    let (range, preset) = cli.initial_range(&config, today)?;
    info!(api_url = %config.api_url, %range, preset = preset.label(), "Configuration ready");

    // Worker : client HTTP + runtime tokio dans son propre thread
    //
    // CONCEPT RUST : ownership des channels
    // - command_tx est déplacé dans App : quand App est détruit, le
    //   Sender l'est aussi et la boucle recv() du worker se termine
    let client = StatsClient::new(&config)?;
    let (command_tx, command_rx) = mpsc::channel::<FetchCommand>();
    let (result_tx, result_rx) = mpsc::channel::<FetchOutcome>();

    info!("Spawning background worker thread");
    spawn_fetch_worker(client, command_rx, result_tx)?;

    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;

    let mut app = App::new(range, preset, &config, command_tx);
    let events = EventHandler::new();

    info!("Starting event loop");
    let result = run(&mut terminal, &mut app, &events, &result_rx);

    // Démonte la vue (minuterie, tooltip) puis ferme le channel du worker
    app.shutdown();
    drop(app);

    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    match &result {
        Ok(_) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }

    result
}

// ============================================================================
// Event Loop Principal
// ============================================================================
// À chaque itération :
//   0. Résultats du worker (non bloquant)
//   1. Rendu
//   2. Événements (bloquant au plus 250 ms)
//   3. Tick : échéance du rafraîchissement automatique
// ============================================================================

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
    result_rx: &mpsc::Receiver<FetchOutcome>,
) -> Result<()> {
    app.start(Instant::now());
    let mut worker_gone = false;

    while app.is_running() {
        // 0. RÉSULTATS
        loop {
            match result_rx.try_recv() {
                Ok(outcome) => {
                    app.handle_outcome(outcome);
                }
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    if !worker_gone {
                        error!("Worker thread disconnected!");
                        worker_gone = true;
                    }
                    break;
                }
            }
        }

        // 1. RENDER : la souris utilise la même géométrie que l'affichage
        let size = terminal.size()?;
        let areas = dashboard::areas(size, app.chart_height);
        app.chart.set_area(areas.chart_inner, size);
        terminal.draw(|frame| render(frame, app))?;

        // 2. INPUT
        match events.next() {
            Ok(event) => handle_event(app, event, Local::now().date_naive()),
            Err(e) => warn!(error = ?e, "Failed to read terminal event"),
        }

        // 3. UPDATE
        app.tick(Instant::now(), Local::now().naive_local());
    }

    Ok(())
}

// ============================================================================
// Gestion des événements
// ============================================================================

fn handle_event(app: &mut App, event: Event, today: NaiveDate) {
    use pageviews::ui::events::{
        is_down_event, is_escape_event, is_next_preset_event, is_previous_preset_event,
        is_quit_event, is_refresh_event, is_shift_backward_event, is_shift_forward_event,
        is_up_event,
    };

    match event {
        // 'q' : two-step quit
        Event::Key(_) if is_quit_event(&event) => {
            if app.is_awaiting_quit_confirmation() {
                info!("User confirmed quit");
                app.quit();
            } else {
                info!("User requested quit (awaiting confirmation)");
                app.request_quit();
            }
        }

        // Échap : équivalent d'un clic hors du graphique
        Event::Key(_) if is_escape_event(&event) => {
            app.cancel_quit();
            app.chart.dismiss_tooltip();
        }

        Event::Key(_) if is_next_preset_event(&event) => {
            app.cancel_quit();
            app.next_preset(today);
        }
        Event::Key(_) if is_previous_preset_event(&event) => {
            app.cancel_quit();
            app.previous_preset(today);
        }

        Event::Key(_) if is_shift_forward_event(&event) => {
            app.cancel_quit();
            app.shift_range(true);
        }
        Event::Key(_) if is_shift_backward_event(&event) => {
            app.cancel_quit();
            app.shift_range(false);
        }

        Event::Key(_) if is_refresh_event(&event) => {
            app.cancel_quit();
            info!("User requested refresh");
            app.refresh();
        }

        Event::Key(_) if is_up_event(&event) => {
            app.cancel_quit();
            app.navigate_up();
        }
        Event::Key(_) if is_down_event(&event) => {
            app.cancel_quit();
            app.navigate_down();
        }

        Event::Key(_) => {
            // Toute autre touche : annule la confirmation
            app.cancel_quit();
        }

        Event::MouseMove { column, row } => app.chart.on_mouse_move(column, row),

        Event::Click { column, row } => {
            app.cancel_quit();
            app.chart.on_click(column, row);
        }

        // La géométrie change : le tooltip ne pointe plus sur la barre
        Event::Resize => app.chart.dismiss_tooltip(),

        Event::Tick => {}
    }
}

// ============================================================================
// Setup et restauration du terminal
// ============================================================================

/// Configure le terminal en mode TUI (raw mode, écran alternatif, souris)
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| e.into())
}

/// Restaure le terminal à son état normal
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    Ok(())
}

// ============================================================================
// Tests unitaires
// ============================================================================

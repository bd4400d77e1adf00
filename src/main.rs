use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_subscriber::EnvFilter;

use scanwatch::app::{HistoryExport, View};
use scanwatch::config::{Overrides, Settings};
use scanwatch::data::{timeline_rows, HistoryFilters, HistorySnapshot};
use scanwatch::prefs::{JsonFileStore, Preferences};
use scanwatch::ui::Theme;
use scanwatch::{events, ui, ApiClient, App, HttpBackend};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StartView {
    Hosts,
    History,
}

#[derive(Parser, Debug)]
#[command(name = "scanwatch")]
#[command(about = "Terminal dashboard for a network scanner's hosts and host history")]
struct Args {
    /// Base URL of the scanner API (e.g. http://192.168.1.5:5000)
    #[arg(short, long)]
    url: Option<String>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Preferences file (theme, columns, refresh intervals)
    #[arg(short, long)]
    prefs: Option<PathBuf>,

    /// Request timeout (e.g. "10s", "1500ms")
    #[arg(long)]
    timeout: Option<String>,

    /// Write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// View to open on
    #[arg(long, value_enum, default_value = "hosts")]
    view: StartView,

    /// History range start, local time (e.g. "2024-03-10T08:00")
    #[arg(long)]
    start: Option<String>,

    /// History range end, local time
    #[arg(long)]
    end: Option<String>,

    /// Export history for the given range to a JSON file and exit
    #[arg(short, long)]
    export: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let overrides = Overrides {
        api_url: args.url.clone(),
        request_timeout: args.timeout.clone(),
        prefs_path: args.prefs.clone(),
        log_file: args.log_file.clone(),
    };
    let settings = Settings::load(args.config.as_deref(), &overrides)?;

    if let Some(ref path) = settings.log_file {
        init_logging(path)?;
    }

    let client = ApiClient::new(&settings.api_url, settings.request_timeout()?)
        .with_context(|| format!("Failed to create client for {}", settings.api_url))?;
    info!("Using scanner API at {}", client.base_url());

    let rt = tokio::runtime::Runtime::new()?;

    // Handle export mode (non-interactive)
    if let Some(ref export_path) = args.export {
        return export_to_file(&rt, &client, &args, export_path);
    }

    let prefs = match settings.prefs_path() {
        Some(path) => {
            info!("Preferences at {}", path.display());
            Preferences::new(Box::new(JsonFileStore::open(path)))
        }
        None => Preferences::in_memory(),
    };

    let backend = HttpBackend::new(client, rt.handle().clone());
    let mut app = App::new(Box::new(backend), prefs, Theme::detect_name());

    app.set_view(match args.view {
        StartView::Hosts => View::Hosts,
        StartView::History => View::History,
    });
    if let Some(start) = args.start {
        app.history.filters.start = start;
    }
    if let Some(end) = args.end {
        app.history.filters.end = end;
    }

    run_tui(app)
}

/// Send tracing output to `path`. The terminal belongs to the UI.
fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Run the TUI until the user quits
fn run_tui(mut app: App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic);
    }));

    app.start();

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    while app.running {
        // Apply finished requests and start due refreshes before drawing
        app.tick(Instant::now());

        terminal.draw(|frame| ui::draw(frame, app))?;

        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => events::handle_mouse_event(app, mouse),
                Event::Resize(_, _) => {
                    // Terminal will redraw on next iteration
                }
                _ => {}
            }
        }
    }

    info!("Exiting");
    Ok(())
}

/// Fetch history once and write the range given by --start/--end
fn export_to_file(
    rt: &tokio::runtime::Runtime,
    client: &ApiClient,
    args: &Args,
    export_path: &Path,
) -> Result<()> {
    let payload = rt
        .block_on(client.fetch_history())
        .context("Error loading history")?;
    let snapshot = HistorySnapshot::from_payload(payload);

    let filters = HistoryFilters {
        start: args.start.clone().unwrap_or_default(),
        end: args.end.clone().unwrap_or_default(),
        ..Default::default()
    };
    let rows = timeline_rows(&snapshot, &filters);
    let export = HistoryExport::new(filters.date_range(), rows);

    let json = serde_json::to_string_pretty(&export)?;
    std::fs::write(export_path, json)?;

    println!(
        "Exported history for {} hosts to: {}",
        export.hosts.len(),
        export_path.display()
    );
    Ok(())
}

use todo_tui::app::App;
use todo_tui::config::Config;
use todo_tui::notify::ToastBoard;
use todo_tui::storage::FileStorage;
use todo_tui::store::TaskStore;
use todo_tui::ui::run_app;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use dotenv::dotenv;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::{self, OpenOptions};
use std::io;
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// The terminal belongs to the UI, so logs go to a file.
fn init_logging(config: &Config) -> io::Result<()> {
    if let Some(parent) = config.log_file.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::load()?;
    init_logging(&config)?;
    tracing::info!(data_dir = %config.data_dir.display(), "starting todo-tui");

    let toasts = ToastBoard::new(Duration::from_millis(config.toast_ms));
    let store = TaskStore::open(
        FileStorage::new(&config.data_dir),
        toasts.clone(),
        &config.storage_key,
    );
    let app = App::new(store, toasts, config.categories.clone());

    // Setup terminal UI
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    terminal.hide_cursor()?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = %err, "terminal error");
        eprintln!("Error: {:?}", err);
    }

    tracing::info!("exiting");
    Ok(())
}

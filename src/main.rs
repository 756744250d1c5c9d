use mathblitz::{
    app::{App, AppState, KeyOutcome},
    config::FileConfigStore,
    runtime::{AppEvent, CrosstermEventSource, EventSource, FixedTicker, Runner, Ticker},
};

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::KeyEventKind,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    fs::File,
    io::{self, stdin},
    path::{Path, PathBuf},
    sync::Mutex,
    time::Instant,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// timed arithmetic practice in your terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Solve as many addition, subtraction, multiplication and division problems as you can before the timer runs out. Operations, ranges and the timer are picked on the start screen."
)]
pub struct Cli {
    /// session length in minutes (1-5), overrides the saved setting
    #[clap(short = 't', long, value_parser = clap::value_parser!(u8).range(1..=5))]
    timer: Option<u8>,

    /// seed the problem generator for a reproducible sequence
    #[clap(long)]
    seed: Option<u64>,

    /// settings file to load and save (defaults to the platform config dir)
    #[clap(long)]
    config: Option<PathBuf>,

    /// write diagnostic logs to this file; filter with MATHBLITZ_LOG
    #[clap(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }

    fn build_app(&self) -> App {
        let mut app = App::new(Box::new(self.config_store()), self.seed);
        if let Some(minutes) = self.timer {
            // clap already restricts the value to 1..=5
            let _ = app.collector_mut().set_timer(minutes);
        }
        app
    }
}

fn init_logging(path: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let Some(path) = path else {
        return Ok(());
    };

    let file = File::create(path)?;
    let filter =
        EnvFilter::try_from_env("MATHBLITZ_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .init();

    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_logging(cli.log_file.as_deref())?;
    info!("starting mathblitz");

    let mut app = cli.build_app();

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());
    let result = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, E: EventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| ui(app, f))?;

    loop {
        let was_playing = app.state == AppState::Playing;
        let redraw = match runner.step()? {
            AppEvent::Tick => false,
            AppEvent::Resize => true,
            AppEvent::Key(key) if key.kind == KeyEventKind::Press => {
                if app.on_key(key) == KeyOutcome::Quit {
                    break;
                }
                true
            }
            AppEvent::Key(_) => false,
        };

        // polled on every event, so a steady stream of keys cannot stall the clock
        app.on_tick(Instant::now());

        if redraw || was_playing {
            terminal.draw(|f| ui(app, f))?;
        }
    }

    Ok(())
}

fn ui(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}

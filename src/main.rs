//! Main entry point for the rec-grid CLI application.

use clap::Parser;
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use log::{debug, info, warn};
use ratatui::prelude::*;
use rec_grid::api::{AppClient, RemoteSource};
use rec_grid::batch::{BatchAcquirer, FetchMode};
use rec_grid::config::Config;
use rec_grid::feed::{FeedSettings, FeedState, FetchOutcome, PaginationController};
use rec_grid::focus::ActiveIndexController;
use rec_grid::notify::{Notifier, ToastQueue};
use rec_grid::retry::{RetryPolicy, RetryingFetcher};
use rec_grid::tui::{Action, App, FeedView, draw};
use std::io::{self, stdout};
use std::sync::Arc;
use std::time::Duration;

/// Command-line arguments for the rec-grid application.
#[derive(Parser, Debug)]
#[command(
    name = "rec-grid",
    version,
    about = "Browse a recommendation feed in the terminal",
    long_about = "Fetches recommendations from the app feed endpoint with retries, \
                  lays them out as a grid and keeps loading as you scroll."
)]
struct Args {
    /// Log verbosity level: 0=error, 1=warn, 2=info, 3=debug, 4=trace
    #[arg(short, long, default_value_t = 1)]
    log: u8,

    /// Issue the pages of a batch concurrently instead of one by one
    #[arg(short, long)]
    parallel: bool,

    /// Access key sent with every feed request (overrides config)
    #[arg(short, long)]
    access_key: Option<String>,

    /// Write the default config file if none exists and exit
    #[arg(long)]
    init_config: bool,
}

type Feed = PaginationController<AppClient>;

/// Initialize the terminal for TUI rendering.
fn init_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    Terminal::new(backend)
}

/// Restore the terminal to its original state.
fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging
    let log_level = match args.log {
        0 => log::LevelFilter::Error,
        1 => log::LevelFilter::Warn,
        2 => log::LevelFilter::Info,
        3 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .format_target(false)
        .init();

    debug!("Log level set to {:?}", log_level);

    if args.init_config {
        let path = Config::create_default_if_missing()?;
        println!("Config file: {}", path.display());
        return Ok(());
    }

    // Load config
    let config = Config::load().unwrap_or_else(|e| {
        warn!("Failed to load config: {}. Using defaults.", e);
        Config::new()
    });

    // Merge config with CLI args
    let access_key = args.access_key.clone().or_else(|| config.access_key.clone());
    let parallel = args.parallel || config.parallel_requests;
    if access_key.is_none() {
        warn!("No access_key configured; the feed may reject requests");
    }

    let toasts = Arc::new(ToastQueue::new());
    let notifier: Arc<dyn Notifier> = toasts.clone();

    let client = Arc::new(AppClient::new(access_key)?);
    let fetcher = RetryingFetcher::new(client, RetryPolicy::from(&config.retry), notifier.clone());
    let acquirer = BatchAcquirer::new(fetcher, FetchMode::from_parallel_flag(parallel));
    let mut feed = PaginationController::new(
        acquirer,
        notifier,
        FeedSettings::from(&config),
        ActiveIndexController::new(config.pagination.scroll_step),
    );

    info!(
        "Starting feed ({:?} mode, {} pages per batch, at most {} rounds per fetch)",
        feed.fetch_mode(),
        feed.settings().batch_pages,
        feed.settings().max_iterations
    );

    // Initialize terminal
    let mut terminal = init_terminal()?;

    let mut app = App::new(config.keybindings.clone(), config.card_width, toasts);

    let result = run_app(&mut terminal, &mut app, &mut feed).await;

    // Restore terminal
    restore_terminal()?;

    result
}

fn view_of<S: RemoteSource>(feed: &PaginationController<S>) -> FeedView<'_> {
    FeedView {
        items: feed.items(),
        active: feed.focus().active_index(),
        state: feed.state(),
        page: feed.page(),
        parallel: feed.fetch_mode() == FetchMode::Parallel,
    }
}

/// Resolves once a quit key is pressed. Other input is discarded.
async fn quit_requested(events: &mut EventStream, app: &App) {
    while let Some(event) = events.next().await {
        if let Ok(Event::Key(key)) = event {
            if key.kind == KeyEventKind::Press && app.quits_during_fetch(&key) {
                return;
            }
        }
    }
    // input closed; let the fetch finish
    std::future::pending::<()>().await
}

/// Clear the grid, show the skeleton, then load a fresh collection.
///
/// Returns `false` if the user quit while the request was in flight.
async fn refresh(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    feed: &mut Feed,
    events: &mut EventStream,
) -> io::Result<bool> {
    app.scroll_row = 0;
    if !feed.begin_refresh() {
        return Ok(true);
    }
    terminal.draw(|f| draw(f, app, view_of(feed)))?;

    let columns = app.columns;
    let result = tokio::select! {
        result = feed.finish_refresh(columns) => result,
        _ = quit_requested(events, app) => return Ok(false),
    };

    match result {
        Ok(outcome) => debug!("Refresh finished: {:?}", outcome),
        // already shown as a toast
        Err(e) => warn!("Refresh failed: {}", e),
    }
    Ok(true)
}

/// Append more items once the user nears the end of the grid.
///
/// Returns `false` if the user quit while the request was in flight.
async fn load_more(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    feed: &mut Feed,
    events: &mut EventStream,
) -> io::Result<bool> {
    let loading = FeedView {
        state: FeedState::FetchingMore,
        ..view_of(feed)
    };
    terminal.draw(|f| draw(f, app, loading))?;

    let columns = app.columns;
    let result = tokio::select! {
        result = feed.fetch_more(columns) => result,
        _ = quit_requested(events, app) => return Ok(false),
    };

    match result {
        Ok(FetchOutcome::Completed { added, .. })
        | Ok(FetchOutcome::IterationBoundExceeded { added, .. }) => {
            if added == 0 {
                debug!("Nothing new arrived, pausing infinite scroll");
                app.auto_fetch_paused = true;
            }
        }
        Ok(FetchOutcome::Skipped) => {}
        Err(e) => {
            warn!("Fetch more failed: {}", e);
            app.auto_fetch_paused = true;
        }
    }
    Ok(true)
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    feed: &mut Feed,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut events = EventStream::new();

    // Lay the grid out once so the first batch knows the column count
    terminal.draw(|f| draw(f, app, view_of(feed)))?;
    if !refresh(terminal, app, feed, &mut events).await? {
        return Ok(());
    }

    loop {
        app.toasts.prune();

        // Draw UI
        terminal.draw(|f| draw(f, app, view_of(feed)))?;

        if feed.has_more()
            && feed.state() == FeedState::Idle
            && !feed.items().is_empty()
            && !app.auto_fetch_paused
            && app.wants_more(feed.items().len())
        {
            if !load_more(terminal, app, feed, &mut events).await? {
                break;
            }
            continue;
        }

        // Wait for input, waking up periodically so expired toasts go away
        let event = tokio::select! {
            event = events.next() => event,
            _ = tokio::time::sleep(Duration::from_millis(100)) => continue,
        };
        let key = match event {
            Some(Ok(Event::Key(key))) => key,
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(e.into()),
            None => break,
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match app.handle_input(key, feed.focus_mut()) {
            Action::Quit => break,
            Action::Refresh => {
                if !refresh(terminal, app, feed, &mut events).await? {
                    break;
                }
            }
            Action::Open(index) => {
                if let Some(item) = feed.items().get(index) {
                    match item.link() {
                        Some(link) => app.toasts.info(&format!("{}\n{}", item.title, link)),
                        None => app.toasts.info(&format!("{}\n(no link)", item.title)),
                    }
                }
            }
            Action::None => {}
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

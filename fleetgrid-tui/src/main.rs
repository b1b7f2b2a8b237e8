mod app;
mod fleet;
mod paths;
mod view;

use std::env;
use std::fs::{self, File};
use std::io::{self, Write};
use std::time::Duration;

use crossterm::cursor::{Hide, Show};
use crossterm::event::{
    DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture, EventStream,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use futures::StreamExt;
use log::{debug, error, info, warn};
use simplelog::{Config, LevelFilter, WriteLogger};
use tokio::time::{Instant, MissedTickBehavior, sleep_until};

use fleetgrid::prefs::{Preferences, SqliteStore};
use fleetgrid::table::{RowSource, SortMode, TableBuilder, TableConfig};
use fleetgrid::window::WindowConfig;

use crate::app::{App, FOOTER_ROWS};
use crate::fleet::Fleet;
use crate::paths::AppDirs;

const LIST_ID: &str = "instances";
const FLEET_SIZE: usize = 25_000;
const LIVE_RELOAD: Duration = Duration::from_secs(5);
const LOG_ENV: &str = "FLEETGRID_LOG";

#[tokio::main]
async fn main() {
    let dirs = AppDirs::locate();
    init_logging(dirs.as_ref());

    if let Err(e) = run(dirs.as_ref()).await {
        error!("fatal: {}", e);
        eprintln!("Error: {}", e);
    }
}

fn init_logging(dirs: Option<&AppDirs>) {
    let Some(dirs) = dirs else { return };
    let path = dirs.log_file();
    if let Some(dir) = path.parent() {
        let _ = fs::create_dir_all(dir);
    }
    if let Err(e) = dirs.rotate_logs() {
        eprintln!("cannot rotate logs: {}", e);
    }

    let level = env::var(LOG_ENV)
        .ok()
        .and_then(|value| value.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Debug);
    match File::create(&path) {
        Ok(file) => {
            let _ = WriteLogger::init(level, Config::default(), file);
        }
        Err(e) => eprintln!("cannot create log file {}: {}", path.display(), e),
    }
}

/// Opens the layout database, falling back to memory when it is unavailable.
async fn open_preferences(dirs: Option<&AppDirs>) -> Preferences {
    if let Some(path) = dirs.map(AppDirs::layout_db) {
        if let Some(dir) = path.parent() {
            let _ = fs::create_dir_all(dir);
        }
        match SqliteStore::open(&path).await {
            Ok(store) => {
                info!("layout store: {}", path.display());
                return Preferences::new(store);
            }
            Err(e) => warn!("cannot open layout store {}: {}", path.display(), e),
        }
    }
    warn!("layout store unavailable; changes last for this session only");
    Preferences::memory()
}

fn table_config(height: u16) -> TableConfig {
    let window = WindowConfig::default()
        .with_height(height.saturating_sub(FOOTER_ROWS) as u32)
        .with_row_height(1)
        .with_header_height(1)
        .with_page_size(100)
        .with_overscan(5);

    TableConfig::default()
        .with_list_id(LIST_ID)
        .with_sort_mode(SortMode::Server)
        .with_row_numbers(true)
        .with_row_number_width(7)
        .with_column_widths(12, 4, 60)
        .with_resize_handle_width(1)
        .with_window(window)
}

/// Puts the terminal into raw mode and restores it on drop.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        execute!(
            io::stdout(),
            EnterAlternateScreen,
            EnableMouseCapture,
            EnableFocusChange,
            Hide
        )?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(
            io::stdout(),
            Show,
            DisableFocusChange,
            DisableMouseCapture,
            LeaveAlternateScreen
        );
        let _ = disable_raw_mode();
    }
}

async fn run(dirs: Option<&AppDirs>) -> io::Result<()> {
    let preferences = open_preferences(dirs).await;
    let fleet = Fleet::new(FLEET_SIZE);
    let (width, height) = crossterm::terminal::size()?;

    let query = fleet.query(None, None);
    let key = query.key();
    let table = TableBuilder::new(fleet::columns(), RowSource::remote(query, key))
        .config(table_config(height))
        .preferences(preferences)
        .mount()
        .await;
    info!(
        "mounted {:?}: {} columns, sort {:?}",
        LIST_ID,
        table.visible_columns().len(),
        table.sort()
    );

    let mut app = App::new(table, fleet, width, height);
    let guard = TerminalGuard::enter()?;
    let result = event_loop(&mut app).await;
    drop(guard);

    match app.table.flush().await {
        Ok(true) => debug!("layout flushed on exit"),
        Ok(false) => {}
        Err(e) => warn!("failed to flush layout on exit: {}", e),
    }
    result
}

async fn event_loop(app: &mut App) -> io::Result<()> {
    let mut stdout = io::stdout();
    let mut events = EventStream::new();
    let mut live = tokio::time::interval_at(Instant::now() + LIVE_RELOAD, LIVE_RELOAD);
    live.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if app.needs_redraw() {
            view::draw(&mut stdout, app)?;
            app.drawn();
        }
        if app.should_quit() {
            break;
        }

        let persist_at = app.table.next_persist_deadline();
        tokio::select! {
            event = events.next() => match event {
                Some(Ok(event)) => app.handle_event(event).await,
                Some(Err(e)) => return Err(e),
                None => break,
            },
            Some(result) = app.table.next_completion() => app.on_page(result),
            _ = sleep_until(persist_at.unwrap_or_else(Instant::now)), if persist_at.is_some() => {
                if let Err(e) = app.table.tick().await {
                    warn!("failed to write layout: {}", e);
                }
            }
            _ = live.tick() => app.live_tick(),
        }
    }
    stdout.flush()
}

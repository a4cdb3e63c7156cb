use std::fs::{self, File};
use std::io::stdout;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::EnableMouseCapture,
    execute,
    terminal::{EnterAlternateScreen, enable_raw_mode},
};
use log::{error, info};
use ratatui::{Terminal, backend::CrosstermBackend};
use simplelog::{Config, LevelFilter, WriteLogger};

use pagelight::event_source::KeyboardEventSource;
use pagelight::matches::{ElementId, Extraction};
use pagelight::panic_handler::{initialize_panic_handler, restore_terminal};
use pagelight::pdf::MupdfBackend;
use pagelight::snapshot::{SnapshotRequest, write_snapshot};
use pagelight::{App, Viewer, run_app_with_event_source, settings};

const LOG_FILE: &str = "pagelight.log";
const SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(60);

/// View a PDF with extracted elements outlined on top
#[derive(Parser, Debug)]
#[command(name = "pagelight")]
#[command(version, about, long_about = None)]
struct Args {
    /// PDF document to open
    pdf: PathBuf,

    /// Extraction JSON with the matched elements
    #[arg(short, long)]
    matches: Option<PathBuf>,

    /// Page to open at (1-indexed)
    #[arg(long)]
    page: Option<usize>,

    /// Element id to highlight on start
    #[arg(long)]
    highlight: Option<String>,

    /// Write the page with its overlay to this PNG and exit
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Settings file to use instead of the per-user one
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    WriteLogger::init(level, Config::default(), File::create(LOG_FILE)?)?;
    info!("Starting pagelight");

    settings::load_settings(args.config.as_deref());

    let bytes = fs::read(&args.pdf).with_context(|| format!("reading {:?}", args.pdf))?;
    let extraction = match &args.matches {
        Some(path) => Extraction::load_from_file(path)
            .with_context(|| format!("loading matches from {path:?}"))?,
        None => Extraction::default(),
    };
    let order = extraction.reading_order();

    let mut viewer = Viewer::new(MupdfBackend, settings::render_config());
    viewer.set_matches(extraction.elements, extraction.pages, order);
    viewer
        .open_document(&bytes)
        .with_context(|| format!("opening {:?}", args.pdf))?;

    let style = settings::overlay_style();
    let highlight = args.highlight.map(ElementId::from);

    if let Some(output) = &args.snapshot {
        let request = SnapshotRequest {
            page: args.page,
            highlight,
        };
        return write_snapshot(&mut viewer, &request, &style, output, SNAPSHOT_TIMEOUT);
    }

    if let Some(element_id) = &highlight {
        viewer.highlight_external(element_id);
    } else if let Some(page) = args.page {
        viewer.select_page(page);
    }

    initialize_panic_handler();

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let title = args
        .pdf
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.pdf.display().to_string());
    let mut app = App::new(viewer, style, title);
    let res = run_app_with_event_source(&mut terminal, &mut app, &mut KeyboardEventSource);

    restore_terminal();
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!("Application error: {err:?}");
        eprintln!("{err:?}");
    }

    info!("Shutting down pagelight");
    Ok(())
}

//! World-model editor TUI.
//!
//! A terminal interface for browsing and editing a graph world model: a
//! pannable tile map, a tile-detail panel with per-instance actions, and a
//! status bar.
//!
//! # Headless Mode
//!
//! Run with `--headless` to print the loaded map as text and exit, suitable
//! for smoke-testing a server:
//!
//! ```bash
//! cargo run -p worldsmith -- --headless --server http://localhost:9000/
//! ```

mod app;
mod events;
mod headless;
mod ui;

use std::io::stdout;
use std::time::Duration;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use worldsmith_client::Client;
use worldsmith_core::{ControllerConfig, EventBus, MapController, PixelSize};

use app::App;
use events::{handle_event, EventResult};
use ui::render::render;

/// One map tile is two terminal columns by one row, so a "pixel" in the
/// scene is one terminal cell.
const TILE_COLS: u32 = 2;
const TILE_ROWS: u32 = 1;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    let client = match server_arg(&args) {
        Some(url) => Client::new(url),
        None => Client::from_env()?,
    };

    if args.iter().any(|a| a == "--headless") {
        return headless::run_headless(client).await.map_err(|e| e.into());
    }

    // Load the world before touching the terminal so connection errors
    // print normally.
    let config = ControllerConfig::new()
        .with_tile_size(TILE_COLS, TILE_ROWS)
        .with_viewport(PixelSize::new(160, 48));
    let mut controller = MapController::new(config, EventBus::new());
    if let Err(e) = controller.initialize(&client).await {
        eprintln!("Failed to load the world: {e}");
        std::process::exit(1);
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, App::new(controller, client)).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;

    if let Err(e) = result {
        eprintln!("Error: {e}");
    }

    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
) -> std::io::Result<()> {
    loop {
        let size = terminal.size()?;
        app.update_layout(Rect::new(0, 0, size.width, size.height));
        app.advance_frame();

        terminal.draw(|f| render(f, &app))?;

        // Process any pending action-list fetch for the focused instance
        if let Some(id) = app.pending_actions.take() {
            app.fetch_actions(id).await;
        }

        // Process any pending action execution
        if let Some((relation, source)) = app.pending_execute.take() {
            app.run_action(relation, source).await;
        }

        // Process any pending deletion
        if let Some(id) = app.pending_delete.take() {
            app.run_delete(id).await;
        }

        if event::poll(Duration::from_millis(100))? {
            let ev = event::read()?;
            match handle_event(&mut app, ev) {
                EventResult::Quit => return Ok(()),
                EventResult::NeedsRedraw | EventResult::Continue => {}
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn server_arg(args: &[String]) -> Option<&str> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--server" {
            return iter.next().map(String::as_str);
        }
    }
    None
}

fn print_help() {
    println!("worldsmith - graph world-model editor");
    println!();
    println!("USAGE:");
    println!("  worldsmith [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("  -h, --help         Show this help message");
    println!("  --server <URL>     World-model server base URL");
    println!("                     (default: WORLDSMITH_SERVER_URL or http://localhost:9000/)");
    println!("  --headless         Print the loaded map as text and exit");
    println!();
    println!("KEYS:");
    println!("  arrows / hjkl      Pan the map");
    println!("  mouse click        Select a tile");
    println!("  mouse drag         Pan the map");
    println!("  J / K              Move through instances in the selected tile");
    println!("  a                  List actions for the focused instance");
    println!("  d                  Delete the focused instance");
    println!("  ?                  Toggle help");
    println!("  q                  Quit");
}

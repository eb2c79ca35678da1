use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout, Write};
use std::path::Path;
use taskboard::cli::Cli;
use taskboard::config::Config;
use taskboard::storage::FileStorage;
use taskboard::ui::{self, App};
use taskboard::{commands, logging, BoardError, KanbanBoard};

fn main() {
    let mut cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };
    let data_dir = config.resolve_data_dir(cli.data_dir.as_deref());

    let result = match cli.command.take() {
        None => run_tui(&config, &data_dir),
        Some(command) => {
            logging::init_stderr(&config.log_level);
            commands::dispatch(command, &cli, &config, &data_dir)
        }
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run_tui(config: &Config, data_dir: &Path) -> Result<(), BoardError> {
    logging::init_file(&config.log_level, data_dir)?;
    let mut board = KanbanBoard::open(Box::new(FileStorage::new(data_dir)))?;
    let mut app = App::new(config.resolve_export_dir(None), config.sweep_interval());

    let terminal_error = |e: io::Error| BoardError::Io {
        path: "terminal".into(),
        source: e,
    };
    enable_raw_mode().map_err(terminal_error)?;
    let mut terminal = match setup_terminal() {
        Ok(terminal) => terminal,
        Err(e) => {
            let _ = restore_terminal(&mut io::stdout());
            return Err(terminal_error(e));
        }
    };

    let result = ui::run_app(&mut terminal, &mut board, &mut app);

    restore_terminal(terminal.backend_mut()).map_err(terminal_error)?;
    terminal.show_cursor().map_err(terminal_error)?;

    result
}

fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

/// Undo raw mode and the alternate screen. Every step runs even if an
/// earlier one fails; the first error is returned.
fn restore_terminal<W: Write>(out: &mut W) -> io::Result<()> {
    let raw = disable_raw_mode();
    let screen = execute!(out, LeaveAlternateScreen, DisableMouseCapture);
    raw.and(screen)
}

use std::io::{Stdout, Write};

use anyhow::{Context, Result};
use crossbeam_channel::unbounded;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{error, info};

mod app;
mod capture;
mod logging;
mod settings;

use app::{Exit, SessionController};
use capture::Invocation;

pub(crate) use settings::Settings;

const USAGE: &str = "usage: buildcap <command> [args...]";

fn main() {
    let settings = Settings::from_env();
    if let Some(path) = &settings.log_path {
        if let Err(err) = logging::init_global(path) {
            eprintln!("buildcap: logging disabled: {err:#}");
        }
    }

    let Some(invocation) = Invocation::from_args(std::env::args().skip(1)) else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };

    match run(invocation, settings) {
        Ok(()) => {}
        Err(err) => {
            error!(error = %format!("{err:#}"), "fatal");
            eprintln!("buildcap: {err:#}");
            std::process::exit(2);
        }
    }
}

fn run(invocation: Invocation, settings: Settings) -> Result<()> {
    let (tx, rx) = unbounded();
    // Spawn before touching the terminal so setup failures print plainly.
    let controller = SessionController::launch(invocation, tx)?;
    info!(command = %controller.invocation(), "capture started");

    let mut terminal = setup_terminal()?;
    let result = app::run_app(&mut terminal, controller, rx, settings);
    restore_terminal(&mut terminal)?;

    match result? {
        Exit::Dump(lines) => dump_transcript(&lines),
        Exit::Clear => Ok(()),
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enable raw mode")?;
    crossterm::execute!(std::io::stdout(), EnterAlternateScreen).context("enter alternate screen")?;
    let mut terminal =
        Terminal::new(CrosstermBackend::new(std::io::stdout())).context("create terminal")?;
    terminal.hide_cursor().ok();
    terminal.clear().ok();
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode().context("disable raw mode")?;
    crossterm::execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("leave alternate screen")?;
    terminal.show_cursor().context("show cursor")?;
    Ok(())
}

fn dump_transcript(lines: &[String]) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_transcript(&mut out, lines).context("write transcript")
}

fn write_transcript(out: &mut impl Write, lines: &[String]) -> std::io::Result<()> {
    for line in lines {
        writeln!(out, "{line}")?;
    }
    out.flush()
}

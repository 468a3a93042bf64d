use std::io::Stdout;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use super::*;

pub(crate) fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    controller: SessionController,
    rx: Receiver<SessionEvent>,
    settings: Settings,
) -> Result<Exit> {
    let mut app = App::new(controller, rx, settings);
    const RUNNING_DRAW_INTERVAL_MS: u64 = 33;
    const MAX_EVENTS_PER_FRAME: u16 = 64;
    let mut last_draw_at = Instant::now()
        .checked_sub(Duration::from_millis(RUNNING_DRAW_INTERVAL_MS))
        .unwrap_or_else(Instant::now);
    let mut needs_draw = true;

    loop {
        if app.poll_session() {
            needs_draw = true;
        }

        if needs_draw {
            if !app.is_finished()
                && last_draw_at.elapsed() < Duration::from_millis(RUNNING_DRAW_INTERVAL_MS)
            {
                // Hold briefly to batch bursts of output into one frame.
            } else {
                if let Ok(area) = terminal.size() {
                    app.update_viewport(area.height);
                }
                terminal.draw(|f| ui::draw(f, &app))?;
                last_draw_at = Instant::now();
                needs_draw = false;
            }
        }

        if app.should_quit {
            break;
        }

        let timeout = if needs_draw {
            Duration::from_millis(RUNNING_DRAW_INTERVAL_MS)
        } else {
            app.tick()
        };
        if !event::poll(timeout).context("event poll")? {
            continue;
        }

        let mut drained_events: u16 = 0;
        loop {
            match event::read().context("event read")? {
                Event::Key(key) => {
                    if !matches!(key.kind, KeyEventKind::Release) {
                        app.handle_key(key);
                        needs_draw = true;
                    }
                }
                Event::Resize(_, _) => {
                    needs_draw = true;
                }
                _ => {}
            }

            drained_events = drained_events.saturating_add(1);
            if drained_events >= MAX_EVENTS_PER_FRAME || app.should_quit {
                break;
            }
            if !event::poll(Duration::from_millis(0)).context("event poll drain")? {
                break;
            }
        }
    }

    Ok(app.into_exit())
}

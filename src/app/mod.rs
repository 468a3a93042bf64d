use std::time::Duration;

use crossbeam_channel::Receiver;
use tracing::{debug, trace};

use crate::capture::{Outcome, SessionEvent, ViewState};
use crate::Settings;

mod controller;
mod input;
mod runtime;
mod text;
mod types;
mod ui;

pub(crate) use controller::{Exit, SessionController};
pub(crate) use runtime::run_app;
pub(crate) use types::{default_palette, ThemePalette};

const CAPTION_RUNNING: &str = "(running) Press 'k' to kill command";
const CAPTION_COMPLETED: &str = "(completed) Press 'q' to exit";
/// Rows taken by the info and status lines under the list.
const FOOTER_ROWS: u16 = 2;

/// Presentation state. Everything it shows is read back from the
/// controller's transcript; the only inputs are session events and keys.
struct App {
    controller: SessionController,
    rx: Receiver<SessionEvent>,
    settings: Settings,
    theme: ThemePalette,
    finished: Option<Outcome>,
    kill_sent: bool,
    should_quit: bool,

    /// First transcript row drawn in the list area.
    list_offset: usize,
    list_height: usize,
}

impl App {
    fn new(controller: SessionController, rx: Receiver<SessionEvent>, settings: Settings) -> Self {
        Self {
            controller,
            rx,
            settings,
            theme: default_palette(),
            finished: None,
            kill_sent: false,
            should_quit: false,
            list_offset: 0,
            list_height: 1,
        }
    }

    /// Drains pending session events. Returns true when a redraw is needed.
    fn poll_session(&mut self) -> bool {
        let mut changed = false;
        let mut scrolled = false;
        while let Ok(event) = self.rx.try_recv() {
            changed = true;
            match event {
                SessionEvent::Appended(appended) => {
                    trace!(
                        seq = appended.seq,
                        error = appended.is_error,
                        last = appended.last_index,
                        "line appended"
                    );
                    // A paused view keeps its window.
                    scrolled |= appended.was_at_bottom;
                }
                SessionEvent::Finished(outcome) => {
                    debug!(code = outcome.code, killed = outcome.killed, "finished event");
                    self.finished = Some(outcome);
                }
            }
        }
        if scrolled {
            self.sync_list_offset();
        }
        changed
    }

    fn is_finished(&self) -> bool {
        self.finished.is_some()
    }

    fn caption(&self) -> &'static str {
        if self.is_finished() {
            CAPTION_COMPLETED
        } else {
            CAPTION_RUNNING
        }
    }

    fn view(&self) -> ViewState {
        self.controller.transcript().view()
    }

    fn request_kill(&mut self) {
        if self.kill_sent || self.is_finished() {
            return;
        }
        self.kill_sent = true;
        self.controller.request_kill();
    }

    fn request_quit(&mut self) {
        if self.is_finished() {
            self.should_quit = true;
        }
    }

    /// Marks the transcript as not-to-be-dumped; quits if already finished.
    fn request_clear(&mut self) {
        self.controller.suppress_dump();
        self.request_quit();
    }

    fn move_cursor(&mut self, delta: isize) {
        self.controller.transcript().move_cursor(delta);
        self.sync_list_offset();
    }

    fn jump_to(&mut self, index: usize) {
        self.controller.transcript().set_cursor(index);
        self.sync_list_offset();
    }

    fn jump_to_bottom(&mut self) {
        self.controller.transcript().follow_bottom();
        self.sync_list_offset();
    }

    fn page_rows(&self) -> isize {
        self.list_height.max(1) as isize
    }

    fn update_viewport(&mut self, height: u16) {
        self.list_height = height.saturating_sub(FOOTER_ROWS).max(1) as usize;
        self.sync_list_offset();
    }

    /// Scrolls the list window the minimum needed to keep the cursor visible.
    fn sync_list_offset(&mut self) {
        let cursor = self.view().cursor();
        let height = self.list_height.max(1);
        if cursor < self.list_offset {
            self.list_offset = cursor;
        } else if cursor >= self.list_offset + height {
            self.list_offset = cursor + 1 - height;
        }
    }

    fn tick(&self) -> Duration {
        self.settings.tick
    }

    fn into_exit(self) -> Exit {
        self.controller.into_exit()
    }
}

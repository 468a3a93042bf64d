/// Cursor into the transcript. `auto_follow` holds exactly when the cursor
/// sits on the end-of-transcript row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ViewState {
    cursor: usize,
    auto_follow: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewState {
    pub(crate) fn new() -> Self {
        Self {
            cursor: 0,
            auto_follow: true,
        }
    }

    pub(crate) fn cursor(&self) -> usize {
        self.cursor
    }

    pub(crate) fn is_following(&self) -> bool {
        self.auto_follow
    }

    pub(crate) fn on_append(&mut self, new_last: usize) {
        if self.auto_follow {
            self.cursor = new_last;
        }
    }

    pub(crate) fn set_cursor(&mut self, index: usize, last: usize) {
        let index = index.min(last);
        self.cursor = index;
        self.auto_follow = index == last;
    }

    pub(crate) fn move_by(&mut self, delta: isize, last: usize) {
        let target = if delta < 0 {
            self.cursor.saturating_sub(delta.unsigned_abs())
        } else {
            self.cursor.saturating_add(delta as usize)
        };
        self.set_cursor(target, last);
    }

    pub(crate) fn counter_label(&self, total: usize) -> String {
        if self.auto_follow {
            format!("{total}")
        } else {
            format!("{}:{total}", self.cursor + 1)
        }
    }
}

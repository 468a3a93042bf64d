use std::sync::{Mutex, MutexGuard, PoisonError};

use crossbeam_channel::Sender;

use super::{LineLog, SessionEvent, ViewState};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Appended {
    pub(crate) seq: usize,
    pub(crate) is_error: bool,
    pub(crate) last_index: usize,
    pub(crate) was_at_bottom: bool,
}

struct Inner {
    log: LineLog,
    view: ViewState,
    accepting_output: bool,
}

/// Line log and view state behind one lock, so sequence numbers, the error
/// counter and the pin-to-bottom cursor move together on every append.
pub(crate) struct Transcript {
    inner: Mutex<Inner>,
    events: Sender<SessionEvent>,
}

impl Transcript {
    pub(crate) fn new(events: Sender<SessionEvent>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                log: LineLog::new(),
                view: ViewState::new(),
                accepting_output: true,
            }),
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn append(&self, text: impl Into<String>, is_error: bool) -> usize {
        let mut inner = self.lock();
        self.push_locked(&mut inner, text.into(), is_error)
    }

    /// Appends a line read from one of the child's streams. Returns `None`
    /// once output has been closed by a kill.
    pub(crate) fn append_output(&self, text: impl Into<String>, is_error: bool) -> Option<usize> {
        let mut inner = self.lock();
        if !inner.accepting_output {
            return None;
        }
        Some(self.push_locked(&mut inner, text.into(), is_error))
    }

    pub(crate) fn append_closing(&self, text: impl Into<String>) -> usize {
        let mut inner = self.lock();
        inner.accepting_output = false;
        self.push_locked(&mut inner, text.into(), true)
    }

    fn push_locked(&self, inner: &mut Inner, text: String, is_error: bool) -> usize {
        let was_at_bottom = inner.view.is_following();
        let seq = inner.log.append(text, is_error);
        let last_index = inner.log.sentinel_index();
        inner.view.on_append(last_index);
        // Published under the lock so subscribers see appends in sequence order.
        let _ = self.events.send(SessionEvent::Appended(Appended {
            seq,
            is_error,
            last_index,
            was_at_bottom,
        }));
        seq
    }

    pub(crate) fn set_cursor(&self, index: usize) -> ViewState {
        let mut inner = self.lock();
        let last = inner.log.sentinel_index();
        inner.view.set_cursor(index, last);
        inner.view
    }

    pub(crate) fn move_cursor(&self, delta: isize) -> ViewState {
        let mut inner = self.lock();
        let last = inner.log.sentinel_index();
        inner.view.move_by(delta, last);
        inner.view
    }

    pub(crate) fn follow_bottom(&self) -> ViewState {
        self.set_cursor(usize::MAX)
    }

    pub(crate) fn view(&self) -> ViewState {
        self.lock().view
    }

    pub(crate) fn read<R>(&self, f: impl FnOnce(&LineLog, &ViewState) -> R) -> R {
        let inner = self.lock();
        f(&inner.log, &inner.view)
    }

    pub(crate) fn texts(&self) -> Vec<String> {
        self.read(|log, _| log.texts().map(str::to_string).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use std::sync::Arc;

    #[test]
    fn append_publishes_change_with_previous_pin_state() {
        let (tx, rx) = unbounded();
        let transcript = Transcript::new(tx);

        transcript.append("one", false);
        transcript.set_cursor(0);
        transcript.append("two", true);

        let events: Vec<SessionEvent> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                SessionEvent::Appended(Appended {
                    seq: 1,
                    is_error: false,
                    last_index: 1,
                    was_at_bottom: true,
                }),
                SessionEvent::Appended(Appended {
                    seq: 2,
                    is_error: true,
                    last_index: 2,
                    was_at_bottom: false,
                }),
            ]
        );
        assert_eq!(transcript.view().cursor(), 0);
    }

    #[test]
    fn closing_drops_later_stream_output_but_not_synthetic_lines() {
        let (tx, _rx) = unbounded();
        let transcript = Transcript::new(tx);

        assert_eq!(transcript.append_output("before", false), Some(1));
        transcript.append_closing("killed");
        assert_eq!(transcript.append_output("after", false), None);
        assert_eq!(transcript.append_output("after err", true), None);
        transcript.append("kill failed", true);

        assert_eq!(transcript.texts(), vec!["before", "killed", "kill failed"]);
        assert_eq!(transcript.read(|log, _| log.error_count()), 2);
    }

    #[test]
    fn concurrent_appends_keep_sequence_gap_free() {
        let (tx, rx) = unbounded();
        let transcript = Arc::new(Transcript::new(tx));
        let per_thread = 500;

        let handles: Vec<_> = [false, true]
            .into_iter()
            .map(|is_error| {
                let transcript = Arc::clone(&transcript);
                std::thread::spawn(move || {
                    for i in 0..per_thread {
                        transcript.append_output(format!("{is_error}-{i}"), is_error);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("appender thread");
        }

        let total = per_thread * 2;
        transcript.read(|log, view| {
            let seqs: Vec<usize> = log.lines().iter().map(|l| l.seq).collect();
            assert_eq!(seqs, (1..=total).collect::<Vec<_>>());
            assert_eq!(log.error_count(), per_thread);
            assert!(view.is_following());
            assert_eq!(view.cursor(), total);
        });

        let published: Vec<usize> = rx
            .try_iter()
            .filter_map(|event| match event {
                SessionEvent::Appended(a) => Some(a.seq),
                _ => None,
            })
            .collect();
        assert_eq!(published, (1..=total).collect::<Vec<_>>());
    }

    #[test]
    fn each_stream_keeps_its_own_order() {
        let (tx, _rx) = unbounded();
        let transcript = Arc::new(Transcript::new(tx));

        let writers: Vec<_> = [false, true]
            .into_iter()
            .map(|is_error| {
                let transcript = Arc::clone(&transcript);
                std::thread::spawn(move || {
                    for i in 0..200 {
                        transcript.append_output(format!("{i}"), is_error);
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().expect("writer thread");
        }

        transcript.read(|log, _| {
            for is_error in [false, true] {
                let values: Vec<usize> = log
                    .lines()
                    .iter()
                    .filter(|l| l.is_error == is_error)
                    .map(|l| l.text.parse().expect("number"))
                    .collect();
                assert_eq!(values, (0..200).collect::<Vec<_>>());
            }
        });
    }

    #[test]
    fn paused_cursor_survives_concurrent_output() {
        let (tx, _rx) = unbounded();
        let transcript = Arc::new(Transcript::new(tx));
        for i in 0..10 {
            transcript.append(format!("{i}"), false);
        }
        transcript.set_cursor(4);

        let writer = {
            let transcript = Arc::clone(&transcript);
            std::thread::spawn(move || {
                for i in 0..100 {
                    transcript.append_output(format!("more {i}"), false);
                }
            })
        };
        writer.join().expect("writer thread");

        let view = transcript.view();
        assert_eq!(view.cursor(), 4);
        assert!(!view.is_following());
        transcript.read(|log, view| {
            assert_eq!(view.counter_label(log.len()), "5:110");
            assert_eq!(log.get(view.cursor()).map(|l| l.text.as_str()), Some("4"));
        });
    }

    #[test]
    fn follow_bottom_re_pins_to_sentinel() {
        let (tx, _rx) = unbounded();
        let transcript = Transcript::new(tx);
        transcript.append("a", false);
        transcript.append("b", false);
        transcript.set_cursor(0);
        let view = transcript.follow_bottom();
        assert!(view.is_following());
        assert_eq!(view.cursor(), 2);
        transcript.read(|log, view| {
            assert!(log.get(view.cursor()).is_none());
            assert_eq!(view.counter_label(log.len()), "2");
        });
    }
}

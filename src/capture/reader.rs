use std::io::{self, BufRead, BufReader, Read};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::Sender;
use tracing::{debug, info};

use super::session::Completion;
use super::Transcript;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StreamKind {
    Stdout,
    Stderr,
}

impl StreamKind {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Stdout => "stdout",
            StreamKind::Stderr => "stderr",
        }
    }

    pub(crate) fn is_error(&self) -> bool {
        matches!(self, StreamKind::Stderr)
    }

    fn completion(&self) -> Completion {
        match self {
            StreamKind::Stdout => Completion::StdoutClosed,
            StreamKind::Stderr => Completion::StderrClosed,
        }
    }
}

/// Lazy, finite sequence of newline-delimited chunks. A read error ends the
/// sequence like end-of-data; a trailing partial line is yielded either way.
pub(crate) struct LineChunks<R> {
    reader: R,
    buf: Vec<u8>,
    done: bool,
}

impl<R: BufRead> LineChunks<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for LineChunks<R> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.done {
            return None;
        }
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(_) => Some(decode_line(&self.buf)),
            Err(err) => {
                debug!(error = %err, "stream read failed, treating as end of stream");
                self.done = true;
                if self.buf.is_empty() {
                    None
                } else {
                    Some(decode_line(&self.buf))
                }
            }
        }
    }
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

pub(crate) fn drain_stream<R: Read>(kind: StreamKind, source: R, transcript: &Transcript) -> usize {
    let mut kept = 0usize;
    for line in LineChunks::new(BufReader::new(source)) {
        if transcript.append_output(line, kind.is_error()).is_some() {
            kept += 1;
        }
    }
    kept
}

pub(crate) fn spawn_reader<R>(
    kind: StreamKind,
    source: R,
    transcript: Arc<Transcript>,
    done: Sender<Completion>,
) -> io::Result<JoinHandle<()>>
where
    R: Read + Send + 'static,
{
    thread::Builder::new()
        .name(format!("buildcap-{}", kind.as_str()))
        .spawn(move || {
            let kept = drain_stream(kind, source, &transcript);
            info!(stream = kind.as_str(), lines = kept, "stream closed");
            let _ = done.send(kind.completion());
        })
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Line {
    pub(crate) seq: usize,
    pub(crate) text: String,
    pub(crate) is_error: bool,
}

#[derive(Debug, Default)]
pub(crate) struct LineLog {
    lines: Vec<Line>,
    error_count: usize,
}

impl LineLog {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&mut self, text: impl Into<String>, is_error: bool) -> usize {
        let seq = self.lines.len() + 1;
        self.lines.push(Line {
            seq,
            text: text.into(),
            is_error,
        });
        if is_error {
            self.error_count += 1;
        }
        seq
    }

    pub(crate) fn len(&self) -> usize {
        self.lines.len()
    }

    pub(crate) fn error_count(&self) -> usize {
        self.error_count
    }

    pub(crate) fn sentinel_index(&self) -> usize {
        self.lines.len()
    }

    pub(crate) fn get(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    pub(crate) fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub(crate) fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.lines.iter().map(|line| line.text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_start_at_one_without_gaps() {
        let mut log = LineLog::new();
        assert_eq!(log.append("a", false), 1);
        assert_eq!(log.append("b", true), 2);
        assert_eq!(log.append("c", false), 3);

        let seqs: Vec<usize> = log.lines().iter().map(|l| l.seq).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
        assert_eq!(log.sentinel_index(), 3);
    }

    #[test]
    fn only_error_lines_are_counted() {
        let mut log = LineLog::new();
        log.append("ok", false);
        log.append("bad", true);
        log.append("worse", true);
        assert_eq!(log.error_count(), 2);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn empty_log_has_sentinel_at_zero() {
        let log = LineLog::new();
        assert_eq!(log.len(), 0);
        assert_eq!(log.sentinel_index(), 0);
        assert!(log.get(0).is_none());
    }
}

/// A flushed slice of buffered stream text.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferedChunk {
    /// Text accumulated since the previous flush.
    pub delta: String,
    /// Everything flushed so far, including this delta.
    pub text: String,
}

/// Accumulator that batches streamed text before emitting updates.
///
/// Flushing is dual-trigger: the pending window is ready once it reaches
/// the size threshold OR contains any break marker, whichever comes first.
/// `finalize` drains whatever remains at stream end regardless of either.
pub struct ChunkBuffer {
    threshold: usize,
    break_markers: Vec<String>,
    pending: String,
    full: String,
}

impl ChunkBuffer {
    pub fn new(threshold: usize, break_markers: &[&str]) -> Self {
        Self {
            threshold,
            break_markers: break_markers.iter().map(|m| m.to_string()).collect(),
            pending: String::new(),
            full: String::new(),
        }
    }

    pub fn append(&mut self, chunk: &str) {
        self.pending.push_str(chunk);
    }

    pub fn should_flush(&self) -> bool {
        if self.pending.is_empty() {
            return false;
        }
        self.pending.len() >= self.threshold
            || self.break_markers.iter().any(|m| self.pending.contains(m))
    }

    /// Drain the pending window. None if nothing is pending.
    pub fn flush(&mut self) -> Option<BufferedChunk> {
        if self.pending.is_empty() {
            return None;
        }
        let delta = std::mem::take(&mut self.pending);
        self.full.push_str(&delta);
        Some(BufferedChunk {
            delta,
            text: self.full.clone(),
        })
    }

    /// Final flush at stream end, ignoring threshold and markers.
    pub fn finalize(&mut self) -> Option<BufferedChunk> {
        self.flush()
    }

    /// Everything flushed so far.
    pub fn text(&self) -> &str {
        &self.full
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_flush_below_threshold_without_marker() {
        let mut buffer = ChunkBuffer::new(200, &["\n"]);
        buffer.append("short chunk");
        assert!(!buffer.should_flush());
    }

    #[test]
    fn marker_triggers_flush_regardless_of_size() {
        let mut buffer = ChunkBuffer::new(200, &["\n"]);
        buffer.append("a line\n");
        assert!(buffer.should_flush());

        let flushed = buffer.flush().unwrap();
        assert_eq!(flushed.delta, "a line\n");
        assert_eq!(flushed.text, "a line\n");
    }

    #[test]
    fn size_threshold_triggers_flush_without_marker() {
        let mut buffer = ChunkBuffer::new(10, &["\n\n"]);
        buffer.append("0123456789abc");
        assert!(buffer.should_flush());
    }

    #[test]
    fn double_newline_marker_ignores_single_newline() {
        let mut buffer = ChunkBuffer::new(200, &["\n\n"]);
        buffer.append("reasoning step\n");
        assert!(!buffer.should_flush());

        buffer.append("\nmore");
        assert!(buffer.should_flush());
    }

    #[test]
    fn finalize_drains_pending_below_threshold() {
        let mut buffer = ChunkBuffer::new(200, &["\n"]);
        buffer.append("tail");
        assert!(!buffer.should_flush());

        let last = buffer.finalize().unwrap();
        assert_eq!(last.delta, "tail");
        assert!(buffer.finalize().is_none());
    }

    #[test]
    fn deltas_concatenate_to_full_text() {
        let mut buffer = ChunkBuffer::new(4, &[]);
        let mut rebuilt = String::new();

        for chunk in ["alpha ", "beta ", "gamma"] {
            buffer.append(chunk);
            if buffer.should_flush() {
                rebuilt.push_str(&buffer.flush().unwrap().delta);
            }
        }
        if let Some(last) = buffer.finalize() {
            rebuilt.push_str(&last.delta);
        }

        assert_eq!(rebuilt, "alpha beta gamma");
        assert_eq!(buffer.text(), "alpha beta gamma");
    }
}

//! Window buffer: accumulates generator text and emits fixed-size windows.
//!
//! Slicing is over code points, not bytes or tokens, and each buffer is
//! owned exclusively by one request's task — no locking.

/// Accumulates streamed text and detaches `buffer_size`-character windows.
///
/// One instance per in-flight gateway request; not `Send`-shared.
pub struct WindowBuffer {
    buffer_size: usize,
    pending: String,
}

impl WindowBuffer {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            buffer_size,
            pending: String::new(),
        }
    }

    /// Append `s` to the pending buffer and detach every full `buffer_size`
    /// window now available, in order. A single call can yield more than one
    /// window (e.g. a delta twice the window size arriving in one line), and
    /// yields none if the buffer is still below threshold.
    pub fn add(&mut self, s: &str) -> Vec<String> {
        self.pending.push_str(s);
        let mut windows = Vec::new();
        while self.pending.chars().count() >= self.buffer_size {
            let split_at = self
                .pending
                .char_indices()
                .nth(self.buffer_size)
                .map(|(i, _)| i)
                .unwrap_or(self.pending.len());
            let window: String = self.pending.drain(..split_at).collect();
            windows.push(window);
        }
        windows
    }

    /// Return and clear whatever is pending. May return an empty string; the
    /// caller must not emit anything in that case.
    pub fn flush(&mut self) -> String {
        std::mem::take(&mut self.pending)
    }
}

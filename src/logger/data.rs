/*!
 * Log Data
 *
 * Buffered message list owned by the logger thread. Every method is meant to
 * run on that thread, either from the logger's own jobs or through a bounded
 * invocation.
 */

use crate::callbacks::CallbackRegistry;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Buffered log lines plus the sink they are flushed into
pub struct LogData {
    messages: VecDeque<String>,
    sink: Box<dyn Write + Send>,
    flush_time: Arc<CallbackRegistry<Duration>>,
    flushed_lines: u64,
}

impl LogData {
    pub fn new<W>(sink: W, flush_time: Arc<CallbackRegistry<Duration>>) -> Self
    where
        W: Write + Send + 'static,
    {
        Self {
            messages: VecDeque::new(),
            sink: Box::new(sink),
            flush_time,
            flushed_lines: 0,
        }
    }

    /// Buffer one line
    pub fn write(&mut self, msg: impl Into<String>) -> bool {
        self.messages.push_back(msg.into());
        true
    }

    /// Write every buffered line to the sink
    ///
    /// On success notifies `flush_time` subscribers with the measured
    /// duration. Lines that could not be written stay buffered.
    pub fn flush(&mut self) -> bool {
        let start = Instant::now();

        let result = self.drain_into_sink();
        let duration = start.elapsed();

        match result {
            Ok(count) => {
                self.flushed_lines += count;
                debug!(lines = count, duration_us = duration.as_micros() as u64, "Log data flushed");
                self.flush_time.notify(&duration);
                true
            }
            Err(e) => {
                warn!(error = %e, pending = self.messages.len(), "Log flush failed");
                false
            }
        }
    }

    fn drain_into_sink(&mut self) -> io::Result<u64> {
        let mut count = 0;
        while let Some(line) = self.messages.front() {
            writeln!(self.sink, "{line}")?;
            self.messages.pop_front();
            count += 1;
        }
        self.sink.flush()?;
        Ok(count)
    }

    /// Drop buffered lines without writing them
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().map(String::as_str)
    }

    pub fn flushed_lines(&self) -> u64 {
        self.flushed_lines
    }

    /// Subscription point for flush durations
    pub fn flush_time(&self) -> &Arc<CallbackRegistry<Duration>> {
        &self.flush_time
    }
}

/// In-memory sink whose contents stay readable from other threads
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.buffer.lock())
            .lines()
            .map(String::from)
            .collect()
    }
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk gone"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_flush_moves_lines_to_sink() {
        let sink = MemorySink::new();
        let registry = Arc::new(CallbackRegistry::new());
        let mut data = LogData::new(sink.clone(), registry.clone());

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        registry.subscribe(move |d: &Duration| seen_clone.lock().push(*d));

        assert!(data.write("first"));
        assert!(data.write(String::from("second")));
        assert_eq!(data.messages().collect::<Vec<_>>(), vec!["first", "second"]);

        assert!(data.flush());
        assert!(data.is_empty());
        assert_eq!(data.flushed_lines(), 2);
        assert_eq!(sink.lines(), vec!["first", "second"]);
        assert_eq!(seen.lock().len(), 1);
    }

    #[test]
    fn test_clear_discards_lines() {
        let sink = MemorySink::new();
        let mut data = LogData::new(sink.clone(), Arc::new(CallbackRegistry::new()));
        data.write("dropped");
        data.clear();
        assert!(data.flush());
        assert!(sink.lines().is_empty());
    }

    #[test]
    fn test_failed_flush_keeps_lines_and_skips_notification() {
        let registry = Arc::new(CallbackRegistry::<Duration>::new());
        let notified = Arc::new(Mutex::new(false));
        let flag = notified.clone();
        registry.subscribe(move |_| *flag.lock() = true);

        let mut data = LogData::new(BrokenSink, registry.clone());
        data.write("kept");
        assert!(!data.flush());
        assert_eq!(data.len(), 1);
        assert!(!*notified.lock());
        assert_eq!(data.flush_time().count(), 1);
    }
}

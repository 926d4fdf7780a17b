/*!
 * Logger Subsystem
 *
 * A subsystem that owns its thread: writes are posted onto the logger thread,
 * buffered in `LogData`, and flushed by a deferred one-shot timer on that same
 * thread. Progress is reported through a single-slot status callback.
 */

use super::config::LoggerConfig;
use super::data::LogData;
use crate::callbacks::CallbackRegistry;
use crate::core::errors::{LoggerError, LoggerResult, ThreadResult};
use crate::thread::{Job, OwnedThread};
use crate::timer::OneShotTimer;
use parking_lot::Mutex;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Status callback; runs on the logger thread
pub type StatusCallback = Arc<dyn Fn(&str) + Send + Sync>;

pub const WRITE_SUCCESS: &str = "Write success!";
pub const WRITE_FAILURE: &str = "Write failure!";
pub const FLUSH_SUCCESS: &str = "Flush success!";
pub const FLUSH_FAILURE: &str = "Flush failure!";

struct LoggerInner {
    config: LoggerConfig,
    thread: OwnedThread,
    data: Arc<Mutex<LogData>>,
    flush_time: Arc<CallbackRegistry<Duration>>,
    flush_timer: OneShotTimer,
    status: Arc<Mutex<Option<StatusCallback>>>,
}

/// Handle to the logger subsystem
#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

impl Logger {
    /// Start a logger whose sink follows `config.path`
    pub fn open(config: LoggerConfig) -> LoggerResult<Self> {
        match config.path.clone() {
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .map_err(|e| LoggerError::SinkOpenFailed(format!("{}: {}", path.display(), e)))?;
                Ok(Self::start(config, file)?)
            }
            None => Ok(Self::start(config, io::sink())?),
        }
    }

    /// Start a logger flushing into `sink`
    pub fn start<W>(config: LoggerConfig, sink: W) -> ThreadResult<Self>
    where
        W: Write + Send + 'static,
    {
        let thread = OwnedThread::new(config.thread_name.clone());
        thread.create_thread()?;

        let flush_time = Arc::new(CallbackRegistry::new());
        let data = Arc::new(Mutex::new(LogData::new(sink, flush_time.clone())));
        let status: Arc<Mutex<Option<StatusCallback>>> = Arc::new(Mutex::new(None));

        let flush_timer = OneShotTimer::new(format!("{}-flush", config.thread_name), &thread);
        {
            let data = data.clone();
            let status = status.clone();
            flush_timer.set_callback(move || {
                let flushed = data.lock().flush();
                report(&status, if flushed { FLUSH_SUCCESS } else { FLUSH_FAILURE });
            });
        }

        info!(thread = %config.thread_name, "Logger started");
        Ok(Self {
            inner: Arc::new(LoggerInner {
                config,
                thread,
                data,
                flush_time,
                flush_timer,
                status,
            }),
        })
    }

    /// Queue a line for the logger thread; returns once posted
    ///
    /// The line is buffered on the logger thread, which reports
    /// `"Write success!"` and schedules a deferred flush.
    pub fn write(&self, msg: impl Into<String>) -> ThreadResult<()> {
        let msg = msg.into();
        let inner = self.inner.clone();
        self.inner
            .thread
            .post_job(Job::new("logger-write", move || inner.handle_write(msg)))
    }

    /// Install the status callback, replacing any previous one
    pub fn set_status_callback<F>(&self, callback: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        *self.inner.status.lock() = Some(Arc::new(callback));
    }

    pub fn clear_status_callback(&self) {
        *self.inner.status.lock() = None;
    }

    /// Buffered data; only touch it on the logger thread
    pub fn data(&self) -> Arc<Mutex<LogData>> {
        self.inner.data.clone()
    }

    /// Subscription point for flush durations, notified on the logger thread
    pub fn flush_time(&self) -> &Arc<CallbackRegistry<Duration>> {
        &self.inner.flush_time
    }

    /// The logger's owning thread, target for bounded invocations
    pub fn thread(&self) -> &OwnedThread {
        &self.inner.thread
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.inner.config
    }

    /// Flush what is buffered, then stop the logger thread
    pub fn shutdown(&self) -> ThreadResult<()> {
        self.inner.flush_timer.stop();
        self.inner.flush_timer.clear_callback();

        let data = self.inner.data.clone();
        if self
            .inner
            .thread
            .post_job(Job::new("logger-final-flush", move || {
                data.lock().flush();
            }))
            .is_err()
        {
            warn!(thread = %self.inner.config.thread_name, "Logger already stopped");
        }

        self.inner.thread.shutdown()?;
        // A write drained during shutdown may have re-armed the flush timer
        self.inner.flush_timer.stop();
        Ok(())
    }
}

impl LoggerInner {
    fn handle_write(&self, msg: String) {
        let written = self.data.lock().write(msg);
        report(&self.status, if written { WRITE_SUCCESS } else { WRITE_FAILURE });

        if written {
            if let Err(e) = self.flush_timer.start(self.config.flush_delay) {
                warn!(error = %e, "Could not schedule deferred flush");
            }
        }
    }
}

fn report(status: &Mutex<Option<StatusCallback>>, message: &str) {
    // Clone out so the callback may replace itself
    let callback = status.lock().clone();
    if let Some(callback) = callback {
        callback(message);
    }
}

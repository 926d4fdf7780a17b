/*!
 * Job Messages
 * Unit of work carried over an owned thread's queue
 */

use std::any::Any;
use std::time::Instant;

type Task = Box<dyn FnOnce() + Send + 'static>;

/// A labelled closure queued for execution on an owned thread
pub struct Job {
    label: &'static str,
    posted_at: Instant,
    task: Task,
}

impl Job {
    pub fn new<F>(label: &'static str, task: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            label,
            posted_at: Instant::now(),
            task: Box::new(task),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// When the job entered the queue
    pub fn posted_at(&self) -> Instant {
        self.posted_at
    }

    pub fn run(self) {
        (self.task)()
    }
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("label", &self.label)
            .field("posted_at", &self.posted_at)
            .finish_non_exhaustive()
    }
}

/// Best-effort text of a caught panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

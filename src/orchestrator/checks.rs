/*!
 * Check Batches
 *
 * The collaborator the orchestrator runs: anything that can run all of its
 * checks and reduce them to a status code (0 = all passed).
 *
 * `CheckBatch` is the stock implementation: named checks run in order, each
 * wrapped by optional setup/teardown hooks, each producing a pass/fail
 * outcome. A panicking check counts as failed; the batch keeps going.
 */

use crate::core::types::StatusCode;
use crate::monitoring::span_check;
use crate::thread::panic_message;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use tracing::{info, warn};

/// A batch of checks reduced to one status code
pub trait CheckSuite: Send + 'static {
    /// Run every check; 0 means all passed
    fn run_all(&mut self) -> StatusCode;

    /// Per-check outcomes of the last run, if the suite keeps them
    fn report(&self) -> Option<CheckReport> {
        None
    }
}

impl<F> CheckSuite for F
where
    F: FnMut() -> StatusCode + Send + 'static,
{
    fn run_all(&mut self) -> StatusCode {
        self()
    }
}

/// Failure collector handed to each check
#[derive(Debug, Default)]
pub struct CheckContext {
    failures: Vec<String>,
}

impl CheckContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure unless `condition` holds
    pub fn check(&mut self, condition: bool, what: &str) -> bool {
        if !condition {
            self.failures.push(format!("expected {what}"));
        }
        condition
    }

    pub fn check_eq<T>(&mut self, expected: T, actual: T, what: &str) -> bool
    where
        T: PartialEq + Debug,
    {
        let equal = expected == actual;
        if !equal {
            self.failures
                .push(format!("{what}: expected {expected:?}, got {actual:?}"));
        }
        equal
    }

    /// Unwrap a bounded result, recording a failure when it is absent
    pub fn check_some<T>(&mut self, value: Option<T>, what: &str) -> Option<T> {
        if value.is_none() {
            self.failures.push(format!("{what}: no value (timed out)"));
        }
        value
    }

    pub fn fail(&mut self, reason: impl Into<String>) {
        self.failures.push(reason.into());
    }

    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures(&self) -> &[String] {
        &self.failures
    }
}

/// Outcome of one check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub name: String,
    pub passed: bool,
    pub failures: Vec<String>,
    pub duration_ms: u64,
}

/// Outcomes of one batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckReport {
    pub suite: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub outcomes: Vec<CheckOutcome>,
}

impl CheckReport {
    /// Status code for this report: the number of failed checks
    pub fn status(&self) -> StatusCode {
        self.failed.min(StatusCode::MAX as usize) as StatusCode
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

type CheckFn = Box<dyn FnMut(&mut CheckContext) + Send>;
type HookFn = Box<dyn FnMut() + Send>;

struct NamedCheck {
    name: String,
    body: CheckFn,
}

/// Ordered, named checks with shared setup/teardown
pub struct CheckBatch {
    name: String,
    checks: Vec<NamedCheck>,
    setup: Option<HookFn>,
    teardown: Option<HookFn>,
    last_report: Option<CheckReport>,
}

impl CheckBatch {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            checks: Vec::new(),
            setup: None,
            teardown: None,
            last_report: None,
        }
    }

    /// Append a check
    pub fn with_check<F>(mut self, name: impl Into<String>, body: F) -> Self
    where
        F: FnMut(&mut CheckContext) + Send + 'static,
    {
        self.add_check(name, body);
        self
    }

    pub fn add_check<F>(&mut self, name: impl Into<String>, body: F)
    where
        F: FnMut(&mut CheckContext) + Send + 'static,
    {
        self.checks.push(NamedCheck {
            name: name.into(),
            body: Box::new(body),
        });
    }

    /// Hook run before every check
    pub fn with_setup<F>(mut self, hook: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        self.setup = Some(Box::new(hook));
        self
    }

    /// Hook run after every check, even a failed or panicking one
    pub fn with_teardown<F>(mut self, hook: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        self.teardown = Some(Box::new(hook));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    fn run_one(&mut self, index: usize) -> CheckOutcome {
        let name = self.checks[index].name.clone();
        let span = span_check(&name);
        let _entered = span.enter();
        let start = Instant::now();

        let mut ctx = CheckContext::new();

        // A panicking setup fails the check without running its body
        let setup_panic = self.setup.as_mut().and_then(|setup| caught_panic(|| setup()));
        match setup_panic {
            Some(message) => ctx.fail(format!("setup panicked: {message}")),
            None => {
                let body = &mut self.checks[index].body;
                if let Some(message) = caught_panic(|| body(&mut ctx)) {
                    ctx.fail(format!("panicked: {message}"));
                }
            }
        }

        let teardown_panic = self
            .teardown
            .as_mut()
            .and_then(|teardown| caught_panic(|| teardown()));
        if let Some(message) = teardown_panic {
            ctx.fail(format!("teardown panicked: {message}"));
        }

        let passed = ctx.passed();
        span.record_result(passed);
        if passed {
            info!(check = %name, "Check passed");
        } else {
            for failure in ctx.failures() {
                warn!(check = %name, failure = %failure, "Check failed");
            }
        }

        CheckOutcome {
            name,
            passed,
            failures: ctx.failures,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }
}

/// Run `f`, returning the panic message if it panicked
fn caught_panic<F: FnOnce()>(f: F) -> Option<String> {
    panic::catch_unwind(AssertUnwindSafe(f))
        .err()
        .map(|payload| panic_message(payload.as_ref()))
}

impl CheckSuite for CheckBatch {
    fn run_all(&mut self) -> StatusCode {
        let outcomes: Vec<CheckOutcome> = (0..self.checks.len()).map(|i| self.run_one(i)).collect();
        let passed = outcomes.iter().filter(|o| o.passed).count();

        let report = CheckReport {
            suite: self.name.clone(),
            total: outcomes.len(),
            passed,
            failed: outcomes.len() - passed,
            outcomes,
        };
        let status = report.status();

        info!(
            suite = %self.name,
            total = report.total,
            passed = report.passed,
            failed = report.failed,
            "Check batch finished"
        );
        self.last_report = Some(report);
        status
    }

    fn report(&self) -> Option<CheckReport> {
        self.last_report.clone()
    }
}

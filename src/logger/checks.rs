/*!
 * Logger Integration Checks
 *
 * Checks that drive the logger from a foreign thread: public writes observed
 * through the status callback, and direct `LogData` operations executed on
 * the logger thread through bounded invocations.
 *
 * Handlers run on the logger thread; everything they share with the checks
 * sits behind `CheckState`'s locks.
 */

use super::subsystem::{Logger, FLUSH_SUCCESS, WRITE_SUCCESS};
use crate::core::limits::{
    DEFAULT_INVOKE_TIMEOUT, FLUSH_WAIT_TIMEOUT, MAX_FLUSH_DURATION, SHORT_INVOKE_TIMEOUT,
    STATUS_WAIT_TIMEOUT,
};
use crate::core::sync::Signal;
use crate::invoke::{invoke, invoke_with, BoundedInvoker};
use crate::orchestrator::checks::{CheckBatch, CheckContext};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

const FLUSH_TIMER_STRING: &str = "Flush Timer String";

/// State shared between the checks and callbacks running on the logger thread
#[derive(Default)]
struct CheckState {
    statuses: Mutex<Vec<String>>,
    flush_duration: Mutex<Option<Duration>>,
    signal: Signal,
}

/// Build the logger check batch
pub fn logger_checks(logger: &Logger) -> CheckBatch {
    let state = Arc::new(CheckState::default());

    let setup = {
        let logger = logger.clone();
        let state = state.clone();
        move || {
            let state = state.clone();
            logger.set_status_callback(move |status| {
                state.statuses.lock().push(status.to_string());
                state.signal.raise();
            });
        }
    };

    let teardown = {
        let logger = logger.clone();
        let state = state.clone();
        move || {
            logger.clear_status_callback();
            state.statuses.lock().clear();
            state.signal.reset();
        }
    };

    let write = {
        let logger = logger.clone();
        let state = state.clone();
        move |ctx: &mut CheckContext| check_write(ctx, &logger, &state)
    };

    let flush = {
        let logger = logger.clone();
        move |ctx: &mut CheckContext| check_flush(ctx, &logger)
    };

    let flush_time = {
        let logger = logger.clone();
        let state = state.clone();
        move |ctx: &mut CheckContext| check_flush_time(ctx, &logger, &state, 100)
    };

    let flush_time_simplified = {
        let logger = logger.clone();
        let state = state.clone();
        move |ctx: &mut CheckContext| check_flush_time_simplified(ctx, &logger, &state, 100)
    };

    let flush_time_closure = {
        let logger = logger.clone();
        move |ctx: &mut CheckContext| check_flush_time_with_closure(ctx, &logger, 10)
    };

    CheckBatch::new("Logger_IT")
        .with_setup(setup)
        .with_teardown(teardown)
        .with_check("write", write)
        .with_check("flush", flush)
        .with_check("flush_time", flush_time)
        .with_check("flush_time_simplified", flush_time_simplified)
        .with_check("flush_time_with_closure", flush_time_closure)
}

fn check_write(ctx: &mut CheckContext, logger: &Logger, state: &CheckState) {
    ctx.check(logger.write("LoggerTest, Write").is_ok(), "write to be posted");

    // First notification: the write itself
    ctx.check(state.signal.wait_for(STATUS_WAIT_TIMEOUT), "write status callback");
    // Second notification: the deferred flush
    ctx.check(state.signal.wait_for(FLUSH_WAIT_TIMEOUT), "flush status callback");

    let statuses = state.statuses.lock();
    ctx.check_eq(2, statuses.len(), "status callback count");
    if statuses.len() >= 2 {
        ctx.check_eq(WRITE_SUCCESS, statuses[0].as_str(), "first status");
        ctx.check_eq(FLUSH_SUCCESS, statuses[1].as_str(), "second status");
    }
}

fn check_flush(ctx: &mut CheckContext, logger: &Logger) {
    let invoker = BoundedInvoker::new(logger.thread(), DEFAULT_INVOKE_TIMEOUT);
    let data = logger.data();

    let flushed = invoker.invoke(move || data.lock().flush());
    if let Some(flushed) = ctx.check_some(flushed, "LogData::flush on logger thread") {
        ctx.check(flushed, "flush to succeed");
    }
}

fn check_flush_time(ctx: &mut CheckContext, logger: &Logger, state: &Arc<CheckState>, lines: usize) {
    *state.flush_duration.lock() = None;

    let handler_state = state.clone();
    let subscription = logger.flush_time().subscribe(move |duration: &Duration| {
        *handler_state.flush_duration.lock() = Some(*duration);
    });

    let short = BoundedInvoker::new(logger.thread(), SHORT_INVOKE_TIMEOUT);
    let data = logger.data();

    let cleared = short.invoke_unit({
        let data = data.clone();
        move || data.lock().clear()
    });
    ctx.check_some(cleared, "clear on logger thread");

    for _ in 0..lines {
        let data = data.clone();
        let written = short.invoke_with(move |line: &'static str| data.lock().write(line), FLUSH_TIMER_STRING);
        if let Some(written) = ctx.check_some(written, "LogData::write on logger thread") {
            ctx.check(written, "write to succeed");
        }
    }

    let flushed = BoundedInvoker::new(logger.thread(), DEFAULT_INVOKE_TIMEOUT).invoke({
        let data = data.clone();
        move || data.lock().flush()
    });
    if let Some(flushed) = ctx.check_some(flushed, "LogData::flush on logger thread") {
        ctx.check(flushed, "flush to succeed");
    }

    let duration = *state.flush_duration.lock();
    check_duration(ctx, duration);

    logger.flush_time().unsubscribe(subscription);
}

/// Same as `check_flush_time`, through the free-function invocation form
fn check_flush_time_simplified(
    ctx: &mut CheckContext,
    logger: &Logger,
    state: &Arc<CheckState>,
    lines: usize,
) {
    *state.flush_duration.lock() = None;

    let handler_state = state.clone();
    let subscription = logger.flush_time().subscribe(move |duration: &Duration| {
        *handler_state.flush_duration.lock() = Some(*duration);
    });

    let target = logger.thread();
    let data = logger.data();

    let cleared = invoke(target, SHORT_INVOKE_TIMEOUT, {
        let data = data.clone();
        move || data.lock().clear()
    });
    ctx.check_some(cleared, "clear on logger thread");

    for _ in 0..lines {
        let data = data.clone();
        let written = invoke_with(
            target,
            SHORT_INVOKE_TIMEOUT,
            move |line: &'static str| data.lock().write(line),
            FLUSH_TIMER_STRING,
        );
        if let Some(written) = ctx.check_some(written, "LogData::write on logger thread") {
            ctx.check(written, "write to succeed");
        }
    }

    let flushed = invoke(target, DEFAULT_INVOKE_TIMEOUT, move || data.lock().flush());
    if let Some(flushed) = ctx.check_some(flushed, "LogData::flush on logger thread") {
        ctx.check(flushed, "flush to succeed");
    }

    let duration = *state.flush_duration.lock();
    check_duration(ctx, duration);

    logger.flush_time().unsubscribe(subscription);
}

fn check_flush_time_with_closure(ctx: &mut CheckContext, logger: &Logger, lines: usize) {
    let observed: Arc<Mutex<Option<Duration>>> = Arc::new(Mutex::new(None));

    let sink = observed.clone();
    let subscription = logger
        .flush_time()
        .subscribe(move |duration: &Duration| *sink.lock() = Some(*duration));

    let data = logger.data();
    let short = BoundedInvoker::new(logger.thread(), SHORT_INVOKE_TIMEOUT);

    // Only value-carrying results are checked here
    short.invoke_unit({
        let data = data.clone();
        move || data.lock().clear()
    });
    for _ in 0..lines {
        let data = data.clone();
        if let Some(written) = short.invoke(move || data.lock().write(FLUSH_TIMER_STRING)) {
            ctx.check(written, "write to succeed");
        }
    }
    let _ = BoundedInvoker::new(logger.thread(), DEFAULT_INVOKE_TIMEOUT).invoke(move || data.lock().flush());

    let duration = *observed.lock();
    check_duration(ctx, duration);

    logger.flush_time().unsubscribe(subscription);
}

fn check_duration(ctx: &mut CheckContext, duration: Option<Duration>) {
    match duration {
        Some(duration) => {
            ctx.check(
                duration <= MAX_FLUSH_DURATION,
                &format!("flush within {MAX_FLUSH_DURATION:?}, took {duration:?}"),
            );
        }
        None => ctx.fail("flush duration was never reported"),
    }
}

/*!
 * Harness Limits and Constants
 *
 * Centralized location for delays, timeouts and thresholds used across
 * the threads, timers and invocations of the harness.
 */

use std::time::Duration;

// =============================================================================
// ORCHESTRATOR
// =============================================================================

/// Delay between orchestrator start and the check batch (500ms)
/// Gives subsystem threads time to come up before they are exercised
pub const DEFAULT_STARTUP_DELAY: Duration = Duration::from_millis(500);

/// Name of the orchestrator's owned thread
pub const ORCHESTRATOR_THREAD_NAME: &str = "IntegrationTestThread";

/// Status recorded when the suite itself panics
pub const SUITE_PANICKED: i32 = -1;

// =============================================================================
// INVOCATION
// =============================================================================

/// Default bounded invocation timeout (100ms)
pub const DEFAULT_INVOKE_TIMEOUT: Duration = Duration::from_millis(100);

/// Short invocation timeout for cheap operations (50ms)
pub const SHORT_INVOKE_TIMEOUT: Duration = Duration::from_millis(50);

/// Invocations slower than this are logged as warnings (10ms)
pub const SLOW_INVOCATION_THRESHOLD: Duration = Duration::from_millis(10);

// =============================================================================
// LOGGER SUBSYSTEM
// =============================================================================

/// Delay between a write and the deferred flush it schedules (100ms)
pub const DEFAULT_FLUSH_DELAY: Duration = Duration::from_millis(100);

/// Name of the logger's owned thread
pub const LOGGER_THREAD_NAME: &str = "LoggerThread";

/// Upper bound for a flush of buffered lines to count as fast (10ms)
pub const MAX_FLUSH_DURATION: Duration = Duration::from_millis(10);

/// Wait for the first status notification after a write (500ms)
pub const STATUS_WAIT_TIMEOUT: Duration = Duration::from_millis(500);

/// Wait for the deferred flush notification after a write (2s)
pub const FLUSH_WAIT_TIMEOUT: Duration = Duration::from_secs(2);

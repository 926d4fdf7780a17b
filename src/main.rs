/*!
 * Integration Runner - Main Entry Point
 *
 * Starts the logger subsystem and the process-wide orchestrator, lets the
 * orchestrator run the logger checks after its startup delay, then exits
 * with the aggregate status.
 */

use miette::IntoDiagnostic;
use std::time::Duration;
use tracing::{error, info};

use crossthread_harness::orchestrator::global;
use crossthread_harness::{init_tracing, logger_checks, Logger, LoggerConfig, OrchestratorConfig};

/// Upper bound on the whole batch, startup delay included
const RUN_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors surface as miette reports, with each diagnostic's code and help
fn main() -> miette::Result<()> {
    // Initialize structured tracing
    init_tracing();

    info!("Integration runner starting...");

    let logger_config = LoggerConfig::from_env();
    info!(path = ?logger_config.path, "Starting logger subsystem");
    let logger = Logger::open(logger_config)?;

    let orchestrator_config = OrchestratorConfig::from_env();
    info!(
        delay_ms = orchestrator_config.startup_delay.as_millis() as u64,
        "Installing orchestrator"
    );
    let orchestrator = global::init(orchestrator_config, logger_checks(&logger))?;

    let status = match orchestrator.wait_for_completion(RUN_TIMEOUT) {
        Some(status) => status,
        None => {
            error!(timeout_s = RUN_TIMEOUT.as_secs(), "Check batch did not complete");
            -1
        }
    };

    if let Some(report) = orchestrator.report() {
        println!("{}", report.to_json().into_diagnostic()?);
    }
    println!("RUN_ALL() return value: {status}");

    // Orchestrator first: its batch drives the logger
    global::shutdown()?;
    logger.shutdown()?;

    info!(status, "Integration runner finished");
    std::process::exit(status);
}

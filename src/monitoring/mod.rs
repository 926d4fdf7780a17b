/*!
 * Monitoring Module
 * Structured tracing for the harness
 */

pub mod tracer;

pub use tracer::{
    generate_trace_id, init_tracing, span_check, span_invocation, CheckSpan, InvocationSpan,
};

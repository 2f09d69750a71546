/*!
 * Monitoring Module
 * Structured logging initialization
 */

mod tracer;

pub use tracer::{init_tracing, init_tracing_with_default};

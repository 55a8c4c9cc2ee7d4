//! Tracing extensions for crack insertion operations.
//!
//! Integrates with the `tracing` ecosystem. Enable output by installing a
//! subscriber in the host application:
//!
//! ```rust,ignore
//! use tracing_subscriber::{fmt, prelude::*, EnvFilter};
//!
//! tracing_subscriber::registry()
//!     .with(fmt::layer())
//!     .with(EnvFilter::from_default_env())
//!     .init();
//!
//! // Set RUST_LOG=mesh_crack=debug for detailed output.
//! ```
//!
//! # Log Levels
//!
//! - **WARN**: suspicious but recoverable topology (zone flips)
//! - **INFO**: operation summaries, timing, heuristic triggers
//! - **DEBUG**: intermediate state (sub-element counts, seed choices)

use std::time::Instant;

use tracing::{debug, info, Span};

use crate::types::Mesh;

/// A performance timer that logs duration on drop.
///
/// # Example
///
/// ```rust,ignore
/// use mesh_crack::tracing_ext::OperationTimer;
///
/// fn expensive_operation() {
///     let _timer = OperationTimer::new("expensive_operation");
///     // ... do work ...
/// } // Timer logs duration when dropped
/// ```
pub struct OperationTimer {
    name: &'static str,
    start: Instant,
    span: Span,
}

impl OperationTimer {
    /// Create a new operation timer.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!("crack_operation", operation = name);
        debug!(target: "mesh_crack::timing", operation = name, "Starting operation");
        Self {
            name,
            start: Instant::now(),
            span,
        }
    }

    /// Create a timer with mesh size context fields.
    pub fn with_context(name: &'static str, cell_count: usize, node_count: usize) -> Self {
        let span = tracing::info_span!(
            "crack_operation",
            operation = name,
            cells = cell_count,
            nodes = node_count
        );
        debug!(
            target: "mesh_crack::timing",
            operation = name,
            cells = cell_count,
            nodes = node_count,
            "Starting operation"
        );
        Self {
            name,
            start: Instant::now(),
            span,
        }
    }

    /// Get the elapsed time.
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Get the span for this timer.
    pub fn span(&self) -> &Span {
        &self.span
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        let elapsed_ms = self.elapsed_ms();
        info!(
            target: "mesh_crack::timing",
            operation = self.name,
            elapsed_ms = format!("{:.2}", elapsed_ms),
            "Operation completed"
        );
    }
}

/// Log mesh statistics at debug level.
pub fn log_mesh_stats(mesh: &Mesh, context: &str) {
    debug!(
        target: "mesh_crack::mesh_state",
        context = context,
        nodes = mesh.node_count(),
        cells = mesh.cell_count(),
        dimension = mesh.dimension().map(|d| d as i8).unwrap_or(-1),
        "Mesh state"
    );
}

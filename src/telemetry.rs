//! Progress rendering and tracing setup.
//!
//! Rendering proper is an external concern; what lives here is the thin
//! layer a CLI or log sink needs: one-line formatting of protocol events
//! with optional ANSI color, and a `tracing` subscriber initializer.

use std::io::IsTerminal;

use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::runtimes::RunEvent;

pub const NODE_COLOR: &str = "\x1b[36m"; // cyan
pub const ERROR_COLOR: &str = "\x1b[31m"; // red
pub const RESET_COLOR: &str = "\x1b[0m";

/// Formatter color mode.
///
/// - [`FormatterMode::Auto`]: detects TTY capability via `stderr.is_terminal()`
/// - [`FormatterMode::Colored`]: always include color codes
/// - [`FormatterMode::Plain`]: never include color codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatterMode {
    #[default]
    Auto,
    Colored,
    Plain,
}

impl FormatterMode {
    /// Returns true if this mode should use colored output.
    ///
    /// For `Auto` mode, performs TTY detection on each call.
    pub fn is_colored(&self) -> bool {
        match self {
            FormatterMode::Auto => std::io::stderr().is_terminal(),
            FormatterMode::Colored => true,
            FormatterMode::Plain => false,
        }
    }
}

/// Renders protocol events as single log lines.
pub struct PlainFormatter {
    mode: FormatterMode,
}

impl PlainFormatter {
    /// Formatter with auto-detected color mode.
    #[must_use]
    pub fn new() -> Self {
        Self {
            mode: FormatterMode::Auto,
        }
    }

    /// Formatter with an explicit color mode.
    #[must_use]
    pub fn with_mode(mode: FormatterMode) -> Self {
        Self { mode }
    }

    /// One display line for an event.
    #[must_use]
    pub fn render_event(&self, event: &RunEvent) -> String {
        let colored = self.mode.is_colored();
        let paint = |color: &str, text: String| {
            if colored {
                format!("{color}{text}{RESET_COLOR}")
            } else {
                text
            }
        };
        match event {
            RunEvent::RunStart { execution_id } => match execution_id {
                Some(id) => format!("run started (execution {id})"),
                None => "run started".to_string(),
            },
            RunEvent::NodeStart { node_id } => {
                paint(NODE_COLOR, format!("[{node_id}] started"))
            }
            RunEvent::NodeStreaming { node_id, text } => {
                paint(NODE_COLOR, format!("[{node_id}] +{} chars", text.len()))
            }
            RunEvent::NodeComplete { node_id, report } => {
                if report.success {
                    paint(NODE_COLOR, format!("[{node_id}] completed"))
                } else {
                    paint(
                        ERROR_COLOR,
                        format!(
                            "[{node_id}] failed: {}",
                            report.error.as_deref().unwrap_or("unknown error")
                        ),
                    )
                }
            }
            RunEvent::RunComplete(outcome) => format!(
                "run {} in {:.2}s",
                if outcome.success { "completed" } else { "failed" },
                outcome.total_execution_time
            ),
            RunEvent::RunError { message } => {
                paint(ERROR_COLOR, format!("run error: {message}"))
            }
        }
    }
}

impl Default for PlainFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Install the global tracing subscriber.
///
/// Respects `RUST_LOG`; defaults to `info` for this crate. Safe to call
/// once per process; a second call is a no-op.
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("loomflow=info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(ErrorLayer::default())
        .try_init();
}

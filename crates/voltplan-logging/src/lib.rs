//! ---
//! vp_section: "03-logging"
//! vp_subsection: "module"
//! vp_type: "source"
//! vp_scope: "code"
//! vp_description: "Structured logging adapters for the panel engine."
//! vp_version: "v0.1.0"
//! vp_owner: "panel-engineering"
//! ---
#![warn(missing_docs)]
//! Structured logging helpers shared by the engine and the operator tooling.

use tracing::Level;
use tracing_subscriber::{fmt as subscriber_fmt, prelude::*, EnvFilter, Registry};

pub mod macros;

/// Initialize a baseline tracing subscriber suitable for command-line use.
pub fn init() {
    let _ = Registry::default()
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(subscriber_fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Structured logging context propagated by the convenience macros.
#[derive(Debug, Default, Clone)]
pub struct LogContext<'a> {
    /// Installation the event belongs to.
    pub installation: Option<&'a str>,
    /// Room being processed.
    pub room: Option<&'a str>,
    /// Supply phase letter.
    pub phase: Option<&'a str>,
    /// Recomputation sequence number.
    pub run: Option<u64>,
}

impl<'a> LogContext<'a> {
    /// Create an empty logging context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an installation name.
    pub fn with_installation(mut self, installation: &'a str) -> Self {
        self.installation = Some(installation);
        self
    }

    /// Attach a room name.
    pub fn with_room(mut self, room: &'a str) -> Self {
        self.room = Some(room);
        self
    }

    /// Attach a phase letter.
    pub fn with_phase(mut self, phase: &'a str) -> Self {
        self.phase = Some(phase);
        self
    }

    /// Attach a recomputation sequence number.
    pub fn with_run(mut self, run: u64) -> Self {
        self.run = Some(run);
        self
    }
}

/// Outcome attached to engine lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEventOutcome {
    /// The computation completed.
    Success,
    /// The computation was rejected or aborted.
    Fault,
}

impl EngineEventOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            EngineEventOutcome::Success => "success",
            EngineEventOutcome::Fault => "fault",
        }
    }
}

/// Emit a standardized engine event with a success/fault outcome.
pub fn log_engine_event(
    context: Option<&LogContext>,
    event: &str,
    message: &str,
    outcome: EngineEventOutcome,
) {
    let ctx = context.cloned().unwrap_or_default();
    // `tracing::event!` needs a constant level, hence the two arms.
    match outcome {
        EngineEventOutcome::Success => tracing::event!(
            Level::INFO,
            event,
            outcome = outcome.as_str(),
            installation = ctx.installation.unwrap_or(""),
            room = ctx.room.unwrap_or(""),
            phase = ctx.phase.unwrap_or(""),
            run = ctx.run.unwrap_or_default(),
            message = %message
        ),
        EngineEventOutcome::Fault => tracing::event!(
            Level::ERROR,
            event,
            outcome = outcome.as_str(),
            installation = ctx.installation.unwrap_or(""),
            room = ctx.room.unwrap_or(""),
            phase = ctx.phase.unwrap_or(""),
            run = ctx.run.unwrap_or_default(),
            message = %message
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macros_emit_without_panic() {
        init();
        let ctx = LogContext::new()
            .with_installation("flat-12")
            .with_phase("A");
        vp_info!(context = ctx.clone(), "phase computed");
        vp_debug!("debug message");
        vp_warn!(context = ctx.clone().with_room("Kitchen"), "room skipped");
        vp_error!(context = ctx, "error code: {}", 42);
    }

    #[test]
    fn init_is_idempotent() {
        init();
        init();
    }

    #[test]
    fn engine_event_helper_emits() {
        init();
        let ctx = LogContext::new().with_installation("flat-12").with_run(3);
        log_engine_event(
            Some(&ctx),
            "engine.run",
            "phase load computed",
            EngineEventOutcome::Success,
        );
        log_engine_event(
            None,
            "engine.run",
            "phase load rejected",
            EngineEventOutcome::Fault,
        );
    }
}

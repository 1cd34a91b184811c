//! ---
//! vp_section: "03-logging"
//! vp_subsection: "module"
//! vp_type: "source"
//! vp_scope: "code"
//! vp_description: "Structured logging adapters for the panel engine."
//! vp_version: "v0.1.0"
//! vp_owner: "panel-engineering"
//! ---
/// Emit an informational log enriched with panel context.
#[macro_export]
macro_rules! vp_info {
    (context = $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        tracing::event!(
            tracing::Level::INFO,
            installation = ctx.installation.unwrap_or(""),
            room = ctx.room.unwrap_or(""),
            phase = ctx.phase.unwrap_or(""),
            run = ctx.run.unwrap_or_default(),
            message = %format_args!($($arg)+)
        );
    }};
    ($($arg:tt)+) => {{
        $crate::vp_info!(context = $crate::LogContext::default(), $($arg)+)
    }};
}

/// Emit a debug log enriched with panel context.
#[macro_export]
macro_rules! vp_debug {
    (context = $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        tracing::event!(
            tracing::Level::DEBUG,
            installation = ctx.installation.unwrap_or(""),
            room = ctx.room.unwrap_or(""),
            phase = ctx.phase.unwrap_or(""),
            run = ctx.run.unwrap_or_default(),
            message = %format_args!($($arg)+)
        );
    }};
    ($($arg:tt)+) => {{
        $crate::vp_debug!(context = $crate::LogContext::default(), $($arg)+)
    }};
}

/// Emit a warning log enriched with panel context.
#[macro_export]
macro_rules! vp_warn {
    (context = $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        tracing::event!(
            tracing::Level::WARN,
            installation = ctx.installation.unwrap_or(""),
            room = ctx.room.unwrap_or(""),
            phase = ctx.phase.unwrap_or(""),
            run = ctx.run.unwrap_or_default(),
            message = %format_args!($($arg)+)
        );
    }};
    ($($arg:tt)+) => {{
        $crate::vp_warn!(context = $crate::LogContext::default(), $($arg)+)
    }};
}

/// Emit an error log enriched with panel context.
#[macro_export]
macro_rules! vp_error {
    (context = $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        tracing::event!(
            tracing::Level::ERROR,
            installation = ctx.installation.unwrap_or(""),
            room = ctx.room.unwrap_or(""),
            phase = ctx.phase.unwrap_or(""),
            run = ctx.run.unwrap_or_default(),
            message = %format_args!($($arg)+)
        );
    }};
    ($($arg:tt)+) => {{
        $crate::vp_error!(context = $crate::LogContext::default(), $($arg)+)
    }};
}

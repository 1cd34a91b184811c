//! ---
//! vp_section: "01-core-functionality"
//! vp_subsection: "module"
//! vp_type: "source"
//! vp_scope: "code"
//! vp_description: "Shared configuration and tracing setup for VoltPlan binaries."
//! vp_version: "v0.1.0"
//! vp_owner: "panel-engineering"
//! ---
//! Application-level configuration loading and tracing setup for the VoltPlan tools.

pub mod config;
pub mod logging;

pub use config::{AppConfig, EngineConfig, ExportConfig, LoadedAppConfig, LoggingConfig};
pub use logging::{init_tracing, LogFormat};

//! ---
//! vp_section: "05-operator-interfaces"
//! vp_subsection: "binary"
//! vp_type: "source"
//! vp_scope: "code"
//! vp_description: "Operator CLI for panel load analysis and report export."
//! vp_version: "v0.1.0"
//! vp_owner: "panel-engineering"
//! ---
use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use clap::{Args, ValueEnum};
use tracing::info;
use voltplan_common::{init_tracing, AppConfig};
use voltplan_engine::{
    analyze,
    circuit::{select_breaker, validate_ladder, DEFAULT_BREAKER_LADDER_A},
    export::ReportExporter,
    io::load_request_from_file,
    model::PhaseMode,
    report::{project_report, PanelReport},
    state::PhaseLoadUiState,
    thresholds::LoadStatus,
    PhaseLoadRequest,
};
use voltplan_logging as logging;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Single,
    Three,
}

impl From<ModeArg> for PhaseMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Single => PhaseMode::Single,
            ModeArg::Three => PhaseMode::Three,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Args)]
pub struct InputArgs {
    /// Installation request (JSON or YAML) with a `snapshot` and optional panel settings.
    #[arg(long, short = 'i', value_name = "FILE")]
    input: PathBuf,

    /// Configuration file whose panel settings replace those in the input.
    #[arg(long, short = 'c', value_name = "FILE", env = "VOLTPLAN_CONFIG")]
    config: Option<PathBuf>,

    /// Override the supply mode.
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    input: InputArgs,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Exit with an error when any phase or group is in ALERT.
    #[arg(long = "fail-on-alert", action = clap::ArgAction::SetTrue)]
    fail_on_alert: bool,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Output directory (defaults to `[export].output_dir`, then `reports`).
    #[arg(long, short = 'o', value_name = "DIR")]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct LadderArgs {
    /// Circuit current in amperes.
    #[arg(long, value_name = "AMPS")]
    current: f64,

    /// Custom ascending breaker ladder, comma separated.
    #[arg(long, value_name = "AMPS", value_delimiter = ',')]
    ladder: Vec<f64>,
}

#[derive(Debug, Args)]
pub struct CheckConfigArgs {
    #[arg(long, short = 'c', value_name = "FILE")]
    config: PathBuf,
}

struct Prepared {
    request: PhaseLoadRequest,
    config: Option<AppConfig>,
}

fn prepare(args: &InputArgs) -> Result<Prepared> {
    let config = args
        .config
        .as_deref()
        .map(AppConfig::from_path)
        .transpose()?;

    match &config {
        Some(config) => init_tracing("voltplanctl", &config.logging)?,
        None => logging::init(),
    }

    let mut request = load_request_from_file(&args.input)
        .with_context(|| format!("unable to load installation {}", args.input.display()))?;
    let mode = args.mode.map(PhaseMode::from);
    if let Some(config) = &config {
        request.settings = config.panel_settings(mode);
    } else if let Some(mode) = mode {
        request.settings.mode = mode;
    }

    info!(
        input = %args.input.display(),
        rooms = request.snapshot.rooms.len(),
        devices = request.snapshot.devices.len(),
        mode = %request.settings.mode,
        "installation loaded"
    );
    Ok(Prepared { request, config })
}

fn compute(request: &PhaseLoadRequest) -> Result<PhaseLoadUiState> {
    let state = analyze(request);
    match &state.error {
        Some(error) => Err(anyhow!("phase load computation failed: {error}")),
        None => Ok(state),
    }
}

pub fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    let prepared = prepare(&args.input)?;
    let state = compute(&prepared.request)?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&state)?),
        OutputFormat::Table => {
            let report = project_report(
                &state,
                prepared.request.snapshot.name.as_deref(),
                Utc::now(),
            );
            print!("{}", render_table(&report, &state));
        }
    }

    if args.fail_on_alert && state.worst_status() == LoadStatus::Alert {
        bail!("panel load is in ALERT");
    }
    Ok(())
}

pub fn run_export(args: ExportArgs) -> Result<()> {
    let prepared = prepare(&args.input)?;
    let state = compute(&prepared.request)?;
    let report = project_report(
        &state,
        prepared.request.snapshot.name.as_deref(),
        Utc::now(),
    );

    let output = args
        .output
        .or_else(|| prepared.config.map(|config| config.export.output_dir))
        .unwrap_or_else(|| PathBuf::from("reports"));
    ReportExporter::new(&state, &report)
        .export_all(&output)
        .with_context(|| format!("unable to export reports to {}", output.display()))?;

    println!("reports written to {}", output.display());
    Ok(())
}

pub fn run_ladder(args: LadderArgs) -> Result<()> {
    let ladder = if args.ladder.is_empty() {
        DEFAULT_BREAKER_LADDER_A.to_vec()
    } else {
        args.ladder
    };
    validate_ladder(&ladder)?;
    let rating = select_breaker(args.current, &ladder)?;
    println!("{rating} A");
    Ok(())
}

pub fn run_check_config(args: CheckConfigArgs) -> Result<()> {
    let config = AppConfig::from_path(&args.config)?;
    let settings = config.panel_settings(None);
    println!("configuration {} is valid", args.config.display());
    println!("  mode:       {}", settings.mode);
    println!("  incomer:    {}", settings.incomer.describe());
    println!(
        "  thresholds: warn {}% / alert {}%",
        settings.thresholds.warn_pct, settings.thresholds.alert_pct
    );
    println!(
        "  circuits:   max {} A, ladder {:?}",
        settings.engine.max_circuit_current_a, settings.engine.breaker_ladder_a
    );
    Ok(())
}

/// Plain-text summary of a report, one block per phase.
fn render_table(report: &PanelReport, state: &PhaseLoadUiState) -> String {
    let mut out = String::new();
    let meta = &report.meta;
    let _ = writeln!(
        out,
        "{}  |  {}  |  {} supply  |  total {}",
        meta.installation.as_deref().unwrap_or("Installation"),
        meta.incomer,
        meta.phase_mode,
        meta.total_power
    );
    let _ = writeln!(
        out,
        "{:<6}{:>12}{:>12}{:>10}  {}",
        "PHASE", "POWER", "CURRENT", "LOAD", "STATUS"
    );
    for phase in &report.phases {
        let _ = writeln!(
            out,
            "{:<6}{:>12}{:>12}{:>10}  {}",
            phase.phase, phase.power, phase.current, phase.utilization, phase.status
        );
        for group in &phase.groups {
            let _ = writeln!(
                out,
                "  {:<32}{:>6}{:>12}{:>10}  {}",
                group.title, group.breaker, group.power, group.current, group.status
            );
        }
    }
    for skipped in &state.skipped_rooms {
        let _ = writeln!(out, "skipped {}: {}", skipped.room_name, skipped.reason);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use voltplan_engine::model::{Device, InstallationSnapshot, PanelSettings, Room, VoltageClass};

    fn request() -> PhaseLoadRequest {
        let kitchen = Room::new("Kitchen");
        let hall = Room::new("Hall");
        let devices = vec![
            Device::new("Kettle", 2000.0, VoltageClass::V220, 1.0, kitchen.id),
            Device::new("Lights", 200.0, VoltageClass::V220, 1.0, hall.id),
        ];
        PhaseLoadRequest {
            snapshot: InstallationSnapshot {
                name: Some("Flat".into()),
                rooms: vec![kitchen, hall],
                devices,
            },
            settings: PanelSettings::default(),
        }
    }

    #[test]
    fn table_lists_every_phase_and_group() {
        let request = request();
        let state = compute(&request).unwrap();
        let report = project_report(&state, Some("Flat"), Utc::now());
        let table = render_table(&report, &state);

        assert!(table.starts_with("Flat  |"));
        for letter in ["A", "B", "C"] {
            assert!(table.lines().any(|line| line.starts_with(letter)));
        }
        assert!(table.contains("Group 1: Kitchen"));
        assert!(table.contains("Group 2: Hall"));
        assert!(table.contains("C10"));
    }

    #[test]
    fn compute_surfaces_engine_errors() {
        let mut request = request();
        request.settings.thresholds.warn_pct = 95.0;
        let err = compute(&request).unwrap_err();
        assert!(err.to_string().contains("phase load computation failed"));
    }

    #[test]
    fn mode_argument_maps_to_phase_mode() {
        assert_eq!(PhaseMode::from(ModeArg::Single), PhaseMode::Single);
        assert_eq!(PhaseMode::from(ModeArg::Three), PhaseMode::Three);
    }
}

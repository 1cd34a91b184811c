//! ---
//! vp_section: "02-load-engine"
//! vp_subsection: "module"
//! vp_type: "source"
//! vp_scope: "code"
//! vp_description: "Load derivation and phase balancing routines for panel design."
//! vp_version: "v0.1.0"
//! vp_owner: "panel-engineering"
//! ---
use std::fs;

use chrono::Utc;
use tempfile::tempdir;
use uuid::Uuid;
use voltplan_engine::{
    aggregate::aggregate,
    analyze,
    balancer::balance,
    circuit::{build_circuit_groups, CircuitGroup},
    compute_phase_load,
    device_load::device_current,
    export::{ReportExporter, PANEL_REPORT_FILE, PHASE_LOAD_FILE},
    model::{
        Device, EngineSettings, IncomerKind, IncomerSpec, InstallationSnapshot, PanelSettings,
        Phase, PhaseMode, Room, TripCurve, VoltageClass,
    },
    report::project_report,
    thresholds::{evaluate, LoadStatus, LoadThresholds},
    PhaseLoadRequest,
};

fn sample_request() -> PhaseLoadRequest {
    let kitchen = Room::new("Kitchen");
    let bathroom = Room::new("Bathroom");
    let living = Room::new("Living room");
    let garage = Room::new("Garage");
    let devices = vec![
        Device::new("Induction hob", 7200.0, VoltageClass::V220, 0.7, kitchen.id),
        Device::new("Oven", 3500.0, VoltageClass::V220, 0.8, kitchen.id),
        Device::new("Dishwasher", 2000.0, VoltageClass::V220, 1.0, kitchen.id),
        Device::new("Water heater", 2500.0, VoltageClass::V220, 1.0, bathroom.id),
        Device::new("Washing machine", 2200.0, VoltageClass::V220, 0.6, bathroom.id),
        Device::new("TV", 250.0, VoltageClass::V220, 1.0, living.id),
        Device::new("Air conditioner", 2600.0, VoltageClass::V220, 0.9, living.id)
            .with_power_factor(0.9),
        Device::new("EV charger", 11_000.0, VoltageClass::V380, 1.0, garage.id),
    ];
    PhaseLoadRequest {
        snapshot: InstallationSnapshot {
            name: Some("Villa".into()),
            rooms: vec![kitchen, bathroom, living, garage],
            devices,
        },
        settings: PanelSettings {
            incomer: IncomerSpec {
                kind: IncomerKind::Rcbo,
                poles: 4,
                breaker_rating_a: 63.0,
                trip_curve: TripCurve::C,
                breaking_capacity_ka: 10.0,
                rcd_sensitivity_ma: Some(100),
                rcd_selectivity: None,
            },
            ..PanelSettings::default()
        },
    }
}

fn group(number: u32, current: f64) -> CircuitGroup {
    CircuitGroup {
        number,
        room_id: Uuid::nil(),
        room_name: format!("Room {number}"),
        devices: Vec::new(),
        total_power_w: current * 220.0,
        total_current_a: current,
        recommended_breaker_a: 63.0,
        installed_breaker_a: None,
    }
}

#[test]
fn scenario_single_device_breaker() {
    let room = Room::new("Study");
    let device = Device::new("Heater", 2000.0, VoltageClass::V220, 1.0, room.id);
    let current = device_current(&device).unwrap();
    assert!((current - 9.09).abs() < 0.01);

    let snapshot = InstallationSnapshot::new(vec![room], vec![device]);
    let outcome = build_circuit_groups(&snapshot, &EngineSettings::default()).unwrap();
    assert_eq!(outcome.groups[0].recommended_breaker_a, 10.0);
}

#[test]
fn scenario_three_devices_one_room() {
    let room = Room::new("Living room");
    let devices = [500.0, 1000.0, 1500.0]
        .iter()
        .map(|power| Device::new("Load", *power, VoltageClass::V220, 1.0, room.id))
        .collect();
    let snapshot = InstallationSnapshot::new(vec![room], devices);
    let outcome = build_circuit_groups(&snapshot, &EngineSettings::default()).unwrap();
    assert_eq!(outcome.groups.len(), 1);
    let group = &outcome.groups[0];
    assert!((group.total_power_w - 3000.0).abs() < 1e-9);
    assert!((group.total_current_a - 13.64).abs() < 0.01);
    assert_eq!(group.recommended_breaker_a, 16.0);
}

#[test]
fn scenario_two_groups_three_phase() {
    let groups = vec![group(1, 10.0), group(2, 6.0)];
    let assignment = balance(&groups, PhaseMode::Three);
    let phases = aggregate(&groups, &assignment, PhaseMode::Three).unwrap();
    let currents: Vec<f64> = phases.iter().map(|p| p.total_current_a).collect();
    assert_eq!(currents, vec![10.0, 6.0, 0.0]);
    assert!(assignment.imbalance_a() <= 10.0);
}

#[test]
fn scenario_threshold_boundaries() {
    let incomer = IncomerSpec {
        breaker_rating_a: 32.0,
        ..IncomerSpec::default()
    };
    let thresholds = LoadThresholds::new(60.0, 80.0).unwrap();
    let groups = vec![group(1, 25.6), group(2, 19.2)];
    let assignment = balance(&groups, PhaseMode::Three);
    let phases = aggregate(&groups, &assignment, PhaseMode::Three).unwrap();
    let phases = evaluate(phases, &incomer, &thresholds).unwrap();

    assert_eq!(phases[0].phase, Phase::A);
    assert_eq!(phases[0].status, LoadStatus::Alert);
    assert_eq!(phases[1].phase, Phase::B);
    assert_eq!(phases[1].status, LoadStatus::Ok);
    assert_eq!(phases[2].status, LoadStatus::Ok);
}

#[test]
fn full_installation_conserves_power_and_is_reproducible() {
    let request = sample_request();
    let first = compute_phase_load(&request.snapshot, &request.settings).unwrap();
    let second = compute_phase_load(&request.snapshot, &request.settings).unwrap();
    assert_eq!(first, second);

    let device_power: f64 = request
        .snapshot
        .devices
        .iter()
        .map(|d| d.rated_power_w * d.demand_ratio)
        .sum();
    let phase_power: f64 = first.phases.iter().map(|p| p.total_power_w).sum();
    assert!((device_power - phase_power).abs() < 1e-6);

    let assigned: usize = first.phases.iter().map(|p| p.groups.len()).sum();
    assert_eq!(assigned, first.groups.len());
    for phase in &first.phases {
        let sum: f64 = phase.groups.iter().map(|g| g.total_current_a).sum();
        assert!((phase.total_current_a - sum).abs() < 1e-6);
    }

    let largest = first
        .groups
        .iter()
        .map(|g| g.total_current_a)
        .fold(0.0, f64::max);
    assert!(first.assignment.imbalance_a() <= largest + 1e-9);

    // The kitchen exceeds the 32 A circuit ceiling and is split.
    let kitchen_groups = first
        .groups
        .iter()
        .filter(|g| g.room_name == "Kitchen")
        .count();
    assert!(kitchen_groups > 1);
}

#[test]
fn reports_are_exported_with_envelopes() {
    let request = sample_request();
    let state = analyze(&request);
    assert!(state.error.is_none(), "{:?}", state.error);

    let report = project_report(&state, request.snapshot.name.as_deref(), Utc::now());
    let temp = tempdir().expect("temp dir");
    ReportExporter::new(&state, &report)
        .export_all(temp.path())
        .expect("export");

    let phase_json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(temp.path().join(PHASE_LOAD_FILE)).unwrap())
            .unwrap();
    assert_eq!(phase_json["installation"], "Villa");
    assert_eq!(phase_json["data"]["phases"].as_array().unwrap().len(), 3);
    assert_eq!(phase_json["schema"]["title"], "PhaseLoadUiState");

    let report_json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(temp.path().join(PANEL_REPORT_FILE)).unwrap())
            .unwrap();
    assert_eq!(
        report_json["data"]["meta"]["incomer"],
        "RCBO 4P C63 10kA 100mA"
    );
    let first_group_title = report_json["data"]["phases"][0]["groups"][0]["title"]
        .as_str()
        .unwrap();
    assert!(first_group_title.starts_with("Group "));
}

#[test]
fn report_export_creates_nested_directories() {
    let request = sample_request();
    let state = analyze(&request);
    let report = project_report(&state, None, Utc::now());
    let temp = tempdir().expect("temp dir");
    let nested = temp.path().join("reports/villa");
    ReportExporter::new(&state, &report)
        .export_all(&nested)
        .unwrap();
    assert!(nested.join(PHASE_LOAD_FILE).exists());
    assert!(nested.join(PANEL_REPORT_FILE).exists());
}

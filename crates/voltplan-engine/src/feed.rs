//! ---
//! vp_section: "02-load-engine"
//! vp_subsection: "module"
//! vp_type: "source"
//! vp_scope: "code"
//! vp_description: "Load derivation and phase balancing routines for panel design."
//! vp_version: "v0.1.0"
//! vp_owner: "panel-engineering"
//! ---
//! Snapshot-driven recomputation.
//!
//! The persistence layer publishes immutable installation snapshots on a [`SnapshotFeed`]. A
//! recompute task rebuilds the whole [`PhaseLoadUiState`] from the latest snapshot and settings
//! whenever either changes; intermediate values that were superseded before the task looked at
//! them are never computed.

use std::sync::Arc;

use tokio::{sync::watch, task::JoinHandle};
use voltplan_logging::{vp_debug, vp_info, LogContext};

use crate::{
    compute_phase_load,
    model::{InstallationSnapshot, PanelSettings},
    state::PhaseLoadUiState,
};

/// Single-producer channel of installation snapshots.
#[derive(Debug)]
pub struct SnapshotFeed {
    tx: watch::Sender<Arc<InstallationSnapshot>>,
}

impl SnapshotFeed {
    pub fn new(initial: InstallationSnapshot) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(initial));
        Self { tx }
    }

    /// Replace the current snapshot; every subscriber sees the new one in full.
    pub fn publish(&self, snapshot: InstallationSnapshot) {
        self.tx.send_replace(Arc::new(snapshot));
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<InstallationSnapshot>> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> Arc<InstallationSnapshot> {
        self.tx.borrow().clone()
    }
}

/// Spawns the recompute loop. It exits once the snapshot producer is dropped.
pub fn spawn_recompute(
    mut snapshots: watch::Receiver<Arc<InstallationSnapshot>>,
    mut settings: watch::Receiver<PanelSettings>,
) -> (watch::Receiver<PhaseLoadUiState>, JoinHandle<()>) {
    let initial_settings = settings.borrow_and_update().clone();
    let (state_tx, state_rx) = watch::channel(PhaseLoadUiState::loading(&initial_settings));

    let task = tokio::spawn(async move {
        let mut run: u64 = 0;
        let mut settings_open = true;
        let mut dirty = true;
        loop {
            if dirty {
                let snapshot = snapshots.borrow_and_update().clone();
                let current_settings = settings.borrow_and_update().clone();
                run += 1;
                let context = LogContext::new()
                    .with_installation(snapshot.name.as_deref().unwrap_or("unnamed"))
                    .with_run(run);
                vp_debug!(
                    context = context,
                    "recomputing phase load for {} rooms, {} devices",
                    snapshot.rooms.len(),
                    snapshot.devices.len()
                );
                let outcome = compute_phase_load(&snapshot, &current_settings);
                let state = PhaseLoadUiState::from_outcome(&current_settings, outcome);
                vp_info!(
                    context = context,
                    "phase load state published (worst status {})",
                    state.worst_status()
                );
                state_tx.send_replace(state);
            }

            dirty = tokio::select! {
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        vp_debug!(
                            context = LogContext::new().with_run(run),
                            "snapshot producer closed; stopping recompute loop"
                        );
                        break;
                    }
                    true
                }
                changed = settings.changed(), if settings_open => {
                    // A closed settings channel keeps the last settings in force.
                    settings_open = changed.is_ok();
                    settings_open
                }
            };
        }
    });

    (state_rx, task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Device, IncomerSpec, PhaseMode, Room, VoltageClass};
    use std::time::Duration;
    use tokio::time::timeout;

    fn snapshot(kettle_power: f64) -> InstallationSnapshot {
        let room = Room::new("Kitchen");
        let device = Device::new("Kettle", kettle_power, VoltageClass::V220, 1.0, room.id);
        InstallationSnapshot::new(vec![room], vec![device])
    }

    async fn next_state(rx: &mut watch::Receiver<PhaseLoadUiState>) -> PhaseLoadUiState {
        loop {
            timeout(Duration::from_secs(2), rx.changed())
                .await
                .expect("state update in time")
                .expect("recompute task alive");
            let state = rx.borrow_and_update().clone();
            if !state.is_loading {
                return state;
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn recomputes_on_every_snapshot() {
        let feed = SnapshotFeed::new(snapshot(2200.0));
        let (_settings_tx, settings_rx) = watch::channel(PanelSettings::default());
        let (mut states, task) = spawn_recompute(feed.subscribe(), settings_rx);

        let first = next_state(&mut states).await;
        assert!((first.phases[0].total_current_a - 10.0).abs() < 1e-9);

        feed.publish(snapshot(4400.0));
        let second = next_state(&mut states).await;
        assert!((second.phases[0].total_current_a - 20.0).abs() < 1e-9);

        drop(feed);
        timeout(Duration::from_secs(2), task)
            .await
            .expect("task stops when producer is dropped")
            .unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn settings_change_triggers_recompute() {
        let feed = SnapshotFeed::new(snapshot(2200.0));
        let (settings_tx, settings_rx) = watch::channel(PanelSettings::default());
        let (mut states, task) = spawn_recompute(feed.subscribe(), settings_rx);

        let first = next_state(&mut states).await;
        assert_eq!(first.phases.len(), 3);

        let defaults = PanelSettings::default();
        settings_tx.send_replace(PanelSettings {
            mode: PhaseMode::Single,
            incomer: IncomerSpec {
                poles: 2,
                ..defaults.incomer.clone()
            },
            ..defaults
        });
        let second = next_state(&mut states).await;
        assert_eq!(second.phase_mode, PhaseMode::Single);
        assert_eq!(second.phases.len(), 1);

        drop(settings_tx);
        feed.publish(snapshot(1100.0));
        let third = next_state(&mut states).await;
        assert!((third.phases[0].total_current_a - 5.0).abs() < 1e-9);

        drop(feed);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn errors_surface_in_state() {
        let feed = SnapshotFeed::new(snapshot(-1.0));
        let (_settings_tx, settings_rx) = watch::channel(PanelSettings::default());
        let (mut states, _task) = spawn_recompute(feed.subscribe(), settings_rx);
        let state = next_state(&mut states).await;
        assert!(state.error.unwrap().contains("Kettle"));
        assert!(state.phases.is_empty());
        assert_eq!(feed.current().devices.len(), 1);
    }
}

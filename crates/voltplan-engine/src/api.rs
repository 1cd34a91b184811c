//! ---
//! vp_section: "02-load-engine"
//! vp_subsection: "module"
//! vp_type: "source"
//! vp_scope: "code"
//! vp_description: "Load derivation and phase balancing routines for panel design."
//! vp_version: "v0.1.0"
//! vp_owner: "panel-engineering"
//! ---
#[cfg(feature = "rest-api")]
pub use rest::router;

#[cfg(feature = "rest-api")]
mod rest {
    use axum::{http::StatusCode, routing::post, Json, Router};
    use chrono::Utc;

    use crate::{
        compute_phase_load,
        errors::PanelError,
        report::{project_report, PanelReport},
        state::PhaseLoadUiState,
        PhaseLoadRequest,
    };

    pub fn router() -> Router {
        Router::new()
            .route("/api/panel/phase-load", post(phase_load))
            .route("/api/panel/report", post(report))
    }

    pub(super) async fn phase_load(
        Json(payload): Json<PhaseLoadRequest>,
    ) -> Result<Json<PhaseLoadUiState>, StatusCode> {
        let outcome = compute_phase_load(&payload.snapshot, &payload.settings).map_err(map_err)?;
        Ok(Json(PhaseLoadUiState::from_outcome(
            &payload.settings,
            Ok(outcome),
        )))
    }

    pub(super) async fn report(
        Json(payload): Json<PhaseLoadRequest>,
    ) -> Result<Json<PanelReport>, StatusCode> {
        let outcome = compute_phase_load(&payload.snapshot, &payload.settings).map_err(map_err)?;
        let state = PhaseLoadUiState::from_outcome(&payload.settings, Ok(outcome));
        Ok(Json(project_report(
            &state,
            payload.snapshot.name.as_deref(),
            Utc::now(),
        )))
    }

    fn map_err(err: PanelError) -> StatusCode {
        match err {
            PanelError::InvalidThresholds { .. }
            | PanelError::InvalidIncomer(_)
            | PanelError::InvalidLadder(_) => StatusCode::BAD_REQUEST,
            err if err.is_user_facing() => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

}

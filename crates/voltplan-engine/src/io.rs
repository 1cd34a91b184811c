//! ---
//! vp_section: "02-load-engine"
//! vp_subsection: "module"
//! vp_type: "source"
//! vp_scope: "code"
//! vp_description: "Load derivation and phase balancing routines for panel design."
//! vp_version: "v0.1.0"
//! vp_owner: "panel-engineering"
//! ---
use std::{fs, path::Path};

use serde::de::DeserializeOwned;

use crate::{
    errors::{PanelError, Result},
    model::InstallationSnapshot,
    PhaseLoadRequest,
};

/// JSON when the document starts with `{`, YAML otherwise.
fn parse_document<T: DeserializeOwned>(data: &str) -> Result<T> {
    if data.trim_start().starts_with('{') {
        Ok(serde_json::from_str(data)?)
    } else {
        serde_yaml::from_str(data).map_err(PanelError::YamlSerializationFailed)
    }
}

pub fn load_snapshot_from_file(path: impl AsRef<Path>) -> Result<InstallationSnapshot> {
    let data = fs::read_to_string(path)?;
    parse_document(&data)
}

pub fn load_request_from_file(path: impl AsRef<Path>) -> Result<PhaseLoadRequest> {
    let data = fs::read_to_string(path)?;
    parse_document(&data)
}

pub fn parse_request(data: &str) -> Result<PhaseLoadRequest> {
    parse_document(data)
}

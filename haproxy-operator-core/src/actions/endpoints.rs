use crate::actions::ActionError;
use crate::model::ModelSnapshot;
use crate::settings::OperatorSettings;
use crate::state::assemble;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProxiedEndpoints {
    pub endpoints: Vec<String>,
}

/// URLs of every admitted HTTP backend, or of `backend` alone. Each backend
/// contributes hostname x path, hostname first.
pub fn get_proxied_endpoints(
    snapshot: &ModelSnapshot,
    settings: &OperatorSettings,
    backend: Option<&str>,
) -> Result<ProxiedEndpoints, ActionError> {
    let state = assemble(snapshot, settings);
    let backends = &state.requirers.backends;

    let endpoints = match backend {
        None => backends.iter().flat_map(|b| b.urls()).collect(),
        Some(name) => backends
            .iter()
            .find(|b| b.name == name)
            .map(|b| b.urls())
            .ok_or_else(|| ActionError::UnknownBackend {
                name: name.to_string(),
            })?,
    };

    debug!(count = endpoints.len(), backend, "proxied endpoints");
    Ok(ProxiedEndpoints { endpoints })
}

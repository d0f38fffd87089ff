use crate::interfaces::endpoints;
use crate::interfaces::reverseproxy::{LegacyService, LegacyUnitData};
use crate::model::Relation;
use crate::state::assembly::{Assembly, Side};
use crate::state::peers::peer_name;
use crate::state::{LegacyFrontend, LegacyServerLine, RejectionKind};
use std::collections::BTreeMap;
use tracing::warn;

const IMPLICIT_SERVICE_PORT: u16 = 80;

/// Union of the services described by every legacy requirer unit, keyed by
/// service name.
pub(crate) fn collect(assembly: &mut Assembly<'_>) -> Vec<LegacyFrontend> {
    let snapshot = assembly.snapshot;
    let mut frontends: BTreeMap<String, LegacyFrontend> = BTreeMap::new();

    for relation in snapshot.relations(endpoints::REVERSEPROXY) {
        let units = match load_legacy_units(relation) {
            Ok(units) => units,
            Err(reason) => {
                assembly.reject_relation(relation, Side::Http, RejectionKind::InvalidData, reason);
                continue;
            }
        };

        // A relation contributes all of its services or none of them.
        let mut candidate = frontends.clone();
        let merged = units
            .iter()
            .flat_map(|(unit_name, unit)| unit_frontends(relation, unit_name, unit))
            .try_for_each(|frontend| merge(&mut candidate, frontend));
        match merged {
            Ok(()) => frontends = candidate,
            Err(reason) => {
                assembly.reject_relation(relation, Side::Http, RejectionKind::Conflict, reason);
            }
        }
    }

    frontends.into_values().collect()
}

fn load_legacy_units(relation: &Relation) -> Result<Vec<(String, LegacyUnitData)>, String> {
    let mut units = Vec::new();
    for (name, databag) in relation.ordered_units() {
        if databag.is_empty() {
            continue;
        }
        let unit = LegacyUnitData::load(databag).map_err(|e| format!("unit {}: {}", name, e))?;
        units.push((name.to_string(), unit));
    }
    Ok(units)
}

/// Frontends contributed by one unit. A unit without `services` joins an
/// implicit service named after its application.
fn unit_frontends(relation: &Relation, unit_name: &str, unit: &LegacyUnitData) -> Vec<LegacyFrontend> {
    if unit.services.is_empty() {
        let Some(address) = unit.address() else {
            warn!(unit = unit_name, "legacy unit has no address, skipping");
            return Vec::new();
        };
        let frontend = LegacyFrontend {
            name: relation.remote_app.clone(),
            bind_address: "0.0.0.0".to_string(),
            port: IMPLICIT_SERVICE_PORT,
            service_options: Vec::new(),
            servers: vec![LegacyServerLine {
                name: peer_name(unit_name),
                address: format!("{}:{}", address, unit.port.unwrap_or(IMPLICIT_SERVICE_PORT)),
                options: Vec::new(),
            }],
            relation_ids: [relation.id].into_iter().collect(),
        };
        return vec![frontend];
    }

    unit.services
        .iter()
        .map(|service| service_frontend(relation, unit_name, unit, service))
        .collect()
}

fn service_frontend(
    relation: &Relation,
    unit_name: &str,
    unit: &LegacyUnitData,
    service: &LegacyService,
) -> LegacyFrontend {
    let servers = if service.servers.is_empty() {
        unit.address()
            .map(|address| LegacyServerLine {
                name: peer_name(unit_name),
                address: format!("{}:{}", address, unit.port.unwrap_or(service.service_port)),
                options: service.server_options.clone(),
            })
            .into_iter()
            .collect()
    } else {
        service
            .servers
            .iter()
            .map(|server| LegacyServerLine {
                name: server.name.clone(),
                address: format!("{}:{}", server.host, server.port),
                options: service
                    .server_options
                    .iter()
                    .chain(server.options.iter())
                    .cloned()
                    .collect(),
            })
            .collect()
    };

    LegacyFrontend {
        name: service.service_name.clone(),
        bind_address: service.service_host.clone(),
        port: service.service_port,
        service_options: service.service_options.clone(),
        servers,
        relation_ids: [relation.id].into_iter().collect(),
    }
}

/// Fold `frontend` into the union. Servers join an existing service of the
/// same name; a port already bound by another service is a conflict.
fn merge(
    frontends: &mut BTreeMap<String, LegacyFrontend>,
    frontend: LegacyFrontend,
) -> Result<(), String> {
    if let Some(other) = frontends
        .values()
        .find(|f| f.name != frontend.name && f.port == frontend.port)
    {
        return Err(format!(
            "service '{}' port {} is already used by service '{}'",
            frontend.name, frontend.port, other.name
        ));
    }

    match frontends.get_mut(&frontend.name) {
        None => {
            frontends.insert(frontend.name.clone(), frontend);
        }
        Some(existing) if existing.port != frontend.port => {
            return Err(format!(
                "service '{}' is already bound to port {}",
                frontend.name, existing.port
            ));
        }
        Some(existing) => {
            for server in frontend.servers {
                if !existing.servers.iter().any(|s| s.name == server.name) {
                    existing.servers.push(server);
                }
            }
            existing.relation_ids.extend(frontend.relation_ids);
        }
    }
    Ok(())
}

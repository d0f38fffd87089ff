//! Data this application publishes back on its relations.
//!
//! Only databags whose content changes are returned, so an unchanged
//! reconcile publishes nothing.

use crate::databag::{Databag, DataValidationError, DatabagModel};
use crate::interfaces::endpoints;
use crate::interfaces::haproxy_route::RouteProviderAppData;
use crate::interfaces::ingress::{IngressProviderAppData, IngressUrl};
use crate::interfaces::ingress_per_unit::IngressPerUnitProviderAppData;
use crate::interfaces::peers::PeerUnitData;
use crate::model::{ModelSnapshot, Relation};
use crate::reconciler::{DatabagScope, DatabagWrite};
use crate::state::{HttpBackend, ProxyState};
use crate::tls::TlsPlan;
use std::net::SocketAddr;
use tracing::{debug, warn};
use url::Url;

fn parse_urls<'a>(urls: impl IntoIterator<Item = &'a String>) -> Vec<Url> {
    urls.into_iter()
        .filter_map(|raw| match Url::parse(raw) {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(url = raw.as_str(), error = %e, "skipping unpublishable url");
                None
            }
        })
        .collect()
}

/// `https://<host><prefix>/` of a traefik-style ingress backend.
fn ingress_url(backend: &HttpBackend) -> Option<IngressUrl> {
    let host = backend.hostnames.first()?;
    let prefix = backend.paths.first().map(String::as_str).unwrap_or_default();
    let raw = format!("https://{}{}/", host, prefix);
    parse_urls([&raw]).pop().map(|url| IngressUrl { url })
}

fn backend_of<'s>(state: &'s ProxyState, relation: &Relation) -> Option<&'s HttpBackend> {
    state
        .requirers
        .backends
        .iter()
        .find(|b| b.relation_id == relation.id && b.unit.is_none())
}

fn route_endpoints(state: &ProxyState, relation: &Relation) -> RouteProviderAppData {
    let endpoints = backend_of(state, relation)
        .map(|backend| parse_urls(&backend.urls()))
        .unwrap_or_default();
    RouteProviderAppData { endpoints }
}

fn tcp_endpoints(snapshot: &ModelSnapshot, state: &ProxyState, relation: &Relation) -> RouteProviderAppData {
    let Some(backend) = state
        .requirers
        .tcp_backends()
        .find(|b| b.relation_id == relation.id)
    else {
        return RouteProviderAppData::default();
    };

    let authority = match (&snapshot.config.external_hostname, snapshot.unit_address) {
        (Some(hostname), _) => format!("{}:{}", hostname, backend.port),
        (None, Some(address)) => SocketAddr::new(address, backend.port).to_string(),
        (None, None) => return RouteProviderAppData::default(),
    };
    RouteProviderAppData {
        endpoints: parse_urls([&format!("tcp://{}", authority)]),
    }
}

fn ingress_data(state: &ProxyState, relation: &Relation) -> IngressProviderAppData {
    IngressProviderAppData {
        ingress: backend_of(state, relation).and_then(ingress_url),
    }
}

fn ingress_per_unit_data(state: &ProxyState, relation: &Relation) -> IngressPerUnitProviderAppData {
    let ingress = state
        .requirers
        .backends
        .iter()
        .filter(|b| b.relation_id == relation.id)
        .filter_map(|b| Some((b.unit.clone()?, ingress_url(b)?)))
        .collect();
    IngressPerUnitProviderAppData { ingress }
}

struct Publisher {
    writes: Vec<DatabagWrite>,
}

impl Publisher {
    fn publish<M: DatabagModel>(
        &mut self,
        relation: &Relation,
        scope: DatabagScope,
        record: &M,
    ) -> Result<(), DataValidationError> {
        let databag: Databag = record.dump()?;
        let current = match scope {
            DatabagScope::App => &relation.local_app_data,
            DatabagScope::Unit => &relation.local_unit_data,
        };
        if *current == databag {
            return Ok(());
        }
        debug!(
            relation_id = relation.id.get(),
            endpoint = relation.endpoint.as_str(),
            ?scope,
            "publishing relation data"
        );
        self.writes.push(DatabagWrite {
            relation_id: relation.id,
            endpoint: relation.endpoint.clone(),
            scope,
            databag,
        });
        Ok(())
    }
}

/// Provider data for every requirer plus this unit's own records. Invalid
/// requirers get an empty databag so that stale endpoints disappear.
pub(crate) fn databag_writes(
    snapshot: &ModelSnapshot,
    state: &ProxyState,
    tls: &TlsPlan,
) -> Result<Vec<DatabagWrite>, DataValidationError> {
    let mut publisher = Publisher { writes: Vec::new() };

    if snapshot.is_leader {
        for relation in snapshot.relations(endpoints::HAPROXY_ROUTE) {
            publisher.publish(relation, DatabagScope::App, &route_endpoints(state, relation))?;
        }
        for relation in snapshot.relations(endpoints::HAPROXY_ROUTE_TCP) {
            let data = tcp_endpoints(snapshot, state, relation);
            publisher.publish(relation, DatabagScope::App, &data)?;
        }
        for relation in snapshot.relations(endpoints::INGRESS) {
            publisher.publish(relation, DatabagScope::App, &ingress_data(state, relation))?;
        }
        for relation in snapshot.relations(endpoints::INGRESS_PER_UNIT) {
            let data = ingress_per_unit_data(state, relation);
            publisher.publish(relation, DatabagScope::App, &data)?;
        }
        for relation in snapshot.relations(endpoints::CERTIFICATES) {
            publisher.publish(relation, DatabagScope::App, &tls.requirer_data())?;
        }
    }

    if let Some(address) = snapshot.unit_address {
        for relation in snapshot.relations(endpoints::PEERS) {
            publisher.publish(relation, DatabagScope::Unit, &PeerUnitData { address })?;
        }
    }

    Ok(publisher.writes)
}

use crate::interfaces::endpoints;
use crate::model::ModelSnapshot;
use crate::state::ProxyMode;

/// Highest-priority mode among the integrations present.
pub fn select_mode(snapshot: &ModelSnapshot) -> ProxyMode {
    if snapshot.has_relation(endpoints::HAPROXY_ROUTE)
        || snapshot.has_relation(endpoints::HAPROXY_ROUTE_TCP)
    {
        ProxyMode::HaproxyRoute
    } else if snapshot.has_relation(endpoints::INGRESS) {
        ProxyMode::Ingress
    } else if snapshot.has_relation(endpoints::INGRESS_PER_UNIT) {
        ProxyMode::IngressPerUnit
    } else if snapshot.has_relation(endpoints::REVERSEPROXY) {
        ProxyMode::Legacy
    } else {
        ProxyMode::Default
    }
}

/// Integrations that cannot be served together.
pub fn exclusive_conflict(snapshot: &ModelSnapshot) -> Option<String> {
    if snapshot.has_relation(endpoints::INGRESS) && snapshot.has_relation(endpoints::REVERSEPROXY) {
        Some(format!(
            "{} and {} integrations are mutually exclusive",
            endpoints::INGRESS,
            endpoints::REVERSEPROXY
        ))
    } else {
        None
    }
}

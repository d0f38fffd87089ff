use crate::databag::DatabagModel;
use crate::interfaces::endpoints;
use crate::interfaces::peers::PeerUnitData;
use crate::model::ModelSnapshot;
use crate::state::Peer;
use tracing::warn;

/// HAProxy peer name of a unit: `haproxy/0` becomes `haproxy-0`.
pub fn peer_name(unit_name: &str) -> String {
    unit_name.replace('/', "-")
}

/// This unit plus every peer that published its address, by name.
pub(crate) fn collect(snapshot: &ModelSnapshot) -> Vec<Peer> {
    let mut peers = Vec::new();

    if let Some(address) = snapshot.unit_address {
        peers.push(Peer {
            name: peer_name(&snapshot.unit_name),
            address,
        });
    }

    for relation in snapshot.relations(endpoints::PEERS) {
        for (unit, databag) in relation.ordered_units() {
            if databag.is_empty() || unit == snapshot.unit_name {
                continue;
            }
            match PeerUnitData::load(databag) {
                Ok(data) => peers.push(Peer {
                    name: peer_name(unit),
                    address: data.address,
                }),
                Err(e) => warn!(unit, error = %e, "ignoring peer with invalid address"),
            }
        }
    }

    peers.sort_by(|a, b| a.name.cmp(&b.name));
    peers.dedup_by(|a, b| a.name == b.name);
    peers
}

//! Intra-application relation used to replicate stick tables.

use crate::databag::DatabagModel;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerUnitData {
    pub address: IpAddr,
}

impl Default for PeerUnitData {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        }
    }
}

impl DatabagModel for PeerUnitData {
    const KEYS: &'static [&'static str] = &["address"];
}

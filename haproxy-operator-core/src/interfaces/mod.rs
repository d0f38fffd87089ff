//! Wire schemas of every integration this operator speaks.
//!
//! Each record implements [`DatabagModel`](crate::databag::DatabagModel) so
//! it can be decoded from, and encoded into, a relation databag. Validation
//! here only concerns one record in isolation; checks that span several
//! relations live in [`crate::state`].

pub mod certificate_transfer;
pub mod ddos_protection;
pub mod haproxy_route;
pub mod haproxy_route_tcp;
pub mod ingress;
pub mod ingress_per_unit;
pub mod peers;
pub mod reverseproxy;
pub mod spoe_auth;
pub mod tls_certificates;
mod validators;
#[cfg(test)]
mod tests;

pub use validators::{is_valid_fqdn, is_valid_identifier, is_valid_sni};

/// Relation endpoint names as declared in the charm metadata.
pub mod endpoints {
    pub const HAPROXY_ROUTE: &str = "haproxy-route";
    pub const HAPROXY_ROUTE_TCP: &str = "haproxy-route-tcp";
    pub const INGRESS: &str = "ingress";
    pub const INGRESS_PER_UNIT: &str = "ingress-per-unit";
    pub const REVERSEPROXY: &str = "reverseproxy";
    pub const SPOE_AUTH: &str = "spoe-auth";
    pub const DDOS_PROTECTION: &str = "ddos-protection";
    pub const CERTIFICATES: &str = "certificates";
    pub const RECEIVE_CA_CERTS: &str = "receive-ca-certs";
    pub const PEERS: &str = "haproxy-peers";
}

//! State assembly: turns a model snapshot into the aggregate the renderer
//! consumes.
//!
//! Every relation is decoded on its own. A relation that fails decoding or
//! clashes with another one is recorded as rejected with a reason and
//! simply left out; it never prevents the other requirers from being
//! served.

mod arbiter;
mod assembly;
mod ca;
mod ddos;
mod ingress;
mod legacy;
mod mode;
mod peers;
mod route;
mod route_tcp;
mod spoe;
mod types;
#[cfg(test)]
mod tests;

pub use assembly::assemble;
pub use mode::{exclusive_conflict, select_mode};
pub use peers::peer_name;
pub use types::{
    HttpBackend, LegacyFrontend, LegacyServerLine, Peer, ProxyMode, ProxyState, Rejection,
    RejectionKind, RequirersInformation, RewriteRule, Server, SpoeAgent, TcpBackend, TcpFrontend,
};

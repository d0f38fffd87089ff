mod arbiter_tests;
mod legacy_tests;
mod tcp_frontend_tests;

use crate::model::ModelSnapshot;
use crate::settings::OperatorSettings;
use crate::state::{ProxyState, assemble};

pub(crate) fn assemble_default(snapshot: &ModelSnapshot) -> ProxyState {
    assemble(snapshot, &OperatorSettings::default())
}

pub(crate) const CA_PEM: &str =
    "-----BEGIN CERTIFICATE-----\nMIIBtest\n-----END CERTIFICATE-----";

use crate::interfaces::is_valid_fqdn;
use crate::validation::{GLOBAL_MAXCONN, Origin, PEER_PORT, ValidationReport, validate_range};
use serde::{Deserialize, Deserializer, Serialize};

/// Options an administrator sets on the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CharmConfig {
    /// Hostname clients use to reach the proxy; also the default hostname of
    /// backends that do not declare one.
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub external_hostname: Option<String>,
    #[serde(default = "default_global_maxconn")]
    pub global_maxconn: u32,
    #[serde(default)]
    pub enable_hsts: bool,
    #[serde(default)]
    pub disable_ddos_protection: bool,
    #[serde(default = "default_peer_port")]
    pub peer_port: u16,
}

fn default_global_maxconn() -> u32 {
    4096
}

fn default_peer_port() -> u16 {
    10000
}

impl Default for CharmConfig {
    fn default() -> Self {
        Self {
            external_hostname: None,
            global_maxconn: default_global_maxconn(),
            enable_hsts: false,
            disable_ddos_protection: false,
            peer_port: default_peer_port(),
        }
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty()))
}

impl CharmConfig {
    pub fn validate(&self, report: &mut ValidationReport) {
        if let Some(hostname) = &self.external_hostname
            && !is_valid_fqdn(hostname)
        {
            report.invalid_external_hostname(hostname, &Origin::charm_config("external-hostname"));
        }

        validate_range(
            self.global_maxconn,
            &GLOBAL_MAXCONN,
            report,
            &Origin::charm_config("global-maxconn"),
        );
        validate_range(
            self.peer_port,
            &PEER_PORT,
            report,
            &Origin::charm_config("peer-port"),
        );
    }
}

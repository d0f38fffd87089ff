//! `ingress-per-unit`: one route per requirer unit.

use crate::databag::{DatabagModel, Violations};
use crate::interfaces::ingress::{IngressScheme, IngressUrl};
use crate::interfaces::is_valid_identifier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngressMode {
    #[default]
    Http,
    Tcp,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IngressPerUnitRequirerUnitData {
    pub model: String,
    pub name: String,
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub mode: IngressMode,
    #[serde(default)]
    pub strip_prefix: bool,
    #[serde(default)]
    pub redirect_https: bool,
    #[serde(default)]
    pub scheme: IngressScheme,
}

impl IngressPerUnitRequirerUnitData {
    /// `<model>-<unit name with '/' replaced by '-'>`.
    pub fn route_name(&self) -> String {
        format!("{}-{}", self.model, self.name.replace('/', "-"))
    }
}

impl DatabagModel for IngressPerUnitRequirerUnitData {
    const KEYS: &'static [&'static str] = &[
        "model",
        "name",
        "host",
        "port",
        "mode",
        "strip-prefix",
        "redirect-https",
        "scheme",
    ];

    fn validate(&self) -> Result<(), Vec<String>> {
        let mut v = Violations::default();
        v.ensure(is_valid_identifier(&self.model), "model", "invalid model name");
        v.ensure(
            self.name.split('/').all(is_valid_identifier),
            "name",
            "invalid unit name",
        );
        v.ensure(
            !self.host.is_empty() && !self.host.contains(char::is_whitespace),
            "host",
            "invalid host",
        );
        v.ensure(self.port > 0, "port", "must be between 1 and 65535");
        v.ensure(
            self.mode == IngressMode::Http,
            "mode",
            "tcp ingress is not supported",
        );
        v.into_result()
    }
}

/// Urls keyed by requirer unit name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressPerUnitProviderAppData {
    #[serde(default)]
    pub ingress: BTreeMap<String, IngressUrl>,
}

impl DatabagModel for IngressPerUnitProviderAppData {
    const KEYS: &'static [&'static str] = &["ingress"];
}

//! `ingress` (v2), the traefik-compatible per-application ingress.

use crate::databag::{DatabagModel, Violations};
use crate::interfaces::is_valid_identifier;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use url::Url;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngressScheme {
    #[default]
    Http,
    Https,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IngressRequirerAppData {
    pub model: String,
    pub name: String,
    pub port: u16,
    #[serde(default)]
    pub strip_prefix: bool,
    #[serde(default)]
    pub redirect_https: bool,
    #[serde(default)]
    pub scheme: IngressScheme,
}

impl IngressRequirerAppData {
    /// `<model>-<name>`, used both as backend name and path prefix.
    pub fn route_name(&self) -> String {
        format!("{}-{}", self.model, self.name)
    }
}

impl DatabagModel for IngressRequirerAppData {
    const KEYS: &'static [&'static str] = &[
        "model",
        "name",
        "port",
        "strip-prefix",
        "redirect-https",
        "scheme",
    ];

    fn validate(&self) -> Result<(), Vec<String>> {
        let mut v = Violations::default();
        v.ensure(is_valid_identifier(&self.model), "model", "invalid model name");
        v.ensure(is_valid_identifier(&self.name), "name", "invalid application name");
        v.ensure(self.port > 0, "port", "must be between 1 and 65535");
        v.into_result()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressRequirerUnitData {
    pub host: String,
    #[serde(default)]
    pub ip: Option<IpAddr>,
}

impl DatabagModel for IngressRequirerUnitData {
    const KEYS: &'static [&'static str] = &["host", "ip"];

    fn validate(&self) -> Result<(), Vec<String>> {
        let mut v = Violations::default();
        v.ensure(
            !self.host.is_empty() && !self.host.contains(char::is_whitespace),
            "host",
            "invalid host",
        );
        v.into_result()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressUrl {
    pub url: Url,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressProviderAppData {
    #[serde(default)]
    pub ingress: Option<IngressUrl>,
}

impl DatabagModel for IngressProviderAppData {
    const KEYS: &'static [&'static str] = &["ingress"];
}

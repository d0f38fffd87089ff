//! Legacy `reverseproxy` (http interface).
//!
//! Unlike the other interfaces the unit databag holds raw strings, and
//! `services` is a YAML document describing whole HAProxy sections.

use crate::databag::{DataValidationError, Databag, Violations};
use crate::interfaces::validators::has_line_break;
use crate::interfaces::{is_valid_fqdn, is_valid_identifier};
use serde::{Deserialize, Deserializer};
use std::net::IpAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyServer {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LegacyService {
    pub service_name: String,
    #[serde(default = "default_service_host")]
    pub service_host: String,
    #[serde(deserialize_with = "port_from_int_or_string")]
    pub service_port: u16,
    #[serde(default, deserialize_with = "options_from_string_or_list")]
    pub service_options: Vec<String>,
    #[serde(default, deserialize_with = "options_from_string_or_list")]
    pub server_options: Vec<String>,
    #[serde(default, deserialize_with = "servers_from_tuples")]
    pub servers: Vec<LegacyServer>,
}

fn default_service_host() -> String {
    "0.0.0.0".to_string()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PortValue {
    Int(u16),
    Str(String),
}

impl PortValue {
    fn into_port<E: serde::de::Error>(self) -> Result<u16, E> {
        match self {
            Self::Int(port) => Ok(port),
            Self::Str(raw) => raw
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("invalid port '{}'", raw))),
        }
    }
}

fn port_from_int_or_string<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    PortValue::deserialize(deserializer)?.into_port()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Options {
    One(String),
    Many(Vec<String>),
}

impl Options {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(option) if option.trim().is_empty() => Vec::new(),
            Self::One(option) => vec![option],
            Self::Many(options) => options,
        }
    }
}

fn options_from_string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Options>::deserialize(deserializer)?
        .map(Options::into_vec)
        .unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawServer {
    WithOptions(String, String, PortValue, Options),
    Bare(String, String, PortValue),
}

fn servers_from_tuples<'de, D>(deserializer: D) -> Result<Vec<LegacyServer>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<RawServer>>::deserialize(deserializer)?.unwrap_or_default();
    raw.into_iter()
        .map(|server| {
            let (name, host, port, options) = match server {
                RawServer::WithOptions(name, host, port, options) => {
                    (name, host, port, options.into_vec())
                }
                RawServer::Bare(name, host, port) => (name, host, port, Vec::new()),
            };
            Ok(LegacyServer {
                name,
                host,
                port: port.into_port::<D::Error>()?,
                options,
            })
        })
        .collect()
}

impl LegacyService {
    fn validate(&self) -> Violations {
        let mut v = Violations::default();
        v.ensure(
            is_valid_identifier(&self.service_name),
            "service_name",
            format!("invalid service name '{}'", self.service_name),
        );
        v.ensure(
            self.service_host.parse::<IpAddr>().is_ok() || is_valid_fqdn(&self.service_host),
            "service_host",
            format!("invalid bind address '{}'", self.service_host),
        );
        v.ensure(self.service_port > 0, "service_port", "must be between 1 and 65535");
        for option in self.service_options.iter().chain(self.server_options.iter()) {
            v.ensure(
                !has_line_break(option),
                "options",
                "must not contain line breaks",
            );
        }
        for server in &self.servers {
            v.ensure(
                is_valid_identifier(&server.name),
                "servers",
                format!("invalid server name '{}'", server.name),
            );
            v.ensure(
                !server.host.is_empty() && !server.host.contains(char::is_whitespace),
                "servers",
                format!("invalid server host '{}'", server.host),
            );
            v.ensure(server.port > 0, "servers", "port must be between 1 and 65535");
            v.ensure(
                server.options.iter().all(|o| !has_line_break(o)),
                "servers",
                "options must not contain line breaks",
            );
        }
        v
    }
}

/// Parse the `services` YAML document of one unit.
pub fn parse_services(raw: &str) -> Result<Vec<LegacyService>, DataValidationError> {
    let services: Option<Vec<LegacyService>> = serde_yaml::from_str(raw)
        .map_err(|e| DataValidationError::schema(format!("services: {}", e)))?;
    let services = services.unwrap_or_default();

    let mut v = Violations::default();
    for (i, service) in services.iter().enumerate() {
        v.extend_nested(&format!("services[{}]", i), service.validate());
    }
    v.into_result()
        .map_err(|reasons| DataValidationError::Schema { reasons })?;

    Ok(services)
}

/// Unit databag of a legacy requirer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyUnitData {
    pub hostname: Option<String>,
    pub private_address: Option<String>,
    pub port: Option<u16>,
    pub services: Vec<LegacyService>,
}

impl LegacyUnitData {
    pub fn load(databag: &Databag) -> Result<Self, DataValidationError> {
        let non_empty = |key: &str| {
            databag
                .get(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let port = match non_empty("port") {
            Some(raw) => Some(raw.parse::<u16>().map_err(|_| {
                DataValidationError::schema(format!("port: invalid port '{}'", raw))
            })?),
            None => None,
        };

        let services = match non_empty("services") {
            Some(raw) => parse_services(&raw)?,
            None => Vec::new(),
        };

        Ok(Self {
            hostname: non_empty("hostname"),
            private_address: non_empty("private-address"),
            port,
            services,
        })
    }

    /// Address the unit can be reached on, preferring `hostname`.
    pub fn address(&self) -> Option<&str> {
        self.hostname
            .as_deref()
            .or(self.private_address.as_deref())
    }
}

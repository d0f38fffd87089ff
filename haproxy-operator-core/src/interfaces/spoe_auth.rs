//! `spoe-auth`: an OIDC authentication agent reached through SPOE.

use crate::databag::{DatabagModel, Violations};
use crate::interfaces::haproxy_route::RouteRequirerUnitData;
use crate::interfaces::{is_valid_fqdn, is_valid_identifier};
use serde::{Deserialize, Serialize};

/// Agent units publish the same `address` record as route requirers.
pub type SpoeAuthProviderUnitData = RouteRequirerUnitData;

/// HAProxy variable scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarScope {
    Proc,
    #[default]
    Sess,
    Txn,
    Req,
    Res,
}

impl VarScope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Proc => "proc",
            Self::Sess => "sess",
            Self::Txn => "txn",
            Self::Req => "req",
            Self::Res => "res",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpoeEvent {
    #[default]
    OnFrontendHttpRequest,
    OnBackendHttpRequest,
}

impl SpoeEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OnFrontendHttpRequest => "on-frontend-http-request",
            Self::OnBackendHttpRequest => "on-backend-http-request",
        }
    }
}

fn default_callback_path() -> String {
    "/oauth2/callback".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpoeAuthProviderAppData {
    pub spop_port: u16,
    pub oidc_callback_port: u16,
    #[serde(default)]
    pub event: SpoeEvent,
    pub message_name: String,
    pub var_authenticated: String,
    #[serde(default)]
    pub var_authenticated_scope: VarScope,
    pub var_redirect_url: String,
    #[serde(default)]
    pub var_redirect_url_scope: VarScope,
    pub cookie_name: String,
    #[serde(default = "default_callback_path")]
    pub oidc_callback_path: String,
    pub hostname: String,
}

impl Default for SpoeAuthProviderAppData {
    fn default() -> Self {
        Self {
            spop_port: 0,
            oidc_callback_port: 0,
            event: SpoeEvent::default(),
            message_name: String::new(),
            var_authenticated: String::new(),
            var_authenticated_scope: VarScope::default(),
            var_redirect_url: String::new(),
            var_redirect_url_scope: VarScope::default(),
            cookie_name: String::new(),
            oidc_callback_path: default_callback_path(),
            hostname: String::new(),
        }
    }
}

impl SpoeAuthProviderAppData {
    /// Variable holding the authentication verdict, as set by an agent
    /// whose variables carry `prefix`.
    pub fn authenticated_var(&self, prefix: &str) -> String {
        format!(
            "{}.{}.{}",
            self.var_authenticated_scope.as_str(),
            prefix,
            self.var_authenticated
        )
    }

    pub fn redirect_url_var(&self, prefix: &str) -> String {
        format!(
            "{}.{}.{}",
            self.var_redirect_url_scope.as_str(),
            prefix,
            self.var_redirect_url
        )
    }
}

impl DatabagModel for SpoeAuthProviderAppData {
    const KEYS: &'static [&'static str] = &[
        "spop_port",
        "oidc_callback_port",
        "event",
        "message_name",
        "var_authenticated",
        "var_authenticated_scope",
        "var_redirect_url",
        "var_redirect_url_scope",
        "cookie_name",
        "oidc_callback_path",
        "hostname",
    ];

    fn validate(&self) -> Result<(), Vec<String>> {
        let mut v = Violations::default();
        v.ensure(self.spop_port > 0, "spop_port", "must be between 1 and 65535");
        v.ensure(
            self.oidc_callback_port > 0,
            "oidc_callback_port",
            "must be between 1 and 65535",
        );
        v.ensure(
            self.spop_port != self.oidc_callback_port,
            "oidc_callback_port",
            "must differ from spop_port",
        );
        for (field, value) in [
            ("message_name", &self.message_name),
            ("var_authenticated", &self.var_authenticated),
            ("var_redirect_url", &self.var_redirect_url),
            ("cookie_name", &self.cookie_name),
        ] {
            v.ensure(
                is_valid_identifier(value),
                field,
                format!("invalid name '{}'", value),
            );
        }
        v.ensure(
            self.oidc_callback_path.starts_with('/')
                && !self.oidc_callback_path.contains(char::is_whitespace),
            "oidc_callback_path",
            "must be an absolute path",
        );
        v.ensure(
            is_valid_fqdn(&self.hostname),
            "hostname",
            format!("invalid hostname '{}'", self.hostname),
        );
        v.into_result()
    }
}

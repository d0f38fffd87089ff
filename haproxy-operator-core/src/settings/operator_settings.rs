use crate::settings::SettingsError;
use crate::validation::{
    Origin, RELOAD_RETRIES, VALIDATE_TIMEOUT_SECONDS, ValidationReport, validate_range,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE: &str = "haproxy.cfg";
pub const CANDIDATE_FILE: &str = "haproxy.cfg.candidate";
pub const SPOE_AUTH_FILE: &str = "spoe_auth.conf";
pub const DHPARAM_FILE: &str = "ffdhe2048.txt";
pub const CA_BUNDLE_FILE: &str = "cas.pem";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OperatorSettings {
    pub config_dir: PathBuf,
    pub certs_dir: PathBuf,
    pub cas_dir: PathBuf,
    pub haproxy_binary: PathBuf,
    pub package_name: String,
    pub service_unit: String,
    /// Owner of every file written for HAProxy.
    pub haproxy_user: String,
    pub validate_timeout_seconds: u64,
    pub reload_retries: u32,
}

impl Default for OperatorSettings {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from("/etc/haproxy"),
            certs_dir: PathBuf::from("/var/lib/haproxy/certs"),
            cas_dir: PathBuf::from("/var/lib/haproxy/cas"),
            haproxy_binary: PathBuf::from("/usr/sbin/haproxy"),
            package_name: "haproxy".to_string(),
            service_unit: "haproxy".to_string(),
            haproxy_user: "haproxy".to_string(),
            validate_timeout_seconds: 30,
            reload_retries: 1,
        }
    }
}

impl OperatorSettings {
    /// Read settings from `path`; defaults apply when no file is given.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, SettingsError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let raw = fs::read_to_string(path).map_err(|source| SettingsError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;

        let settings: Self = hcl::from_str(&raw).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let report = settings.validate(path);
        if report.has_errors() {
            return Err(SettingsError::Validation {
                path: path.to_path_buf(),
                report,
            });
        }

        Ok(settings)
    }

    pub fn validate(&self, file: &Path) -> ValidationReport {
        let mut report = ValidationReport::default();

        for (key, dir) in [
            ("config_dir", &self.config_dir),
            ("certs_dir", &self.certs_dir),
            ("cas_dir", &self.cas_dir),
            ("haproxy_binary", &self.haproxy_binary),
        ] {
            if !dir.is_absolute() {
                report.path_must_be_absolute(dir, &Origin::settings(file, key));
            }
        }

        for (key, value) in [
            ("package_name", &self.package_name),
            ("service_unit", &self.service_unit),
            ("haproxy_user", &self.haproxy_user),
        ] {
            if value.trim().is_empty() {
                report.empty_setting(&Origin::settings(file, key));
            }
        }

        validate_range(
            self.validate_timeout_seconds,
            &VALIDATE_TIMEOUT_SECONDS,
            &mut report,
            &Origin::settings(file, "validate_timeout_seconds"),
        );
        validate_range(
            self.reload_retries,
            &RELOAD_RETRIES,
            &mut report,
            &Origin::settings(file, "reload_retries"),
        );

        report
    }

    pub fn validate_timeout(&self) -> Duration {
        Duration::from_secs(self.validate_timeout_seconds)
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    pub fn candidate_path(&self) -> PathBuf {
        self.config_dir.join(CANDIDATE_FILE)
    }

    pub fn spoe_auth_path(&self) -> PathBuf {
        self.config_dir.join(SPOE_AUTH_FILE)
    }

    pub fn dhparam_path(&self) -> PathBuf {
        self.config_dir.join(DHPARAM_FILE)
    }

    pub fn ca_bundle_path(&self) -> PathBuf {
        self.cas_dir.join(CA_BUNDLE_FILE)
    }

    pub fn certificate_path(&self, hostname: &str) -> PathBuf {
        self.certs_dir.join(format!("{}.pem", hostname))
    }
}

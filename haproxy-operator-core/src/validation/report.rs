use crate::validation::Origin;
use owo_colors::OwoColorize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub message: String,
    pub origin: Origin,
    pub help: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Default, Clone)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

#[derive(Serialize)]
struct ValidationReportJson<'a> {
    errors: &'a [ValidationIssue],
    warnings: &'a [ValidationIssue],
}

impl ValidationReport {
    pub fn has_violations(&self) -> bool {
        !self.errors.is_empty() || !self.warnings.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// First error formatted as `<origin>: <message>`, used as a status line.
    pub fn first_error(&self) -> Option<String> {
        self.errors
            .first()
            .map(|issue| format!("{}: {}", issue.origin.section, issue.message))
    }

    pub(crate) fn error(&mut self, message: String, origin: &Origin, help: Option<String>) {
        self.errors.push(ValidationIssue {
            severity: Severity::Error,
            message,
            origin: origin.clone(),
            help,
        });
    }

    pub(crate) fn warning(&mut self, message: String, origin: &Origin, help: Option<String>) {
        self.warnings.push(ValidationIssue {
            severity: Severity::Warning,
            message,
            origin: origin.clone(),
            help,
        });
    }

    pub fn render_json(&self) -> Result<String, serde_json::Error> {
        let json = ValidationReportJson {
            errors: &self.errors,
            warnings: &self.warnings,
        };

        serde_json::to_string_pretty(&json)
    }

    pub fn render_plain(&self) -> String {
        let mut out = String::new();
        for issue in self.errors.iter().chain(self.warnings.iter()) {
            let severity = match issue.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
            };

            let _ = writeln!(out, "{}: {}: {}", issue.origin, severity, issue.message);

            if let Some(help) = &issue.help {
                let _ = writeln!(out, "  help: {}", help);
            }
        }
        out
    }

    pub fn render_pretty(&self) -> String {
        let mut out = String::new();
        let errors = self.errors.len();
        let warnings = self.warnings.len();

        if errors > 0 || warnings > 0 {
            let _ = writeln!(
                out,
                "validation failed ({} errors, {} warnings)\n",
                errors, warnings
            );
        }

        let mut by_source = BTreeMap::new();
        for issue in self.errors.iter().chain(self.warnings.iter()) {
            by_source
                .entry(issue.origin.to_string())
                .or_insert(Vec::new())
                .push(issue);
        }

        for (source, issues) in by_source {
            let _ = writeln!(out, "{}", source);

            for issue in issues {
                match issue.severity {
                    Severity::Error => {
                        let _ = writeln!(out, "  {}: {}", "error".red().bold(), issue.message);
                    }
                    Severity::Warning => {
                        let _ = writeln!(out, "  {}: {}", "warning".yellow().bold(), issue.message);
                    }
                }
                if let Some(help) = &issue.help {
                    let _ = writeln!(out, "  {}: {}", "help".cyan(), help);
                }
            }
            out.push('\n');
        }
        out
    }
}

/// Charm Config Validation
impl ValidationReport {
    pub fn invalid_external_hostname(&mut self, hostname: &str, origin: &Origin) {
        self.error(
            format!("invalid external hostname: {}", hostname),
            origin,
            Some("Use a fully qualified domain name such as haproxy.example.com.".to_string()),
        )
    }
}

/// Operator Settings Validation
impl ValidationReport {
    pub fn path_must_be_absolute(&mut self, path: &Path, origin: &Origin) {
        self.error(
            format!("path must be absolute: {}", path.display()),
            origin,
            None,
        )
    }

    pub fn empty_setting(&mut self, origin: &Origin) {
        self.error("value must not be empty".to_string(), origin, None)
    }
}

/// Relation Data Validation
impl ValidationReport {
    pub fn rejected_relation(&mut self, reason: &str, origin: &Origin) {
        self.error(
            format!("relation data rejected: {}", reason),
            origin,
            Some("The requirer will not receive endpoints until its data is fixed.".to_string()),
        )
    }

    pub fn overlapping_routes(&mut self, message: &str, origin: &Origin) {
        self.warning(message.to_string(), origin, None)
    }
}

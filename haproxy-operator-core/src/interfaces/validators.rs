use once_cell::sync::Lazy;
use regex::Regex;

const FQDN_MAX_LEN: usize = 253;

// First label must start with a letter; no label may start or end with '-'.
static FQDN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^[a-z](?:[a-z0-9-]{0,61}[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?)+$",
    )
    .expect("fqdn regex")
});

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$").expect("identifier regex"));

pub fn is_valid_fqdn(hostname: &str) -> bool {
    !hostname.is_empty() && hostname.len() <= FQDN_MAX_LEN && FQDN.is_match(hostname)
}

/// An SNI is an FQDN, optionally prefixed with a single leading `*.` label.
/// `*.com` and `api.*.example.com` are rejected.
pub fn is_valid_sni(sni: &str) -> bool {
    match sni.strip_prefix("*.") {
        Some(rest) => !rest.contains('*') && is_valid_fqdn(rest),
        None => !sni.contains('*') && is_valid_fqdn(sni),
    }
}

/// Names that end up as HAProxy section or ACL identifiers.
pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

pub(crate) fn has_line_break(value: &str) -> bool {
    value.contains('\n') || value.contains('\r')
}

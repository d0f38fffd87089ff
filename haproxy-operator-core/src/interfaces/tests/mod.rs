mod reverseproxy_tests;

use crate::databag::Databag;

pub(crate) fn databag(entries: &[(&str, &str)]) -> Databag {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

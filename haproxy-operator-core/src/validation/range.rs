use crate::validation::{Origin, ValidationReport};

#[derive(Debug, Clone)]
pub struct RangeConstraint<T> {
    pub min: T,
    pub max: T,
    pub label: &'static str,
    pub units: Option<&'static str>,
}

pub const GLOBAL_MAXCONN: RangeConstraint<u32> = RangeConstraint {
    min: 1,
    max: 1_000_000,
    label: "global-maxconn",
    units: None,
};

pub const PEER_PORT: RangeConstraint<u16> = RangeConstraint {
    min: 1,
    max: u16::MAX,
    label: "peer-port",
    units: None,
};

pub const VALIDATE_TIMEOUT_SECONDS: RangeConstraint<u64> = RangeConstraint {
    min: 1,
    max: 300,
    label: "validate_timeout_seconds",
    units: Some("s"),
};

pub const RELOAD_RETRIES: RangeConstraint<u32> = RangeConstraint {
    min: 0,
    max: 1,
    label: "reload_retries",
    units: None,
};

pub fn validate_range<T>(
    value: T,
    constraint: &RangeConstraint<T>,
    report: &mut ValidationReport,
    origin: &Origin,
) where
    T: PartialOrd + std::fmt::Display,
{
    if value < constraint.min || value > constraint.max {
        let units = constraint.units.unwrap_or("");
        report.error(
            format!(
                "invalid {}: {}{} (must be between {}{} and {}{})",
                constraint.label, value, units, constraint.min, units, constraint.max, units
            ),
            origin,
            None,
        );
    }
}

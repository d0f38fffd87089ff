use crate::databag::{DataValidationError, Databag, DatabagModel, Violations};
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Sample {
    name: String,
    #[serde(default = "default_weight")]
    weight: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

fn default_weight() -> u32 {
    1
}

impl Default for Sample {
    fn default() -> Self {
        Self {
            name: String::new(),
            weight: default_weight(),
            comment: None,
            tags: Vec::new(),
        }
    }
}

impl DatabagModel for Sample {
    const KEYS: &'static [&'static str] = &["name", "weight", "comment", "tags"];

    fn validate(&self) -> Result<(), Vec<String>> {
        let mut violations = Violations::default();
        violations.ensure(!self.name.is_empty(), "name", "must not be empty");
        violations.ensure(self.weight > 0, "weight", "must be positive");
        violations.into_result()
    }
}

fn databag(entries: &[(&str, &str)]) -> Databag {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn load_applies_defaults_for_missing_keys() {
    // Arrange
    let bag = databag(&[("name", "\"api\"")]);

    // Act
    let sample = Sample::load(&bag).expect("valid record");

    // Assert
    assert_eq!(
        sample,
        Sample {
            name: "api".to_string(),
            ..Sample::default()
        }
    );
}

#[test]
fn load_ignores_unknown_keys_even_when_not_json() {
    // Arrange
    let bag = databag(&[("name", "\"api\""), ("future-field", "not json at all")]);

    // Act
    let sample = Sample::load(&bag);

    // Assert
    assert!(sample.is_ok());
}

#[test]
fn load_rejects_invalid_json_in_known_key() {
    // Arrange
    let bag = databag(&[("name", "api")]);

    // Act
    let err = Sample::load(&bag).expect_err("must fail");

    // Assert
    assert!(matches!(err, DataValidationError::InvalidJson { ref key, .. } if key == "name"));
    assert_eq!(err.kind(), "data validation");
}

#[test]
fn load_rejects_missing_required_field() {
    // Arrange
    let bag = databag(&[("weight", "3")]);

    // Act
    let err = Sample::load(&bag).expect_err("must fail");

    // Assert
    assert!(err.to_string().contains("missing field `name`"));
}

#[test]
fn load_runs_record_validation() {
    // Arrange
    let bag = databag(&[("name", "\"api\""), ("weight", "0")]);

    // Act
    let err = Sample::load(&bag).expect_err("must fail");

    // Assert
    match err {
        DataValidationError::Schema { reasons } => {
            assert_eq!(reasons, vec!["weight: must be positive".to_string()]);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn dump_omits_defaults() {
    // Arrange
    let sample = Sample {
        name: "api".to_string(),
        weight: 1,
        comment: None,
        tags: vec![],
    };

    // Act
    let bag = sample.dump().expect("encodes");

    // Assert
    assert_eq!(bag, databag(&[("name", "\"api\"")]));
}

#[test]
fn dump_then_load_restores_record() {
    // Arrange
    let sample = Sample {
        name: "api".to_string(),
        weight: 5,
        comment: Some("primary".to_string()),
        tags: vec!["a".to_string(), "b".to_string()],
    };

    // Act
    let restored = Sample::load(&sample.dump().expect("encodes")).expect("decodes");

    // Assert
    assert_eq!(restored, sample);
}

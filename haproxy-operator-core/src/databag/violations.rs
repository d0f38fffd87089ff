/// Collects field-level violations of a single record.
#[derive(Debug, Default)]
pub struct Violations {
    reasons: Vec<String>,
}

impl Violations {
    pub fn push(&mut self, field: &str, message: impl AsRef<str>) {
        self.reasons.push(format!("{}: {}", field, message.as_ref()));
    }

    /// Push `message` for `field` unless `condition` holds.
    pub fn ensure(&mut self, condition: bool, field: &str, message: impl AsRef<str>) {
        if !condition {
            self.push(field, message);
        }
    }

    pub fn extend_nested(&mut self, prefix: &str, nested: Violations) {
        for reason in nested.reasons {
            self.reasons.push(format!("{}.{}", prefix, reason));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.reasons.is_empty()
    }

    pub fn into_result(self) -> Result<(), Vec<String>> {
        if self.reasons.is_empty() {
            Ok(())
        } else {
            Err(self.reasons)
        }
    }
}

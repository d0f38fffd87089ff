use crate::databag::DataValidationError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Per-relation, per-side key to string map exchanged through the platform.
pub type Databag = BTreeMap<String, String>;

/// A typed record stored in a databag, one JSON document per field.
///
/// Implementors list their wire keys in [`DatabagModel::KEYS`]; any other key
/// present in a databag is ignored so that newer peers publishing extra
/// fields do not break older readers.
pub trait DatabagModel: Serialize + DeserializeOwned + Default {
    /// Wire keys understood by this record.
    const KEYS: &'static [&'static str];

    /// Field-level and cross-field checks within the record.
    fn validate(&self) -> Result<(), Vec<String>> {
        Ok(())
    }

    fn load(databag: &Databag) -> Result<Self, DataValidationError> {
        let mut fields = Map::new();
        for key in Self::KEYS {
            let Some(raw) = databag.get(*key) else {
                continue;
            };
            let value: Value =
                serde_json::from_str(raw).map_err(|source| DataValidationError::InvalidJson {
                    key: (*key).to_string(),
                    source,
                })?;
            fields.insert((*key).to_string(), value);
        }

        let record: Self = serde_json::from_value(Value::Object(fields))
            .map_err(|e| DataValidationError::schema(e.to_string()))?;

        record
            .validate()
            .map_err(|reasons| DataValidationError::Schema { reasons })?;

        Ok(record)
    }

    fn dump(&self) -> Result<Databag, DataValidationError> {
        let fields = match serde_json::to_value(self)
            .map_err(|source| DataValidationError::Encode { source })?
        {
            Value::Object(fields) => fields,
            other => {
                return Err(DataValidationError::schema(format!(
                    "record must encode to an object, got {}",
                    other
                )));
            }
        };

        let defaults = match serde_json::to_value(Self::default()) {
            Ok(Value::Object(defaults)) => defaults,
            _ => Map::new(),
        };

        let mut databag = Databag::new();
        for (key, value) in fields {
            if value.is_null() || defaults.get(&key) == Some(&value) {
                continue;
            }
            let encoded = serde_json::to_string(&value)
                .map_err(|source| DataValidationError::Encode { source })?;
            databag.insert(key, encoded);
        }

        Ok(databag)
    }
}

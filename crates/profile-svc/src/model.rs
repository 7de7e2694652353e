//! Profile documents and their stored record shape.
//!
//! A request body deserialises straight into [`Profile`]; sealing fills the
//! `raw` bytes of each [`EncryptedValue`]. [`Profile::to_record`] then writes
//! the record that goes to the store: plain fields as they are, sealed fields
//! as the base64 text of their blob. Record keys are the struct field names,
//! so the same path groups address both the struct and its record.

use fieldcrypt::{blob, Document, EncryptedValue, ScalarType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, Serialize, Deserialize, Document)]
pub struct Profile {
    pub display_name: String,
    #[serde(default)]
    pub email: EncryptedValue<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<EncryptedValue<String>>,
    #[serde(default)]
    pub birth_year: EncryptedValue<i64>,
    #[serde(default)]
    pub companies: Vec<Company>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Document)]
pub struct Company {
    pub name: String,
    #[serde(default)]
    pub position: EncryptedValue<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<EncryptedValue<f64>>,
}

impl Profile {
    /// The storage record for this profile. Absent optionals are omitted.
    pub fn to_record(&self) -> Value {
        let mut record = Map::new();
        record.insert("display_name".into(), Value::String(self.display_name.clone()));
        record.insert("email".into(), stored(&self.email));
        if let Some(phone) = &self.phone {
            record.insert("phone".into(), stored(phone));
        }
        record.insert("birth_year".into(), stored(&self.birth_year));
        record.insert(
            "companies".into(),
            self.companies.iter().map(Company::to_record).collect(),
        );
        Value::Object(record)
    }
}

impl Company {
    /// The storage record for this company. Absent optionals are omitted.
    pub fn to_record(&self) -> Value {
        let mut record = Map::new();
        record.insert("name".into(), Value::String(self.name.clone()));
        record.insert("position".into(), stored(&self.position));
        if let Some(salary) = &self.salary {
            record.insert("salary".into(), stored(salary));
        }
        Value::Object(record)
    }
}

// A field no path group covers is never sealed and is stored as plaintext.
fn stored<T: ScalarType + Serialize>(field: &EncryptedValue<T>) -> Value {
    if field.is_sealed() {
        blob::to_value(field.raw())
    } else {
        serde_json::to_value(field.value()).unwrap_or_default()
    }
}

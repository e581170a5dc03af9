// Permissive mapping of remote contact records.
use serde_json::Value;

/// Substitute for records that arrive without a usable name.
pub const NO_NAME: &str = "(No name)";

/// A remote record reduced to the fields the contact table stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedContact {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Remote records are loosely typed: each field may be a string, a number,
/// null, or missing entirely. Unusable values fall back to defaults instead
/// of failing the batch.
pub fn map_record(record: &Value) -> MappedContact {
    let name = match record.get("name") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) if n.as_f64().is_some_and(|v| v != 0.0) => n.to_string(),
        _ => NO_NAME.to_string(),
    };

    let phone = field_text(record, "phone")
        .map(|p| p.chars().filter(|c| !c.is_whitespace()).collect::<String>())
        .filter(|p| !p.is_empty());

    let email = field_text(record, "email").filter(|e| !e.is_empty());

    MappedContact { name, phone, email }
}

fn field_text(record: &Value, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

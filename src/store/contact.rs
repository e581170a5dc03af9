use serde::{Deserialize, Serialize};

/// A row of the contacts table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub favorite: bool,
    pub created_at: i64,
}

/// Writable contact fields, already trimmed and normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactFields {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl ContactFields {
    /// Trims all three inputs; empty optional strings become `None`.
    /// Returns `None` when the trimmed name is empty.
    pub fn normalized(name: &str, phone: Option<&str>, email: Option<&str>) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            phone: clean_optional(phone),
            email: clean_optional(email),
        })
    }
}

fn clean_optional(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

use serde::Deserialize;
use serde_json::{Map, Value as Json};

use crate::codec::RowObject;

use super::read::{ACTIVE, IS_BODEGA, NAME, SUPPORTS_BIZUM};

/// Payload for creating a bank. Unset flags take their defaults:
/// not a bodega, no Bizum, active.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NewBank {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_bodega: Option<bool>,
    #[serde(default)]
    pub supports_bizum: Option<bool>,
    #[serde(default)]
    pub active: Option<bool>,
}

impl NewBank {
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }

    /// Every problem with the payload, not just the first.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.name.as_deref().map_or(true, |n| n.trim().is_empty()) {
            errors.push("Bank name is required".to_string());
        }
        errors
    }

    /// Reads an untyped create payload, collecting every problem with it.
    pub fn from_json(body: &Json) -> Result<Self, Vec<String>> {
        let fields = object(body)?;
        let mut type_errors = Vec::new();
        let bank = Self {
            name: fields.get(NAME).and_then(Json::as_str).map(str::to_string),
            is_bodega: flag(fields, IS_BODEGA, &mut type_errors),
            supports_bizum: flag(fields, SUPPORTS_BIZUM, &mut type_errors),
            active: flag(fields, ACTIVE, &mut type_errors),
        };
        let mut errors = bank.validate();
        errors.append(&mut type_errors);
        if errors.is_empty() {
            Ok(bank)
        } else {
            Err(errors)
        }
    }
}

fn object(body: &Json) -> Result<&Map<String, Json>, Vec<String>> {
    body.as_object()
        .ok_or_else(|| vec!["Request body must be a JSON object".to_string()])
}

/// An optional boolean field; anything but a boolean or null is recorded as
/// a type error.
fn flag(fields: &Map<String, Json>, key: &str, errors: &mut Vec<String>) -> Option<bool> {
    match fields.get(key) {
        None | Some(Json::Null) => None,
        Some(Json::Bool(value)) => Some(*value),
        Some(_) => {
            errors.push(format!("{} must be a boolean", key));
            None
        }
    }
}

/// Partial update of a bank.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BankUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_bodega: Option<bool>,
    #[serde(default)]
    pub supports_bizum: Option<bool>,
    #[serde(default)]
    pub active: Option<bool>,
}

impl BankUpdate {
    /// Reads an untyped update payload. Keys outside the allow-list are
    /// dropped; allow-listed keys of the wrong type are errors.
    pub fn from_json(body: &Json) -> Result<Self, Vec<String>> {
        let fields = object(body)?;
        let mut errors = Vec::new();
        let name = match fields.get(NAME) {
            None | Some(Json::Null) => None,
            Some(Json::String(name)) => Some(name.clone()),
            Some(_) => {
                errors.push(format!("{} must be a string", NAME));
                None
            }
        };
        let updates = Self {
            name,
            is_bodega: flag(fields, IS_BODEGA, &mut errors),
            supports_bizum: flag(fields, SUPPORTS_BIZUM, &mut errors),
            active: flag(fields, ACTIVE, &mut errors),
        };
        if errors.is_empty() {
            Ok(updates)
        } else {
            Err(errors)
        }
    }

    pub fn active(active: bool) -> Self {
        Self {
            active: Some(active),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.is_bodega.is_none() && self.supports_bizum.is_none() && self.active.is_none()
    }

    /// Only the fields actually present, name trimmed.
    pub fn to_object(&self) -> RowObject {
        let mut object = RowObject::new();
        if let Some(name) = &self.name {
            object.set(NAME, name.trim());
        }
        if let Some(is_bodega) = self.is_bodega {
            object.set(IS_BODEGA, is_bodega);
        }
        if let Some(supports_bizum) = self.supports_bizum {
            object.set(SUPPORTS_BIZUM, supports_bizum);
        }
        if let Some(active) = self.active {
            object.set(ACTIVE, active);
        }
        object
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_create_payload_reports_every_type_error() {
        let errors = NewBank::from_json(&json!({
            "name": "BBVA",
            "is_bodega": "yes",
            "active": 1,
        }))
        .unwrap_err();
        assert_eq!(errors, vec!["is_bodega must be a boolean", "active must be a boolean"]);

        let errors = NewBank::from_json(&json!({ "supports_bizum": "no" })).unwrap_err();
        assert_eq!(errors, vec!["Bank name is required", "supports_bizum must be a boolean"]);
    }

    #[test]
    fn test_create_payload_accepts_nulls_as_unset() {
        let bank = NewBank::from_json(&json!({ "name": "BBVA", "is_bodega": null, "active": false })).unwrap();
        assert_eq!(bank.is_bodega, None);
        assert_eq!(bank.active, Some(false));
    }

    #[test]
    fn test_update_payload_drops_unknown_keys() {
        let updates = BankUpdate::from_json(&json!({ "foo": 1, "supports_bizum": true })).unwrap();
        assert_eq!(updates, BankUpdate { supports_bizum: Some(true), ..BankUpdate::default() });

        let errors = BankUpdate::from_json(&json!({ "name": 5, "active": "true" })).unwrap_err();
        assert_eq!(errors, vec!["name must be a string", "active must be a boolean"]);
        assert!(BankUpdate::from_json(&json!([1, 2])).is_err());
    }
}

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct ClientId(pub i64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    #[serde(default)]
    pub salary: f64,
    #[serde(default)]
    pub company_valuation: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Client {
    /// Shallow-merges every field set on `patch` into this record.
    pub fn apply(&mut self, patch: &ClientPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(salary) = patch.salary {
            self.salary = salary;
        }
        if let Some(valuation) = patch.company_valuation {
            self.company_valuation = valuation;
        }
    }
}

/// Client fields without identity or audit stamps: the request body of
/// create and update calls.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClientDraft {
    pub name: String,
    pub salary: f64,
    pub company_valuation: f64,
}

impl ClientDraft {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        if self.name.trim().is_empty() {
            errors.insert("name", "Name is required");
        }
        if !(self.salary > 0.0) {
            errors.insert("salary", "Salary must be greater than zero");
        }
        if !(self.company_valuation > 0.0) {
            errors.insert("companyValuation", "Company valuation must be greater than zero");
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl From<ClientDraft> for ClientPatch {
    fn from(draft: ClientDraft) -> Self {
        Self {
            name: Some(draft.name),
            salary: Some(draft.salary),
            company_valuation: Some(draft.company_valuation),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClientPatch {
    pub name: Option<String>,
    pub salary: Option<f64>,
    pub company_valuation: Option<f64>,
}

/// Per-field validation messages, keyed by the wire name of the field.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn insert(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.values().map(String::as_str).collect();
        write!(f, "{}", messages.join("; "))
    }
}

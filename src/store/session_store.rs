use serde::{Deserialize, Serialize};

use super::persist::StoreListener;

pub const SESSION_KEY: &str = "user-storage";
pub const MIN_NAME_LEN: usize = 2;
pub const MAX_NAME_LEN: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter your name")]
    EmptyName,
    #[error("Name must be at least 2 characters")]
    NameTooShort,
}

/// Trims the login input and checks it can serve as a display name.
pub fn validate_display_name(input: &str) -> Result<String, ValidationError> {
    let name = input.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if name.chars().count() < MIN_NAME_LEN {
        return Err(ValidationError::NameTooShort);
    }
    Ok(name.to_string())
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub user: Option<String>,
}

#[derive(Default)]
pub struct SessionStore {
    state: SessionState,
    listeners: Vec<Box<dyn StoreListener<SessionState>>>,
}

impl SessionStore {
    pub fn from_state(state: SessionState) -> Self {
        Self {
            state,
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn StoreListener<SessionState>>) {
        self.listeners.push(listener);
    }

    fn notify(&mut self) {
        for listener in self.listeners.iter_mut() {
            listener.on_change(&self.state);
        }
    }

    pub fn user(&self) -> Option<&str> {
        self.state.user.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.user.is_some()
    }

    pub fn set_user(&mut self, name: impl Into<String>) {
        self.state.user = Some(name.into());
        self.notify();
    }

    pub fn clear_user(&mut self) {
        self.state.user = None;
        self.notify();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::persist::{MemoryStorage, PersistWriter, Storage, restore};

    #[test]
    fn display_name_rules() {
        assert_eq!(validate_display_name("   "), Err(ValidationError::EmptyName));
        assert_eq!(validate_display_name("A"), Err(ValidationError::NameTooShort));
        assert_eq!(validate_display_name(" Al "), Ok("Al".to_string()));
        assert_eq!(
            ValidationError::NameTooShort.to_string(),
            "Name must be at least 2 characters"
        );
    }

    #[test]
    fn session_round_trips_through_storage() {
        let storage = MemoryStorage::new();
        let mut store = SessionStore::default();
        store.subscribe(Box::new(PersistWriter::new(Box::new(storage.clone()), SESSION_KEY)));

        store.set_user("Al");
        let restored: SessionState = restore(&storage, SESSION_KEY).unwrap().unwrap();
        assert_eq!(SessionStore::from_state(restored).user(), Some("Al"));

        store.clear_user();
        let json = storage.read(SESSION_KEY).unwrap().unwrap();
        assert_eq!(json, r#"{"user":null}"#);
    }
}

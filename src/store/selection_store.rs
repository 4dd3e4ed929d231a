use serde::{Deserialize, Serialize};

use super::persist::StoreListener;
use crate::models::{Client, ClientId};

pub const SELECTION_KEY: &str = "selected-clients-storage";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SelectionState {
    pub selected_clients: Vec<Client>,
}

/// Clients the user has marked, kept as full snapshots so they outlive the
/// page they were picked from.
#[derive(Default)]
pub struct SelectionStore {
    state: SelectionState,
    listeners: Vec<Box<dyn StoreListener<SelectionState>>>,
}

impl SelectionStore {
    pub fn from_state(mut state: SelectionState) -> Self {
        // Older state files may carry repeats; keep the first snapshot.
        let mut seen = Vec::new();
        state.selected_clients.retain(|c| {
            if seen.contains(&c.id) {
                false
            } else {
                seen.push(c.id);
                true
            }
        });
        Self {
            state,
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn StoreListener<SelectionState>>) {
        self.listeners.push(listener);
    }

    fn notify(&mut self) {
        for listener in self.listeners.iter_mut() {
            listener.on_change(&self.state);
        }
    }

    pub fn selected_clients(&self) -> &[Client] {
        &self.state.selected_clients
    }

    pub fn len(&self) -> usize {
        self.state.selected_clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.selected_clients.is_empty()
    }

    pub fn is_client_selected(&self, id: ClientId) -> bool {
        self.state.selected_clients.iter().any(|c| c.id == id)
    }

    /// Returns `false` when the id is already selected.
    pub fn add_selected_client(&mut self, client: Client) -> bool {
        if self.is_client_selected(client.id) {
            return false;
        }
        self.state.selected_clients.push(client);
        self.notify();
        true
    }

    pub fn remove_selected_client(&mut self, id: ClientId) -> bool {
        let before = self.state.selected_clients.len();
        self.state.selected_clients.retain(|c| c.id != id);
        if self.state.selected_clients.len() == before {
            return false;
        }
        self.notify();
        true
    }

    pub fn clear_selected_clients(&mut self) {
        self.state.selected_clients.clear();
        self.notify();
    }

    /// Checkbox semantics; returns whether the client ends up selected.
    pub fn toggle(&mut self, client: &Client) -> bool {
        if self.remove_selected_client(client.id) {
            false
        } else {
            self.add_selected_client(client.clone())
        }
    }

    pub fn refresh_snapshot(&mut self, client: &Client) {
        let Some(snapshot) = self
            .state
            .selected_clients
            .iter_mut()
            .find(|c| c.id == client.id)
        else {
            return;
        };
        *snapshot = client.clone();
        self.notify();
    }
}

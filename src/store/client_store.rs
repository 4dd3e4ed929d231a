use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::persist::StoreListener;
use crate::models::{Client, ClientDraft, ClientId, ClientPatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_clients: usize,
}

/// The cached page of clients. Only `clients` is persisted; the page window
/// and request flags are rebuilt at runtime.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ClientState {
    pub clients: Vec<Client>,
    #[serde(skip, default = "first_page")]
    pub current_page: u32,
    #[serde(skip, default = "first_page")]
    pub total_pages: u32,
    #[serde(skip)]
    pub total_clients: usize,
    #[serde(skip)]
    pub is_loading: bool,
    #[serde(skip)]
    pub error: Option<String>,
}

fn first_page() -> u32 {
    1
}

impl Default for ClientState {
    fn default() -> Self {
        Self {
            clients: Vec::new(),
            current_page: 1,
            total_pages: 1,
            total_clients: 0,
            is_loading: false,
            error: None,
        }
    }
}

/// A one-page window over the client records.
///
/// Lookups only see the page that is currently loaded; the remote service
/// stays the source of truth.
#[derive(Default)]
pub struct ClientStore {
    state: ClientState,
    listeners: Vec<Box<dyn StoreListener<ClientState>>>,
}

impl ClientStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store from persisted state; the page counters are derived
    /// from the restored records.
    pub fn from_state(mut state: ClientState) -> Self {
        state.total_clients = state.clients.len();
        Self {
            state,
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn StoreListener<ClientState>>) {
        self.listeners.push(listener);
    }

    fn notify(&mut self) {
        for listener in self.listeners.iter_mut() {
            listener.on_change(&self.state);
        }
    }

        pub fn clients(&self) -> &[Client] {
        &self.state.clients
    }

    pub fn pagination(&self) -> Pagination {
        Pagination {
            current_page: self.state.current_page,
            total_pages: self.state.total_pages,
            total_clients: self.state.total_clients,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error.as_deref()
    }

    pub fn set_clients(&mut self, clients: Vec<Client>) {
        self.state.clients = clients;
        self.notify();
    }

    pub fn set_pagination(&mut self, pagination: Pagination) {
        self.state.current_page = pagination.current_page;
        self.state.total_pages = pagination.total_pages;
        self.state.total_clients = pagination.total_clients;
        self.notify();
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.state.is_loading = loading;
        self.notify();
    }

    pub fn set_error(&mut self, error: Option<String>) {
        self.state.error = error;
        self.notify();
    }

    /// Creates a record locally: the id comes from the clock and both audit
    /// stamps share one reading.
    pub fn add_client(&mut self, draft: ClientDraft) -> Client {
        let now = Utc::now();
        let mut id = now.timestamp_millis();
        if let Some(max) = self.state.clients.iter().map(|c| c.id.0).max() {
            id = id.max(max + 1);
        }

        let client = Client {
            id: ClientId(id),
            name: draft.name,
            salary: draft.salary,
            company_valuation: draft.company_valuation,
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.state.clients.push(client.clone());
        self.state.total_clients += 1;
        self.notify();
        client
    }

    /// Caches a record the server has already created.
    pub fn insert_client(&mut self, client: Client) {
        match self.state.clients.iter_mut().find(|c| c.id == client.id) {
            Some(existing) => *existing = client,
            None => {
                self.state.clients.push(client);
                self.state.total_clients += 1;
            }
        }
        self.notify();
    }

    /// Shallow-merges `patch` into the record and stamps `updated_at`.
    /// Unknown ids are ignored.
    pub fn update_client(&mut self, id: ClientId, patch: &ClientPatch) -> bool {
        let Some(client) = self.state.clients.iter_mut().find(|c| c.id == id) else {
            return false;
        };
        client.apply(patch);
        let now = Utc::now();
        client.updated_at = Some(match client.created_at {
            Some(created) if created > now => created,
            _ => now,
        });
        self.notify();
        true
    }

    /// Overwrites the cached record with a server-confirmed copy, keeping the
    /// server's stamps.
    pub fn replace_client(&mut self, client: Client) -> bool {
        let Some(existing) = self.state.clients.iter_mut().find(|c| c.id == client.id) else {
            return false;
        };
        *existing = client;
        self.notify();
        true
    }

    pub fn delete_client(&mut self, id: ClientId) -> Option<Client> {
        let index = self.state.clients.iter().position(|c| c.id == id)?;
        let removed = self.state.clients.remove(index);
        self.state.total_clients = self.state.total_clients.saturating_sub(1);
        self.notify();
        Some(removed)
    }

    pub fn get_client_by_id(&self, id: ClientId) -> Option<&Client> {
        self.state.clients.iter().find(|c| c.id == id)
    }

    /// Case-insensitive name filter over the loaded page.
    pub fn search(&self, term: &str) -> Vec<&Client> {
        let needle = term.trim().to_lowercase();
        self.state
            .clients
            .iter()
            .filter(|c| c.name.to_lowercase().contains(&needle))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::rc::Rc;

    use super::*;

    fn client(id: i64, name: &str) -> Client {
        Client {
            id: ClientId(id),
            name: name.to_string(),
            salary: 1000.0,
            company_valuation: 50000.0,
            created_at: Some(Utc::now() - chrono::Duration::days(1)),
            updated_at: Some(Utc::now() - chrono::Duration::days(1)),
        }
    }

    fn draft(name: &str) -> ClientDraft {
        ClientDraft {
            name: name.to_string(),
            salary: 10.0,
            company_valuation: 20.0,
        }
    }

    fn seeded() -> ClientStore {
        let mut store = ClientStore::new();
        store.set_clients(vec![client(1, "Ana"), client(2, "Bia")]);
        store
    }

    #[test]
    fn update_merges_and_restamps_only_the_target() {
        let mut store = seeded();
        let before = store.clients()[0].updated_at;
        let untouched = store.clients()[1].clone();

        let changed = store.update_client(
            ClientId(1),
            &ClientPatch {
                name: Some("Ana Silva".into()),
                ..ClientPatch::default()
            },
        );

        assert!(changed);
        assert_eq!(store.clients()[0].name, "Ana Silva");
        assert_ne!(store.clients()[0].updated_at, before);
        assert_eq!(store.clients()[1], untouched);
    }

    #[test]
    fn update_and_delete_ignore_unknown_ids() {
        let mut store = seeded();
        store.set_pagination(Pagination {
            current_page: 1,
            total_pages: 1,
            total_clients: 2,
        });

        assert!(!store.update_client(ClientId(99), &ClientPatch::default()));
        assert_eq!(store.delete_client(ClientId(99)), None);
        assert_eq!(store.pagination().total_clients, 2);
        assert_eq!(store.clients().len(), 2);
    }

    #[test]
    fn delete_then_lookup_is_absent() {
        let mut store = seeded();
        store.set_pagination(Pagination {
            current_page: 1,
            total_pages: 1,
            total_clients: 2,
        });

        let removed = store.delete_client(ClientId(2)).unwrap();
        assert_eq!(removed.name, "Bia");
        assert!(store.get_client_by_id(ClientId(2)).is_none());
        assert_eq!(store.pagination().total_clients, 1);
    }

    #[test]
    fn set_clients_replaces_the_previous_page() {
        let mut store = seeded();
        store.set_clients(vec![client(3, "Caio")]);
        assert!(store.get_client_by_id(ClientId(1)).is_none());
        assert_eq!(store.clients().len(), 1);
    }

    #[test]
    fn ids_stay_unique_across_mixed_mutations() {
        let mut store = seeded();
        for i in 0..50 {
            let added = store.add_client(draft(&format!("Client {i}")));
            if i % 3 == 0 {
                store.delete_client(added.id);
            }
            if i % 5 == 0 {
                store.update_client(added.id, &ClientPatch::from(draft("Renamed")));
            }
        }
        store.insert_client(client(1, "Ana again"));

        let ids: HashSet<ClientId> = store.clients().iter().map(|c| c.id).collect();
        assert_eq!(ids.len(), store.clients().len());
    }

    #[test]
    fn add_stamps_created_and_updated_together() {
        let mut store = ClientStore::new();
        let added = store.add_client(draft("Dora"));
        assert_eq!(added.created_at, added.updated_at);
        assert_eq!(store.pagination().total_clients, 1);
    }

    #[test]
    fn insert_replaces_a_cached_id_without_counting_it_twice() {
        let mut store = ClientStore::new();
        store.insert_client(client(5, "Eva"));
        store.insert_client(client(5, "Eva Souza"));
        assert_eq!(store.clients().len(), 1);
        assert_eq!(store.pagination().total_clients, 1);
        assert_eq!(store.clients()[0].name, "Eva Souza");
    }

    #[test]
    fn search_is_case_insensitive() {
        let store = seeded();
        let hits: Vec<&str> = store.search("AN").iter().map(|c| c.name.as_str()).collect();
        assert_eq!(hits, vec!["Ana"]);
        assert_eq!(store.search("").len(), 2);
    }

    #[test]
    fn listeners_see_each_mutation() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let mut store = ClientStore::new();
        store.subscribe(Box::new(move |state: &ClientState| {
            sink.borrow_mut().push(state.clients.len());
        }));

        store.add_client(draft("Ana"));
        store.add_client(draft("Bia"));
        let first = store.clients()[0].id;
        store.delete_client(first);

        assert_eq!(*seen.borrow(), vec![1, 2, 1]);
    }

    #[test]
    fn persisted_shape_holds_only_clients() {
        let store = seeded();
        let json = serde_json::to_value(&store.state).unwrap();
        assert_eq!(json.as_object().unwrap().len(), 1);
        assert_eq!(json["clients"][1]["name"], "Bia");

        let restored: ClientState = serde_json::from_value(json).unwrap();
        let store = ClientStore::from_state(restored);
        assert_eq!(store.pagination().total_clients, 2);
        assert_eq!(store.pagination().current_page, 1);
    }
}

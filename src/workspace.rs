//! The application state the screens operate on.
//!
//! A `Workspace` owns the session, the client page cache and the selection
//! set. In remote mode every mutation waits for the service to confirm before
//! it touches a store; in local mode there is no service and mutations apply
//! straight away, with the cache persisted alongside the other stores.

use serde::de::DeserializeOwned;

use crate::api::ClientService;
use crate::models::{Client, ClientDraft, ClientId, ClientPatch, FieldErrors};
use crate::store::persist::{PersistWriter, Storage, restore};
use crate::store::{
    CLIENTS_KEY, ClientState, ClientStore, Pagination, SELECTION_KEY, SESSION_KEY,
    SelectionState, SelectionStore, SessionState, SessionStore, ValidationError,
    validate_display_name,
};

/// Page size used when the dashboard counts clients.
const DASHBOARD_SAMPLE: u32 = 100;

pub enum Backend {
    Remote(ClientService),
    Local,
}

#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("{0}")]
    Validation(FieldErrors),
    #[error("{0}")]
    Api(String),
}

pub struct Workspace {
    pub session: SessionStore,
    pub clients: ClientStore,
    pub selection: SelectionStore,
    backend: Backend,
    page_size: u32,
}

/// Unreadable slots are dropped so the next write starts from a clean file.
fn restore_or_default<T: DeserializeOwned + Default>(storage: &mut dyn Storage, key: &str) -> T {
    match restore(&*storage, key) {
        Ok(state) => state.unwrap_or_default(),
        Err(err) => {
            tracing::warn!(key, error = %err, "discarding unreadable persisted state");
            if let Err(err) = storage.remove(key) {
                tracing::warn!(key, error = %err, "failed to remove unreadable state");
            }
            T::default()
        }
    }
}

fn api_failure(service: &ClientService) -> WorkspaceError {
    WorkspaceError::Api(service.error().unwrap_or("Unknown error").to_string())
}

impl Workspace {
    /// Restores persisted stores from `storage` and keeps writing them back
    /// on every change.
    pub fn open<S>(backend: Backend, page_size: u32, mut storage: S) -> Self
    where
        S: Storage + Clone + 'static,
    {
        let mut session =
            SessionStore::from_state(restore_or_default::<SessionState>(&mut storage, SESSION_KEY));
        session.subscribe(Box::new(PersistWriter::new(Box::new(storage.clone()), SESSION_KEY)));

        let mut selection = SelectionStore::from_state(restore_or_default::<SelectionState>(
            &mut storage,
            SELECTION_KEY,
        ));
        selection.subscribe(Box::new(PersistWriter::new(
            Box::new(storage.clone()),
            SELECTION_KEY,
        )));

        let clients = match backend {
            Backend::Remote(_) => ClientStore::new(),
            Backend::Local => {
                let mut clients = ClientStore::from_state(restore_or_default::<ClientState>(
                    &mut storage,
                    CLIENTS_KEY,
                ));
                clients.subscribe(Box::new(PersistWriter::new(Box::new(storage), CLIENTS_KEY)));
                clients
            }
        };

        tracing::info!(
            local = matches!(backend, Backend::Local),
            user = session.user().unwrap_or("-"),
            selected = selection.len(),
            "workspace opened"
        );

        Self {
            session,
            clients,
            selection,
            backend,
            page_size: page_size.max(1),
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self.backend, Backend::Local)
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn login(&mut self, input: &str) -> Result<(), ValidationError> {
        let name = validate_display_name(input)?;
        tracing::info!(user = %name, "session started");
        self.session.set_user(name);
        Ok(())
    }

    pub fn logout(&mut self) {
        tracing::info!("session ended");
        self.session.clear_user();
    }

    /// Replaces the cached page with page `page` from the service. A failed
    /// fetch keeps the current page and records the error.
    pub async fn load_page(&mut self, page: u32) -> Result<(), WorkspaceError> {
        let Backend::Remote(service) = &mut self.backend else {
            let total = self.clients.clients().len();
            self.clients.set_pagination(Pagination {
                current_page: 1,
                total_pages: 1,
                total_clients: total,
            });
            return Ok(());
        };

        self.clients.set_loading(true);
        self.clients.set_error(None);
        let fetched = service.list(page, self.page_size).await;
        self.clients.set_loading(false);

        let Some(fetched) = fetched else {
            let err = api_failure(service);
            self.clients.set_error(Some(err.to_string()));
            return Err(err);
        };

        // The service reports no grand total; the page length stands in.
        let total_clients = fetched.clients.len();
        self.clients.set_clients(fetched.clients);
        self.clients.set_pagination(Pagination {
            current_page: fetched.current_page.max(1),
            total_pages: fetched.total_pages.max(1),
            total_clients,
        });
        tracing::debug!(page, total_clients, "client page loaded");
        Ok(())
    }

    /// Fills in the dashboard counters when nothing has been counted yet.
    pub async fn load_dashboard_totals(&mut self) -> Result<(), WorkspaceError> {
        if self.clients.pagination().total_clients > 0 {
            return Ok(());
        }
        let Backend::Remote(service) = &mut self.backend else {
            let total = self.clients.clients().len();
            self.clients.set_pagination(Pagination {
                current_page: 1,
                total_pages: 1,
                total_clients: total,
            });
            return Ok(());
        };

        let Some(fetched) = service.list(1, DASHBOARD_SAMPLE).await else {
            return Err(api_failure(service));
        };
        self.clients.set_pagination(Pagination {
            current_page: 1,
            total_pages: fetched.total_pages.max(1),
            total_clients: fetched.clients.len(),
        });
        Ok(())
    }

    pub async fn create_client(&mut self, draft: ClientDraft) -> Result<Client, WorkspaceError> {
        draft.validate().map_err(WorkspaceError::Validation)?;

        let Backend::Remote(service) = &mut self.backend else {
            let created = self.clients.add_client(draft);
            tracing::info!(id = %created.id, "client created locally");
            return Ok(created);
        };

        let Some(created) = service.create(&draft).await else {
            let err = api_failure(service);
            self.clients.set_error(Some(err.to_string()));
            return Err(err);
        };
        tracing::info!(id = %created.id, "client created");
        self.clients.insert_client(created.clone());
        Ok(created)
    }

    pub async fn update_client(
        &mut self,
        id: ClientId,
        draft: ClientDraft,
    ) -> Result<(), WorkspaceError> {
        draft.validate().map_err(WorkspaceError::Validation)?;

        let Backend::Remote(service) = &mut self.backend else {
            if self.clients.update_client(id, &ClientPatch::from(draft)) {
                if let Some(updated) = self.clients.get_client_by_id(id) {
                    self.selection.refresh_snapshot(updated);
                }
            }
            return Ok(());
        };

        let Some(updated) = service.update(id, &draft).await else {
            let err = api_failure(service);
            self.clients.set_error(Some(err.to_string()));
            return Err(err);
        };
        tracing::info!(%id, "client updated");
        self.selection.refresh_snapshot(&updated);
        self.clients.replace_client(updated);
        Ok(())
    }

    /// Deletes a client and drops it from the selection set.
    pub async fn delete_client(&mut self, id: ClientId) -> Result<(), WorkspaceError> {
        if let Backend::Remote(service) = &mut self.backend {
            if !service.delete(id).await {
                let err = api_failure(service);
                self.clients.set_error(Some(err.to_string()));
                return Err(err);
            }
        }
        tracing::info!(%id, "client deleted");
        self.clients.delete_client(id);
        self.selection.remove_selected_client(id);
        Ok(())
    }

    /// Looks in the loaded page first, then asks the service. `None` means
    /// the client does not exist as far as this console can tell.
    pub async fn find_client(&mut self, id: ClientId) -> Option<Client> {
        if let Some(client) = self.clients.get_client_by_id(id) {
            return Some(client.clone());
        }
        match &mut self.backend {
            Backend::Remote(service) => service.get_by_id(id).await,
            Backend::Local => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::api::ClientPage;
    use crate::api::fake::{Call, FakeApi, Reply};
    use crate::store::persist::MemoryStorage;

    fn client(id: i64, name: &str) -> Client {
        Client {
            id: ClientId(id),
            name: name.to_string(),
            salary: 2500.0,
            company_valuation: 100000.0,
            created_at: None,
            updated_at: None,
        }
    }

    fn draft(name: &str) -> ClientDraft {
        ClientDraft {
            name: name.to_string(),
            salary: 2500.0,
            company_valuation: 100000.0,
        }
    }

    fn page(clients: Vec<Client>, current_page: u32, total_pages: u32) -> Reply {
        Reply::Page(ClientPage {
            clients,
            current_page,
            total_pages,
        })
    }

    fn remote(api: &Arc<FakeApi>, storage: &MemoryStorage) -> Workspace {
        let service = ClientService::new(Box::new(api.clone()));
        Workspace::open(Backend::Remote(service), 2, storage.clone())
    }

    #[tokio::test]
    async fn load_page_replaces_cache_and_counts_the_page() {
        let api = Arc::new(FakeApi::new(vec![
            page(vec![client(1, "Ana"), client(2, "Bia")], 1, 3),
            page(vec![client(5, "Eva")], 3, 3),
        ]));
        let mut ws = remote(&api, &MemoryStorage::new());

        ws.load_page(1).await.unwrap();
        ws.load_page(3).await.unwrap();

        assert!(ws.clients.get_client_by_id(ClientId(1)).is_none());
        assert_eq!(ws.clients.clients().len(), 1);
        assert_eq!(
            ws.clients.pagination(),
            Pagination {
                current_page: 3,
                total_pages: 3,
                total_clients: 1,
            }
        );
        assert!(!ws.clients.is_loading());
        assert_eq!(api.calls(), vec![Call::List(1, 2), Call::List(3, 2)]);
    }

    #[tokio::test]
    async fn failed_fetch_keeps_the_page_and_records_the_error() {
        let api = Arc::new(FakeApi::new(vec![
            page(vec![client(1, "Ana")], 1, 1),
            Reply::Fail(500),
        ]));
        let mut ws = remote(&api, &MemoryStorage::new());

        ws.load_page(1).await.unwrap();
        let err = ws.load_page(2).await.unwrap_err();

        assert_eq!(err.to_string(), "HTTP error! status: 500");
        assert_eq!(ws.clients.error(), Some("HTTP error! status: 500"));
        assert_eq!(ws.clients.clients()[0].name, "Ana");
        assert!(!ws.clients.is_loading());
    }

    #[tokio::test]
    async fn invalid_drafts_never_reach_the_service() {
        let api = Arc::new(FakeApi::default());
        let mut ws = remote(&api, &MemoryStorage::new());

        let err = ws.create_client(draft("   ")).await.unwrap_err();
        assert!(matches!(err, WorkspaceError::Validation(_)));
        let err = ws.update_client(ClientId(1), ClientDraft::default()).await.unwrap_err();
        assert!(matches!(err, WorkspaceError::Validation(_)));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn create_applies_only_after_confirmation() {
        let api = Arc::new(FakeApi::new(vec![
            Reply::Fail(400),
            Reply::Client(client(30, "Caio")),
        ]));
        let mut ws = remote(&api, &MemoryStorage::new());

        assert!(ws.create_client(draft("Caio")).await.is_err());
        assert!(ws.clients.clients().is_empty());

        let created = ws.create_client(draft("Caio")).await.unwrap();
        assert_eq!(created.id, ClientId(30));
        assert_eq!(ws.clients.get_client_by_id(ClientId(30)), Some(&created));
        assert_eq!(ws.clients.pagination().total_clients, 1);
    }

    #[tokio::test]
    async fn update_refreshes_cache_and_selected_snapshot() {
        let api = Arc::new(FakeApi::new(vec![
            page(vec![client(1, "Ana"), client(2, "Bia")], 1, 1),
            Reply::Client(client(1, "Ana Silva")),
        ]));
        let mut ws = remote(&api, &MemoryStorage::new());
        ws.load_page(1).await.unwrap();
        ws.selection.add_selected_client(client(1, "Ana"));

        ws.update_client(ClientId(1), draft("Ana Silva")).await.unwrap();

        assert_eq!(ws.clients.clients()[0].name, "Ana Silva");
        assert_eq!(ws.clients.clients()[1].name, "Bia");
        assert_eq!(ws.selection.selected_clients()[0].name, "Ana Silva");
        assert_eq!(api.calls()[1], Call::Update(ClientId(1), draft("Ana Silva")));
    }

    #[tokio::test]
    async fn delete_prunes_the_selection() {
        let api = Arc::new(FakeApi::new(vec![
            page(vec![client(1, "Ana"), client(2, "Bia")], 1, 1),
            Reply::Deleted,
        ]));
        let mut ws = remote(&api, &MemoryStorage::new());
        ws.load_page(1).await.unwrap();
        ws.selection.add_selected_client(client(2, "Bia"));

        ws.delete_client(ClientId(2)).await.unwrap();

        assert!(ws.clients.get_client_by_id(ClientId(2)).is_none());
        assert!(!ws.selection.is_client_selected(ClientId(2)));
    }

    #[tokio::test]
    async fn failed_delete_leaves_everything_in_place() {
        let api = Arc::new(FakeApi::new(vec![
            page(vec![client(2, "Bia")], 1, 1),
            Reply::Fail(404),
        ]));
        let mut ws = remote(&api, &MemoryStorage::new());
        ws.load_page(1).await.unwrap();
        ws.selection.add_selected_client(client(2, "Bia"));

        assert!(ws.delete_client(ClientId(2)).await.is_err());
        assert!(ws.clients.get_client_by_id(ClientId(2)).is_some());
        assert!(ws.selection.is_client_selected(ClientId(2)));
    }

    #[tokio::test]
    async fn find_falls_back_to_the_service() {
        let api = Arc::new(FakeApi::new(vec![
            page(vec![client(1, "Ana")], 1, 1),
            Reply::Client(client(9, "Ivo")),
            Reply::Fail(404),
        ]));
        let mut ws = remote(&api, &MemoryStorage::new());
        ws.load_page(1).await.unwrap();

        assert_eq!(ws.find_client(ClientId(1)).await.unwrap().name, "Ana");
        assert_eq!(ws.find_client(ClientId(9)).await.unwrap().name, "Ivo");
        assert_eq!(ws.find_client(ClientId(10)).await, None);
        assert_eq!(
            api.calls()[1..],
            [Call::GetById(ClientId(9)), Call::GetById(ClientId(10))]
        );
    }

    #[tokio::test]
    async fn dashboard_counts_once() {
        let api = Arc::new(FakeApi::new(vec![page(
            vec![client(1, "Ana"), client(2, "Bia"), client(3, "Caio")],
            1,
            1,
        )]));
        let mut ws = remote(&api, &MemoryStorage::new());

        ws.load_dashboard_totals().await.unwrap();
        ws.load_dashboard_totals().await.unwrap();

        assert_eq!(ws.clients.pagination().total_clients, 3);
        assert_eq!(api.calls(), vec![Call::List(1, 100)]);
    }

    #[test]
    fn login_gate_and_session_persistence() {
        let storage = MemoryStorage::new();
        let mut ws = Workspace::open(Backend::Local, 10, storage.clone());

        assert_eq!(ws.login("A"), Err(ValidationError::NameTooShort));
        assert!(!ws.session.is_authenticated());

        ws.login("Al").unwrap();
        assert_eq!(ws.session.user(), Some("Al"));

        let reopened = Workspace::open(Backend::Local, 10, storage.clone());
        assert_eq!(reopened.session.user(), Some("Al"));

        ws.logout();
        let reopened = Workspace::open(Backend::Local, 10, storage);
        assert!(!reopened.session.is_authenticated());
    }

    #[tokio::test]
    async fn local_mode_applies_immediately_and_persists() {
        let storage = MemoryStorage::new();
        let mut ws = Workspace::open(Backend::Local, 10, storage.clone());

        let ana = ws.create_client(draft("Ana")).await.unwrap();
        let bia = ws.create_client(draft("Bia")).await.unwrap();
        ws.selection.add_selected_client(bia.clone());
        ws.update_client(ana.id, draft("Ana Silva")).await.unwrap();
        ws.delete_client(bia.id).await.unwrap();

        let mut reopened = Workspace::open(Backend::Local, 10, storage);
        reopened.load_page(1).await.unwrap();
        assert_eq!(reopened.clients.clients().len(), 1);
        assert_eq!(reopened.clients.clients()[0].name, "Ana Silva");
        assert_eq!(reopened.clients.pagination().total_clients, 1);
        assert!(reopened.selection.is_empty());
    }

    #[test]
    fn unreadable_state_starts_fresh() {
        let mut storage = MemoryStorage::new();
        storage.write(SELECTION_KEY, "[[[").unwrap();
        let ws = Workspace::open(Backend::Local, 10, storage.clone());
        assert!(ws.selection.is_empty());
        assert_eq!(storage.read(SELECTION_KEY).unwrap(), None);
    }
}

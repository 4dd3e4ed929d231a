use std::future::Future;

use super::{ApiError, ApiResult, ClientApi, ClientPage};
use crate::models::{Client, ClientDraft, ClientId};

/// Uniform wrapper around a `ClientApi`.
///
/// Every call clears the last error, raises `loading` for its duration and
/// lowers it again whatever the outcome. Failures are flattened into a
/// message on `error` and a `None`/`false` return.
pub struct ClientService {
    api: Box<dyn ClientApi>,
    loading: bool,
    error: Option<String>,
}

impl ClientService {
    pub fn new(api: Box<dyn ClientApi>) -> Self {
        Self {
            api,
            loading: false,
            error: None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub async fn list(&mut self, page: u32, limit: u32) -> Option<ClientPage> {
        if page < 1 || limit == 0 {
            self.loading = false;
            self.error = Some(ApiError::InvalidPagination { page, limit }.to_string());
            return None;
        }
        let request = self.api.list(page, limit);
        track_with(&mut self.loading, &mut self.error, "list", request).await
    }

    pub async fn get_by_id(&mut self, id: ClientId) -> Option<Client> {
        let request = self.api.get_by_id(id);
        track_with(&mut self.loading, &mut self.error, "get_by_id", request).await
    }

    pub async fn create(&mut self, draft: &ClientDraft) -> Option<Client> {
        let request = self.api.create(draft);
        track_with(&mut self.loading, &mut self.error, "create", request).await
    }

    pub async fn update(&mut self, id: ClientId, draft: &ClientDraft) -> Option<Client> {
        let request = self.api.update(id, draft);
        track_with(&mut self.loading, &mut self.error, "update", request).await
    }

    pub async fn delete(&mut self, id: ClientId) -> bool {
        let request = self.api.delete(id);
        track_with(&mut self.loading, &mut self.error, "delete", request)
            .await
            .is_some()
    }
}

/// Takes the flags as separate borrows so the in-flight request can keep
/// borrowing the api.
async fn track_with<T, F>(
    loading: &mut bool,
    error: &mut Option<String>,
    operation: &str,
    request: F,
) -> Option<T>
where
    F: Future<Output = ApiResult<T>>,
{
    *loading = true;
    *error = None;
    tracing::debug!(operation, "client api request");

    let result = request.await;
    *loading = false;

    match result {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(operation, error = %err, "client api request failed");
            *error = Some(err.to_string());
            None
        }
    }
}

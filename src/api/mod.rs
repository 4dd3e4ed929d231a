//! Access to the remote client service.
//!
//! `ClientApi` is the transport seam; `HttpClientApi` speaks the `/users`
//! REST resource and `ClientService` layers the loading/error bookkeeping the
//! screens read.

mod http;
mod service;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::{Client, ClientDraft, ClientId};

pub use http::HttpClientApi;
pub use service::ClientService;

/// One page of the client listing as returned by `GET /users`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientPage {
    pub clients: Vec<Client>,
    pub current_page: u32,
    pub total_pages: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid pagination: page {page}, limit {limit}")]
    InvalidPagination { page: u32, limit: u32 },
    #[error("HTTP error! status: {0}")]
    Status(u16),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            ApiError::Status(status.as_u16())
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[async_trait]
pub trait ClientApi: Send + Sync {
    async fn list(&self, page: u32, limit: u32) -> ApiResult<ClientPage>;
    async fn get_by_id(&self, id: ClientId) -> ApiResult<Client>;
    async fn create(&self, draft: &ClientDraft) -> ApiResult<Client>;
    async fn update(&self, id: ClientId, draft: &ClientDraft) -> ApiResult<Client>;
    async fn delete(&self, id: ClientId) -> ApiResult<()>;
}

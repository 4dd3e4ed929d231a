use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::{ApiError, ApiResult, ClientApi, ClientPage};
use crate::models::{Client, ClientDraft, ClientId};

/// `ClientApi` over the remote `/users` REST resource.
#[derive(Clone)]
pub struct HttpClientApi {
    base_url: String,
    http: reqwest::Client,
}

impl HttpClientApi {
    pub fn new(base_url: impl Into<String>) -> ApiResult<Self> {
        let http = reqwest::Client::builder().build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
    let response = response.error_for_status()?;
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|err| ApiError::Decode(err.to_string()))
}

#[async_trait]
impl ClientApi for HttpClientApi {
    async fn list(&self, page: u32, limit: u32) -> ApiResult<ClientPage> {
        let response = self
            .http
            .get(self.url("/users"))
            .query(&[("page", page), ("limit", limit)])
            .send()
            .await?;
        read_json(response).await
    }

    async fn get_by_id(&self, id: ClientId) -> ApiResult<Client> {
        let response = self.http.get(self.url(&format!("/users/{id}"))).send().await?;
        read_json(response).await
    }

    async fn create(&self, draft: &ClientDraft) -> ApiResult<Client> {
        let response = self.http.post(self.url("/users")).json(draft).send().await?;
        read_json(response).await
    }

    async fn update(&self, id: ClientId, draft: &ClientDraft) -> ApiResult<Client> {
        let response = self
            .http
            .put(self.url(&format!("/users/{id}")))
            .json(draft)
            .send()
            .await?;
        read_json(response).await
    }

    async fn delete(&self, id: ClientId) -> ApiResult<()> {
        // Any 2xx counts; the service answers with a plain-text body.
        self.http
            .delete(self.url(&format!("/users/{id}")))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

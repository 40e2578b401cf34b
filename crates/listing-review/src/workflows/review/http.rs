use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use super::domain::{ListingId, ListingStatus, SummaryCounts};
use super::session::AccessToken;
use super::store::{ListingPage, ListingStore, PartitionQuery, StoreError};
use crate::config::ApiConfig;

const ADMIN_PROPERTIES: [&str; 3] = ["api", "admin", "properties"];

/// `ListingStore` backed by the admin REST endpoints.
#[derive(Debug, Clone)]
pub struct HttpListingStore {
    client: Client,
    base_url: Url,
}

impl HttpListingStore {
    pub fn new(config: &ApiConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|err| StoreError::Transport(err.to_string()))?;
        Self::with_client(client, &config.base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Result<Self, StoreError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|err| StoreError::Transport(format!("invalid base url '{base_url}': {err}")))?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, trailing: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| StoreError::Transport(format!("base url '{}' cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(ADMIN_PROPERTIES)
            .extend(trailing);
        Ok(url)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
        let response = Self::ensure_success(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|err| StoreError::Decode(err.to_string()))
    }

    async fn ensure_success(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::from_status(status.as_u16(), &body))
    }
}

fn transport(err: reqwest::Error) -> StoreError {
    StoreError::Transport(err.to_string())
}

#[async_trait]
impl ListingStore for HttpListingStore {
    async fn summary(&self) -> Result<SummaryCounts, StoreError> {
        let url = self.endpoint(&["summary"])?;
        debug!(%url, "fetching listing summary");
        let response = self.client.get(url).send().await.map_err(transport)?;
        Self::decode(response).await
    }

    async fn list_by_status(&self, query: PartitionQuery) -> Result<ListingPage, StoreError> {
        let url = self.endpoint(&[])?;
        debug!(status = query.status.wire(), page = query.page, size = query.size, "fetching listing partition");
        let response = self
            .client
            .get(url)
            .query(&[
                ("status", query.status.wire().to_string()),
                ("page", query.page.to_string()),
                ("size", query.size.to_string()),
            ])
            .send()
            .await
            .map_err(transport)?;
        Self::decode(response).await
    }

    async fn update_status(
        &self,
        id: &ListingId,
        status: ListingStatus,
        token: &AccessToken,
    ) -> Result<(), StoreError> {
        let id = id.to_string();
        let url = self.endpoint(&[id.as_str(), "status"])?;
        debug!(%url, status = status.wire(), "patching listing status");
        let response = self
            .client
            .patch(url)
            .bearer_auth(token.expose())
            .json(&json!({ "status": status.wire() }))
            .send()
            .await
            .map_err(transport)?;
        Self::ensure_success(response).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_keep_base_path_and_encode_ids() {
        let store = HttpListingStore::with_client(Client::new(), "https://example.com/backend/")
            .expect("store builds");
        assert_eq!(
            store.endpoint(&["summary"]).expect("url").as_str(),
            "https://example.com/backend/api/admin/properties/summary"
        );
        assert_eq!(
            store.endpoint(&["a b/c", "status"]).expect("url").as_str(),
            "https://example.com/backend/api/admin/properties/a%20b%2Fc/status"
        );
    }

    #[test]
    fn rejects_unparseable_base_url() {
        assert!(matches!(
            HttpListingStore::with_client(Client::new(), "not a url"),
            Err(StoreError::Transport(_))
        ));
    }
}

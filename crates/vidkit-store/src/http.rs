//! HTTP implementation of the document store over the content store's
//! mutate/query API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use std::time::Duration;

use vidkit_core::constants::{LEGACY_VIDEO_ASSET_TYPE, VIDEO_ASSET_TYPE};

use crate::traits::{DocumentStore, StoreError, StoreResult};

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Document store client speaking the content store's HTTP API.
///
/// Mutations go through `/data/mutate/{dataset}`, queries through
/// `/data/query/{dataset}`, both authenticated with a Bearer token.
#[derive(Clone, Debug)]
pub struct HttpDocumentStore {
    client: Client,
    base_url: String,
    dataset: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct MutateResponse {
    #[serde(default)]
    results: Vec<MutateResult>,
}

#[derive(Debug, Deserialize)]
struct MutateResult {
    #[serde(default)]
    document: Option<JsonValue>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    result: Option<JsonValue>,
}

impl HttpDocumentStore {
    pub fn new(base_url: String, dataset: String, token: String) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|err| StoreError::RequestFailed(format!("HTTP client: {}", err)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            dataset,
            token,
        })
    }

    fn mutate_url(&self) -> String {
        format!("{}/data/mutate/{}", self.base_url, self.dataset)
    }

    fn query_url(&self, query: &str, params: &[(&str, &str)]) -> String {
        let mut url = format!(
            "{}/data/query/{}?query={}",
            self.base_url,
            self.dataset,
            urlencoding::encode(query)
        );
        for (name, value) in params {
            // Query parameters are passed as JSON-encoded `$name` values.
            url.push_str(&format!(
                "&%24{}={}",
                name,
                urlencoding::encode(&format!("\"{}\"", value))
            ));
        }
        url
    }

    #[tracing::instrument(skip(self, mutations), fields(store.operation = "mutate"))]
    async fn mutate(&self, mutations: JsonValue) -> StoreResult<MutateResponse> {
        let response = self
            .client
            .post(self.mutate_url())
            .bearer_auth(&self.token)
            .query(&[("returnDocuments", "true")])
            .json(&json!({ "mutations": mutations }))
            .send()
            .await
            .map_err(|err| StoreError::RequestFailed(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            if status.as_u16() == 404 {
                return Err(StoreError::NotFound(body));
            }
            return Err(StoreError::MutationRejected(format!(
                "{}: {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|err| StoreError::RequestFailed(format!("Malformed response: {}", err)))
    }

    #[tracing::instrument(skip(self), fields(store.operation = "query"))]
    async fn query(&self, query: &str, params: &[(&str, &str)]) -> StoreResult<Option<JsonValue>> {
        let response = self
            .client
            .get(self.query_url(query, params))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|err| StoreError::RequestFailed(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(StoreError::RequestFailed(format!("{}: {}", status, body)));
        }

        let body: QueryResponse = response
            .json()
            .await
            .map_err(|err| StoreError::RequestFailed(format!("Malformed response: {}", err)))?;

        Ok(body.result.filter(|value| !value.is_null()))
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn create_or_replace(&self, document: JsonValue) -> StoreResult<JsonValue> {
        if document.get("_id").and_then(JsonValue::as_str).is_none() {
            return Err(StoreError::InvalidDocument(
                "document is missing _id".to_string(),
            ));
        }

        let mut response = self
            .mutate(json!([{ "createOrReplace": document.clone() }]))
            .await?;

        let result = response
            .results
            .drain(..)
            .next()
            .and_then(|result| result.document)
            .unwrap_or(document);
        Ok(result)
    }

    async fn fetch(&self, id: &str) -> StoreResult<Option<JsonValue>> {
        self.query("*[_id == $id][0]", &[("id", id)]).await
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        self.mutate(json!([{ "delete": { "id": id } }])).await?;
        Ok(())
    }

    async fn set_asset_reference(
        &self,
        owner_id: &str,
        field: &str,
        asset_id: &str,
    ) -> StoreResult<()> {
        // One patch mutation: the container and the reference land together
        // or not at all.
        self.mutate(json!([{
            "patch": {
                "id": owner_id,
                "setIfMissing": { field: {} },
                "set": {
                    (format!("{}.asset", field)): {
                        "_type": "reference",
                        "_weak": true,
                        "_ref": asset_id,
                    }
                }
            }
        }]))
        .await?;
        Ok(())
    }

    async fn find_asset_by_file_id(&self, file_id: &str) -> StoreResult<Option<JsonValue>> {
        let query = format!(
            "*[(_type == \"{}\" || _type == \"{}\") && fileId == $fileId][0]",
            VIDEO_ASSET_TYPE, LEGACY_VIDEO_ASSET_TYPE
        );
        self.query(&query, &[("fileId", file_id)]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_or_replace_posts_mutation() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/data/mutate/production")
            .match_query(mockito::Matcher::UrlEncoded(
                "returnDocuments".into(),
                "true".into(),
            ))
            .match_body(mockito::Matcher::PartialJson(json!({
                "mutations": [{ "createOrReplace": { "_id": "secrets.imagekit" } }]
            })))
            .with_status(200)
            .with_body(r#"{"results":[{"document":{"_id":"secrets.imagekit","publicKey":"pk"}}]}"#)
            .create_async()
            .await;

        let store =
            HttpDocumentStore::new(server.url(), "production".to_string(), "token".to_string())
                .unwrap();
        let persisted = store
            .create_or_replace(json!({ "_id": "secrets.imagekit" }))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(persisted["publicKey"], "pk");
    }

    #[tokio::test]
    async fn test_fetch_missing_document_is_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", mockito::Matcher::Regex("^/data/query/production".to_string()))
            .with_status(200)
            .with_body(r#"{"result":null}"#)
            .create_async()
            .await;

        let store =
            HttpDocumentStore::new(server.url(), "production".to_string(), "token".to_string())
                .unwrap();
        let fetched = store.fetch("secrets.imagekit").await.unwrap();
        assert!(fetched.is_none());
    }

    #[tokio::test]
    async fn test_rejected_mutation_surfaces_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", mockito::Matcher::Regex("^/data/mutate/production".to_string()))
            .with_status(409)
            .with_body("transaction conflict")
            .create_async()
            .await;

        let store =
            HttpDocumentStore::new(server.url(), "production".to_string(), "token".to_string())
                .unwrap();
        let err = store.delete("some-id").await.unwrap_err();
        assert!(matches!(err, StoreError::MutationRejected(_)));
    }

    #[tokio::test]
    async fn test_create_or_replace_requires_id() {
        let store = HttpDocumentStore::new(
            "http://localhost:1".to_string(),
            "production".to_string(),
            "token".to_string(),
        )
        .unwrap();
        let err = store
            .create_or_replace(json!({ "_type": "imagekit.apiKey" }))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidDocument(_)));
    }
}

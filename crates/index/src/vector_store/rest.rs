//! Qdrant REST transport.

use super::api::{
    CollectionInfo, CreateCollection, CreateFieldIndex, DeletePoints, QdrantApi, QueryPoints,
    QueryResponse, UpsertPoints,
};
use super::connection::ConnectionParams;
use codeindex_core::{AppResult, StoreError};
use codeindex_embedders::HttpOptions;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

const API_KEY_HEADER: &str = "api-key";

/// Qdrant wraps every response body in `{ "result": ..., "status": ... }`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    status: ErrorStatus,
}

#[derive(Debug, Deserialize)]
struct ErrorStatus {
    error: String,
}

/// [`QdrantApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct QdrantRestClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl QdrantRestClient {
    pub fn new(params: &ConnectionParams, api_key: Option<&str>, http: &HttpOptions) -> AppResult<Self> {
        Ok(Self {
            client: http.build_client()?,
            base_url: params.base_url(),
            api_key: api_key.filter(|k| !k.is_empty()).map(str::to_string),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!("Qdrant {} {}", method, url);

        let builder = self.client.request(method, url);
        match self.api_key {
            Some(ref key) => builder.header(API_KEY_HEADER, key),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, StoreError> {
        let response = builder
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|e| e.status.error)
            .unwrap_or(body);
        Err(StoreError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_for<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, StoreError> {
        let response = self.send(builder).await?;
        response
            .json::<Envelope<T>>()
            .await
            .map(|envelope| envelope.result)
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<(), StoreError> {
        self.send(self.request(method, path).json(body)).await.map(|_| ())
    }
}

fn collection_path(name: &str) -> String {
    format!("/collections/{}", name)
}

fn wait_query(wait: bool) -> &'static str {
    if wait {
        "?wait=true"
    } else {
        ""
    }
}

#[async_trait::async_trait]
impl QdrantApi for QdrantRestClient {
    #[instrument(skip(self))]
    async fn get_collection(&self, name: &str) -> Result<CollectionInfo, StoreError> {
        self.send_for(self.request(Method::GET, &collection_path(name)))
            .await
    }

    #[instrument(skip(self, request), fields(size = request.vectors.size))]
    async fn create_collection(
        &self,
        name: &str,
        request: &CreateCollection,
    ) -> Result<(), StoreError> {
        self.send_json(Method::PUT, &collection_path(name), request)
            .await
    }

    #[instrument(skip(self))]
    async fn delete_collection(&self, name: &str) -> Result<(), StoreError> {
        self.send(self.request(Method::DELETE, &collection_path(name)))
            .await
            .map(|_| ())
    }

    #[instrument(skip(self, request), fields(field = %request.field_name))]
    async fn create_payload_index(
        &self,
        name: &str,
        request: &CreateFieldIndex,
    ) -> Result<(), StoreError> {
        let path = format!("{}/index", collection_path(name));
        self.send_json(Method::PUT, &path, request).await
    }

    #[instrument(skip(self, request), fields(points = request.points.len()))]
    async fn upsert(&self, name: &str, request: &UpsertPoints) -> Result<(), StoreError> {
        let path = format!("{}/points{}", collection_path(name), wait_query(request.wait));
        self.send_json(Method::PUT, &path, request).await
    }

    #[instrument(skip(self, request), fields(limit = request.limit))]
    async fn query(&self, name: &str, request: &QueryPoints) -> Result<QueryResponse, StoreError> {
        let path = format!("{}/points/query", collection_path(name));
        self.send_for(self.request(Method::POST, &path).json(request))
            .await
    }

    #[instrument(skip(self, request))]
    async fn delete_points(&self, name: &str, request: &DeletePoints) -> Result<(), StoreError> {
        let path = format!(
            "{}/points/delete{}",
            collection_path(name),
            wait_query(request.wait)
        );
        self.send_json(Method::POST, &path, request).await
    }
}

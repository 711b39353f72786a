use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::error::LayoutError;
use super::types::{
    ApiEnvelope, ComponentInstance, ExecuteQueryRequest, LayoutPayload, QueryMeta,
    QueryResultPayload, Row,
};
use crate::core::config::ApiConfig;
use crate::core::session::{Session, USER_ID_HEADER};

/// Backend operations the layout core depends on.
#[async_trait]
pub trait LayoutApi: Send + Sync {
    async fn fetch_layout(
        &self,
        session: &Session,
        app_id: &str,
    ) -> Result<Vec<ComponentInstance>, LayoutError>;

    async fn store_layout(
        &self,
        session: &Session,
        app_id: &str,
        layout: &[ComponentInstance],
    ) -> Result<(), LayoutError>;

    async fn execute_query(
        &self,
        session: &Session,
        app_id: &str,
        query_id: &str,
    ) -> Result<Vec<Row>, LayoutError>;

    async fn list_queries(
        &self,
        session: &Session,
        app_id: &str,
    ) -> Result<Vec<QueryMeta>, LayoutError>;
}

fn segment(raw: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(raw)
}

#[derive(Debug, Clone)]
pub struct HttpLayoutApi {
    client: Client,
    base_url: String,
}

impl HttpLayoutApi {
    pub fn new(config: &ApiConfig) -> Result<Self, LayoutError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("toolboard/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, &config.base_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, mut request: RequestBuilder, session: &Session) -> RequestBuilder {
        if let Some(value) = session.bearer() {
            request = request.header(reqwest::header::AUTHORIZATION, value);
        }
        if let Some(user_id) = &session.user_id {
            request = request.header(USER_ID_HEADER, user_id.as_str());
        }
        request
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        session: &Session,
        what: &str,
    ) -> Result<Option<T>, LayoutError> {
        let response = self.authorize(request, session).send().await?;
        let status = response.status();
        debug!("{what}: HTTP {status}");

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(LayoutError::Unauthorized(format!("{what} returned {status}")));
            }
            StatusCode::NOT_FOUND => {
                return Err(LayoutError::NotFound(format!("{what} returned {status}")));
            }
            _ => {}
        }

        let body = response.text().await?;
        let envelope: ApiEnvelope<T> = serde_json::from_str(&body).map_err(|e| {
            warn!("{what}: undecodable response body ({e})");
            LayoutError::Decode(format!("{what}: {e}"))
        })?;

        if !status.is_success() || !envelope.success {
            let message = envelope
                .message
                .unwrap_or_else(|| format!("{what} failed with HTTP {status}"));
            return Err(LayoutError::Api(message));
        }

        Ok(envelope.data)
    }
}

#[async_trait]
impl LayoutApi for HttpLayoutApi {
    async fn fetch_layout(
        &self,
        session: &Session,
        app_id: &str,
    ) -> Result<Vec<ComponentInstance>, LayoutError> {
        let request = self.client.get(self.url(&format!("/apps/{}/layout", segment(app_id))));
        let payload: Option<LayoutPayload> = self.send(request, session, "get layout").await?;
        Ok(payload.map(|p| p.layout).unwrap_or_default())
    }

    async fn store_layout(
        &self,
        session: &Session,
        app_id: &str,
        layout: &[ComponentInstance],
    ) -> Result<(), LayoutError> {
        let request = self
            .client
            .put(self.url(&format!("/apps/{}/layout", segment(app_id))))
            .json(&serde_json::json!({ "layout": layout }));
        self.send::<serde_json::Value>(request, session, "save layout")
            .await?;
        Ok(())
    }

    async fn execute_query(
        &self,
        session: &Session,
        app_id: &str,
        query_id: &str,
    ) -> Result<Vec<Row>, LayoutError> {
        let request = self
            .client
            .post(self.url(&format!(
                "/apps/{}/queries/{}/execute",
                segment(app_id),
                segment(query_id)
            )))
            .json(&ExecuteQueryRequest::default());
        let payload: Option<QueryResultPayload> =
            self.send(request, session, "execute query").await?;
        Ok(payload.map(|p| p.data).unwrap_or_default())
    }

    async fn list_queries(
        &self,
        session: &Session,
        app_id: &str,
    ) -> Result<Vec<QueryMeta>, LayoutError> {
        let request = self.client.get(self.url(&format!("/apps/{}/queries", segment(app_id))));
        let queries: Option<Vec<QueryMeta>> = self.send(request, session, "list queries").await?;
        Ok(queries.unwrap_or_default())
    }
}

//! Load, save and bind.
//!
//! Every load re-executes every bound query, concurrently, so a dashboard
//! always shows fresh data at the cost of one backend query per bound
//! component. Saves overwrite the stored layout wholesale: two editors saving
//! the same app race and the last write wins.

use futures::future::join_all;
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;

use super::client::LayoutApi;
use super::document::LayoutDocument;
use super::error::LayoutError;
use super::types::{ComponentInstance, QueryMeta, Row};
use crate::core::session::Session;

#[derive(Clone)]
pub struct LayoutService {
    api: Arc<dyn LayoutApi>,
    query_timeout: Duration,
}

impl LayoutService {
    pub fn new(api: Arc<dyn LayoutApi>, query_timeout: Duration) -> Self {
        Self { api, query_timeout }
    }

    async fn run_query(
        &self,
        session: &Session,
        app_id: &str,
        query_id: &str,
    ) -> Result<Vec<Row>, LayoutError> {
        match tokio::time::timeout(
            self.query_timeout,
            self.api.execute_query(session, app_id, query_id),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(LayoutError::Timeout(self.query_timeout.as_secs())),
        }
    }

    /// Fetches the stored layout without running any query.
    pub async fn open_layout(
        &self,
        session: &Session,
        app_id: &str,
    ) -> Result<LayoutDocument, LayoutError> {
        let mut components = self.api.fetch_layout(session, app_id).await?;
        for component in &mut components {
            component.data = None;
        }
        Ok(LayoutDocument::new(components))
    }

    /// Fetches the layout and attaches fresh data to every bound component.
    /// A failing query leaves only its own component without data.
    pub async fn load_layout(
        &self,
        session: &Session,
        app_id: &str,
    ) -> Result<LayoutDocument, LayoutError> {
        let mut components = self.open_layout(session, app_id).await?.components;

        let pending = components.iter().enumerate().filter_map(|(index, c)| {
            let query_id = c.query_id.as_deref()?;
            let component_id = c.id.as_str();
            Some(async move {
                match self.run_query(session, app_id, query_id).await {
                    Ok(rows) => (index, Some(rows)),
                    Err(e) => {
                        warn!("Query {query_id} for component {component_id} failed: {e}");
                        (index, None)
                    }
                }
            })
        });
        let results = join_all(pending).await;

        let mut resolved = 0;
        for (index, rows) in results {
            if let Some(rows) = rows {
                components[index].data = Some(rows);
                resolved += 1;
            }
        }

        info!(
            "Loaded layout for app {app_id}: {} components, {resolved} with data",
            components.len()
        );
        Ok(LayoutDocument::new(components))
    }

    /// Persists the layout without any query results. `document` is left as is
    /// so a failed save can be retried.
    pub async fn save_layout(
        &self,
        session: &Session,
        app_id: &str,
        document: &LayoutDocument,
    ) -> Result<(), LayoutError> {
        let stripped = document.stripped();
        self.api
            .store_layout(session, app_id, &stripped)
            .await
            .map_err(|e| {
                warn!("Saving layout for app {app_id} failed: {e}");
                e
            })?;
        info!("Saved layout for app {app_id} ({} components)", stripped.len());
        Ok(())
    }

    /// Runs `query_id` and, only if it succeeds, binds it to the component.
    pub async fn bind_query<'d>(
        &self,
        session: &Session,
        app_id: &str,
        document: &'d mut LayoutDocument,
        component_id: &str,
        query_id: &str,
    ) -> Result<&'d ComponentInstance, LayoutError> {
        if document.get(component_id).is_none() {
            return Err(LayoutError::NotFound(format!(
                "Component {component_id} not found"
            )));
        }

        let rows = self.run_query(session, app_id, query_id).await?;
        let query = self.resolve_query(session, app_id, query_id).await;
        document.apply_binding(component_id, &query, rows)
    }

    async fn resolve_query(&self, session: &Session, app_id: &str, query_id: &str) -> QueryMeta {
        let known = match self.api.list_queries(session, app_id).await {
            Ok(queries) => queries.into_iter().find(|q| q.id == query_id),
            Err(e) => {
                warn!("Could not list queries for app {app_id}: {e}");
                None
            }
        };
        known.unwrap_or_else(|| QueryMeta {
            id: query_id.to_string(),
            name: query_id.to_string(),
            description: None,
            datasource_id: None,
        })
    }
}

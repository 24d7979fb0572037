use std::sync::Arc;

use axum::{body::Body, http::Request, response::Response, Router};
use backend::{server, types::Environment};
use campaign_storage::{
    entity::EntityKind,
    registry::{CampaignCollections, TableNames},
    store::MemoryRecordStore,
};
use http_body_util::BodyExt;
use tower::ServiceExt;

/// Test setup serving the full router over an in-memory store
pub struct TestSetup {
    pub router: Router,
    pub store: Arc<MemoryRecordStore>,
    pub tables: TableNames,
}

impl TestSetup {
    pub fn new() -> Self {
        tracing_subscriber_init();

        let tables = TableNames {
            characters: "test-characters".to_string(),
            actions: "test-actions".to_string(),
            conditions: "test-conditions".to_string(),
            objects: "test-objects".to_string(),
        };

        let store = Arc::new(
            [
                EntityKind::Characters,
                EntityKind::Actions,
                EntityKind::Conditions,
                EntityKind::Objects,
            ]
            .into_iter()
            .fold(MemoryRecordStore::new(), |store, kind| {
                store.with_table(tables.get(kind), kind.schema().id_attribute())
            }),
        );

        let collections = Arc::new(CampaignCollections::new(store.clone(), &tables));
        let router = server::router(Environment::Development, collections);

        Self {
            router,
            store,
            tables,
        }
    }

    pub async fn send_request(
        &self,
        method: &str,
        route: &str,
        payload: Option<serde_json::Value>,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let builder = Request::builder().uri(route).method(method);
        let request = match payload {
            Some(payload) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(payload.to_string()))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }

    pub async fn send_post_request(
        &self,
        route: &str,
        payload: serde_json::Value,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        self.send_request("POST", route, Some(payload)).await
    }

    pub async fn send_put_request(
        &self,
        route: &str,
        payload: serde_json::Value,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        self.send_request("PUT", route, Some(payload)).await
    }

    pub async fn send_get_request(
        &self,
        route: &str,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        self.send_request("GET", route, None).await
    }

    pub async fn send_delete_request(
        &self,
        route: &str,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        self.send_request("DELETE", route, None).await
    }
}

fn tracing_subscriber_init() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init()
        .ok();
}

/// Parse response body to JSON
pub async fn parse_response_body(response: Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

use std::sync::Arc;

use aws_sdk_dynamodb::Client as DynamoDbClient;

use backend::{server, types::Environment};
use campaign_storage::{registry::CampaignCollections, store::DynamoRecordStore};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let environment = Environment::from_env();

    // JSON logs for staging/production, human-readable for development
    match environment {
        Environment::Production | Environment::Staging => {
            fmt()
                .json()
                .with_env_filter(EnvFilter::from_default_env())
                .init();
        }
        Environment::Development => {
            fmt().with_env_filter(EnvFilter::from_default_env()).init();
        }
    }

    let dynamodb_client = Arc::new(DynamoDbClient::new(&environment.aws_config().await));
    let store = Arc::new(DynamoRecordStore::new(dynamodb_client));
    let collections = Arc::new(CampaignCollections::new(
        store,
        &environment.table_names(),
    ));

    server::start(environment, collections).await
}

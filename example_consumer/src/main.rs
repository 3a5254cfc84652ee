//! Example consumer: extracts the configured resource files, lists what they
//! declare, then resolves one subscription against an in-memory item.
//!
//! Run from repo root: `RESOURCE_CONFIG_PATHS=tests/fixtures/resources.yaml cargo run -p example-consumer`
//! Optional: `DEMO_RESOURCE_CLASS`, `DEMO_OPERATION`, `MERCURE_HUB_URL`.

use api_resource_sdk::graphql::SelectionSerializeStage;
use api_resource_sdk::metadata::EnvParameterBag;
use api_resource_sdk::{
    ExtractedResourceMetadataCollectionFactory, FieldSelection, InMemorySubscriptionManager,
    ItemSubscriptionResolverFactory, MercureSubscriptionIriGenerator, ParameterResolver, ReadStage, ResolveInfo,
    ResolverContext, ResolverError, ResourceExtractor, SecurityStage, Settings, Stages,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

struct DemoRead;

#[async_trait]
impl ReadStage for DemoRead {
    async fn read(
        &self,
        resource_class: &str,
        _root_class: Option<&str>,
        _operation_name: &str,
        context: &ResolverContext,
    ) -> Result<Value, ResolverError> {
        Ok(json!({
            "id": context.subscribed_iri().unwrap_or("/demo/1"),
            "class": resource_class,
            "name": "demo item",
        }))
    }
}

struct AllowAll;

#[async_trait]
impl SecurityStage for AllowAll {
    async fn check(&self, _: &str, _: &str, _: &ResolverContext) -> Result<(), ResolverError> {
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("api_resource_sdk=debug,example_consumer=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let extractor = ResourceExtractor::new(
        settings.resource_paths.clone(),
        ParameterResolver::parameter_bag(EnvParameterBag::with_prefix("PARAM_")),
    );
    let resources = extractor.resources()?;
    for (class, metadata) in resources.iter() {
        let operations: Vec<&str> = metadata.operation_names().collect();
        tracing::info!(class = %class, short_name = ?metadata.short_name, ?operations, "resource");
    }

    let Some(resource_class) = std::env::var("DEMO_RESOURCE_CLASS")
        .ok()
        .or_else(|| resources.keys().next().cloned())
    else {
        tracing::info!("no resource declared, nothing to resolve");
        return Ok(());
    };
    let operation = std::env::var("DEMO_OPERATION").unwrap_or_else(|_| "update_subscription".into());

    let mercure = settings
        .mercure_generator()?
        .map(|g| Arc::new(g) as Arc<dyn MercureSubscriptionIriGenerator>);
    let factory = ItemSubscriptionResolverFactory::new(
        Stages::new(Arc::new(DemoRead), Arc::new(AllowAll), Arc::new(SelectionSerializeStage)),
        Arc::new(ExtractedResourceMetadataCollectionFactory::new(resources.clone())),
        Arc::new(InMemorySubscriptionManager::new()),
        mercure,
    );

    let info = ResolveInfo::new("demoSubscribe", "Subscription", FieldSelection::new().leaf("id").leaf("name"));
    let result = factory
        .create(Some(&resource_class), None, Some(&operation))
        .resolve(None, json!({ "input": { "id": "/demo/1" } }), None, info)
        .await;
    match result {
        Ok(payload) => println!("{}", serde_json::to_string_pretty(&json!({ "data": payload }))?),
        Err(err) => println!("{}", serde_json::to_string_pretty(&err.to_error_body())?),
    }
    Ok(())
}

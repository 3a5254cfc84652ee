//! Field resolvers composing the read, security and serialize stages.
//!
//! An item subscription runs
//! `read → security → serialize → [subscription id → mercure url]`:
//!
//! - a missing resource class or operation name resolves to `None` without
//!   running any stage;
//! - the read item must be JSON `null` or an object;
//! - an operation without mercure enabled returns the serialized payload;
//! - otherwise the subscription id (if any) is turned into a `mercureUrl`
//!   appended to the payload.

use crate::error::ResolverError;
use crate::graphql::context::{ResolveInfo, ResolverContext};
use crate::graphql::mercure::MercureSubscriptionIriGenerator;
use crate::graphql::stage::{Payload, ReadStage, SecurityStage, SerializeStage};
use crate::graphql::subscription::SubscriptionManager;
use crate::metadata::collection::ResourceMetadataCollectionFactory;
use serde_json::Value;
use std::sync::Arc;

pub const INVALID_READ_ITEM: &str = "Item from read stage should be a nullable object.";

/// The three stages every item resolver runs.
#[derive(Clone)]
pub struct Stages {
    pub read: Arc<dyn ReadStage>,
    pub security: Arc<dyn SecurityStage>,
    pub serialize: Arc<dyn SerializeStage>,
}

impl Stages {
    pub fn new(read: Arc<dyn ReadStage>, security: Arc<dyn SecurityStage>, serialize: Arc<dyn SerializeStage>) -> Self {
        Stages { read, security, serialize }
    }

    async fn run(
        &self,
        resource_class: &str,
        root_class: Option<&str>,
        operation_name: &str,
        context: &ResolverContext,
    ) -> Result<Option<Payload>, ResolverError> {
        let item = self.read.read(resource_class, root_class, operation_name, context).await?;
        if !matches!(item, Value::Null | Value::Object(_)) {
            return Err(ResolverError::InvalidStageResult(INVALID_READ_ITEM.to_string()));
        }
        tracing::debug!(resource_class, operation_name, found = !item.is_null(), "read stage done");

        self.security
            .check(resource_class, operation_name, &context.with_object(&item))
            .await?;

        let item = (!item.is_null()).then_some(&item);
        self.serialize.serialize(item, resource_class, operation_name, context).await
    }
}

#[derive(Clone)]
pub struct ItemSubscriptionResolverFactory {
    stages: Stages,
    metadata: Arc<dyn ResourceMetadataCollectionFactory>,
    subscriptions: Arc<dyn SubscriptionManager>,
    mercure: Option<Arc<dyn MercureSubscriptionIriGenerator>>,
}

impl ItemSubscriptionResolverFactory {
    pub fn new(
        stages: Stages,
        metadata: Arc<dyn ResourceMetadataCollectionFactory>,
        subscriptions: Arc<dyn SubscriptionManager>,
        mercure: Option<Arc<dyn MercureSubscriptionIriGenerator>>,
    ) -> Self {
        ItemSubscriptionResolverFactory {
            stages,
            metadata,
            subscriptions,
            mercure,
        }
    }

    pub fn create(
        &self,
        resource_class: Option<&str>,
        root_class: Option<&str>,
        operation_name: Option<&str>,
    ) -> ItemSubscriptionResolver {
        ItemSubscriptionResolver {
            factory: self.clone(),
            resource_class: resource_class.map(str::to_string),
            root_class: root_class.map(str::to_string),
            operation_name: operation_name.map(str::to_string),
        }
    }
}

/// Resolver bound to one subscription field.
#[derive(Clone)]
pub struct ItemSubscriptionResolver {
    factory: ItemSubscriptionResolverFactory,
    resource_class: Option<String>,
    root_class: Option<String>,
    operation_name: Option<String>,
}

impl ItemSubscriptionResolver {
    /// GraphQL field resolver entry point. `_context_value` is the engine's
    /// request context, not used by item subscriptions.
    pub async fn resolve(
        &self,
        source: Option<Value>,
        args: Value,
        _context_value: Option<&Value>,
        info: ResolveInfo,
    ) -> Result<Option<Payload>, ResolverError> {
        let (Some(resource_class), Some(operation_name)) = (self.resource_class.as_deref(), self.operation_name.as_deref())
        else {
            return Ok(None);
        };
        let factory = &self.factory;
        let context = ResolverContext::item_subscription(source, args, info);

        let payload = factory
            .stages
            .run(resource_class, self.root_class.as_deref(), operation_name, &context)
            .await?;

        let collection = factory.metadata.create(resource_class)?;
        let mercure = collection
            .graphql_operation(operation_name)
            .and_then(|operation| operation.mercure.clone())
            .filter(|mercure| mercure.is_enabled());
        let Some(mercure) = mercure else {
            tracing::debug!(resource_class, operation_name, "subscription without mercure");
            return Ok(payload);
        };
        let Some(generator) = factory.mercure.as_ref() else {
            return Err(ResolverError::MissingCollaborator {
                collaborator: "Mercure",
                hint: "Configure a Mercure hub (MERCURE_HUB_URL) to enable push notifications.",
            });
        };

        let Some(subscription_id) = factory
            .subscriptions
            .retrieve_subscription_id(&context, payload.as_ref())
            .await?
        else {
            return Ok(payload);
        };

        let mut payload = payload.unwrap_or_default();
        payload.insert(
            "mercureUrl".to_string(),
            Value::String(generator.generate_mercure_url(&subscription_id, mercure.hub())),
        );
        Ok(Some(payload))
    }
}

/// Item query resolvers: the same pipeline without the subscription step.
#[derive(Clone)]
pub struct ItemResolverFactory {
    stages: Stages,
}

impl ItemResolverFactory {
    pub fn new(stages: Stages) -> Self {
        ItemResolverFactory { stages }
    }

    pub fn create(
        &self,
        resource_class: Option<&str>,
        root_class: Option<&str>,
        operation_name: Option<&str>,
    ) -> ItemResolver {
        ItemResolver {
            stages: self.stages.clone(),
            resource_class: resource_class.map(str::to_string),
            root_class: root_class.map(str::to_string),
            operation_name: operation_name.map(str::to_string),
        }
    }
}

#[derive(Clone)]
pub struct ItemResolver {
    stages: Stages,
    resource_class: Option<String>,
    root_class: Option<String>,
    operation_name: Option<String>,
}

impl ItemResolver {
    pub async fn resolve(
        &self,
        source: Option<Value>,
        args: Value,
        _context_value: Option<&Value>,
        info: ResolveInfo,
    ) -> Result<Option<Payload>, ResolverError> {
        let (Some(resource_class), Some(operation_name)) = (self.resource_class.as_deref(), self.operation_name.as_deref())
        else {
            return Ok(None);
        };
        let context = ResolverContext::item_query(source, args, info);
        self.stages
            .run(resource_class, self.root_class.as_deref(), operation_name, &context)
            .await
    }
}

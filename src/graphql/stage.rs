//! Resolver pipeline stages.

use crate::error::ResolverError;
use crate::graphql::context::ResolverContext;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Serialized output of a resolved field.
pub type Payload = Map<String, Value>;

/// Fetches the item a field resolves to. Item resolvers expect JSON `null`
/// (nothing found) or an object; any other shape is rejected by the caller.
#[async_trait]
pub trait ReadStage: Send + Sync {
    async fn read(
        &self,
        resource_class: &str,
        root_class: Option<&str>,
        operation_name: &str,
        context: &ResolverContext,
    ) -> Result<Value, ResolverError>;
}

/// Authorizes access. Returns [`ResolverError::AccessDenied`] to stop the pipeline.
#[async_trait]
pub trait SecurityStage: Send + Sync {
    async fn check(&self, resource_class: &str, operation_name: &str, context: &ResolverContext)
        -> Result<(), ResolverError>;
}

/// Projects the read item to the output shape. Called with `None` too.
#[async_trait]
pub trait SerializeStage: Send + Sync {
    async fn serialize(
        &self,
        item: Option<&Value>,
        resource_class: &str,
        operation_name: &str,
        context: &ResolverContext,
    ) -> Result<Option<Payload>, ResolverError>;
}

/// Serializes the item as-is, projected on the requested fields.
#[derive(Clone, Copy, Debug, Default)]
pub struct SelectionSerializeStage;

#[async_trait]
impl SerializeStage for SelectionSerializeStage {
    async fn serialize(
        &self,
        item: Option<&Value>,
        _resource_class: &str,
        _operation_name: &str,
        context: &ResolverContext,
    ) -> Result<Option<Payload>, ResolverError> {
        let Some(item) = item else {
            return Ok(None);
        };
        match context.info.field_selection.project(item) {
            Value::Object(payload) => Ok(Some(payload)),
            other => Err(ResolverError::Stage(format!("cannot serialize a non-object item: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphql::context::{FieldSelection, ResolveInfo};
    use serde_json::json;

    #[tokio::test]
    async fn selection_serializer_projects_fields() {
        let info = ResolveInfo::new("book", "Subscription", FieldSelection::new().leaf("title"));
        let ctx = ResolverContext::item_subscription(None, json!({}), info);
        let item = json!({ "title": "Dune", "isbn": "9780441013593" });
        let payload = SelectionSerializeStage
            .serialize(Some(&item), "Book", "update", &ctx)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(Value::Object(payload), json!({ "title": "Dune" }));
    }

    #[tokio::test]
    async fn selection_serializer_passes_null_through() {
        let ctx = ResolverContext::item_query(None, json!({}), ResolveInfo::default());
        let payload = SelectionSerializeStage.serialize(None, "Book", "item_query", &ctx).await.unwrap();
        assert!(payload.is_none());
    }
}

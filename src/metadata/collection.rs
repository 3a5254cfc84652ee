//! Per-class resource configurations consulted at GraphQL resolution time.

use crate::error::ResolverError;
use crate::metadata::types::{Operations, ResourceMap};
use crate::metadata::value::{AttributeValue, Attributes};
use indexmap::IndexMap;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraphQlOperationKind {
    Query,
    QueryCollection,
    Mutation,
    Subscription,
}

impl GraphQlOperationKind {
    pub fn parse(kind: &str) -> Option<Self> {
        match kind.trim().to_ascii_lowercase().as_str() {
            "query" | "item_query" => Some(GraphQlOperationKind::Query),
            "collection_query" | "query_collection" => Some(GraphQlOperationKind::QueryCollection),
            "mutation" => Some(GraphQlOperationKind::Mutation),
            "subscription" => Some(GraphQlOperationKind::Subscription),
            _ => None,
        }
    }

    /// Kind of a configured operation. An explicit `kind` (or `type`)
    /// attribute wins, then a recognised name (`item_query`,
    /// `collection_query`, `*_subscription`). Other names are subscriptions
    /// when they carry a `mercure` setting, mutations otherwise.
    pub fn infer(name: &str, attributes: &Attributes) -> Self {
        let explicit = ["kind", "type"]
            .iter()
            .filter_map(|key| attributes.get(*key))
            .find_map(|value| value.as_str().and_then(Self::parse));
        if let Some(kind) = explicit {
            return kind;
        }
        match Self::from_operation_name(name) {
            GraphQlOperationKind::Mutation if attributes.contains_key("mercure") => GraphQlOperationKind::Subscription,
            kind => kind,
        }
    }

    pub fn from_operation_name(name: &str) -> Self {
        match name {
            "item_query" | "query" => GraphQlOperationKind::Query,
            "collection_query" => GraphQlOperationKind::QueryCollection,
            name if name == "subscription" || name.ends_with("_subscription") => GraphQlOperationKind::Subscription,
            _ => GraphQlOperationKind::Mutation,
        }
    }
}

/// Push notification setting of an operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mercure {
    Enabled(bool),
    /// Enabled, optionally published through a named hub.
    Options { hub: Option<String> },
}

impl Mercure {
    pub fn is_enabled(&self) -> bool {
        match self {
            Mercure::Enabled(enabled) => *enabled,
            Mercure::Options { .. } => true,
        }
    }

    pub fn hub(&self) -> Option<&str> {
        match self {
            Mercure::Options { hub } => hub.as_deref(),
            Mercure::Enabled(_) => None,
        }
    }

    /// Falsy settings (`false`, `0`, `""`, `"0"`, empty containers) disable
    /// push notifications; a non-empty container carries options.
    fn from_attribute(value: &AttributeValue) -> Option<Self> {
        let mercure = match value {
            AttributeValue::Null => return None,
            AttributeValue::Bool(enabled) => Mercure::Enabled(*enabled),
            AttributeValue::Int(i) => Mercure::Enabled(*i != 0),
            AttributeValue::Float(f) => Mercure::Enabled(*f != 0.0),
            AttributeValue::String(s) => Mercure::Enabled(!s.is_empty() && s != "0"),
            AttributeValue::Map(_) | AttributeValue::List(_) if value.is_empty() => Mercure::Enabled(false),
            AttributeValue::Map(_) | AttributeValue::List(_) => Mercure::Options {
                hub: value.get(&"hub".into()).and_then(AttributeValue::as_str).map(str::to_string),
            },
        };
        Some(mercure)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphQlOperation {
    pub name: String,
    pub kind: GraphQlOperationKind,
    pub mercure: Option<Mercure>,
    pub attributes: Attributes,
}

impl GraphQlOperation {
    pub fn new(name: impl Into<String>, kind: GraphQlOperationKind) -> Self {
        GraphQlOperation {
            name: name.into(),
            kind,
            mercure: None,
            attributes: Attributes::new(),
        }
    }

    pub fn subscription(name: impl Into<String>) -> Self {
        Self::new(name, GraphQlOperationKind::Subscription)
    }

    pub fn with_mercure(mut self, mercure: Mercure) -> Self {
        self.mercure = Some(mercure);
        self
    }

    pub fn mercure_enabled(&self) -> bool {
        self.mercure.as_ref().is_some_and(Mercure::is_enabled)
    }
}

/// One resource configuration of a class.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ApiResource {
    pub short_name: Option<String>,
    pub graphql_operations: IndexMap<String, GraphQlOperation>,
}

impl ApiResource {
    pub fn with_graphql_operations(mut self, operations: impl IntoIterator<Item = GraphQlOperation>) -> Self {
        self.graphql_operations = operations.into_iter().map(|op| (op.name.clone(), op)).collect();
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResourceMetadataCollection {
    pub resource_class: String,
    pub resources: Vec<ApiResource>,
}

impl ResourceMetadataCollection {
    pub fn new(resource_class: impl Into<String>, resources: Vec<ApiResource>) -> Self {
        ResourceMetadataCollection {
            resource_class: resource_class.into(),
            resources,
        }
    }

    /// First GraphQL operation with this name across the configurations.
    pub fn graphql_operation(&self, name: &str) -> Option<&GraphQlOperation> {
        self.resources.iter().find_map(|r| r.graphql_operations.get(name))
    }
}

pub trait ResourceMetadataCollectionFactory: Send + Sync {
    fn create(&self, resource_class: &str) -> Result<ResourceMetadataCollection, ResolverError>;
}

/// Collections built from extracted file configuration. Classes never declared
/// produce an empty collection.
#[derive(Clone, Debug)]
pub struct ExtractedResourceMetadataCollectionFactory {
    resources: Arc<ResourceMap>,
}

impl ExtractedResourceMetadataCollectionFactory {
    pub fn new(resources: Arc<ResourceMap>) -> Self {
        ExtractedResourceMetadataCollectionFactory { resources }
    }
}

impl ResourceMetadataCollectionFactory for ExtractedResourceMetadataCollectionFactory {
    fn create(&self, resource_class: &str) -> Result<ResourceMetadataCollection, ResolverError> {
        let Some(metadata) = self.resources.get(resource_class) else {
            return Ok(ResourceMetadataCollection::new(resource_class, Vec::new()));
        };
        let resource = ApiResource {
            short_name: metadata.short_name.clone(),
            graphql_operations: metadata.graphql.as_ref().map(graphql_operations).unwrap_or_default(),
        };
        Ok(ResourceMetadataCollection::new(resource_class, vec![resource]))
    }
}

fn graphql_operations(operations: &Operations) -> IndexMap<String, GraphQlOperation> {
    operations
        .iter()
        .map(|(name, attributes)| {
            let attributes = attributes.clone().unwrap_or_default();
            let mercure = attributes.get("mercure").and_then(Mercure::from_attribute);
            let operation = GraphQlOperation {
                name: name.clone(),
                kind: GraphQlOperationKind::infer(name, &attributes),
                mercure,
                attributes,
            };
            (name.clone(), operation)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::types::ResourceMetadata;

    #[test]
    fn operation_found_across_configurations() {
        let collection = ResourceMetadataCollection::new(
            "App\\Entity\\Book",
            vec![
                ApiResource::default(),
                ApiResource::default().with_graphql_operations([
                    GraphQlOperation::subscription("update").with_mercure(Mercure::Enabled(true))
                ]),
            ],
        );
        assert!(collection.graphql_operation("update").unwrap().mercure_enabled());
        assert!(collection.graphql_operation("create").is_none());
    }

    #[test]
    fn extracted_graphql_operations_carry_mercure_flag() {
        let mut update = Attributes::new();
        update.insert(
            "mercure".into(),
            AttributeValue::from_entries([(Some("hub".into()), "managed".into())]),
        );
        let mut query = Attributes::new();
        query.insert("mercure".into(), AttributeValue::Bool(false));
        let mut resources = ResourceMap::new();
        resources.insert(
            "Book".into(),
            ResourceMetadata {
                graphql: Some(
                    [
                        ("item_query".to_string(), Some(query)),
                        ("update_subscription".to_string(), Some(update)),
                        ("delete".to_string(), None),
                    ]
                    .into_iter()
                    .collect(),
                ),
                ..Default::default()
            },
        );

        let factory = ExtractedResourceMetadataCollectionFactory::new(Arc::new(resources));
        let collection = factory.create("Book").unwrap();
        let subscription = collection.graphql_operation("update_subscription").unwrap();
        assert_eq!(subscription.kind, GraphQlOperationKind::Subscription);
        assert_eq!(subscription.mercure.as_ref().and_then(Mercure::hub), Some("managed"));
        assert!(!collection.graphql_operation("item_query").unwrap().mercure_enabled());
        assert_eq!(collection.graphql_operation("delete").unwrap().kind, GraphQlOperationKind::Mutation);
        assert!(factory.create("Unknown").unwrap().resources.is_empty());
    }

    #[test]
    fn falsy_mercure_settings_disable_push() {
        let disabled = [
            AttributeValue::Bool(false),
            AttributeValue::Int(0),
            AttributeValue::Float(0.0),
            AttributeValue::from(""),
            AttributeValue::from("0"),
            AttributeValue::List(Vec::new()),
            AttributeValue::Map(IndexMap::new()),
        ];
        for value in disabled {
            assert_eq!(Mercure::from_attribute(&value), Some(Mercure::Enabled(false)), "{value:?}");
        }
        assert_eq!(Mercure::from_attribute(&AttributeValue::Null), None);
    }

    #[test]
    fn truthy_mercure_settings_enable_push() {
        assert_eq!(Mercure::from_attribute(&AttributeValue::Bool(true)), Some(Mercure::Enabled(true)));
        assert_eq!(Mercure::from_attribute(&AttributeValue::Int(1)), Some(Mercure::Enabled(true)));
        assert_eq!(
            Mercure::from_attribute(&AttributeValue::from_entries([(Some("hub".into()), "managed".into())])),
            Some(Mercure::Options { hub: Some("managed".into()) })
        );
        assert_eq!(
            Mercure::from_attribute(&AttributeValue::List(vec![AttributeValue::from("private")])),
            Some(Mercure::Options { hub: None })
        );
    }

    #[test]
    fn operation_kind_prefers_explicit_setting() {
        let mut attributes = Attributes::new();
        assert_eq!(GraphQlOperationKind::infer("update", &attributes), GraphQlOperationKind::Mutation);

        attributes.insert("mercure".into(), AttributeValue::Bool(true));
        assert_eq!(GraphQlOperationKind::infer("update", &attributes), GraphQlOperationKind::Subscription);

        attributes.insert("kind".into(), AttributeValue::from("mutation"));
        assert_eq!(GraphQlOperationKind::infer("update", &attributes), GraphQlOperationKind::Mutation);

        let mut typed = Attributes::new();
        typed.insert("type".into(), AttributeValue::from("Subscription"));
        assert_eq!(GraphQlOperationKind::infer("update", &typed), GraphQlOperationKind::Subscription);

        assert_eq!(
            GraphQlOperationKind::infer("create_subscription", &Attributes::new()),
            GraphQlOperationKind::Subscription
        );
        assert_eq!(GraphQlOperationKind::infer("collection_query", &Attributes::new()), GraphQlOperationKind::QueryCollection);

        let mut query = Attributes::new();
        query.insert("mercure".into(), AttributeValue::Bool(false));
        assert_eq!(GraphQlOperationKind::infer("item_query", &query), GraphQlOperationKind::Query);
    }
}

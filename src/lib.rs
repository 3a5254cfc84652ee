//! Resource metadata extraction and GraphQL item resolvers.
//!
//! [`metadata`] turns XML/YAML resource configuration into [`ResourceMap`]s;
//! [`graphql`] resolves item queries and subscriptions over pluggable
//! read/security/serialize stages.

pub mod error;
pub mod graphql;
pub mod metadata;
pub mod settings;

pub use error::{Error, ErrorBody, ExtractError, ResolverError};
pub use graphql::{
    FieldSelection, HubSubscriptionIriGenerator, InMemorySubscriptionManager, ItemResolverFactory,
    ItemSubscriptionResolverFactory, MercureSubscriptionIriGenerator, Payload, ReadStage, ResolveInfo, ResolverContext,
    SecurityStage, SerializeStage, Stages, SubscriptionManager,
};
pub use metadata::{
    extract, ExtractedResourceMetadataCollectionFactory, ParameterResolver, ResourceExtractor, ResourceMap,
    ResourceMetadata, ResourceMetadataCollectionFactory,
};
pub use settings::Settings;

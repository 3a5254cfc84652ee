//! Subscription identifiers and push payloads.

use crate::error::ResolverError;
use crate::graphql::context::{FieldSelection, ResolverContext};
use crate::graphql::stage::Payload;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::Mutex;

#[async_trait]
pub trait SubscriptionManager: Send + Sync {
    /// Id of the subscription matching this request, registering it when new.
    /// `None` means no subscription applies (e.g. nothing identifies the item).
    async fn retrieve_subscription_id(
        &self,
        context: &ResolverContext,
        payload: Option<&Payload>,
    ) -> Result<Option<String>, ResolverError>;
}

pub trait SubscriptionIdentifierGenerator: Send + Sync {
    fn generate(&self, fields: &FieldSelection) -> String;
}

/// Random 128-bit hex identifiers.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomSubscriptionIdentifierGenerator;

impl SubscriptionIdentifierGenerator for RandomSubscriptionIdentifierGenerator {
    fn generate(&self, _fields: &FieldSelection) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Subscription {
    id: String,
    fields: FieldSelection,
    last_result: Value,
}

/// Subscriptions grouped by subscribed IRI, kept in process memory until
/// [`unsubscribe`](Self::unsubscribe) or [`remove_iri`](Self::remove_iri).
pub struct InMemorySubscriptionManager<G = RandomSubscriptionIdentifierGenerator> {
    generator: G,
    subscriptions: Mutex<HashMap<String, Vec<Subscription>>>,
}

impl InMemorySubscriptionManager {
    pub fn new() -> Self {
        Self::with_generator(RandomSubscriptionIdentifierGenerator)
    }
}

impl Default for InMemorySubscriptionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: SubscriptionIdentifierGenerator> InMemorySubscriptionManager<G> {
    pub fn with_generator(generator: G) -> Self {
        InMemorySubscriptionManager {
            generator,
            subscriptions: Mutex::new(HashMap::new()),
        }
    }

    /// Payloads to publish after `iri` changed: one per subscription whose
    /// projection of `payload` differs from what it last received.
    pub async fn push_payloads(&self, iri: &str, payload: &Payload) -> Vec<(String, Payload)> {
        let mut subscriptions = self.subscriptions.lock().await;
        let Some(entries) = subscriptions.get_mut(iri) else {
            return Vec::new();
        };
        let current = Value::Object(payload.clone());
        let mut pushes = Vec::new();
        for subscription in entries.iter_mut() {
            let projected = without_client_id(subscription.fields.project(&current));
            if projected == subscription.last_result {
                continue;
            }
            subscription.last_result = projected.clone();
            if let Value::Object(data) = projected {
                pushes.push((subscription.id.clone(), data));
            }
        }
        pushes
    }

    /// Drop subscription `id` on `iri`; the IRI entry goes once it is empty.
    /// Returns whether a subscription was removed.
    pub async fn unsubscribe(&self, iri: &str, id: &str) -> bool {
        let mut subscriptions = self.subscriptions.lock().await;
        let Some(entries) = subscriptions.get_mut(iri) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|s| s.id != id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            subscriptions.remove(iri);
        }
        if removed {
            tracing::info!(iri, subscription_id = id, "removed subscription");
        }
        removed
    }

    /// Drop every subscription on `iri`, e.g. once the item is deleted.
    pub async fn remove_iri(&self, iri: &str) -> usize {
        self.subscriptions.lock().await.remove(iri).map_or(0, |entries| entries.len())
    }

    pub async fn subscription_count(&self, iri: &str) -> usize {
        self.subscriptions.lock().await.get(iri).map_or(0, Vec::len)
    }
}

#[async_trait]
impl<G: SubscriptionIdentifierGenerator> SubscriptionManager for InMemorySubscriptionManager<G> {
    async fn retrieve_subscription_id(
        &self,
        context: &ResolverContext,
        payload: Option<&Payload>,
    ) -> Result<Option<String>, ResolverError> {
        let Some(iri) = context.subscribed_iri() else {
            return Ok(None);
        };
        let fields = &context.info.field_selection;

        let mut subscriptions = self.subscriptions.lock().await;
        let entries = subscriptions.entry(iri.to_string()).or_default();
        if let Some(existing) = entries.iter().find(|s| &s.fields == fields) {
            return Ok(Some(existing.id.clone()));
        }

        let id = self.generator.generate(fields);
        let last_result = payload.map_or(Value::Null, |p| {
            without_client_id(fields.project(&Value::Object(p.clone())))
        });
        entries.push(Subscription {
            id: id.clone(),
            fields: fields.clone(),
            last_result,
        });
        tracing::info!(iri, subscription_id = %id, "registered subscription");
        Ok(Some(id))
    }
}

fn without_client_id(mut value: Value) -> Value {
    if let Value::Object(object) = &mut value {
        object.remove("clientSubscriptionId");
    }
    value
}

//! Mercure topic and hub URLs for subscriptions.

use std::collections::HashMap;
use url::Url;

pub trait MercureSubscriptionIriGenerator: Send + Sync {
    fn generate_topic_iri(&self, subscription_id: &str) -> String;

    /// URL a client listens on for `subscription_id`, through `hub` when set.
    fn generate_mercure_url(&self, subscription_id: &str, hub: Option<&str>) -> String;
}

/// Topics are `{scheme}://{host}/subscriptions/{id}`; URLs point at the
/// default hub unless a configured named hub is requested.
#[derive(Clone, Debug)]
pub struct HubSubscriptionIriGenerator {
    scheme: String,
    host: String,
    default_hub_url: Url,
    hubs: HashMap<String, Url>,
}

impl HubSubscriptionIriGenerator {
    pub fn new(
        scheme: impl Into<String>,
        host: impl Into<String>,
        default_hub_url: &str,
    ) -> Result<Self, url::ParseError> {
        Ok(HubSubscriptionIriGenerator {
            scheme: scheme.into(),
            host: host.into(),
            default_hub_url: Url::parse(default_hub_url)?,
            hubs: HashMap::new(),
        })
    }

    pub fn with_hub(mut self, name: impl Into<String>, url: &str) -> Result<Self, url::ParseError> {
        self.hubs.insert(name.into(), Url::parse(url)?);
        Ok(self)
    }

    fn hub_url(&self, hub: Option<&str>) -> &Url {
        match hub.and_then(|name| self.hubs.get(name)) {
            Some(url) => url,
            None => {
                if let Some(name) = hub {
                    tracing::warn!(hub = name, "unknown mercure hub, using the default one");
                }
                &self.default_hub_url
            }
        }
    }
}

impl MercureSubscriptionIriGenerator for HubSubscriptionIriGenerator {
    fn generate_topic_iri(&self, subscription_id: &str) -> String {
        format!("{}://{}/subscriptions/{}", self.scheme, self.host, subscription_id)
    }

    fn generate_mercure_url(&self, subscription_id: &str, hub: Option<&str>) -> String {
        let topic = self.generate_topic_iri(subscription_id);
        let mut url = self.hub_url(hub).clone();
        url.query_pairs_mut().append_pair("topic", &topic).finish();
        url.to_string()
    }
}

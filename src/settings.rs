//! Environment-driven settings. `.env` is loaded first when present.

use crate::error::Error;
use crate::graphql::mercure::HubSubscriptionIriGenerator;
use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    /// Resource configuration files, in merge order.
    pub resource_paths: Vec<PathBuf>,
    /// Absent when push notifications are not configured.
    pub mercure_hub_url: Option<String>,
    pub topic_scheme: String,
    pub topic_host: String,
}

impl Settings {
    pub fn from_env() -> Result<Self, Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let paths = lookup("RESOURCE_CONFIG_PATHS")
            .ok_or_else(|| Error::Settings("RESOURCE_CONFIG_PATHS is not set".into()))?;
        let resource_paths: Vec<PathBuf> = paths
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .collect();
        if resource_paths.is_empty() {
            return Err(Error::Settings("RESOURCE_CONFIG_PATHS lists no file".into()));
        }
        Ok(Settings {
            resource_paths,
            mercure_hub_url: lookup("MERCURE_HUB_URL").filter(|url| !url.trim().is_empty()),
            topic_scheme: lookup("SUBSCRIPTION_TOPIC_SCHEME").unwrap_or_else(|| "https".into()),
            topic_host: lookup("SUBSCRIPTION_TOPIC_HOST").unwrap_or_else(|| "localhost".into()),
        })
    }

    /// Mercure URL generator, when a hub is configured.
    pub fn mercure_generator(&self) -> Result<Option<HubSubscriptionIriGenerator>, Error> {
        self.mercure_hub_url
            .as_deref()
            .map(|hub| {
                HubSubscriptionIriGenerator::new(&self.topic_scheme, &self.topic_host, hub)
                    .map_err(|e| Error::Settings(format!("MERCURE_HUB_URL \"{}\" is invalid: {}", hub, e)))
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, Error> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn paths_keep_order_and_defaults_apply() {
        let s = settings(&[("RESOURCE_CONFIG_PATHS", "a.xml, b.yaml")]).unwrap();
        assert_eq!(s.resource_paths, vec![PathBuf::from("a.xml"), PathBuf::from("b.yaml")]);
        assert_eq!(s.topic_scheme, "https");
        assert!(s.mercure_generator().unwrap().is_none());
    }

    #[test]
    fn hub_enables_generator() {
        let s = settings(&[
            ("RESOURCE_CONFIG_PATHS", "a.xml"),
            ("MERCURE_HUB_URL", "https://hub/.well-known/mercure"),
        ])
        .unwrap();
        assert!(s.mercure_generator().unwrap().is_some());
    }

    #[test]
    fn invalid_hub_is_a_settings_error() {
        let s = settings(&[("RESOURCE_CONFIG_PATHS", "a.xml"), ("MERCURE_HUB_URL", "hub without scheme")]).unwrap();
        assert!(matches!(s.mercure_generator(), Err(Error::Settings(_))));
    }

    #[test]
    fn missing_paths_is_an_error() {
        assert!(matches!(settings(&[]), Err(Error::Settings(_))));
        assert!(matches!(settings(&[("RESOURCE_CONFIG_PATHS", " , ")]), Err(Error::Settings(_))));
    }
}

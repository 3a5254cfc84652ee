//! Placeholder (`%name%`) substitution against a parameter source.

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Generic key-value service lookup.
pub trait Container: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

/// Framework parameter bag lookup.
pub trait ParameterBag: Send + Sync {
    fn get_parameter(&self, key: &str) -> Option<String>;
}

/// Lookup strategy, chosen explicitly by the caller.
#[derive(Clone, Default)]
pub enum ParameterResolver {
    /// Placeholders are kept verbatim, delimiters included.
    #[default]
    None,
    Container(Arc<dyn Container>),
    ParameterBag(Arc<dyn ParameterBag>),
}

impl fmt::Debug for ParameterResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterResolver::None => f.write_str("ParameterResolver::None"),
            ParameterResolver::Container(_) => f.write_str("ParameterResolver::Container"),
            ParameterResolver::ParameterBag(_) => f.write_str("ParameterResolver::ParameterBag"),
        }
    }
}

impl ParameterResolver {
    pub fn container(container: impl Container + 'static) -> Self {
        ParameterResolver::Container(Arc::new(container))
    }

    pub fn parameter_bag(bag: impl ParameterBag + 'static) -> Self {
        ParameterResolver::ParameterBag(Arc::new(bag))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, ParameterResolver::None)
    }

    fn lookup(&self, key: &str) -> Option<String> {
        match self {
            ParameterResolver::None => None,
            ParameterResolver::Container(c) => c.get(key),
            ParameterResolver::ParameterBag(b) => b.get_parameter(key),
        }
    }
}

impl Container for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

impl ParameterBag for HashMap<String, String> {
    fn get_parameter(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// Parameter bag backed by the process environment, `.env` loaded first.
#[derive(Clone, Debug, Default)]
pub struct EnvParameterBag {
    prefix: String,
}

impl EnvParameterBag {
    pub fn new() -> Self {
        dotenvy::dotenv().ok();
        Self::default()
    }

    /// Parameter `dummy_class` is read from `{prefix}DUMMY_CLASS`.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        dotenvy::dotenv().ok();
        EnvParameterBag { prefix: prefix.into() }
    }
}

impl ParameterBag for EnvParameterBag {
    fn get_parameter(&self, key: &str) -> Option<String> {
        std::env::var(format!("{}{}", self.prefix, key.to_ascii_uppercase())).ok()
    }
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"%%|%([^%\s]+)%").expect("valid placeholder regex"))
}

/// One substitution pass. Each distinct parameter is looked up at most once.
pub(crate) struct PlaceholderResolution<'a> {
    resolver: &'a ParameterResolver,
    cache: HashMap<String, String>,
}

impl<'a> PlaceholderResolution<'a> {
    pub(crate) fn new(resolver: &'a ParameterResolver) -> Self {
        PlaceholderResolution {
            resolver,
            cache: HashMap::new(),
        }
    }

    /// Substitute every `%name%` in `value`. Returns the name of the first
    /// parameter the resolver does not know.
    pub(crate) fn resolve(&mut self, value: &str) -> Result<String, String> {
        if self.resolver.is_none() || !value.contains('%') {
            return Ok(value.to_string());
        }
        let mut missing: Option<String> = None;
        let resolved = placeholder_regex().replace_all(value, |caps: &Captures| {
            let Some(name) = caps.get(1).map(|m| m.as_str()) else {
                return "%".to_string();
            };
            if let Some(hit) = self.cache.get(name) {
                return hit.clone();
            }
            match self.resolver.lookup(name) {
                Some(found) => {
                    self.cache.insert(name.to_string(), found.clone());
                    found
                }
                None => {
                    missing.get_or_insert_with(|| name.to_string());
                    String::new()
                }
            }
        });
        match missing {
            Some(name) => {
                tracing::warn!(parameter = %name, "unresolved placeholder");
                Err(name)
            }
            None => Ok(resolved.into_owned()),
        }
    }
}

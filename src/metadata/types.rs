//! Normalized resource metadata produced by the extractor.
//!
//! Every optional field distinguishes "not declared" (`None`) from "declared
//! but empty" (`Some` of an empty map).

use crate::metadata::value::{merge_attributes, Attributes};
use indexmap::IndexMap;

/// Operation name → operation attributes. An operation declared without any
/// attribute may be `None` or `Some(empty)` depending on the source format.
pub type Operations = IndexMap<String, Option<Attributes>>;

/// Resource class (or unresolved placeholder) → metadata, in declaration order.
pub type ResourceMap = IndexMap<String, ResourceMetadata>;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResourceMetadata {
    pub short_name: Option<String>,
    pub description: Option<String>,
    pub iri: Option<String>,
    pub item_operations: Option<Operations>,
    pub collection_operations: Option<Operations>,
    pub subresource_operations: Option<Operations>,
    pub graphql: Option<Operations>,
    pub attributes: Option<Attributes>,
    pub properties: Option<IndexMap<String, PropertyMetadata>>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertyMetadata {
    pub description: Option<String>,
    pub readable: Option<bool>,
    pub writable: Option<bool>,
    pub readable_link: Option<bool>,
    pub writable_link: Option<bool>,
    pub required: Option<bool>,
    pub identifier: Option<bool>,
    pub iri: Option<String>,
    pub attributes: Attributes,
    pub subresource: Option<SubresourceMetadata>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SubresourceMetadata {
    pub collection: Option<bool>,
    pub resource_class: Option<String>,
    pub max_depth: Option<i64>,
}

impl ResourceMetadata {
    /// Apply a later declaration of the same class on top of this one.
    pub fn merge(self, later: ResourceMetadata) -> ResourceMetadata {
        ResourceMetadata {
            short_name: later.short_name.or(self.short_name),
            description: later.description.or(self.description),
            iri: later.iri.or(self.iri),
            item_operations: merge_option(self.item_operations, later.item_operations, merge_operations),
            collection_operations: merge_option(self.collection_operations, later.collection_operations, merge_operations),
            subresource_operations: merge_option(
                self.subresource_operations,
                later.subresource_operations,
                merge_operations,
            ),
            graphql: merge_option(self.graphql, later.graphql, merge_operations),
            attributes: merge_option(self.attributes, later.attributes, merge_attributes),
            properties: merge_option(self.properties, later.properties, |mut base, over| {
                for (name, property) in over {
                    match base.get_mut(&name) {
                        Some(existing) => {
                            let previous = std::mem::take(existing);
                            *existing = previous.merge(property);
                        }
                        None => {
                            base.insert(name, property);
                        }
                    }
                }
                base
            }),
        }
    }

    /// Names of every operation declared for this resource, any kind.
    pub fn operation_names(&self) -> impl Iterator<Item = &str> {
        [
            &self.item_operations,
            &self.collection_operations,
            &self.subresource_operations,
            &self.graphql,
        ]
        .into_iter()
        .flatten()
        .flat_map(|ops| ops.keys().map(String::as_str))
    }
}

impl PropertyMetadata {
    pub fn merge(self, later: PropertyMetadata) -> PropertyMetadata {
        PropertyMetadata {
            description: later.description.or(self.description),
            readable: later.readable.or(self.readable),
            writable: later.writable.or(self.writable),
            readable_link: later.readable_link.or(self.readable_link),
            writable_link: later.writable_link.or(self.writable_link),
            required: later.required.or(self.required),
            identifier: later.identifier.or(self.identifier),
            iri: later.iri.or(self.iri),
            attributes: merge_attributes(self.attributes, later.attributes),
            subresource: later.subresource.or(self.subresource),
        }
    }
}

fn merge_option<T>(base: Option<T>, later: Option<T>, merge: impl FnOnce(T, T) -> T) -> Option<T> {
    match (base, later) {
        (Some(b), Some(l)) => Some(merge(b, l)),
        (b, l) => l.or(b),
    }
}

fn merge_operations(mut base: Operations, later: Operations) -> Operations {
    for (name, attributes) in later {
        let merged = match (base.get_mut(&name), attributes) {
            (Some(slot), Some(over)) => match slot.take() {
                Some(existing) => Some(merge_attributes(existing, over)),
                None => Some(over),
            },
            (Some(slot), None) => slot.take(),
            (None, attributes) => attributes,
        };
        base.insert(name, merged);
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::value::AttributeValue;

    fn ops(entries: &[(&str, Option<Attributes>)]) -> Operations {
        entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn later_declaration_wins_per_field() {
        let first = ResourceMetadata {
            short_name: Some("first".into()),
            description: Some("kept".into()),
            ..Default::default()
        };
        let second = ResourceMetadata {
            short_name: Some("second".into()),
            ..Default::default()
        };
        let merged = first.merge(second);
        assert_eq!(merged.short_name.as_deref(), Some("second"));
        assert_eq!(merged.description.as_deref(), Some("kept"));
        assert_eq!(merged.item_operations, None);
    }

    #[test]
    fn operations_merge_by_name() {
        let get: Attributes = [("method".to_string(), AttributeValue::from("GET"))].into_iter().collect();
        let path: Attributes = [("path".to_string(), AttributeValue::from("/greetings"))].into_iter().collect();
        let first = ResourceMetadata {
            item_operations: Some(ops(&[("get", Some(get)), ("put", None)])),
            ..Default::default()
        };
        let second = ResourceMetadata {
            item_operations: Some(ops(&[("get", Some(path)), ("delete", None)])),
            ..Default::default()
        };
        let merged = first.merge(second).item_operations.unwrap();
        assert_eq!(merged.keys().collect::<Vec<_>>(), vec!["get", "put", "delete"]);
        let get = merged["get"].as_ref().unwrap();
        assert_eq!(get["method"], AttributeValue::from("GET"));
        assert_eq!(get["path"], AttributeValue::from("/greetings"));
    }

    #[test]
    fn unset_stays_distinct_from_empty() {
        let declared_empty = ResourceMetadata {
            properties: Some(IndexMap::new()),
            ..Default::default()
        };
        let merged = declared_empty.merge(ResourceMetadata::default());
        assert_eq!(merged.properties, Some(IndexMap::new()));
        assert_eq!(merged.attributes, None);
    }
}

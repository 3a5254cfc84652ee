//! YAML resource configuration format.
//!
//! ```yaml
//! resources:
//!     App\Entity\Greeting:
//!         shortName: greeting
//!         itemOperations:
//!             get: ~
//!         properties:
//!             foo:
//!                 readable: true
//!                 subresource: { collection: true, resourceClass: Foo, maxDepth: 1 }
//! ```

use crate::error::ExtractError;
use crate::metadata::parameters::PlaceholderResolution;
use crate::metadata::types::{Operations, PropertyMetadata, ResourceMetadata, SubresourceMetadata};
use crate::metadata::value::{AttributeKey, AttributeValue, Attributes};
use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};
use std::path::Path;

pub(crate) fn parse(
    path: &Path,
    content: &str,
    params: &mut PlaceholderResolution<'_>,
) -> Result<Vec<(String, ResourceMetadata)>, ExtractError> {
    let document: Value = if content.trim().is_empty() {
        Value::Null
    } else {
        serde_yaml::from_str(content).map_err(|e| ExtractError::malformed(path, e.to_string()))?
    };

    let resources = match document {
        Value::Mapping(mut root) => match root.remove("resources") {
            Some(resources) => resources,
            None => Value::Mapping(root),
        },
        Value::Null => Value::Null,
        other => {
            return Err(ExtractError::malformed(
                path,
                format!("expected a mapping at the document root, {} given", type_name(&other)),
            ))
        }
    };
    let resources = match resources {
        Value::Null => return Ok(Vec::new()),
        Value::Mapping(m) => m,
        other => {
            return Err(ExtractError::malformed(
                path,
                format!("\"resources\" setting is expected to be null or a mapping, {} given", type_name(&other)),
            ))
        }
    };

    let mut extracted = Vec::with_capacity(resources.len());
    for (class, resource) in resources {
        let class = match class {
            Value::String(s) => s,
            other => {
                return Err(ExtractError::malformed(
                    path,
                    format!("resource class must be a string, {} given", type_name(&other)),
                ))
            }
        };
        let resolved_class = resolve(path, params, &class)?;
        let resource = match resource {
            Value::Null => Mapping::new(),
            Value::Mapping(m) => m,
            other => {
                return Err(ExtractError::malformed(
                    path,
                    format!("\"{}\" setting is expected to be null or a mapping, {} given", class, type_name(&other)),
                ))
            }
        };
        let metadata = ResourceMetadata {
            short_name: string_field(path, &resource, "shortName")?,
            description: string_field(path, &resource, "description")?,
            iri: string_field(path, &resource, "iri")?,
            item_operations: operations(path, &resource, "itemOperations")?,
            collection_operations: operations(path, &resource, "collectionOperations")?,
            subresource_operations: operations(path, &resource, "subresourceOperations")?,
            graphql: operations(path, &resource, "graphql")?,
            attributes: match resource.get("attributes") {
                None | Some(Value::Null) => None,
                Some(v) => Some(attribute_map(path, v, "attributes")?),
            },
            properties: properties(path, &resource, params)?,
        };
        extracted.push((resolved_class, metadata));
    }
    Ok(extracted)
}

fn resolve(path: &Path, params: &mut PlaceholderResolution<'_>, value: &str) -> Result<String, ExtractError> {
    params.resolve(value).map_err(|name| ExtractError::UnresolvedParameter {
        name,
        path: path.to_path_buf(),
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

fn string_field(path: &Path, map: &Mapping, key: &str) -> Result<Option<String>, ExtractError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(ExtractError::malformed(
            path,
            format!("\"{}\" must be a string, {} given", key, type_name(other)),
        )),
    }
}

fn bool_field(path: &Path, map: &Mapping, key: &str) -> Result<Option<bool>, ExtractError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(ExtractError::malformed(
            path,
            format!("\"{}\" must be a boolean, {} given", key, type_name(other)),
        )),
    }
}

/// `~` keeps the operation unset, `{}` keeps it declared and empty.
fn operations(path: &Path, resource: &Mapping, key: &str) -> Result<Option<Operations>, ExtractError> {
    let operations = match resource.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Mapping(m)) => m,
        Some(other) => {
            return Err(ExtractError::malformed(
                path,
                format!("\"{}\" must be a mapping, {} given", key, type_name(other)),
            ))
        }
    };
    let mut extracted = Operations::new();
    for (name, attributes) in operations {
        let name = scalar_key(path, name)?.to_string();
        let attributes = match attributes {
            Value::Null => None,
            other => Some(attribute_map(path, other, &name)?),
        };
        extracted.insert(name, attributes);
    }
    Ok(Some(extracted))
}

fn attribute_map(path: &Path, value: &Value, context: &str) -> Result<Attributes, ExtractError> {
    match value {
        Value::Mapping(m) => m
            .iter()
            .map(|(k, v)| Ok((scalar_key(path, k)?.to_string(), attribute_value(path, v)?)))
            .collect(),
        Value::Sequence(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| Ok((i.to_string(), attribute_value(path, v)?)))
            .collect(),
        Value::Tagged(tagged) => attribute_map(path, &tagged.value, context),
        other => Err(ExtractError::malformed(
            path,
            format!("\"{}\" must be a mapping, {} given", context, type_name(other)),
        )),
    }
}

fn scalar_key(path: &Path, key: &Value) -> Result<AttributeKey, ExtractError> {
    match key {
        Value::String(s) => Ok(AttributeKey::parse(s)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(AttributeKey::Index(i)),
            None => Ok(AttributeKey::Name(n.to_string())),
        },
        Value::Bool(b) => Ok(AttributeKey::Name(b.to_string())),
        other => Err(ExtractError::malformed(
            path,
            format!("keys must be scalars, {} given", type_name(other)),
        )),
    }
}

fn attribute_value(path: &Path, value: &Value) -> Result<AttributeValue, ExtractError> {
    Ok(match value {
        Value::Null => AttributeValue::Null,
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => AttributeValue::Int(i),
            None => n.as_f64().map(AttributeValue::Float).unwrap_or(AttributeValue::Null),
        },
        Value::String(s) => AttributeValue::String(s.clone()),
        Value::Sequence(items) => AttributeValue::List(
            items
                .iter()
                .map(|v| attribute_value(path, v))
                .collect::<Result<_, _>>()?,
        ),
        Value::Mapping(m) => AttributeValue::from_entries(
            m.iter()
                .map(|(k, v)| Ok((Some(scalar_key(path, k)?), attribute_value(path, v)?)))
                .collect::<Result<Vec<_>, ExtractError>>()?,
        ),
        Value::Tagged(tagged) => attribute_value(path, &tagged.value)?,
    })
}

fn properties(
    path: &Path,
    resource: &Mapping,
    params: &mut PlaceholderResolution<'_>,
) -> Result<Option<IndexMap<String, PropertyMetadata>>, ExtractError> {
    let properties = match resource.get("properties") {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Mapping(m)) => m,
        Some(other) => {
            return Err(ExtractError::malformed(
                path,
                format!("\"properties\" setting is expected to be null or a mapping, {} given", type_name(other)),
            ))
        }
    };

    let mut extracted = IndexMap::new();
    for (name, values) in properties {
        let name = scalar_key(path, name)?.to_string();
        let values = match values {
            Value::Null => {
                extracted.insert(name, PropertyMetadata::default());
                continue;
            }
            Value::Mapping(m) => m,
            other => {
                return Err(ExtractError::malformed(
                    path,
                    format!("\"{}\" setting is expected to be null or a mapping, {} given", name, type_name(other)),
                ))
            }
        };
        let subresource = match values.get("subresource") {
            None | Some(Value::Null) => None,
            Some(Value::Mapping(sub)) => Some(SubresourceMetadata {
                collection: bool_field(path, sub, "collection")?,
                resource_class: string_field(path, sub, "resourceClass")?
                    .map(|class| resolve(path, params, &class))
                    .transpose()?,
                max_depth: match sub.get("maxDepth") {
                    None | Some(Value::Null) => None,
                    Some(Value::Number(n)) if n.as_i64().is_some() => n.as_i64(),
                    Some(other) => {
                        return Err(ExtractError::malformed(
                            path,
                            format!("\"maxDepth\" must be an integer, {} given", type_name(other)),
                        ))
                    }
                },
            }),
            Some(other) => {
                return Err(ExtractError::malformed(
                    path,
                    format!("\"subresource\" must be a mapping, {} given", type_name(other)),
                ))
            }
        };
        let metadata = PropertyMetadata {
            description: string_field(path, values, "description")?,
            readable: bool_field(path, values, "readable")?,
            writable: bool_field(path, values, "writable")?,
            readable_link: bool_field(path, values, "readableLink")?,
            writable_link: bool_field(path, values, "writableLink")?,
            required: bool_field(path, values, "required")?,
            identifier: bool_field(path, values, "identifier")?,
            iri: string_field(path, values, "iri")?,
            attributes: match values.get("attributes") {
                None | Some(Value::Null) => Attributes::new(),
                Some(v) => attribute_map(path, v, "attributes")?,
            },
            subresource,
        };
        extracted.insert(name, metadata);
    }
    Ok(Some(extracted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::parameters::ParameterResolver;

    fn parse_str(content: &str) -> Result<Vec<(String, ResourceMetadata)>, ExtractError> {
        let resolver = ParameterResolver::None;
        let mut params = PlaceholderResolution::new(&resolver);
        parse(Path::new("resources.yaml"), content, &mut params)
    }

    #[test]
    fn empty_documents_have_no_resources() {
        assert!(parse_str("").unwrap().is_empty());
        assert!(parse_str("resources: ~").unwrap().is_empty());
        assert!(parse_str("resources: {}").unwrap().is_empty());
    }

    #[test]
    fn null_and_empty_operations_are_distinct() {
        let resources = parse_str(
            "resources:\n  Foo:\n    itemOperations:\n      get: ~\n      put: {}\n",
        )
        .unwrap();
        let ops = resources[0].1.item_operations.as_ref().unwrap();
        assert_eq!(ops["get"], None);
        assert_eq!(ops["put"], Some(Attributes::new()));
    }

    #[test]
    fn mixed_positional_and_keyed_attributes() {
        let resources = parse_str(
            "resources:\n  Foo:\n    attributes:\n      bar: { 0: [Bar], baz: Baz }\n      const: 0\n",
        )
        .unwrap();
        let attributes = resources[0].1.attributes.as_ref().unwrap();
        let AttributeValue::Map(bar) = &attributes["bar"] else { panic!("expected a map: {:?}", attributes["bar"]) };
        assert_eq!(bar[&AttributeKey::Index(0)], AttributeValue::List(vec!["Bar".into()]));
        assert_eq!(bar[&AttributeKey::from("baz")], AttributeValue::from("Baz"));
        assert_eq!(attributes["const"], AttributeValue::Int(0));
    }

    #[test]
    fn scalar_resource_is_malformed() {
        let err = parse_str("resources:\n  Foo: 3\n").unwrap_err();
        assert!(err.to_string().contains("\"Foo\" setting is expected to be null or a mapping"), "{err}");
    }

    #[test]
    fn invalid_yaml_is_malformed() {
        let err = parse_str("resources: [unclosed").unwrap_err();
        assert!(matches!(err, ExtractError::MalformedConfiguration { .. }));
    }
}

//! Per-request resolver context.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Requested sub-fields, keyed by field name. Sorted, so two selections of the
/// same fields compare equal whatever order the client wrote them in.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FieldSelection(BTreeMap<String, FieldSelection>);

impl FieldSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn leaf(mut self, name: impl Into<String>) -> Self {
        self.0.insert(name.into(), FieldSelection::default());
        self
    }

    pub fn nested(mut self, name: impl Into<String>, selection: FieldSelection) -> Self {
        self.0.insert(name.into(), selection);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSelection)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Keep only the selected fields of `value`. Leaves keep the whole value;
    /// lists are projected element by element.
    pub fn project(&self, value: &Value) -> Value {
        if self.is_empty() {
            return value.clone();
        }
        match value {
            Value::Object(object) => {
                let mut projected = Map::new();
                for (name, selection) in &self.0 {
                    if let Some(field) = object.get(name) {
                        projected.insert(name.clone(), selection.project(field));
                    }
                }
                Value::Object(projected)
            }
            Value::Array(items) => Value::Array(items.iter().map(|item| self.project(item)).collect()),
            other => other.clone(),
        }
    }
}

/// Execution info handed over by the GraphQL engine for the field being resolved.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolveInfo {
    pub field_name: String,
    pub parent_type: String,
    pub field_selection: FieldSelection,
}

impl ResolveInfo {
    pub fn new(field_name: impl Into<String>, parent_type: impl Into<String>, field_selection: FieldSelection) -> Self {
        ResolveInfo {
            field_name: field_name.into(),
            parent_type: parent_type.into(),
            field_selection,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolverContext {
    pub source: Option<Value>,
    pub args: Value,
    pub info: ResolveInfo,
    pub is_collection: bool,
    pub is_mutation: bool,
    pub is_subscription: bool,
    /// Variables exposed to security expressions; `object` is the read item.
    pub extra_variables: Map<String, Value>,
}

impl ResolverContext {
    pub fn item_query(source: Option<Value>, args: Value, info: ResolveInfo) -> Self {
        ResolverContext {
            source,
            args,
            info,
            is_collection: false,
            is_mutation: false,
            is_subscription: false,
            extra_variables: Map::new(),
        }
    }

    pub fn item_subscription(source: Option<Value>, args: Value, info: ResolveInfo) -> Self {
        ResolverContext {
            is_subscription: true,
            ..Self::item_query(source, args, info)
        }
    }

    /// Copy of the context exposing `object` to the security stage.
    pub fn with_object(&self, object: &Value) -> Self {
        let mut context = self.clone();
        context.extra_variables.insert("object".to_string(), object.clone());
        context
    }

    /// IRI of the subscribed item, read from `args.input.id`.
    pub fn subscribed_iri(&self) -> Option<&str> {
        self.args.get("input")?.get("id")?.as_str()
    }
}

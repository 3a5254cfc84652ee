//! Attribute values as declared in resource configuration files.
//!
//! Configuration formats allow lists, keyed maps and maps mixing positional and
//! keyed entries (`{0: "Bar", baz: "Baz"}`). [`AttributeValue`] keeps that
//! distinction instead of flattening everything to string keys.

use indexmap::IndexMap;
use std::fmt;

/// Attribute name → value, in declaration order.
pub type Attributes = IndexMap<String, AttributeValue>;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AttributeKey {
    Index(i64),
    Name(String),
}

impl AttributeKey {
    /// Integer-looking names are positional keys, as in the configuration formats.
    pub fn parse(name: &str) -> Self {
        match name.parse::<i64>() {
            Ok(i) if i.to_string() == name => AttributeKey::Index(i),
            _ => AttributeKey::Name(name.to_string()),
        }
    }
}

impl fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeKey::Index(i) => write!(f, "{}", i),
            AttributeKey::Name(s) => f.write_str(s),
        }
    }
}

impl From<&str> for AttributeKey {
    fn from(s: &str) -> Self {
        AttributeKey::Name(s.to_string())
    }
}

impl From<i64> for AttributeKey {
    fn from(i: i64) -> Self {
        AttributeKey::Index(i)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<AttributeValue>),
    Map(IndexMap<AttributeKey, AttributeValue>),
}

impl AttributeValue {
    /// Build a container from ordered entries. Unnamed entries take the next
    /// free positional index. Keys that are exactly `0..n` in order yield a
    /// [`AttributeValue::List`].
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Option<AttributeKey>, AttributeValue)>,
    {
        let mut map: IndexMap<AttributeKey, AttributeValue> = IndexMap::new();
        let mut next_index: i64 = 0;
        for (key, value) in entries {
            let key = match key {
                Some(AttributeKey::Index(i)) => {
                    next_index = next_index.max(i + 1);
                    AttributeKey::Index(i)
                }
                Some(name) => name,
                None => {
                    let k = AttributeKey::Index(next_index);
                    next_index += 1;
                    k
                }
            };
            map.insert(key, value);
        }
        Self::from_map(map)
    }

    pub fn from_map(map: IndexMap<AttributeKey, AttributeValue>) -> Self {
        let sequential = map
            .keys()
            .enumerate()
            .all(|(pos, key)| matches!(key, AttributeKey::Index(i) if *i == pos as i64));
        if sequential {
            AttributeValue::List(map.into_values().collect())
        } else {
            AttributeValue::Map(map)
        }
    }

    /// Type a raw text scalar: booleans, `null`, integers and floats are
    /// recognized, anything else stays a string. Zero-padded numbers such as
    /// `01234` are identifiers and stay strings.
    pub fn typed_scalar(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "true" => return AttributeValue::Bool(true),
            "false" => return AttributeValue::Bool(false),
            "null" => return AttributeValue::Null,
            _ => {}
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            if i.to_string() == trimmed {
                return AttributeValue::Int(i);
            }
        }
        if !has_leading_zero(trimmed)
            && !trimmed.is_empty()
            && trimmed.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E')) {
            if let Ok(f) = trimmed.parse::<f64>() {
                return AttributeValue::Float(f);
            }
        }
        AttributeValue::String(raw.to_string())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            AttributeValue::Null => true,
            AttributeValue::String(s) => s.is_empty(),
            AttributeValue::List(l) => l.is_empty(),
            AttributeValue::Map(m) => m.is_empty(),
            _ => false,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Keyed lookup; positional lists answer integer keys.
    pub fn get(&self, key: &AttributeKey) -> Option<&AttributeValue> {
        match (self, key) {
            (AttributeValue::Map(m), _) => m.get(key),
            (AttributeValue::List(l), AttributeKey::Index(i)) => usize::try_from(*i).ok().and_then(|i| l.get(i)),
            _ => None,
        }
    }

    /// Structural merge: containers merge by key (recursively), anything else
    /// is replaced by `other`.
    pub fn merge(self, other: AttributeValue) -> AttributeValue {
        match (self.into_container(), other.into_container()) {
            (Ok(mut base), Ok(over)) => {
                merge_into(&mut base, over);
                Self::from_map(base)
            }
            (_, Ok(over)) => Self::from_map(over),
            (_, Err(scalar)) => scalar,
        }
    }

    fn into_container(self) -> Result<IndexMap<AttributeKey, AttributeValue>, AttributeValue> {
        match self {
            AttributeValue::List(l) => Ok(l
                .into_iter()
                .enumerate()
                .map(|(i, v)| (AttributeKey::Index(i as i64), v))
                .collect()),
            AttributeValue::Map(m) => Ok(m),
            other => Err(other),
        }
    }

    /// Lossy view as JSON; positional keys become their decimal string.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            AttributeValue::Null => Value::Null,
            AttributeValue::Bool(b) => Value::Bool(*b),
            AttributeValue::Int(i) => Value::from(*i),
            AttributeValue::Float(f) => Value::from(*f),
            AttributeValue::String(s) => Value::String(s.clone()),
            AttributeValue::List(l) => Value::Array(l.iter().map(AttributeValue::to_json).collect()),
            AttributeValue::Map(m) => Value::Object(m.iter().map(|(k, v)| (k.to_string(), v.to_json())).collect()),
        }
    }
}

/// `01`, `-007`, `00.5`: a zero followed by another digit.
fn has_leading_zero(number: &str) -> bool {
    let digits = number.strip_prefix(['-', '+']).unwrap_or(number).as_bytes();
    digits.len() > 1 && digits[0] == b'0' && digits[1].is_ascii_digit()
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::String(s.to_string())
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Bool(b)
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        AttributeValue::Int(i)
    }
}

/// Merge attribute maps key by key, `over` winning on scalars.
pub fn merge_attributes(mut base: Attributes, over: Attributes) -> Attributes {
    merge_into(&mut base, over);
    base
}

/// Existing keys keep their position; new keys are appended.
fn merge_into<K: std::hash::Hash + Eq>(base: &mut IndexMap<K, AttributeValue>, over: IndexMap<K, AttributeValue>) {
    for (key, value) in over {
        match base.get_mut(&key) {
            Some(existing) => {
                let previous = std::mem::replace(existing, AttributeValue::Null);
                *existing = previous.merge(value);
            }
            None => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_entries_collapse_to_list() {
        let v = AttributeValue::from_entries([(None, "a".into()), (None, "b".into())]);
        assert_eq!(v, AttributeValue::List(vec!["a".into(), "b".into()]));
    }

    #[test]
    fn mixed_entries_keep_positional_and_keyed() {
        let v = AttributeValue::from_entries([
            (None, AttributeValue::List(vec!["Bar".into()])),
            (Some("baz".into()), "Baz".into()),
        ]);
        let AttributeValue::Map(m) = &v else { panic!("expected map, got {:?}", v) };
        assert_eq!(m.keys().collect::<Vec<_>>(), vec![&AttributeKey::Index(0), &AttributeKey::from("baz")]);
        assert_eq!(v.get(&AttributeKey::Index(0)), Some(&AttributeValue::List(vec!["Bar".into()])));
    }

    #[test]
    fn typed_scalars() {
        assert_eq!(AttributeValue::typed_scalar("true"), AttributeValue::Bool(true));
        assert_eq!(AttributeValue::typed_scalar("0"), AttributeValue::Int(0));
        assert_eq!(AttributeValue::typed_scalar("-12"), AttributeValue::Int(-12));
        assert_eq!(AttributeValue::typed_scalar("1.5"), AttributeValue::Float(1.5));
        assert_eq!(AttributeValue::typed_scalar("Baz"), AttributeValue::from("Baz"));
        assert_eq!(AttributeValue::typed_scalar("hydra:Operation"), AttributeValue::from("hydra:Operation"));
    }

    #[test]
    fn zero_padded_numbers_stay_strings() {
        assert_eq!(AttributeValue::typed_scalar("01234"), AttributeValue::from("01234"));
        assert_eq!(AttributeValue::typed_scalar("-007"), AttributeValue::from("-007"));
        assert_eq!(AttributeValue::typed_scalar("00.5"), AttributeValue::from("00.5"));
        assert_eq!(AttributeValue::typed_scalar("0.5"), AttributeValue::Float(0.5));
    }

    #[test]
    fn integer_names_are_positional() {
        assert_eq!(AttributeKey::parse("0"), AttributeKey::Index(0));
        assert_eq!(AttributeKey::parse("01"), AttributeKey::from("01"));
        assert_eq!(AttributeKey::parse("groups"), AttributeKey::from("groups"));
    }

    #[test]
    fn merge_is_structural() {
        let base = AttributeValue::from_entries([
            (Some("groups".into()), AttributeValue::List(vec!["default".into()])),
            (Some("enable_max_depth".into()), true.into()),
        ]);
        let over = AttributeValue::from_entries([(Some("enable_max_depth".into()), false.into())]);
        let merged = base.merge(over);
        assert_eq!(merged.get(&"groups".into()), Some(&AttributeValue::List(vec!["default".into()])));
        assert_eq!(merged.get(&"enable_max_depth".into()), Some(&AttributeValue::Bool(false)));
    }
}

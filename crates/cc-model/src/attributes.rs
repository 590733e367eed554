//! Attribute maps
//!
//! Provides [`Attributes`], the ordered name → [`AttrValue`] mapping carried
//! by payloads, actions and store parameters.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Single attribute value
///
/// Scalars, nested maps and string sequences are modelled explicitly because
/// template substitution rewrites them. Anything else (mixed arrays, arrays of
/// maps) is kept verbatim in [`AttrValue::Other`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    /// Explicit null
    Null,
    /// Boolean flag
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Floating point number
    Float(f64),
    /// String (template-capable)
    Str(String),
    /// Ordered sequence of strings (each element template-capable)
    Strings(Vec<String>),
    /// Nested attribute map
    Map(Attributes),
    /// Any other structured value, passed through untouched
    Other(serde_json::Value),
}

impl AttrValue {
    /// Borrow as string slice when this is a string value
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow as nested map when this is a map value
    #[inline]
    #[must_use]
    pub fn as_map(&self) -> Option<&Attributes> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Check if value is a string
    #[inline]
    #[must_use]
    pub fn is_str(&self) -> bool {
        matches!(self, Self::Str(_))
    }
}

/// Default formatting used when a value is spliced into a template.
///
/// Sequences render comma separated; maps and opaque values render as
/// compact JSON.
impl Display for AttrValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => f.write_str(s),
            Self::Strings(items) => f.write_str(&items.join(",")),
            Self::Map(map) => match serde_json::to_string(map) {
                Ok(json) => f.write_str(&json),
                Err(_) => Err(fmt::Error),
            },
            Self::Other(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for AttrValue {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(items: Vec<String>) -> Self {
        Self::Strings(items)
    }
}

impl From<Attributes> for AttrValue {
    fn from(map: Attributes) -> Self {
        Self::Map(map)
    }
}

/// Ordered attribute map
///
/// Declaration order is preserved so that substitution and serialization are
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(IndexMap<String, AttrValue>);

impl Attributes {
    /// Create empty map
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Get value by name
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.0.get(name)
    }

    /// Get mutable value by name
    #[inline]
    pub fn get_mut(&mut self, name: &str) -> Option<&mut AttrValue> {
        self.0.get_mut(name)
    }

    /// Get string value by name (non-string values yield `None`)
    #[inline]
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(AttrValue::as_str)
    }

    /// Get string value by name, falling back to `default`
    #[must_use]
    pub fn get_string_or_default(&self, name: &str, default: &str) -> String {
        self.get_str(name).unwrap_or(default).to_string()
    }

    /// Insert value, returning the previous one
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Option<AttrValue> {
        self.0.insert(name.into(), value.into())
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Remove value by name
    pub fn remove(&mut self, name: &str) -> Option<AttrValue> {
        self.0.shift_remove(name)
    }

    /// Check if name is present
    #[inline]
    #[must_use]
    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if map is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over entries in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttrValue)> {
        self.0.iter()
    }

    /// Iterate mutably over values in declaration order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut AttrValue)> {
        self.0.iter_mut()
    }

    /// Union of `self` and `overrides`; `overrides` wins on key collision
    #[must_use]
    pub fn merged(&self, overrides: &Attributes) -> Attributes {
        let mut combined = self.clone();
        for (name, value) in overrides.iter() {
            combined.0.insert(name.clone(), value.clone());
        }
        combined
    }
}

impl<K: Into<String>, V: Into<AttrValue>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<'a> IntoIterator for &'a Attributes {
    type Item = (&'a String, &'a AttrValue);
    type IntoIter = indexmap::map::Iter<'a, String, AttrValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

//! Build rules produced by synthesis.

use serde::Serialize;
use std::collections::BTreeMap;

/// The kinds of rule geomys emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RuleKind {
    /// Downloads and unpacks a module zip, exposing its files as sub-targets.
    #[serde(rename = "http_archive")]
    Archive,
    /// Compiles a set of Go sources.
    #[serde(rename = "go_library")]
    Library,
}

impl RuleKind {
    /// Rule function name in the build file.
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::Archive => "http_archive",
            RuleKind::Library => "go_library",
        }
    }
}

/// A rule attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    String(String),
    List(Vec<String>),
    Bool(bool),
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::String(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::String(value.to_string())
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(value: Vec<String>) -> Self {
        AttrValue::List(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

/// One rule: a kind, a unique name, and its attributes.
///
/// `name` is held separately from `attrs`; writers emit it as the `name`
/// attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleSpec {
    pub kind: RuleKind,
    pub name: String,
    pub attrs: BTreeMap<String, AttrValue>,
}

impl RuleSpec {
    pub fn new(kind: RuleKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            attrs: BTreeMap::new(),
        }
    }

    /// Builder-style [`RuleSpec::set_attr`].
    pub fn with_attr(mut self, key: &str, value: impl Into<AttrValue>) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn set_attr(&mut self, key: &str, value: impl Into<AttrValue>) {
        self.attrs.insert(key.to_string(), value.into());
    }

    pub fn attr(&self, key: &str) -> Option<&AttrValue> {
        self.attrs.get(key)
    }

    pub fn string_attr(&self, key: &str) -> Option<&str> {
        match self.attrs.get(key)? {
            AttrValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn list_attr(&self, key: &str) -> Option<&[String]> {
        match self.attrs.get(key)? {
            AttrValue::List(items) => Some(items),
            _ => None,
        }
    }
}

use serde_json::Value;

use super::Check;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Any,
}

impl FieldKind {
    fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Number => value.is_number(),
            FieldKind::Integer => value.is_i64() || value.is_u64(),
            FieldKind::Boolean => value.is_boolean(),
            FieldKind::Array => value.is_array(),
            FieldKind::Object => value.is_object(),
            FieldKind::Any => true,
        }
    }
}

#[derive(Debug, Clone)]
struct FieldRule {
    name: String,
    kind: FieldKind,
    required: bool,
}

/// Flat object contract: named fields with a kind, required or optional.
/// Unlisted fields are accepted.
#[derive(Debug, Clone, Default)]
pub struct Fields {
    rules: Vec<FieldRule>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.rules.push(FieldRule {
            name: name.into(),
            kind,
            required: true,
        });
        self
    }

    pub fn optional(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.rules.push(FieldRule {
            name: name.into(),
            kind,
            required: false,
        });
        self
    }
}

impl Check for Fields {
    fn check(&self, value: &Value) -> bool {
        let Some(object) = value.as_object() else {
            return false;
        };

        self.rules.iter().all(|rule| match object.get(&rule.name) {
            Some(field) => rule.kind.accepts(field),
            None => !rule.required,
        })
    }

    fn property_names(&self) -> Vec<String> {
        self.rules.iter().map(|rule| rule.name.clone()).collect()
    }
}

/// Params contract attached to operations that declare none: every required
/// parameter of the route pattern must be bound to a non-empty string.
#[derive(Debug, Clone, Default)]
pub struct RequiredParams {
    names: Vec<String>,
}

impl RequiredParams {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl Check for RequiredParams {
    fn check(&self, value: &Value) -> bool {
        let Some(object) = value.as_object() else {
            return false;
        };

        self.names.iter().all(|name| {
            object
                .get(name)
                .and_then(Value::as_str)
                .is_some_and(|v| !v.is_empty())
        })
    }

    fn property_names(&self) -> Vec<String> {
        self.names.clone()
    }
}

use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormState {
    #[default]
    Idle,
    Editing,
    Submitting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequiredRule {
    Always(&'static str),
    /// `field` is required only while the boolean `flag` is set in the draft.
    WhenFlag {
        field: &'static str,
        flag: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormRules {
    pub required: Vec<RequiredRule>,
    pub defaults: Map<String, Value>,
}

impl FormRules {
    pub fn require(mut self, field: &'static str) -> Self {
        self.required.push(RequiredRule::Always(field));
        self
    }

    pub fn require_when(mut self, field: &'static str, flag: &'static str) -> Self {
        self.required.push(RequiredRule::WhenFlag { field, flag });
        self
    }

    pub fn default_value(mut self, field: &str, value: Value) -> Self {
        self.defaults.insert(field.to_string(), value);
        self
    }

    pub fn missing_fields(&self, draft: &Draft) -> Vec<String> {
        self.required
            .iter()
            .filter_map(|rule| match rule {
                RequiredRule::Always(field) => (!draft.is_present(field)).then_some(*field),
                RequiredRule::WhenFlag { field, flag } => {
                    (draft.flag(flag) && !draft.is_present(field)).then_some(*field)
                }
            })
            .map(str::to_string)
            .collect()
    }
}

/// Editable field-keyed copy of a record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Draft {
    fields: Map<String, Value>,
}

impl Draft {
    pub fn from_rules(rules: &FormRules) -> Self {
        Self {
            fields: rules.defaults.clone(),
        }
    }

    pub fn from_record<R: Serialize>(record: &R) -> Result<Self, serde_json::Error> {
        match serde_json::to_value(record)? {
            Value::Object(fields) => Ok(Self { fields }),
            other => Ok(Self {
                fields: Map::from_iter([("value".to_string(), other)]),
            }),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn set(&mut self, field: &str, value: Value) {
        self.fields.insert(field.to_string(), value);
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Present means non-null and, for strings, not blank.
    pub fn is_present(&self, field: &str) -> bool {
        match self.fields.get(field) {
            None | Some(Value::Null) => false,
            Some(Value::String(text)) => !text.trim().is_empty(),
            Some(_) => true,
        }
    }

    pub fn flag(&self, field: &str) -> bool {
        match self.fields.get(field) {
            Some(Value::Bool(value)) => *value,
            Some(Value::String(text)) => matches!(text.as_str(), "true" | "yes" | "on"),
            _ => false,
        }
    }

    /// Request payload: empty optional values are dropped, and conditional fields
    /// are dropped while their flag is off.
    pub fn cleaned(&self, rules: &FormRules) -> Map<String, Value> {
        let mut payload: Map<String, Value> = self
            .fields
            .iter()
            .filter(|(_, value)| match value {
                Value::Null => false,
                Value::String(text) => !text.is_empty(),
                _ => true,
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        for rule in &rules.required {
            if let RequiredRule::WhenFlag { field, flag } = rule {
                if !self.flag(flag) {
                    payload.remove(*field);
                }
            }
        }

        payload
    }
}

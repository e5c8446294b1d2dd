use serde::{Deserialize, Serialize};

use crate::validate::ValidationError;

use super::{PluginType, TimeToLive};

/// One value of a record, with the comment written after it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Value {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Value {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::new(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::new(value)
    }
}

/// The data carried by a record: exactly one of the two forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordValue {
    /// A single value rendered on the record's own line.
    Single(Value),

    /// An ordered list of values rendered inside parentheses.
    Multi(Vec<Value>),
}

impl RecordValue {
    pub fn as_single(&self) -> Option<&Value> {
        match self {
            RecordValue::Single(value) => Some(value),
            RecordValue::Multi(_) => None,
        }
    }

    pub fn as_multi(&self) -> Option<&[Value]> {
        match self {
            RecordValue::Single(_) => None,
            RecordValue::Multi(values) => Some(values),
        }
    }

    pub fn as_multi_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            RecordValue::Single(_) => None,
            RecordValue::Multi(values) => Some(values),
        }
    }
}

/// A DNS resource record as declared in a zone definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRecord", into = "RawRecord")]
pub struct ResourceRecord {
    pub name: String,
    pub rtype: PluginType,
    pub class: Option<String>,
    pub ttl: Option<TimeToLive>,
    pub data: RecordValue,
}

impl ResourceRecord {
    pub fn single(rtype: PluginType, value: impl Into<Value>) -> Self {
        Self {
            name: String::new(),
            rtype,
            class: None,
            ttl: None,
            data: RecordValue::Single(value.into()),
        }
    }

    pub fn multi<V: Into<Value>>(rtype: PluginType, values: impl IntoIterator<Item = V>) -> Self {
        Self {
            name: String::new(),
            rtype,
            class: None,
            ttl: None,
            data: RecordValue::Multi(values.into_iter().map(Into::into).collect()),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn with_ttl(mut self, ttl: impl Into<TimeToLive>) -> Self {
        self.ttl = Some(ttl.into());
        self
    }

    /// Default the record name, leaving an explicit name alone.
    pub fn default_name(&mut self, name: &str) {
        if self.name.is_empty() {
            self.name = name.to_owned();
        }
    }
}

/// The flat record shape found in definition files and on the plugin wire.
///
/// `value`/`comment` and `values` are mutually exclusive; converting into a
/// [`ResourceRecord`] is where that is enforced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub rtype: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<TimeToLive>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<Value>,
}

impl TryFrom<RawRecord> for ResourceRecord {
    type Error = ValidationError;

    fn try_from(raw: RawRecord) -> Result<Self, Self::Error> {
        let data = match (raw.value, raw.comment, raw.values.is_empty()) {
            (None, None, false) => RecordValue::Multi(raw.values),
            (value, comment, true) => RecordValue::Single(Value {
                value: value.unwrap_or_default(),
                comment,
            }),
            (_, _, false) => return Err(ValidationError::ValueConflict),
        };

        Ok(ResourceRecord {
            name: raw.name,
            rtype: PluginType::new(raw.rtype),
            class: raw.class,
            ttl: raw.ttl,
            data,
        })
    }
}

impl From<ResourceRecord> for RawRecord {
    fn from(record: ResourceRecord) -> Self {
        let (value, comment, values) = match record.data {
            RecordValue::Single(value) => (Some(value.value), value.comment, Vec::new()),
            RecordValue::Multi(values) => (None, None, values),
        };

        RawRecord {
            name: record.name,
            rtype: record.rtype.to_string(),
            class: record.class,
            ttl: record.ttl,
            value,
            comment,
            values,
        }
    }
}

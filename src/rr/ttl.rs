use std::fmt;

use serde::{Deserialize, Serialize};

/// Time to live, in seconds, as written into a zone file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeToLive(u32);

impl TimeToLive {
    pub fn from_secs(secs: u32) -> Self {
        TimeToLive(secs)
    }

    pub fn as_secs(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TimeToLive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for TimeToLive {
    fn from(value: u32) -> Self {
        TimeToLive(value)
    }
}

impl From<TimeToLive> for u32 {
    fn from(value: TimeToLive) -> Self {
        value.0
    }
}

/// The `$TTL` directive written at the top of a zone file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtlDirective {
    #[serde(default)]
    pub value: Option<TimeToLive>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl TtlDirective {
    pub fn new(value: impl Into<TimeToLive>) -> Self {
        Self {
            value: Some(value.into()),
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_is_plain_seconds() {
        let ttl: TimeToLive = serde_json::from_str("3600").unwrap();
        assert_eq!(ttl, TimeToLive::from_secs(3600));
        assert_eq!(ttl.as_secs(), 3600);
        assert_eq!(ttl.to_string(), "3600");
        assert!(serde_json::from_str::<TimeToLive>("-1").is_err());
    }

    #[test]
    fn directive_without_value_deserializes() {
        let directive: TtlDirective = serde_json::from_str(r#"{"comment": "unused"}"#).unwrap();
        assert_eq!(directive.value, None);
        assert_eq!(directive.comment.as_deref(), Some("unused"));
    }
}

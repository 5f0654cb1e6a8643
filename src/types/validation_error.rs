use std::fmt;

use serde::{Deserialize, Serialize};

/// One segment of a validation error location.
///
/// Locations are usually field names (`["body", "username"]`) but list items are
/// addressed by index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum LocSegment {
    /// A named field.
    Name(String),
    /// A position in a list.
    Index(u64),
}

impl From<&str> for LocSegment {
    fn from(name: &str) -> Self {
        LocSegment::Name(name.to_string())
    }
}

impl fmt::Display for LocSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocSegment::Name(name) => f.write_str(name),
            LocSegment::Index(idx) => write!(f, "{idx}"),
        }
    }
}

/// A field error reported by the backend alongside a 422 status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationError {
    /// Path to the offending value.
    pub loc: Vec<LocSegment>,

    /// Backend-provided description.
    pub msg: String,

    /// Machine-readable error kind, e.g. `string_too_short`.
    #[serde(rename = "type")]
    pub r#type: String,
}

impl ValidationError {
    /// Creates a validation error.
    pub fn new(loc: Vec<LocSegment>, msg: impl Into<String>, r#type: impl Into<String>) -> Self {
        Self {
            loc,
            msg: msg.into(),
            r#type: r#type.into(),
        }
    }

    /// The field the error refers to: the last named segment of `loc`.
    pub fn field(&self) -> Option<&str> {
        match self.loc.last() {
            Some(LocSegment::Name(name)) => Some(name),
            _ => None,
        }
    }
}

/// Body of a 422 response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationErrorResponse {
    /// The individual errors.
    pub detail: Vec<ValidationError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_detail() {
        let body = r#"{"detail":[
            {"loc":["body","password"],"msg":"String should have at least 6 characters","type":"string_too_short","ctx":{"min_length":6}},
            {"loc":["body",0],"msg":"bad item","type":"value_error"}
        ]}"#;
        let parsed: ValidationErrorResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.detail.len(), 2);
        assert_eq!(parsed.detail[0].field(), Some("password"));
        assert_eq!(parsed.detail[0].r#type, "string_too_short");
        assert_eq!(parsed.detail[1].loc[1], LocSegment::Index(0));
        assert_eq!(parsed.detail[1].field(), None);
    }

    #[test]
    fn empty_loc_has_no_field() {
        let err = ValidationError::new(vec![], "oops", "value_error");
        assert_eq!(err.field(), None);
    }
}

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Server-issued identifier of a queued request.
///
/// Numbers stay numbers and strings stay strings so the acknowledgment echoes
/// the id back in the exact JSON type the server sent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(u64),
    Text(String),
}

impl RequestId {
    /// Whether the id is falsy (`0` or `""`), which the server never issues
    /// for real work.
    pub fn is_empty(&self) -> bool {
        match self {
            RequestId::Number(n) => *n == 0,
            RequestId::Text(s) => s.is_empty(),
        }
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::Number(n) => write!(f, "{n}"),
            RequestId::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for RequestId {
    fn from(value: u64) -> Self {
        RequestId::Number(value)
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        RequestId::Text(value.to_string())
    }
}

/// One unit of work: the values to type into the form for a single pass.
#[derive(Debug, Clone, PartialEq)]
pub struct FillRequest {
    pub id: RequestId,
    pub fields: BTreeMap<String, String>,
    pub declaration: bool,
}

/// Wire shape of `GET /api/next-request/`.
#[derive(Debug, Deserialize)]
struct NextRequestBody {
    id: Option<RequestId>,
    #[serde(default)]
    grievance_data: Map<String, Value>,
    #[serde(default)]
    declaration: Option<bool>,
}

/// Key under which the declaration checkbox travels.
pub const DECLARATION_KEY: &str = "declaration";

impl FillRequest {
    pub fn new(id: impl Into<RequestId>) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
            declaration: false,
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn with_declaration(mut self, declaration: bool) -> Self {
        self.declaration = declaration;
        self
    }

    /// Decode a poll response body.
    ///
    /// Returns `Ok(None)` when the body carries no id (or an empty one).
    pub fn from_json(body: &str) -> Result<Option<Self>> {
        let body: NextRequestBody =
            serde_json::from_str(body).map_err(|e| Error::PayloadError(e.to_string()))?;
        Ok(Self::from_body(body))
    }

    pub fn from_value(value: Value) -> Result<Option<Self>> {
        let body: NextRequestBody =
            serde_json::from_value(value).map_err(|e| Error::PayloadError(e.to_string()))?;
        Ok(Self::from_body(body))
    }

    fn from_body(body: NextRequestBody) -> Option<Self> {
        let id = body.id.filter(|id| !id.is_empty())?;

        let mut nested_declaration = None;
        let mut fields = BTreeMap::new();
        for (name, value) in body.grievance_data {
            if name == DECLARATION_KEY {
                nested_declaration = value.as_bool();
                continue;
            }
            let text = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                _ => continue,
            };
            if !text.is_empty() {
                fields.insert(name, text);
            }
        }

        Some(Self {
            id,
            fields,
            declaration: body.declaration.or(nested_declaration).unwrap_or(false),
        })
    }

    /// Value requested for `field`, if any.
    pub fn value(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }
}

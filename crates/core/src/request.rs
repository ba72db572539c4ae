use std::collections::BTreeMap;

use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::Method;

/// Inbound request as seen by view behaviors.
///
/// This is the accessor contract the hosting framework fills in: method name,
/// parsed JSON body (if any), query-string pairs and headers. Header names are
/// stored lowercase.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    method: Method,
    json: Option<JsonValue>,
    query: BTreeMap<String, String>,
    headers: BTreeMap<String, String>,
}

impl Request {
    pub fn new(method: impl Into<Method>) -> Self {
        Self {
            method: method.into(),
            json: None,
            query: BTreeMap::new(),
            headers: BTreeMap::new(),
        }
    }

    pub fn with_json(mut self, body: JsonValue) -> Self {
        self.json = Some(body);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Parsed JSON body; `None` when the request carried no payload.
    pub fn json(&self) -> Option<&JsonValue> {
        self.json.as_ref()
    }

    pub fn query(&self) -> &BTreeMap<String, String> {
        &self.query
    }

    /// Query-string pairs as a JSON object of strings (input for filter schemas).
    pub fn query_json(&self) -> JsonValue {
        let map: JsonMap<String, JsonValue> = self
            .query
            .iter()
            .map(|(k, v)| (k.clone(), JsonValue::String(v.clone())))
            .collect();
        JsonValue::Object(map)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

use super::http::HttpRequest;
use crate::Result;
use bytes::Bytes;
use serde_json::{Map, Value};
use tracing::debug;

/// Where a parameter set ends up in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterType {
    HttpHeader,
    UrlComponents,
    JsonBody,
}

/// A typed group of request parameters.
///
/// Header and query values must be JSON strings; anything else is skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    kind: ParameterType,
    values: Map<String, Value>,
}

impl Parameters {
    pub fn new(kind: ParameterType, values: Map<String, Value>) -> Self {
        Self { kind, values }
    }

    pub fn headers<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::from_pairs(ParameterType::HttpHeader, pairs)
    }

    pub fn query<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::from_pairs(ParameterType::UrlComponents, pairs)
    }

    pub fn json_body(values: Map<String, Value>) -> Self {
        Self::new(ParameterType::JsonBody, values)
    }

    fn from_pairs<K, V>(kind: ParameterType, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let values = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), Value::String(v.into())))
            .collect();
        Self { kind, values }
    }

    pub fn kind(&self) -> ParameterType {
        self.kind
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }
}

/// Apply every parameter group to `request` in order.
///
/// JSON bodies are merged key by key (later groups win) and dropped for
/// methods that do not allow a body.
pub(crate) fn apply_all(params: &[Parameters], request: &mut HttpRequest) -> Result<()> {
    let mut body: Option<Map<String, Value>> = None;

    for group in params {
        match group.kind {
            ParameterType::HttpHeader => {
                for (name, value) in &group.values {
                    match value.as_str() {
                        Some(v) => request.headers.push((name.clone(), v.to_string())),
                        None => debug!(header = name.as_str(), "skipping non-string header value"),
                    }
                }
            }
            ParameterType::UrlComponents => {
                let items: Vec<(&str, &str)> = group
                    .values
                    .iter()
                    .filter_map(|(name, value)| match value.as_str() {
                        Some(v) => Some((name.as_str(), v)),
                        None => {
                            debug!(query = name.as_str(), "skipping non-string query value");
                            None
                        }
                    })
                    .collect();
                // An empty serializer would still leave a dangling '?'.
                if !items.is_empty() {
                    request.url.query_pairs_mut().extend_pairs(items);
                }
            }
            ParameterType::JsonBody => {
                let target = body.get_or_insert_with(Map::new);
                for (k, v) in &group.values {
                    target.insert(k.clone(), v.clone());
                }
            }
        }
    }

    if let Some(body) = body {
        if !request.method.allows_body() {
            debug!(method = request.method.as_str(), "json body ignored for method without body");
            return Ok(());
        }
        let encoded = serde_json::to_vec(&Value::Object(body))?;
        request
            .headers
            .push(("content-type".to_string(), "application/json".to_string()));
        request.body = Some(Bytes::from(encoded));
    }
    Ok(())
}

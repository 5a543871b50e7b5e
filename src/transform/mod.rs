//! 响应转换层：从原始字节到类型化模型。
//!
//! # Response Transform Layer
//!
//! Turns a response body into typed models.
//!
//! ```text
//! Raw Bytes → JSON → Root Node → Shape → Entity Deserializer / Relational Mapper
//!     │         │        │          │
//!  invalid   invalid  root node  invalid
//!  response  response not found  dictionary
//!  data      data
//! ```
//!
//! Structural failures (root node not found, invalid dictionary) are offered
//! to [`Deserializable::mitigate`] once before they surface.

use crate::deserialize::{build_all, build_object, relation, Deserializable, JsonObject, Linkable, Updatable};
use crate::error::body_string;
use crate::{Error, Result};
use serde_json::Value;
use tracing::debug;

/// Shape of an unwrapped JSON value.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Object(&'a JsonObject),
    Array(&'a [Value]),
    Other(&'a Value),
}

impl<'a> Node<'a> {
    pub fn classify(value: &'a Value) -> Self {
        match value {
            Value::Object(object) => Node::Object(object),
            Value::Array(items) => Node::Array(items),
            other => Node::Other(other),
        }
    }
}

/// Parse a body. An empty or non-JSON body is [`Error::InvalidResponseData`].
pub fn parse(data: &[u8]) -> Result<Value> {
    if data.iter().all(u8::is_ascii_whitespace) {
        return Err(Error::InvalidResponseData { body: None });
    }
    serde_json::from_slice(data).map_err(|e| {
        debug!(error = %e, "response body is not JSON");
        Error::InvalidResponseData {
            body: Some(body_string(data)),
        }
    })
}

/// The value under `root`, or the whole payload when there is no root node.
pub fn root_node<'a>(json: &'a Value, root: Option<&str>) -> Result<&'a Value> {
    let Some(key) = root else {
        return Ok(json);
    };
    json.as_object()
        .and_then(|object| object.get(key))
        .ok_or_else(|| Error::RootNodeNotFound {
            key: key.to_string(),
            payload: json.clone(),
        })
}

/// Decodes response bodies for the service queue.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransformController;

impl TransformController {
    pub fn new() -> Self {
        Self
    }

    /// A single entity. The node must be an object.
    pub fn respond<M: Deserializable>(&self, data: &[u8], root: Option<&str>) -> Result<M> {
        let json = parse(data)?;
        self.with_mitigation::<M, _, _>(&json, root, |node| match Node::classify(node) {
            Node::Object(object) => build_object(object),
            _ => Err(Error::invalid_dictionary(Some(node))),
        })
    }

    /// A fresh collection, in payload order. A lone object counts as a
    /// one-element array.
    pub fn respond_collection<M: Deserializable>(
        &self,
        data: &[u8],
        root: Option<&str>,
    ) -> Result<Vec<M>> {
        let json = parse(data)?;
        self.with_mitigation::<M, _, _>(&json, root, |node| match Node::classify(node) {
            Node::Array(items) => build_all(items),
            Node::Object(object) => Ok(vec![build_object(object)?]),
            Node::Other(other) => Err(Error::invalid_dictionary(Some(other))),
        })
    }

    /// Update `target` in place from a single object. The mapping is replayed
    /// on a copy that replaces `target` only when every binder succeeds.
    pub fn respond_update<M: Updatable + Clone>(
        &self,
        target: &mut M,
        data: &[u8],
        root: Option<&str>,
    ) -> Result<()> {
        let json = parse(data)?;
        self.with_mitigation::<M, _, _>(&json, root, |node| match Node::classify(node) {
            Node::Object(object) => {
                let mut staged = target.clone();
                staged.update(object)?;
                *target = staged;
                Ok(())
            }
            _ => Err(Error::invalid_dictionary(Some(node))),
        })
    }

    /// Reconcile `target` with the array in the payload.
    pub fn reconcile<M: Updatable + Linkable + Clone>(
        &self,
        target: &mut Vec<M>,
        data: &[u8],
        root: Option<&str>,
    ) -> Result<()> {
        let json = parse(data)?;
        self.with_mitigation::<M, _, _>(&json, root, |node| match Node::classify(node) {
            Node::Array(items) => relation::reconcile(target, items),
            Node::Object(_) => relation::reconcile(target, std::slice::from_ref(node)),
            Node::Other(other) => Err(Error::invalid_dictionary(Some(other))),
        })
    }

    /// Unwrap and decode; on a structural error let `M` repair the payload
    /// and decode the repaired value once, without unwrapping.
    fn with_mitigation<M, T, F>(&self, json: &Value, root: Option<&str>, mut decode: F) -> Result<T>
    where
        M: Deserializable,
        F: FnMut(&Value) -> Result<T>,
    {
        let first = root_node(json, root).and_then(&mut decode);
        match first {
            Err(err) if err.is_structural() => match M::mitigate(json, &err) {
                Some(repaired) => {
                    debug!(kind = %err.kind(), "retrying decode with mitigated payload");
                    decode(&repaired)
                }
                None => Err(err),
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deserialize::{bind_required, Mapping};
    use serde_json::json;

    #[derive(Debug, Default, PartialEq)]
    struct Entry {
        uuid: String,
    }

    impl Deserializable for Entry {
        fn mapping() -> Mapping<Self> {
            Mapping::new().bind("uuid", |m: &mut Entry, f| bind_required(&mut m.uuid, f))
        }
    }

    #[derive(Debug, Default)]
    struct Wrapped {
        uuid: String,
    }

    impl Deserializable for Wrapped {
        fn mapping() -> Mapping<Self> {
            Mapping::new().bind("uuid", |m: &mut Wrapped, f| bind_required(&mut m.uuid, f))
        }

        fn mitigate(payload: &Value, error: &Error) -> Option<Value> {
            match error {
                Error::RootNodeNotFound { .. } => payload.get("data").cloned(),
                _ => None,
            }
        }
    }

    fn bytes(value: Value) -> Vec<u8> {
        value.to_string().into_bytes()
    }

    #[test]
    fn parse_distinguishes_empty_and_garbage() {
        assert!(matches!(parse(b""), Err(Error::InvalidResponseData { body: None })));
        assert!(matches!(parse(b"  \n"), Err(Error::InvalidResponseData { body: None })));
        match parse(b"<html>") {
            Err(Error::InvalidResponseData { body: Some(body) }) => assert_eq!(body, "<html>"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn root_key_unwraps_in_order() {
        let data = bytes(json!({"results": [{"uuid": "a"}, {"uuid": "b"}]}));
        let entries: Vec<Entry> = TransformController::new()
            .respond_collection(&data, Some("results"))
            .unwrap();
        let ids: Vec<_> = entries.iter().map(|e| e.uuid.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn missing_root_carries_payload() {
        let payload = json!({"items": []});
        let err = TransformController::new()
            .respond::<Entry>(&bytes(payload.clone()), Some("results"))
            .unwrap_err();
        match err {
            Error::RootNodeNotFound { key, payload: p } => {
                assert_eq!(key, "results");
                assert_eq!(p, payload);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn wrong_shape_is_invalid_dictionary() {
        let controller = TransformController::new();
        let err = controller.respond::<Entry>(&bytes(json!([{"uuid": "a"}])), None).unwrap_err();
        assert!(matches!(err, Error::InvalidDictionary { .. }));
        let err = controller
            .respond_collection::<Entry>(&bytes(json!({"results": 3})), Some("results"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidDictionary { payload } if payload == json!(3)));
    }

    #[test]
    fn single_object_is_a_collection_of_one() {
        let entries: Vec<Entry> = TransformController::new()
            .respond_collection(&bytes(json!({"uuid": "solo"})), None)
            .unwrap();
        assert_eq!(entries, vec![Entry { uuid: "solo".into() }]);
    }

    #[test]
    fn mitigation_repairs_structural_errors_once() {
        let data = bytes(json!({"data": {"uuid": "fixed"}}));
        let wrapped: Wrapped = TransformController::new().respond(&data, Some("result")).unwrap();
        assert_eq!(wrapped.uuid, "fixed");

        let data = bytes(json!({"other": {}}));
        let err = TransformController::new()
            .respond::<Wrapped>(&data, Some("result"))
            .unwrap_err();
        assert!(matches!(err, Error::RootNodeNotFound { .. }));
    }

    #[test]
    fn mitigation_is_not_offered_for_field_errors() {
        let data = bytes(json!({"result": {"id": 1}, "data": {"uuid": "x"}}));
        let err = TransformController::new()
            .respond::<Wrapped>(&data, Some("result"))
            .unwrap_err();
        assert_eq!(err.missing_key(), Some("uuid"));
    }
}

use super::{Deserializable, JsonObject};
use crate::{Error, Result};
use serde_json::Value;

/// Build `M` from a raw value, which must be a JSON object.
pub fn build<M: Deserializable>(raw: &Value) -> Result<M> {
    match raw.as_object() {
        Some(object) => build_object(object),
        None => Err(Error::invalid_dictionary(Some(raw))),
    }
}

pub fn try_build<M: Deserializable>(raw: &Value) -> Option<M> {
    build(raw).ok()
}

pub fn build_object<M: Deserializable>(raw: &JsonObject) -> Result<M> {
    let mut model = M::default();
    update(&mut model, raw)?;
    Ok(model)
}

/// Run the mapping of `M` over an existing value.
pub fn update<M: Deserializable>(target: &mut M, raw: &JsonObject) -> Result<()> {
    M::mapping().apply(target, raw)
}

/// Build every element; the first failure wins.
pub fn build_all<M: Deserializable>(raw: &[Value]) -> Result<Vec<M>> {
    let mapping = M::mapping();
    raw.iter()
        .map(|value| {
            let object = value
                .as_object()
                .ok_or_else(|| Error::invalid_dictionary(Some(value)))?;
            let mut model = M::default();
            mapping.apply(&mut model, object)?;
            Ok(model)
        })
        .collect()
}

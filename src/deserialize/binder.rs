//! Field binders: typed conversion of one JSON value into one model field.
//!
//! `*_optional` binders never fail. An absent key leaves the field as it is;
//! a present value of the wrong type sets it to `None`. The required binders
//! fail with [`Error::EmptyKey`] for an empty key name and with
//! [`Error::ValueMissing`] for an absent or mistyped value, unless a more
//! specific error applies (dates, raw-representable values, nested objects).

use super::{entity, relation, DateFormat, Deserializable, Field, Linkable, RawRepresentable, Updatable};
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashSet;
use std::hash::Hash;
use time::OffsetDateTime;

fn convert<T: DeserializeOwned>(value: &Value) -> Option<T> {
    T::deserialize(value).ok()
}

pub fn bind_optional<T: DeserializeOwned>(target: &mut Option<T>, field: Field<'_>) -> Result<()> {
    if let Some(value) = field.value {
        *target = convert(value);
    }
    Ok(())
}

pub fn bind_required<T: DeserializeOwned>(target: &mut T, field: Field<'_>) -> Result<()> {
    let value = field.required()?;
    *target = convert(value).ok_or_else(|| Error::value_missing(field.key))?;
    Ok(())
}

pub fn bind_date_optional(
    target: &mut Option<OffsetDateTime>,
    field: Field<'_>,
    format: &DateFormat,
) -> Result<()> {
    if let Some(value) = field.value {
        *target = format.parse_value(field.key, value).ok();
    }
    Ok(())
}

/// Numbers are epoch seconds; strings must match `format` or the binder
/// fails with [`Error::InvalidDate`].
pub fn bind_date(target: &mut OffsetDateTime, field: Field<'_>, format: &DateFormat) -> Result<()> {
    let value = field.required()?;
    *target = format.parse_value(field.key, value)?;
    Ok(())
}

pub fn bind_raw_optional<R: RawRepresentable>(target: &mut Option<R>, field: Field<'_>) -> Result<()> {
    if let Some(value) = field.value {
        *target = convert::<R::Raw>(value).and_then(R::from_raw);
    }
    Ok(())
}

pub fn bind_raw<R: RawRepresentable>(target: &mut R, field: Field<'_>) -> Result<()> {
    let value = field.required()?;
    *target = convert::<R::Raw>(value)
        .and_then(R::from_raw)
        .ok_or_else(|| Error::RawRepresentableFail {
            key: field.key.to_string(),
            raw: value.clone(),
        })?;
    Ok(())
}

/// Build a nested entity afresh; any failure leaves `None`.
pub fn bind_entity_optional<M: Deserializable>(target: &mut Option<M>, field: Field<'_>) -> Result<()> {
    if let Some(value) = field.value {
        *target = entity::try_build(value);
    }
    Ok(())
}

/// Update a nested entity in place.
pub fn bind_entity<M: Updatable>(target: &mut M, field: Field<'_>) -> Result<()> {
    let value = field.required()?;
    let raw = value
        .as_object()
        .ok_or_else(|| Error::invalid_dictionary(Some(value)))?;
    target.update(raw)
}

/// Update the nested entity if there is one, build it otherwise.
pub fn bind_entity_or_insert<M: Updatable>(target: &mut Option<M>, field: Field<'_>) -> Result<()> {
    let Some(value) = field.value else {
        return Ok(());
    };
    let raw = value
        .as_object()
        .ok_or_else(|| Error::invalid_dictionary(Some(value)))?;
    match target {
        Some(existing) => existing.update(raw),
        None => {
            *target = Some(entity::build_object(raw)?);
            Ok(())
        }
    }
}

pub fn bind_entities_optional<M: Deserializable>(
    target: &mut Option<Vec<M>>,
    field: Field<'_>,
) -> Result<()> {
    if let Some(value) = field.value {
        *target = value
            .as_array()
            .and_then(|items| entity::build_all(items).ok());
    }
    Ok(())
}

/// Reconcile an ordered collection with the array under the key.
pub fn bind_linked<M: Updatable + Linkable + Clone>(target: &mut Vec<M>, field: Field<'_>) -> Result<()> {
    let value = field.required()?;
    let items = value.as_array().ok_or_else(|| Error::EmptyCollection {
        key: field.key.to_string(),
    })?;
    relation::reconcile(target, items)
}

/// Reconcile when present; build the collection if there is none yet.
pub fn bind_linked_optional<M: Updatable + Linkable + Clone>(
    target: &mut Option<Vec<M>>,
    field: Field<'_>,
) -> Result<()> {
    let Some(value) = field.value else {
        return Ok(());
    };
    let Some(items) = value.as_array() else {
        *target = None;
        return Ok(());
    };
    match target {
        Some(existing) => relation::reconcile(existing, items),
        None => {
            *target = Some(entity::build_all(items)?);
            Ok(())
        }
    }
}

pub fn bind_linked_set<M>(target: &mut HashSet<M>, field: Field<'_>) -> Result<()>
where
    M: Updatable + Linkable + Clone + Eq + Hash,
{
    let value = field.required()?;
    let items = value.as_array().ok_or_else(|| Error::EmptyCollection {
        key: field.key.to_string(),
    })?;
    relation::reconcile_set(target, items)
}

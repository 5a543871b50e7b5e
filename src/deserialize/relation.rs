//! Reconciliation of linked collections against incoming JSON arrays.
//!
//! Existing entities are matched to raw objects by their [`Link`]. A single
//! match updates the entity in place, no match removes it, and raw objects
//! nobody claimed become new entities appended at the end. More than one
//! match fails with [`Error::LinkNotUnique`].
//!
//! Updates are applied to copies and committed together, so a failed
//! reconciliation leaves the collection as it was.

use super::{entity, JsonObject, Link, Linkable, Updatable};
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;
use tracing::debug;

enum Plan {
    Remove,
    Update(usize),
}

fn links_to<V>(raw: &JsonObject, link: &Link<V>) -> bool
where
    V: PartialEq + DeserializeOwned,
{
    raw.get(link.key)
        .and_then(|value| V::deserialize(value).ok())
        .map_or(false, |value| value == link.value)
}

fn not_unique<V: Debug>(link: &Link<V>, matches: usize) -> Error {
    Error::LinkNotUnique {
        key: link.key.to_string(),
        value: format!("{:?}", link.value),
        matches,
    }
}

/// Match each existing entity against the unconsumed pool.
fn plan<M: Linkable>(
    existing: &[M],
    mut candidates: impl FnMut(&Link<M::LinkValue>, &[bool]) -> Vec<usize>,
    pool_len: usize,
) -> Result<(Vec<Plan>, Vec<bool>)> {
    let mut consumed = vec![false; pool_len];
    let mut plans = Vec::with_capacity(existing.len());
    for model in existing {
        let link = model.link();
        let found = candidates(&link, &consumed);
        match found.as_slice() {
            [] => plans.push(Plan::Remove),
            [index] => {
                consumed[*index] = true;
                plans.push(Plan::Update(*index));
            }
            many => return Err(not_unique(&link, many.len())),
        }
    }
    Ok((plans, consumed))
}

/// Reconcile an ordered collection with `incoming`. Every element of
/// `incoming` must be a JSON object.
pub fn reconcile<M>(existing: &mut Vec<M>, incoming: &[Value]) -> Result<()>
where
    M: Updatable + Linkable + Clone,
{
    let objects = incoming
        .iter()
        .map(|value| {
            value
                .as_object()
                .ok_or_else(|| Error::invalid_dictionary(Some(value)))
        })
        .collect::<Result<Vec<_>>>()?;

    if existing.is_empty() {
        existing.extend(entity::build_all::<M>(incoming)?);
        return Ok(());
    }

    let (plans, consumed) = plan(
        existing,
        |link, consumed| {
            objects
                .iter()
                .enumerate()
                .filter(|(i, raw)| !consumed[*i] && links_to(raw, link))
                .map(|(i, _)| i)
                .collect()
        },
        objects.len(),
    )?;

    let mut fresh = Vec::new();
    for (raw, _) in objects.iter().zip(&consumed).filter(|(_, used)| !**used) {
        fresh.push(entity::build_object::<M>(raw)?);
    }

    let mut kept = Vec::with_capacity(existing.len());
    for (model, plan) in existing.iter().zip(&plans) {
        if let Plan::Update(index) = plan {
            let mut staged = model.clone();
            staged.update(objects[*index])?;
            kept.push(staged);
        }
    }

    debug!(
        updated = kept.len(),
        removed = existing.len() - kept.len(),
        inserted = fresh.len(),
        "reconciled linked collection"
    );
    kept.extend(fresh);
    *existing = kept;
    Ok(())
}

/// Unordered variant of [`reconcile`].
pub fn reconcile_set<M>(existing: &mut HashSet<M>, incoming: &[Value]) -> Result<()>
where
    M: Updatable + Linkable + Clone + Eq + Hash,
{
    let mut models: Vec<M> = existing.drain().collect();
    let result = reconcile(&mut models, incoming);
    existing.extend(models);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deserialize::{bind_optional, bind_required, Deserializable, Mapping};
    use serde_json::json;

    #[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
    struct Item {
        id: u32,
        label: String,
        note: Option<String>,
    }

    impl Deserializable for Item {
        fn mapping() -> Mapping<Self> {
            Mapping::new()
                .bind("id", |m: &mut Item, f| bind_required(&mut m.id, f))
                .bind("label", |m: &mut Item, f| bind_required(&mut m.label, f))
                .bind("note", |m: &mut Item, f| bind_optional(&mut m.note, f))
        }
    }

    impl Updatable for Item {}

    impl Linkable for Item {
        type LinkValue = u32;

        fn link(&self) -> Link<u32> {
            Link::new("id", self.id)
        }
    }

    fn item(id: u32, label: &str) -> Item {
        Item {
            id,
            label: label.to_string(),
            note: Some(format!("kept {id}")),
        }
    }

    fn raw(id: u32, label: &str) -> Value {
        json!({"id": id, "label": label})
    }

    #[test]
    fn updates_removes_and_appends() {
        let mut items = vec![item(1, "one"), item(2, "two"), item(3, "three")];
        reconcile(&mut items, &[raw(2, "TWO"), raw(3, "THREE"), raw(4, "FOUR")]).unwrap();

        let ids: Vec<_> = items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![2, 3, 4]);
        assert_eq!(items[0].label, "TWO");
        assert_eq!(items[0].note.as_deref(), Some("kept 2"));
        assert_eq!(items[2].note, None);
    }

    #[test]
    fn ambiguous_link_leaves_collection_untouched() {
        let mut items = vec![item(1, "one"), item(2, "two")];
        let before = items.clone();
        let err = reconcile(&mut items, &[raw(2, "a"), raw(2, "b"), raw(5, "c")]).unwrap_err();

        assert!(matches!(err, Error::LinkNotUnique { ref key, matches: 2, .. } if key == "id"));
        assert_eq!(items, before);
    }

    #[test]
    fn empty_collection_builds_everything() {
        let mut items: Vec<Item> = Vec::new();
        reconcile(&mut items, &[raw(7, "a"), raw(7, "b")]).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn non_object_elements_are_rejected() {
        let mut items = vec![item(1, "one")];
        let err = reconcile(&mut items, &[raw(1, "x"), json!(1)]).unwrap_err();
        assert!(matches!(err, Error::InvalidDictionary { .. }));
        assert_eq!(items[0].label, "one");
    }

    #[test]
    fn mistyped_link_values_do_not_match() {
        let mut items = vec![item(1, "one")];
        reconcile(&mut items, &[json!({"id": "1", "label": "str"})]).unwrap_err();
        assert_eq!(items, vec![item(1, "one")]);
    }

    #[test]
    fn sets_reconcile_by_equality() {
        let mut items: HashSet<Item> = [item(1, "one"), item(2, "two"), item(3, "three")].into();
        reconcile_set(&mut items, &[raw(2, "two"), raw(3, "3"), raw(4, "four")]).unwrap();

        let mut ids: Vec<_> = items.iter().map(|i| i.id).collect();
        ids.sort();
        assert_eq!(ids, vec![2, 3, 4]);
        assert!(items.iter().any(|i| i.id == 3 && i.label == "3"));
    }

    #[test]
    fn failed_update_leaves_collection_untouched() {
        let mut items = vec![item(1, "one"), item(2, "two")];
        let before = items.clone();
        let err = reconcile(&mut items, &[raw(1, "ONE"), json!({"id": 2})]).unwrap_err();

        assert!(matches!(err, Error::ValueMissing { ref key } if key == "label"));
        assert_eq!(items, before);
    }

    #[test]
    fn failed_update_in_a_set_keeps_every_member() {
        let mut items: HashSet<Item> = [item(1, "one"), item(2, "two")].into();
        let before = items.clone();
        reconcile_set(&mut items, &[raw(1, "ONE"), json!({"id": 2, "label": 2})]).unwrap_err();
        assert_eq!(items, before);
    }
}

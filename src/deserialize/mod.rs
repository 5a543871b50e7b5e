//! 反序列化映射 - 声明式字段绑定与关系协调
//!
//! Declarative JSON-to-model mapping.
//!
//! A model implements [`Deserializable`] by returning a [`Mapping`]: one
//! binder per JSON key. Binders come from [`binder`] and decide whether a key
//! is optional (best effort, never fails) or required (fails with
//! [`Error::ValueMissing`](crate::Error::ValueMissing) and friends). Keys the
//! mapping does not name are ignored.
//!
//! ```
//! use rivet::deserialize::{bind_optional, bind_required, Deserializable, Mapping};
//!
//! #[derive(Debug, Default)]
//! struct Game {
//!     uuid: String,
//!     price: Option<f64>,
//! }
//!
//! impl Deserializable for Game {
//!     fn mapping() -> Mapping<Self> {
//!         Mapping::new()
//!             .bind("uuid", |m: &mut Game, f| bind_required(&mut m.uuid, f))
//!             .bind("price", |m: &mut Game, f| bind_optional(&mut m.price, f))
//!     }
//! }
//!
//! let game: Game = rivet::deserialize::build(&serde_json::json!({"uuid": "a", "price": "free"})).unwrap();
//! assert_eq!(game.uuid, "a");
//! assert_eq!(game.price, None);
//! ```
//!
//! Collections of [`Linkable`] models are reconciled against incoming arrays
//! by [`relation::reconcile`] instead of being replaced.

pub mod binder;
mod date;
mod entity;
mod parse;
pub mod relation;

pub use binder::{
    bind_date, bind_date_optional, bind_entities_optional, bind_entity, bind_entity_optional,
    bind_entity_or_insert, bind_linked, bind_linked_optional, bind_linked_set, bind_optional,
    bind_raw, bind_raw_optional, bind_required,
};
pub use date::DateFormat;
pub use entity::{build, build_all, build_object, try_build, update};
pub use parse::{parse, parse_date, parse_entities, parse_entity};

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

pub type JsonObject = Map<String, Value>;

/// One key of a raw object, as handed to a binder.
#[derive(Debug, Clone, Copy)]
pub struct Field<'a> {
    pub key: &'a str,
    pub value: Option<&'a Value>,
}

impl<'a> Field<'a> {
    pub fn of(raw: &'a JsonObject, key: &'a str) -> Self {
        Self {
            key,
            value: raw.get(key),
        }
    }

    pub fn new(key: &'a str, value: Option<&'a Value>) -> Self {
        Self { key, value }
    }

    pub fn is_absent(&self) -> bool {
        self.value.is_none()
    }

    pub(crate) fn require_key(&self) -> Result<()> {
        if self.key.is_empty() {
            Err(Error::EmptyKey)
        } else {
            Ok(())
        }
    }

    /// Present value or [`Error::ValueMissing`].
    pub(crate) fn required(&self) -> Result<&'a Value> {
        self.require_key()?;
        self.value.ok_or_else(|| Error::value_missing(self.key))
    }
}

type BoxedBinder<M> = Box<dyn Fn(&mut M, Field<'_>) -> Result<()> + Send + Sync>;

/// Ordered table of `(key, binder)` pairs describing how a model is filled.
pub struct Mapping<M> {
    bindings: Vec<(&'static str, BoxedBinder<M>)>,
}

impl<M> Mapping<M> {
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    pub fn bind<F>(mut self, key: &'static str, binder: F) -> Self
    where
        F: Fn(&mut M, Field<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.bindings.push((key, Box::new(binder)));
        self
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.bindings.iter().map(|(k, _)| *k)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Run every binder against `raw`, stopping at the first failure.
    pub fn apply(&self, model: &mut M, raw: &JsonObject) -> Result<()> {
        for (key, binder) in &self.bindings {
            binder(model, Field::of(raw, key))?;
        }
        Ok(())
    }
}

impl<M> Default for Mapping<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> fmt::Debug for Mapping<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.keys()).finish()
    }
}

/// A model that can be built from a JSON object.
pub trait Deserializable: Default + Sized {
    fn mapping() -> Mapping<Self>;

    /// Repair hook for structural decode failures.
    ///
    /// Receives the whole payload and the error. A returned value is decoded
    /// once more, without root-node unwrapping; `None` lets the error through.
    fn mitigate(_payload: &Value, _error: &Error) -> Option<Value> {
        None
    }

    fn from_json(raw: &Value) -> Result<Self> {
        build(raw)
    }
}

/// A model that can be refreshed in place, keeping its identity.
pub trait Updatable: Deserializable {
    /// Replays the mapping over the existing value.
    fn update(&mut self, raw: &JsonObject) -> Result<()> {
        update(self, raw)
    }
}

/// Link key of an entity: the JSON key and the value it must carry.
#[derive(Debug, Clone, PartialEq)]
pub struct Link<V> {
    pub key: &'static str,
    pub value: V,
}

impl<V> Link<V> {
    pub fn new(key: &'static str, value: V) -> Self {
        Self { key, value }
    }
}

/// A model that can be matched against raw objects by a link key.
pub trait Linkable {
    type LinkValue: PartialEq + DeserializeOwned + fmt::Debug;

    fn link(&self) -> Link<Self::LinkValue>;
}

/// String- or integer-backed enumerations.
pub trait RawRepresentable: Sized {
    type Raw: DeserializeOwned + Serialize;

    fn from_raw(raw: Self::Raw) -> Option<Self>;

    fn raw_value(&self) -> Self::Raw;
}

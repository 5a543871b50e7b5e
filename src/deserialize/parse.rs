//! Pull-style helpers for hand-written constructors.

use super::{entity, DateFormat, Deserializable, JsonObject};
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use time::OffsetDateTime;
use tracing::debug;

fn named<'a>(name: &str, from: &'a JsonObject) -> Result<&'a serde_json::Value> {
    if name.is_empty() {
        return Err(Error::EmptyKey);
    }
    from.get(name).ok_or_else(|| Error::value_missing(name))
}

pub fn parse<T: DeserializeOwned>(name: &str, from: &JsonObject) -> Result<T> {
    let value = named(name, from)?;
    T::deserialize(value).map_err(|_| Error::value_missing(name))
}

pub fn parse_date(name: &str, from: &JsonObject, format: &DateFormat) -> Result<OffsetDateTime> {
    format.parse_value(name, named(name, from)?)
}

pub fn parse_entity<M: Deserializable>(name: &str, from: &JsonObject) -> Result<M> {
    if name.is_empty() {
        return Err(Error::EmptyKey);
    }
    let object = from
        .get(name)
        .and_then(|value| value.as_object())
        .ok_or_else(|| Error::EmptyCollection {
            key: name.to_string(),
        })?;
    entity::build_object(object)
}

/// Elements that fail to build are skipped.
pub fn parse_entities<M: Deserializable>(name: &str, from: &JsonObject) -> Result<Vec<M>> {
    if name.is_empty() {
        return Err(Error::EmptyKey);
    }
    let items = from
        .get(name)
        .and_then(|value| value.as_array())
        .ok_or_else(|| Error::EmptyCollection {
            key: name.to_string(),
        })?;
    Ok(items
        .iter()
        .filter_map(|value| match entity::build(value) {
            Ok(model) => Some(model),
            Err(e) => {
                debug!(key = name, error = %e, "skipping element");
                None
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deserialize::{bind_required, Mapping};
    use serde_json::{json, Value};

    #[derive(Debug, Default)]
    struct Genre {
        title: String,
    }

    impl Deserializable for Genre {
        fn mapping() -> Mapping<Self> {
            Mapping::new().bind("title", |m: &mut Genre, f| bind_required(&mut m.title, f))
        }
    }

    fn object(value: Value) -> JsonObject {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn parses_typed_values() {
        let raw = object(json!({"count": 3, "name": "x"}));
        assert_eq!(parse::<i64>("count", &raw).unwrap(), 3);
        assert!(matches!(parse::<i64>("name", &raw), Err(Error::ValueMissing { .. })));
        assert!(matches!(parse::<i64>("gone", &raw), Err(Error::ValueMissing { .. })));
        assert!(matches!(parse::<i64>("", &raw), Err(Error::EmptyKey)));
    }

    #[test]
    fn parses_dates() {
        let raw = object(json!({"at": 60, "on": "2001-02-03"}));
        let at = parse_date("at", &raw, &DateFormat::EpochSeconds).unwrap();
        assert_eq!(at.unix_timestamp(), 60);
        let format = DateFormat::custom("[year]-[month]-[day]").unwrap();
        let on = parse_date("on", &raw, &format).unwrap();
        assert_eq!((on.year(), on.day()), (2001, 3));
    }

    #[test]
    fn nested_entities_need_the_right_shape() {
        let raw = object(json!({
            "genre": {"title": "rpg"},
            "genres": [{"title": "a"}, {"nope": 1}, {"title": "b"}],
            "flat": 1
        }));
        let genre: Genre = parse_entity("genre", &raw).unwrap();
        assert_eq!(genre.title, "rpg");
        let genres: Vec<Genre> = parse_entities("genres", &raw).unwrap();
        assert_eq!(genres.len(), 2);

        assert!(matches!(parse_entity::<Genre>("flat", &raw), Err(Error::EmptyCollection { .. })));
        assert!(matches!(parse_entities::<Genre>("genre", &raw), Err(Error::EmptyCollection { .. })));
        assert!(matches!(parse_entities::<Genre>("", &raw), Err(Error::EmptyKey)));
    }
}

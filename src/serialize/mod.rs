//! Model-to-JSON conversion, the reverse of [`crate::deserialize`].
//!
//! Absent optionals are omitted rather than written as `null`. Values that
//! cannot be represented are skipped with a warning.

use crate::deserialize::{DateFormat, JsonObject, RawRepresentable};
use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;
use tracing::warn;

pub trait Serializable {
    fn to_json(&self) -> JsonObject;

    fn to_value(&self) -> Value {
        Value::Object(self.to_json())
    }
}

pub fn serialize_field<T: Serialize + ?Sized>(json: &mut JsonObject, key: &str, value: &T) {
    match serde_json::to_value(value) {
        Ok(Value::Null) => {}
        Ok(value) => {
            json.insert(key.to_string(), value);
        }
        Err(e) => warn!(key, error = %e, "field not serializable"),
    }
}

pub fn serialize_date(json: &mut JsonObject, key: &str, date: &OffsetDateTime, format: &DateFormat) {
    match format.format(date) {
        Ok(value) => {
            json.insert(key.to_string(), value);
        }
        Err(e) => warn!(key, error = %e, "date not serializable"),
    }
}

pub fn serialize_raw<R: RawRepresentable>(json: &mut JsonObject, key: &str, value: &R) {
    serialize_field(json, key, &value.raw_value());
}

pub fn serialize_entity<S: Serializable + ?Sized>(json: &mut JsonObject, key: &str, entity: &S) {
    json.insert(key.to_string(), entity.to_value());
}

pub fn serialize_entities<'a, S, I>(json: &mut JsonObject, key: &str, entities: I)
where
    S: Serializable + 'a,
    I: IntoIterator<Item = &'a S>,
{
    let items = entities.into_iter().map(Serializable::to_value).collect();
    json.insert(key.to_string(), Value::Array(items));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    #[derive(Clone, Copy)]
    enum Rating {
        Mature,
    }

    impl RawRepresentable for Rating {
        type Raw = String;

        fn from_raw(raw: String) -> Option<Self> {
            (raw == "M").then_some(Rating::Mature)
        }

        fn raw_value(&self) -> String {
            "M".to_string()
        }
    }

    struct Track {
        title: String,
        seconds: Option<u32>,
    }

    impl Serializable for Track {
        fn to_json(&self) -> JsonObject {
            let mut json = JsonObject::new();
            serialize_field(&mut json, "title", &self.title);
            serialize_field(&mut json, "seconds", &self.seconds);
            json
        }
    }

    struct Album {
        name: String,
        released: OffsetDateTime,
        rating: Rating,
        lead: Track,
        tracks: Vec<Track>,
    }

    impl Serializable for Album {
        fn to_json(&self) -> JsonObject {
            let mut json = JsonObject::new();
            serialize_field(&mut json, "name", &self.name);
            serialize_date(&mut json, "released", &self.released, &DateFormat::EpochSeconds);
            serialize_raw(&mut json, "rating", &self.rating);
            serialize_entity(&mut json, "lead", &self.lead);
            serialize_entities(&mut json, "tracks", &self.tracks);
            json
        }
    }

    #[test]
    fn omits_absent_optionals() {
        let track = Track {
            title: "Intro".into(),
            seconds: None,
        };
        assert_eq!(track.to_value(), json!({"title": "Intro"}));
    }

    #[test]
    fn nests_entities_dates_and_raw_values() {
        let album = Album {
            name: "Origins".into(),
            released: datetime!(2017-07-14 02:40:00 UTC),
            rating: Rating::Mature,
            lead: Track {
                title: "One".into(),
                seconds: Some(200),
            },
            tracks: vec![
                Track {
                    title: "Two".into(),
                    seconds: Some(180),
                },
                Track {
                    title: "Three".into(),
                    seconds: None,
                },
            ],
        };
        assert_eq!(
            album.to_value(),
            json!({
                "name": "Origins",
                "released": 1_500_000_000,
                "rating": "M",
                "lead": {"title": "One", "seconds": 200},
                "tracks": [{"title": "Two", "seconds": 180}, {"title": "Three"}]
            })
        );
    }

    #[test]
    fn dates_use_the_requested_format() {
        let mut json = JsonObject::new();
        let format = DateFormat::custom("[day]/[month]/[year]").unwrap();
        serialize_date(&mut json, "on", &datetime!(1999-12-31 23:59 UTC), &format);
        assert_eq!(json["on"], json!("31/12/1999"));
    }
}

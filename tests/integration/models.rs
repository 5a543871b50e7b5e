//! Models shared by the integration tests

use rivet::prelude::*;
use serde_json::Value;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Platform {
    #[default]
    Unknown,
    Console,
    Pc,
}

impl RawRepresentable for Platform {
    type Raw = String;

    fn from_raw(raw: String) -> Option<Self> {
        match raw.as_str() {
            "console" => Some(Platform::Console),
            "pc" => Some(Platform::Pc),
            _ => None,
        }
    }

    fn raw_value(&self) -> String {
        match self {
            Platform::Unknown => "unknown",
            Platform::Console => "console",
            Platform::Pc => "pc",
        }
        .to_string()
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Studio {
    pub id: i64,
    pub name: String,
    pub founded: Option<OffsetDateTime>,
}

impl Deserializable for Studio {
    fn mapping() -> Mapping<Self> {
        Mapping::new()
            .bind("id", |m: &mut Studio, f| bind_required(&mut m.id, f))
            .bind("name", |m: &mut Studio, f| bind_required(&mut m.name, f))
            .bind("founded", |m: &mut Studio, f| {
                bind_date_optional(&mut m.founded, f, &DateFormat::Rfc3339)
            })
    }
}

impl Updatable for Studio {}

impl Linkable for Studio {
    type LinkValue = i64;

    fn link(&self) -> Link<i64> {
        Link::new("id", self.id)
    }
}

impl Serializable for Studio {
    fn to_json(&self) -> JsonObject {
        let mut json = JsonObject::new();
        serialize_field(&mut json, "id", &self.id);
        serialize_field(&mut json, "name", &self.name);
        if let Some(founded) = &self.founded {
            serialize_date(&mut json, "founded", founded, &DateFormat::Rfc3339);
        }
        json
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Game {
    pub uuid: String,
    pub title: Option<String>,
    pub price: Option<f64>,
    pub platform: Option<Platform>,
    pub studio: Option<Studio>,
    pub studios: Vec<Studio>,
}

impl Deserializable for Game {
    fn mapping() -> Mapping<Self> {
        Mapping::new()
            .bind("uuid", |m: &mut Game, f| bind_required(&mut m.uuid, f))
            .bind("title", |m: &mut Game, f| bind_optional(&mut m.title, f))
            .bind("price", |m: &mut Game, f| bind_optional(&mut m.price, f))
            .bind("platform", |m: &mut Game, f| bind_raw_optional(&mut m.platform, f))
            .bind("studio", |m: &mut Game, f| bind_entity_or_insert(&mut m.studio, f))
            .bind("studios", |m: &mut Game, f| {
                if f.is_absent() {
                    return Ok(());
                }
                bind_linked(&mut m.studios, f)
            })
    }
}

impl Updatable for Game {}

impl Linkable for Game {
    type LinkValue = String;

    fn link(&self) -> Link<String> {
        Link::new("uuid", self.uuid.clone())
    }
}

impl Serializable for Game {
    fn to_json(&self) -> JsonObject {
        let mut json = JsonObject::new();
        serialize_field(&mut json, "uuid", &self.uuid);
        serialize_field(&mut json, "title", &self.title);
        serialize_field(&mut json, "price", &self.price);
        if let Some(platform) = &self.platform {
            serialize_raw(&mut json, "platform", platform);
        }
        if let Some(studio) = &self.studio {
            serialize_entity(&mut json, "studio", studio);
        }
        if !self.studios.is_empty() {
            serialize_entities(&mut json, "studios", &self.studios);
        }
        json
    }
}

/// Strict model: every field is required.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Product {
    pub sku: String,
    pub price: f64,
}

impl Deserializable for Product {
    fn mapping() -> Mapping<Self> {
        Mapping::new()
            .bind("sku", |m: &mut Product, f| bind_required(&mut m.sku, f))
            .bind("price", |m: &mut Product, f| bind_required(&mut m.price, f))
    }
}

impl Updatable for Product {}

/// Served both as `{"result": {...}}` and, by older backends, as `{"data": {...}}`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Legacy {
    pub uuid: String,
}

impl Deserializable for Legacy {
    fn mapping() -> Mapping<Self> {
        Mapping::new().bind("uuid", |m: &mut Legacy, f| bind_required(&mut m.uuid, f))
    }

    fn mitigate(payload: &Value, error: &Error) -> Option<Value> {
        match error {
            Error::RootNodeNotFound { .. } => payload.get("data").cloned(),
            _ => None,
        }
    }
}

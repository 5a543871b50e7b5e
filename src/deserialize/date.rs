use crate::error::ErrorContext;
use crate::{Error, Result};
use serde_json::{Number, Value};
use time::format_description::well_known::Rfc3339;
use time::format_description::OwnedFormatItem;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

/// How a date is written in JSON. Passed to every date binder call.
#[derive(Debug, Clone, Default)]
pub enum DateFormat {
    /// Seconds since the Unix epoch, fractional allowed.
    #[default]
    EpochSeconds,
    Rfc3339,
    /// A `time` format description such as `[year]-[month]-[day]`.
    Custom(OwnedFormatItem),
}

impl DateFormat {
    pub fn custom(description: &str) -> Result<Self> {
        time::format_description::parse_owned::<2>(description)
            .map(DateFormat::Custom)
            .map_err(|e| {
                Error::malformed_with_context(
                    "invalid date format description",
                    ErrorContext::new()
                        .with_details(description)
                        .with_source(e.to_string()),
                )
            })
    }

    /// Numbers are always epoch seconds; strings go through the format.
    pub(crate) fn parse_value(&self, key: &str, value: &Value) -> Result<OffsetDateTime> {
        match value {
            Value::Number(n) => n
                .as_f64()
                .and_then(from_epoch)
                .ok_or_else(|| Error::InvalidDate {
                    key: key.to_string(),
                    value: n.to_string(),
                }),
            Value::String(s) => self.parse_str(s).ok_or_else(|| Error::InvalidDate {
                key: key.to_string(),
                value: s.clone(),
            }),
            _ => Err(Error::value_missing(key)),
        }
    }

    pub fn parse_str(&self, s: &str) -> Option<OffsetDateTime> {
        match self {
            DateFormat::EpochSeconds => s.trim().parse::<f64>().ok().and_then(from_epoch),
            DateFormat::Rfc3339 => OffsetDateTime::parse(s, &Rfc3339).ok(),
            DateFormat::Custom(item) => OffsetDateTime::parse(s, item)
                .ok()
                .or_else(|| PrimitiveDateTime::parse(s, item).ok().map(|p| p.assume_utc()))
                .or_else(|| Date::parse(s, item).ok().map(|d| d.midnight().assume_utc())),
        }
    }

    pub fn format(&self, date: &OffsetDateTime) -> Result<Value> {
        let formatted = match self {
            DateFormat::EpochSeconds => return Ok(epoch_value(date)),
            DateFormat::Rfc3339 => date.format(&Rfc3339),
            DateFormat::Custom(item) => date.format(item),
        };
        formatted.map(Value::String).map_err(|e| {
            Error::malformed_with_context(
                "date formatting failed",
                ErrorContext::new().with_source(e.to_string()),
            )
        })
    }
}

pub(crate) fn from_epoch(seconds: f64) -> Option<OffsetDateTime> {
    if !seconds.is_finite() {
        return None;
    }
    let nanos = (seconds * 1_000_000_000.0).round() as i128;
    OffsetDateTime::from_unix_timestamp_nanos(nanos).ok()
}

fn epoch_value(date: &OffsetDateTime) -> Value {
    if date.nanosecond() == 0 {
        return Value::from(date.unix_timestamp());
    }
    let seconds = date.unix_timestamp_nanos() as f64 / 1_000_000_000.0;
    Number::from_f64(seconds).map_or(Value::Null, Value::Number)
}

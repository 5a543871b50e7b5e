use crate::error_kind::ErrorKind;
use crate::transport::TransportError;
use serde_json::Value;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "results[0].uuid")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected type, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "service_queue", "mock_session")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for rivet.
///
/// Every layer (request construction, transport, field binding, relational
/// mapping, response transformation, service queue) reports through this one
/// closed set of variants.
#[derive(Debug, Error)]
pub enum Error {
    #[error("General failure")]
    General,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid response data{}", format_body(.body))]
    InvalidResponseData { body: Option<String> },

    #[error("Invalid authentication: HTTP {status}{}", format_body(.body))]
    InvalidAuthentication { status: u16, body: Option<String> },

    /// Non-2xx HTTP status. `-1` means no task or response was available.
    #[error("Network error: HTTP {status}{}", format_body(.body))]
    Network { status: i32, body: Option<String> },

    #[error("Decoding error in {call}: {source}")]
    Decoding {
        #[source]
        source: Box<Error>,
        body: String,
        call: String,
    },

    #[error("Root node '{key}' not found in payload")]
    RootNodeNotFound { key: String, payload: Value },

    #[error("Empty key")]
    EmptyKey,

    #[error("Value missing for key '{key}'")]
    ValueMissing { key: String },

    #[error("Expected a collection at key '{key}'")]
    EmptyCollection { key: String },

    #[error("Invalid date '{value}' for key '{key}'")]
    InvalidDate { key: String, value: String },

    #[error("No case matches raw value {raw} for key '{key}'")]
    RawRepresentableFail { key: String, raw: Value },

    #[error("Invalid dictionary: {payload}")]
    InvalidDictionary { payload: Value },

    #[error("Malformed: {info}{}", format_context(.context))]
    Malformed { info: String, context: ErrorContext },

    #[error("Link '{key}' with value {value} is not unique in JSON ({matches} matches)")]
    LinkNotUnique {
        key: String,
        value: String,
        matches: usize,
    },

    #[error("Network transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

const BODY_PREVIEW_CHARS: usize = 256;

fn format_body(body: &Option<String>) -> String {
    match body.as_deref() {
        None | Some("") => String::new(),
        Some(b) if b.chars().count() > BODY_PREVIEW_CHARS => {
            let preview: String = b.chars().take(BODY_PREVIEW_CHARS).collect();
            format!(", body: {}...", preview)
        }
        Some(b) => format!(", body: {}", b),
    }
}

/// Lossy UTF-8 rendering of a response body for diagnostics.
pub(crate) fn body_string(data: &[u8]) -> String {
    String::from_utf8_lossy(data).into_owned()
}

impl Error {
    pub fn malformed(info: impl Into<String>) -> Self {
        Error::Malformed {
            info: info.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a new malformed error with structured context
    pub fn malformed_with_context(info: impl Into<String>, context: ErrorContext) -> Self {
        Error::Malformed {
            info: info.into(),
            context,
        }
    }

    pub fn value_missing(key: impl Into<String>) -> Self {
        Error::ValueMissing { key: key.into() }
    }

    pub fn invalid_dictionary(payload: Option<&Value>) -> Self {
        Error::InvalidDictionary {
            payload: payload.cloned().unwrap_or(Value::Null),
        }
    }

    /// Classify an HTTP status. Returns `None` inside the success range.
    ///
    /// 401 and 403 map to [`Error::InvalidAuthentication`]; every other
    /// non-2xx status (404 included) maps to [`Error::Network`].
    pub fn from_http_status(status: u16, body: Option<String>) -> Option<Self> {
        match ErrorKind::from_http_status(status)? {
            ErrorKind::InvalidAuthentication => Some(Error::InvalidAuthentication { status, body }),
            _ => Some(Error::Network {
                status: i32::from(status),
                body,
            }),
        }
    }

    /// Wrap a schema mismatch with the payload and the call that produced it.
    ///
    /// Bodies that never parsed as JSON stay [`Error::InvalidResponseData`].
    pub(crate) fn into_decoding(self, data: &[u8], call: &str) -> Self {
        match self {
            e @ (Error::InvalidResponseData { .. } | Error::Decoding { .. }) => e,
            other => Error::Decoding {
                source: Box::new(other),
                body: body_string(data),
                call: call.to_string(),
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::General => ErrorKind::General,
            Error::InvalidUrl(_) => ErrorKind::InvalidUrl,
            Error::InvalidResponseData { .. } => ErrorKind::InvalidResponseData,
            Error::InvalidAuthentication { .. } => ErrorKind::InvalidAuthentication,
            Error::Network { .. } => ErrorKind::NetworkError,
            Error::Decoding { .. } => ErrorKind::DecodingError,
            Error::RootNodeNotFound { .. } => ErrorKind::RootNodeNotFound,
            Error::EmptyKey => ErrorKind::EmptyKey,
            Error::ValueMissing { .. } => ErrorKind::ValueMissing,
            Error::EmptyCollection { .. } => ErrorKind::EmptyCollection,
            Error::InvalidDate { .. } => ErrorKind::InvalidDate,
            Error::RawRepresentableFail { .. } => ErrorKind::RawRepresentableFail,
            Error::InvalidDictionary { .. } => ErrorKind::InvalidDictionary,
            Error::Malformed { .. } => ErrorKind::Malformed,
            Error::LinkNotUnique { .. } => ErrorKind::LinkNotUniqueInJson,
            Error::Transport(_) => ErrorKind::Transport,
            Error::Serialization(_) => ErrorKind::Serialization,
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<i32> {
        match self {
            Error::Network { status, .. } => Some(*status),
            Error::InvalidAuthentication { status, .. } => Some(i32::from(*status)),
            _ => None,
        }
    }

    /// The key a required binder could not fill, looking through decoding wrappers.
    pub fn missing_key(&self) -> Option<&str> {
        match self {
            Error::ValueMissing { key } => Some(key),
            Error::Decoding { source, .. } => source.missing_key(),
            _ => None,
        }
    }

    /// Innermost error, unwrapping [`Error::Decoding`].
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Decoding { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Structural errors are the ones a mitigator may repair.
    pub fn is_structural(&self) -> bool {
        self.kind().is_structural()
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Malformed { context, .. } => Some(context),
            _ => None,
        }
    }
}

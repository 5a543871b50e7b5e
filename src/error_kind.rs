//! 错误分类：统一错误类型的稳定名称与 HTTP 状态码映射。
//!
//! Error kinds for the unified [`Error`](crate::Error) taxonomy.
//!
//! Every error variant maps to exactly one [`ErrorKind`]. Kinds are `Copy`,
//! carry a stable snake_case name for logs and metrics labels, and group into
//! a small number of categories.
//!
//! ## Categories
//!
//! | Category    | Kinds                                                        |
//! |-------------|--------------------------------------------------------------|
//! | request     | `invalid_url`, `serialization`                               |
//! | response    | `invalid_response_data`, `invalid_authentication`, `network_error` |
//! | mapping     | `decoding_error`, `root_node_not_found`, `empty_key`, `value_missing`, `empty_collection`, `invalid_date`, `raw_representable_fail`, `invalid_dictionary`, `link_not_unique_in_json` |
//! | transport   | `transport`                                                  |
//! | general     | `general`, `malformed`                                       |
//!
//! ## Example
//!
//! ```rust
//! use rivet::error_kind::ErrorKind;
//!
//! assert_eq!(ErrorKind::from_http_status(200), None);
//! assert_eq!(ErrorKind::from_http_status(401), Some(ErrorKind::InvalidAuthentication));
//! assert_eq!(ErrorKind::from_http_status(404), Some(ErrorKind::NetworkError));
//! assert_eq!(ErrorKind::NetworkError.name(), "network_error");
//! ```

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unclassified failure
    General,
    /// Request could not be constructed from configuration
    InvalidUrl,
    /// Body present but unparseable, or empty when data was expected
    InvalidResponseData,
    /// HTTP 401/403 rejection
    InvalidAuthentication,
    /// Any other non-2xx status, or no task could be created
    NetworkError,
    /// Body parsed as JSON but did not match the target schema
    DecodingError,
    /// Configured root key absent from payload
    RootNodeNotFound,
    /// Field name was empty
    EmptyKey,
    /// Required field missing or mistyped
    ValueMissing,
    /// Expected an object or array at a key, found none
    EmptyCollection,
    /// String present but did not match the date format
    InvalidDate,
    /// No enum case for the raw value
    RawRepresentableFail,
    /// JSON of the wrong shape (not an object / array of objects)
    InvalidDictionary,
    /// Free-form structural diagnostic
    Malformed,
    /// More than one raw object matched a link value
    LinkNotUniqueInJson,
    /// Error raised by the transport layer
    Transport,
    /// Request body could not be encoded
    Serialization,
}

impl ErrorKind {
    /// Returns the stable name (e.g., `"value_missing"`).
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::InvalidUrl => "invalid_url",
            Self::InvalidResponseData => "invalid_response_data",
            Self::InvalidAuthentication => "invalid_authentication",
            Self::NetworkError => "network_error",
            Self::DecodingError => "decoding_error",
            Self::RootNodeNotFound => "root_node_not_found",
            Self::EmptyKey => "empty_key",
            Self::ValueMissing => "value_missing",
            Self::EmptyCollection => "empty_collection",
            Self::InvalidDate => "invalid_date",
            Self::RawRepresentableFail => "raw_representable_fail",
            Self::InvalidDictionary => "invalid_dictionary",
            Self::Malformed => "malformed",
            Self::LinkNotUniqueInJson => "link_not_unique_in_json",
            Self::Transport => "transport",
            Self::Serialization => "serialization",
        }
    }

    /// Returns the category: `"request"`, `"response"`, `"mapping"`, `"transport"` or `"general"`.
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidUrl | Self::Serialization => "request",
            Self::InvalidResponseData | Self::InvalidAuthentication | Self::NetworkError => {
                "response"
            }
            Self::DecodingError
            | Self::RootNodeNotFound
            | Self::EmptyKey
            | Self::ValueMissing
            | Self::EmptyCollection
            | Self::InvalidDate
            | Self::RawRepresentableFail
            | Self::InvalidDictionary
            | Self::LinkNotUniqueInJson => "mapping",
            Self::Transport => "transport",
            Self::General | Self::Malformed => "general",
        }
    }

    /// Whether a mitigator gets a chance to repair the payload.
    #[inline]
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::RootNodeNotFound | Self::InvalidDictionary)
    }

    /// Maps an HTTP status to the kind it surfaces as. `None` for 2xx.
    pub fn from_http_status(status: u16) -> Option<Self> {
        match status {
            200..=299 => None,
            401 | 403 => Some(Self::InvalidAuthentication),
            _ => Some(Self::NetworkError),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_mapping() {
        for status in [200u16, 201, 204, 299] {
            assert_eq!(ErrorKind::from_http_status(status), None, "{status}");
        }
        assert_eq!(
            ErrorKind::from_http_status(401),
            Some(ErrorKind::InvalidAuthentication)
        );
        assert_eq!(
            ErrorKind::from_http_status(403),
            Some(ErrorKind::InvalidAuthentication)
        );
        for status in [301u16, 400, 404, 409, 429, 500, 503] {
            assert_eq!(
                ErrorKind::from_http_status(status),
                Some(ErrorKind::NetworkError),
                "{status}"
            );
        }
    }

    #[test]
    fn names_are_unique() {
        let all = [
            ErrorKind::General,
            ErrorKind::InvalidUrl,
            ErrorKind::InvalidResponseData,
            ErrorKind::InvalidAuthentication,
            ErrorKind::NetworkError,
            ErrorKind::DecodingError,
            ErrorKind::RootNodeNotFound,
            ErrorKind::EmptyKey,
            ErrorKind::ValueMissing,
            ErrorKind::EmptyCollection,
            ErrorKind::InvalidDate,
            ErrorKind::RawRepresentableFail,
            ErrorKind::InvalidDictionary,
            ErrorKind::Malformed,
            ErrorKind::LinkNotUniqueInJson,
            ErrorKind::Transport,
            ErrorKind::Serialization,
        ];
        let names: std::collections::HashSet<_> = all.iter().map(|k| k.name()).collect();
        assert_eq!(names.len(), all.len());
    }

    #[test]
    fn categories() {
        assert_eq!(ErrorKind::ValueMissing.category(), "mapping");
        assert_eq!(ErrorKind::NetworkError.category(), "response");
        assert_eq!(ErrorKind::Transport.category(), "transport");
        assert!(ErrorKind::InvalidDictionary.is_structural());
        assert!(!ErrorKind::LinkNotUniqueInJson.is_structural());
    }
}

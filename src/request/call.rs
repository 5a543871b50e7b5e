use super::http::{HttpMethod, HttpRequest};
use super::parameters::{apply_all, Parameters};
use crate::config::Configuration;
use crate::serialize::Serializable;
use crate::{Error, Result};
use std::fmt;
use url::Url;

/// Immutable description of one request.
///
/// The same call and configuration always produce the same [`HttpRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    path: String,
    method: HttpMethod,
    root_node: Option<String>,
    parameters: Vec<Parameters>,
}

impl Call {
    /// A GET call for `path`, relative to the configured base URL.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: HttpMethod::Get,
            root_node: None,
            parameters: Vec::new(),
        }
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    /// Key under which the payload of interest lives, e.g. `results` in
    /// `{"results": [...]}`.
    pub fn with_root_node(mut self, key: impl Into<String>) -> Self {
        self.root_node = Some(key.into());
        self
    }

    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters.push(parameters);
        self
    }

    /// Send `entity` as the JSON body.
    pub fn body_from<S: Serializable>(self, entity: &S) -> Self {
        self.with_parameters(Parameters::json_body(entity.to_json()))
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn root_node(&self) -> Option<&str> {
        self.root_node.as_deref()
    }

    pub fn parameters(&self) -> &[Parameters] {
        &self.parameters
    }

    /// Build the request against `config`.
    pub fn request(&self, config: &Configuration) -> Result<HttpRequest> {
        let url = self.url(config)?;
        let mut request = HttpRequest::new(self.method, url);
        request
            .headers
            .extend(config.default_headers().iter().cloned());
        apply_all(&self.parameters, &mut request)?;
        Ok(request)
    }

    /// Key a mock source uses to find the canned response for this call.
    pub fn mock_key(&self, config: &Configuration) -> Result<String> {
        Ok(self.request(config)?.mock_key())
    }

    fn url(&self, config: &Configuration) -> Result<Url> {
        let base = config.base_url().as_str().trim_end_matches('/');
        let path = self.path.trim_start_matches('/');
        let joined = if path.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", base, path)
        };
        Url::parse(&joined).map_err(|e| Error::InvalidUrl(format!("{}: {}", joined, e)))
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)?;
        if let Some(root) = &self.root_node {
            write!(f, " (root: {})", root)?;
        }
        Ok(())
    }
}

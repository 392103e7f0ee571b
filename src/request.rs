//! Incoming HTTP request type.

use std::collections::HashMap;

use serde::de::DeserializeOwned;

use crate::error::HttpError;

/// An incoming HTTP request with its body already read to the end.
#[derive(Debug, Clone)]
pub struct Request {
    pub(crate) method: String,
    pub(crate) path: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Vec<u8>,
    pub(crate) params: HashMap<String, String>,
}

impl Request {
    /// A bodiless request. Mostly useful for driving handlers directly in tests.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            headers: Vec::new(),
            body: Vec::new(),
            params: HashMap::new(),
        }
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn with_param(mut self, name: &str, value: &str) -> Self {
        self.params.insert(name.to_owned(), value.to_owned());
        self
    }

    /// Headers whose value is not visible ASCII are dropped.
    pub(crate) fn from_parts(parts: &http::request::Parts, body: Vec<u8>) -> Self {
        let headers = parts.headers.iter()
            .filter_map(|(k, v)| Some((k.as_str().to_owned(), v.to_str().ok()?.to_owned())))
            .collect();
        Self {
            method: parts.method.as_str().to_owned(),
            path: parts.uri.path().to_owned(),
            headers,
            body,
            params: HashMap::new(),
        }
    }

    pub fn method(&self) -> &str { &self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/view/{title}`, `req.param("title")` on `/view/Home` returns `Some("Home")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Decodes the body as JSON.
    ///
    /// An empty body and a body that does not decode are both classified
    /// `400 Bad Request` failures.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Err(HttpError::bad_request("Missing request body"));
        }
        serde_json::from_slice(&self.body).map_err(|e| {
            tracing::debug!(error = %e, "request body is not valid JSON");
            HttpError::bad_request("Malformed request body")
        })
    }

    /// First value of `key` in an `application/x-www-form-urlencoded` body.
    pub fn form_value(&self, key: &str) -> Option<String> {
        url::form_urlencoded::parse(&self.body)
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::status::Status;

    #[derive(Debug, Deserialize)]
    struct Title {
        title: String,
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req = Request::new("GET", "/").with_header("Content-Type", "application/json");
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header("accept"), None);
    }

    #[test]
    fn json_rejects_empty_body() {
        let err = Request::new("POST", "/items/add").json::<Title>().unwrap_err();
        assert_eq!(err.status(), Status::BadRequest);
        assert_eq!(err.reason(), "Missing request body");
    }

    #[test]
    fn json_rejects_malformed_body() {
        let err = Request::new("POST", "/items/add")
            .with_body(r#"{"title":"#)
            .json::<Title>()
            .unwrap_err();
        assert_eq!(err.reason(), "Malformed request body");
    }

    #[test]
    fn json_reads_bodies_larger_than_a_single_buffer() {
        let long = "x".repeat(4096);
        let body = format!(r#"{{"title":"{long}"}}"#);
        let parsed: Title = Request::new("POST", "/").with_body(body).json().unwrap();
        assert_eq!(parsed.title.len(), 4096);
    }

    #[test]
    fn form_value_decodes_percent_escapes() {
        let req = Request::new("POST", "/save/Home").with_body("body=hello%20there+world&x=1");
        assert_eq!(req.form_value("body").as_deref(), Some("hello there world"));
        assert_eq!(req.form_value("missing"), None);
    }
}

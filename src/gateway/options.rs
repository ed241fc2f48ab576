//! Per-request options.

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::Result;

/// Method, extra headers, and JSON body of a request.
///
/// ```rust
/// # use satchel::RequestOptions;
/// # use serde_json::json;
/// let options = RequestOptions::patch()
///     .body(json!({"role": "teacher"}))
///     .header("X-Request-Source", "admin-panel");
/// assert_eq!(options.method, reqwest::Method::PATCH);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    pub fn patch() -> Self {
        Self::new(Method::PATCH)
    }

    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    /// Add a header sent alongside the JSON defaults.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the JSON body.
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialize `body` as the JSON body.
    pub fn json<T: Serialize + ?Sized>(self, body: &T) -> Result<Self> {
        Ok(self.body(serde_json::to_value(body)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_get_without_body() {
        let options = RequestOptions::default();
        assert_eq!(options.method, Method::GET);
        assert!(options.body.is_none());
        assert!(options.headers.is_empty());
    }

    #[test]
    fn json_serializes_body() {
        #[derive(Serialize)]
        struct Body {
            email: &'static str,
        }
        let options = RequestOptions::post().json(&Body { email: "a@b" }).unwrap();
        assert_eq!(options.body, Some(serde_json::json!({"email": "a@b"})));
    }
}

//! The response produced by dispatching a request.
//!
//! [`Response`] carries a status, headers, a content type, and a fully
//! buffered text body. It converts into an axum response via
//! [`IntoResponse`], which is where the status line and `Location` header are
//! actually emitted.

use axum::response::IntoResponse;
use http::{HeaderMap, HeaderValue, StatusCode};
use trellis_core::{TrellisError, TrellisResult};

/// A buffered text response.
///
/// # Examples
///
/// ```
/// use trellis_http::Response;
///
/// let response = Response::ok("Hello, World!");
/// assert_eq!(response.status(), http::StatusCode::OK);
/// assert_eq!(response.body(), "Hello, World!");
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
    content_type: String,
}

impl Response {
    /// Creates a new response with the given status code and body.
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
            content_type: "text/html".to_string(),
        }
    }

    /// Creates a 200 OK response.
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, body)
    }

    /// Creates a 404 Not Found response.
    pub fn not_found(body: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, body)
    }

    /// Creates a 302 Found redirect to `url`.
    ///
    /// # Errors
    ///
    /// Returns `InternalServerError` if `url` cannot be sent as a `Location`
    /// header (control characters or non-ASCII text).
    pub fn redirect(url: &str) -> TrellisResult<Self> {
        let value = HeaderValue::from_str(url)
            .ok()
            .filter(|value| value.to_str().is_ok())
            .ok_or_else(|| {
                TrellisError::InternalServerError(format!(
                    "Redirect location '{url}' is not a valid header value"
                ))
            })?;
        let mut response = Self::new(StatusCode::FOUND, "");
        response.headers.insert(http::header::LOCATION, value);
        Ok(response)
    }

    /// Returns the status code.
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns a reference to the headers.
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a mutable reference to the headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Returns the `Location` header, if this is a redirect.
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(http::header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    /// Returns `true` for 3xx responses.
    pub fn is_redirect(&self) -> bool {
        self.status.is_redirection()
    }

    /// Returns the content type (without charset).
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Sets the content type.
    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.content_type = content_type.into();
    }

    /// Returns the body.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Consumes the response, returning the body.
    pub fn into_body(self) -> String {
        self.body
    }
}

impl IntoResponse for Response {
    fn into_response(self) -> axum::response::Response {
        let content_type = if self.content_type.starts_with("text/") {
            format!("{}; charset=utf-8", self.content_type)
        } else {
            self.content_type
        };

        let mut response = (self.status, self.body).into_response();
        if let Ok(value) = HeaderValue::from_str(&content_type) {
            response
                .headers_mut()
                .insert(http::header::CONTENT_TYPE, value);
        }
        for (key, value) in &self.headers {
            response.headers_mut().insert(key, value.clone());
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        assert_eq!(Response::ok("x").status(), StatusCode::OK);
        assert_eq!(Response::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            Response::new(StatusCode::INTERNAL_SERVER_ERROR, "x").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_redirect_sets_location() {
        let response = Response::redirect("/users/7").unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.location(), Some("/users/7"));
        assert!(response.is_redirect());
        assert!(response.body().is_empty());
    }

    #[test]
    fn test_redirect_invalid_header_value() {
        let err = Response::redirect("/bad\nurl").unwrap_err();
        assert!(matches!(err, TrellisError::InternalServerError(_)));
    }

    #[test]
    fn test_redirect_non_ascii_location() {
        let err = Response::redirect("/users/José").unwrap_err();
        assert!(err.to_string().contains("/users/José"));
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_into_response_headers() {
        let mut response = Response::ok("<p>hi</p>");
        response
            .headers_mut()
            .insert("x-trellis", HeaderValue::from_static("1"));
        let axum_response = response.into_response();
        assert_eq!(axum_response.status(), StatusCode::OK);
        assert_eq!(
            axum_response.headers()[http::header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
        assert_eq!(axum_response.headers()["x-trellis"], "1");
    }

    #[test]
    fn test_into_response_non_text_content_type() {
        let mut response = Response::ok("{}");
        response.set_content_type("application/json");
        assert_eq!(response.content_type(), "application/json");
        let axum_response = response.into_response();
        assert_eq!(
            axum_response.headers()[http::header::CONTENT_TYPE],
            "application/json"
        );
    }
}

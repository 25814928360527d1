//! HTTP server integration.
//!
//! [`into_axum_router`] wraps an [`Application`] in an axum router that sends
//! every request's path and query through [`Application::dispatch`].
//! Requests are served one at a time: the application sits behind a single
//! `tokio::sync::Mutex`.
//!
//! # Examples
//!
//! ```no_run
//! use trellis_views::{server, Application};
//!
//! # async fn example() -> Result<(), trellis_core::TrellisError> {
//! let mut app = Application::new();
//! app.route("home", "/", Some("Hello!"), None)?;
//! server::run(app, "127.0.0.1:8000").await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use axum::body::Body;
use axum::extract::Request;
use axum::response::IntoResponse;
use axum::routing::any;
use tokio::sync::Mutex;
use trellis_core::logging::request_span;
use trellis_core::{TrellisError, TrellisResult};

use crate::app::Application;

/// Converts the application into an axum router.
pub fn into_axum_router(app: Application) -> axum::Router {
    let app = Arc::new(Mutex::new(app));

    let handler = move |req: Request<Body>| {
        let app = Arc::clone(&app);

        async move {
            let target = req
                .uri()
                .path_and_query()
                .map_or_else(|| req.uri().path().to_string(), |pq| pq.as_str().to_string());
            let span = request_span(req.method().as_str(), &target);

            let app = app.lock().await;
            let response = span.in_scope(|| app.dispatch(&target));
            drop(app);

            span.in_scope(|| {
                tracing::debug!(status = response.status().as_u16(), "request complete");
            });
            response.into_response()
        }
    };

    axum::Router::new()
        .route("/{*path}", any(handler.clone()))
        .route("/", any(handler))
}

/// Serves the application on `addr` until the server stops.
///
/// # Errors
///
/// Returns `ImproperlyConfigured` if the address cannot be bound, or
/// `InternalServerError` if the server fails.
pub async fn run(app: Application, addr: &str) -> TrellisResult<()> {
    let router = into_axum_router(app);
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        TrellisError::ImproperlyConfigured(format!("Failed to bind to {addr}: {e}"))
    })?;

    tracing::info!("Serving at http://{addr}/");

    axum::serve(listener, router)
        .await
        .map_err(|e| TrellisError::InternalServerError(format!("Server error: {e}")))
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;

    #[tokio::test]
    async fn test_router_dispatches_root_and_nested() {
        let mut app = Application::new();
        app.route("home", "/", Some("home page"), None).unwrap();
        app.route("deep", "/a/b/:c", Some("deep page"), None).unwrap();
        let router = into_axum_router(app);

        for (uri, expected) in [("/", "home page"), ("/a/b/c?q=1", "deep page")] {
            let response = router
                .clone()
                .oneshot(http::Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), http::StatusCode::OK);
            let body = response.into_body().collect().await.unwrap().to_bytes();
            assert_eq!(&body[..], expected.as_bytes());
        }
    }

    #[tokio::test]
    async fn test_run_bad_address() {
        let err = run(Application::new(), "not an address").await.unwrap_err();
        assert!(matches!(err, TrellisError::ImproperlyConfigured(_)));
    }
}

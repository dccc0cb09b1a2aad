//! HTTP server implementation
//!
//! hyper http1 with TokioIo, one task per connection. Bodies are collected
//! up front under `MAX_BODY_BYTES` so handlers work on `Request<Bytes>`.

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::routes::{
    self,
    response::{apply_cors, error_response, HttpResponse},
};
use crate::server::AppState;
use crate::types::LeadwayError;

/// Accept connections until ctrl-c
pub async fn run(state: Arc<AppState>) -> Result<(), LeadwayError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "Leadway listening on {} (store: {}, narrative: {})",
        state.args.listen,
        state.store.backend(),
        state.llm.as_ref().map(|b| b.id()).unwrap_or("disabled"),
    );

    if state.args.dev_mode {
        warn!("Development mode enabled - insecure defaults in use");
    }
    if state.admin.is_none() {
        warn!("Admin login not configured - /auth and /admin/* will refuse every request");
    }

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    let state = Arc::clone(&state);
                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);

                        let service = service_fn(move |req| {
                            let state = Arc::clone(&state);
                            async move { handle_request(state, addr, req).await }
                        });

                        if let Err(err) = http1::Builder::new()
                            .serve_connection(io, service)
                            .await
                        {
                            error!("Error serving connection from {}: {:?}", addr, err);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {:?}", e);
                }
            },
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                return Ok(());
            }
        }
    }
}

/// Collect the body under the size limit and hand off to the router
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();

    let bytes = match collect_body(body, state.args.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("[{}] {} {} body rejected: {}", addr, parts.method, parts.uri.path(), e);
            return Ok(body_rejection(&e, &state.args.cors_origin));
        }
    };

    let req = Request::from_parts(parts, bytes);
    Ok(routes::route(state, addr, req).await)
}

/// Read a whole body, failing with `PayloadTooLarge` past `limit` bytes
pub(crate) async fn collect_body<B>(body: B, limit: usize) -> Result<Bytes, LeadwayError>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => Err(
            LeadwayError::PayloadTooLarge("Request body too large".into()),
        ),
        Err(e) => {
            debug!("body read error: {}", e);
            Err(LeadwayError::BadRequest("Failed to read request body".into()))
        }
    }
}

/// Error response, with CORS headers, for a body that never reached the router
fn body_rejection(err: &LeadwayError, cors_origin: &str) -> HttpResponse {
    let mut resp = error_response(err);
    apply_cors(&mut resp, cors_origin);
    resp
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::ACCESS_CONTROL_ALLOW_ORIGIN;
    use hyper::StatusCode;

    #[tokio::test]
    async fn test_collect_body_under_limit() {
        let body = Full::new(Bytes::from_static(b"{\"event\":\"e\"}"));
        let bytes = collect_body(body, 64).await.unwrap();
        assert_eq!(&bytes[..], b"{\"event\":\"e\"}");
    }

    #[tokio::test]
    async fn test_collect_body_over_limit_is_payload_too_large() {
        let body = Full::new(Bytes::from(vec![b'x'; 100]));
        let err = collect_body(body, 10).await.unwrap_err();
        assert!(matches!(err, LeadwayError::PayloadTooLarge(_)));
        assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_collect_body_at_exact_limit() {
        let body = Full::new(Bytes::from(vec![b'x'; 10]));
        assert_eq!(collect_body(body, 10).await.unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_body_rejection_carries_cors() {
        let err = collect_body(Full::new(Bytes::from(vec![b'x'; 100])), 10)
            .await
            .unwrap_err();
        let resp = body_rejection(&err, "https://consultancy.example");
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            resp.headers()[ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://consultancy.example"
        );

        let resp = body_rejection(&LeadwayError::BadRequest("Failed to read request body".into()), "*");
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(resp.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }
}

//! Host listener adapter
//!
//! Mounts a [`Dispatcher`] as the fallback of an axum [`Router`], so every
//! request goes through `Dispatcher::handle`.

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::rejection::{BytesRejection, FailedToBufferBody};
use axum::extract::DefaultBodyLimit;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::Router;
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::dispatch::Dispatcher;
use crate::handler::Response;
use crate::response;

/// Router forwarding every request to `dispatcher`
///
/// Bodies are buffered up to `max_body_bytes`. A larger body gets a 413,
/// a body that fails to arrive gets a 400.
pub fn into_router(dispatcher: Arc<Dispatcher>, max_body_bytes: usize) -> Router {
    Router::new()
        .fallback(move |parts: Parts, body: Result<Bytes, BytesRejection>| {
            let dispatcher = dispatcher.clone();
            async move {
                let bytes = match body {
                    Ok(bytes) => bytes,
                    Err(rejection) => return body_rejected(rejection).map(Body::from),
                };

                let request = axum::http::Request::from_parts(parts, bytes);
                dispatcher.handle(request).await.map(Body::from)
            }
        })
        .layer(DefaultBodyLimit::max(max_body_bytes))
}

fn body_rejected(rejection: BytesRejection) -> Response {
    debug!("Rejected request body: {}", rejection);
    match rejection {
        BytesRejection::FailedToBufferBody(FailedToBufferBody::LengthLimitError(_)) => {
            response::with_status(
                StatusCode::PAYLOAD_TOO_LARGE,
                "Payload Too Large",
                Some(response::TEXT_PLAIN),
            )
        }
        _ => response::with_status(StatusCode::BAD_REQUEST, "Bad Request", Some(response::TEXT_PLAIN)),
    }
}

/// Serves `dispatcher` on `listener` until the server stops
pub async fn serve(
    listener: TcpListener,
    dispatcher: Dispatcher,
    max_body_bytes: usize,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Listening on http://{} ({} routes)", addr, dispatcher.len());
    }
    axum::serve(listener, into_router(Arc::new(dispatcher), max_body_bytes)).await
}

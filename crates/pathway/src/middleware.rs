//! Middleware composition and the built-in request tracer

use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use tracing::{info, info_span, Instrument};

use crate::handler::{Handler, Middleware, RequestContext};

/// Wraps `handler` in every middleware; the first one ends up outermost
pub fn compose(middlewares: &[Middleware], handler: Handler) -> Handler {
    middlewares
        .iter()
        .rev()
        .fold(handler, |inner, middleware| middleware(inner))
}

/// Runs each request inside an `info` span and logs status and latency
pub fn trace_requests() -> Middleware {
    Arc::new(|next: Handler| -> Handler {
        Arc::new(move |ctx: RequestContext| {
            let span = info_span!("request", method = %ctx.method(), path = %ctx.path());
            let next = next.clone();

            async move {
                let started = Instant::now();
                let result = next(ctx).await;
                let response = match &result {
                    Ok(response) | Err(response) => response,
                };
                info!(
                    status = response.status().as_u16(),
                    latency_ms = started.elapsed().as_millis() as u64,
                    alternate = result.is_err(),
                    "handled request"
                );
                result
            }
            .instrument(span)
            .boxed()
        })
    })
}

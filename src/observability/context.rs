//! Request-scoped logger carrier.
//!
//! # Responsibilities
//! - Associate a request logger with one in-flight request
//! - Hand the right logger to code that only has the request, or nothing
//!
//! # Design Decisions
//! - Two carriers: request extensions (for extractors and middleware) and a
//!   Tokio task-local (for code deeper in the call stack, like the search
//!   client). The correlation middleware fills both
//! - Retrieval never fails: request logger, then process logger, then an
//!   inert logger

use std::convert::Infallible;
use std::future::Future;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{Extensions, Request};

use crate::observability::logging::{self, Logger};

tokio::task_local! {
    static REQUEST_LOGGER: Logger;
}

/// Store `logger` on the request. Attaching the logger that is already
/// there leaves the request untouched.
pub fn attach<B>(mut request: Request<B>, logger: Logger) -> Request<B> {
    let extensions = request.extensions_mut();
    match extensions.get::<Logger>() {
        Some(existing) if existing.ptr_eq(&logger) => {}
        _ => {
            extensions.insert(logger);
        }
    }
    request
}

/// The logger attached to a request, else [`current`].
pub fn retrieve(extensions: &Extensions) -> Logger {
    match extensions.get::<Logger>() {
        Some(logger) => logger.clone(),
        None => current(),
    }
}

/// The logger of the running request task, else the process logger if it
/// exists, else an inert logger.
pub fn current() -> Logger {
    let scoped = REQUEST_LOGGER.try_with(Logger::clone).ok();
    resolve(scoped, logging::try_get())
}

fn resolve(scoped: Option<Logger>, process: Option<&Logger>) -> Logger {
    scoped
        .or_else(|| process.cloned())
        .unwrap_or_else(Logger::nop)
}

/// Run `future` with `logger` as the task's current logger.
pub async fn scope<F: Future>(logger: Logger, future: F) -> F::Output {
    let already_current = REQUEST_LOGGER
        .try_with(|current| current.ptr_eq(&logger))
        .unwrap_or(false);
    if already_current {
        future.await
    } else {
        REQUEST_LOGGER.scope(logger, future).await
    }
}

impl<S> FromRequestParts<S> for Logger
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(retrieve(&parts.extensions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::correlation::CorrelationId;
    use axum::body::Body;

    fn request_logger() -> Logger {
        Logger::builder().build().for_request(CorrelationId::new())
    }

    #[test]
    fn test_attach_same_logger_is_noop() {
        let logger = request_logger();
        let request = attach(Request::new(Body::empty()), logger.clone());
        let request = attach(request, logger.clone());

        assert_eq!(request.extensions().len(), 1);
        assert!(retrieve(request.extensions()).ptr_eq(&logger));
    }

    #[test]
    fn test_attach_replaces_other_logger() {
        let first = request_logger();
        let second = request_logger();
        let request = attach(Request::new(Body::empty()), first);
        let request = attach(request, second.clone());

        assert!(retrieve(request.extensions()).ptr_eq(&second));
    }

    #[test]
    fn test_resolution_order() {
        let scoped = request_logger();
        let process = request_logger();

        assert!(resolve(Some(scoped.clone()), Some(&process)).ptr_eq(&scoped));
        assert!(resolve(None, Some(&process)).ptr_eq(&process));

        let fallback = resolve(None, None);
        assert!(fallback.correlation_id().is_none());
        assert!(fallback.span().is_disabled());
    }

    #[tokio::test]
    async fn test_scope_sets_current_logger() {
        let logger = request_logger();

        let seen = scope(logger.clone(), async {
            tokio::task::yield_now().await;
            current()
        })
        .await;
        assert!(seen.ptr_eq(&logger));

        // Re-entering with the same logger keeps it current.
        let nested = scope(logger.clone(), scope(logger.clone(), async { current() })).await;
        assert!(nested.ptr_eq(&logger));
    }

    #[tokio::test]
    async fn test_extractor_falls_back_to_task_scope() {
        let logger = request_logger();
        let (mut parts, _) = Request::new(Body::empty()).into_parts();

        let extracted = scope(logger.clone(), async {
            Logger::from_request_parts(&mut parts, &()).await
        })
        .await;

        match extracted {
            Ok(found) => assert!(found.ptr_eq(&logger)),
            Err(never) => match never {},
        }
    }
}

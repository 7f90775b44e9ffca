//! Built-in middleware.
//!
//! - [`logger`] logs one line per request once the chain has finished
//! - [`recovery`] turns a panicking handler into a `500` JSON response
//!
//! Both follow the usual shape: do some work, call [`Context::next`], then
//! inspect the result.

use std::any::Any;
use std::backtrace::Backtrace;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use draft_core::{handler_fn, Context, HandlerFunc};

/// Message sent to the client when a handler panics.
pub const INTERNAL_SERVER_ERROR: &str = "Internal Server Error";

/// Logs method, path, final status and latency of every request.
pub fn logger() -> HandlerFunc {
    handler_fn(|c: &mut Context| {
        let start = Instant::now();
        c.next();
        tracing::info!(
            request_id = %c.request_id(),
            method = %c.method(),
            path = c.path(),
            status = c.status_code().as_u16(),
            elapsed = ?start.elapsed(),
            "Request completed"
        );
    })
}

/// Catches panics raised further down the chain.
///
/// The panic message, the request line and a backtrace are logged at error
/// level, and the response is replaced by
/// `{"message":"Internal Server Error"}` with status 500.
pub fn recovery() -> HandlerFunc {
    handler_fn(|c: &mut Context| {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| c.next()));
        if let Err(payload) = outcome {
            let backtrace = Backtrace::force_capture();
            tracing::error!(
                request_id = %c.request_id(),
                method = %c.method(),
                uri = %c.request().uri(),
                panic = panic_message(payload.as_ref()),
                %backtrace,
                "Handler panicked"
            );
            c.fail(500, INTERNAL_SERVER_ERROR);
        }
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use draft_core::ContextPool;
    use http::StatusCode;

    fn run(handlers: Vec<HandlerFunc>) -> (StatusCode, String) {
        let pool = ContextPool::new();
        let mut ctx = pool.acquire();
        ctx.prepare(
            http::Request::builder()
                .uri("/boom")
                .body(Bytes::new())
                .unwrap(),
            None,
        );
        ctx.push_handlers(handlers);
        ctx.next();
        let body = String::from_utf8(ctx.response().body().to_vec()).unwrap();
        (ctx.status_code(), body)
    }

    #[test]
    fn test_recovery_turns_panic_into_500() {
        let (status, body) = run(vec![
            recovery(),
            handler_fn(|c: &mut Context| {
                c.string(200, "partial output");
                panic!("index out of range");
            }),
        ]);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, r#"{"message":"Internal Server Error"}"#);
    }

    #[test]
    fn test_recovery_passes_through_normal_responses() {
        let (status, body) = run(vec![
            recovery(),
            handler_fn(|c: &mut Context| c.string(200, "fine")),
        ]);
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "fine");
    }

    #[test]
    fn test_logger_observes_inner_status() {
        let (status, body) = run(vec![
            logger(),
            handler_fn(|c: &mut Context| c.string(202, "accepted")),
        ]);
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body, "accepted");
    }

    #[test]
    fn test_panic_message() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let borrowed: Box<dyn Any + Send> = Box::new("static");
        let other: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(owned.as_ref()), "owned");
        assert_eq!(panic_message(borrowed.as_ref()), "static");
        assert_eq!(panic_message(other.as_ref()), "non-string panic payload");
    }
}

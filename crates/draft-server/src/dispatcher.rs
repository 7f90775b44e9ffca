//! Request dispatch.
//!
//! The [`Dispatcher`] is the frozen form of an [`Engine`](crate::Engine).
//! For every request it:
//!
//! 1. borrows a clean [`Context`] from the pool and loads the request into it
//! 2. collects the middleware of every group whose prefix covers the path,
//!    in group registration order
//! 3. resolves the route in the tree for the request method and binds its
//!    parameters
//! 4. appends the route handler, or the built-in 404 responder
//! 5. runs the chain and takes the buffered response out
//!
//! The context goes back to the pool when its guard drops, which also happens
//! while unwinding from a panic.

use std::fmt;
use std::sync::Arc;

use draft_core::{handler_fn, Context, ContextPool, HandlerFunc, HtmlRenderer, Request, Response};
use draft_router::Router;

/// A route group's middleware scope.
pub(crate) struct GroupScope {
    pub(crate) prefix: String,
    pub(crate) middleware: Vec<HandlerFunc>,
}

impl GroupScope {
    /// Returns true when this group's middleware applies to `path`.
    ///
    /// The prefix must end on a segment boundary, so `/api` covers `/api` and
    /// `/api/users` but not `/apiary`. The root group covers everything.
    pub(crate) fn covers(&self, path: &str) -> bool {
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => {
                self.prefix.is_empty()
                    || self.prefix.ends_with('/')
                    || rest.is_empty()
                    || rest.starts_with('/')
            }
            None => false,
        }
    }
}

/// Immutable routing table plus the per-request machinery.
pub struct Dispatcher {
    router: Router<HandlerFunc>,
    groups: Vec<GroupScope>,
    pool: ContextPool,
    renderer: Arc<HtmlRenderer>,
    not_found: HandlerFunc,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.router.len())
            .field("groups", &self.groups.len())
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub(crate) fn new(
        router: Router<HandlerFunc>,
        groups: Vec<GroupScope>,
        renderer: HtmlRenderer,
        pool_capacity: usize,
    ) -> Self {
        Self {
            router,
            groups,
            pool: ContextPool::with_capacity(pool_capacity),
            renderer: Arc::new(renderer),
            not_found: handler_fn(not_found),
        }
    }

    /// Runs the handler chain for one request and returns its response.
    ///
    /// This is synchronous: every handler runs on the calling thread.
    pub fn handle_request(&self, request: Request) -> Response {
        let mut ctx = self.pool.acquire();
        ctx.prepare(request, Some(Arc::clone(&self.renderer)));

        for group in &self.groups {
            if group.covers(ctx.path()) {
                ctx.push_handlers(group.middleware.iter().cloned());
            }
        }

        match self.router.at(ctx.method(), ctx.path()) {
            Ok(matched) => {
                let handler = Arc::clone(matched.value);
                ctx.set_params(matched.params);
                ctx.push_handler(handler);
            }
            Err(reason) => {
                tracing::debug!(
                    method = %ctx.method(),
                    path = ctx.path(),
                    %reason,
                    allowed = ?self.router.allowed_methods(ctx.path()),
                    "No route matched"
                );
                ctx.push_handler(Arc::clone(&self.not_found));
            }
        }

        ctx.next();
        ctx.take_response()
    }

    /// Returns the routing table.
    #[must_use]
    pub fn router(&self) -> &Router<HandlerFunc> {
        &self.router
    }

    /// Returns the context pool.
    #[must_use]
    pub fn pool(&self) -> &ContextPool {
        &self.pool
    }
}

fn not_found(c: &mut Context) {
    let path = c.path().to_owned();
    c.string(404, format_args!("404 NOT FOUND: {path}"));
}

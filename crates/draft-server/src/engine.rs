//! Route registration.
//!
//! An [`Engine`] collects routes, route groups, middleware and templates.
//! Once configured, [`Engine::build`] freezes it into a [`Dispatcher`] that
//! can serve requests from any number of threads.
//!
//! ```rust
//! use draft_server::{middleware, Engine};
//!
//! # fn main() -> Result<(), draft_server::RegistrationError> {
//! let mut engine = Engine::new();
//! engine.use_middleware([middleware::logger()]);
//! engine.get("/", |c| c.string(200, "home"))?;
//!
//! let mut v1 = engine.group("/v1");
//! v1.get("/hello/:name", |c| {
//!     let name = c.param("name").unwrap_or_default().to_owned();
//!     c.string(200, format_args!("hello {name}"));
//! })?;
//!
//! let dispatcher = engine.build();
//! assert_eq!(dispatcher.router().len(), 2);
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use draft_core::{
    handler_fn, Context, Dir, FileSystem, HandlerFunc, HtmlRenderer, TemplateFilter,
    DEFAULT_POOL_CAPACITY,
};
use draft_router::Router;
use http::Method;

use crate::config::{ServerConfig, TlsFiles};
use crate::dispatcher::{Dispatcher, GroupScope};
use crate::error::{RegistrationError, RegistrationResult, ServerError};
use crate::middleware::{logger, recovery};
use crate::server::Server;
use crate::static_files::{
    check_relative, directory_pattern, file_system_handler, single_file_handler,
};

/// Methods registered by [`RouterGroup::any`].
pub const ANY_METHODS: [Method; 9] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::HEAD,
    Method::OPTIONS,
    Method::DELETE,
    Method::CONNECT,
    Method::TRACE,
];

struct GroupData {
    prefix: String,
    middleware: Vec<HandlerFunc>,
    parent: Option<usize>,
}

macro_rules! root_method_helpers {
    ($($(#[$doc:meta])* $name:ident;)*) => {
        $(
            $(#[$doc])*
            pub fn $name<F>(&mut self, pattern: &str, handler: F) -> RegistrationResult<&mut Self>
            where
                F: Fn(&mut Context) + Send + Sync + 'static,
            {
                self.root().$name(pattern, handler)?;
                Ok(self)
            }
        )*
    };
}

/// Registration builder for routes, groups, middleware and templates.
pub struct Engine {
    router: Router<HandlerFunc>,
    groups: Vec<GroupData>,
    renderer: HtmlRenderer,
    pool_capacity: usize,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("routes", &self.router.len())
            .field("groups", &self.groups.len())
            .field("templates", &self.renderer.len())
            .field("pool_capacity", &self.pool_capacity)
            .finish()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Creates an engine with no routes and no middleware.
    #[must_use]
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            groups: vec![GroupData {
                prefix: String::new(),
                middleware: Vec::new(),
                parent: None,
            }],
            renderer: HtmlRenderer::new(),
            pool_capacity: DEFAULT_POOL_CAPACITY,
        }
    }

    /// Creates an engine with [`logger`] and [`recovery`] installed.
    #[must_use]
    pub fn default_stack() -> Self {
        let mut engine = Self::new();
        engine.use_middleware([logger(), recovery()]);
        engine
    }

    /// Returns the root group, whose prefix is empty.
    pub fn root(&mut self) -> RouterGroup<'_> {
        RouterGroup {
            engine: self,
            index: 0,
        }
    }

    /// Creates a top-level route group.
    pub fn group(&mut self, prefix: &str) -> RouterGroup<'_> {
        self.add_group(0, prefix)
    }

    /// Adds middleware that runs for every request.
    pub fn use_middleware<I>(&mut self, middleware: I) -> &mut Self
    where
        I: IntoIterator<Item = HandlerFunc>,
    {
        self.root().use_middleware(middleware);
        self
    }

    /// Registers a handler on the root group.
    pub fn handle<F>(
        &mut self,
        method: Method,
        pattern: &str,
        handler: F,
    ) -> RegistrationResult<&mut Self>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.root().handle(method, pattern, handler)?;
        Ok(self)
    }

    root_method_helpers! {
        /// Registers a GET handler on the root group.
        get;
        /// Registers a POST handler on the root group.
        post;
        /// Registers a PUT handler on the root group.
        put;
        /// Registers a DELETE handler on the root group.
        delete;
        /// Registers a PATCH handler on the root group.
        patch;
        /// Registers a HEAD handler on the root group.
        head;
        /// Registers an OPTIONS handler on the root group.
        options;
        /// Registers a handler for every method in [`ANY_METHODS`] on the
        /// root group.
        any;
    }

    /// Registers an already wrapped handler on the root group.
    pub fn handle_func(
        &mut self,
        method: Method,
        pattern: &str,
        handler: HandlerFunc,
    ) -> RegistrationResult<&mut Self> {
        self.root().handle_func(method, pattern, handler)?;
        Ok(self)
    }

    /// Serves files below `root` at `relative/*filepath`.
    pub fn static_dir(
        &mut self,
        relative: &str,
        root: impl AsRef<Path>,
    ) -> RegistrationResult<&mut Self> {
        self.root().static_dir(relative, root)?;
        Ok(self)
    }

    /// Serves files from a custom [`FileSystem`] at `relative/*filepath`.
    pub fn static_fs<S>(&mut self, relative: &str, fs: S) -> RegistrationResult<&mut Self>
    where
        S: FileSystem + 'static,
    {
        self.root().static_fs(relative, fs)?;
        Ok(self)
    }

    /// Serves a single file at `relative`.
    pub fn static_file(
        &mut self,
        relative: &str,
        file: impl Into<PathBuf>,
    ) -> RegistrationResult<&mut Self> {
        self.root().static_file(relative, file)?;
        Ok(self)
    }

    /// Loads every HTML template matching `pattern`.
    pub fn load_html_glob(&mut self, pattern: &str) -> RegistrationResult<&mut Self> {
        self.renderer.load_glob(pattern)?;
        Ok(self)
    }

    /// Adds a single HTML template from a string.
    pub fn add_html_template(
        &mut self,
        name: &str,
        content: &str,
    ) -> RegistrationResult<&mut Self> {
        self.renderer.add_raw_template(name, content)?;
        Ok(self)
    }

    /// Registers a template filter usable as `{{ value | name }}`.
    pub fn register_filter<F>(&mut self, name: &str, filter: F) -> &mut Self
    where
        F: TemplateFilter + 'static,
    {
        self.renderer.register_filter(name, filter);
        self
    }

    /// Sets how many idle contexts the dispatcher keeps around.
    pub fn pool_capacity(&mut self, capacity: usize) -> &mut Self {
        self.pool_capacity = capacity;
        self
    }

    /// Returns every registered (method, pattern) pair, sorted.
    #[must_use]
    pub fn routes(&self) -> Vec<(Method, String)> {
        self.router.routes()
    }

    /// Freezes the configuration into a shareable [`Dispatcher`].
    #[must_use]
    pub fn build(self) -> Arc<Dispatcher> {
        let groups = self
            .groups
            .into_iter()
            .map(|g| GroupScope {
                prefix: g.prefix,
                middleware: g.middleware,
            })
            .collect();
        tracing::debug!(routes = self.router.len(), "Engine built");
        Arc::new(Dispatcher::new(
            self.router,
            groups,
            self.renderer,
            self.pool_capacity,
        ))
    }

    /// Serves plain HTTP on `addr` until SIGINT or SIGTERM.
    ///
    /// Builds a multi-threaded tokio runtime and blocks the calling thread.
    pub fn run(self, addr: &str) -> Result<(), ServerError> {
        let config = ServerConfig::builder().http_addr(addr).build();
        block_on(Server::new(self.build(), config).run())
    }

    /// Serves HTTPS on `addr` with PEM encoded certificate and key files.
    pub fn run_tls(
        self,
        addr: &str,
        cert_file: impl AsRef<Path>,
        key_file: impl AsRef<Path>,
    ) -> Result<(), ServerError> {
        let config = ServerConfig::builder()
            .http_addr(addr)
            .tls(TlsFiles::new(cert_file, key_file))
            .build();
        block_on(Server::new(self.build(), config).run())
    }

    fn add_group(&mut self, parent: usize, prefix: &str) -> RouterGroup<'_> {
        let full = format!("{}{prefix}", self.groups[parent].prefix);
        tracing::debug!(prefix = %full, "Route group created");
        self.groups.push(GroupData {
            prefix: full,
            middleware: Vec::new(),
            parent: Some(parent),
        });
        let index = self.groups.len() - 1;
        RouterGroup {
            engine: self,
            index,
        }
    }
}

fn block_on<F>(future: F) -> Result<(), ServerError>
where
    F: std::future::Future<Output = Result<(), ServerError>>,
{
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(future)
}

/// A view on one route group of an [`Engine`].
///
/// Routes registered through a group get the group's prefix, and requests
/// under that prefix run the group's middleware.
pub struct RouterGroup<'e> {
    engine: &'e mut Engine,
    index: usize,
}

macro_rules! method_helpers {
    ($($(#[$doc:meta])* $name:ident => $method:expr;)*) => {
        $(
            $(#[$doc])*
            pub fn $name<F>(&mut self, pattern: &str, handler: F) -> RegistrationResult<&mut Self>
            where
                F: Fn(&mut Context) + Send + Sync + 'static,
            {
                self.handle($method, pattern, handler)
            }
        )*
    };
}

impl RouterGroup<'_> {
    /// Returns the full prefix of this group.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.engine.groups[self.index].prefix
    }

    /// Returns the group this one was created from, if any.
    pub fn parent(&mut self) -> Option<RouterGroup<'_>> {
        let parent = self.engine.groups[self.index].parent?;
        Some(RouterGroup {
            engine: &mut *self.engine,
            index: parent,
        })
    }

    /// Creates a nested group whose prefix extends this one.
    pub fn group(&mut self, prefix: &str) -> RouterGroup<'_> {
        self.engine.add_group(self.index, prefix)
    }

    /// Appends middleware to this group.
    pub fn use_middleware<I>(&mut self, middleware: I) -> &mut Self
    where
        I: IntoIterator<Item = HandlerFunc>,
    {
        self.engine.groups[self.index].middleware.extend(middleware);
        self
    }

    /// Registers `handler` for `method` at the group prefix plus `pattern`.
    pub fn handle<F>(
        &mut self,
        method: Method,
        pattern: &str,
        handler: F,
    ) -> RegistrationResult<&mut Self>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.handle_func(method, pattern, handler_fn(handler))
    }

    /// Registers an already wrapped handler.
    pub fn handle_func(
        &mut self,
        method: Method,
        pattern: &str,
        handler: HandlerFunc,
    ) -> RegistrationResult<&mut Self> {
        let full = format!("{}{pattern}", self.prefix());
        match self.engine.router.insert(method.clone(), &full, handler) {
            Ok(None) => tracing::debug!(%method, pattern = %full, "Route registered"),
            Ok(Some(_)) => tracing::warn!(
                %method,
                pattern = %full,
                "Route registered twice, the last handler wins"
            ),
            Err(source) => {
                return Err(RegistrationError::Route {
                    method,
                    pattern: full,
                    source,
                })
            }
        }
        Ok(self)
    }

    method_helpers! {
        /// Registers a GET handler.
        get => Method::GET;
        /// Registers a POST handler.
        post => Method::POST;
        /// Registers a PUT handler.
        put => Method::PUT;
        /// Registers a DELETE handler.
        delete => Method::DELETE;
        /// Registers a PATCH handler.
        patch => Method::PATCH;
        /// Registers a HEAD handler.
        head => Method::HEAD;
        /// Registers an OPTIONS handler.
        options => Method::OPTIONS;
    }

    /// Registers the handler for every method in [`ANY_METHODS`].
    pub fn any<F>(&mut self, pattern: &str, handler: F) -> RegistrationResult<&mut Self>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        let handler = handler_fn(handler);
        for method in ANY_METHODS {
            self.handle_func(method, pattern, Arc::clone(&handler))?;
        }
        Ok(self)
    }

    /// Serves files below the `root` directory at `relative/*filepath`.
    pub fn static_dir(
        &mut self,
        relative: &str,
        root: impl AsRef<Path>,
    ) -> RegistrationResult<&mut Self> {
        self.static_fs(relative, Dir::new(root))
    }

    /// Serves files from `fs` at `relative/*filepath` for GET and HEAD.
    pub fn static_fs<S>(&mut self, relative: &str, fs: S) -> RegistrationResult<&mut Self>
    where
        S: FileSystem + 'static,
    {
        check_relative(relative)?;
        let handler = file_system_handler(Arc::new(fs));
        let pattern = directory_pattern(relative);
        self.handle_func(Method::GET, &pattern, Arc::clone(&handler))?;
        self.handle_func(Method::HEAD, &pattern, handler)
    }

    /// Serves one file from disk at `relative` for GET.
    pub fn static_file(
        &mut self,
        relative: &str,
        file: impl Into<PathBuf>,
    ) -> RegistrationResult<&mut Self> {
        check_relative(relative)?;
        self.handle_func(Method::GET, relative, single_file_handler(file.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_engine_has_root_group() {
        let mut engine = Engine::new();
        assert_eq!(engine.root().prefix(), "");
        assert!(engine.root().parent().is_none());
        assert!(engine.routes().is_empty());
    }

    #[test]
    fn test_nested_group_prefixes() {
        let mut engine = Engine::new();
        let mut v1 = engine.group("/v1");
        assert_eq!(v1.prefix(), "/v1");

        let mut admin = v1.group("/admin");
        assert_eq!(admin.prefix(), "/v1/admin");
        admin.get("/users", |c| c.string(200, "users")).unwrap();

        let parent = admin.parent().map(|p| p.prefix().to_string());
        assert_eq!(parent.as_deref(), Some("/v1"));

        assert_eq!(
            engine.routes(),
            vec![(Method::GET, "/v1/admin/users".to_string())]
        );
    }

    #[test]
    fn test_verb_helpers() {
        let mut engine = Engine::new();
        engine
            .get("/r", |_| {})
            .and_then(|e| e.post("/r", |_| {}))
            .and_then(|e| e.put("/r", |_| {}))
            .and_then(|e| e.delete("/r", |_| {}))
            .and_then(|e| e.patch("/r", |_| {}))
            .and_then(|e| e.head("/r", |_| {}))
            .and_then(|e| e.options("/r", |_| {}))
            .unwrap();

        let methods: Vec<Method> = engine.routes().into_iter().map(|(m, _)| m).collect();
        assert_eq!(methods.len(), 7);
        assert!(methods.contains(&Method::PATCH));
        assert!(methods.contains(&Method::OPTIONS));
    }

    #[test]
    fn test_any_registers_nine_methods() {
        let mut engine = Engine::new();
        engine.any("/all", |_| {}).unwrap();
        let routes = engine.routes();
        assert_eq!(routes.len(), 9);
        for method in ANY_METHODS {
            assert!(routes.contains(&(method, "/all".to_string())));
        }
    }

    #[test]
    fn test_invalid_pattern_is_returned() {
        let mut engine = Engine::new();
        let err = engine.get("/files/*", |_| {}).unwrap_err();
        assert!(matches!(err, RegistrationError::Route { .. }));
    }

    #[test]
    fn test_conflicting_param_names() {
        let mut engine = Engine::new();
        engine.get("/user/:id", |_| {}).unwrap();
        let err = engine.get("/user/:name", |_| {}).unwrap_err();
        match err {
            RegistrationError::Route { source, .. } => {
                assert!(matches!(source, draft_router::InsertError::Conflict { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_route_is_accepted() {
        let mut engine = Engine::new();
        engine.get("/dup", |c| c.string(200, "first")).unwrap();
        engine.get("/dup", |c| c.string(200, "second")).unwrap();
        assert_eq!(engine.routes().len(), 1);
    }

    #[test]
    fn test_static_helpers_reject_params() {
        let mut engine = Engine::new();
        assert!(matches!(
            engine.static_dir("/assets/:v", "."),
            Err(RegistrationError::StaticPattern(_))
        ));
        assert!(matches!(
            engine.static_file("/favicon*", "favicon.ico"),
            Err(RegistrationError::StaticPattern(_))
        ));
        assert!(engine.routes().is_empty());
    }

    #[test]
    fn test_static_dir_registers_get_and_head() {
        let mut engine = Engine::new();
        engine.group("/public").static_dir("/assets", ".").unwrap();
        assert_eq!(
            engine.routes(),
            vec![
                (Method::GET, "/public/assets/*filepath".to_string()),
                (Method::HEAD, "/public/assets/*filepath".to_string()),
            ]
        );
    }

    #[test]
    fn test_default_stack_installs_root_middleware() {
        let engine = Engine::default_stack();
        assert_eq!(engine.groups[0].middleware.len(), 2);
    }

    #[test]
    fn test_broken_template_fails_registration() {
        let mut engine = Engine::new();
        engine.add_html_template("ok.html", "fine").unwrap();
        let err = engine
            .add_html_template("broken.html", "{% if %}")
            .unwrap_err();
        assert!(matches!(err, RegistrationError::Templates(_)));
    }
}

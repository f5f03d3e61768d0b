//! # Route Table
//!
//! Ordered list of compiled routes plus the documentation generated for
//! them at registration.
//!
//! ## Lifecycle
//!
//! - Routes are registered through `&mut Router` before serving starts.
//! - `Server::new` takes the router by value and shares it read-only, so
//!   registration can never race with matching.
//! - Matching scans routes in registration order; the first match wins.

use crate::docs::{compose_comment, render_json, render_text, CommentPayload};
use crate::error::{Error, Result};
use crate::route::{request_key, Endpoint, HelpFormat, RouteEntry, RouteKey, ANY_METHOD};
use crate::server::Handler;
use crate::shape::{ShapeDescriptor, HIDDEN};
use std::collections::HashSet;
use tracing::{debug, error, warn};

/// Comment attached to the built-in help endpoints
const HELP_COMMENT: &str = "Help text";

/// Built-in documentation endpoints
const HELP_ROUTES: [(&str, HelpFormat); 3] = [
    ("/mgmt/help", HelpFormat::Text),
    ("/mgmt/help/txt", HelpFormat::Text),
    ("/mgmt/help/json", HelpFormat::Json),
];

/// A route matched against a lookup key
#[derive(Debug)]
pub struct RouteMatch<'a> {
    /// The matched route
    pub entry: &'a RouteEntry,
    /// Capture groups of the matcher, in order
    pub params: Vec<String>,
}

/// Route table with generated documentation
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<RouteEntry>,
    keys: HashSet<RouteKey>,
}

impl Router {
    /// Create a router with the `/mgmt/help` endpoints registered
    #[must_use]
    pub fn new() -> Self {
        let mut router = Self::without_help();
        for (path, format) in HELP_ROUTES {
            if let Err(err) = router.add_endpoint(
                "GET",
                path,
                Endpoint::Help(format),
                HELP_COMMENT,
                Vec::new(),
                Vec::new(),
            ) {
                error!(path, error = %err, "Failed to register help endpoint");
            }
        }
        router
    }

    /// Create an empty router without built-in endpoints
    #[must_use]
    pub fn without_help() -> Self {
        Self::default()
    }

    /// Register a route
    ///
    /// # Arguments
    ///
    /// * `method` - HTTP method, case-insensitive, or `*` for any method
    /// * `path` - Path pattern; a regex fragment that may use `(\d+)` and `(\w+)`
    /// * `handler` - Handler invoked on match
    /// * `comment` - Route description, or `"-"` to leave it undocumented
    /// * `inputs` - Request shapes
    /// * `outputs` - Response shapes
    ///
    /// # Errors
    ///
    /// - `Error::DuplicateRoute` if the normalized method and path are taken
    /// - `Error::PatternCompile` if the path is not a valid pattern
    /// - `Error::Descriptor` if a shape is malformed
    /// - `Error::ShapeCycle` if shapes reference each other in a loop
    ///
    /// The table is unchanged on error.
    pub fn add(
        &mut self,
        method: &str,
        path: &str,
        handler: Handler,
        comment: &str,
        inputs: Vec<ShapeDescriptor>,
        outputs: Vec<ShapeDescriptor>,
    ) -> Result<()> {
        self.add_endpoint(
            method,
            path,
            Endpoint::Handler(handler),
            comment,
            inputs,
            outputs,
        )
    }

    fn add_endpoint(
        &mut self,
        method: &str,
        path: &str,
        endpoint: Endpoint,
        comment: &str,
        inputs: Vec<ShapeDescriptor>,
        outputs: Vec<ShapeDescriptor>,
    ) -> Result<()> {
        let key = RouteKey::new(method, path);
        if self.keys.contains(&key) {
            warn!(method = %key.method, path = %key.path, "Route already registered");
            return Err(Error::DuplicateRoute {
                method: key.method,
                path: key.path,
            });
        }

        let matcher = key.compile()?;
        for shape in inputs.iter().chain(&outputs) {
            shape.validate()?;
        }

        let (comment, json_help) = if comment == HIDDEN {
            (comment.to_string(), None)
        } else {
            let text = compose_comment(comment, &inputs, &outputs);
            let payload = CommentPayload::new(&key, comment, inputs, outputs)?;
            (text, Some(payload.to_json()?))
        };

        debug!(
            method = %key.method,
            path = %key.path,
            pattern = %matcher.as_str(),
            documented = json_help.is_some(),
            "Route registered"
        );

        self.keys.insert(key.clone());
        self.routes.push(RouteEntry {
            key,
            matcher,
            endpoint,
            comment,
            json_help,
        });
        Ok(())
    }

    /// Find the first route whose matcher accepts `key` (`"METHOD path"`)
    ///
    /// Returns `None` when nothing matches.
    #[must_use]
    pub fn match_key(&self, key: &str) -> Option<RouteMatch<'_>> {
        self.routes.iter().find_map(|entry| {
            let captures = entry.matcher.captures(key)?;
            let params = captures
                .iter()
                .skip(1)
                .map(|group| group.map_or_else(String::new, |m| m.as_str().to_string()))
                .collect();
            Some(RouteMatch { entry, params })
        })
    }

    /// Match an inbound request method and path
    #[must_use]
    pub fn match_request(&self, method: &str, path: &str) -> Option<RouteMatch<'_>> {
        self.match_key(&request_key(method, path))
    }

    /// Exact lookup of a registered route by method and path pattern
    #[must_use]
    pub fn route(&self, method: &str, path: &str) -> Option<&RouteEntry> {
        let key = RouteKey::new(method, path);
        self.routes.iter().find(|entry| entry.key == key)
    }

    /// Registered routes in registration order
    pub fn routes(&self) -> impl Iterator<Item = &RouteEntry> {
        self.routes.iter()
    }

    /// Number of registered routes
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether no route is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Text documentation of all documented routes
    #[must_use]
    pub fn help_text(&self) -> String {
        render_text(&self.routes)
    }

    /// JSON documentation of all documented routes
    #[must_use]
    pub fn help_json(&self) -> String {
        render_json(&self.routes)
    }

    /// Convenience method to add a GET route without shapes
    ///
    /// # Errors
    ///
    /// See [`Router::add`].
    pub fn get(&mut self, path: &str, handler: Handler, comment: &str) -> Result<()> {
        self.add("GET", path, handler, comment, Vec::new(), Vec::new())
    }

    /// Convenience method to add a POST route without shapes
    ///
    /// # Errors
    ///
    /// See [`Router::add`].
    pub fn post(&mut self, path: &str, handler: Handler, comment: &str) -> Result<()> {
        self.add("POST", path, handler, comment, Vec::new(), Vec::new())
    }

    /// Convenience method to add a PUT route without shapes
    ///
    /// # Errors
    ///
    /// See [`Router::add`].
    pub fn put(&mut self, path: &str, handler: Handler, comment: &str) -> Result<()> {
        self.add("PUT", path, handler, comment, Vec::new(), Vec::new())
    }

    /// Convenience method to add a DELETE route without shapes
    ///
    /// # Errors
    ///
    /// See [`Router::add`].
    pub fn delete(&mut self, path: &str, handler: Handler, comment: &str) -> Result<()> {
        self.add("DELETE", path, handler, comment, Vec::new(), Vec::new())
    }

    /// Convenience method to add a route for any method
    ///
    /// # Errors
    ///
    /// See [`Router::add`].
    pub fn any(&mut self, path: &str, handler: Handler, comment: &str) -> Result<()> {
        self.add(ANY_METHOD, path, handler, comment, Vec::new(), Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::{handler, Response};
    use crate::shape::{FieldSpec, ShapeBuilder};

    fn ok(body: &'static str) -> Handler {
        handler(move |_req| async move { Response::text(body) })
    }

    fn shape(name: &str, target: Option<&str>) -> ShapeDescriptor {
        let mut builder = ShapeBuilder::new(name).field(FieldSpec::new("id", "i64"));
        if let Some(target) = target {
            builder = builder
                .field(FieldSpec::new("link", target).shape_ref(Some(target.to_string())));
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_builtin_help_routes() {
        let router = Router::new();
        assert_eq!(router.len(), 3);
        for (path, format) in HELP_ROUTES {
            let m = router.match_request("GET", path).unwrap();
            assert!(matches!(m.entry.endpoint, Endpoint::Help(f) if f == format));
        }
        assert!(router.match_request("POST", "/mgmt/help").is_none());
    }

    #[test]
    fn test_round_trip_matching() {
        let mut router = Router::without_help();
        router.get("/users", ok("list"), "List users").unwrap();
        router.post("/users", ok("create"), "Create user").unwrap();
        router.delete("/users/all", ok("purge"), "Purge").unwrap();

        for (method, path) in [("GET", "/users"), ("POST", "/users"), ("DELETE", "/users/all")] {
            let m = router.match_key(&format!("{method} {path}")).unwrap();
            assert_eq!(m.entry.method(), method);
            assert_eq!(m.entry.path(), path);
            assert!(m.params.is_empty());
        }
    }

    #[test]
    fn test_duplicate_route_rejected() {
        let mut router = Router::without_help();
        router.get("/foo", ok("first"), "First").unwrap();

        let err = router.get("/foo", ok("second"), "Second").unwrap_err();
        assert!(matches!(err, Error::DuplicateRoute { .. }));
        assert_eq!(router.len(), 1);
        assert_eq!(router.route("GET", "/foo").unwrap().comment, "First");
    }

    #[test]
    fn test_normalization_collides() {
        let mut router = Router::without_help();
        router
            .add("get", "/foo/", ok("a"), "A", Vec::new(), Vec::new())
            .unwrap();
        let result = router.add("GET", "/foo", ok("b"), "B", Vec::new(), Vec::new());
        assert!(matches!(result, Err(Error::DuplicateRoute { .. })));

        // Request side normalization matches too.
        assert!(router.match_request("get", "/foo/").is_some());
    }

    #[test]
    fn test_wildcard_method() {
        let mut router = Router::without_help();
        router.any("/ping", ok("pong"), "Ping").unwrap();

        for method in ["GET", "POST", "DELETE", "PATCH", "options"] {
            let m = router.match_request(method, "/ping").unwrap();
            assert_eq!(m.entry.method(), "*");
        }

        // Only one wildcard route per path.
        assert!(router.any("/ping/", ok("again"), "Again").is_err());
        // A concrete method on the same path is a different key.
        assert!(router.get("/ping", ok("get"), "Get").is_ok());
    }

    #[test]
    fn test_placeholders_capture_params() {
        let mut router = Router::without_help();
        router
            .get(r"/users/(\d+)/tags/(\w+)", ok("tag"), "User tag")
            .unwrap();

        let m = router.match_request("GET", "/users/42/tags/rust").unwrap();
        assert_eq!(m.params, vec!["42".to_string(), "rust".to_string()]);

        assert!(router.match_request("GET", "/users/x/tags/rust").is_none());
    }

    #[test]
    fn test_first_registered_wins() {
        let mut router = Router::without_help();
        router.get(r"/items/(\d+)", ok("by-id"), "By id").unwrap();
        router.get("/items/.*", ok("catch-all"), "Catch all").unwrap();

        let m = router.match_request("GET", "/items/5").unwrap();
        assert_eq!(m.entry.path(), r"/items/(\d+)");

        let m = router.match_request("GET", "/items/abc").unwrap();
        assert_eq!(m.entry.path(), "/items/.*");
    }

    #[test]
    fn test_alternation_stays_anchored() {
        let mut router = Router::without_help();
        router.get("/a|/b", ok("ab"), "A or B").unwrap();

        assert!(router.match_key("GET /a").is_some());
        assert!(router.match_key("GET /b").is_some());
        assert!(router.match_key("POST /b").is_none());
        assert!(router.match_key("GET /abc/zzz").is_none());
    }

    #[test]
    fn test_unmatched_is_none() {
        let router = Router::without_help();
        assert!(router.match_key("GET /nothing").is_none());
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let mut router = Router::without_help();
        let err = router.get("/bad/(", ok("x"), "Bad").unwrap_err();
        assert!(matches!(err, Error::PatternCompile { .. }));
        assert!(router.is_empty());
    }

    #[test]
    fn test_invalid_shape_rejected() {
        let mut router = Router::without_help();
        let bad = ShapeDescriptor {
            name: String::new(),
            fields: Vec::new(),
        };
        let err = router
            .add("GET", "/x", ok("x"), "X", vec![bad], Vec::new())
            .unwrap_err();
        assert!(matches!(err, Error::Descriptor { .. }));
        assert!(router.is_empty());
    }

    #[test]
    fn test_cyclic_shapes_rejected() {
        let mut router = Router::without_help();
        let a = shape("t::A", Some("t::B"));
        let b = shape("t::B", Some("t::A"));
        let err = router
            .add("GET", "/x", ok("x"), "X", vec![a, b], Vec::new())
            .unwrap_err();
        assert!(matches!(err, Error::ShapeCycle { .. }));
        assert!(router.is_empty());
        // The key stays free after a rejected registration.
        assert!(router.get("/x", ok("x"), "X").is_ok());
    }

    #[test]
    fn test_undocumented_route_is_hidden() {
        let mut router = Router::new();
        router.get("/secret", ok("s"), "-").unwrap();

        assert!(router.match_request("GET", "/secret").is_some());
        assert!(!router.help_text().contains("/secret"));
        assert!(!router.help_json().contains("/secret"));
        assert!(router.help_text().contains("Call: GET /mgmt/help\n"));
    }

    #[test]
    fn test_all_undocumented() {
        let mut router = Router::without_help();
        router.get("/a", ok("a"), "-").unwrap();
        router.post("/b", ok("b"), "-").unwrap();
        assert_eq!(router.help_json(), "[]");
        assert_eq!(router.help_text(), "");
    }

    #[test]
    fn test_comment_includes_shapes() {
        let mut router = Router::without_help();
        router
            .add(
                "POST",
                "/users",
                ok("u"),
                "Create user",
                vec![shape("t::New", None)],
                vec![shape("t::User", None)],
            )
            .unwrap();

        let entry = router.route("POST", "/users").unwrap();
        assert!(entry.comment.starts_with("Create user\n  Request structures:\n"));
        assert!(entry.comment.contains("    Structure t::New\n      id(i64)\n"));
        assert!(entry.comment.contains("\n  Response structures:\n    Structure t::User\n"));

        let json: serde_json::Value =
            serde_json::from_str(entry.json_help.as_deref().unwrap()).unwrap();
        assert_eq!(json["description"], "Create user");
        assert_eq!(json["input_structs"][0]["name"], "t::New");
        assert_eq!(json["output_structs"][0]["name"], "t::User");
    }
}

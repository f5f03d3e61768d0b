//! # Route Metadata
//!
//! Route keys, path patterns and the immutable entry stored per route.
//!
//! A declared path is a regex fragment. Two placeholder tokens are
//! recognized and rewritten into capturing groups:
//!
//! - `(\d+)` matches one or more ASCII digits
//! - `(\w+)` matches one or more ASCII letters

use crate::error::{Error, Result};
use crate::server::Handler;
use regex::Regex;
use std::fmt;

/// Method token that matches any request method
pub const ANY_METHOD: &str = "*";

/// Digits placeholder as written in a route pattern
pub const DIGITS_TOKEN: &str = r"(\d+)";

/// Word placeholder as written in a route pattern
pub const WORD_TOKEN: &str = r"(\w+)";

const DIGITS_CLASS: &str = "([0-9]+)";
const WORD_CLASS: &str = "([a-zA-Z]+)";
const ANY_METHOD_CLASS: &str = "[^ ]+";

/// Built-in documentation views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpFormat {
    /// Indented plain-text listing
    Text,
    /// JSON array of route comments
    Json,
}

/// What runs when a route matches
#[derive(Clone)]
pub enum Endpoint {
    /// User-supplied handler
    Handler(Handler),
    /// Documentation rendered from the route table
    Help(HelpFormat),
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handler(_) => f.write_str("Handler(..)"),
            Self::Help(format) => f.debug_tuple("Help").field(format).finish(),
        }
    }
}

/// Normalized method and path identifying a route
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteKey {
    /// Uppercase method or `*`
    pub method: String,
    /// Path without trailing slash
    pub path: String,
}

impl RouteKey {
    /// Normalize a method and path into a key
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            method: normalize_method(method),
            path: normalize_path(path).to_string(),
        }
    }

    /// Composite key string `path + " " + method`, used for ordering
    #[must_use]
    pub fn composite(&self) -> String {
        format!("{} {}", self.path, self.method)
    }

    /// Whether this key uses the wildcard method
    #[must_use]
    pub fn is_any_method(&self) -> bool {
        self.method == ANY_METHOD
    }

    /// Anchored matcher source for this key
    ///
    /// `GET /users/(\d+)` becomes `^(?:GET) (?:/users/([0-9]+))$`. The
    /// groups keep alternations in the path inside the anchors.
    #[must_use]
    pub fn matcher_pattern(&self) -> String {
        let method = if self.is_any_method() {
            ANY_METHOD_CLASS
        } else {
            self.method.as_str()
        };
        let path = self
            .path
            .replace(DIGITS_TOKEN, DIGITS_CLASS)
            .replace(WORD_TOKEN, WORD_CLASS);
        format!("^(?:{method}) (?:{path})$")
    }

    /// Compile the matcher for this key
    ///
    /// # Errors
    ///
    /// Returns `Error::PatternCompile` if the path is not a valid regex fragment.
    pub fn compile(&self) -> Result<Regex> {
        let pattern = self.matcher_pattern();
        Regex::new(&pattern).map_err(|source| Error::PatternCompile { pattern, source })
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Uppercase a method, keeping `*` as is
#[must_use]
pub fn normalize_method(method: &str) -> String {
    method.trim().to_ascii_uppercase()
}

/// Strip trailing slashes from a path
#[must_use]
pub fn normalize_path(path: &str) -> &str {
    path.trim_end_matches('/')
}

/// Lookup key for an inbound request: `METHOD path`
///
/// The path is taken literally; no placeholder rewriting applies.
#[must_use]
pub fn request_key(method: &str, path: &str) -> String {
    format!("{} {}", normalize_method(method), normalize_path(path))
}

/// A registered route
///
/// Created once by `Router::add` and never modified afterwards.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    /// Normalized key
    pub key: RouteKey,
    /// Compiled matcher
    pub matcher: Regex,
    /// What to run on match
    pub endpoint: Endpoint,
    /// Comment text with appended shape listings
    pub comment: String,
    /// Serialized `CommentPayload`, `None` for undocumented routes
    pub json_help: Option<String>,
}

impl RouteEntry {
    /// Whether the route shows up in the documentation
    #[must_use]
    pub const fn is_documented(&self) -> bool {
        self.json_help.is_some()
    }

    /// Method as registered (uppercase or `*`)
    #[must_use]
    pub fn method(&self) -> &str {
        &self.key.method
    }

    /// Path as registered, without trailing slash
    #[must_use]
    pub fn path(&self) -> &str {
        &self.key.path
    }
}

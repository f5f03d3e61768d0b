//! # autodoc Core
//!
//! A small HTTP route table that documents itself.
//!
//! Routes are registered with a comment and the shapes of their request
//! and response bodies. The router keeps a text and a JSON rendering of
//! that documentation and serves both under `/mgmt/help`.
//!
//! ## Modules
//!
//! - `shape` - Shape descriptors, the `Describe` and `FieldType` traits
//! - `link` - Folding referenced shapes into their parents
//! - `route` - Route keys, matchers and entries
//! - `router` - Route table: registration and matching
//! - `docs` - Comment payloads and the text/JSON documentation views
//! - `server` - HTTP front door built on Hyper
//! - `request` - HTTP request wrapper with headers and query parsing
//! - `config` - Server configuration and environment overrides
//! - `telemetry` - Tracing subscriber setup
//! - `error` - Error types and handling
//!
//! ## Example
//!
//! ```ignore
//! use autodoc_core::{handler, shape_of, Describe, Response, Router, Server};
//!
//! #[derive(Describe)]
//! struct User {
//!     #[describe(description = "unique id")]
//!     id: i64,
//! }
//!
//! let mut router = Router::new();
//! router.add(
//!     "GET",
//!     r"/users/(\d+)",
//!     handler(|req| async move { Response::text(req.params.join(",")) }),
//!     "Fetch a user",
//!     Vec::new(),
//!     vec![shape_of::<User>()?],
//! )?;
//! Server::new(router).serve().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

// Lets `#[derive(Describe)]` output resolve inside this crate's own tests.
extern crate self as autodoc_core;

pub mod config;
pub mod docs;
pub mod error;
pub mod link;
pub mod request;
pub mod route;
pub mod router;
pub mod server;
pub mod shape;
pub mod telemetry;

pub use autodoc_macros::Describe;
pub use config::ServerConfig;
pub use docs::{render_json, render_text, CommentPayload};
pub use error::{Error, Result};
pub use link::link_shapes;
pub use request::Request;
pub use route::{Endpoint, HelpFormat, RouteEntry, RouteKey, ANY_METHOD};
pub use router::{RouteMatch, Router};
pub use server::{handler, Handler, Response, Server};
pub use shape::{
    shape_of, Describe, FieldDescriptor, FieldSpec, FieldType, ShapeBuilder, ShapeDescriptor,
    HIDDEN,
};
pub use telemetry::{init_tracing, LogFormat};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

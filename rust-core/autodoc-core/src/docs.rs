//! # Documentation Rendering
//!
//! Builds the per-route documentation at registration time and renders the
//! text and JSON views served by the built-in help endpoints.

use crate::error::Result;
use crate::link::link_shapes;
use crate::route::{RouteEntry, RouteKey};
use crate::shape::{ShapeDescriptor, INDENT};
use serde::Serialize;
use std::fmt::Write as _;

/// Header of the request shapes section in the text view
const REQUEST_SECTION: &str = "Request structures";

/// Header of the response shapes section in the text view
const RESPONSE_SECTION: &str = "Response structures";

/// Documentation of a single route, serialized once at registration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommentPayload {
    /// Normalized method
    pub method: String,
    /// Normalized path
    pub path: String,
    /// Free-text route description
    pub description: String,
    /// Linked request shapes
    #[serde(rename = "input_structs", skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<ShapeDescriptor>,
    /// Linked response shapes
    #[serde(rename = "output_structs", skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<ShapeDescriptor>,
}

impl CommentPayload {
    /// Build the payload for `key`, linking input and output shapes
    ///
    /// # Errors
    ///
    /// Returns `Error::ShapeCycle` if either shape list is cyclic.
    pub fn new(
        key: &RouteKey,
        description: &str,
        inputs: Vec<ShapeDescriptor>,
        outputs: Vec<ShapeDescriptor>,
    ) -> Result<Self> {
        Ok(Self {
            method: key.method.clone(),
            path: key.path.clone(),
            description: description.to_string(),
            inputs: link_shapes(inputs)?,
            outputs: link_shapes(outputs)?,
        })
    }

    /// Serialize to a compact JSON object
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Append the shape listings to a route comment
#[must_use]
pub fn compose_comment(
    comment: &str,
    inputs: &[ShapeDescriptor],
    outputs: &[ShapeDescriptor],
) -> String {
    let mut text = comment.to_string();
    append_section(&mut text, REQUEST_SECTION, inputs);
    append_section(&mut text, RESPONSE_SECTION, outputs);
    text
}

fn append_section(text: &mut String, title: &str, shapes: &[ShapeDescriptor]) {
    if shapes.is_empty() {
        return;
    }
    let _ = write!(text, "\n{INDENT}{title}:\n");
    for shape in shapes {
        text.push_str(&shape.render_text(2));
        text.push('\n');
    }
}

/// Documented entries, ordered by composite key
fn documented<'a>(entries: impl IntoIterator<Item = &'a RouteEntry>) -> Vec<&'a RouteEntry> {
    let mut routes: Vec<(String, &RouteEntry)> = entries
        .into_iter()
        .filter(|e| e.is_documented())
        .map(|e| (e.key.composite(), e))
        .collect();
    routes.sort_by(|a, b| a.0.cmp(&b.0));
    routes.into_iter().map(|(_, e)| e).collect()
}

/// Plain-text listing of every documented route
///
/// Each route renders as `Call: METHOD PATH` followed by its comment, the
/// first comment line indented once and every following line twice.
pub fn render_text<'a>(entries: impl IntoIterator<Item = &'a RouteEntry>) -> String {
    let mut out = String::new();
    for entry in documented(entries) {
        let mut body = String::new();
        for (i, line) in entry.comment.split('\n').enumerate() {
            if i == 0 {
                let _ = writeln!(body, "{line}");
            } else {
                let _ = writeln!(body, "{INDENT}{line}");
            }
        }
        let _ = write!(
            out,
            "Call: {} {}\n{INDENT}{body}\n",
            entry.method(),
            entry.path()
        );
    }
    out
}

/// JSON array of every documented route's payload
///
/// Payloads are serialized at registration, so the array is assembled by
/// joining them rather than re-serializing.
pub fn render_json<'a>(entries: impl IntoIterator<Item = &'a RouteEntry>) -> String {
    let blobs: Vec<&str> = documented(entries)
        .into_iter()
        .filter_map(|e| e.json_help.as_deref())
        .collect();
    format!("[{}]", blobs.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::{Endpoint, HelpFormat};
    use crate::shape::{FieldSpec, ShapeBuilder};

    fn entry(method: &str, path: &str, comment: &str, documented: bool) -> RouteEntry {
        let key = RouteKey::new(method, path);
        let json_help = documented.then(|| {
            CommentPayload::new(&key, comment, Vec::new(), Vec::new())
                .unwrap()
                .to_json()
                .unwrap()
        });
        RouteEntry {
            matcher: key.compile().unwrap(),
            key,
            endpoint: Endpoint::Help(HelpFormat::Text),
            comment: comment.to_string(),
            json_help,
        }
    }

    fn user_shape() -> ShapeDescriptor {
        ShapeBuilder::new("demo::User")
            .field(FieldSpec::of::<i64>("id").description("unique id"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_compose_comment_lists_shapes() {
        let text = compose_comment("Create a user", &[user_shape()], &[user_shape()]);
        assert_eq!(
            text,
            "Create a user\n  Request structures:\n    Structure demo::User\n      id(i64): unique id\n\n\
             \n  Response structures:\n    Structure demo::User\n      id(i64): unique id\n\n"
        );
    }

    #[test]
    fn test_compose_comment_without_shapes() {
        assert_eq!(compose_comment("Ping", &[], &[]), "Ping");
    }

    #[test]
    fn test_render_text_sorted_and_indented() {
        let entries = vec![
            entry("POST", "/b", "Second\nmore", true),
            entry("GET", "/a", "First", true),
        ];
        assert_eq!(
            render_text(&entries),
            "Call: GET /a\n  First\n\nCall: POST /b\n  Second\n  more\n\n"
        );
    }

    #[test]
    fn test_render_skips_undocumented() {
        let entries = vec![
            entry("GET", "/a", "First", true),
            entry("GET", "/hidden", "-", false),
        ];
        assert!(!render_text(&entries).contains("/hidden"));
        assert!(!render_json(&entries).contains("/hidden"));
    }

    #[test]
    fn test_render_json_array() {
        let entries = vec![entry("GET", "/b", "B", true), entry("GET", "/a", "A", true)];
        let json: serde_json::Value = serde_json::from_str(&render_json(&entries)).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"method": "GET", "path": "/a", "description": "A"},
                {"method": "GET", "path": "/b", "description": "B"}
            ])
        );
    }

    #[test]
    fn test_empty_documentation() {
        let entries = vec![entry("GET", "/hidden", "-", false)];
        assert_eq!(render_json(&entries), "[]");
        assert_eq!(render_text(&entries), "");
        assert_eq!(render_json(std::iter::empty::<&RouteEntry>()), "[]");
    }
}

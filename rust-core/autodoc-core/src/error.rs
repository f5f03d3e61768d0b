//! # Error Handling
//!
//! Centralized error types for autodoc core.
//! Uses `thiserror` for ergonomic error definitions.

use thiserror::Error;

/// Result type alias for autodoc operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the route table, shape builder and server
#[derive(Error, Debug)]
pub enum Error {
    /// Server failed to bind to the specified address
    #[error("Failed to bind server to {address}: {source}")]
    BindError {
        /// The address we tried to bind to
        address: String,
        /// The underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// A route with the same method and path is already registered
    #[error("Can't add route {method} {path}: not unique")]
    DuplicateRoute {
        /// Normalized method (uppercase or `*`)
        method: String,
        /// Normalized path
        path: String,
    },

    /// The matcher derived from a route pattern is not a valid regex
    #[error("Invalid route pattern: {pattern}: {source}")]
    PatternCompile {
        /// The derived matcher pattern
        pattern: String,
        /// Regex compiler error
        #[source]
        source: regex::Error,
    },

    /// A shape description is malformed
    #[error("Invalid shape {shape}: {reason}")]
    Descriptor {
        /// Name of the offending shape
        shape: String,
        /// What is wrong with it
        reason: String,
    },

    /// Declared shapes reference each other in a loop
    #[error("Cyclic shape reference: {}", path.join(" -> "))]
    ShapeCycle {
        /// Shape names along the cycle, first name repeated at the end
        path: Vec<String>,
    },

    /// HTTP protocol error
    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration value could not be parsed
    #[error("Invalid configuration {key}: {reason}")]
    Config {
        /// Environment key
        key: String,
        /// Reason for rejection
        reason: String,
    },

    /// Request payload too large
    #[error("Payload too large: limit={limit} bytes")]
    PayloadTooLarge {
        /// Max allowed size
        limit: usize,
    },
}

impl Error {
    /// Build a descriptor error for `shape`
    pub fn descriptor(shape: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Descriptor {
            shape: shape.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_route_error() {
        let err = Error::DuplicateRoute {
            method: "GET".to_string(),
            path: "/users".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("GET /users"));
        assert!(msg.contains("not unique"));
    }

    #[test]
    fn test_shape_cycle_error() {
        let err = Error::ShapeCycle {
            path: vec!["a::A".to_string(), "a::B".to_string(), "a::A".to_string()],
        };
        assert_eq!(err.to_string(), "Cyclic shape reference: a::A -> a::B -> a::A");
    }

    #[test]
    fn test_bind_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use");
        let err = Error::BindError {
            address: "0.0.0.0:8000".to_string(),
            source: io_err,
        };
        assert!(err.to_string().contains("0.0.0.0:8000"));
    }

    #[test]
    fn test_descriptor_helper() {
        let err = Error::descriptor("demo::User", "empty field name");
        assert!(matches!(err, Error::Descriptor { .. }));
        assert!(err.to_string().contains("demo::User"));
    }
}

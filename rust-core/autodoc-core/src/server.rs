//! # HTTP Server
//!
//! Front door of the route table, built on Hyper and Tokio.
//!
//! ## Request flow
//!
//! 1. The request method and path form the lookup key (`METHOD path`,
//!    method uppercased, trailing slash stripped).
//! 2. The router returns the first matching route, or the server answers
//!    `404`.
//! 3. Capture groups are stored in `Request::params` and the route's
//!    endpoint runs: a user handler, or one of the help views.

use crate::config::ServerConfig;
use crate::error::{Error, Result};
use crate::request::Request;
use crate::route::{request_key, Endpoint, HelpFormat};
use crate::router::Router;
use http_body_util::Full;
pub use hyper::body::Bytes;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::StatusCode;
use hyper_util::rt::TokioIo;
use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// HTTP response produced by handlers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: String,
    /// Content type
    pub content_type: String,
    /// Response headers
    pub headers: HashMap<String, String>,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: 200,
            body: String::new(),
            content_type: "text/plain; charset=utf-8".to_string(),
            headers: HashMap::new(),
        }
    }
}

impl Response {
    /// Create a JSON response
    #[must_use]
    pub fn json(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            content_type: "application/json".to_string(),
            ..Self::default()
        }
    }

    /// Create a text response
    #[must_use]
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    /// Plain-text `404`
    #[must_use]
    pub fn not_found() -> Self {
        Self::text("404 page not found\n").with_status(404)
    }

    /// Set status code
    #[must_use]
    pub const fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Set header
    #[must_use]
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.set_header(key, value);
        self
    }

    /// Set or override a header
    pub fn set_header(&mut self, key: &str, value: &str) {
        if key.eq_ignore_ascii_case("content-type") {
            self.content_type = value.to_string();
        } else {
            self.headers.insert(key.to_string(), value.to_string());
        }
    }

    /// Convert to hyper Response
    fn into_hyper(self) -> hyper::Response<Full<Bytes>> {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut builder = hyper::Response::builder()
            .status(status)
            .header("Content-Type", &self.content_type);
        for (k, v) in &self.headers {
            builder = builder.header(k.as_str(), v.as_str());
        }

        builder
            .body(Full::new(Bytes::from(self.body)))
            .unwrap_or_else(|err| {
                error!("Failed to build response: {}", err);
                let mut fallback = hyper::Response::new(Full::new(Bytes::from(
                    "Internal Server Error",
                )));
                *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                fallback
            })
    }
}

/// Handler function type (async)
pub type Handler =
    Arc<dyn Fn(Request) -> Pin<Box<dyn Future<Output = Response> + Send>> + Send + Sync>;

/// Wrap an async function or closure into a [`Handler`]
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(move |req| Box::pin(f(req)))
}

/// HTTP server serving a route table
///
/// The router is moved in and shared read-only between connections.
pub struct Server {
    config: ServerConfig,
    router: Arc<Router>,
}

impl Server {
    /// Create a server with default configuration
    #[must_use]
    pub fn new(router: Router) -> Self {
        Self::with_config(router, ServerConfig::default())
    }

    /// Create a server with the given configuration
    #[must_use]
    pub fn with_config(router: Router, config: ServerConfig) -> Self {
        Self {
            config,
            router: Arc::new(router),
        }
    }

    /// Bind the server to an address
    #[must_use]
    pub const fn bind(mut self, addr: SocketAddr) -> Self {
        self.config.address = addr;
        self
    }

    /// The served route table
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Start the server with graceful shutdown
    ///
    /// # Errors
    ///
    /// Returns `Error::BindError` if the address cannot be bound, or an IO
    /// error if accepting connections fails.
    pub async fn serve(&self) -> Result<()> {
        let addr = self.config.address;

        let socket = if addr.is_ipv4() {
            tokio::net::TcpSocket::new_v4()?
        } else {
            tokio::net::TcpSocket::new_v6()?
        };
        socket.set_reuseaddr(true)?;
        socket.bind(addr).map_err(|source| Error::BindError {
            address: addr.to_string(),
            source,
        })?;

        let listener = socket.listen(1024)?;

        info!("Server listening on http://{}", addr);

        let active = Arc::new(AtomicUsize::new(0));
        let max_body_size = self.config.max_body_size;
        let keep_alive = self.config.keep_alive;

        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    let (stream, remote_addr) = accept_result?;
                    let io = TokioIo::new(stream);

                    let router = self.router.clone();
                    let connection = ConnectionGuard::new(active.clone());

                    tokio::task::spawn(async move {
                        let _connection = connection;
                        let service = service_fn(move |req| {
                            let router = router.clone();
                            async move {
                                let method = req.method().clone();
                                let path = req.uri().path().to_string();
                                let version = req.version();

                                let resp = handle_request(req, &router, remote_addr, max_body_size).await;
                                info!("    {} - \"{} {} {:?}\" {}",
                                    remote_addr,
                                    method,
                                    path,
                                    version,
                                    resp.status()
                                );
                                Ok::<_, hyper::Error>(resp)
                            }
                        });

                        if let Err(err) = http1::Builder::new()
                            .keep_alive(keep_alive)
                            .serve_connection(io, service)
                            .await
                        {
                            error!(error = %Error::from(err), "Error serving connection");
                        }
                    });
                }
                () = shutdown_signal() => {
                    info!("Shutdown signal received, stopping server...");
                    break;
                }
            }
        }

        let drain = async {
            while active.load(Ordering::Relaxed) > 0 {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        };
        if tokio::time::timeout(self.config.shutdown_timeout, drain)
            .await
            .is_err()
        {
            info!(
                active = active.load(Ordering::Relaxed),
                "Shutdown timeout reached with open connections"
            );
        }
        Ok(())
    }

    /// Run one request through the router (network agnostic)
    pub async fn process(&self, req: Request) -> Response {
        process_request(req, &self.router).await
    }

    /// Execute a test request directly without network stack
    pub async fn test_request(
        &self,
        method: &str,
        path: &str,
        headers: HashMap<String, String>,
        body: Option<Bytes>,
    ) -> Response {
        if body
            .as_ref()
            .is_some_and(|b| b.len() > self.config.max_body_size)
        {
            return Response::text("Payload Too Large").with_status(413);
        }
        let mut req = Request::new(method, path, headers, body);
        req.set_header("x-client-ip", "test");
        self.process(req).await
    }
}

/// Counts an open connection from accept until the guard is dropped
struct ConnectionGuard {
    active: Arc<AtomicUsize>,
}

impl ConnectionGuard {
    fn new(active: Arc<AtomicUsize>) -> Self {
        active.fetch_add(1, Ordering::Relaxed);
        Self { active }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::Relaxed);
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to install CTRL+C signal handler: {}", err);
        std::future::pending::<()>().await;
    }
}

/// Core request processing logic (network agnostic)
async fn process_request(mut req: Request, router: &Router) -> Response {
    let request_id = match req.header("x-request-id") {
        Some(id) => id.to_string(),
        None => {
            let id = generate_request_id();
            req.set_header("x-request-id", &id);
            id
        }
    };

    let key = request_key(&req.method, &req.path);
    let mut response = match router.match_key(&key) {
        None => Response::not_found(),
        Some(matched) => {
            req.params = matched.params;
            match &matched.entry.endpoint {
                Endpoint::Handler(handler) => handler(req).await,
                Endpoint::Help(HelpFormat::Text) => Response::text(router.help_text()),
                Endpoint::Help(HelpFormat::Json) => Response::json(router.help_json()),
            }
        }
    };

    response.set_header("x-request-id", &request_id);
    response
}

async fn handle_request(
    req: hyper::Request<hyper::body::Incoming>,
    router: &Router,
    remote_addr: SocketAddr,
    max_body_size: usize,
) -> hyper::Response<Full<Bytes>> {
    let mut request = match Request::from_hyper_with_limit(req, max_body_size).await {
        Ok(r) => r,
        Err(Error::PayloadTooLarge { limit }) => {
            info!(limit, "Rejected oversized request body");
            return Response::text("Payload Too Large")
                .with_status(413)
                .into_hyper();
        }
        Err(e) => {
            error!("Failed to parse request: {}", e);
            return Response::text("Bad Request").with_status(400).into_hyper();
        }
    };

    request.set_header("x-client-ip", &remote_addr.ip().to_string());
    process_request(request, router).await.into_hyper()
}

static REQUEST_COUNTER: AtomicUsize = AtomicUsize::new(1);

fn generate_request_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let counter = REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{:x}-{:x}", now.as_nanos(), counter)
}

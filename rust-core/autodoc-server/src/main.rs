//! # autodoc Server
//!
//! Demo management service. Registers a small user registry on the route
//! table and serves it together with the generated documentation under
//! `/mgmt/help`.
//!
//! Configuration comes from `AUTODOC__SERVER__*` environment variables,
//! the log format from `AUTODOC_LOG_FORMAT` (`pretty` or `json`).

use anyhow::Context;
use autodoc_core::{
    handler, init_tracing, shape_of, Describe, LogFormat, Request, Response, Router, Server,
    ServerConfig,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Environment variable selecting the log format
const LOG_FORMAT_VAR: &str = "AUTODOC_LOG_FORMAT";

/// Contact details attached to a user
#[derive(Debug, Clone, Serialize, Deserialize, Describe)]
struct Contact {
    /// Email address
    email: String,
    #[serde(default)]
    #[describe(description = "Phone numbers")]
    phones: Vec<String>,
}

/// A registered user
#[derive(Debug, Clone, Serialize, Describe)]
struct User {
    #[describe(description = "Unique number", required)]
    id: u64,
    #[describe(description = "Display name", required)]
    name: String,
    #[describe(description = "How to reach the user")]
    contact: Contact,
}

/// Body of `POST /users`
#[derive(Debug, Deserialize, Describe)]
struct NewUser {
    #[describe(description = "Display name", required)]
    name: String,
    #[describe(description = "How to reach the user", required)]
    contact: Contact,
}

/// Error body
#[allow(dead_code)]
#[derive(Debug, Serialize, Describe)]
struct Problem {
    #[describe(description = "What went wrong")]
    error: String,
}

type Users = Arc<RwLock<BTreeMap<u64, User>>>;

fn problem(status: u16, message: &str) -> Response {
    let body = serde_json::json!({ "error": message }).to_string();
    Response::json(body).with_status(status)
}

fn to_json<T: Serialize>(value: &T) -> Response {
    match serde_json::to_string(value) {
        Ok(body) => Response::json(body),
        Err(err) => problem(500, &err.to_string()),
    }
}

async fn list_users(users: Users) -> Response {
    let users = users.read().await;
    let all: Vec<&User> = users.values().collect();
    to_json(&all)
}

async fn get_user(users: Users, req: Request) -> Response {
    let Some(id) = req.param(0).and_then(|p| p.parse::<u64>().ok()) else {
        return problem(400, "invalid user id");
    };
    match users.read().await.get(&id) {
        Some(user) => to_json(user),
        None => problem(404, "user not found"),
    }
}

async fn create_user(users: Users, req: Request) -> Response {
    let Some(body) = req.body_str() else {
        return problem(400, "missing body");
    };
    let new_user: NewUser = match serde_json::from_str(body) {
        Ok(new_user) => new_user,
        Err(err) => return problem(400, &err.to_string()),
    };

    let mut users = users.write().await;
    let id = users.keys().next_back().map_or(1, |last| last + 1);
    let user = User {
        id,
        name: new_user.name,
        contact: new_user.contact,
    };
    info!(id, name = %user.name, "User created");
    let response = to_json(&user).with_status(201);
    users.insert(id, user);
    response
}

async fn delete_user(users: Users, req: Request) -> Response {
    let Some(id) = req.param(0).and_then(|p| p.parse::<u64>().ok()) else {
        return problem(400, "invalid user id");
    };
    match users.write().await.remove(&id) {
        Some(_) => Response::default().with_status(204),
        None => problem(404, "user not found"),
    }
}

fn build_router(users: &Users) -> anyhow::Result<Router> {
    let mut router = Router::new();

    let store = users.clone();
    router.add(
        "GET",
        "/users",
        handler(move |_req| list_users(store.clone())),
        "List all users",
        Vec::new(),
        vec![shape_of::<User>()?, shape_of::<Contact>()?],
    )?;

    let store = users.clone();
    router.add(
        "GET",
        r"/users/(\d+)",
        handler(move |req| get_user(store.clone(), req)),
        "Fetch one user by number",
        Vec::new(),
        vec![
            shape_of::<User>()?,
            shape_of::<Contact>()?,
            shape_of::<Problem>()?,
        ],
    )?;

    let store = users.clone();
    router.add(
        "POST",
        "/users",
        handler(move |req| create_user(store.clone(), req)),
        "Register a user",
        vec![shape_of::<NewUser>()?, shape_of::<Contact>()?],
        vec![
            shape_of::<User>()?,
            shape_of::<Contact>()?,
            shape_of::<Problem>()?,
        ],
    )?;

    let store = users.clone();
    router.add(
        "DELETE",
        r"/users/(\d+)",
        handler(move |req| delete_user(store.clone(), req)),
        "Remove a user",
        Vec::new(),
        vec![shape_of::<Problem>()?],
    )?;

    router.any(
        "/mgmt/ping",
        handler(|req| async move { Response::text(format!("pong {}\n", req.method)) }),
        "Liveness probe, any method",
    )?;

    router.get(
        "/mgmt/version",
        handler(|_req| async { Response::text(format!("{}\n", autodoc_core::VERSION)) }),
        "-",
    )?;

    Ok(router)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let format = std::env::var(LOG_FORMAT_VAR)
        .map(|name| LogFormat::from_name(&name))
        .unwrap_or_default();
    init_tracing(format);

    let config = ServerConfig::from_env().context("invalid server configuration")?;
    let users: Users = Arc::default();
    let router = build_router(&users)?;
    info!(routes = router.len(), "Route table ready");

    Server::with_config(router, config)
        .serve()
        .await
        .context("server stopped with an error")?;
    Ok(())
}

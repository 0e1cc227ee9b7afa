//! API Module
//!
//! HTTP surface over a shared cache, for diagnostics and out-of-process use.
//!
//! # Endpoints
//! - `PUT /set` - Store a JSON value
//! - `GET /get/:key` - Retrieve a value by key
//! - `DELETE /del/:key` - Remove a key
//! - `DELETE /clear` - Remove every key of the cache
//! - `POST /sweep` - Run a maintenance sweep
//! - `GET /stats` - Diagnostic snapshot
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;

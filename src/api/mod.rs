//! API Module
//!
//! HTTP handlers and routing for the cache REST API.
//!
//! # Endpoints
//! - `PUT /entries/:key` - Store a payload
//! - `GET /entries/:key` - Retrieve a payload
//! - `DELETE /entries/:key` - Remove a key
//! - `POST /entries/:key/refresh` - Renew a key's lifetime
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;

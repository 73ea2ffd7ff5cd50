//! API Module
//!
//! HTTP handlers and routing for the request cache REST API.
//!
//! # Endpoints
//! - `PUT /cache` - Cache a request result
//! - `DELETE /cache` - Drop a cached request result
//! - `POST /cache/lookup` - Read a cached request result
//! - `POST /cache/clear` - Empty the cache
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;

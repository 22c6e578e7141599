//! # Sabia Gateway
//! HTTP ingestion endpoint. The webhook only parses and enqueues; replies
//! are produced by the worker pool.
//!
//! Routes: `GET /`, `GET /health`, `POST /webhook`.

pub mod routes;
pub mod server;

pub use server::{AppState, build_router, start};

//! # AskLyn Gateway
//!
//! HTTP API and browser page for the AskLyn demo.
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `GET /` | chat page |
//! | `POST /chat` | retrieve + compose a reply |
//! | `POST /upload` | append a text file to the knowledge base |
//! | `GET /health` | liveness |
//! | `GET /api/v1/knowledge/stats` | document count |
//! | `POST /api/v1/knowledge/search` | scored retrieval |

pub mod dashboard;
pub mod error;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use server::{AppState, build_router, start};

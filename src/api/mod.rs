//! API Module
//!
//! HTTP handlers and routing for the admin surface of the state layer.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /stores` - Stats of every store
//! - `GET /stores/:name/snapshot` - Snapshot of one store
//! - `DELETE /stores/:name/entries/:key` - Invalidate a key
//! - `POST /stores/:name/refresh` - Refresh a key or a whole store
//! - `POST /stores/clear` - Clear every store
//! - `POST /events/content-published` - Content-change signal
//! - Read-through: `/catalog/:category`, `/games/:slug`, `/seo/:category`, `/site`, `/home`

pub mod handlers;
pub mod requests;
pub mod responses;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;

//! ebag API - HTTP demo surface
//!
//! Serves demo records through the cache-aside accessor, wraps every
//! outcome in a [`ebag_core::ResultEnvelope`], and offers JSONP delivery
//! for legacy cross-origin callers.

pub mod config;
pub mod error;
pub mod response;
pub mod routes;
pub mod state;
pub mod telemetry;

pub use config::{ApiConfig, LogFormat};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use response::{Envelope, JsonpResponse};
pub use routes::{build_router, create_api_router};
pub use state::{ApiCache, AppState};

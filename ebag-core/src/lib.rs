//! ebag Core - envelope, JSONP and error types
//!
//! Shared vocabulary for the ebag workspace:
//! - [`ResultEnvelope`], the uniform success/failure wrapper every request
//!   handler returns
//! - [`jsonp`] rendering plus the opt-in [`CallbackName`] validator
//! - The error taxonomy used by the cache and record-store layers
//! - Demo entities served by the system of record

pub mod entities;
pub mod envelope;
pub mod error;
pub mod jsonp;

pub use entities::{Demo, User};
pub use envelope::{ResultEnvelope, DEFAULT_FAIL_MESSAGE, DEFAULT_OK_MESSAGE};
pub use error::{
    CacheError, ConfigError, EbagError, EbagResult, EnvelopeError, StorageError,
};
pub use jsonp::{jsonp, CallbackName, JSONP_CONTENT_TYPE, MAX_CALLBACK_LEN};

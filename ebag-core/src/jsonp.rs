//! JSONP rendering for legacy cross-origin callback delivery.
//!
//! [`jsonp`] emits the callback name verbatim into executable script text.
//! It does not sanitize it: a caller forwarding a request parameter must
//! check it first, e.g. with [`CallbackName::parse`].

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::error::EnvelopeError;

/// Content type for JSONP responses.
pub const JSONP_CONTENT_TYPE: &str = "application/javascript;charset=UTF-8";

/// Longest callback name [`CallbackName::parse`] accepts, in bytes.
pub const MAX_CALLBACK_LEN: usize = 128;

/// Dot-separated JavaScript identifiers, e.g. `jQuery1124_1` or `app.onData`.
static CALLBACK_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*(\.[A-Za-z_$][A-Za-z0-9_$]*)*$")
        .expect("callback pattern is a valid regex")
});

/// Render `callback(<json payload>)`.
pub fn jsonp<P: Serialize + ?Sized>(callback: &str, payload: &P) -> Result<String, EnvelopeError> {
    let body = serde_json::to_string(payload)?;
    let mut out = String::with_capacity(callback.len() + body.len() + 2);
    out.push_str(callback);
    out.push('(');
    out.push_str(&body);
    out.push(')');
    Ok(out)
}

/// A callback name that is safe to emit into script text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallbackName(String);

impl CallbackName {
    pub fn parse(name: impl Into<String>) -> Result<Self, EnvelopeError> {
        let name = name.into();
        if name.is_empty() {
            return Err(EnvelopeError::InvalidCallback {
                callback: name,
                reason: "must not be empty".to_string(),
            });
        }
        if name.len() > MAX_CALLBACK_LEN {
            return Err(EnvelopeError::InvalidCallback {
                reason: format!("longer than {} bytes", MAX_CALLBACK_LEN),
                callback: name,
            });
        }
        if !CALLBACK_PATTERN.is_match(&name) {
            return Err(EnvelopeError::InvalidCallback {
                callback: name,
                reason: "must be a dot-separated JavaScript identifier".to_string(),
            });
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Render `payload` wrapped in this callback.
    pub fn wrap<P: Serialize + ?Sized>(&self, payload: &P) -> Result<String, EnvelopeError> {
        jsonp(&self.0, payload)
    }
}

impl AsRef<str> for CallbackName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallbackName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//! Uniform result envelope returned by request handlers.
//!
//! Every handler outcome is carried as a [`ResultEnvelope`], so the transport
//! always serializes the same flat shape:
//!
//! ```text
//! {"success": true, "message": "success", "data": {...}, "code": 1024}
//! ```
//!
//! `data` and `code` are omitted when absent.
//!
//! The same logical operation may carry a different `data` shape depending on
//! the outcome, e.g. a found entity on success and a diagnostic string on
//! failure. The two variants therefore have independent data types, `T` for
//! success and `F` for failure, and `success` is the discriminant a consumer
//! must check before interpreting `data`.

use std::fmt;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Default message for successful envelopes.
pub const DEFAULT_OK_MESSAGE: &str = "success";

/// Default message for failed envelopes.
pub const DEFAULT_FAIL_MESSAGE: &str = "fail";

/// Success/failure carrier for a single response.
///
/// Construct with the `ok*` and `fail*` functions; the value is immutable
/// afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultEnvelope<T, F = String> {
    /// `success = true`.
    Ok {
        message: String,
        data: Option<T>,
        code: Option<i32>,
    },
    /// `success = false`.
    Fail {
        message: String,
        data: Option<F>,
        code: Option<i32>,
    },
}

impl<T, F> ResultEnvelope<T, F> {
    // ========================================================================
    // Success constructors
    // ========================================================================

    /// Success with the default message and no data.
    pub fn ok() -> Self {
        Self::ok_message(DEFAULT_OK_MESSAGE, None)
    }

    /// Success with the default message.
    pub fn ok_data(data: T) -> Self {
        Self::ok_message(DEFAULT_OK_MESSAGE, Some(data))
    }

    /// Success with a custom message.
    pub fn ok_message(message: impl Into<String>, data: impl Into<Option<T>>) -> Self {
        Self::Ok {
            message: message.into(),
            data: data.into(),
            code: None,
        }
    }

    /// Success with a custom message and a status code.
    pub fn ok_with_code(
        message: impl Into<String>,
        data: impl Into<Option<T>>,
        code: impl Into<Option<i32>>,
    ) -> Self {
        Self::Ok {
            message: message.into(),
            data: data.into(),
            code: code.into(),
        }
    }

    // ========================================================================
    // Failure constructors
    // ========================================================================

    /// Failure with the default message and no data.
    pub fn fail() -> Self {
        Self::fail_message(DEFAULT_FAIL_MESSAGE, None)
    }

    /// Failure with the default message.
    pub fn fail_data(data: F) -> Self {
        Self::fail_message(DEFAULT_FAIL_MESSAGE, Some(data))
    }

    /// Failure with a custom message.
    pub fn fail_message(message: impl Into<String>, data: impl Into<Option<F>>) -> Self {
        Self::Fail {
            message: message.into(),
            data: data.into(),
            code: None,
        }
    }

    /// Failure with a custom message and a status code.
    pub fn fail_with_code(
        message: impl Into<String>,
        data: impl Into<Option<F>>,
        code: impl Into<Option<i32>>,
    ) -> Self {
        Self::Fail {
            message: message.into(),
            data: data.into(),
            code: code.into(),
        }
    }

    /// Build an envelope from a fallible computation.
    ///
    /// `Err` values become a failure whose message is the error's display
    /// text.
    pub fn from_result<E: fmt::Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::ok_data(value),
            Err(err) => Self::fail_message(err.to_string(), None),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Ok { message, .. } | Self::Fail { message, .. } => message,
        }
    }

    pub fn code(&self) -> Option<i32> {
        match self {
            Self::Ok { code, .. } | Self::Fail { code, .. } => *code,
        }
    }

    /// Data of a successful envelope.
    pub fn ok_value(&self) -> Option<&T> {
        match self {
            Self::Ok { data, .. } => data.as_ref(),
            Self::Fail { .. } => None,
        }
    }

    /// Data of a failed envelope.
    pub fn fail_value(&self) -> Option<&F> {
        match self {
            Self::Ok { .. } => None,
            Self::Fail { data, .. } => data.as_ref(),
        }
    }
}

// ============================================================================
// WIRE FORMAT
// ============================================================================

#[derive(Serialize)]
struct WireOut<'a, D> {
    success: bool,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a D>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<i32>,
}

#[derive(Deserialize)]
struct WireIn {
    success: bool,
    message: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
    #[serde(default)]
    code: Option<i32>,
}

impl<T: Serialize, F: Serialize> Serialize for ResultEnvelope<T, F> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Ok {
                message,
                data,
                code,
            } => WireOut {
                success: true,
                message,
                data: data.as_ref(),
                code: *code,
            }
            .serialize(serializer),
            Self::Fail {
                message,
                data,
                code,
            } => WireOut {
                success: false,
                message,
                data: data.as_ref(),
                code: *code,
            }
            .serialize(serializer),
        }
    }
}

impl<'de, T: DeserializeOwned, F: DeserializeOwned> Deserialize<'de> for ResultEnvelope<T, F> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = WireIn::deserialize(deserializer)?;
        if wire.success {
            let data = wire
                .data
                .map(serde_json::from_value::<T>)
                .transpose()
                .map_err(D::Error::custom)?;
            Ok(Self::Ok {
                message: wire.message,
                data,
                code: wire.code,
            })
        } else {
            let data = wire
                .data
                .map(serde_json::from_value::<F>)
                .transpose()
                .map_err(D::Error::custom)?;
            Ok(Self::Fail {
                message: wire.message,
                data,
                code: wire.code,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Demo;
    use proptest::prelude::*;

    type DemoEnvelope = ResultEnvelope<Demo, String>;

    #[test]
    fn test_ok_defaults() {
        let env = DemoEnvelope::ok();
        assert!(env.is_success());
        assert_eq!(env.message(), "success");
        assert!(env.ok_value().is_none());
        assert!(env.code().is_none());
    }

    #[test]
    fn test_fail_defaults() {
        let env = DemoEnvelope::fail();
        assert!(!env.is_success());
        assert_eq!(env.message(), "fail");
        assert!(env.fail_value().is_none());
    }

    #[test]
    fn test_ok_with_code_keeps_fields() {
        let demo = Demo::new(123456, "Physics");
        let env = DemoEnvelope::ok_with_code("Yes", demo.clone(), 1024);
        assert!(env.is_success());
        assert_eq!(env.message(), "Yes");
        assert_eq!(env.ok_value(), Some(&demo));
        assert_eq!(env.code(), Some(1024));
        assert!(env.fail_value().is_none());
    }

    #[test]
    fn test_fail_data_carries_diagnostic() {
        let env = DemoEnvelope::fail_data("id must be positive".to_string());
        assert!(!env.is_success());
        assert_eq!(env.message(), "fail");
        assert_eq!(env.fail_value().map(String::as_str), Some("id must be positive"));
        assert!(env.ok_value().is_none());
    }

    #[test]
    fn test_from_result() {
        let ok: DemoEnvelope = ResultEnvelope::from_result(Ok::<_, String>(Demo::new(1, "Biao")));
        assert!(ok.is_success());
        assert_eq!(ok.ok_value().map(|d| d.id), Some(1));

        let failed: DemoEnvelope =
            ResultEnvelope::from_result(Err::<Demo, _>("Demo with id 9 not found"));
        assert!(!failed.is_success());
        assert_eq!(failed.message(), "Demo with id 9 not found");
    }

    #[test]
    fn test_serialization_omits_absent_fields() -> Result<(), serde_json::Error> {
        let json = serde_json::to_string(&DemoEnvelope::ok())?;
        assert_eq!(json, r#"{"success":true,"message":"success"}"#);

        let json = serde_json::to_string(&DemoEnvelope::ok_with_code(
            "Yes",
            Demo::new(123456, "Physics"),
            1024,
        ))?;
        assert_eq!(
            json,
            r#"{"success":true,"message":"Yes","data":{"id":123456,"info":"Physics"},"code":1024}"#
        );
        Ok(())
    }

    #[test]
    fn test_serialization_fail_variant_is_flat() -> Result<(), serde_json::Error> {
        let env = DemoEnvelope::fail_message("invalid", "info must not be blank".to_string());
        let json = serde_json::to_string(&env)?;
        assert_eq!(
            json,
            r#"{"success":false,"message":"invalid","data":"info must not be blank"}"#
        );
        Ok(())
    }

    #[test]
    fn test_deserialize_picks_data_type_by_success() -> Result<(), serde_json::Error> {
        let ok: DemoEnvelope =
            serde_json::from_str(r#"{"success":true,"message":"success","data":{"id":1,"info":"Biao"}}"#)?;
        assert_eq!(ok.ok_value(), Some(&Demo::new(1, "Biao")));

        let failed: DemoEnvelope =
            serde_json::from_str(r#"{"success":false,"message":"fail","data":"nope","code":404}"#)?;
        assert_eq!(failed.fail_value().map(String::as_str), Some("nope"));
        assert_eq!(failed.code(), Some(404));
        Ok(())
    }

    #[test]
    fn test_deserialize_rejects_mismatched_data() {
        let result: Result<DemoEnvelope, _> =
            serde_json::from_str(r#"{"success":true,"message":"success","data":"not a demo"}"#);
        assert!(result.is_err());
    }

    proptest! {
        /// Constructing then inspecting returns exactly what was supplied.
        #[test]
        fn prop_constructors_preserve_fields(
            message in ".{0,32}",
            data in proptest::option::of(any::<i64>()),
            code in proptest::option::of(any::<i32>()),
        ) {
            let ok = ResultEnvelope::<i64, i64>::ok_with_code(message.clone(), data, code);
            prop_assert!(ok.is_success());
            prop_assert_eq!(ok.message(), message.as_str());
            prop_assert_eq!(ok.ok_value().copied(), data);
            prop_assert_eq!(ok.code(), code);

            let failed = ResultEnvelope::<i64, i64>::fail_with_code(message.clone(), data, code);
            prop_assert!(!failed.is_success());
            prop_assert_eq!(failed.message(), message.as_str());
            prop_assert_eq!(failed.fail_value().copied(), data);
            prop_assert_eq!(failed.code(), code);
        }
    }
}

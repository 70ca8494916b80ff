//! Response bodies.

use axum::{
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use ebag_core::{CallbackName, ResultEnvelope, JSONP_CONTENT_TYPE};
use serde::Serialize;

use crate::error::ApiResult;

/// JSON envelope body.
pub type Envelope<T, F = String> = Json<ResultEnvelope<T, F>>;

/// Script body of the form `callback(<json>)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonpResponse(pub String);

impl JsonpResponse {
    /// Render `payload` for a callback that has already been validated.
    pub fn render<P: Serialize + ?Sized>(callback: &CallbackName, payload: &P) -> ApiResult<Self> {
        Ok(Self(callback.wrap(payload)?))
    }

    pub fn body(&self) -> &str {
        &self.0
    }
}

impl IntoResponse for JsonpResponse {
    fn into_response(self) -> Response {
        ([(header::CONTENT_TYPE, JSONP_CONTENT_TYPE)], self.0).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_wraps_envelope() {
        let callback = CallbackName::parse("cb").unwrap();
        let envelope: ResultEnvelope<&str> =
            ResultEnvelope::ok_message("Congratulation", "Your data object");
        let body = JsonpResponse::render(&callback, &envelope).unwrap();
        assert_eq!(
            body.body(),
            r#"cb({"success":true,"message":"Congratulation","data":"Your data object"})"#
        );
    }

    #[test]
    fn test_content_type_header() {
        let response = JsonpResponse("cb(1)".to_string()).into_response();
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            JSONP_CONTENT_TYPE
        );
    }
}

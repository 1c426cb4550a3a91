// --- File: crates/medremind_common/src/http.rs ---
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::{HttpStatusCode, MedremindError};

pub mod client;

impl IntoResponse for MedremindError {
    fn into_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = Json(json!({
            "error": {
                "message": self.to_string(),
                "code": status_code.as_u16(),
            }
        }));

        (status_code, body).into_response()
    }
}

/// Converts a `Result<T, E>` into a JSON handler result using a custom error mapper.
///
/// Handlers use this to turn crate-specific errors into `MedremindError` responses.
pub fn map_json_error<T, E, F>(result: Result<T, E>, f: F) -> Result<Json<T>, Response>
where
    T: serde::Serialize,
    F: FnOnce(E) -> MedremindError,
{
    result.map(Json).map_err(|err| f(err).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_status() {
        let response = MedremindError::ValidationError("missing user_id".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_map_json_error_passes_ok_through() {
        let result: Result<u32, String> = Ok(7);
        let mapped = map_json_error(result, MedremindError::InternalError);
        assert_eq!(mapped.ok().map(|Json(v)| v), Some(7));
    }

    #[test]
    fn test_map_json_error_maps_err() {
        let result: Result<u32, String> = Err("gateway down".to_string());
        let mapped = map_json_error(result, |e| MedremindError::ExternalServiceError {
            service_name: "expo".to_string(),
            message: e,
        });
        assert_eq!(mapped.unwrap_err().status(), StatusCode::BAD_GATEWAY);
    }
}

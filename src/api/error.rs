use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Map, Value};
use thiserror::Error;

/// Errors leaving the HTTP layer. Public responses never carry
/// internal detail; storage failures collapse to a generic 500 and the
/// specifics go to the log.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("The given data was invalid.")]
    Validation(Vec<FieldError>),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Admin API token not configured")]
    AdminTokenMissing,

    #[error("Something went wrong")]
    Internal,
}

#[derive(Debug, Clone)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl From<voteboard_core::Error> for ApiError {
    fn from(err: voteboard_core::Error) -> Self {
        match err {
            voteboard_core::Error::NotFound { entity } => Self::NotFound(entity),
            voteboard_core::Error::Validation { field, message } => {
                Self::Validation(vec![FieldError { field, message }])
            }
            other => {
                tracing::error!(error = %other, "request failed");
                Self::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Validation(errors) => {
                let mut fields: Map<String, Value> = Map::new();
                for e in errors {
                    match fields.get_mut(e.field) {
                        Some(Value::Array(messages)) => {
                            messages.push(Value::String(e.message.clone()));
                        }
                        _ => {
                            fields.insert(e.field.to_string(), json!([e.message]));
                        }
                    }
                }
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    json!({ "message": self.to_string(), "errors": fields }),
                )
            }
            Self::NotFound(_) => (StatusCode::NOT_FOUND, json!({ "message": self.to_string() })),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "message": self.to_string() }),
            ),
            Self::AdminTokenMissing | Self::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "message": self.to_string() }),
            ),
        };
        (status, Json(body)).into_response()
    }
}

/// Collects field-level failures so a response can report all of them
/// at once instead of stopping at the first.
#[derive(Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    /// Required string with a character-length window.
    pub fn length(&mut self, field: &'static str, value: &str, min: usize, max: usize) {
        let len = value.chars().count();
        if len < min {
            self.fail(field, format!("must be at least {min} characters"));
        } else if len > max {
            self.fail(field, format!("must be at most {max} characters"));
        }
    }

    /// Same window, skipped when the value is absent.
    pub fn length_opt(
        &mut self,
        field: &'static str,
        value: Option<&str>,
        min: usize,
        max: usize,
    ) {
        if let Some(value) = value {
            self.length(field, value, min, max);
        }
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self.errors))
        }
    }
}

/// `^[a-z0-9]+(-[a-z0-9]+)*$` without the regex dependency.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.split('-').all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        })
}

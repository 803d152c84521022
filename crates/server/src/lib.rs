use api_types::error::ErrorBody;
use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::IntoResponse,
};
use engine::EngineError;

pub use server::{ServerState, router, run_with_listener};

mod accounts;
mod reconciliation;
mod reports;
mod server;
mod transactions;

pub enum ServerError {
    Engine(EngineError),
    /// Request rejected before reaching the engine.
    Generic(String),
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::SourceAlreadyUsed(_)
        | EngineError::AlreadyMatched(_)
        | EngineError::ExistingKey(_) => StatusCode::CONFLICT,
        EngineError::InvalidTarget(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::PersistenceFailure(_) | EngineError::Database(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

fn message_for_engine_error(err: &EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "storage unavailable, retry later".to_string()
        }
        EngineError::PersistenceFailure(reason) => {
            tracing::error!("persistence failure: {reason}");
            "storage unavailable, retry later".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            ServerError::Engine(err) => (
                status_for_engine_error(&err),
                ErrorBody {
                    message: message_for_engine_error(&err),
                    code: err.code().to_string(),
                },
            ),
            ServerError::Generic(message) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    message,
                    code: "invalid_request".to_string(),
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<JsonRejection> for ServerError {
    fn from(value: JsonRejection) -> Self {
        Self::Generic(value.body_text())
    }
}

impl From<QueryRejection> for ServerError {
    fn from(value: QueryRejection) -> Self {
        Self::Generic(value.body_text())
    }
}

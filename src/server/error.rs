use crate::analysis::AnalysisError;
use crate::database::DatabaseError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Parâmetro slug é obrigatório")]
    MissingSlug,

    #[error("Forneça ?slug=... ou ?all=true")]
    MissingInvalidationTarget,

    #[error("Token de autorização inválido")]
    Unauthorized,

    #[error("UF inválida: {0}")]
    InvalidUf(String),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("Internal error: {0}")]
    Database(#[from] DatabaseError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingSlug
            | AppError::MissingInvalidationTarget
            | AppError::InvalidUf(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Analysis(AnalysisError::InvalidSlug(_)) => StatusCode::BAD_REQUEST,
            AppError::Analysis(AnalysisError::CandidateNotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Analysis(AnalysisError::Source(_)) => StatusCode::BAD_GATEWAY,
            AppError::Database(DatabaseError::InvalidUf(_)) => StatusCode::BAD_REQUEST,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }

        let body = json!({
            "statusCode": status.as_u16(),
            "message": self.to_string(),
        });

        (status, Json(body)).into_response()
    }
}

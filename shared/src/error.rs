use axum::{http::StatusCode, response::IntoResponse, Json};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    EntityNotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    ValidationError(String),
    #[error(transparent)]
    InvalidRequest(#[from] garde::Report),
    #[error(transparent)]
    ConvertToUuidError(#[from] uuid::Error),
    #[error("トランザクションを実行できませんでした。")]
    TransactionError(#[source] sqlx::Error),
    #[error("データベース処理実行中にエラーが発生しました。")]
    SpecificOperationError(#[source] sqlx::Error),
    #[error("No rows affected: {0}")]
    NoRowsAffectedError(String),
    #[error(transparent)]
    KeyValueStoreError(#[from] redis::RedisError),
    #[error("パスワードのハッシュ処理に失敗しました: {0}")]
    PasswordHashError(String),
    #[error("{0}")]
    ConversionEntityError(String),
    #[error("ログインに失敗しました")]
    UnauthenticatedError,
    #[error("認可情報が誤っています")]
    UnauthorizedError,
    #[error("許可されていない操作です")]
    ForbiddenOperation,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::EntityNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ValidationError(_)
            | AppError::InvalidRequest(_)
            | AppError::ConvertToUuidError(_) => StatusCode::BAD_REQUEST,
            AppError::UnauthenticatedError | AppError::UnauthorizedError => {
                StatusCode::UNAUTHORIZED
            }
            AppError::ForbiddenOperation => StatusCode::FORBIDDEN,
            AppError::TransactionError(_)
            | AppError::SpecificOperationError(_)
            | AppError::NoRowsAffectedError(_)
            | AppError::KeyValueStoreError(_)
            | AppError::PasswordHashError(_)
            | AppError::ConversionEntityError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status_code = self.status_code();
        let message = if status_code.is_server_error() {
            tracing::error!(
                error.cause_chain = ?self,
                error.message = %self,
                "Unexpected error happened"
            );
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status_code, Json(serde_json::json!({ "message": message }))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
